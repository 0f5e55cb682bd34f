//! Availability aggregator — orchestrates group-availability computation.
//!
//! Pulls each member's busy intervals and sleep window through an injected
//! [`MemberData`] seam, normalizes them (see [`crate::interval`]), runs the
//! solver, and replaces the persisted window set through an injected
//! [`WindowStore`]. The solver itself never touches persistence.
//!
//! Reads never recompute: `group_availability` is a pure store read behind the
//! policy gate. Recomputation is explicit (`recalculate`) or follows an
//! invalidation (`invalidate_member`), and is serialized per `(group, day)`
//! key so concurrent recomputes cannot interleave writes.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{BoxError, EngineError, Result};
use crate::interval::{
    day_bounds, free_within, merge_overlapping, BusyInterval, GroupId, MemberId, SleepWindow,
    TimeSpan,
};
use crate::policy::{ensure_member_count, ensure_membership, DEFAULT_MIN_MEMBERS};
use crate::solver::{solve_day, MemberFreeSet};

/// Data-access seam for membership and per-member schedule inputs.
///
/// Implementations are expected to be backed by the surrounding application's
/// storage; the engine treats membership lists as already validated and
/// propagates fetch failures as-is.
pub trait MemberData {
    /// Member ids of a group.
    fn group_members(&self, group: GroupId) -> std::result::Result<Vec<MemberId>, BoxError>;

    /// Groups the member belongs to (used by invalidation).
    fn groups_for_member(&self, member: MemberId) -> std::result::Result<Vec<GroupId>, BoxError>;

    /// Membership check for the authorization gate.
    fn is_member(
        &self,
        group: GroupId,
        member: MemberId,
    ) -> std::result::Result<bool, BoxError>;

    /// The member's busy intervals overlapping `window` — manual slots and
    /// synced calendar events, pre-flattened to one shape.
    fn busy_intervals(
        &self,
        member: MemberId,
        window: TimeSpan,
    ) -> std::result::Result<Vec<BusyInterval>, BoxError>;

    /// The member's configured sleep window, if any.
    fn sleep_window(&self, member: MemberId)
        -> std::result::Result<Option<SleepWindow>, BoxError>;
}

/// Persistence seam for computed availability windows.
pub trait WindowStore {
    /// Previously persisted windows for a group and day, ascending by start.
    fn load(
        &self,
        group: GroupId,
        day: NaiveDate,
    ) -> std::result::Result<Vec<AvailabilityWindow>, BoxError>;

    /// Replace the whole window set for a group and day.
    ///
    /// Must be atomic: readers observe either the old set or the new set in
    /// full, never a partial overwrite. On error the old set must remain.
    fn replace(
        &self,
        group: GroupId,
        day: NaiveDate,
        windows: Vec<AvailabilityWindow>,
    ) -> std::result::Result<(), BoxError>;

    /// Delete the window set for a group and day.
    fn invalidate(&self, group: GroupId, day: NaiveDate) -> std::result::Result<(), BoxError>;
}

/// A persisted shared-availability window.
///
/// Invariants: `start < end` and `participants.len()` is at least the group's
/// minimum-member threshold. Read-only to consumers; created and replaced only
/// by [`AvailabilityEngine::recalculate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub id: Uuid,
    pub group: GroupId,
    pub day: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub participants: BTreeSet<MemberId>,
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Reference timezone defining where a calendar day starts and ends.
    /// All day-bound conversion happens once, at the normalization boundary.
    pub reference_tz: Tz,
    /// Minimum simultaneously free members for a window to qualify, and the
    /// minimum group size for computation to be attempted at all.
    pub min_members: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reference_tz: Tz::UTC,
            min_members: DEFAULT_MIN_MEMBERS,
        }
    }
}

/// The availability engine: policy gate + fetch + normalize + solve + persist.
pub struct AvailabilityEngine<D, S> {
    config: EngineConfig,
    data: D,
    store: S,
    /// Per-(group, day) recompute serialization. Groups are independent; no
    /// cross-group locking.
    recompute_locks: Mutex<HashMap<(GroupId, NaiveDate), Arc<Mutex<()>>>>,
}

impl<D: MemberData, S: WindowStore> AvailabilityEngine<D, S> {
    pub fn new(config: EngineConfig, data: D, store: S) -> Self {
        Self {
            config,
            data,
            store,
            recompute_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Previously persisted windows for `(group, day)`.
    ///
    /// Never recomputes — recomputation is explicit via [`Self::recalculate`].
    /// The requester must be a group member and the group must meet the
    /// minimum-member threshold; either failure is a
    /// [`crate::policy::PolicyViolation`], so callers can distinguish "can't
    /// compute yet" from an empty (nobody-qualifies) result.
    pub fn group_availability(
        &self,
        group: GroupId,
        day: NaiveDate,
        requester: MemberId,
    ) -> Result<Vec<AvailabilityWindow>> {
        let is_member = self
            .data
            .is_member(group, requester)
            .map_err(EngineError::DataAccess)?;
        ensure_membership(is_member, requester, group)?;

        let members = self
            .data
            .group_members(group)
            .map_err(EngineError::DataAccess)?;
        ensure_member_count(members.len(), self.config.min_members)?;

        self.store.load(group, day).map_err(EngineError::DataAccess)
    }

    /// Recompute and persist the window set for `(group, day)`.
    ///
    /// Idempotent for fixed inputs: the persisted boundaries and participant
    /// sets are identical run-to-run (window ids are freshly assigned). A
    /// member whose intervals fail validation is skipped with a warning; if
    /// every member is skipped the result is zero windows, not an error. A
    /// fetch or store failure propagates and leaves the previously persisted
    /// set untouched.
    pub fn recalculate(&self, group: GroupId, day: NaiveDate) -> Result<()> {
        let members = self
            .data
            .group_members(group)
            .map_err(EngineError::DataAccess)?;
        ensure_member_count(members.len(), self.config.min_members)?;

        let (day_start, day_end) = day_bounds(day, self.config.reference_tz)?;

        // Serialize the fetch-compute-persist sequence per key. The entry is
        // pruned once the last holder releases it, so the map only tracks
        // in-flight recomputes.
        let key_lock = self.key_lock(group, day);
        let result = {
            let _guard = key_lock.lock().unwrap_or_else(|e| e.into_inner());
            self.recalculate_locked(group, day, &members, day_start, day_end)
        };
        self.release_key_lock(group, day, &key_lock);
        result
    }

    fn recalculate_locked(
        &self,
        group: GroupId,
        day: NaiveDate,
        members: &[MemberId],
        day_start: DateTime<Utc>,
        day_end: DateTime<Utc>,
    ) -> Result<()> {
        let mut free_sets = Vec::with_capacity(members.len());
        for member in members {
            match self.member_free_set(*member, day_start, day_end) {
                Ok(set) => free_sets.push(set),
                Err(EngineError::InvalidInterval(reason)) => {
                    warn!(%member, %group, %reason, "skipping member with malformed intervals");
                }
                Err(other) => return Err(other),
            }
        }

        let candidates = solve_day(&free_sets, day_start, day_end, self.config.min_members);
        let windows: Vec<AvailabilityWindow> = candidates
            .into_iter()
            .map(|c| AvailabilityWindow {
                id: Uuid::new_v4(),
                group,
                day,
                start: c.start,
                end: c.end,
                participants: c.participants,
            })
            .collect();

        debug!(%group, %day, windows = windows.len(), "recalculated group availability");
        self.store
            .replace(group, day, windows)
            .map_err(EngineError::DataAccess)
    }

    /// Drop persisted windows for `day` in every group the member belongs to.
    ///
    /// Called when a member's busy intervals or sleep window change, so stale
    /// windows are never served past the change. Recomputation is lazy — the
    /// next explicit [`Self::recalculate`] call rebuilds the set.
    pub fn invalidate_member(&self, member: MemberId, day: NaiveDate) -> Result<()> {
        let groups = self
            .data
            .groups_for_member(member)
            .map_err(EngineError::DataAccess)?;
        for group in &groups {
            self.store
                .invalidate(*group, day)
                .map_err(EngineError::DataAccess)?;
        }
        debug!(%member, %day, groups = groups.len(), "invalidated availability windows");
        Ok(())
    }

    /// One member's free spans for the day: busy intervals plus expanded
    /// sleep window, merged, then complemented against the day bounds.
    fn member_free_set(
        &self,
        member: MemberId,
        day_start: DateTime<Utc>,
        day_end: DateTime<Utc>,
    ) -> Result<MemberFreeSet> {
        let window = TimeSpan::new(day_start, day_end);
        let busy = self
            .data
            .busy_intervals(member, window)
            .map_err(EngineError::DataAccess)?;

        let mut spans = busy
            .iter()
            .map(BusyInterval::validated_span)
            .collect::<Result<Vec<_>>>()?;

        if let Some(sleep) = self
            .data
            .sleep_window(member)
            .map_err(EngineError::DataAccess)?
        {
            spans.extend(sleep.to_absolute(day_start, day_end));
        }

        let merged = merge_overlapping(spans);
        Ok(MemberFreeSet {
            member,
            free: free_within(&merged, window),
        })
    }

    fn key_lock(&self, group: GroupId, day: NaiveDate) -> Arc<Mutex<()>> {
        let mut locks = self
            .recompute_locks
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        locks.entry((group, day)).or_default().clone()
    }

    /// Prune the key's map entry when no other recompute holds a handle.
    ///
    /// The map holds one reference and `handle` another; a count above two
    /// means a waiter cloned the `Arc` (always under the map lock) and the
    /// entry must stay. Without pruning the map would grow by one entry per
    /// (group, day) ever recomputed.
    fn release_key_lock(&self, group: GroupId, day: NaiveDate, handle: &Arc<Mutex<()>>) {
        let mut locks = self
            .recompute_locks
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if Arc::strong_count(handle) <= 2 {
            locks.remove(&(group, day));
        }
    }
}
