//! In-memory reference implementations of the data-access seams.
//!
//! The real application injects storage-backed implementations; these exist
//! for the CLI and for integration tests. `MemoryWindowStore::replace` swaps
//! the whole vector under one lock, which satisfies the atomicity contract by
//! construction.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::NaiveDate;

use crate::aggregator::{AvailabilityWindow, MemberData, WindowStore};
use crate::error::BoxError;
use crate::interval::{BusyInterval, GroupId, MemberId, SleepWindow, TimeSpan};

/// Mutex-guarded map store for computed availability windows.
#[derive(Debug, Default)]
pub struct MemoryWindowStore {
    rows: Mutex<HashMap<(GroupId, NaiveDate), Vec<AvailabilityWindow>>>,
}

impl MemoryWindowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WindowStore for MemoryWindowStore {
    fn load(
        &self,
        group: GroupId,
        day: NaiveDate,
    ) -> std::result::Result<Vec<AvailabilityWindow>, BoxError> {
        let rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        Ok(rows.get(&(group, day)).cloned().unwrap_or_default())
    }

    fn replace(
        &self,
        group: GroupId,
        day: NaiveDate,
        mut windows: Vec<AvailabilityWindow>,
    ) -> std::result::Result<(), BoxError> {
        windows.sort_by_key(|w| (w.start, w.end));
        let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        rows.insert((group, day), windows);
        Ok(())
    }

    fn invalidate(&self, group: GroupId, day: NaiveDate) -> std::result::Result<(), BoxError> {
        let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        rows.remove(&(group, day));
        Ok(())
    }
}

/// Builder-style fixture data source: group membership, busy intervals, and
/// sleep windows held in plain maps.
#[derive(Debug, Default)]
pub struct MemoryMemberData {
    groups: HashMap<GroupId, Vec<MemberId>>,
    busy: HashMap<MemberId, Vec<BusyInterval>>,
    sleep: HashMap<MemberId, SleepWindow>,
}

impl MemoryMemberData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(mut self, group: GroupId, members: &[MemberId]) -> Self {
        self.groups.insert(group, members.to_vec());
        self
    }

    pub fn with_busy(mut self, intervals: impl IntoIterator<Item = BusyInterval>) -> Self {
        for interval in intervals {
            self.busy.entry(interval.owner).or_default().push(interval);
        }
        self
    }

    pub fn with_sleep(mut self, member: MemberId, sleep: SleepWindow) -> Self {
        self.sleep.insert(member, sleep);
        self
    }
}

impl MemberData for MemoryMemberData {
    fn group_members(&self, group: GroupId) -> std::result::Result<Vec<MemberId>, BoxError> {
        Ok(self.groups.get(&group).cloned().unwrap_or_default())
    }

    fn groups_for_member(&self, member: MemberId) -> std::result::Result<Vec<GroupId>, BoxError> {
        Ok(self
            .groups
            .iter()
            .filter(|(_, members)| members.contains(&member))
            .map(|(group, _)| *group)
            .collect())
    }

    fn is_member(&self, group: GroupId, member: MemberId) -> std::result::Result<bool, BoxError> {
        Ok(self
            .groups
            .get(&group)
            .is_some_and(|members| members.contains(&member)))
    }

    fn busy_intervals(
        &self,
        member: MemberId,
        window: TimeSpan,
    ) -> std::result::Result<Vec<BusyInterval>, BoxError> {
        let intervals = self
            .busy
            .get(&member)
            .into_iter()
            .flatten()
            // Malformed rows are returned too, so validation can reject them.
            .filter(|b| b.end < b.start || (b.start < window.end && b.end > window.start))
            .copied()
            .collect();
        Ok(intervals)
    }

    fn sleep_window(
        &self,
        member: MemberId,
    ) -> std::result::Result<Option<SleepWindow>, BoxError> {
        Ok(self.sleep.get(&member).copied())
    }
}
