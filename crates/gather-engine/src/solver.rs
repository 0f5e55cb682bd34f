//! Free-window solver — the shared-availability sweep.
//!
//! Given every group member's free spans for one day, walks the combined
//! boundary timeline and emits the maximal windows during which enough members
//! are simultaneously free. Pure function over already-normalized intervals:
//! no I/O, no timezone awareness, deterministic output ordered by start.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::interval::{MemberId, TimeSpan};

/// One member's free spans within the target day, merged and ascending.
///
/// Derived fresh for each solve as the complement of the member's merged busy
/// intervals; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberFreeSet {
    pub member: MemberId,
    pub free: Vec<TimeSpan>,
}

/// A maximal interval during which every member in `participants` is free.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowCandidate {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub participants: BTreeSet<MemberId>,
}

/// Compute all shared-availability windows for one day.
///
/// The sweep:
/// 1. Clip each member's free spans to `[day_start, day_end)`.
/// 2. Collect every span boundary, sorted and deduplicated.
/// 3. For each consecutive boundary pair, the covering set is the members with
///    a free span containing the sub-interval. Half-open semantics: a span
///    ending exactly at the pair's start contributes nothing to it.
/// 4. Sub-intervals covered by fewer than `min_members` members are dropped.
/// 5. Contiguous sub-intervals with an identical covering set merge into one
///    maximal window.
///
/// Fewer than `min_members` members in the input short-circuits to an empty
/// result; a member with no free time simply appears in no participant set.
pub fn solve_day(
    free_sets: &[MemberFreeSet],
    day_start: DateTime<Utc>,
    day_end: DateTime<Utc>,
    min_members: usize,
) -> Vec<WindowCandidate> {
    if free_sets.len() < min_members || day_start >= day_end {
        return Vec::new();
    }

    let window = TimeSpan::new(day_start, day_end);
    let clipped: Vec<(MemberId, Vec<TimeSpan>)> = free_sets
        .iter()
        .map(|set| {
            let spans = set
                .free
                .iter()
                .filter_map(|s| s.intersect(&window))
                .collect();
            (set.member, spans)
        })
        .collect();

    // Combined boundary timeline. BTreeSet gives sorted + deduplicated.
    let boundaries: Vec<DateTime<Utc>> = clipped
        .iter()
        .flat_map(|(_, spans)| spans.iter().flat_map(|s| [s.start, s.end]))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut windows: Vec<WindowCandidate> = Vec::new();
    for pair in boundaries.windows(2) {
        let sub = TimeSpan::new(pair[0], pair[1]);

        // Every boundary is a span edge, so containment of the sub-interval is
        // equivalent to covering it.
        let participants: BTreeSet<MemberId> = clipped
            .iter()
            .filter(|(_, spans)| spans.iter().any(|s| s.contains_span(&sub)))
            .map(|(member, _)| *member)
            .collect();

        if participants.len() < min_members {
            continue;
        }

        match windows.last_mut() {
            Some(last) if last.end == sub.start && last.participants == participants => {
                last.end = sub.end;
            }
            _ => windows.push(WindowCandidate {
                start: sub.start,
                end: sub.end,
                participants,
            }),
        }
    }

    windows
}
