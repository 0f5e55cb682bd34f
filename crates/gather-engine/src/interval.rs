//! Interval model and normalization.
//!
//! Converts heterogeneous time inputs (date anchors, absolute busy spans,
//! daily sleep times) into half-open `[start, end)` intervals on a single UTC
//! timeline, then merges overlaps per owner. All timezone conversion happens
//! here, once, at the normalization boundary — the solver only ever sees
//! absolute instants.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, Result};

/// Opaque member identifier, supplied by the surrounding application.
pub type MemberId = Uuid;

/// Opaque group identifier, supplied by the surrounding application.
pub type GroupId = Uuid;

/// A half-open time range `[start, end)` on the UTC timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeSpan {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeSpan {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// True when the span contains no instants (`start >= end`).
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// True when `other` lies entirely inside this span.
    /// Half-open: a span ending exactly at `other.start` does not contain it.
    pub fn contains_span(&self, other: &TimeSpan) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Intersection with another span, or `None` when they do not overlap.
    /// Adjacent spans (one ends exactly where the other starts) do not overlap.
    pub fn intersect(&self, other: &TimeSpan) -> Option<TimeSpan> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start < end).then_some(TimeSpan { start, end })
    }
}

/// A busy span attributed to one member, on the absolute UTC timeline.
///
/// Source-agnostic: manually entered time slots and synced calendar events
/// both arrive pre-flattened to this shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyInterval {
    pub owner: MemberId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BusyInterval {
    /// Validate the `start < end` invariant and return the bare span.
    ///
    /// Zero-length intervals are tolerated here (they are dropped during
    /// merging); an inverted interval is malformed input.
    pub fn validated_span(&self) -> Result<TimeSpan> {
        if self.end < self.start {
            return Err(EngineError::InvalidInterval(format!(
                "inverted interval for member {}: {} .. {}",
                self.owner, self.start, self.end
            )));
        }
        Ok(TimeSpan::new(self.start, self.end))
    }
}

/// A recurring daily exclusion period (the member's configured sleep hours).
///
/// `daily_end <= daily_start` means the window wraps across midnight, e.g.
/// 23:00 → 07:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepWindow {
    pub daily_start: NaiveTime,
    pub daily_end: NaiveTime,
}

impl SleepWindow {
    pub fn new(daily_start: NaiveTime, daily_end: NaiveTime) -> Self {
        Self {
            daily_start,
            daily_end,
        }
    }

    /// True when the window spans across midnight.
    pub fn wraps_midnight(&self) -> bool {
        self.daily_end <= self.daily_start
    }

    /// Expand the recurring window into absolute spans for one target day,
    /// clipped to the day bounds `[day_start, day_end)`.
    ///
    /// A wrapping window contributes two segments: the head carried over from
    /// the previous night (`[day_start, day_start + daily_end)`) and the tail
    /// beginning that evening (`[day_start + daily_start, day_end)`). Empty
    /// segments are omitted.
    ///
    /// Times are applied as fixed offsets from `day_start`, not wall-clock
    /// times in the reference timezone: on a DST-shortened day the segments
    /// drift from local clocks, and a tail starting past the day's true
    /// length is clipped away entirely.
    pub fn to_absolute(&self, day_start: DateTime<Utc>, day_end: DateTime<Utc>) -> Vec<TimeSpan> {
        let offset = |t: NaiveTime| day_start + t.signed_duration_since(NaiveTime::MIN);

        let segments = if self.wraps_midnight() {
            vec![
                TimeSpan::new(day_start, offset(self.daily_end)),
                TimeSpan::new(offset(self.daily_start), day_end),
            ]
        } else {
            vec![TimeSpan::new(offset(self.daily_start), offset(self.daily_end))]
        };

        let window = TimeSpan::new(day_start, day_end);
        segments
            .iter()
            .filter_map(|s| s.intersect(&window))
            .collect()
    }
}

/// Compute the UTC bounds `[D0, D1)` of a calendar day in the reference
/// timezone.
///
/// A local midnight made ambiguous by a DST fall-back resolves to the
/// earliest instant.
///
/// # Errors
/// Returns `EngineError::InvalidDay` if the local midnight does not exist
/// (a DST gap straddling 00:00) or the day is at the end of the
/// representable calendar.
pub fn day_bounds(day: NaiveDate, tz: Tz) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let next = day
        .succ_opt()
        .ok_or_else(|| EngineError::InvalidDay(format!("no calendar day after {day}")))?;
    Ok((local_midnight(day, tz)?, local_midnight(next, tz)?))
}

fn local_midnight(day: NaiveDate, tz: Tz) -> Result<DateTime<Utc>> {
    tz.from_local_datetime(&day.and_time(NaiveTime::MIN))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| EngineError::InvalidDay(format!("midnight on {day} does not exist in {tz}")))
}

/// Merge overlapping or touching spans into a sorted, non-overlapping list.
///
/// Stable sort by `(start, end)`; the merge is inclusive at boundaries, so a
/// span starting exactly where the previous one ends extends it. Degenerate
/// zero-length spans are dropped before merging.
pub fn merge_overlapping(spans: Vec<TimeSpan>) -> Vec<TimeSpan> {
    let mut spans: Vec<TimeSpan> = spans.into_iter().filter(|s| !s.is_empty()).collect();
    spans.sort_by_key(|s| (s.start, s.end));

    let mut merged: Vec<TimeSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        if let Some(last) = merged.last_mut() {
            if span.start <= last.end {
                last.end = last.end.max(span.end);
                continue;
            }
        }
        merged.push(span);
    }
    merged
}

/// Compute the free complement of a merged busy list within a window.
///
/// `busy` must already be merged (sorted, non-overlapping); spans are clipped
/// to the window and the gaps between them returned in ascending order.
pub fn free_within(busy: &[TimeSpan], window: TimeSpan) -> Vec<TimeSpan> {
    let mut free = Vec::new();
    let mut cursor = window.start;

    for span in busy {
        let Some(clipped) = span.intersect(&window) else {
            continue;
        };
        if cursor < clipped.start {
            free.push(TimeSpan::new(cursor, clipped.start));
        }
        cursor = cursor.max(clipped.end);
    }

    if cursor < window.end {
        free.push(TimeSpan::new(cursor, window.end));
    }
    free
}
