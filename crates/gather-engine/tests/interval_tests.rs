//! Tests for interval normalization: merging, complement, sleep-window
//! expansion, and day-bound anchoring.

use chrono::{NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use gather_engine::interval::{day_bounds, free_within, merge_overlapping, TimeSpan};
use gather_engine::{BusyInterval, EngineError, SleepWindow};
use uuid::Uuid;

/// Helper: a span on 2026-03-16 from hour:minute to hour:minute.
fn span(start_h: u32, start_m: u32, end_h: u32, end_m: u32) -> TimeSpan {
    TimeSpan::new(
        Utc.with_ymd_and_hms(2026, 3, 16, start_h, start_m, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 3, 16, end_h, end_m, 0).unwrap(),
    )
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

// ── merge_overlapping ───────────────────────────────────────────────────────

#[test]
fn merge_combines_overlapping_spans() {
    let merged = merge_overlapping(vec![span(9, 0, 10, 0), span(9, 30, 11, 0)]);
    assert_eq!(merged, vec![span(9, 0, 11, 0)]);
}

#[test]
fn merge_is_inclusive_at_touching_boundaries() {
    // A span starting exactly where the previous ends extends it.
    let merged = merge_overlapping(vec![span(9, 0, 10, 0), span(10, 0, 11, 0)]);
    assert_eq!(merged, vec![span(9, 0, 11, 0)]);
}

#[test]
fn merge_keeps_disjoint_spans_separate() {
    let merged = merge_overlapping(vec![span(14, 0, 15, 0), span(9, 0, 10, 0)]);
    assert_eq!(merged, vec![span(9, 0, 10, 0), span(14, 0, 15, 0)]);
}

#[test]
fn merge_drops_degenerate_spans() {
    let merged = merge_overlapping(vec![span(9, 0, 9, 0), span(10, 0, 11, 0)]);
    assert_eq!(merged, vec![span(10, 0, 11, 0)]);
}

#[test]
fn merge_handles_contained_spans() {
    let merged = merge_overlapping(vec![span(9, 0, 12, 0), span(10, 0, 11, 0)]);
    assert_eq!(merged, vec![span(9, 0, 12, 0)]);
}

#[test]
fn merge_of_empty_input_is_empty() {
    assert!(merge_overlapping(vec![]).is_empty());
}

// ── free_within ─────────────────────────────────────────────────────────────

#[test]
fn complement_of_single_busy_span_is_two_gaps() {
    let window = span(8, 0, 17, 0);
    let free = free_within(&[span(10, 0, 11, 0)], window);
    assert_eq!(free, vec![span(8, 0, 10, 0), span(11, 0, 17, 0)]);
}

#[test]
fn complement_clips_busy_spans_to_window() {
    let window = span(8, 0, 17, 0);
    let free = free_within(&[span(6, 0, 9, 0), span(16, 0, 20, 0)], window);
    assert_eq!(free, vec![span(9, 0, 16, 0)]);
}

#[test]
fn complement_of_fully_busy_window_is_empty() {
    let window = span(8, 0, 17, 0);
    assert!(free_within(&[span(8, 0, 17, 0)], window).is_empty());
}

#[test]
fn complement_of_no_busy_spans_is_whole_window() {
    let window = span(8, 0, 17, 0);
    assert_eq!(free_within(&[], window), vec![window]);
}

#[test]
fn complement_ignores_busy_spans_outside_window() {
    let window = span(8, 0, 17, 0);
    let free = free_within(&[span(18, 0, 19, 0)], window);
    assert_eq!(free, vec![window]);
}

// ── SleepWindow::to_absolute ────────────────────────────────────────────────

#[test]
fn non_wrapping_sleep_expands_to_one_segment() {
    let sleep = SleepWindow::new(time(1, 0), time(9, 0));
    let window = span(0, 0, 23, 59);
    let segments = sleep.to_absolute(window.start, window.end);
    assert_eq!(segments, vec![span(1, 0, 9, 0)]);
}

#[test]
fn midnight_wrap_sleep_expands_to_head_and_tail() {
    // 23:00 → 07:00 wraps: asleep from the previous night until 07:00, and
    // again from 23:00 until the day ends.
    let sleep = SleepWindow::new(time(23, 0), time(7, 0));
    let day_start = Utc.with_ymd_and_hms(2026, 3, 16, 0, 0, 0).unwrap();
    let day_end = Utc.with_ymd_and_hms(2026, 3, 17, 0, 0, 0).unwrap();

    let segments = sleep.to_absolute(day_start, day_end);
    assert_eq!(
        segments,
        vec![
            TimeSpan::new(day_start, Utc.with_ymd_and_hms(2026, 3, 16, 7, 0, 0).unwrap()),
            TimeSpan::new(Utc.with_ymd_and_hms(2026, 3, 16, 23, 0, 0).unwrap(), day_end),
        ]
    );
}

#[test]
fn sleep_ending_at_midnight_emits_only_the_tail() {
    // 22:00 → 00:00 counts as wrapping, but the head segment is empty.
    let sleep = SleepWindow::new(time(22, 0), time(0, 0));
    let day_start = Utc.with_ymd_and_hms(2026, 3, 16, 0, 0, 0).unwrap();
    let day_end = Utc.with_ymd_and_hms(2026, 3, 17, 0, 0, 0).unwrap();

    let segments = sleep.to_absolute(day_start, day_end);
    assert_eq!(segments, vec![TimeSpan::new(
        Utc.with_ymd_and_hms(2026, 3, 16, 22, 0, 0).unwrap(),
        day_end,
    )]);
}

#[test]
fn equal_sleep_times_cover_the_whole_day() {
    let sleep = SleepWindow::new(time(8, 0), time(8, 0));
    let day_start = Utc.with_ymd_and_hms(2026, 3, 16, 0, 0, 0).unwrap();
    let day_end = Utc.with_ymd_and_hms(2026, 3, 17, 0, 0, 0).unwrap();

    let segments = sleep.to_absolute(day_start, day_end);
    let covered: i64 = segments.iter().map(TimeSpan::duration_minutes).sum();
    assert_eq!(covered, 24 * 60);
}

// ── day_bounds ──────────────────────────────────────────────────────────────

#[test]
fn utc_day_bounds_are_24_hours() {
    let day = "2026-03-16".parse().unwrap();
    let (start, end) = day_bounds(day, Tz::UTC).unwrap();
    assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 16, 0, 0, 0).unwrap());
    assert_eq!((end - start).num_hours(), 24);
}

#[test]
fn day_bounds_follow_the_reference_timezone() {
    // Tokyo is UTC+9 year-round: the local day starts at 15:00 UTC the
    // evening before.
    let day = "2026-03-16".parse().unwrap();
    let (start, end) = day_bounds(day, Tz::Asia__Tokyo).unwrap();
    assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 15, 15, 0, 0).unwrap());
    assert_eq!(end, Utc.with_ymd_and_hms(2026, 3, 16, 15, 0, 0).unwrap());
}

#[test]
fn dst_spring_forward_day_is_23_hours() {
    // Europe/London loses an hour on 2026-03-29 (transition at 01:00 local,
    // so midnight itself is unaffected).
    let day = "2026-03-29".parse().unwrap();
    let (start, end) = day_bounds(day, Tz::Europe__London).unwrap();
    assert_eq!((end - start).num_hours(), 23);
}

#[test]
fn dst_gap_straddling_midnight_is_an_invalid_day() {
    // Chile springs forward at 24:00: on 2026-09-06 the clock jumps straight
    // from Saturday 23:59:59 to Sunday 01:00, so Sunday has no local midnight
    // to anchor the day on.
    let day = "2026-09-06".parse().unwrap();
    let err = day_bounds(day, Tz::America__Santiago).unwrap_err();
    assert!(matches!(err, EngineError::InvalidDay(_)));
}

#[test]
fn sleep_offsets_are_durations_not_wall_clock() {
    // On a 23-hour day a tail starting at offset 23:30 lies past the day's
    // end and is clipped away; only the carried-over head remains.
    let sleep = SleepWindow::new(time(23, 30), time(7, 0));
    let day = "2026-03-29".parse().unwrap();
    let (day_start, day_end) = day_bounds(day, Tz::Europe__London).unwrap();

    let segments = sleep.to_absolute(day_start, day_end);
    assert_eq!(
        segments,
        vec![TimeSpan::new(
            day_start,
            day_start + chrono::Duration::hours(7)
        )]
    );
}

// ── BusyInterval validation ─────────────────────────────────────────────────

#[test]
fn inverted_interval_is_rejected() {
    let interval = BusyInterval {
        owner: Uuid::new_v4(),
        start: Utc.with_ymd_and_hms(2026, 3, 16, 10, 0, 0).unwrap(),
        end: Utc.with_ymd_and_hms(2026, 3, 16, 9, 0, 0).unwrap(),
    };
    assert!(matches!(
        interval.validated_span(),
        Err(EngineError::InvalidInterval(_))
    ));
}

#[test]
fn zero_length_interval_validates_but_merges_away() {
    let interval = BusyInterval {
        owner: Uuid::new_v4(),
        start: Utc.with_ymd_and_hms(2026, 3, 16, 10, 0, 0).unwrap(),
        end: Utc.with_ymd_and_hms(2026, 3, 16, 10, 0, 0).unwrap(),
    };
    let span = interval.validated_span().unwrap();
    assert!(merge_overlapping(vec![span]).is_empty());
}
