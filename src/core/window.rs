//! Partition a date range into fixed-width compositing windows.

use chrono::{Duration, NaiveDate};

use crate::types::{PipelineError, PipelineResult, TimeWindow};

/// Split `[start, end]` into ordered, contiguous, half-open windows of
/// `step_days` days.
///
/// Boundaries run `start, start+step, ...` up to and including the first
/// boundary at or past `end`, so the final window may be shorter than the
/// step but coverage never stops short of `end`. `start == end` yields an
/// empty partition.
pub fn partition_windows(
    start: NaiveDate,
    end: NaiveDate,
    step_days: i64,
) -> PipelineResult<Vec<TimeWindow>> {
    if step_days <= 0 {
        return Err(PipelineError::Query(format!(
            "compositing step must be positive, got {} days",
            step_days
        )));
    }
    if start > end {
        return Err(PipelineError::Query(format!(
            "date range start {} is after end {}",
            start, end
        )));
    }

    let step = Duration::days(step_days);
    let mut boundaries = vec![start];
    let mut cursor = start;
    while cursor < end {
        cursor = cursor + step;
        boundaries.push(cursor);
    }

    let windows = boundaries
        .windows(2)
        .map(|pair| TimeWindow {
            start: pair[0],
            end: pair[1],
        })
        .collect();

    Ok(windows)
}
