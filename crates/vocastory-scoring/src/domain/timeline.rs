//! Cumulative activity timelines.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::Serialize;
use vocastory_core::error::DomainError;

/// Default bucket width.
#[must_use]
pub fn default_bucket() -> Duration {
    Duration::hours(8)
}

/// Cumulative count at the end of one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelinePoint {
    /// Start of the bucket.
    pub bucket_start: DateTime<Utc>,
    /// Events up to the end of the bucket.
    pub cumulative: usize,
}

fn start_of_day(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Buckets `instants` from the start of the earliest one's day to the end of
/// `now`'s day, reporting the running total at the end of each bucket.
///
/// # Errors
///
/// Returns `DomainError::Validation` if `bucket` is not positive or is too
/// wide to add to a timestamp.
pub fn cumulative_timeline(
    instants: &[DateTime<Utc>],
    bucket: Duration,
    now: DateTime<Utc>,
) -> Result<Vec<TimelinePoint>, DomainError> {
    if bucket <= Duration::zero() {
        return Err(DomainError::Validation(
            "timeline bucket must be positive".to_owned(),
        ));
    }

    let mut sorted = instants.to_vec();
    sorted.sort_unstable();
    let Some(first) = sorted.first().copied() else {
        return Ok(Vec::new());
    };

    let end = start_of_day(now.max(first)) + Duration::days(1);
    let mut points = Vec::new();
    let mut bucket_start = start_of_day(first);
    while bucket_start < end {
        let bucket_end = bucket_start.checked_add_signed(bucket).ok_or_else(|| {
            DomainError::Validation("timeline bucket is too wide".to_owned())
        })?;
        points.push(TimelinePoint {
            bucket_start,
            cumulative: sorted.partition_point(|t| *t < bucket_end),
        });
        bucket_start = bucket_end;
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_timeline_spans_whole_days_in_eight_hour_buckets() {
        // Arrange
        let instants = vec![at(15, 10), at(15, 9), at(16, 1)];

        // Act
        let points = cumulative_timeline(&instants, default_bucket(), at(16, 12)).unwrap();

        // Assert
        let totals: Vec<usize> = points.iter().map(|p| p.cumulative).collect();
        assert_eq!(totals, vec![0, 2, 2, 3, 3, 3]);
        assert_eq!(points[0].bucket_start, at(15, 0));
        assert_eq!(points[5].bucket_start, at(16, 16));
    }

    #[test]
    fn test_empty_input_yields_empty_timeline() {
        let points = cumulative_timeline(&[], default_bucket(), at(16, 12)).unwrap();

        assert!(points.is_empty());
    }

    #[test]
    fn test_non_positive_bucket_is_rejected() {
        let result = cumulative_timeline(&[at(15, 1)], Duration::zero(), at(16, 12));

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }
}
