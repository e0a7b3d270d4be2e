use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use dsn_core::FilterConfig;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    #[error("missing timestamp")]
    Missing,
    #[error("malformed timestamp: {0}")]
    Malformed(String),
}

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a feed timestamp into UTC. Offsets are normalized; naive values are
/// taken as UTC; a bare date means midnight UTC.
pub fn parse_published(raw: &str) -> Result<DateTime<Utc>, TimestampError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(TimestampError::Missing);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }

    Err(TimestampError::Malformed(raw.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recency {
    Recent,
    Unparseable(TimestampError),
    BeforeMinYear(i32),
    Stale { age_days: i64 },
}

impl Recency {
    pub fn is_recent(&self) -> bool {
        matches!(self, Recency::Recent)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RecencyFilter {
    max_age_days: i64,
    min_year: i32,
}

impl RecencyFilter {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            max_age_days: config.max_article_age_days,
            min_year: config.min_publish_year,
        }
    }

    pub fn check(&self, published: &str, now: DateTime<Utc>) -> Recency {
        let published = match parse_published(published) {
            Ok(dt) => dt,
            Err(e) => return Recency::Unparseable(e),
        };
        if published.year() < self.min_year {
            return Recency::BeforeMinYear(published.year());
        }
        let age_days = (now - published).num_days();
        if age_days > self.max_age_days {
            return Recency::Stale { age_days };
        }
        Recency::Recent
    }
}

pub fn is_recent(published: &str, now: DateTime<Utc>, max_age_days: i64, min_year: i32) -> bool {
    RecencyFilter {
        max_age_days,
        min_year,
    }
    .check(published, now)
    .is_recent()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_accepted_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 10, 5, 9, 30, 0).unwrap();
        assert_eq!(parse_published("2025-10-05T09:30:00Z"), Ok(expected));
        assert_eq!(parse_published("2025-10-05T18:30:00+09:00"), Ok(expected));
        assert_eq!(parse_published("Sun, 05 Oct 2025 09:30:00 +0000"), Ok(expected));
        assert_eq!(parse_published("2025-10-05T09:30:00"), Ok(expected));
        assert_eq!(parse_published("2025-10-05 09:30:00"), Ok(expected));
        assert_eq!(parse_published("2025-10-05T09:30:00.250000").map(|d| d.date_naive()), Ok(expected.date_naive()));
        assert_eq!(
            parse_published("2025-10-05"),
            Ok(Utc.with_ymd_and_hms(2025, 10, 5, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_missing_and_malformed_are_distinct() {
        assert_eq!(parse_published(""), Err(TimestampError::Missing));
        assert_eq!(parse_published("   "), Err(TimestampError::Missing));
        assert_eq!(
            parse_published("last tuesday"),
            Err(TimestampError::Malformed("last tuesday".to_string()))
        );
    }

    #[test]
    fn test_unparseable_fails_closed() {
        assert!(!is_recent("", now(), 60, 2025));
        assert!(!is_recent("not a date", now(), 60, 2025));
    }

    #[test]
    fn test_stale_article_is_rejected() {
        let published = (now() - Duration::days(75)).to_rfc3339();
        let filter = RecencyFilter {
            max_age_days: 60,
            min_year: 2025,
        };
        assert_eq!(filter.check(&published, now()), Recency::Stale { age_days: 75 });
        assert!(!is_recent(&published, now(), 60, 2025));
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let published = (now() - Duration::days(60)).to_rfc3339();
        assert!(is_recent(&published, now(), 60, 2025));
    }

    #[test]
    fn test_year_floor() {
        let filter = RecencyFilter {
            max_age_days: 3650,
            min_year: 2025,
        };
        assert_eq!(
            filter.check("2024-12-31T23:00:00Z", now()),
            Recency::BeforeMinYear(2024)
        );
        assert!(filter.check("2025-01-01T00:00:00Z", now()).is_recent());
    }

    #[test]
    fn test_offset_is_normalized_before_year_check() {
        // 2025-01-01 08:00 in Seoul is still 2024 in UTC
        assert!(!is_recent("2025-01-01T08:00:00+09:00", now(), 3650, 2025));
    }
}
