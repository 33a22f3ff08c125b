use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a timestamp written by upstream services.
///
/// Accepts RFC 3339 (including a trailing `Z`), naive ISO date-times with either a
/// `T` or a space separator, and bare `YYYY-MM-DD` dates. Naive values are taken as
/// UTC. Anything else yields `None`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_rfc3339_with_zulu_and_offsets() {
        let expected = Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2025-01-15T09:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-15T18:00:00+09:00"), Some(expected));
    }

    #[test]
    fn parses_naive_datetimes_as_utc() {
        let expected = Utc.with_ymd_and_hms(2024, 12, 1, 8, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-12-01T08:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-12-01 08:30:00.000"), Some(expected));
    }

    #[test]
    fn parses_bare_dates_at_midnight() {
        assert_eq!(
            parse_timestamp("2024-02-29"),
            Some(Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2024-13-45"), None);
    }
}
