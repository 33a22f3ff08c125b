pub mod api;
pub mod date;
pub mod db;
pub mod extraction;
pub mod logging;
pub mod matching;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Read-only snapshots handed to the matching functions by the data-access layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Candidate {
    pub id: i64,
    pub name: String,
    /// Comma-hierarchical, most specific segment first ("City, State, Country").
    pub location: String,
    pub skills: Vec<String>,
    pub experience_years: f64,
    pub education: String,
    pub salary_expectation: Option<SalaryRange>,
    /// Precomputed profile completeness (0-100).
    pub profile_complete: f64,
    pub last_active: Option<LastActive>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Job {
    pub id: i64,
    pub employer_id: i64,
    pub company_name: Option<String>,
    pub title: String,
    pub description: String,
    pub required_skills: Vec<String>,
    pub preferred_skills: Vec<String>,
    pub location: String,
    pub remote: bool,
    pub salary_range: Option<SalaryRange>,
    pub active: bool,
}

impl Default for Job {
    fn default() -> Self {
        Self {
            id: 0,
            employer_id: 0,
            company_name: None,
            title: String::new(),
            description: String::new(),
            required_skills: Vec::new(),
            preferred_skills: Vec::new(),
            location: String::new(),
            remote: false,
            salary_range: None,
            active: true,
        }
    }
}

/// `[min, max]` salary bounds, serialized as a two element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SalaryRange(pub f64, pub f64);

impl SalaryRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self(min, max)
    }

    pub fn min(&self) -> f64 {
        self.0
    }

    pub fn max(&self) -> f64 {
        self.1
    }

    pub fn span(&self) -> f64 {
        self.1 - self.0
    }

    /// Finite, non-negative and ordered.
    pub fn is_usable(&self) -> bool {
        self.0.is_finite() && self.1.is_finite() && self.0 >= 0.0 && self.0 <= self.1
    }

    pub fn has_zero_bound(&self) -> bool {
        self.0 == 0.0 || self.1 == 0.0
    }
}

/// Last activity as stored upstream: either a proper timestamp or whatever string
/// the profile service wrote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LastActive {
    At(DateTime<Utc>),
    Raw(String),
}

impl LastActive {
    /// Resolve to a UTC instant; unparsable raw values resolve to `None`.
    pub fn resolve(&self) -> Option<DateTime<Utc>> {
        match self {
            LastActive::At(at) => Some(*at),
            LastActive::Raw(raw) => date::parse_timestamp(raw),
        }
    }
}

impl From<DateTime<Utc>> for LastActive {
    fn from(value: DateTime<Utc>) -> Self {
        LastActive::At(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn salary_range_serializes_as_pair() {
        let range = SalaryRange::new(60_000.0, 90_000.0);
        let json = serde_json::to_value(range).unwrap();
        assert_eq!(json, serde_json::json!([60000.0, 90000.0]));

        let back: SalaryRange = serde_json::from_value(serde_json::json!([1, 2])).unwrap();
        assert_eq!(back, SalaryRange::new(1.0, 2.0));
    }

    #[test]
    fn salary_range_usability() {
        assert!(SalaryRange::new(0.0, 10.0).is_usable());
        assert!(!SalaryRange::new(10.0, 5.0).is_usable());
        assert!(!SalaryRange::new(-1.0, 5.0).is_usable());
        assert!(!SalaryRange::new(f64::NAN, 5.0).is_usable());
    }

    #[test]
    fn last_active_deserializes_timestamps_and_raw_strings() {
        let at: LastActive = serde_json::from_str("\"2025-03-01T10:00:00Z\"").unwrap();
        assert_eq!(
            at.resolve(),
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap())
        );

        let raw: LastActive = serde_json::from_str("\"last tuesday\"").unwrap();
        assert_eq!(raw, LastActive::Raw("last tuesday".into()));
        assert_eq!(raw.resolve(), None);
    }

    #[test]
    fn job_defaults_to_active() {
        let job: Job = serde_json::from_str(r#"{"id": 3, "title": "Engineer"}"#).unwrap();
        assert!(job.active);
        assert!(!job.remote);
        assert_eq!(job.salary_range, None);
    }
}
