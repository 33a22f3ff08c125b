use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

// "3-5 years" (averaged) or "5+ years" / "2 years"; the leftmost hit wins.
static YEARS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+)\s*-\s*(\d+)\s*years?|(\d+)\+?\s*years?")
        .expect("years pattern compiles")
});

/// Ordinal education levels. Numeric values are the weights used by the
/// education scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EducationLevel {
    HighSchool,
    Certificate,
    Associate,
    Bachelor,
    Master,
    Phd,
    Doctorate,
}

impl EducationLevel {
    /// Candidate-side scan order; the first keyword contained in the text wins.
    pub const MAP_ORDER: [EducationLevel; 7] = [
        EducationLevel::HighSchool,
        EducationLevel::Certificate,
        EducationLevel::Associate,
        EducationLevel::Bachelor,
        EducationLevel::Master,
        EducationLevel::Phd,
        EducationLevel::Doctorate,
    ];

    /// Job-side scan order, highest requirement first.
    pub const PRIORITY_ORDER: [EducationLevel; 7] = [
        EducationLevel::Phd,
        EducationLevel::Doctorate,
        EducationLevel::Master,
        EducationLevel::Bachelor,
        EducationLevel::Associate,
        EducationLevel::Certificate,
        EducationLevel::HighSchool,
    ];

    pub fn keyword(&self) -> &'static str {
        match self {
            EducationLevel::HighSchool => "high school",
            EducationLevel::Certificate => "certificate",
            EducationLevel::Associate => "associate",
            EducationLevel::Bachelor => "bachelor",
            EducationLevel::Master => "master",
            EducationLevel::Phd => "phd",
            EducationLevel::Doctorate => "doctorate",
        }
    }

    pub fn score(&self) -> f64 {
        match self {
            EducationLevel::HighSchool => 20.0,
            EducationLevel::Certificate => 30.0,
            EducationLevel::Associate => 40.0,
            EducationLevel::Bachelor => 60.0,
            EducationLevel::Master => 80.0,
            EducationLevel::Phd | EducationLevel::Doctorate => 100.0,
        }
    }
}

/// Required years of experience implied by free text.
pub fn extract_years(text: &str) -> Option<f64> {
    let caps = YEARS_RE.captures(text)?;

    if let (Some(lo), Some(hi)) = (caps.get(1), caps.get(2)) {
        let lo = lo.as_str().parse::<f64>().ok()?;
        let hi = hi.as_str().parse::<f64>().ok()?;
        return Some((lo + hi) / 2.0);
    }

    caps.get(3)?.as_str().parse::<f64>().ok()
}

/// Education requirement stated in a job text, highest level first.
///
/// A bare "degree" mention is recognized but carries no level, so it yields `None`.
pub fn extract_education_level(text: &str) -> Option<EducationLevel> {
    let lowered = text.to_lowercase();
    first_level_in(&lowered, &EducationLevel::PRIORITY_ORDER)
}

/// Education level of a candidate descriptor, scanned in ordinal-map order.
pub fn candidate_education_level(text: &str) -> Option<EducationLevel> {
    let lowered = text.to_lowercase();
    first_level_in(&lowered, &EducationLevel::MAP_ORDER)
}

fn first_level_in(lowered: &str, order: &[EducationLevel]) -> Option<EducationLevel> {
    order
        .iter()
        .copied()
        .find(|level| lowered.contains(level.keyword()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_range_as_midpoint() {
        assert_eq!(extract_years("3-5 years experience required"), Some(4.0));
        assert_eq!(extract_years("Needs 2 - 6 Years in the field"), Some(4.0));
    }

    #[test]
    fn extracts_single_values() {
        assert_eq!(extract_years("5+ years of Rust"), Some(5.0));
        assert_eq!(extract_years("at least 1 year"), Some(1.0));
    }

    #[test]
    fn first_match_wins() {
        assert_eq!(extract_years("2+ years backend, 10 years total"), Some(2.0));
    }

    #[test]
    fn no_years_mentioned() {
        assert_eq!(extract_years("Join our friendly team"), None);
        assert_eq!(extract_years(""), None);
    }

    #[test]
    fn job_level_prefers_highest_keyword() {
        assert_eq!(
            extract_education_level("Bachelor required, Master preferred"),
            Some(EducationLevel::Master)
        );
        assert_eq!(
            extract_education_level("PhD in physics"),
            Some(EducationLevel::Phd)
        );
        assert_eq!(extract_education_level("Any degree welcome"), None);
    }

    #[test]
    fn candidate_level_uses_map_order() {
        // "high school" precedes "master" in the map order.
        assert_eq!(
            candidate_education_level("High School diploma, Master of Arts"),
            Some(EducationLevel::HighSchool)
        );
        assert_eq!(
            candidate_education_level("Bachelor of Science"),
            Some(EducationLevel::Bachelor)
        );
        assert_eq!(candidate_education_level("self taught"), None);
    }

    #[test]
    fn level_scores_follow_ordinal_map() {
        assert_eq!(EducationLevel::HighSchool.score(), 20.0);
        assert_eq!(EducationLevel::Bachelor.score(), 60.0);
        assert_eq!(EducationLevel::Doctorate.score(), EducationLevel::Phd.score());
    }
}
