use super::{Dimension, DimensionScorer, ScoringContext, clamp_score};
use crate::{Candidate, Job};

const SEGMENT_SEPARATOR: &str = ", ";

const EXACT_MATCH: f64 = 100.0;
const CITY_MATCH: f64 = 90.0;
const REGION_MATCH: f64 = 80.0;
const COUNTRY_MATCH: f64 = 70.0;

/// Hierarchical location comparison ("City, State, Country", most specific first).
///
/// The first candidate segment that also appears in the job decides the result,
/// even when a more specific shared segment exists further along.
pub fn score_location(candidate_location: &str, job_location: &str, remote: bool) -> f64 {
    if remote {
        return EXACT_MATCH;
    }

    let candidate = candidate_location.to_lowercase();
    let job = job_location.to_lowercase();

    if candidate == job {
        return EXACT_MATCH;
    }

    let candidate_parts: Vec<&str> = candidate.split(SEGMENT_SEPARATOR).collect();
    let job_parts: Vec<&str> = job.split(SEGMENT_SEPARATOR).collect();

    let Some(shared) = candidate_parts
        .iter()
        .find(|segment| job_parts.contains(segment))
    else {
        return 0.0;
    };

    // Positions are the first occurrence of the segment on each side.
    let candidate_idx = candidate_parts.iter().position(|s| s == shared);
    let job_idx = job_parts.iter().position(|s| s == shared);

    match (candidate_idx, job_idx) {
        (Some(0), Some(0)) => CITY_MATCH,
        (Some(c), Some(j)) if c == candidate_parts.len() - 1 && j == job_parts.len() - 1 => {
            COUNTRY_MATCH
        }
        _ => REGION_MATCH,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocationScorer;

impl DimensionScorer for LocationScorer {
    fn dimension(&self) -> Dimension {
        Dimension::Location
    }

    fn score(&self, candidate: &Candidate, job: &Job, _ctx: &ScoringContext<'_>) -> f64 {
        clamp_score(
            Dimension::Location,
            score_location(&candidate.location, &job.location, job.remote),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_ignores_locations() {
        assert_eq!(score_location("Berlin, Germany", "Tokyo, Japan", true), 100.0);
        assert_eq!(score_location("", "", true), 100.0);
    }

    #[test]
    fn exact_match_is_case_insensitive() {
        assert_eq!(
            score_location("Austin, TX, USA", "austin, tx, usa", false),
            100.0
        );
    }

    #[test]
    fn city_region_and_country_levels() {
        assert_eq!(score_location("Austin, TX", "Austin, Texas", false), 90.0);
        assert_eq!(score_location("Dallas, TX, USA", "Austin, TX, USA", false), 80.0);
        assert_eq!(score_location("Paris, France", "Lyon, France", false), 70.0);
    }

    #[test]
    fn first_shared_segment_decides() {
        // "tx" is found first on the candidate side even though "usa" is also shared.
        assert_eq!(score_location("TX, USA", "Austin, TX, USA", false), 80.0);
    }

    #[test]
    fn no_shared_segment_scores_zero() {
        assert_eq!(score_location("Berlin, Germany", "Tokyo, Japan", false), 0.0);
        assert_eq!(score_location("", "Tokyo, Japan", false), 0.0);
    }

    #[test]
    fn single_segment_match_counts_as_city() {
        // A one-element shared segment is both first and last; first wins.
        assert_eq!(score_location("Remote", "Remote, Anywhere", false), 90.0);
    }
}
