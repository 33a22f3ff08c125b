use super::{Dimension, DimensionScorer, ScoringContext, clamp_score};
use crate::{Candidate, Job, extraction::extract_years};

/// Meeting the requirement exactly lands here.
const MEETS_FLOOR: f64 = 80.0;
/// Excess ratio beyond which extra experience stops counting.
const MAX_EXCESS_RATIO: f64 = 1.5;

pub fn score_experience(candidate_years: f64, required_years: f64) -> f64 {
    if required_years <= 0.0 {
        return 100.0;
    }

    if candidate_years >= required_years {
        let excess_ratio = (candidate_years / required_years).min(MAX_EXCESS_RATIO);
        (MEETS_FLOOR + (excess_ratio - 1.0) * 40.0).min(100.0)
    } else {
        ((candidate_years / required_years) * MEETS_FLOOR).max(0.0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExperienceScorer;

impl DimensionScorer for ExperienceScorer {
    fn dimension(&self) -> Dimension {
        Dimension::Experience
    }

    fn score(&self, candidate: &Candidate, job: &Job, _ctx: &ScoringContext<'_>) -> f64 {
        let required = extract_years(&job.description).unwrap_or(0.0);
        clamp_score(
            Dimension::Experience,
            score_experience(candidate.experience_years, required),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_requirement_is_full_marks() {
        assert_eq!(score_experience(0.0, 0.0), 100.0);
        assert_eq!(score_experience(12.0, 0.0), 100.0);
    }

    #[test]
    fn meeting_exactly_floors_at_eighty() {
        assert_eq!(score_experience(4.0, 4.0), 80.0);
    }

    #[test]
    fn excess_caps_at_one_hundred() {
        assert!((score_experience(5.0, 4.0) - 90.0).abs() < 1e-9);
        assert_eq!(score_experience(6.0, 4.0), 100.0);
        assert_eq!(score_experience(40.0, 4.0), 100.0);
    }

    #[test]
    fn shortfall_is_linear() {
        assert_eq!(score_experience(2.0, 4.0), 40.0);
        assert_eq!(score_experience(0.0, 4.0), 0.0);
    }

    #[test]
    fn scorer_reads_requirement_from_description() {
        let candidate = Candidate {
            experience_years: 4.0,
            ..Candidate::default()
        };
        let job = Job {
            description: "3-5 years experience required".into(),
            ..Job::default()
        };
        let ctx = ScoringContext::now();
        assert_eq!(ExperienceScorer.score(&candidate, &job, &ctx), 80.0);

        let open = Job {
            description: "No experience needed".into(),
            ..Job::default()
        };
        assert_eq!(ExperienceScorer.score(&candidate, &open, &ctx), 100.0);
    }
}
