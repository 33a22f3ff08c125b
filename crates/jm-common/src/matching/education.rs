use super::{Dimension, DimensionScorer, ScoringContext, clamp_score};
use crate::{
    Candidate, Job,
    extraction::{EducationLevel, candidate_education_level, extract_education_level},
};

/// Compare a candidate level against a job requirement.
///
/// No recognizable job requirement means there is no floor to clear (100).
/// A candidate without a recognizable level counts as 0.
pub fn score_education(
    candidate: Option<EducationLevel>,
    required: Option<EducationLevel>,
) -> f64 {
    let Some(required) = required else {
        return 100.0;
    };
    let required_level = required.score();
    let candidate_level = candidate.map(|level| level.score()).unwrap_or(0.0);

    if candidate_level >= required_level {
        100.0
    } else {
        (candidate_level / required_level * 100.0).max(0.0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EducationScorer;

impl DimensionScorer for EducationScorer {
    fn dimension(&self) -> Dimension {
        Dimension::Education
    }

    fn score(&self, candidate: &Candidate, job: &Job, _ctx: &ScoringContext<'_>) -> f64 {
        let candidate_level = candidate_education_level(&candidate.education);
        let required = extract_education_level(&job.description);
        clamp_score(
            Dimension::Education,
            score_education(candidate_level, required),
        )
    }
}
