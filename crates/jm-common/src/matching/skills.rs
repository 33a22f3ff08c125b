use std::collections::HashSet;

use super::{Dimension, DimensionScorer, ScoringContext, clamp_score};
use crate::{Candidate, Job};

const REQUIRED_SHARE: f64 = 0.7;
const PREFERRED_SHARE: f64 = 0.3;

/// Case-insensitive skill set. Blank entries are dropped.
pub fn normalize_skill_set(skills: &[String]) -> HashSet<String> {
    skills
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// `|candidate ∩ wanted| / max(|wanted|, 1)`
fn overlap_ratio(candidate: &HashSet<String>, wanted: &HashSet<String>) -> f64 {
    let matched = wanted.intersection(candidate).count();
    matched as f64 / wanted.len().max(1) as f64
}

pub fn score_skills(
    candidate_skills: &[String],
    required_skills: &[String],
    preferred_skills: &[String],
) -> f64 {
    let candidate = normalize_skill_set(candidate_skills);
    let required = normalize_skill_set(required_skills);
    let preferred = normalize_skill_set(preferred_skills);

    let required_match = overlap_ratio(&candidate, &required);
    let preferred_match = overlap_ratio(&candidate, &preferred);

    ((REQUIRED_SHARE * required_match + PREFERRED_SHARE * preferred_match) * 100.0).min(100.0)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SkillsScorer;

impl DimensionScorer for SkillsScorer {
    fn dimension(&self) -> Dimension {
        Dimension::Skills
    }

    fn score(&self, candidate: &Candidate, job: &Job, _ctx: &ScoringContext<'_>) -> f64 {
        let raw = score_skills(
            &candidate.skills,
            &job.required_skills,
            &job.preferred_skills,
        );
        clamp_score(Dimension::Skills, raw)
    }
}
