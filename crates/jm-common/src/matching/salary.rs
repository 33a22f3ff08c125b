use super::{Dimension, DimensionScorer, ScoringContext, clamp_score};
use crate::{Candidate, Job, SalaryRange};

const NEUTRAL: f64 = 50.0;
const MAX_GAP_PENALTY: f64 = 50.0;

/// Range-overlap salary score.
///
/// Missing or malformed ranges, and job ranges with a zero bound, are
/// "insufficient data" and score neutral rather than being penalized.
pub fn score_salary(candidate: Option<SalaryRange>, job: Option<SalaryRange>) -> f64 {
    let (Some(candidate), Some(job)) = (candidate, job) else {
        return NEUTRAL;
    };
    if !candidate.is_usable() || !job.is_usable() || job.has_zero_bound() {
        return NEUTRAL;
    }

    let overlap_lo = candidate.min().max(job.min());
    let overlap_hi = candidate.max().min(job.max());

    if overlap_lo > overlap_hi {
        // Candidate floor above the job ceiling, or the job pays more than the
        // candidate's ceiling. Each gap is normalized by that side's own maximum.
        let (gap, normalizer) = if candidate.min() > job.max() {
            (candidate.min() - job.max(), job.max())
        } else {
            (job.min() - candidate.max(), candidate.max())
        };

        let penalty = if normalizer > 0.0 {
            (gap / normalizer * 100.0).min(MAX_GAP_PENALTY)
        } else {
            MAX_GAP_PENALTY
        };
        return (NEUTRAL - penalty).max(0.0);
    }

    let overlap = overlap_hi - overlap_lo;
    let share = |span: f64| if span > 0.0 { overlap / span } else { 0.0 };
    let overlap_pct = (share(candidate.span()) + share(job.span())) / 2.0;

    (NEUTRAL + overlap_pct * 50.0).min(100.0)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SalaryScorer;

impl DimensionScorer for SalaryScorer {
    fn dimension(&self) -> Dimension {
        Dimension::Salary
    }

    fn score(&self, candidate: &Candidate, job: &Job, _ctx: &ScoringContext<'_>) -> f64 {
        clamp_score(
            Dimension::Salary,
            score_salary(candidate.salary_expectation, job.salary_range),
        )
    }
}
