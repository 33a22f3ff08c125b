use chrono::{DateTime, Utc};

use super::{Dimension, DimensionScorer, ScoringContext, clamp_score};
use crate::{Candidate, Job};

const RECENT_DAYS: i64 = 7;
const RECENT_BONUS: f64 = 10.0;
const MONTH_DAYS: i64 = 30;
const MONTH_BONUS: f64 = 5.0;

/// Profile completeness plus a recency bonus for recently active candidates.
pub fn score_behavior(
    profile_complete: f64,
    last_active: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> f64 {
    let base = profile_complete;
    let Some(last_active) = last_active else {
        return base;
    };

    // Whole days idle; a partial eighth day still counts as within the week.
    let idle_days = (now - last_active).num_days();
    if idle_days <= RECENT_DAYS {
        (base + RECENT_BONUS).min(100.0)
    } else if idle_days <= MONTH_DAYS {
        (base + MONTH_BONUS).min(100.0)
    } else {
        base
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BehaviorScorer;

impl DimensionScorer for BehaviorScorer {
    fn dimension(&self) -> Dimension {
        Dimension::Behavior
    }

    fn score(&self, candidate: &Candidate, _job: &Job, ctx: &ScoringContext<'_>) -> f64 {
        let last_active = candidate.last_active.as_ref().and_then(|at| at.resolve());
        clamp_score(
            Dimension::Behavior,
            score_behavior(candidate.profile_complete, last_active, ctx.now),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LastActive;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 30, 12, 0, 0).unwrap()
    }

    #[test]
    fn no_activity_keeps_base() {
        assert_eq!(score_behavior(60.0, None, now()), 60.0);
    }

    #[test]
    fn recency_bonuses() {
        let n = now();
        assert_eq!(score_behavior(60.0, Some(n - Duration::days(2)), n), 70.0);
        assert_eq!(score_behavior(60.0, Some(n - Duration::days(7)), n), 70.0);
        assert_eq!(
            score_behavior(60.0, Some(n - Duration::days(7) - Duration::hours(23)), n),
            70.0
        );
        assert_eq!(score_behavior(60.0, Some(n - Duration::days(20)), n), 65.0);
        assert_eq!(score_behavior(60.0, Some(n - Duration::days(45)), n), 60.0);
    }

    #[test]
    fn bonus_is_capped() {
        let n = now();
        assert_eq!(score_behavior(95.0, Some(n - Duration::hours(1)), n), 100.0);
    }

    #[test]
    fn unparsable_timestamp_is_treated_as_absent() {
        let candidate = Candidate {
            profile_complete: 40.0,
            last_active: Some(LastActive::Raw("not a date".into())),
            ..Candidate::default()
        };
        let ctx = ScoringContext::at(now());
        assert_eq!(BehaviorScorer.score(&candidate, &Job::default(), &ctx), 40.0);
    }

    #[test]
    fn raw_iso_strings_are_parsed() {
        let candidate = Candidate {
            profile_complete: 40.0,
            last_active: Some(LastActive::Raw("2025-06-25T08:00:00".into())),
            ..Candidate::default()
        };
        let ctx = ScoringContext::at(now());
        assert_eq!(BehaviorScorer.score(&candidate, &Job::default(), &ctx), 50.0);
    }

    #[test]
    fn out_of_range_completeness_is_clamped() {
        let candidate = Candidate {
            profile_complete: 140.0,
            ..Candidate::default()
        };
        let ctx = ScoringContext::at(now());
        assert_eq!(BehaviorScorer.score(&candidate, &Job::default(), &ctx), 100.0);
    }
}
