pub mod behavior;
pub mod education;
pub mod experience;
pub mod location;
pub mod pipeline;
pub mod salary;
pub mod scoring;
pub mod semantic;
pub mod skills;
pub mod weights;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Candidate, Job};
use semantic::TermDocument;

pub use pipeline::{MatchingEngine, MatchingError};
pub use scoring::{MatchScore, MatchScorer, ScoreBreakdown};
pub use weights::{DEFAULT_WEIGHTS, Weights};

/// The seven independent scoring dimensions, in breakdown order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Skills,
    Experience,
    Education,
    Location,
    Salary,
    Semantic,
    Behavior,
}

impl Dimension {
    pub const ALL: [Dimension; 7] = [
        Dimension::Skills,
        Dimension::Experience,
        Dimension::Education,
        Dimension::Location,
        Dimension::Salary,
        Dimension::Semantic,
        Dimension::Behavior,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Skills => "skills",
            Dimension::Experience => "experience",
            Dimension::Education => "education",
            Dimension::Location => "location",
            Dimension::Salary => "salary",
            Dimension::Semantic => "semantic",
            Dimension::Behavior => "behavior",
        }
    }

    /// Value a dimension collapses to when its computation degenerates.
    pub fn neutral_score(&self) -> f64 {
        match self {
            Dimension::Salary | Dimension::Semantic => 50.0,
            _ => 0.0,
        }
    }
}

/// Per-call inputs shared by every scorer for one (candidate, job) pair.
#[derive(Debug, Clone)]
pub struct ScoringContext<'a> {
    /// Reference instant for recency checks.
    pub now: DateTime<Utc>,
    /// Pre-tokenized candidate document, reused across a bulk run.
    pub candidate_document: Option<&'a TermDocument>,
    pub job_document: Option<&'a TermDocument>,
}

impl<'a> ScoringContext<'a> {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            candidate_document: None,
            job_document: None,
        }
    }

    pub fn now() -> Self {
        Self::at(Utc::now())
    }

    pub fn with_candidate_document(mut self, document: &'a TermDocument) -> Self {
        self.candidate_document = Some(document);
        self
    }

    pub fn with_job_document(mut self, document: &'a TermDocument) -> Self {
        self.job_document = Some(document);
        self
    }
}

/// Common `(candidate, job) -> score` contract consumed by the aggregator.
pub trait DimensionScorer: Send + Sync {
    fn dimension(&self) -> Dimension;

    /// Score in `[0, 100]`. Never fails for well-shaped input.
    fn score(&self, candidate: &Candidate, job: &Job, ctx: &ScoringContext<'_>) -> f64;
}

/// Clamp a raw dimension value into `[0, 100]`, falling back to the
/// dimension's neutral value when the computation produced NaN or infinity.
pub fn clamp_score(dimension: Dimension, raw: f64) -> f64 {
    if raw.is_finite() {
        raw.clamp(0.0, 100.0)
    } else {
        dimension.neutral_score()
    }
}
