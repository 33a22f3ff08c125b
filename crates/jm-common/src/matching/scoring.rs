use serde::{Deserialize, Serialize};

use super::{
    Dimension, DimensionScorer, ScoringContext,
    behavior::BehaviorScorer,
    education::EducationScorer,
    experience::ExperienceScorer,
    location::LocationScorer,
    salary::SalaryScorer,
    semantic::SemanticScorer,
    skills::SkillsScorer,
    weights::{DEFAULT_WEIGHTS, Weights},
};
use crate::{Candidate, Job};

/// Per-dimension integer scores kept alongside a match for explanation.
///
/// Each value is rounded on its own, so they need not re-sum to the overall
/// score through the weights.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub skills: u8,
    pub experience: u8,
    pub education: u8,
    pub location: u8,
    pub salary: u8,
    pub semantic: u8,
    pub behavior: u8,
}

impl ScoreBreakdown {
    pub fn get(&self, dimension: Dimension) -> u8 {
        match dimension {
            Dimension::Skills => self.skills,
            Dimension::Experience => self.experience,
            Dimension::Education => self.education,
            Dimension::Location => self.location,
            Dimension::Salary => self.salary,
            Dimension::Semantic => self.semantic,
            Dimension::Behavior => self.behavior,
        }
    }

    fn set(&mut self, dimension: Dimension, value: u8) {
        let slot = match dimension {
            Dimension::Skills => &mut self.skills,
            Dimension::Experience => &mut self.experience,
            Dimension::Education => &mut self.education,
            Dimension::Location => &mut self.location,
            Dimension::Salary => &mut self.salary,
            Dimension::Semantic => &mut self.semantic,
            Dimension::Behavior => &mut self.behavior,
        };
        *slot = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Dimension, u8)> + '_ {
        Dimension::ALL.iter().map(move |d| (*d, self.get(*d)))
    }

    /// All seven values within `[0, 100]`.
    pub fn is_valid(&self) -> bool {
        self.iter().all(|(_, v)| v <= 100)
    }
}

/// Round half to even into an integer score, so `62.5` stores as 62.
pub fn round_score(value: f64) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    value.round_ties_even().clamp(0.0, 100.0) as u8
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchScore {
    /// Unrounded dimension scores in `Dimension::ALL` order.
    pub raw: [f64; 7],
    /// Unrounded weighted sum.
    pub weighted: f64,
    pub breakdown: ScoreBreakdown,
    pub overall: u8,
}

impl MatchScore {
    pub fn raw(&self, dimension: Dimension) -> f64 {
        let idx = Dimension::ALL
            .iter()
            .position(|d| *d == dimension)
            .unwrap_or_default();
        self.raw[idx]
    }
}

/// Runs the seven dimension scorers and folds them into one weighted score.
pub struct MatchScorer {
    weights: Weights,
    scorers: Vec<Box<dyn DimensionScorer>>,
}

impl Default for MatchScorer {
    fn default() -> Self {
        Self::new(DEFAULT_WEIGHTS)
    }
}

impl MatchScorer {
    pub fn new(weights: Weights) -> Self {
        let scorers: Vec<Box<dyn DimensionScorer>> = vec![
            Box::new(SkillsScorer),
            Box::new(ExperienceScorer),
            Box::new(EducationScorer),
            Box::new(LocationScorer),
            Box::new(SalaryScorer),
            Box::new(SemanticScorer),
            Box::new(BehaviorScorer),
        ];
        Self { weights, scorers }
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    pub fn score(&self, candidate: &Candidate, job: &Job, ctx: &ScoringContext<'_>) -> MatchScore {
        let mut raw = [0.0; 7];
        let mut breakdown = ScoreBreakdown::default();
        let mut weighted = 0.0;

        for scorer in &self.scorers {
            let dimension = scorer.dimension();
            let value = scorer.score(candidate, job, ctx);
            if let Some(idx) = Dimension::ALL.iter().position(|d| *d == dimension) {
                raw[idx] = value;
            }
            weighted += value * self.weights.weight(dimension);
            breakdown.set(dimension, round_score(value));
        }

        MatchScore {
            raw,
            weighted,
            breakdown,
            overall: round_score(weighted),
        }
    }
}
