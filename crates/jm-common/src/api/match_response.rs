use serde::{Deserialize, Serialize};

use crate::{
    Candidate, Job, SalaryRange,
    db::{Application, Match},
    matching::ScoreBreakdown,
};

/// Result of scoring one (candidate, job) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub match_id: i64,
    /// Overall score (0-100)
    pub overall_score: u8,
    pub breakdown: ScoreBreakdown,
}

impl From<&Match> for MatchSummary {
    fn from(record: &Match) -> Self {
        Self {
            match_id: record.id,
            overall_score: record.overall_score,
            breakdown: record.breakdown,
        }
    }
}

/// Job-centric ranking entry, as shown to a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMatchSummary {
    #[serde(flatten)]
    pub summary: MatchSummary,
    pub job_id: i64,
    pub job_title: String,
    pub company_name: Option<String>,
    pub location: String,
    pub remote: bool,
    pub salary_range: Option<SalaryRange>,
}

impl JobMatchSummary {
    pub fn new(summary: MatchSummary, job: &Job) -> Self {
        Self {
            summary,
            job_id: job.id,
            job_title: job.title.clone(),
            company_name: job.company_name.clone(),
            location: job.location.clone(),
            remote: job.remote,
            salary_range: job.salary_range,
        }
    }

    pub fn overall_score(&self) -> u8 {
        self.summary.overall_score
    }
}

/// Candidate-centric ranking entry, as shown to an employer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMatchSummary {
    #[serde(flatten)]
    pub summary: MatchSummary,
    pub candidate_id: i64,
    pub candidate_name: String,
    pub candidate_location: String,
    pub candidate_skills: Vec<String>,
    pub candidate_experience: f64,
}

impl CandidateMatchSummary {
    pub fn new(summary: MatchSummary, candidate: &Candidate) -> Self {
        Self {
            summary,
            candidate_id: candidate.id,
            candidate_name: candidate.name.clone(),
            candidate_location: candidate.location.clone(),
            candidate_skills: candidate.skills.clone(),
            candidate_experience: candidate.experience_years,
        }
    }

    pub fn overall_score(&self) -> u8 {
        self.summary.overall_score
    }
}

/// An existing applicant to a job, scored for the employer's review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantMatchSummary {
    pub application_id: i64,
    #[serde(flatten)]
    pub summary: MatchSummary,
    pub candidate_id: i64,
    pub candidate_name: String,
    pub candidate_location: String,
    pub candidate_skills: Vec<String>,
}

impl ApplicantMatchSummary {
    pub fn new(application: &Application, summary: MatchSummary, candidate: &Candidate) -> Self {
        Self {
            application_id: application.id,
            summary,
            candidate_id: candidate.id,
            candidate_name: candidate.name.clone(),
            candidate_location: candidate.location.clone(),
            candidate_skills: candidate.skills.clone(),
        }
    }

    pub fn overall_score(&self) -> u8 {
        self.summary.overall_score
    }
}
