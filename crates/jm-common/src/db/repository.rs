#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use deadpool_postgres::PoolError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_postgres::Error as PgError;

use crate::{Candidate, Job, matching::ScoreBreakdown};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
    #[error("failed to map row: {0}")]
    Mapping(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Persisted compatibility record for one (candidate, job) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: i64,
    pub candidate_id: i64,
    pub job_id: i64,
    pub overall_score: u8,
    pub breakdown: ScoreBreakdown,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A candidate's application to a job, owned by the application service.
/// At most one per (candidate, job) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Application {
    #[serde(default)]
    pub id: i64,
    pub candidate_id: i64,
    pub job_id: i64,
}

/// Write side of a match. `computed_at` becomes `updated_at`, and also
/// `created_at` when the pair has no record yet.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchUpsert {
    pub candidate_id: i64,
    pub job_id: i64,
    pub overall_score: u8,
    pub breakdown: ScoreBreakdown,
    pub computed_at: DateTime<Utc>,
}

/// Pool filter for job-centric ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFilter {
    pub active_only: bool,
    /// Case-insensitive substring of the job location.
    pub location: Option<String>,
    /// Keep jobs listing any of these in required or preferred skills.
    pub skills: Vec<String>,
    pub remote: Option<bool>,
}

impl Default for JobFilter {
    fn default() -> Self {
        Self {
            active_only: true,
            location: None,
            skills: Vec::new(),
            remote: None,
        }
    }
}

impl JobFilter {
    pub fn all() -> Self {
        Self {
            active_only: false,
            ..Self::default()
        }
    }

    pub fn matches(&self, job: &Job) -> bool {
        if self.active_only && !job.active {
            return false;
        }
        if let Some(remote) = self.remote {
            if job.remote != remote {
                return false;
            }
        }
        if let Some(location) = self.location.as_deref() {
            if !contains_ignore_case(&job.location, location) {
                return false;
            }
        }
        if !self.skills.is_empty() {
            let wanted = self.lowercased_skills();
            let listed_any = job
                .required_skills
                .iter()
                .chain(job.preferred_skills.iter())
                .any(|s| wanted.contains(&s.trim().to_lowercase()));
            if !listed_any {
                return false;
            }
        }
        true
    }

    pub fn lowercased_skills(&self) -> Vec<String> {
        self.skills.iter().map(|s| s.trim().to_lowercase()).collect()
    }
}

/// Pool filter for candidate-centric ranking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateFilter {
    pub location: Option<String>,
}

impl CandidateFilter {
    pub fn matches(&self, candidate: &Candidate) -> bool {
        match self.location.as_deref() {
            Some(location) => contains_ignore_case(&candidate.location, location),
            None => true,
        }
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Data-access seam consumed by the matching engine.
///
/// `upsert_match` must be atomic per pair: concurrent calls for the same
/// (candidate, job) never produce two records.
pub trait MatchRepository {
    async fn find_candidate(&self, id: i64) -> Result<Option<Candidate>, RepositoryError>;

    async fn find_job(&self, id: i64) -> Result<Option<Job>, RepositoryError>;

    async fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>, RepositoryError>;

    async fn list_candidates(
        &self,
        filter: &CandidateFilter,
    ) -> Result<Vec<Candidate>, RepositoryError>;

    async fn has_applied(&self, candidate_id: i64, job_id: i64) -> Result<bool, RepositoryError>;

    /// Applications to a job, oldest first.
    async fn list_applications_for_job(
        &self,
        job_id: i64,
    ) -> Result<Vec<Application>, RepositoryError>;

    async fn find_match(
        &self,
        candidate_id: i64,
        job_id: i64,
    ) -> Result<Option<Match>, RepositoryError>;

    async fn find_match_by_id(&self, match_id: i64) -> Result<Option<Match>, RepositoryError>;

    async fn upsert_match(&self, upsert: &MatchUpsert) -> Result<Match, RepositoryError>;

    /// Stored matches for a candidate, best first.
    async fn list_matches_for_candidate(
        &self,
        candidate_id: i64,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Match>, RepositoryError>;

    /// Stored matches for a job, best first.
    async fn list_matches_for_job(
        &self,
        job_id: i64,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Match>, RepositoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_job_filter_keeps_active_only() {
        let filter = JobFilter::default();
        let inactive = Job {
            active: false,
            ..Job::default()
        };
        assert!(filter.matches(&Job::default()));
        assert!(!filter.matches(&inactive));
        assert!(JobFilter::all().matches(&inactive));
    }

    #[test]
    fn job_filter_location_and_skills() {
        let job = Job {
            location: "Austin, TX, USA".into(),
            required_skills: vec!["Rust".into()],
            preferred_skills: vec!["Kafka".into()],
            ..Job::default()
        };

        let by_location = JobFilter {
            location: Some("tx".into()),
            ..JobFilter::default()
        };
        assert!(by_location.matches(&job));

        let by_skill = JobFilter {
            skills: vec!["kafka".into(), "go".into()],
            ..JobFilter::default()
        };
        assert!(by_skill.matches(&job));

        let miss = JobFilter {
            skills: vec!["java".into()],
            ..JobFilter::default()
        };
        assert!(!miss.matches(&job));

        let onsite_only = JobFilter {
            remote: Some(true),
            ..JobFilter::default()
        };
        assert!(!onsite_only.matches(&job));
    }

    #[test]
    fn candidate_filter_by_location() {
        let candidate = Candidate {
            location: "Berlin, Germany".into(),
            ..Candidate::default()
        };
        assert!(CandidateFilter::default().matches(&candidate));
        assert!(
            CandidateFilter {
                location: Some("GERMANY".into())
            }
            .matches(&candidate)
        );
        assert!(
            !CandidateFilter {
                location: Some("France".into())
            }
            .matches(&candidate)
        );
    }
}
