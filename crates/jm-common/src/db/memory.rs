use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        RwLock, RwLockReadGuard, RwLockWriteGuard,
        atomic::{AtomicBool, Ordering},
    },
};

use serde::{Deserialize, Serialize};

use super::repository::{
    Application, CandidateFilter, JobFilter, Match, MatchRepository, MatchUpsert, RepositoryError,
};
use crate::{Candidate, Job};

/// Seed data for an in-memory repository, loadable from JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Fixtures {
    pub candidates: Vec<Candidate>,
    pub jobs: Vec<Job>,
    pub applications: Vec<Application>,
}

#[derive(Debug, Default)]
struct State {
    candidates: BTreeMap<i64, Candidate>,
    jobs: BTreeMap<i64, Job>,
    applications: BTreeMap<i64, Application>,
    applied_pairs: HashMap<(i64, i64), i64>,
    next_application_id: i64,
    matches: BTreeMap<i64, Match>,
    by_pair: HashMap<(i64, i64), i64>,
    next_match_id: i64,
}

impl State {
    /// One application per pair; ids of 0 are assigned here.
    fn apply(&mut self, mut application: Application) -> Application {
        let pair = (application.candidate_id, application.job_id);
        if let Some(existing) = self
            .applied_pairs
            .get(&pair)
            .and_then(|id| self.applications.get(id))
        {
            return *existing;
        }

        if application.id <= 0 {
            application.id = self.next_application_id + 1;
        }
        self.next_application_id = self.next_application_id.max(application.id);
        self.applied_pairs.insert(pair, application.id);
        self.applications.insert(application.id, application);
        application
    }
}

/// Process-local `MatchRepository`. The write lock makes each upsert atomic
/// with respect to its pair lookup.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    state: RwLock<State>,
    fail_upserts: AtomicBool,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixtures(fixtures: Fixtures) -> Self {
        let repo = Self::new();
        {
            let mut state = repo.state.write().unwrap_or_else(|e| e.into_inner());
            for candidate in fixtures.candidates {
                state.candidates.insert(candidate.id, candidate);
            }
            for job in fixtures.jobs {
                state.jobs.insert(job.id, job);
            }
            for application in fixtures.applications {
                state.apply(application);
            }
        }
        repo
    }

    pub fn insert_candidate(&self, candidate: Candidate) -> Result<(), RepositoryError> {
        self.write()?.candidates.insert(candidate.id, candidate);
        Ok(())
    }

    pub fn insert_job(&self, job: Job) -> Result<(), RepositoryError> {
        self.write()?.jobs.insert(job.id, job);
        Ok(())
    }

    pub fn remove_job(&self, job_id: i64) -> Result<Option<Job>, RepositoryError> {
        Ok(self.write()?.jobs.remove(&job_id))
    }

    pub fn record_application(
        &self,
        candidate_id: i64,
        job_id: i64,
    ) -> Result<Application, RepositoryError> {
        Ok(self.write()?.apply(Application {
            id: 0,
            candidate_id,
            job_id,
        }))
    }

    /// Make subsequent upserts fail, simulating an unacknowledged write.
    pub fn set_fail_upserts(&self, fail: bool) {
        self.fail_upserts.store(fail, Ordering::SeqCst);
    }

    pub fn match_count(&self) -> Result<usize, RepositoryError> {
        Ok(self.read()?.matches.len())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, RepositoryError> {
        self.state
            .read()
            .map_err(|_| RepositoryError::Unavailable("in-memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, RepositoryError> {
        self.state
            .write()
            .map_err(|_| RepositoryError::Unavailable("in-memory store lock poisoned".into()))
    }

    fn page(mut matches: Vec<Match>, limit: usize, offset: usize) -> Vec<Match> {
        matches.sort_by(|a, b| {
            b.overall_score
                .cmp(&a.overall_score)
                .then_with(|| a.id.cmp(&b.id))
        });
        matches.into_iter().skip(offset).take(limit).collect()
    }
}

impl MatchRepository for InMemoryRepository {
    async fn find_candidate(&self, id: i64) -> Result<Option<Candidate>, RepositoryError> {
        Ok(self.read()?.candidates.get(&id).cloned())
    }

    async fn find_job(&self, id: i64) -> Result<Option<Job>, RepositoryError> {
        Ok(self.read()?.jobs.get(&id).cloned())
    }

    async fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>, RepositoryError> {
        Ok(self
            .read()?
            .jobs
            .values()
            .filter(|job| filter.matches(job))
            .cloned()
            .collect())
    }

    async fn list_candidates(
        &self,
        filter: &CandidateFilter,
    ) -> Result<Vec<Candidate>, RepositoryError> {
        Ok(self
            .read()?
            .candidates
            .values()
            .filter(|candidate| filter.matches(candidate))
            .cloned()
            .collect())
    }

    async fn has_applied(&self, candidate_id: i64, job_id: i64) -> Result<bool, RepositoryError> {
        Ok(self
            .read()?
            .applied_pairs
            .contains_key(&(candidate_id, job_id)))
    }

    async fn list_applications_for_job(
        &self,
        job_id: i64,
    ) -> Result<Vec<Application>, RepositoryError> {
        Ok(self
            .read()?
            .applications
            .values()
            .filter(|application| application.job_id == job_id)
            .copied()
            .collect())
    }

    async fn find_match(
        &self,
        candidate_id: i64,
        job_id: i64,
    ) -> Result<Option<Match>, RepositoryError> {
        let state = self.read()?;
        Ok(state
            .by_pair
            .get(&(candidate_id, job_id))
            .and_then(|id| state.matches.get(id))
            .cloned())
    }

    async fn find_match_by_id(&self, match_id: i64) -> Result<Option<Match>, RepositoryError> {
        Ok(self.read()?.matches.get(&match_id).cloned())
    }

    async fn upsert_match(&self, upsert: &MatchUpsert) -> Result<Match, RepositoryError> {
        if self.fail_upserts.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "match upsert was not acknowledged".into(),
            ));
        }

        let mut state = self.write()?;
        let pair = (upsert.candidate_id, upsert.job_id);

        if let Some(id) = state.by_pair.get(&pair).copied() {
            if let Some(existing) = state.matches.get_mut(&id) {
                existing.overall_score = upsert.overall_score;
                existing.breakdown = upsert.breakdown;
                existing.updated_at = upsert.computed_at;
                return Ok(existing.clone());
            }
        }

        state.next_match_id += 1;
        let record = Match {
            id: state.next_match_id,
            candidate_id: upsert.candidate_id,
            job_id: upsert.job_id,
            overall_score: upsert.overall_score,
            breakdown: upsert.breakdown,
            created_at: upsert.computed_at,
            updated_at: upsert.computed_at,
        };
        state.by_pair.insert(pair, record.id);
        state.matches.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_matches_for_candidate(
        &self,
        candidate_id: i64,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Match>, RepositoryError> {
        let matches = self
            .read()?
            .matches
            .values()
            .filter(|m| m.candidate_id == candidate_id)
            .cloned()
            .collect();
        Ok(Self::page(matches, limit, offset))
    }

    async fn list_matches_for_job(
        &self,
        job_id: i64,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Match>, RepositoryError> {
        let matches = self
            .read()?
            .matches
            .values()
            .filter(|m| m.job_id == job_id)
            .cloned()
            .collect();
        Ok(Self::page(matches, limit, offset))
    }
}
