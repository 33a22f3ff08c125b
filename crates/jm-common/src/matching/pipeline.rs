use std::time::Instant;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, instrument};

use super::{ScoringContext, scoring::MatchScorer, semantic::TermDocument};
use crate::{
    Candidate, Job,
    api::{ApplicantMatchSummary, CandidateMatchSummary, JobMatchSummary, MatchSummary},
    db::{CandidateFilter, JobFilter, Match, MatchRepository, MatchUpsert, RepositoryError},
};

#[derive(Debug, Error)]
pub enum MatchingError {
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Scores candidate/job pairs and keeps the persisted matches in sync.
///
/// `None` results mean the anchor entity does not exist, which callers must
/// keep distinct from a zero score.
pub struct MatchingEngine<R> {
    repository: R,
    scorer: MatchScorer,
}

impl<R: MatchRepository> MatchingEngine<R> {
    pub fn new(repository: R) -> Self {
        Self::with_scorer(repository, MatchScorer::default())
    }

    pub fn with_scorer(repository: R, scorer: MatchScorer) -> Self {
        Self { repository, scorer }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn scorer(&self) -> &MatchScorer {
        &self.scorer
    }

    /// Score one pair and upsert its match record.
    pub async fn compute_match(
        &self,
        candidate_id: i64,
        job_id: i64,
    ) -> Result<Option<MatchSummary>, MatchingError> {
        self.compute_match_at(candidate_id, job_id, Utc::now()).await
    }

    #[instrument(skip(self))]
    pub async fn compute_match_at(
        &self,
        candidate_id: i64,
        job_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<MatchSummary>, MatchingError> {
        let Some(candidate) = self.repository.find_candidate(candidate_id).await? else {
            debug!("candidate not found");
            return Ok(None);
        };
        let Some(job) = self.repository.find_job(job_id).await? else {
            debug!("job not found");
            return Ok(None);
        };

        let ctx = ScoringContext::at(now);
        let record = self.score_and_persist(&candidate, &job, &ctx).await?;
        Ok(Some(MatchSummary::from(&record)))
    }

    async fn score_and_persist(
        &self,
        candidate: &Candidate,
        job: &Job,
        ctx: &ScoringContext<'_>,
    ) -> Result<Match, RepositoryError> {
        let score = self.scorer.score(candidate, job, ctx);
        debug!(
            candidate_id = candidate.id,
            job_id = job.id,
            overall = score.overall,
            weighted = score.weighted,
            "scored pair"
        );

        self.repository
            .upsert_match(&MatchUpsert {
                candidate_id: candidate.id,
                job_id: job.id,
                overall_score: score.overall,
                breakdown: score.breakdown,
                computed_at: ctx.now,
            })
            .await
    }

    /// Rank active jobs for a candidate, best first.
    pub async fn rank_jobs_for_candidate(
        &self,
        candidate_id: i64,
        limit: usize,
    ) -> Result<Option<Vec<JobMatchSummary>>, MatchingError> {
        self.rank_jobs_for_candidate_with_filter(candidate_id, &JobFilter::default(), limit)
            .await
    }

    /// The whole filtered pool is scored and persisted before truncating to `limit`.
    #[instrument(skip(self))]
    pub async fn rank_jobs_for_candidate_with_filter(
        &self,
        candidate_id: i64,
        filter: &JobFilter,
        limit: usize,
    ) -> Result<Option<Vec<JobMatchSummary>>, MatchingError> {
        let started = Instant::now();
        let Some(candidate) = self.repository.find_candidate(candidate_id).await? else {
            debug!("candidate not found");
            return Ok(None);
        };

        let jobs = self.repository.list_jobs(filter).await?;
        let pool_size = jobs.len();
        let now = Utc::now();
        let candidate_doc = TermDocument::for_candidate(&candidate);

        let mut skipped_applied = 0usize;
        let mut ranked = Vec::with_capacity(pool_size);
        for job in jobs {
            if self.repository.has_applied(candidate.id, job.id).await? {
                skipped_applied += 1;
                continue;
            }

            let ctx = ScoringContext::at(now).with_candidate_document(&candidate_doc);
            let record = self.score_and_persist(&candidate, &job, &ctx).await?;
            ranked.push(JobMatchSummary::new(MatchSummary::from(&record), &job));
        }

        ranked.sort_by(|a, b| b.overall_score().cmp(&a.overall_score()));
        ranked.truncate(limit);

        info!(
            pool_size,
            skipped_applied,
            returned = ranked.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "ranked jobs for candidate"
        );

        Ok(Some(ranked))
    }

    /// Rank all candidates for a job, best first.
    pub async fn rank_candidates_for_job(
        &self,
        job_id: i64,
        limit: usize,
    ) -> Result<Option<Vec<CandidateMatchSummary>>, MatchingError> {
        self.rank_candidates_for_job_with_filter(job_id, &CandidateFilter::default(), limit)
            .await
    }

    #[instrument(skip(self))]
    pub async fn rank_candidates_for_job_with_filter(
        &self,
        job_id: i64,
        filter: &CandidateFilter,
        limit: usize,
    ) -> Result<Option<Vec<CandidateMatchSummary>>, MatchingError> {
        let started = Instant::now();
        let Some(job) = self.repository.find_job(job_id).await? else {
            debug!("job not found");
            return Ok(None);
        };

        let candidates = self.repository.list_candidates(filter).await?;
        let pool_size = candidates.len();
        let now = Utc::now();
        let job_doc = TermDocument::for_job(&job);

        let mut skipped_applied = 0usize;
        let mut ranked = Vec::with_capacity(pool_size);
        for candidate in candidates {
            if self.repository.has_applied(candidate.id, job.id).await? {
                skipped_applied += 1;
                continue;
            }

            let ctx = ScoringContext::at(now).with_job_document(&job_doc);
            let record = self.score_and_persist(&candidate, &job, &ctx).await?;
            ranked.push(CandidateMatchSummary::new(
                MatchSummary::from(&record),
                &candidate,
            ));
        }

        ranked.sort_by(|a, b| b.overall_score().cmp(&a.overall_score()));
        ranked.truncate(limit);

        info!(
            pool_size,
            skipped_applied,
            returned = ranked.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "ranked candidates for job"
        );

        Ok(Some(ranked))
    }

    /// Score every existing applicant to a job, in application order.
    ///
    /// Unlike bulk ranking, applied pairs are the whole pool here. Each pair is
    /// recomputed and persisted; applications whose candidate no longer exists
    /// are skipped.
    #[instrument(skip(self))]
    pub async fn score_applicants_for_job(
        &self,
        job_id: i64,
    ) -> Result<Option<Vec<ApplicantMatchSummary>>, MatchingError> {
        let started = Instant::now();
        let Some(job) = self.repository.find_job(job_id).await? else {
            debug!("job not found");
            return Ok(None);
        };

        let applications = self.repository.list_applications_for_job(job.id).await?;
        let now = Utc::now();
        let job_doc = TermDocument::for_job(&job);

        let mut scored = Vec::with_capacity(applications.len());
        for application in &applications {
            let Some(candidate) = self.repository.find_candidate(application.candidate_id).await?
            else {
                debug!(
                    application_id = application.id,
                    candidate_id = application.candidate_id,
                    "applicant gone; skipping"
                );
                continue;
            };

            let ctx = ScoringContext::at(now).with_job_document(&job_doc);
            let record = self.score_and_persist(&candidate, &job, &ctx).await?;
            scored.push(ApplicantMatchSummary::new(
                application,
                MatchSummary::from(&record),
                &candidate,
            ));
        }

        info!(
            applications = applications.len(),
            scored = scored.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "scored applicants for job"
        );

        Ok(Some(scored))
    }

    /// Persisted matches for a candidate without recomputation.
    /// Matches whose job no longer exists are skipped.
    #[instrument(skip(self))]
    pub async fn stored_matches_for_candidate(
        &self,
        candidate_id: i64,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<JobMatchSummary>, MatchingError> {
        let matches = self
            .repository
            .list_matches_for_candidate(candidate_id, limit, offset)
            .await?;

        let mut out = Vec::with_capacity(matches.len());
        for record in &matches {
            match self.repository.find_job(record.job_id).await? {
                Some(job) => out.push(JobMatchSummary::new(MatchSummary::from(record), &job)),
                None => debug!(match_id = record.id, job_id = record.job_id, "job gone; skipping"),
            }
        }
        Ok(out)
    }

    /// Persisted matches for a job without recomputation.
    #[instrument(skip(self))]
    pub async fn stored_matches_for_job(
        &self,
        job_id: i64,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CandidateMatchSummary>, MatchingError> {
        let matches = self
            .repository
            .list_matches_for_job(job_id, limit, offset)
            .await?;

        let mut out = Vec::with_capacity(matches.len());
        for record in &matches {
            match self.repository.find_candidate(record.candidate_id).await? {
                Some(candidate) => out.push(CandidateMatchSummary::new(
                    MatchSummary::from(record),
                    &candidate,
                )),
                None => debug!(
                    match_id = record.id,
                    candidate_id = record.candidate_id,
                    "candidate gone; skipping"
                ),
            }
        }
        Ok(out)
    }

    pub async fn stored_match(&self, match_id: i64) -> Result<Option<Match>, MatchingError> {
        Ok(self.repository.find_match_by_id(match_id).await?)
    }
}
