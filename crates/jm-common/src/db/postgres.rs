use tokio_postgres::{Row, types::Json};
use tracing::instrument;

use super::{
    PgPool,
    repository::{
        Application, CandidateFilter, JobFilter, Match, MatchRepository, MatchUpsert,
        RepositoryError,
    },
    util::{TimedClientExt, json_param},
};
use crate::{Candidate, Job, LastActive, SalaryRange, matching::ScoreBreakdown};

const CANDIDATE_COLUMNS: &str = "c.id, c.name, c.location, c.skills, c.experience_years, \
     c.education, c.salary_min, c.salary_max, c.profile_complete, c.last_active";

const JOB_COLUMNS: &str = "j.id, j.employer_id, e.company_name, j.title, j.description, \
     j.required_skills, j.preferred_skills, j.location, j.remote, j.salary_min, j.salary_max, \
     j.active";

const MATCH_COLUMNS: &str =
    "id, candidate_id, job_id, overall_score, breakdown, created_at, updated_at";

/// `MatchRepository` backed by the `jm` Postgres schema.
#[derive(Clone)]
pub struct PgMatchRepository {
    pool: PgPool,
}

impl PgMatchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn salary_from_columns(min: Option<f64>, max: Option<f64>) -> Option<SalaryRange> {
    match (min, max) {
        (Some(min), Some(max)) => Some(SalaryRange::new(min, max)),
        _ => None,
    }
}

fn score_from_column(value: i16) -> Result<u8, RepositoryError> {
    u8::try_from(value)
        .ok()
        .filter(|v| *v <= 100)
        .ok_or_else(|| RepositoryError::Mapping(format!("overall_score out of range: {value}")))
}

fn row_to_candidate(row: &Row) -> Result<Candidate, RepositoryError> {
    Ok(Candidate {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        location: row.try_get("location")?,
        skills: row.try_get("skills")?,
        experience_years: row.try_get("experience_years")?,
        education: row.try_get("education")?,
        salary_expectation: salary_from_columns(
            row.try_get("salary_min")?,
            row.try_get("salary_max")?,
        ),
        profile_complete: row.try_get("profile_complete")?,
        last_active: row
            .try_get::<_, Option<chrono::DateTime<chrono::Utc>>>("last_active")?
            .map(LastActive::At),
    })
}

fn row_to_job(row: &Row) -> Result<Job, RepositoryError> {
    Ok(Job {
        id: row.try_get("id")?,
        employer_id: row.try_get("employer_id")?,
        company_name: row.try_get("company_name")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        required_skills: row.try_get("required_skills")?,
        preferred_skills: row.try_get("preferred_skills")?,
        location: row.try_get("location")?,
        remote: row.try_get("remote")?,
        salary_range: salary_from_columns(row.try_get("salary_min")?, row.try_get("salary_max")?),
        active: row.try_get("active")?,
    })
}

fn row_to_application(row: &Row) -> Result<Application, RepositoryError> {
    Ok(Application {
        id: row.try_get("id")?,
        candidate_id: row.try_get("candidate_id")?,
        job_id: row.try_get("job_id")?,
    })
}

fn row_to_match(row: &Row) -> Result<Match, RepositoryError> {
    let Json(breakdown) = row.try_get::<_, Json<ScoreBreakdown>>("breakdown")?;
    if !breakdown.is_valid() {
        return Err(RepositoryError::Mapping(format!(
            "breakdown out of range: {breakdown:?}"
        )));
    }

    Ok(Match {
        id: row.try_get("id")?,
        candidate_id: row.try_get("candidate_id")?,
        job_id: row.try_get("job_id")?,
        overall_score: score_from_column(row.try_get("overall_score")?)?,
        breakdown,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn page_bounds(limit: usize, offset: usize) -> (i64, i64) {
    let clamp = |v: usize| i64::try_from(v).unwrap_or(i64::MAX);
    (clamp(limit), clamp(offset))
}

impl MatchRepository for PgMatchRepository {
    #[instrument(skip(self))]
    async fn find_candidate(&self, id: i64) -> Result<Option<Candidate>, RepositoryError> {
        let client = self.pool.get().await?;
        let sql = format!("SELECT {CANDIDATE_COLUMNS} FROM jm.candidates c WHERE c.id = $1");
        client
            .timed_query_opt_cached(&sql, &[&id], "find_candidate")
            .await?
            .as_ref()
            .map(row_to_candidate)
            .transpose()
    }

    #[instrument(skip(self))]
    async fn find_job(&self, id: i64) -> Result<Option<Job>, RepositoryError> {
        let client = self.pool.get().await?;
        let sql = format!(
            "SELECT {JOB_COLUMNS} FROM jm.jobs j \
             LEFT JOIN jm.employers e ON e.id = j.employer_id \
             WHERE j.id = $1"
        );
        client
            .timed_query_opt_cached(&sql, &[&id], "find_job")
            .await?
            .as_ref()
            .map(row_to_job)
            .transpose()
    }

    #[instrument(skip(self))]
    async fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>, RepositoryError> {
        let client = self.pool.get().await?;
        let sql = format!(
            "SELECT {JOB_COLUMNS} FROM jm.jobs j \
             LEFT JOIN jm.employers e ON e.id = j.employer_id \
             WHERE ($1::bool IS FALSE OR j.active) \
               AND ($2::text IS NULL OR strpos(lower(j.location), lower($2)) > 0) \
               AND ($3::text[] IS NULL OR EXISTS ( \
                    SELECT 1 FROM unnest(j.required_skills || j.preferred_skills) AS s(skill) \
                    WHERE lower(btrim(s.skill)) = ANY($3))) \
               AND ($4::bool IS NULL OR j.remote = $4) \
             ORDER BY j.id"
        );

        let skills = (!filter.skills.is_empty()).then(|| filter.lowercased_skills());
        let rows = client
            .timed_query_cached(
                &sql,
                &[&filter.active_only, &filter.location, &skills, &filter.remote],
                "list_jobs",
            )
            .await?;

        rows.iter().map(row_to_job).collect()
    }

    #[instrument(skip(self))]
    async fn list_candidates(
        &self,
        filter: &CandidateFilter,
    ) -> Result<Vec<Candidate>, RepositoryError> {
        let client = self.pool.get().await?;
        let sql = format!(
            "SELECT {CANDIDATE_COLUMNS} FROM jm.candidates c \
             WHERE ($1::text IS NULL OR strpos(lower(c.location), lower($1)) > 0) \
             ORDER BY c.id"
        );
        let rows = client
            .timed_query_cached(&sql, &[&filter.location], "list_candidates")
            .await?;

        rows.iter().map(row_to_candidate).collect()
    }

    #[instrument(skip(self))]
    async fn has_applied(&self, candidate_id: i64, job_id: i64) -> Result<bool, RepositoryError> {
        let client = self.pool.get().await?;
        let row = client
            .timed_query_one_cached(
                "SELECT EXISTS (
                    SELECT 1 FROM jm.applications
                    WHERE candidate_id = $1 AND job_id = $2
                 )",
                &[&candidate_id, &job_id],
                "has_applied",
            )
            .await?;

        Ok(row.try_get(0)?)
    }

    #[instrument(skip(self))]
    async fn list_applications_for_job(
        &self,
        job_id: i64,
    ) -> Result<Vec<Application>, RepositoryError> {
        let client = self.pool.get().await?;
        client
            .timed_query_cached(
                "SELECT id, candidate_id, job_id FROM jm.applications
                 WHERE job_id = $1
                 ORDER BY created_at, id",
                &[&job_id],
                "list_applications_for_job",
            )
            .await?
            .iter()
            .map(row_to_application)
            .collect()
    }

    #[instrument(skip(self))]
    async fn find_match(
        &self,
        candidate_id: i64,
        job_id: i64,
    ) -> Result<Option<Match>, RepositoryError> {
        let client = self.pool.get().await?;
        let sql = format!(
            "SELECT {MATCH_COLUMNS} FROM jm.matches WHERE candidate_id = $1 AND job_id = $2"
        );
        client
            .timed_query_opt_cached(&sql, &[&candidate_id, &job_id], "find_match")
            .await?
            .as_ref()
            .map(row_to_match)
            .transpose()
    }

    #[instrument(skip(self))]
    async fn find_match_by_id(&self, match_id: i64) -> Result<Option<Match>, RepositoryError> {
        let client = self.pool.get().await?;
        let sql = format!("SELECT {MATCH_COLUMNS} FROM jm.matches WHERE id = $1");
        client
            .timed_query_opt_cached(&sql, &[&match_id], "find_match_by_id")
            .await?
            .as_ref()
            .map(row_to_match)
            .transpose()
    }

    /// Single-statement upsert on the `(candidate_id, job_id)` unique key.
    /// `created_at` is written only by the insert branch.
    #[instrument(skip(self, upsert), fields(candidate_id = upsert.candidate_id, job_id = upsert.job_id))]
    async fn upsert_match(&self, upsert: &MatchUpsert) -> Result<Match, RepositoryError> {
        let client = self.pool.get().await?;
        let sql = format!(
            "INSERT INTO jm.matches (
                candidate_id,
                job_id,
                overall_score,
                breakdown,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $5)
            ON CONFLICT (candidate_id, job_id) DO UPDATE SET
                overall_score = EXCLUDED.overall_score,
                breakdown = EXCLUDED.breakdown,
                updated_at = EXCLUDED.updated_at
            RETURNING {MATCH_COLUMNS}"
        );

        let overall_score = i16::from(upsert.overall_score);
        let row = client
            .timed_query_one_cached(
                &sql,
                &[
                    &upsert.candidate_id,
                    &upsert.job_id,
                    &overall_score,
                    &json_param(&upsert.breakdown),
                    &upsert.computed_at,
                ],
                "upsert_match",
            )
            .await?;

        row_to_match(&row)
    }

    #[instrument(skip(self))]
    async fn list_matches_for_candidate(
        &self,
        candidate_id: i64,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Match>, RepositoryError> {
        let client = self.pool.get().await?;
        let (limit, offset) = page_bounds(limit, offset);
        let sql = format!(
            "SELECT {MATCH_COLUMNS} FROM jm.matches \
             WHERE candidate_id = $1 \
             ORDER BY overall_score DESC, id \
             LIMIT $2 OFFSET $3"
        );
        let rows = client
            .timed_query_cached(
                &sql,
                &[&candidate_id, &limit, &offset],
                "list_matches_for_candidate",
            )
            .await?;

        rows.iter().map(row_to_match).collect()
    }

    #[instrument(skip(self))]
    async fn list_matches_for_job(
        &self,
        job_id: i64,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Match>, RepositoryError> {
        let client = self.pool.get().await?;
        let (limit, offset) = page_bounds(limit, offset);
        let sql = format!(
            "SELECT {MATCH_COLUMNS} FROM jm.matches \
             WHERE job_id = $1 \
             ORDER BY overall_score DESC, id \
             LIMIT $2 OFFSET $3"
        );
        let rows = client
            .timed_query_cached(&sql, &[&job_id, &limit, &offset], "list_matches_for_job")
            .await?;

        rows.iter().map(row_to_match).collect()
    }
}
