use deadpool_postgres::PoolError;
use thiserror::Error;
use tokio_postgres::Error as PgError;
use tracing::{info, instrument};

use crate::db::{DbPoolError, PgPool};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("failed to run migration: {0}")]
    Postgres(#[from] PgError),
    #[error("failed to build pool: {0}")]
    PoolBuild(#[from] DbPoolError),
}

struct Migration {
    id: i32,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        id: 1,
        description: "candidates, employers, jobs and applications",
        sql: r#"
CREATE TABLE IF NOT EXISTS jm.candidates (
    id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL DEFAULT '',
    location TEXT NOT NULL DEFAULT '',
    skills TEXT[] NOT NULL DEFAULT '{}',
    experience_years DOUBLE PRECISION NOT NULL DEFAULT 0
        CHECK (experience_years >= 0),
    education TEXT NOT NULL DEFAULT '',
    salary_min DOUBLE PRECISION,
    salary_max DOUBLE PRECISION,
    profile_complete DOUBLE PRECISION NOT NULL DEFAULT 0
        CHECK (profile_complete >= 0 AND profile_complete <= 100),
    last_active TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT chk_candidate_salary_order
        CHECK (salary_min IS NULL OR salary_max IS NULL OR salary_min <= salary_max)
);

CREATE TABLE IF NOT EXISTS jm.employers (
    id BIGSERIAL PRIMARY KEY,
    company_name TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS jm.jobs (
    id BIGSERIAL PRIMARY KEY,
    employer_id BIGINT NOT NULL REFERENCES jm.employers(id) ON DELETE CASCADE,
    title TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    required_skills TEXT[] NOT NULL DEFAULT '{}',
    preferred_skills TEXT[] NOT NULL DEFAULT '{}',
    location TEXT NOT NULL DEFAULT '',
    remote BOOLEAN NOT NULL DEFAULT FALSE,
    salary_min DOUBLE PRECISION,
    salary_max DOUBLE PRECISION,
    active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT chk_job_salary_order
        CHECK (salary_min IS NULL OR salary_max IS NULL OR salary_min <= salary_max)
);

CREATE INDEX IF NOT EXISTS idx_jobs_active ON jm.jobs(id) WHERE active;

CREATE TABLE IF NOT EXISTS jm.applications (
    id BIGSERIAL PRIMARY KEY,
    candidate_id BIGINT NOT NULL REFERENCES jm.candidates(id) ON DELETE CASCADE,
    job_id BIGINT NOT NULL REFERENCES jm.jobs(id) ON DELETE CASCADE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT uq_applications_pair UNIQUE (candidate_id, job_id)
);
"#,
    },
    Migration {
        id: 2,
        description: "matches keyed by (candidate, job) with score range checks",
        sql: r#"
CREATE TABLE IF NOT EXISTS jm.matches (
    id BIGSERIAL PRIMARY KEY,
    candidate_id BIGINT NOT NULL REFERENCES jm.candidates(id) ON DELETE CASCADE,
    job_id BIGINT NOT NULL REFERENCES jm.jobs(id) ON DELETE CASCADE,
    overall_score SMALLINT NOT NULL,
    breakdown JSONB NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT uq_matches_pair UNIQUE (candidate_id, job_id),
    CONSTRAINT chk_overall_score_range CHECK (overall_score >= 0 AND overall_score <= 100),
    CONSTRAINT chk_match_timestamps CHECK (updated_at >= created_at)
);

CREATE INDEX IF NOT EXISTS idx_matches_candidate_score
    ON jm.matches(candidate_id, overall_score DESC, id);
CREATE INDEX IF NOT EXISTS idx_matches_job_score
    ON jm.matches(job_id, overall_score DESC, id);
"#,
    },
    Migration {
        id: 3,
        description: "applications listed per job",
        sql: r#"
CREATE INDEX IF NOT EXISTS idx_applications_job
    ON jm.applications(job_id, created_at, id);
"#,
    },
];

/// Apply pending schema migrations in order. Safe to run repeatedly.
#[instrument(skip(pool))]
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrationError> {
    let mut client = pool.get().await?;
    client
        .batch_execute(
            "CREATE SCHEMA IF NOT EXISTS jm;
             CREATE TABLE IF NOT EXISTS jm.schema_migrations (
                id INTEGER PRIMARY KEY,
                description TEXT NOT NULL,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
             );",
        )
        .await?;

    for migration in MIGRATIONS {
        let already_applied: bool = client
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM jm.schema_migrations WHERE id = $1)",
                &[&migration.id],
            )
            .await?
            .get(0);

        if already_applied {
            continue;
        }

        let tx = client.transaction().await?;
        tx.batch_execute(migration.sql).await?;
        tx.execute(
            "INSERT INTO jm.schema_migrations (id, description) VALUES ($1, $2)",
            &[&migration.id, &migration.description],
        )
        .await?;
        tx.commit().await?;

        info!(
            id = migration.id,
            description = migration.description,
            "applied migration"
        );
    }

    Ok(())
}
