use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use jm_common::{
    db::{
        CandidateFilter, DbPoolError, Fixtures, InMemoryRepository, JobFilter, MatchRepository,
        MigrationError, PgMatchRepository, create_pool_with_size, run_migrations,
    },
    logging::{init_tracing_subscriber, install_tracing_panic_hook},
    matching::{MatchingEngine, MatchingError},
};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::info;

const APP_NAME: &str = "jm-ranker";
const DEFAULT_LIMIT: usize = 20;
const MAX_LIMIT: usize = 200;

/// Exit status when the requested candidate or job does not exist.
const EXIT_NOT_FOUND: i32 = 2;

#[derive(Debug, Parser)]
#[command(
    name = "jm-ranker",
    about = "Score candidate/job pairs and rank matches"
)]
struct Cli {
    /// Postgres connection string.
    #[arg(long, env = "DATABASE_URL", global = true)]
    database_url: Option<String>,

    /// Serve candidates/jobs/applications from a JSON file instead of Postgres.
    #[arg(long, global = true)]
    fixtures: Option<PathBuf>,

    /// Result size used when a command does not pass `--limit`.
    #[arg(long, env = "JM_RANK_LIMIT", default_value_t = DEFAULT_LIMIT, global = true)]
    default_limit: usize,

    /// Maximum Postgres connections; the pool default applies when unset.
    #[arg(long, env = "JM_DB_POOL_SIZE", global = true)]
    db_pool_size: Option<usize>,

    /// Apply schema migrations before running the command.
    #[arg(long, env = "JM_RUN_MIGRATIONS", default_value_t = false, global = true)]
    run_migrations: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
enum Command {
    /// Score one candidate/job pair and persist the match.
    Compute {
        #[arg(long)]
        candidate_id: i64,
        #[arg(long)]
        job_id: i64,
    },
    /// Rank jobs for a candidate.
    RankJobs {
        #[arg(long)]
        candidate_id: i64,
        #[arg(long)]
        limit: Option<usize>,
        /// Case-insensitive substring of the job location.
        #[arg(long)]
        location: Option<String>,
        #[arg(long, value_delimiter = ',')]
        skills: Vec<String>,
        #[arg(long)]
        remote: Option<bool>,
        #[arg(long, default_value_t = false)]
        include_inactive: bool,
    },
    /// Rank candidates for a job.
    RankCandidates {
        #[arg(long)]
        job_id: i64,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        location: Option<String>,
    },
    /// Score everyone who applied to a job, in application order.
    Applicants {
        #[arg(long)]
        job_id: i64,
    },
    /// List stored matches without recomputing.
    Matches {
        #[arg(long, conflicts_with = "job_id", required_unless_present = "job_id")]
        candidate_id: Option<i64>,
        #[arg(long)]
        job_id: Option<i64>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// Apply schema migrations and exit.
    Migrate,
}

#[derive(Debug, Error)]
enum RankerError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("failed to read fixtures {}: {source}", path.display())]
    FixturesIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Pool(#[from] DbPoolError),
    #[error(transparent)]
    Migration(#[from] MigrationError),
    #[error(transparent)]
    Matching(#[from] MatchingError),
}

#[derive(Debug, Clone, PartialEq)]
enum Backend {
    Fixtures(PathBuf),
    Postgres(String),
}

#[derive(Debug, Clone, PartialEq)]
struct RankerConfig {
    backend: Backend,
    default_limit: usize,
    pool_size: Option<usize>,
    run_migrations: bool,
}

impl RankerConfig {
    fn from_cli(cli: &Cli) -> Result<Self, RankerError> {
        let backend = match (&cli.fixtures, &cli.database_url) {
            (Some(path), _) => Backend::Fixtures(path.clone()),
            (None, Some(url)) if !url.trim().is_empty() => Backend::Postgres(url.clone()),
            _ => {
                return Err(RankerError::Config(
                    "DATABASE_URL or --fixtures is required".into(),
                ));
            }
        };

        Ok(Self {
            backend,
            default_limit: clamp_limit(cli.default_limit),
            pool_size: cli.db_pool_size.filter(|size| *size > 0),
            run_migrations: cli.run_migrations,
        })
    }

    fn limit(&self, requested: Option<usize>) -> usize {
        requested.map(clamp_limit).unwrap_or(self.default_limit)
    }
}

fn clamp_limit(limit: usize) -> usize {
    limit.clamp(1, MAX_LIMIT)
}

/// Command result: a JSON payload, or a not-found payload kept distinct from a zero score.
#[derive(Debug, Clone, PartialEq)]
enum Outcome {
    Found(Value),
    NotFound(Value),
}

impl Outcome {
    fn from_option<T: Serialize>(value: Option<T>, missing: Value) -> Result<Self, RankerError> {
        match value {
            Some(value) => Ok(Outcome::Found(serde_json::to_value(value)?)),
            None => Ok(Outcome::NotFound(missing)),
        }
    }
}

fn not_found(fields: Value) -> Value {
    let mut payload = json!({ "status": "not_found" });
    if let (Some(target), Value::Object(extra)) = (payload.as_object_mut(), fields) {
        target.extend(extra);
    }
    payload
}

fn load_fixtures(path: &Path) -> Result<InMemoryRepository, RankerError> {
    let raw = std::fs::read_to_string(path).map_err(|source| RankerError::FixturesIo {
        path: path.to_path_buf(),
        source,
    })?;
    let fixtures: Fixtures = serde_json::from_str(&raw)?;
    info!(
        candidates = fixtures.candidates.len(),
        jobs = fixtures.jobs.len(),
        applications = fixtures.applications.len(),
        "loaded fixtures"
    );
    Ok(InMemoryRepository::from_fixtures(fixtures))
}

async fn execute<R: MatchRepository>(
    engine: &MatchingEngine<R>,
    command: &Command,
    config: &RankerConfig,
) -> Result<Outcome, RankerError> {
    match command {
        Command::Compute {
            candidate_id,
            job_id,
        } => {
            let summary = engine.compute_match(*candidate_id, *job_id).await?;
            Outcome::from_option(
                summary,
                not_found(json!({ "candidate_id": candidate_id, "job_id": job_id })),
            )
        }
        Command::RankJobs {
            candidate_id,
            limit,
            location,
            skills,
            remote,
            include_inactive,
        } => {
            let filter = JobFilter {
                active_only: !include_inactive,
                location: location.clone(),
                skills: skills.clone(),
                remote: *remote,
            };
            let ranked = engine
                .rank_jobs_for_candidate_with_filter(*candidate_id, &filter, config.limit(*limit))
                .await?;
            Outcome::from_option(ranked, not_found(json!({ "candidate_id": candidate_id })))
        }
        Command::RankCandidates {
            job_id,
            limit,
            location,
        } => {
            let filter = CandidateFilter {
                location: location.clone(),
            };
            let ranked = engine
                .rank_candidates_for_job_with_filter(*job_id, &filter, config.limit(*limit))
                .await?;
            Outcome::from_option(ranked, not_found(json!({ "job_id": job_id })))
        }
        Command::Applicants { job_id } => {
            let applicants = engine.score_applicants_for_job(*job_id).await?;
            Outcome::from_option(applicants, not_found(json!({ "job_id": job_id })))
        }
        Command::Matches {
            candidate_id,
            job_id,
            limit,
            offset,
        } => {
            let limit = config.limit(*limit);
            let listing = match (candidate_id, job_id) {
                (Some(candidate_id), _) => serde_json::to_value(
                    engine
                        .stored_matches_for_candidate(*candidate_id, limit, *offset)
                        .await?,
                )?,
                (None, Some(job_id)) => serde_json::to_value(
                    engine.stored_matches_for_job(*job_id, limit, *offset).await?,
                )?,
                (None, None) => {
                    return Err(RankerError::Config(
                        "matches needs --candidate-id or --job-id".into(),
                    ));
                }
            };
            Ok(Outcome::Found(listing))
        }
        Command::Migrate => Err(RankerError::Config(
            "migrate requires DATABASE_URL".into(),
        )),
    }
}

async fn run() -> Result<i32, RankerError> {
    dotenv().ok();
    init_tracing_subscriber(APP_NAME);
    install_tracing_panic_hook(APP_NAME);

    let cli = Cli::parse();
    let config = RankerConfig::from_cli(&cli)?;

    let outcome = match &config.backend {
        Backend::Fixtures(path) => {
            let engine = MatchingEngine::new(load_fixtures(path)?);
            execute(&engine, &cli.command, &config).await?
        }
        Backend::Postgres(url) => {
            let pool = create_pool_with_size(url, config.pool_size)?;
            if config.run_migrations || cli.command == Command::Migrate {
                run_migrations(&pool).await?;
            }
            if cli.command == Command::Migrate {
                Outcome::Found(json!({ "status": "migrated" }))
            } else {
                let engine = MatchingEngine::new(PgMatchRepository::new(pool));
                execute(&engine, &cli.command, &config).await?
            }
        }
    };

    let (payload, code) = match outcome {
        Outcome::Found(payload) => (payload, 0),
        Outcome::NotFound(payload) => (payload, EXIT_NOT_FOUND),
    };
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(code)
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(err) => {
            tracing::error!(error = %err, "jm-ranker failed");
            eprintln!("jm-ranker failed: {err}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut cli = Cli::try_parse_from(args).expect("cli parses");
        // Keep tests independent of a DATABASE_URL in the environment.
        cli.database_url = None;
        cli.db_pool_size = None;
        cli
    }

    fn demo_fixtures() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/fixtures.json")
    }

    fn fixture_config() -> RankerConfig {
        RankerConfig {
            backend: Backend::Fixtures(demo_fixtures()),
            default_limit: DEFAULT_LIMIT,
            pool_size: None,
            run_migrations: false,
        }
    }

    #[test]
    fn parses_compute_subcommand() {
        let cli = parse(&["jm-ranker", "compute", "--candidate-id", "1", "--job-id", "10"]);
        assert_eq!(
            cli.command,
            Command::Compute {
                candidate_id: 1,
                job_id: 10
            }
        );
    }

    #[test]
    fn parses_rank_jobs_filters() {
        let cli = parse(&[
            "jm-ranker",
            "--fixtures",
            "demo.json",
            "rank-jobs",
            "--candidate-id",
            "3",
            "--skills",
            "rust,go",
            "--remote",
            "true",
            "--limit",
            "5",
        ]);
        let Command::RankJobs {
            candidate_id,
            skills,
            remote,
            limit,
            include_inactive,
            ..
        } = cli.command
        else {
            panic!("expected rank-jobs");
        };
        assert_eq!(candidate_id, 3);
        assert_eq!(skills, vec!["rust".to_string(), "go".to_string()]);
        assert_eq!(remote, Some(true));
        assert_eq!(limit, Some(5));
        assert!(!include_inactive);
        assert_eq!(cli.fixtures, Some(PathBuf::from("demo.json")));
    }

    #[test]
    fn matches_requires_exactly_one_anchor() {
        assert!(Cli::try_parse_from(["jm-ranker", "matches"]).is_err());
        assert!(
            Cli::try_parse_from(["jm-ranker", "matches", "--candidate-id", "1", "--job-id", "2"])
                .is_err()
        );
        assert!(Cli::try_parse_from(["jm-ranker", "matches", "--job-id", "2"]).is_ok());
    }

    #[test]
    fn config_requires_a_backend() {
        let cli = parse(&["jm-ranker", "migrate"]);
        assert!(matches!(
            RankerConfig::from_cli(&cli),
            Err(RankerError::Config(_))
        ));

        let mut cli = parse(&["jm-ranker", "migrate"]);
        cli.database_url = Some("postgres://localhost/jobmatch".into());
        let config = RankerConfig::from_cli(&cli).unwrap();
        assert_eq!(
            config.backend,
            Backend::Postgres("postgres://localhost/jobmatch".into())
        );
    }

    #[test]
    fn pool_size_flag_reaches_config() {
        let mut cli = parse(&["jm-ranker", "applicants", "--job-id", "10"]);
        assert_eq!(cli.command, Command::Applicants { job_id: 10 });

        cli.database_url = Some("postgres://localhost/jobmatch".into());
        cli.db_pool_size = Some(8);
        assert_eq!(RankerConfig::from_cli(&cli).unwrap().pool_size, Some(8));

        cli.db_pool_size = Some(0);
        assert_eq!(RankerConfig::from_cli(&cli).unwrap().pool_size, None);

        let flagged = Cli::try_parse_from([
            "jm-ranker",
            "--db-pool-size",
            "4",
            "applicants",
            "--job-id",
            "1",
        ])
        .unwrap();
        assert_eq!(flagged.db_pool_size, Some(4));
    }

    #[test]
    fn limits_are_clamped() {
        assert_eq!(clamp_limit(0), 1);
        assert_eq!(clamp_limit(50), 50);
        assert_eq!(clamp_limit(10_000), MAX_LIMIT);

        let config = fixture_config();
        assert_eq!(config.limit(None), DEFAULT_LIMIT);
        assert_eq!(config.limit(Some(0)), 1);
        assert_eq!(config.limit(Some(999)), MAX_LIMIT);
    }

    #[test]
    fn not_found_payload_names_the_ids() {
        let payload = not_found(json!({ "candidate_id": 7 }));
        assert_eq!(payload["status"], "not_found");
        assert_eq!(payload["candidate_id"], 7);
    }

    #[tokio::test]
    async fn demo_fixtures_rank_and_report_missing() {
        let config = fixture_config();
        let engine = MatchingEngine::new(load_fixtures(&demo_fixtures()).unwrap());

        let ranked = execute(
            &engine,
            &Command::RankJobs {
                candidate_id: 2,
                limit: None,
                location: None,
                skills: vec![],
                remote: None,
                include_inactive: false,
            },
            &config,
        )
        .await
        .unwrap();
        let Outcome::Found(Value::Array(entries)) = ranked else {
            panic!("expected ranked jobs");
        };
        // Job 12 was applied to and job 13 is closed.
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e["job_id"] != 12 && e["job_id"] != 13));

        let missing = execute(
            &engine,
            &Command::Compute {
                candidate_id: 404,
                job_id: 10,
            },
            &config,
        )
        .await
        .unwrap();
        assert!(matches!(missing, Outcome::NotFound(_)));

        let stored = execute(
            &engine,
            &Command::Matches {
                candidate_id: Some(2),
                job_id: None,
                limit: None,
                offset: 0,
            },
            &config,
        )
        .await
        .unwrap();
        let Outcome::Found(Value::Array(stored)) = stored else {
            panic!("expected stored matches");
        };
        assert_eq!(stored.len(), 2);

        let applicants = execute(&engine, &Command::Applicants { job_id: 12 }, &config)
            .await
            .unwrap();
        let Outcome::Found(Value::Array(applicants)) = applicants else {
            panic!("expected scored applicants");
        };
        assert_eq!(applicants.len(), 1);
        assert_eq!(applicants[0]["candidate_id"], 2);
        assert!(applicants[0]["application_id"].as_i64().unwrap() > 0);

        let missing_job = execute(&engine, &Command::Applicants { job_id: 404 }, &config)
            .await
            .unwrap();
        assert!(matches!(missing_job, Outcome::NotFound(_)));
    }

    #[tokio::test]
    async fn migrate_needs_postgres() {
        let config = fixture_config();
        let engine = MatchingEngine::new(InMemoryRepository::new());
        let err = execute(&engine, &Command::Migrate, &config)
            .await
            .unwrap_err();
        assert!(matches!(err, RankerError::Config(_)));
    }
}
