pub mod memory;
pub mod migrations;
pub mod pool;
pub mod postgres;
pub mod repository;
pub mod util;

// Keep re-exports unique so downstream crates see a single symbol per helper.
pub use memory::{Fixtures, InMemoryRepository};
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPoolError, PgPool, create_pool_from_url, create_pool_with_size};
pub use postgres::PgMatchRepository;
pub use repository::{
    Application, CandidateFilter, JobFilter, Match, MatchRepository, MatchUpsert, RepositoryError,
};
