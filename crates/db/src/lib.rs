use std::{path::Path, str::FromStr, time::Duration};

use sqlx::{
    Error, SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
};
use tracing::info;

pub mod models;
pub mod retry;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use retry::{RetryConfig, is_retryable_error};

// ============================================================================
// Connection Pool Configuration
// ============================================================================

/// Default maximum connections in the pool.
/// SQLite benefits from limited connections due to single-writer model.
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Connection acquisition timeout in seconds.
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// How long a writer waits on a locked database before SQLITE_BUSY.
const DEFAULT_BUSY_TIMEOUT_SECS: u64 = 5;

/// Get max connections from environment or use default.
fn get_max_connections() -> u32 {
    std::env::var("CORKBOARD_SQLITE_MAX_CONNECTIONS")
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .filter(|&n| n > 0 && n <= 100)
        .unwrap_or(DEFAULT_MAX_CONNECTIONS)
}

/// Handle to the SQLite pool. Cheap to clone; all model query fns take the
/// pool (or a transaction) explicitly.
#[derive(Clone)]
pub struct DBService {
    pub pool: SqlitePool,
}

impl DBService {
    /// Open (creating if missing) the database at `database_path`, apply
    /// pragmas and run embedded migrations.
    ///
    /// WAL + `synchronous = NORMAL` is the standard durability/throughput
    /// trade for a server workload. `foreign_keys` must be ON for the
    /// board -> list -> card cascade deletes to fire.
    pub async fn new(database_path: &Path) -> Result<Self, Error> {
        let options =
            SqliteConnectOptions::from_str(&format!("sqlite://{}", database_path.display()))?
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .busy_timeout(Duration::from_secs(DEFAULT_BUSY_TIMEOUT_SECS))
                .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(get_max_connections())
            .acquire_timeout(Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS))
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        info!(path = %database_path.display(), "database ready");

        Ok(Self { pool })
    }

    /// Pool over an existing database (tests).
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}
