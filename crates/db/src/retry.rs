//! Classification and backoff pacing for transient SQLite errors.
//!
//! Two concurrent move transactions on the same database can hit SQLITE_BUSY
//! (code 5) or SQLITE_LOCKED (code 6). Re-running the whole
//! read-reindex-write sequence from the winner's committed state is exactly
//! the last-writer-wins serialization the ordering layer wants, so callers
//! loop on `is_retryable_error` and pace themselves with
//! `RetryConfig::delay_for`.

use std::time::Duration;

use sqlx::Error as SqlxError;

/// Configuration for SQLite retry behavior.
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Maximum number of retry attempts.
    pub max_retries: u32,
    /// Base delay in milliseconds for exponential backoff.
    pub base_delay_ms: u64,
    /// Maximum delay in milliseconds (caps the exponential growth).
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay_ms: 50,
            max_delay_ms: 2000,
        }
    }
}

impl RetryConfig {
    /// Exponential backoff delay for the given attempt, with jitter from the
    /// clock's subsecond nanos; enough to de-synchronize two writers that
    /// collided.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base_delay = self.base_delay_ms * 2u64.pow(attempt.min(16));
        let capped_delay = base_delay.min(self.max_delay_ms);

        let jitter_range = capped_delay / 5;
        let jitter = if jitter_range > 0 {
            let now = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .subsec_nanos() as u64;
            now % jitter_range
        } else {
            0
        };

        Duration::from_millis(capped_delay + jitter)
    }
}

/// Check if an error is a transient SQLite error that should be retried.
///
/// - 5 = SQLITE_BUSY (database is locked by another connection)
/// - 6 = SQLITE_LOCKED (table is locked within a transaction)
///
/// Extended codes carry the primary code in their low byte, so
/// SQLITE_BUSY_SNAPSHOT (517, a deferred transaction losing a WAL write
/// race) and friends are covered by masking.
pub fn is_retryable_error(e: &SqlxError) -> bool {
    if let SqlxError::Database(db_err) = e {
        if let Some(code) = db_err.code() {
            if let Ok(code_num) = code.as_ref().parse::<u32>() {
                return matches!(code_num & 0xFF, 5 | 6);
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_not_retryable() {
        assert!(!is_retryable_error(&SqlxError::RowNotFound));
        assert!(!is_retryable_error(&SqlxError::PoolClosed));
    }

    #[test]
    fn delay_grows_then_caps() {
        let config = RetryConfig::default();
        assert!(config.delay_for(0) >= Duration::from_millis(config.base_delay_ms));
        // max_delay plus at most 20% jitter
        let cap = Duration::from_millis(config.max_delay_ms + config.max_delay_ms / 5);
        assert!(config.delay_for(20) <= cap);
    }
}
