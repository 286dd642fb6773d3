//! Append-only activity feed writes.
//!
//! Recording an activity must never fail the mutation it describes: errors
//! are logged and dropped.

use db::models::activity::{Activity, NewActivity};
use sqlx::SqlitePool;

pub async fn record(pool: &SqlitePool, entry: NewActivity) {
    if let Err(e) = Activity::create(pool, &entry).await {
        tracing::warn!(
            error = %e,
            board_id = %entry.board_id,
            activity_type = ?entry.activity_type,
            "failed to record activity"
        );
    }
}
