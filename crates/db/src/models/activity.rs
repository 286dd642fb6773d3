use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, types::Json};
use ts_rs::TS;
use uuid::Uuid;

/// What happened, for the per-board activity feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, TS)]
#[serde(rename_all = "camelCase")]
#[sqlx(rename_all = "camelCase")]
pub enum ActivityType {
    BoardCreated,
    BoardUpdated,
    ListCreated,
    ListUpdated,
    ListDeleted,
    ListMoved,
    CardCreated,
    CardUpdated,
    CardDeleted,
    CardMoved,
    CommentCreated,
    CommentDeleted,
}

/// One append-only activity feed entry.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Activity {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub board_id: Uuid,
    pub user_id: Uuid,
    pub activity_type: ActivityType,
    #[ts(type = "Record<string, unknown> | null")]
    pub metadata: Option<Json<serde_json::Value>>,
    pub created_at: DateTime<Utc>,
}

/// Entry to append; id and timestamp are assigned on insert.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub tenant_id: Uuid,
    pub board_id: Uuid,
    pub user_id: Uuid,
    pub activity_type: ActivityType,
    pub metadata: Option<serde_json::Value>,
}

const ACTIVITY_COLUMNS: &str =
    "id, tenant_id, board_id, user_id, activity_type, metadata, created_at";

impl Activity {
    pub async fn create(pool: &SqlitePool, data: &NewActivity) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Activity>(&format!(
            "INSERT INTO activities (id, tenant_id, board_id, user_id, activity_type, metadata, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {ACTIVITY_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(data.tenant_id)
        .bind(data.board_id)
        .bind(data.user_id)
        .bind(data.activity_type)
        .bind(data.metadata.clone().map(Json))
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    /// Most recent entries for a board, newest first.
    pub async fn find_by_board_id(
        pool: &SqlitePool,
        board_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Activity>(&format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activities
             WHERE board_id = $1
             ORDER BY created_at DESC
             LIMIT $2"
        ))
        .bind(board_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}
