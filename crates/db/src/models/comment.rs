use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Comment {
    pub id: Uuid,
    pub card_id: Uuid,
    pub user_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, TS)]
pub struct CreateComment {
    pub body: String,
}

const COMMENT_COLUMNS: &str = "id, card_id, user_id, body, created_at";

impl Comment {
    /// Find a comment only if its card's ownership chain resolves to the
    /// tenant.
    pub async fn find_by_id_for_tenant<'e, E>(
        executor: E,
        id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Comment>(
            "SELECT m.id, m.card_id, m.user_id, m.body, m.created_at
             FROM comments m
             JOIN cards c ON m.card_id = c.id
             JOIN lists l ON c.list_id = l.id
             JOIN boards b ON l.board_id = b.id
             WHERE m.id = $1 AND b.tenant_id = $2",
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await
    }

    pub async fn find_by_card_id(pool: &SqlitePool, card_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE card_id = $1 ORDER BY created_at DESC"
        ))
        .bind(card_id)
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateComment,
        id: Uuid,
        card_id: Uuid,
        user_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Comment>(&format!(
            "INSERT INTO comments (id, card_id, user_id, body, created_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(card_id)
        .bind(user_id)
        .bind(&data.body)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
