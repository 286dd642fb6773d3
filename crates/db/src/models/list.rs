use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqliteConnection, SqlitePool};
use ts_rs::TS;
use utils::positioning::PositionAssignment;
use uuid::Uuid;

/// An ordered column of cards on a board.
///
/// `position` is ascending display order within the board. Values are dense
/// after every reindex but consumers only rely on relative order.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct List {
    pub id: Uuid,
    pub board_id: Uuid,
    pub title: String,
    pub position: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, TS)]
pub struct CreateList {
    pub board_id: Uuid,
    pub title: String,
}

#[derive(Debug, Deserialize, TS)]
pub struct UpdateList {
    pub title: Option<String>,
}

const LIST_COLUMNS: &str = "id, board_id, title, position, created_at, updated_at";

impl List {
    /// Find a list only if its board belongs to the tenant.
    pub async fn find_by_id_for_tenant<'e, E>(
        executor: E,
        id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, List>(
            "SELECT l.id, l.board_id, l.title, l.position, l.created_at, l.updated_at
             FROM lists l
             JOIN boards b ON l.board_id = b.id
             WHERE l.id = $1 AND b.tenant_id = $2",
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await
    }

    pub async fn find_by_board_id(
        pool: &SqlitePool,
        board_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, List>(&format!(
            "SELECT {LIST_COLUMNS} FROM lists WHERE board_id = $1 ORDER BY position ASC, id ASC"
        ))
        .bind(board_id)
        .fetch_all(pool)
        .await
    }

    /// Create a list at the end of its board (max position + 1, or 0 for an
    /// empty board). Single statement so concurrent creates cannot race the
    /// position read.
    pub async fn create(pool: &SqlitePool, data: &CreateList, id: Uuid) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, List>(&format!(
            "INSERT INTO lists (id, board_id, title, position, created_at, updated_at)
             VALUES ($1, $2, $3,
                     (SELECT COALESCE(MAX(position) + 1, 0) FROM lists WHERE board_id = $2),
                     $4, $4)
             RETURNING {LIST_COLUMNS}"
        ))
        .bind(id)
        .bind(data.board_id)
        .bind(&data.title)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateList,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, List>(&format!(
            "UPDATE lists
             SET title = COALESCE($2, title), updated_at = $3
             WHERE id = $1
             RETURNING {LIST_COLUMNS}"
        ))
        .bind(id)
        .bind(&data.title)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    /// Delete a list; its cards cascade.
    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM lists WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Sibling list ids of a board in display order. The id tie-break only
    /// matters mid-transaction, before a reindex lands.
    pub async fn sibling_ids_ordered<'e, E>(
        executor: E,
        board_id: Uuid,
    ) -> Result<Vec<Uuid>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM lists WHERE board_id = $1 ORDER BY position ASC, id ASC",
        )
        .bind(board_id)
        .fetch_all(executor)
        .await
    }

    /// Write a full reindex result. Must run inside the move's transaction.
    pub async fn save_positions(
        conn: &mut SqliteConnection,
        assignments: &[PositionAssignment],
    ) -> Result<(), sqlx::Error> {
        let now = Utc::now();
        for assignment in assignments {
            sqlx::query("UPDATE lists SET position = $2, updated_at = $3 WHERE id = $1")
                .bind(assignment.id)
                .bind(assignment.position)
                .bind(now)
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }
}
