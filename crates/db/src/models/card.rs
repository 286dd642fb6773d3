use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqliteConnection, SqlitePool};
use ts_rs::TS;
use utils::positioning::PositionAssignment;
use uuid::Uuid;

/// A card within a list. Parent list id plus position define its location;
/// a move changes one or both.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Card {
    pub id: Uuid,
    pub list_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[ts(optional)]
    pub due_date: Option<DateTime<Utc>>,
    pub position: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A card joined with the board that transitively owns it.
#[derive(Debug, Clone, FromRow)]
pub struct CardScoped {
    #[sqlx(flatten)]
    pub card: Card,
    pub board_id: Uuid,
}

#[derive(Debug, Deserialize, TS)]
pub struct CreateCard {
    pub list_id: Uuid,
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, TS)]
pub struct UpdateCard {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

const CARD_COLUMNS: &str =
    "id, list_id, title, description, due_date, position, created_at, updated_at";

const CARD_COLUMNS_QUALIFIED: &str = "c.id, c.list_id, c.title, c.description, c.due_date, \
                                      c.position, c.created_at, c.updated_at";

impl Card {
    /// Find a card only if its ownership chain (card -> list -> board)
    /// resolves to the tenant; returns the owning board id alongside.
    pub async fn find_scoped<'e, E>(
        executor: E,
        id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Option<CardScoped>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, CardScoped>(&format!(
            "SELECT {CARD_COLUMNS_QUALIFIED}, l.board_id AS board_id
             FROM cards c
             JOIN lists l ON c.list_id = l.id
             JOIN boards b ON l.board_id = b.id
             WHERE c.id = $1 AND b.tenant_id = $2"
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await
    }

    pub async fn find_by_list_id(pool: &SqlitePool, list_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Card>(&format!(
            "SELECT {CARD_COLUMNS} FROM cards WHERE list_id = $1 ORDER BY position ASC, id ASC"
        ))
        .bind(list_id)
        .fetch_all(pool)
        .await
    }

    /// All cards of a board, grouped by list in display order. Used by the
    /// board snapshot.
    pub async fn find_for_board(pool: &SqlitePool, board_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Card>(&format!(
            "SELECT {CARD_COLUMNS_QUALIFIED}
             FROM cards c
             JOIN lists l ON c.list_id = l.id
             WHERE l.board_id = $1
             ORDER BY c.list_id ASC, c.position ASC, c.id ASC"
        ))
        .bind(board_id)
        .fetch_all(pool)
        .await
    }

    /// Create a card at the end of its list (max position + 1, or 0 for an
    /// empty list). Single statement so concurrent creates cannot race the
    /// position read.
    pub async fn create(pool: &SqlitePool, data: &CreateCard, id: Uuid) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Card>(&format!(
            "INSERT INTO cards (id, list_id, title, description, position, created_at, updated_at)
             VALUES ($1, $2, $3, $4,
                     (SELECT COALESCE(MAX(position) + 1, 0) FROM cards WHERE list_id = $2),
                     $5, $5)
             RETURNING {CARD_COLUMNS}"
        ))
        .bind(id)
        .bind(data.list_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    pub async fn update(pool: &SqlitePool, id: Uuid, data: &UpdateCard) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Card>(&format!(
            "UPDATE cards
             SET title = COALESCE($2, title),
                 description = COALESCE($3, description),
                 due_date = COALESCE($4, due_date),
                 updated_at = $5
             WHERE id = $1
             RETURNING {CARD_COLUMNS}"
        ))
        .bind(id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.due_date)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM cards WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Sibling card ids of a list in display order.
    pub async fn sibling_ids_ordered<'e, E>(
        executor: E,
        list_id: Uuid,
    ) -> Result<Vec<Uuid>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM cards WHERE list_id = $1 ORDER BY position ASC, id ASC",
        )
        .bind(list_id)
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
            sqlx::query("UPDATE cards SET position = $2, updated_at = $3 WHERE id = $1")
                .bind(assignment.id)
                .bind(assignment.position)
                .bind(now)
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    /// Point a card at a new parent list. The position is written afterwards
    /// by `save_positions` as part of the target scope's reindex.
    pub async fn reparent<'e, E>(
        executor: E,
        id: Uuid,
        new_list_id: Uuid,
    ) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query("UPDATE cards SET list_id = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(new_list_id)
            .bind(Utc::now())
            .execute(executor)
            .await?;
        Ok(())
    }
}
