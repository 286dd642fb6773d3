use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

use super::{card::Card, list::List};

/// A tenant-owned board of ordered lists.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Board {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, TS)]
pub struct CreateBoard {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, TS)]
pub struct UpdateBoard {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// A list together with its ordered cards, as shipped to clients.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ListWithCards {
    #[serde(flatten)]
    pub list: List,
    pub cards: Vec<Card>,
}

/// Full board state: the payload for initial load and re-join re-fetch.
/// A session that missed broadcasts while offline starts over from this.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct BoardSnapshot {
    pub board: Board,
    pub lists: Vec<ListWithCards>,
}

const BOARD_COLUMNS: &str = "id, tenant_id, title, description, created_at, updated_at";

impl Board {
    /// Find a board only if the tenant owns it. Missing and not-owned are
    /// indistinguishable to the caller.
    pub async fn find_by_id_for_tenant<'e, E>(
        executor: E,
        id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Board>(&format!(
            "SELECT {BOARD_COLUMNS} FROM boards WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await
    }

    pub async fn find_for_tenant(
        pool: &SqlitePool,
        tenant_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Board>(&format!(
            "SELECT {BOARD_COLUMNS} FROM boards WHERE tenant_id = $1 ORDER BY created_at ASC"
        ))
        .bind(tenant_id)
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateBoard,
        id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let now = Utc::now();
        sqlx::query_as::<_, Board>(&format!(
            "INSERT INTO boards (id, tenant_id, title, description, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $5)
             RETURNING {BOARD_COLUMNS}"
        ))
        .bind(id)
        .bind(tenant_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(now)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        tenant_id: Uuid,
        data: &UpdateBoard,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Board>(&format!(
            "UPDATE boards
             SET title = COALESCE($3, title),
                 description = COALESCE($4, description),
                 updated_at = $5
             WHERE id = $1 AND tenant_id = $2
             RETURNING {BOARD_COLUMNS}"
        ))
        .bind(id)
        .bind(tenant_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    /// Delete a board; lists and cards go with it via FK cascade.
    pub async fn delete(pool: &SqlitePool, id: Uuid, tenant_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM boards WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Load the full ordered state of a board: lists by position, each with
    /// its cards by position.
    pub async fn load_snapshot(
        pool: &SqlitePool,
        id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Option<BoardSnapshot>, sqlx::Error> {
        let Some(board) = Self::find_by_id_for_tenant(pool, id, tenant_id).await? else {
            return Ok(None);
        };

        let lists = List::find_by_board_id(pool, id).await?;
        let cards = Card::find_for_board(pool, id).await?;

        let mut lists: Vec<ListWithCards> = lists
            .into_iter()
            .map(|list| ListWithCards {
                list,
                cards: Vec::new(),
            })
            .collect();
        for card in cards {
            if let Some(entry) = lists.iter_mut().find(|l| l.list.id == card.list_id) {
                entry.cards.push(card);
            }
        }

        Ok(Some(BoardSnapshot { board, lists }))
    }
}
