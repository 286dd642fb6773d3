//! Ownership-chain verification for every read/write on a board, list or
//! card.
//!
//! The chain is Card -> List -> Board -> tenant. A record that is missing and
//! a record owned by another tenant produce the same `NotFound`, so existence
//! never leaks across tenants.

use db::models::{
    board::Board,
    card::{Card, CardScoped},
    comment::Comment,
    list::List,
};
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("not found")]
    NotFound,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub async fn board(pool: &SqlitePool, board_id: Uuid, tenant_id: Uuid) -> Result<Board, ScopeError> {
    Board::find_by_id_for_tenant(pool, board_id, tenant_id)
        .await?
        .ok_or(ScopeError::NotFound)
}

pub async fn list(pool: &SqlitePool, list_id: Uuid, tenant_id: Uuid) -> Result<List, ScopeError> {
    List::find_by_id_for_tenant(pool, list_id, tenant_id)
        .await?
        .ok_or(ScopeError::NotFound)
}

pub async fn card(pool: &SqlitePool, card_id: Uuid, tenant_id: Uuid) -> Result<CardScoped, ScopeError> {
    Card::find_scoped(pool, card_id, tenant_id)
        .await?
        .ok_or(ScopeError::NotFound)
}

pub async fn comment(
    pool: &SqlitePool,
    comment_id: Uuid,
    tenant_id: Uuid,
) -> Result<Comment, ScopeError> {
    Comment::find_by_id_for_tenant(pool, comment_id, tenant_id)
        .await?
        .ok_or(ScopeError::NotFound)
}

/// Item kinds for generic tenant resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Board,
    List,
    Card,
}

/// Resolve the tenant that transitively owns an item, or `NotFound`.
/// Used where only the owning tenant matters (e.g. realtime room joins).
pub async fn resolve_tenant(
    pool: &SqlitePool,
    item_id: Uuid,
    kind: ItemKind,
) -> Result<Uuid, ScopeError> {
    let query = match kind {
        ItemKind::Board => "SELECT tenant_id FROM boards WHERE id = $1",
        ItemKind::List => {
            "SELECT b.tenant_id FROM lists l JOIN boards b ON l.board_id = b.id WHERE l.id = $1"
        }
        ItemKind::Card => {
            "SELECT b.tenant_id FROM cards c
             JOIN lists l ON c.list_id = l.id
             JOIN boards b ON l.board_id = b.id
             WHERE c.id = $1"
        }
    };

    sqlx::query_scalar::<_, Uuid>(query)
        .bind(item_id)
        .fetch_optional(pool)
        .await?
        .ok_or(ScopeError::NotFound)
}
