//! The authoritative mutation path for "move card" and "move list".
//!
//! Every move runs as one transaction: load the affected sibling sets,
//! reindex, write back. Two concurrent moves in the same scope serialize at
//! the database; the later transaction's reindex starts from the earlier
//! one's committed result and fully overwrites positions, so conflicts
//! resolve last-writer-wins per scope. A transient lock error re-runs the
//! whole sequence from fresh state.

use std::future::Future;

use db::models::{card::Card, list::List};
use db::retry::{RetryConfig, is_retryable_error};
use sqlx::SqlitePool;
use thiserror::Error;
use utils::{
    positioning,
    wire::{MoveOutcome, ScopeSnapshot},
};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum OrderingError {
    /// Item, source or target missing, or not owned by the caller's tenant.
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Move a card within its list or to another list on the same board.
///
/// The returned outcome covers every repositioned sibling of every affected
/// scope, not just the moved card.
pub async fn move_card(
    pool: &SqlitePool,
    tenant_id: Uuid,
    card_id: Uuid,
    target_list_id: Uuid,
    target_index: usize,
) -> Result<MoveOutcome, OrderingError> {
    with_move_retry("move_card", || {
        try_move_card(pool, tenant_id, card_id, target_list_id, target_index)
    })
    .await
}

/// Reorder a list within its board. Lists never reparent, so the board id is
/// validated rather than applied.
pub async fn move_list(
    pool: &SqlitePool,
    tenant_id: Uuid,
    list_id: Uuid,
    target_board_id: Uuid,
    target_index: usize,
) -> Result<MoveOutcome, OrderingError> {
    with_move_retry("move_list", || {
        try_move_list(pool, tenant_id, list_id, target_board_id, target_index)
    })
    .await
}

async fn try_move_card(
    pool: &SqlitePool,
    tenant_id: Uuid,
    card_id: Uuid,
    target_list_id: Uuid,
    target_index: usize,
) -> Result<MoveOutcome, OrderingError> {
    let mut tx = pool.begin().await?;

    // Re-resolve inside the transaction: the guard ran earlier, but this
    // read is the one the write is atomic with.
    let scoped = Card::find_scoped(&mut *tx, card_id, tenant_id)
        .await?
        .ok_or(OrderingError::NotFound)?;
    let target = List::find_by_id_for_tenant(&mut *tx, target_list_id, tenant_id)
        .await?
        .ok_or(OrderingError::NotFound)?;
    if target.board_id != scoped.board_id {
        return Err(OrderingError::Validation(
            "cards cannot move between boards".to_string(),
        ));
    }

    let source_list_id = scoped.card.list_id;

    let updated_scopes = if source_list_id == target_list_id {
        let siblings = Card::sibling_ids_ordered(&mut *tx, source_list_id).await?;
        let assignments = positioning::reindex(&siblings, card_id, target_index);
        Card::save_positions(&mut tx, &assignments).await?;
        vec![ScopeSnapshot {
            scope_id: source_list_id,
            items: assignments,
        }]
    } else {
        let source_siblings = Card::sibling_ids_ordered(&mut *tx, source_list_id).await?;
        let source_assignments = positioning::remove(&source_siblings, card_id);

        let target_siblings = Card::sibling_ids_ordered(&mut *tx, target_list_id).await?;
        let target_assignments = positioning::reindex(&target_siblings, card_id, target_index);

        Card::save_positions(&mut tx, &source_assignments).await?;
        Card::reparent(&mut *tx, card_id, target_list_id).await?;
        Card::save_positions(&mut tx, &target_assignments).await?;

        vec![
            ScopeSnapshot {
                scope_id: source_list_id,
                items: source_assignments,
            },
            ScopeSnapshot {
                scope_id: target_list_id,
                items: target_assignments,
            },
        ]
    };

    tx.commit().await?;

    Ok(MoveOutcome { updated_scopes })
}

async fn try_move_list(
    pool: &SqlitePool,
    tenant_id: Uuid,
    list_id: Uuid,
    target_board_id: Uuid,
    target_index: usize,
) -> Result<MoveOutcome, OrderingError> {
    let mut tx = pool.begin().await?;

    let list = List::find_by_id_for_tenant(&mut *tx, list_id, tenant_id)
        .await?
        .ok_or(OrderingError::NotFound)?;
    if list.board_id != target_board_id {
        return Err(OrderingError::Validation(
            "lists cannot move between boards".to_string(),
        ));
    }

    let siblings = List::sibling_ids_ordered(&mut *tx, list.board_id).await?;
    let assignments = positioning::reindex(&siblings, list_id, target_index);
    List::save_positions(&mut tx, &assignments).await?;

    tx.commit().await?;

    Ok(MoveOutcome {
        updated_scopes: vec![ScopeSnapshot {
            scope_id: list.board_id,
            items: assignments,
        }],
    })
}

/// Re-run a move when the database reports a transient lock. Every retry
/// starts a fresh transaction over the committed state of the previous
/// winner.
async fn with_move_retry<F, Fut>(operation: &str, mut f: F) -> Result<MoveOutcome, OrderingError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<MoveOutcome, OrderingError>>,
{
    let config = RetryConfig::default();
    let mut attempt = 0;

    loop {
        match f().await {
            Err(OrderingError::Database(e))
                if is_retryable_error(&e) && attempt < config.max_retries =>
            {
                let delay = config.delay_for(attempt);
                tracing::warn!(
                    operation,
                    attempt = attempt + 1,
                    max_retries = config.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = ?e,
                    "transient SQLite error, retrying move"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            other => return other,
        }
    }
}
