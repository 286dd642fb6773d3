//! Dense position assignment for ordered siblings within a scope.
//!
//! A "scope" is the collection a position is meaningful in: a list's cards,
//! or a board's lists. Every move renumbers the whole scope to `0..n-1`
//! instead of using fractional positions. A few extra writes per move buys
//! us freedom from drift compaction and tie-break rules.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// The position assigned to one scope member after a reindex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct PositionAssignment {
    pub id: Uuid,
    pub position: i64,
}

/// Reindex a scope after inserting (or moving) `moving_id` at `target_index`.
///
/// `moving_id` is removed from its current slot if present, then inserted at
/// `target_index` clamped to `[0, len]`. The returned assignments cover the
/// whole scope in final order with positions `0..n-1`.
pub fn reindex(existing: &[Uuid], moving_id: Uuid, target_index: usize) -> Vec<PositionAssignment> {
    let mut order: Vec<Uuid> = existing
        .iter()
        .copied()
        .filter(|id| *id != moving_id)
        .collect();
    let index = target_index.min(order.len());
    order.insert(index, moving_id);
    assign(&order)
}

/// Reindex a scope after removing `removed_id` (the source side of a
/// cross-scope move). Removing an id that is not present is a no-op reindex.
pub fn remove(existing: &[Uuid], removed_id: Uuid) -> Vec<PositionAssignment> {
    let order: Vec<Uuid> = existing
        .iter()
        .copied()
        .filter(|id| *id != removed_id)
        .collect();
    assign(&order)
}

fn assign(order: &[Uuid]) -> Vec<PositionAssignment> {
    // Duplicate sibling ids would silently assign two positions to one item.
    // This is an internal invariant, not a user input error.
    let distinct: HashSet<&Uuid> = order.iter().collect();
    assert!(
        distinct.len() == order.len(),
        "duplicate sibling id in scope"
    );

    order
        .iter()
        .enumerate()
        .map(|(index, id)| PositionAssignment {
            id: *id,
            position: index as i64,
        })
        .collect()
}
