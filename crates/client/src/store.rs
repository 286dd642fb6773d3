//! The optimistic mutation queue over one board's state.
//!
//! A move is applied locally the moment the user drops the card, then
//! submitted; the store keeps a pre-apply snapshot plus every event that
//! arrives while the request is in flight. Confirmation overwrites the
//! affected scopes with the authoritative result; failure rolls back to the
//! snapshot and replays the in-flight events in arrival order. Either way,
//! moves queued behind the settled one are re-applied on top.

use thiserror::Error;
use utils::wire::{BroadcastEvent, MoveIntent, MoveOutcome};
use uuid::Uuid;

use crate::model::{BoardState, ListView};

pub type MutationId = Uuid;

/// The submission seam the embedding UI implements: HTTP, a test recorder,
/// whatever. The store hands an intent here the moment its optimistic apply
/// lands; the implementation later settles it via [`BoardStore::confirm`] or
/// [`BoardStore::fail`].
pub trait MoveTransport {
    fn submit(&mut self, mutation_id: MutationId, intent: &MoveIntent);
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("unknown item")]
    UnknownItem,
    #[error("unknown target scope")]
    UnknownTarget,
    #[error("unknown mutation")]
    UnknownMutation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MoveKind {
    Card,
    List,
}

#[derive(Debug, Clone)]
struct PendingMutation {
    id: MutationId,
    kind: MoveKind,
    intent: MoveIntent,
    /// State just before this mutation's optimistic apply.
    snapshot: BoardState,
    /// Every broadcast event applied while this mutation was in flight,
    /// in arrival order. Replayed after a rollback.
    events_seen: Vec<BroadcastEvent>,
}

pub struct BoardStore {
    state: BoardState,
    pending: Vec<PendingMutation>,
}

impl BoardStore {
    pub fn new(board_id: Uuid, lists: Vec<ListView>) -> Self {
        Self {
            state: BoardState::new(board_id, lists),
            pending: Vec::new(),
        }
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Optimistically move a card and hand back the intent to submit.
    pub fn begin_move_card(
        &mut self,
        card_id: Uuid,
        target_list_id: Uuid,
        target_index: u32,
    ) -> Result<(MutationId, MoveIntent), StoreError> {
        // A card mid-transit between two scope frames sits in limbo rather
        // than a list; it is still a movable item.
        let known =
            self.state.contains_card(card_id) || self.state.limbo.contains_key(&card_id);
        if !known {
            return Err(StoreError::UnknownItem);
        }
        if self.state.list(target_list_id).is_none() {
            return Err(StoreError::UnknownTarget);
        }

        let intent = MoveIntent {
            item_id: card_id,
            target_parent_id: target_list_id,
            target_index,
        };
        let snapshot = self.state.clone();
        self.apply_intent(MoveKind::Card, &intent);

        let id = Uuid::new_v4();
        self.pending.push(PendingMutation {
            id,
            kind: MoveKind::Card,
            intent,
            snapshot,
            events_seen: Vec::new(),
        });
        Ok((id, intent))
    }

    /// Optimistically reorder a list on the board.
    pub fn begin_move_list(
        &mut self,
        list_id: Uuid,
        target_index: u32,
    ) -> Result<(MutationId, MoveIntent), StoreError> {
        if self.state.list(list_id).is_none() {
            return Err(StoreError::UnknownItem);
        }

        let intent = MoveIntent {
            item_id: list_id,
            target_parent_id: self.state.board_id,
            target_index,
        };
        let snapshot = self.state.clone();
        self.apply_intent(MoveKind::List, &intent);

        let id = Uuid::new_v4();
        self.pending.push(PendingMutation {
            id,
            kind: MoveKind::List,
            intent,
            snapshot,
            events_seen: Vec::new(),
        });
        Ok((id, intent))
    }

    /// Optimistically move a card and submit the intent in one step.
    pub fn submit_move_card(
        &mut self,
        transport: &mut impl MoveTransport,
        card_id: Uuid,
        target_list_id: Uuid,
        target_index: u32,
    ) -> Result<MutationId, StoreError> {
        let (id, intent) = self.begin_move_card(card_id, target_list_id, target_index)?;
        transport.submit(id, &intent);
        Ok(id)
    }

    /// Optimistically reorder a list and submit the intent in one step.
    pub fn submit_move_list(
        &mut self,
        transport: &mut impl MoveTransport,
        list_id: Uuid,
        target_index: u32,
    ) -> Result<MutationId, StoreError> {
        let (id, intent) = self.begin_move_list(list_id, target_index)?;
        transport.submit(id, &intent);
        Ok(id)
    }

    /// Settle a mutation with the server's authoritative outcome. The
    /// affected scopes are overwritten wholesale, then any moves still
    /// queued behind this one are re-applied on top.
    pub fn confirm(
        &mut self,
        mutation_id: MutationId,
        outcome: &MoveOutcome,
    ) -> Result<(), StoreError> {
        let mutation = self.take_pending(mutation_id)?;

        for scope in &outcome.updated_scopes {
            match mutation.kind {
                MoveKind::Card => self.state.apply_card_scope(scope.scope_id, &scope.items),
                MoveKind::List => self.state.apply_list_scope(&scope.items),
            }
        }

        self.rebase_pending();
        Ok(())
    }

    /// Settle a rejected or failed mutation: roll back to the snapshot,
    /// replay everything that arrived in the meantime, then re-apply any
    /// queued moves.
    pub fn fail(&mut self, mutation_id: MutationId) -> Result<(), StoreError> {
        let mutation = self.take_pending(mutation_id)?;

        self.state = mutation.snapshot;
        for event in &mutation.events_seen {
            self.state.apply_event(event);
        }

        self.rebase_pending();
        Ok(())
    }

    /// Fold a broadcast event into local state, remembering it for every
    /// in-flight mutation's rollback path. In-flight moves are re-applied on
    /// top afterwards: a foreign scope overwrite must not visibly revert an
    /// optimistic edit that is still awaiting its confirmation.
    pub fn apply_event(&mut self, event: &BroadcastEvent) {
        for mutation in &mut self.pending {
            mutation.events_seen.push(event.clone());
        }
        self.state.apply_event(event);
        if !self.pending.is_empty() {
            self.rebase_pending();
        }
    }

    fn take_pending(&mut self, mutation_id: MutationId) -> Result<PendingMutation, StoreError> {
        let index = self
            .pending
            .iter()
            .position(|m| m.id == mutation_id)
            .ok_or(StoreError::UnknownMutation)?;
        Ok(self.pending.remove(index))
    }

    fn apply_intent(&mut self, kind: MoveKind, intent: &MoveIntent) {
        match kind {
            MoveKind::Card => self.move_card_local(intent),
            MoveKind::List => self.move_list_local(intent),
        }
    }

    /// Re-apply every still-pending intent onto the current state and
    /// refresh its snapshot. Runs whenever the state changed underneath the
    /// queue: an older mutation settled, or an inbound event landed.
    fn rebase_pending(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        for mut mutation in pending {
            mutation.snapshot = self.state.clone();
            self.apply_intent(mutation.kind, &mutation.intent);
            self.pending.push(mutation);
        }
    }

    fn move_card_local(&mut self, intent: &MoveIntent) {
        let card = self
            .state
            .lists
            .iter_mut()
            .find_map(|list| {
                let index = list.cards.iter().position(|c| c.id == intent.item_id)?;
                Some(list.cards.remove(index))
            })
            .or_else(|| self.state.limbo.remove(&intent.item_id));
        // The item can vanish under a queued intent (deleted remotely,
        // clobbered by a rebase); the intent then degrades to a no-op.
        let Some(card) = card else {
            tracing::debug!(card_id = %intent.item_id, "move target no longer present");
            return;
        };

        let Some(list) = self
            .state
            .lists
            .iter_mut()
            .find(|l| l.id == intent.target_parent_id)
        else {
            self.state.limbo.insert(card.id, card);
            return;
        };
        let index = (intent.target_index as usize).min(list.cards.len());
        list.cards.insert(index, card);
    }

    fn move_list_local(&mut self, intent: &MoveIntent) {
        let Some(current) = self
            .state
            .lists
            .iter()
            .position(|l| l.id == intent.item_id)
        else {
            tracing::debug!(list_id = %intent.item_id, "move target no longer present");
            return;
        };
        let list = self.state.lists.remove(current);
        let index = (intent.target_index as usize).min(self.state.lists.len());
        self.state.lists.insert(index, list);
    }
}
