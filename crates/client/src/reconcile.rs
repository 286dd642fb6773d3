//! Applying broadcast events to local board state.
//!
//! Moved events are reconciled by wholesale replacement: the event carries
//! the scope's entire new order and the local order is overwritten, never
//! patched. That makes application idempotent and immune to arrival-order
//! races between a scope's own events. Created/updated/deleted events carry
//! the record in `payload`.

use serde::Deserialize;
use utils::{
    positioning::PositionAssignment,
    wire::{BroadcastEvent, EventType},
};
use uuid::Uuid;

use crate::model::{BoardState, CardView, ListView};

#[derive(Debug, Deserialize)]
struct CardPayload {
    id: Uuid,
    list_id: Uuid,
    title: String,
}

#[derive(Debug, Deserialize)]
struct ListPayload {
    id: Uuid,
    title: String,
}

#[derive(Debug, Deserialize)]
struct DeletedPayload {
    id: Uuid,
}

impl BoardState {
    /// Fold one broadcast event into local state. Events the board view does
    /// not track (comments) are ignored; malformed payloads are dropped with
    /// a debug log rather than poisoning the state.
    pub fn apply_event(&mut self, event: &BroadcastEvent) {
        match event.event_type {
            EventType::CardMoved => self.apply_card_scope(event.scope_id, &event.items),
            EventType::ListMoved => self.apply_list_scope(&event.items),
            EventType::ListCreated => {
                if let Some(payload) = parse_payload::<ListPayload>(event) {
                    if self.list(payload.id).is_none() {
                        self.lists.push(ListView {
                            id: payload.id,
                            title: payload.title,
                            cards: Vec::new(),
                        });
                    }
                }
            }
            EventType::ListUpdated => {
                if let Some(payload) = parse_payload::<ListPayload>(event) {
                    if let Some(list) = self.lists.iter_mut().find(|l| l.id == payload.id) {
                        list.title = payload.title;
                    }
                }
            }
            EventType::ListDeleted => {
                if let Some(payload) = parse_payload::<DeletedPayload>(event) {
                    self.lists.retain(|l| l.id != payload.id);
                }
            }
            EventType::CardCreated => {
                if let Some(payload) = parse_payload::<CardPayload>(event) {
                    if !self.contains_card(payload.id) && !self.limbo.contains_key(&payload.id) {
                        if let Some(list) =
                            self.lists.iter_mut().find(|l| l.id == payload.list_id)
                        {
                            list.cards.push(CardView {
                                id: payload.id,
                                title: payload.title,
                            });
                        }
                    }
                }
            }
            EventType::CardUpdated => {
                if let Some(payload) = parse_payload::<CardPayload>(event) {
                    if let Some(card) = self
                        .lists
                        .iter_mut()
                        .flat_map(|l| l.cards.iter_mut())
                        .find(|c| c.id == payload.id)
                    {
                        card.title = payload.title;
                    } else if let Some(card) = self.limbo.get_mut(&payload.id) {
                        card.title = payload.title;
                    }
                }
            }
            EventType::CardDeleted => {
                if let Some(payload) = parse_payload::<DeletedPayload>(event) {
                    for list in &mut self.lists {
                        list.cards.retain(|c| c.id != payload.id);
                    }
                    self.limbo.remove(&payload.id);
                }
            }
            // The board view has no comment state; the card detail view
            // re-fetches on these.
            EventType::CommentCreated | EventType::CommentDeleted => {}
        }
    }

    /// Overwrite one list's card order with an authoritative scope snapshot.
    ///
    /// Cards entering the scope are pulled from limbo or detached from
    /// whichever list still holds them (the counterpart scope event may not
    /// have arrived yet). Cards leaving the scope are parked in limbo until
    /// their destination's event lands.
    pub(crate) fn apply_card_scope(&mut self, scope_id: Uuid, items: &[PositionAssignment]) {
        let Some(list_index) = self.lists.iter().position(|l| l.id == scope_id) else {
            return;
        };

        let mut order: Vec<PositionAssignment> = items.to_vec();
        order.sort_by_key(|a| a.position);

        let mut departed: Vec<CardView> = std::mem::take(&mut self.lists[list_index].cards);
        let mut cards = Vec::with_capacity(order.len());
        for assignment in &order {
            let card = take_by_id(&mut departed, assignment.id)
                .or_else(|| self.limbo.remove(&assignment.id))
                .or_else(|| self.take_from_any_list(assignment.id));
            match card {
                Some(card) => cards.push(card),
                None => {
                    tracing::debug!(card_id = %assignment.id, "scope event references unknown card")
                }
            }
        }
        self.lists[list_index].cards = cards;

        for card in departed {
            self.limbo.insert(card.id, card);
        }
    }

    /// Overwrite the board's list order. Lists the event does not mention
    /// keep their relative order at the tail.
    pub(crate) fn apply_list_scope(&mut self, items: &[PositionAssignment]) {
        let mut order: Vec<PositionAssignment> = items.to_vec();
        order.sort_by_key(|a| a.position);

        let mut remaining = std::mem::take(&mut self.lists);
        let mut lists = Vec::with_capacity(remaining.len());
        for assignment in &order {
            if let Some(index) = remaining.iter().position(|l| l.id == assignment.id) {
                lists.push(remaining.remove(index));
            }
        }
        lists.extend(remaining);
        self.lists = lists;
    }

    fn take_from_any_list(&mut self, card_id: Uuid) -> Option<CardView> {
        for list in &mut self.lists {
            if let Some(card) = take_by_id(&mut list.cards, card_id) {
                return Some(card);
            }
        }
        None
    }
}

fn take_by_id(cards: &mut Vec<CardView>, card_id: Uuid) -> Option<CardView> {
    let index = cards.iter().position(|c| c.id == card_id)?;
    Some(cards.remove(index))
}

fn parse_payload<T: for<'de> Deserialize<'de>>(event: &BroadcastEvent) -> Option<T> {
    let payload = event.payload.as_ref()?;
    match serde_json::from_value(payload.clone()) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::debug!(event_type = ?event.event_type, error = %e, "unparseable event payload");
            None
        }
    }
}
