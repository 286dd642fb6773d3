//! The client's view of one board. Order is positional: a card's index in
//! its list's `cards` vec is its display position, so no position numbers
//! are stored here.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardView {
    pub id: Uuid,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListView {
    pub id: Uuid,
    pub title: String,
    pub cards: Vec<CardView>,
}

/// Full local state of a board.
///
/// `limbo` parks cards that left one scope while their destination scope's
/// event has not arrived yet. Scope events are independent frames, so during
/// a cross-list move a card can be briefly absent from every list; it must
/// never be lost or duplicated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardState {
    pub board_id: Uuid,
    pub lists: Vec<ListView>,
    pub(crate) limbo: HashMap<Uuid, CardView>,
}

impl BoardState {
    pub fn new(board_id: Uuid, lists: Vec<ListView>) -> Self {
        Self {
            board_id,
            lists,
            limbo: HashMap::new(),
        }
    }

    pub fn list(&self, list_id: Uuid) -> Option<&ListView> {
        self.lists.iter().find(|l| l.id == list_id)
    }

    pub fn list_order(&self) -> Vec<Uuid> {
        self.lists.iter().map(|l| l.id).collect()
    }

    pub fn card_order(&self, list_id: Uuid) -> Option<Vec<Uuid>> {
        self.list(list_id)
            .map(|l| l.cards.iter().map(|c| c.id).collect())
    }

    /// Whether a card is visible in some list (not deleted, not in limbo).
    pub fn contains_card(&self, card_id: Uuid) -> bool {
        self.lists.iter().any(|l| l.cards.iter().any(|c| c.id == card_id))
    }
}
