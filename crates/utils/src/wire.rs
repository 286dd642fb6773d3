//! Wire types shared by the server surface and the client-side board store.
//!
//! A move request travels as a [`MoveIntent`]; the authoritative result comes
//! back as a [`MoveOutcome`] listing every repositioned sibling per affected
//! scope. Realtime fan-out delivers [`BroadcastEvent`]s with the same scope
//! snapshots so other sessions can overwrite their local order wholesale.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::positioning::PositionAssignment;

/// A client's request to relocate an item to a new scope and/or index.
/// Transient: consumed by the ordering service, never persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct MoveIntent {
    pub item_id: Uuid,
    pub target_parent_id: Uuid,
    pub target_index: u32,
}

/// The full ordered state of one scope after a reindex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ScopeSnapshot {
    pub scope_id: Uuid,
    pub items: Vec<PositionAssignment>,
}

/// Authoritative result of a move: every affected scope, every repositioned
/// sibling. Consumers must not assume only one record changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct MoveOutcome {
    pub updated_scopes: Vec<ScopeSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub enum EventType {
    ListCreated,
    ListUpdated,
    ListDeleted,
    ListMoved,
    CardCreated,
    CardUpdated,
    CardDeleted,
    CardMoved,
    CommentCreated,
    CommentDeleted,
}

/// A change notification fanned out to every connection in a room.
///
/// `items` carries the wholesale scope order for moved events; `payload`
/// carries the full record for created/updated events so receivers can apply
/// the change without a follow-up fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub scope_id: Uuid,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<PositionAssignment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl BroadcastEvent {
    /// Event for a reordered scope: the items are the scope's entire new order.
    pub fn moved(event_type: EventType, scope: &ScopeSnapshot) -> Self {
        Self {
            event_type,
            scope_id: scope.scope_id,
            items: scope.items.clone(),
            payload: None,
        }
    }

    /// Event carrying a full record (created/updated) or a bare id (deleted).
    pub fn with_payload(event_type: EventType, scope_id: Uuid, payload: serde_json::Value) -> Self {
        Self {
            event_type,
            scope_id,
            items: Vec::new(),
            payload: Some(payload),
        }
    }
}

/// Room membership requests a connection sends over the socket.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "id", rename_all = "camelCase")]
pub enum ClientMessage {
    JoinBoard(Uuid),
    LeaveBoard(Uuid),
    JoinCard(Uuid),
    LeaveCard(Uuid),
}

/// Non-event frames the server sends on a socket.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ControlMessage {
    #[serde(rename_all = "camelCase")]
    Connected { connection_id: Uuid },
    #[serde(rename_all = "camelCase")]
    Error { message: String },
}
