//! Realtime fan-out router: rooms of live connections and best-effort
//! broadcast.
//!
//! The registry is the single owner of "who is in which room"; all access
//! goes through join/leave/broadcast/disconnect so it can be unit-tested
//! with bare channels. Nothing here persists: a connection that was offline
//! for a mutation re-fetches full state on rejoin instead of replaying a
//! backlog.

use std::{
    collections::{HashMap, HashSet},
    fmt,
    sync::RwLock,
};

use tokio::sync::mpsc::UnboundedSender;
use utils::wire::BroadcastEvent;
use uuid::Uuid;

pub type ConnectionId = Uuid;

/// A fan-out topic grouping connections interested in the same board or
/// card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Room {
    Board(Uuid),
    Card(Uuid),
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Room::Board(id) => write!(f, "board:{id}"),
            Room::Card(id) => write!(f, "card:{id}"),
        }
    }
}

#[derive(Default)]
struct Registry {
    connections: HashMap<ConnectionId, UnboundedSender<BroadcastEvent>>,
    rooms: HashMap<Room, HashSet<ConnectionId>>,
}

/// Owned registry of live connections and their room memberships.
#[derive(Default)]
pub struct RoomRegistry {
    inner: RwLock<Registry>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection and hand back its id. The sender is the
    /// connection's outbound event queue; its receiver side lives with the
    /// socket task.
    pub fn register(&self, sender: UnboundedSender<BroadcastEvent>) -> ConnectionId {
        let connection_id = Uuid::new_v4();
        let mut inner = self.inner.write().unwrap();
        inner.connections.insert(connection_id, sender);
        tracing::debug!(connection_id = %connection_id, "connection registered");
        connection_id
    }

    /// Add a connection to a room. Unknown connections are ignored (the
    /// socket already went away).
    pub fn join(&self, connection_id: ConnectionId, room: Room) {
        let mut inner = self.inner.write().unwrap();
        if !inner.connections.contains_key(&connection_id) {
            return;
        }
        inner.rooms.entry(room).or_default().insert(connection_id);
        tracing::debug!(connection_id = %connection_id, room = %room, "joined room");
    }

    pub fn leave(&self, connection_id: ConnectionId, room: Room) {
        let mut inner = self.inner.write().unwrap();
        if let Some(members) = inner.rooms.get_mut(&room) {
            members.remove(&connection_id);
            if members.is_empty() {
                inner.rooms.remove(&room);
            }
        }
        tracing::debug!(connection_id = %connection_id, room = %room, "left room");
    }

    /// Remove a connection from the registry and every room it joined.
    /// Called when the transport detects disconnect (close frame or pong
    /// timeout); nothing else needs to act.
    pub fn disconnect(&self, connection_id: ConnectionId) {
        let mut inner = self.inner.write().unwrap();
        inner.connections.remove(&connection_id);
        inner.rooms.retain(|_, members| {
            members.remove(&connection_id);
            !members.is_empty()
        });
        tracing::debug!(connection_id = %connection_id, "connection removed");
    }

    /// Deliver an event to every member of a room, except the originator
    /// when one is given. Best-effort and at-most-once: a send onto a closed
    /// channel marks the connection dead and drops it, never the broadcast.
    pub fn broadcast(&self, room: Room, event: &BroadcastEvent, exclude: Option<ConnectionId>) {
        let dead: Vec<ConnectionId> = {
            let inner = self.inner.read().unwrap();
            let Some(members) = inner.rooms.get(&room) else {
                return;
            };
            members
                .iter()
                .filter(|id| Some(**id) != exclude)
                .filter_map(|id| {
                    let sender = inner.connections.get(id)?;
                    match sender.send(event.clone()) {
                        Ok(()) => None,
                        Err(_) => Some(*id),
                    }
                })
                .collect()
        };

        for connection_id in dead {
            tracing::debug!(connection_id = %connection_id, room = %room, "dropping dead connection");
            self.disconnect(connection_id);
        }
    }

    pub fn room_size(&self, room: Room) -> usize {
        self.inner
            .read()
            .unwrap()
            .rooms
            .get(&room)
            .map_or(0, HashSet::len)
    }

    pub fn connection_count(&self) -> usize {
        self.inner.read().unwrap().connections.len()
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
    use utils::wire::{BroadcastEvent, EventType, ScopeSnapshot};

    use super::*;

    fn connect(registry: &RoomRegistry) -> (ConnectionId, UnboundedReceiver<BroadcastEvent>) {
        let (tx, rx) = unbounded_channel();
        (registry.register(tx), rx)
    }

    fn event(scope_id: Uuid) -> BroadcastEvent {
        BroadcastEvent::moved(
            EventType::CardMoved,
            &ScopeSnapshot {
                scope_id,
                items: vec![],
            },
        )
    }

    #[test]
    fn broadcast_reaches_room_members_only() {
        let registry = RoomRegistry::new();
        let board = Uuid::new_v4();
        let (member, mut member_rx) = connect(&registry);
        let (outsider, mut outsider_rx) = connect(&registry);

        registry.join(member, Room::Board(board));
        registry.join(outsider, Room::Board(Uuid::new_v4()));

        registry.broadcast(Room::Board(board), &event(board), None);

        assert!(member_rx.try_recv().is_ok());
        assert!(outsider_rx.try_recv().is_err());
    }

    #[test]
    fn originator_is_excluded() {
        let registry = RoomRegistry::new();
        let board = Uuid::new_v4();
        let (originator, mut originator_rx) = connect(&registry);
        let (other, mut other_rx) = connect(&registry);
        registry.join(originator, Room::Board(board));
        registry.join(other, Room::Board(board));

        registry.broadcast(Room::Board(board), &event(board), Some(originator));

        assert!(originator_rx.try_recv().is_err());
        assert!(other_rx.try_recv().is_ok());
    }

    #[test]
    fn leave_stops_delivery() {
        let registry = RoomRegistry::new();
        let board = Uuid::new_v4();
        let (member, mut rx) = connect(&registry);
        registry.join(member, Room::Board(board));
        registry.leave(member, Room::Board(board));

        registry.broadcast(Room::Board(board), &event(board), None);
        assert!(rx.try_recv().is_err());
        assert_eq!(registry.room_size(Room::Board(board)), 0);
    }

    #[test]
    fn disconnect_removes_all_memberships() {
        let registry = RoomRegistry::new();
        let (member, _rx) = connect(&registry);
        let board = Room::Board(Uuid::new_v4());
        let card = Room::Card(Uuid::new_v4());
        registry.join(member, board);
        registry.join(member, card);

        registry.disconnect(member);

        assert_eq!(registry.room_size(board), 0);
        assert_eq!(registry.room_size(card), 0);
        assert_eq!(registry.connection_count(), 0);
    }

    #[test]
    fn dead_receiver_is_pruned_on_broadcast() {
        let registry = RoomRegistry::new();
        let board = Uuid::new_v4();
        let (member, rx) = connect(&registry);
        registry.join(member, Room::Board(board));
        drop(rx);

        registry.broadcast(Room::Board(board), &event(board), None);

        assert_eq!(registry.connection_count(), 0);
        assert_eq!(registry.room_size(Room::Board(board)), 0);
    }

    #[test]
    fn join_after_disconnect_is_ignored() {
        let registry = RoomRegistry::new();
        let (member, _rx) = connect(&registry);
        registry.disconnect(member);
        registry.join(member, Room::Board(Uuid::new_v4()));
        assert_eq!(registry.connection_count(), 0);
    }

    #[test]
    fn room_keys_format_like_the_wire_protocol() {
        let id = Uuid::new_v4();
        assert_eq!(Room::Board(id).to_string(), format!("board:{id}"));
        assert_eq!(Room::Card(id).to_string(), format!("card:{id}"));
    }
}
