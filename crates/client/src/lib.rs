//! Client-side board state: optimistic moves, rollback, and reconciliation
//! of realtime events.
//!
//! Everything here is synchronous and transport-free. The embedding UI feeds
//! in the initial snapshot, submits the intents this crate hands back, and
//! pipes responses and socket events into [`store::BoardStore`].

pub mod model;
pub mod reconcile;
pub mod store;
