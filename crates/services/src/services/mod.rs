pub mod activity_logger;
pub mod ordering;
pub mod realtime;
pub mod scope_guard;
