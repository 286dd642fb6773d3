use std::sync::Arc;

use db::DBService;
use services::services::realtime::RoomRegistry;
use sqlx::SqlitePool;

use crate::config::Config;

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;

/// Shared state handed to every route handler.
#[derive(Clone)]
pub struct AppState {
    pub db: DBService,
    pub realtime: Arc<RoomRegistry>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: DBService, config: Config) -> Self {
        Self {
            db,
            realtime: Arc::new(RoomRegistry::new()),
            config: Arc::new(config),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }
}
