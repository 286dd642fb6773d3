//! Test helpers for database tests.
//!
//! Centralizes pool creation so every test runs against a real file-backed
//! SQLite database with migrations applied.

use std::str::FromStr;

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode},
};
use tempfile::TempDir;
use uuid::Uuid;

use crate::models::{
    board::{Board, CreateBoard},
    card::{Card, CreateCard},
    list::{CreateList, List},
};

/// Create a temp-dir SQLite pool with migrations applied. Keep the returned
/// `TempDir` alive for the duration of the test.
pub async fn create_test_pool() -> (SqlitePool, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");

    let options =
        SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.to_string_lossy()))
            .expect("Invalid database URL")
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .foreign_keys(true);

    let pool = SqlitePool::connect_with(options)
        .await
        .expect("Failed to create pool");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    (pool, temp_dir)
}

/// Create a board for a fresh tenant; returns (tenant_id, board).
pub async fn create_test_board(pool: &SqlitePool) -> (Uuid, Board) {
    let tenant_id = Uuid::new_v4();
    let board = Board::create(
        pool,
        &CreateBoard {
            title: "Test Board".to_string(),
            description: None,
        },
        Uuid::new_v4(),
        tenant_id,
    )
    .await
    .expect("Failed to create test board");
    (tenant_id, board)
}

pub async fn create_test_list(pool: &SqlitePool, board_id: Uuid, title: &str) -> List {
    List::create(
        pool,
        &CreateList {
            board_id,
            title: title.to_string(),
        },
        Uuid::new_v4(),
    )
    .await
    .expect("Failed to create test list")
}

pub async fn create_test_card(pool: &SqlitePool, list_id: Uuid, title: &str) -> Card {
    Card::create(
        pool,
        &CreateCard {
            list_id,
            title: title.to_string(),
            description: None,
        },
        Uuid::new_v4(),
    )
    .await
    .expect("Failed to create test card")
}
