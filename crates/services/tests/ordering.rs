//! Integration tests for the authoritative move path: same-list reorders,
//! cross-list moves, tenant scoping, and concurrent moves in one scope.

use db::models::{card::Card, list::List};
use db::test_utils::{create_test_board, create_test_card, create_test_list, create_test_pool};
use services::services::{
    ordering::{self, OrderingError},
    scope_guard::{self, ItemKind, ScopeError},
};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Card titles of a list in display order, asserting positions are dense.
async fn titles_in_order(pool: &SqlitePool, list_id: Uuid) -> Vec<String> {
    let cards = Card::find_by_list_id(pool, list_id).await.unwrap();
    for (index, card) in cards.iter().enumerate() {
        assert_eq!(card.position, index as i64, "positions must be dense");
    }
    cards.into_iter().map(|c| c.title).collect()
}

#[tokio::test]
async fn move_within_list_shifts_siblings() {
    let (pool, _dir) = create_test_pool().await;
    let (tenant, board) = create_test_board(&pool).await;
    let list = create_test_list(&pool, board.id, "A").await;
    create_test_card(&pool, list.id, "X").await;
    let y = create_test_card(&pool, list.id, "Y").await;
    create_test_card(&pool, list.id, "Z").await;

    let outcome = ordering::move_card(&pool, tenant, y.id, list.id, 0)
        .await
        .unwrap();

    assert_eq!(outcome.updated_scopes.len(), 1);
    assert_eq!(outcome.updated_scopes[0].scope_id, list.id);
    assert_eq!(outcome.updated_scopes[0].items.len(), 3);
    assert_eq!(titles_in_order(&pool, list.id).await, vec!["Y", "X", "Z"]);
}

#[tokio::test]
async fn cross_list_move_renumbers_both_scopes() {
    let (pool, _dir) = create_test_pool().await;
    let (tenant, board) = create_test_board(&pool).await;
    let list_a = create_test_list(&pool, board.id, "A").await;
    let list_b = create_test_list(&pool, board.id, "B").await;
    let x = create_test_card(&pool, list_a.id, "X").await;
    let y = create_test_card(&pool, list_a.id, "Y").await;
    create_test_card(&pool, list_a.id, "Z").await;

    // End-to-end scenario: move Y to index 0, then X to empty list B.
    ordering::move_card(&pool, tenant, y.id, list_a.id, 0)
        .await
        .unwrap();
    assert_eq!(titles_in_order(&pool, list_a.id).await, vec!["Y", "X", "Z"]);

    let outcome = ordering::move_card(&pool, tenant, x.id, list_b.id, 0)
        .await
        .unwrap();

    assert_eq!(outcome.updated_scopes.len(), 2);
    assert_eq!(outcome.updated_scopes[0].scope_id, list_a.id);
    assert_eq!(outcome.updated_scopes[1].scope_id, list_b.id);
    assert_eq!(titles_in_order(&pool, list_a.id).await, vec!["Y", "Z"]);
    assert_eq!(titles_in_order(&pool, list_b.id).await, vec!["X"]);

    let moved = outcome.updated_scopes[1]
        .items
        .iter()
        .find(|a| a.id == x.id)
        .expect("moved card appears in target scope");
    assert_eq!(moved.position, 0);
}

#[tokio::test]
async fn move_to_current_position_is_a_noop_with_dense_result() {
    let (pool, _dir) = create_test_pool().await;
    let (tenant, board) = create_test_board(&pool).await;
    let list = create_test_list(&pool, board.id, "A").await;
    create_test_card(&pool, list.id, "X").await;
    let y = create_test_card(&pool, list.id, "Y").await;

    let outcome = ordering::move_card(&pool, tenant, y.id, list.id, 1)
        .await
        .unwrap();

    assert_eq!(titles_in_order(&pool, list.id).await, vec!["X", "Y"]);
    let positions: Vec<i64> = outcome.updated_scopes[0]
        .items
        .iter()
        .map(|a| a.position)
        .collect();
    assert_eq!(positions, vec![0, 1]);
}

#[tokio::test]
async fn target_index_past_the_end_appends() {
    let (pool, _dir) = create_test_pool().await;
    let (tenant, board) = create_test_board(&pool).await;
    let list_a = create_test_list(&pool, board.id, "A").await;
    let list_b = create_test_list(&pool, board.id, "B").await;
    let x = create_test_card(&pool, list_a.id, "X").await;
    create_test_card(&pool, list_b.id, "P").await;
    create_test_card(&pool, list_b.id, "Q").await;

    ordering::move_card(&pool, tenant, x.id, list_b.id, 99)
        .await
        .unwrap();

    assert_eq!(titles_in_order(&pool, list_b.id).await, vec!["P", "Q", "X"]);
}

#[tokio::test]
async fn foreign_tenant_gets_not_found_and_no_write() {
    let (pool, _dir) = create_test_pool().await;
    let (tenant, board) = create_test_board(&pool).await;
    let list = create_test_list(&pool, board.id, "A").await;
    let x = create_test_card(&pool, list.id, "X").await;
    create_test_card(&pool, list.id, "Y").await;

    let result = ordering::move_card(&pool, Uuid::new_v4(), x.id, list.id, 1).await;
    assert!(matches!(result, Err(OrderingError::NotFound)));

    // No partial write: order untouched.
    assert_eq!(titles_in_order(&pool, list.id).await, vec!["X", "Y"]);
    let _ = tenant;
}

#[tokio::test]
async fn missing_target_list_gets_not_found() {
    let (pool, _dir) = create_test_pool().await;
    let (tenant, board) = create_test_board(&pool).await;
    let list = create_test_list(&pool, board.id, "A").await;
    let x = create_test_card(&pool, list.id, "X").await;

    let result = ordering::move_card(&pool, tenant, x.id, Uuid::new_v4(), 0).await;
    assert!(matches!(result, Err(OrderingError::NotFound)));
}

#[tokio::test]
async fn cross_board_card_move_is_rejected() {
    let (pool, _dir) = create_test_pool().await;
    let (tenant, board) = create_test_board(&pool).await;
    let list = create_test_list(&pool, board.id, "A").await;
    let x = create_test_card(&pool, list.id, "X").await;

    let other_board = db::models::board::Board::create(
        &pool,
        &db::models::board::CreateBoard {
            title: "Other".to_string(),
            description: None,
        },
        Uuid::new_v4(),
        tenant,
    )
    .await
    .unwrap();
    let foreign_list = create_test_list(&pool, other_board.id, "F").await;

    let result = ordering::move_card(&pool, tenant, x.id, foreign_list.id, 0).await;
    assert!(matches!(result, Err(OrderingError::Validation(_))));
}

#[tokio::test]
async fn list_move_reorders_the_board() {
    let (pool, _dir) = create_test_pool().await;
    let (tenant, board) = create_test_board(&pool).await;
    create_test_list(&pool, board.id, "A").await;
    create_test_list(&pool, board.id, "B").await;
    let c = create_test_list(&pool, board.id, "C").await;

    let outcome = ordering::move_list(&pool, tenant, c.id, board.id, 0)
        .await
        .unwrap();

    assert_eq!(outcome.updated_scopes.len(), 1);
    assert_eq!(outcome.updated_scopes[0].scope_id, board.id);

    let lists = List::find_by_board_id(&pool, board.id).await.unwrap();
    let titles: Vec<&str> = lists.iter().map(|l| l.title.as_str()).collect();
    assert_eq!(titles, vec!["C", "A", "B"]);
    for (index, list) in lists.iter().enumerate() {
        assert_eq!(list.position, index as i64);
    }
}

#[tokio::test]
async fn list_move_to_another_board_is_rejected() {
    let (pool, _dir) = create_test_pool().await;
    let (tenant, board) = create_test_board(&pool).await;
    let list = create_test_list(&pool, board.id, "A").await;

    let result = ordering::move_list(&pool, tenant, list.id, Uuid::new_v4(), 0).await;
    assert!(matches!(result, Err(OrderingError::Validation(_))));
}

#[tokio::test]
async fn concurrent_moves_in_one_scope_leave_dense_positions() {
    let (pool, _dir) = create_test_pool().await;
    let (tenant, board) = create_test_board(&pool).await;
    let list = create_test_list(&pool, board.id, "A").await;
    let mut card_ids = Vec::new();
    for title in ["A", "B", "C", "D", "E"] {
        card_ids.push(create_test_card(&pool, list.id, title).await.id);
    }

    // Two interleaved intents for the same scope. Serialization happens at
    // the database; both must succeed and the scope must end dense.
    let (first, second) = tokio::join!(
        ordering::move_card(&pool, tenant, card_ids[4], list.id, 0),
        ordering::move_card(&pool, tenant, card_ids[0], list.id, 4),
    );
    first.unwrap();
    second.unwrap();

    let cards = Card::find_by_list_id(&pool, list.id).await.unwrap();
    assert_eq!(cards.len(), 5);
    for (index, card) in cards.iter().enumerate() {
        assert_eq!(card.position, index as i64, "no duplicate or missing positions");
    }
}

#[tokio::test]
async fn scope_guard_resolves_the_ownership_chain() {
    let (pool, _dir) = create_test_pool().await;
    let (tenant, board) = create_test_board(&pool).await;
    let list = create_test_list(&pool, board.id, "A").await;
    let card = create_test_card(&pool, list.id, "X").await;

    assert_eq!(
        scope_guard::resolve_tenant(&pool, board.id, ItemKind::Board)
            .await
            .unwrap(),
        tenant
    );
    assert_eq!(
        scope_guard::resolve_tenant(&pool, list.id, ItemKind::List)
            .await
            .unwrap(),
        tenant
    );
    assert_eq!(
        scope_guard::resolve_tenant(&pool, card.id, ItemKind::Card)
            .await
            .unwrap(),
        tenant
    );

    let scoped = scope_guard::card(&pool, card.id, tenant).await.unwrap();
    assert_eq!(scoped.board_id, board.id);

    assert!(matches!(
        scope_guard::resolve_tenant(&pool, Uuid::new_v4(), ItemKind::Card).await,
        Err(ScopeError::NotFound)
    ));
    assert!(matches!(
        scope_guard::board(&pool, board.id, Uuid::new_v4()).await,
        Err(ScopeError::NotFound)
    ));
}
