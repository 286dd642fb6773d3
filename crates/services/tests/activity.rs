use db::models::activity::{Activity, ActivityType, NewActivity};
use db::test_utils::{create_test_board, create_test_pool};
use services::services::activity_logger;
use uuid::Uuid;

#[tokio::test]
async fn recorded_activities_show_up_newest_first() {
    let (pool, _dir) = create_test_pool().await;
    let (tenant, board) = create_test_board(&pool).await;
    let user = Uuid::new_v4();

    for activity_type in [ActivityType::ListCreated, ActivityType::CardMoved] {
        activity_logger::record(
            &pool,
            NewActivity {
                tenant_id: tenant,
                board_id: board.id,
                user_id: user,
                activity_type,
                metadata: Some(serde_json::json!({ "title": "Todo" })),
            },
        )
        .await;
    }

    let feed = Activity::find_by_board_id(&pool, board.id, 50).await.unwrap();
    assert_eq!(feed.len(), 2);
    assert!(feed.iter().any(|a| a.activity_type == ActivityType::CardMoved));
    let metadata = feed[0].metadata.as_ref().unwrap();
    assert_eq!(metadata.0["title"], "Todo");
}

#[tokio::test]
async fn recording_against_a_missing_board_is_swallowed() {
    let (pool, _dir) = create_test_pool().await;

    // FK violation: no such board. Must not panic or propagate.
    activity_logger::record(
        &pool,
        NewActivity {
            tenant_id: Uuid::new_v4(),
            board_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            activity_type: ActivityType::BoardUpdated,
            metadata: None,
        },
    )
    .await;
}
