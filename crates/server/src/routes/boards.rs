use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    middleware::from_fn_with_state,
    routing::get,
};
use db::models::{
    activity::{Activity, ActivityType, NewActivity},
    board::{Board, BoardSnapshot, CreateBoard, UpdateBoard},
};
use serde::Deserialize;
use services::services::activity_logger;
use utils::{jwt::AuthContext, response::ApiResponse};
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::load_board_middleware};

pub fn router(state: &AppState) -> Router<AppState> {
    let board_id_router = Router::new()
        .route("/", get(get_board).patch(update_board).delete(delete_board))
        .route("/activity", get(get_board_activity))
        .layer(from_fn_with_state(state.clone(), load_board_middleware));

    Router::new()
        .route("/boards", get(get_boards).post(create_board))
        .nest("/boards/{board_id}", board_id_router)
}

async fn get_boards(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<ApiResponse<Vec<Board>>>, ApiError> {
    let boards = Board::find_for_tenant(state.pool(), auth.tenant_id).await?;
    Ok(Json(ApiResponse::success(boards)))
}

async fn create_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateBoard>,
) -> Result<Json<ApiResponse<Board>>, ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".to_string()));
    }

    let board = Board::create(state.pool(), &payload, Uuid::new_v4(), auth.tenant_id).await?;

    activity_logger::record(
        state.pool(),
        NewActivity {
            tenant_id: auth.tenant_id,
            board_id: board.id,
            user_id: auth.user_id,
            activity_type: ActivityType::BoardCreated,
            metadata: Some(serde_json::json!({ "title": board.title })),
        },
    )
    .await;

    Ok(Json(ApiResponse::success(board)))
}

/// Full ordered state of the board. This is both the initial load and the
/// re-fetch a session performs after rejoining a board room.
async fn get_board(
    State(state): State<AppState>,
    Extension(board): Extension<Board>,
) -> Result<Json<ApiResponse<BoardSnapshot>>, ApiError> {
    let snapshot = Board::load_snapshot(state.pool(), board.id, board.tenant_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(ApiResponse::success(snapshot)))
}

async fn update_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Extension(board): Extension<Board>,
    Json(payload): Json<UpdateBoard>,
) -> Result<Json<ApiResponse<Board>>, ApiError> {
    let board = Board::update(state.pool(), board.id, board.tenant_id, &payload).await?;

    activity_logger::record(
        state.pool(),
        NewActivity {
            tenant_id: auth.tenant_id,
            board_id: board.id,
            user_id: auth.user_id,
            activity_type: ActivityType::BoardUpdated,
            metadata: None,
        },
    )
    .await;

    Ok(Json(ApiResponse::success(board)))
}

async fn delete_board(
    State(state): State<AppState>,
    Extension(board): Extension<Board>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    // Lists, cards, comments and the activity feed cascade with the board.
    let rows = Board::delete(state.pool(), board.id, board.tenant_id).await?;
    if rows == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(Json(ApiResponse::success(())))
}

#[derive(Debug, Deserialize)]
struct ActivityQuery {
    limit: Option<i64>,
}

async fn get_board_activity(
    State(state): State<AppState>,
    Extension(board): Extension<Board>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<ApiResponse<Vec<Activity>>>, ApiError> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let feed = Activity::find_by_board_id(state.pool(), board.id, limit).await?;
    Ok(Json(ApiResponse::success(feed)))
}
