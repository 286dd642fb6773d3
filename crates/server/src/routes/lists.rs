use axum::{
    Extension, Json, Router,
    extract::State,
    http::HeaderMap,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use db::models::{
    activity::{ActivityType, NewActivity},
    card::Card,
    list::{CreateList, List, UpdateList},
};
use services::services::{
    activity_logger, ordering,
    realtime::Room,
    scope_guard,
};
use utils::{
    jwt::AuthContext,
    response::ApiResponse,
    wire::{BroadcastEvent, EventType, MoveOutcome},
};
use uuid::Uuid;

use crate::{
    AppState,
    error::ApiError,
    middleware::load_list_middleware,
    routes::{MoveRequest, originating_connection},
};

pub fn router(state: &AppState) -> Router<AppState> {
    let list_id_router = Router::new()
        .route("/", get(get_list).patch(update_list).delete(delete_list))
        .route("/cards", get(get_list_cards))
        .route("/move", post(move_list))
        .layer(from_fn_with_state(state.clone(), load_list_middleware));

    Router::new()
        .route("/lists", post(create_list))
        .nest("/lists/{list_id}", list_id_router)
}

async fn create_list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    headers: HeaderMap,
    Json(payload): Json<CreateList>,
) -> Result<Json<ApiResponse<List>>, ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".to_string()));
    }
    // The target board rides in the body, so no loader middleware covers it.
    scope_guard::board(state.pool(), payload.board_id, auth.tenant_id).await?;

    let list = List::create(state.pool(), &payload, Uuid::new_v4()).await?;

    state.realtime.broadcast(
        Room::Board(list.board_id),
        &BroadcastEvent::with_payload(
            EventType::ListCreated,
            list.board_id,
            serde_json::to_value(&list).unwrap_or_default(),
        ),
        originating_connection(&headers),
    );
    activity_logger::record(
        state.pool(),
        NewActivity {
            tenant_id: auth.tenant_id,
            board_id: list.board_id,
            user_id: auth.user_id,
            activity_type: ActivityType::ListCreated,
            metadata: Some(serde_json::json!({ "title": list.title })),
        },
    )
    .await;

    Ok(Json(ApiResponse::success(list)))
}

async fn get_list(
    Extension(list): Extension<List>,
) -> Json<ApiResponse<List>> {
    Json(ApiResponse::success(list))
}

async fn get_list_cards(
    State(state): State<AppState>,
    Extension(list): Extension<List>,
) -> Result<Json<ApiResponse<Vec<Card>>>, ApiError> {
    let cards = Card::find_by_list_id(state.pool(), list.id).await?;
    Ok(Json(ApiResponse::success(cards)))
}

async fn update_list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Extension(list): Extension<List>,
    headers: HeaderMap,
    Json(payload): Json<UpdateList>,
) -> Result<Json<ApiResponse<List>>, ApiError> {
    let list = List::update(state.pool(), list.id, &payload).await?;

    state.realtime.broadcast(
        Room::Board(list.board_id),
        &BroadcastEvent::with_payload(
            EventType::ListUpdated,
            list.board_id,
            serde_json::to_value(&list).unwrap_or_default(),
        ),
        originating_connection(&headers),
    );
    activity_logger::record(
        state.pool(),
        NewActivity {
            tenant_id: auth.tenant_id,
            board_id: list.board_id,
            user_id: auth.user_id,
            activity_type: ActivityType::ListUpdated,
            metadata: Some(serde_json::json!({ "title": list.title })),
        },
    )
    .await;

    Ok(Json(ApiResponse::success(list)))
}

async fn delete_list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Extension(list): Extension<List>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let rows = List::delete(state.pool(), list.id).await?;
    if rows == 0 {
        return Err(ApiError::NotFound);
    }

    state.realtime.broadcast(
        Room::Board(list.board_id),
        &BroadcastEvent::with_payload(
            EventType::ListDeleted,
            list.board_id,
            serde_json::json!({ "id": list.id }),
        ),
        originating_connection(&headers),
    );
    activity_logger::record(
        state.pool(),
        NewActivity {
            tenant_id: auth.tenant_id,
            board_id: list.board_id,
            user_id: auth.user_id,
            activity_type: ActivityType::ListDeleted,
            metadata: Some(serde_json::json!({ "title": list.title })),
        },
    )
    .await;

    Ok(Json(ApiResponse::success(())))
}

/// Reorder a list on its board. The response carries the authoritative new
/// order of the whole board scope; everyone else gets it as a broadcast.
async fn move_list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Extension(list): Extension<List>,
    headers: HeaderMap,
    Json(payload): Json<MoveRequest>,
) -> Result<Json<ApiResponse<MoveOutcome>>, ApiError> {
    let outcome = ordering::move_list(
        state.pool(),
        auth.tenant_id,
        list.id,
        payload.target_parent_id,
        payload.target_index as usize,
    )
    .await?;

    let originator = originating_connection(&headers);
    for scope in &outcome.updated_scopes {
        state.realtime.broadcast(
            Room::Board(scope.scope_id),
            &BroadcastEvent::moved(EventType::ListMoved, scope),
            originator,
        );
    }
    activity_logger::record(
        state.pool(),
        NewActivity {
            tenant_id: auth.tenant_id,
            board_id: list.board_id,
            user_id: auth.user_id,
            activity_type: ActivityType::ListMoved,
            metadata: Some(serde_json::json!({
                "title": list.title,
                "targetIndex": payload.target_index,
            })),
        },
    )
    .await;

    Ok(Json(ApiResponse::success(outcome)))
}
