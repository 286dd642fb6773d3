use axum::{
    Extension, Json, Router,
    extract::State,
    http::HeaderMap,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use db::models::{
    activity::{ActivityType, NewActivity},
    card::{Card, CardScoped, CreateCard, UpdateCard},
    comment::{Comment, CreateComment},
};
use serde::Serialize;
use services::services::{activity_logger, ordering, realtime::Room, scope_guard};
use ts_rs::TS;
use utils::{
    jwt::AuthContext,
    response::ApiResponse,
    wire::{BroadcastEvent, EventType, MoveOutcome},
};
use uuid::Uuid;

use crate::{
    AppState,
    error::ApiError,
    middleware::load_card_middleware,
    routes::{MoveRequest, originating_connection},
};

pub fn router(state: &AppState) -> Router<AppState> {
    let card_id_router = Router::new()
        .route("/", get(get_card).patch(update_card).delete(delete_card))
        .route("/comments", get(get_card_comments).post(create_comment))
        .route("/move", post(move_card))
        .layer(from_fn_with_state(state.clone(), load_card_middleware));

    Router::new()
        .route("/cards", post(create_card))
        .nest("/cards/{card_id}", card_id_router)
}

/// A card with its discussion, for the card detail view.
#[derive(Debug, Serialize, TS)]
pub struct CardDetail {
    pub card: Card,
    pub comments: Vec<Comment>,
}

async fn create_card(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    headers: HeaderMap,
    Json(payload): Json<CreateCard>,
) -> Result<Json<ApiResponse<Card>>, ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".to_string()));
    }
    let list = scope_guard::list(state.pool(), payload.list_id, auth.tenant_id).await?;

    let card = Card::create(state.pool(), &payload, Uuid::new_v4()).await?;

    state.realtime.broadcast(
        Room::Board(list.board_id),
        &BroadcastEvent::with_payload(
            EventType::CardCreated,
            card.list_id,
            serde_json::to_value(&card).unwrap_or_default(),
        ),
        originating_connection(&headers),
    );
    activity_logger::record(
        state.pool(),
        NewActivity {
            tenant_id: auth.tenant_id,
            board_id: list.board_id,
            user_id: auth.user_id,
            activity_type: ActivityType::CardCreated,
            metadata: Some(serde_json::json!({ "title": card.title })),
        },
    )
    .await;

    Ok(Json(ApiResponse::success(card)))
}

async fn get_card(
    State(state): State<AppState>,
    Extension(scoped): Extension<CardScoped>,
) -> Result<Json<ApiResponse<CardDetail>>, ApiError> {
    let comments = Comment::find_by_card_id(state.pool(), scoped.card.id).await?;
    Ok(Json(ApiResponse::success(CardDetail {
        card: scoped.card,
        comments,
    })))
}

async fn update_card(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Extension(scoped): Extension<CardScoped>,
    headers: HeaderMap,
    Json(payload): Json<UpdateCard>,
) -> Result<Json<ApiResponse<Card>>, ApiError> {
    let card = Card::update(state.pool(), scoped.card.id, &payload).await?;

    let originator = originating_connection(&headers);
    let event = BroadcastEvent::with_payload(
        EventType::CardUpdated,
        card.list_id,
        serde_json::to_value(&card).unwrap_or_default(),
    );
    state
        .realtime
        .broadcast(Room::Board(scoped.board_id), &event, originator);
    state
        .realtime
        .broadcast(Room::Card(card.id), &event, originator);

    activity_logger::record(
        state.pool(),
        NewActivity {
            tenant_id: auth.tenant_id,
            board_id: scoped.board_id,
            user_id: auth.user_id,
            activity_type: ActivityType::CardUpdated,
            metadata: Some(serde_json::json!({ "title": card.title })),
        },
    )
    .await;

    Ok(Json(ApiResponse::success(card)))
}

async fn delete_card(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Extension(scoped): Extension<CardScoped>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let rows = Card::delete(state.pool(), scoped.card.id).await?;
    if rows == 0 {
        return Err(ApiError::NotFound);
    }

    let originator = originating_connection(&headers);
    let event = BroadcastEvent::with_payload(
        EventType::CardDeleted,
        scoped.card.list_id,
        serde_json::json!({ "id": scoped.card.id }),
    );
    state
        .realtime
        .broadcast(Room::Board(scoped.board_id), &event, originator);
    state
        .realtime
        .broadcast(Room::Card(scoped.card.id), &event, originator);

    activity_logger::record(
        state.pool(),
        NewActivity {
            tenant_id: auth.tenant_id,
            board_id: scoped.board_id,
            user_id: auth.user_id,
            activity_type: ActivityType::CardDeleted,
            metadata: Some(serde_json::json!({ "title": scoped.card.title })),
        },
    )
    .await;

    Ok(Json(ApiResponse::success(())))
}

/// Relocate a card within its list or to a sibling list. One broadcast per
/// affected scope carries that scope's entire new order, so receivers
/// overwrite rather than patch.
async fn move_card(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Extension(scoped): Extension<CardScoped>,
    headers: HeaderMap,
    Json(payload): Json<MoveRequest>,
) -> Result<Json<ApiResponse<MoveOutcome>>, ApiError> {
    let outcome = ordering::move_card(
        state.pool(),
        auth.tenant_id,
        scoped.card.id,
        payload.target_parent_id,
        payload.target_index as usize,
    )
    .await?;

    let originator = originating_connection(&headers);
    for scope in &outcome.updated_scopes {
        state.realtime.broadcast(
            Room::Board(scoped.board_id),
            &BroadcastEvent::moved(EventType::CardMoved, scope),
            originator,
        );
    }
    activity_logger::record(
        state.pool(),
        NewActivity {
            tenant_id: auth.tenant_id,
            board_id: scoped.board_id,
            user_id: auth.user_id,
            activity_type: ActivityType::CardMoved,
            metadata: Some(serde_json::json!({
                "title": scoped.card.title,
                "fromListId": scoped.card.list_id,
                "toListId": payload.target_parent_id,
                "targetIndex": payload.target_index,
            })),
        },
    )
    .await;

    Ok(Json(ApiResponse::success(outcome)))
}

async fn get_card_comments(
    State(state): State<AppState>,
    Extension(scoped): Extension<CardScoped>,
) -> Result<Json<ApiResponse<Vec<Comment>>>, ApiError> {
    let comments = Comment::find_by_card_id(state.pool(), scoped.card.id).await?;
    Ok(Json(ApiResponse::success(comments)))
}

async fn create_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Extension(scoped): Extension<CardScoped>,
    headers: HeaderMap,
    Json(payload): Json<CreateComment>,
) -> Result<Json<ApiResponse<Comment>>, ApiError> {
    if payload.body.trim().is_empty() {
        return Err(ApiError::BadRequest("body must not be empty".to_string()));
    }

    let comment = Comment::create(
        state.pool(),
        &payload,
        Uuid::new_v4(),
        scoped.card.id,
        auth.user_id,
    )
    .await?;

    state.realtime.broadcast(
        Room::Card(scoped.card.id),
        &BroadcastEvent::with_payload(
            EventType::CommentCreated,
            scoped.card.id,
            serde_json::to_value(&comment).unwrap_or_default(),
        ),
        originating_connection(&headers),
    );
    activity_logger::record(
        state.pool(),
        NewActivity {
            tenant_id: auth.tenant_id,
            board_id: scoped.board_id,
            user_id: auth.user_id,
            activity_type: ActivityType::CommentCreated,
            metadata: Some(serde_json::json!({ "cardTitle": scoped.card.title })),
        },
    )
    .await;

    Ok(Json(ApiResponse::success(comment)))
}
