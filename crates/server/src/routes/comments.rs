use axum::{
    Extension, Json, Router, extract::State, http::HeaderMap, middleware::from_fn_with_state,
    routing::delete,
};
use db::models::{
    activity::{ActivityType, NewActivity},
    comment::Comment,
};
use services::services::{activity_logger, realtime::Room, scope_guard};
use utils::{
    jwt::AuthContext,
    response::ApiResponse,
    wire::{BroadcastEvent, EventType},
};

use crate::{
    AppState, error::ApiError, middleware::load_comment_middleware, routes::originating_connection,
};

pub fn router(state: &AppState) -> Router<AppState> {
    let comment_id_router = Router::new()
        .route("/", delete(delete_comment))
        .layer(from_fn_with_state(state.clone(), load_comment_middleware));

    Router::new().nest("/comments/{comment_id}", comment_id_router)
}

async fn delete_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Extension(comment): Extension<Comment>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    // The feed entry needs the owning board, which the comment row does not
    // carry.
    let scoped = scope_guard::card(state.pool(), comment.card_id, auth.tenant_id).await?;

    let rows = Comment::delete(state.pool(), comment.id).await?;
    if rows == 0 {
        return Err(ApiError::NotFound);
    }

    state.realtime.broadcast(
        Room::Card(comment.card_id),
        &BroadcastEvent::with_payload(
            EventType::CommentDeleted,
            comment.card_id,
            serde_json::json!({ "id": comment.id }),
        ),
        originating_connection(&headers),
    );
    activity_logger::record(
        state.pool(),
        NewActivity {
            tenant_id: auth.tenant_id,
            board_id: scoped.board_id,
            user_id: auth.user_id,
            activity_type: ActivityType::CommentDeleted,
            metadata: Some(serde_json::json!({ "cardTitle": scoped.card.title })),
        },
    )
    .await;

    Ok(Json(ApiResponse::success(())))
}
