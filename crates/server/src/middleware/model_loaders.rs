//! Middlewares that resolve a path id into the owned record before the
//! handler runs. Each one re-checks the tenant's ownership chain, so a
//! handler holding an `Extension<Board>` (etc.) never needs to.

use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};
use services::services::scope_guard;
use utils::jwt::AuthContext;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

fn auth_from(request: &Request) -> Result<AuthContext, ApiError> {
    request
        .extensions()
        .get::<AuthContext>()
        .copied()
        .ok_or(ApiError::Unauthorized)
}

pub async fn load_board_middleware(
    State(state): State<AppState>,
    Path(board_id): Path<Uuid>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = auth_from(&request)?;
    let board = scope_guard::board(state.pool(), board_id, auth.tenant_id).await?;
    request.extensions_mut().insert(board);
    Ok(next.run(request).await)
}

pub async fn load_list_middleware(
    State(state): State<AppState>,
    Path(list_id): Path<Uuid>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = auth_from(&request)?;
    let list = scope_guard::list(state.pool(), list_id, auth.tenant_id).await?;
    request.extensions_mut().insert(list);
    Ok(next.run(request).await)
}

pub async fn load_card_middleware(
    State(state): State<AppState>,
    Path(card_id): Path<Uuid>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = auth_from(&request)?;
    let card = scope_guard::card(state.pool(), card_id, auth.tenant_id).await?;
    request.extensions_mut().insert(card);
    Ok(next.run(request).await)
}

pub async fn load_comment_middleware(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = auth_from(&request)?;
    let comment = scope_guard::comment(state.pool(), comment_id, auth.tenant_id).await?;
    request.extensions_mut().insert(comment);
    Ok(next.run(request).await)
}
