pub mod boards;
pub mod cards;
pub mod comments;
pub mod health;
pub mod lists;
pub mod ws;

use axum::{
    Router,
    http::{HeaderMap, HeaderName, HeaderValue, Method, header},
    middleware::from_fn_with_state,
    routing::get,
};
use serde::Deserialize;
use services::services::realtime::ConnectionId;
use tower_http::cors::{Any, CorsLayer};
use ts_rs::TS;
use uuid::Uuid;

use crate::{AppState, middleware::auth_middleware};

/// Body of a move endpoint. The moved item's id rides in the path; the body
/// names where it should land.
#[derive(Debug, Clone, Copy, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub target_parent_id: Uuid,
    pub target_index: u32,
}

/// Header a client sets to tie its HTTP mutations to its live socket.
pub const CONNECTION_ID_HEADER: &str = "x-connection-id";

/// The originating socket of a mutation, when the client supplied one.
/// Broadcasts skip this connection; its owner already has the authoritative
/// response in hand.
pub(crate) fn originating_connection(headers: &HeaderMap) -> Option<ConnectionId> {
    headers
        .get(CONNECTION_ID_HEADER)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .merge(boards::router(&state))
        .merge(lists::router(&state))
        .merge(cards::router(&state))
        .merge(comments::router(&state))
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    let cors = cors_layer(&state);

    Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/events/ws", get(ws::events_ws))
        .nest("/api", protected)
        .layer(cors)
        .with_state(state)
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(CONNECTION_ID_HEADER),
        ]);

    let configured = state
        .config
        .cors_origin
        .as_deref()
        .and_then(|origin| origin.parse::<HeaderValue>().ok());
    match configured {
        Some(origin) => layer.allow_origin(origin),
        None => layer.allow_origin(Any),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_header_parses_as_uuid() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            CONNECTION_ID_HEADER,
            HeaderValue::from_str(&id.to_string()).unwrap(),
        );
        assert_eq!(originating_connection(&headers), Some(id));
    }

    #[test]
    fn garbage_connection_header_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(CONNECTION_ID_HEADER, HeaderValue::from_static("not-a-uuid"));
        assert_eq!(originating_connection(&headers), None);
        assert_eq!(originating_connection(&HeaderMap::new()), None);
    }

    #[test]
    fn move_request_accepts_camel_case() {
        let request: MoveRequest = serde_json::from_value(serde_json::json!({
            "targetParentId": Uuid::new_v4(),
            "targetIndex": 3,
        }))
        .unwrap();
        assert_eq!(request.target_index, 3);
    }
}
