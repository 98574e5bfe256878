//! HTTP entry point of the realtime layer.
//!
//! The connection lifecycle, registry and fan-out loop live in the
//! `realtime` crate; this module only checks the origin and upgrades.
use crate::AppState;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use log::*;

/// GET upgrade to a realtime WebSocket connection
#[utoipa::path(
    get,
    path = "/ws",
    responses(
        (status = 101, description = "Switching protocols to WebSocket"),
        (status = 400, description = "Not a WebSocket upgrade request"),
        (status = 403, description = "Origin not allowed")
    )
)]
pub(crate) async fn ws_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let origin = headers
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok());

    if !app_state.origin_policy.allows(origin) {
        warn!("Rejected WebSocket upgrade from origin {origin:?}");
        return (StatusCode::FORBIDDEN, "FORBIDDEN").into_response();
    }

    let registry = app_state.connection_registry.clone();
    let dispatcher = app_state.dispatcher.clone();

    ws.on_failed_upgrade(|e| error!("WebSocket upgrade failed: {e}"))
        .on_upgrade(move |socket| async move {
            realtime::session::serve(socket, registry, dispatcher).await;
        })
}
