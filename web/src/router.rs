use crate::controller::{
    health_check_controller, notification_controller, reservation_controller, user,
    user_controller,
};
use crate::{params, realtime_handler, AppState};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use log::*;
use tower_http::cors::{AllowOrigin, CorsLayer};

use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Reservation Platform API"
        ),
        paths(
            health_check_controller::health_check,
            notification_controller::create,
            notification_controller::index,
            reservation_controller::create,
            reservation_controller::index,
            user::reservation_controller::index,
            user_controller::create,
            user_controller::index,
            realtime_handler::ws_handler,
        ),
        components(
            schemas(
                domain::notifications::Model,
                domain::reservations::Model,
                domain::users::Model,
                params::notification::CreateParams,
                params::reservation::CreateParams,
                params::user::CreateParams,
            )
        ),
        tags(
            (name = "reservation_platform", description = "Reservations with real-time notifications")
        )
    )]
struct ApiDoc;

pub fn define_routes(app_state: AppState) -> Router {
    let cors = cors_layer(app_state.origin_policy.origins());

    Router::new()
        .merge(health_routes())
        .merge(notification_routes(app_state.clone()))
        .merge(reservation_routes(app_state.clone()))
        .merge(user_routes(app_state.clone()))
        .merge(user_reservation_routes(app_state.clone()))
        .merge(realtime_routes(app_state))
        .merge(RapiDoc::with_openapi("/api-docs/openapi2.json", ApiDoc::openapi()).path("/rapidoc"))
        .layer(cors)
}

/// CORS for browser clients, restricted to the same allow-list as `/ws`.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter(|origin| origin.as_str() != "*")
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring unusable allowed origin {origin:?}: {e}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(true)
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn notification_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/notifications", get(notification_controller::index))
        .route("/notifications", post(notification_controller::create))
        .with_state(app_state)
}

fn reservation_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/reservations", get(reservation_controller::index))
        .route("/reservations", post(reservation_controller::create))
        .with_state(app_state)
}

fn user_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/users", get(user_controller::index))
        .route("/users", post(user_controller::create))
        .with_state(app_state)
}

fn user_reservation_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/users/:user_id/reservations",
            get(user::reservation_controller::index),
        )
        .with_state(app_state)
}

fn realtime_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/ws", get(realtime_handler::ws_handler))
        .with_state(app_state)
}
