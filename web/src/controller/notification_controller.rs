use crate::controller::ApiResponse;
use crate::params::notification::CreateParams;
use crate::{AppState, Error};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::notification as NotificationApi;

use log::*;

/// POST create a new Notification for an existing Reservation
#[utoipa::path(
    post,
    path = "/notifications",
    request_body = crate::params::notification::CreateParams,
    responses(
        (status = 201, description = "Successfully Created a New Notification", body = domain::notifications::Model),
        (status = 404, description = "User or Reservation not found"),
        (status = 422, description = "Unprocessable Entity"),
        (status = 500, description = "Internal Server Error")
    )
)]
pub async fn create(
    State(app_state): State<AppState>,
    Json(params): Json<CreateParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Create a New Notification from: {params:?}");

    let notification = NotificationApi::create(
        app_state.db_conn_ref(),
        app_state.event_publisher.as_ref(),
        params.into(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.into(), notification)),
    ))
}

/// GET all Notifications, newest first
#[utoipa::path(
    get,
    path = "/notifications",
    responses(
        (status = 200, description = "Successfully retrieved all Notifications", body = [domain::notifications::Model]),
        (status = 500, description = "Internal Server Error")
    )
)]
pub async fn index(State(app_state): State<AppState>) -> Result<impl IntoResponse, Error> {
    debug!("GET all Notifications");

    let notifications = NotificationApi::find_all(app_state.db_conn_ref()).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), notifications)))
}
