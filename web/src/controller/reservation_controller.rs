use crate::controller::ApiResponse;
use crate::params::reservation::CreateParams;
use crate::{AppState, Error};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::reservation as ReservationApi;

use log::*;

/// POST create a new Reservation and push a notification to realtime clients
#[utoipa::path(
    post,
    path = "/reservations",
    request_body = crate::params::reservation::CreateParams,
    responses(
        (status = 201, description = "Successfully Created a New Reservation", body = domain::reservations::Model),
        (status = 404, description = "User not found"),
        (status = 422, description = "Unprocessable Entity"),
        (status = 500, description = "Internal Server Error")
    )
)]
pub async fn create(
    State(app_state): State<AppState>,
    Json(params): Json<CreateParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Create a New Reservation from: {params:?}");

    let reservation = ReservationApi::create(
        app_state.db_conn_ref(),
        app_state.event_publisher.as_ref(),
        params.into(),
    )
    .await?;

    debug!("New Reservation: {reservation:?}");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.into(), reservation)),
    ))
}

/// GET all Reservations, newest first
#[utoipa::path(
    get,
    path = "/reservations",
    responses(
        (status = 200, description = "Successfully retrieved all Reservations", body = [domain::reservations::Model]),
        (status = 500, description = "Internal Server Error")
    )
)]
pub async fn index(State(app_state): State<AppState>) -> Result<impl IntoResponse, Error> {
    debug!("GET all Reservations");

    let reservations = ReservationApi::find_all(app_state.db_conn_ref()).await?;

    debug!("Found {} Reservations", reservations.len());

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), reservations)))
}
