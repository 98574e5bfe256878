use crate::controller::ApiResponse;
use crate::{AppState, Error};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::reservation as ReservationApi;
use domain::Id;

use log::*;

/// GET all Reservations belonging to a User, newest first
#[utoipa::path(
    get,
    path = "/users/{user_id}/reservations",
    params(
        ("user_id" = String, Path, format = Uuid, description = "Id of the User whose Reservations to retrieve")
    ),
    responses(
        (status = 200, description = "Successfully retrieved the User's Reservations", body = [domain::reservations::Model]),
        (status = 400, description = "Malformed user id"),
        (status = 500, description = "Internal Server Error")
    )
)]
pub async fn index(
    State(app_state): State<AppState>,
    Path(user_id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET Reservations for User: {user_id}");

    let reservations = ReservationApi::find_by_user_id(app_state.db_conn_ref(), user_id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), reservations)))
}
