use crate::controller::ApiResponse;
use crate::params::user::CreateParams;
use crate::{AppState, Error};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::user as UserApi;

use log::*;

/// POST register a new User
#[utoipa::path(
    post,
    path = "/users",
    request_body = crate::params::user::CreateParams,
    responses(
        (status = 201, description = "Successfully Created a New User", body = domain::users::Model),
        (status = 409, description = "A User with this email already exists"),
        (status = 422, description = "Unprocessable Entity"),
        (status = 500, description = "Internal Server Error")
    )
)]
pub async fn create(
    State(app_state): State<AppState>,
    Json(params): Json<CreateParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Create a New User: {}", params.email);

    let user = UserApi::create(app_state.db_conn_ref(), params.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.into(), user)),
    ))
}

/// GET all Users
#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "Successfully retrieved all Users", body = [domain::users::Model]),
        (status = 500, description = "Internal Server Error")
    )
)]
pub async fn index(State(app_state): State<AppState>) -> Result<impl IntoResponse, Error> {
    debug!("GET all Users");

    let users = UserApi::find_all(app_state.db_conn_ref()).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), users)))
}
