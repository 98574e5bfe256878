use domain::reservation::NewReservation;
use domain::Id;
use serde::Deserialize;
use utoipa::ToSchema;

/// Request body for `POST /reservations`.
#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct CreateParams {
    #[schema(value_type = String, format = Uuid)]
    pub user_id: Id,
    /// Local date and time, formatted as `YYYY-MM-DD HH:MM:SS`
    #[schema(example = "2026-12-24 19:30:00")]
    pub reservation_date: String,
    pub num_people: i32,
    pub special_request: Option<String>,
    /// Defaults to `pending`
    pub status: Option<String>,
}

impl From<CreateParams> for NewReservation {
    fn from(params: CreateParams) -> Self {
        NewReservation {
            user_id: params.user_id,
            reservation_date: params.reservation_date,
            num_people: params.num_people,
            special_request: params.special_request,
            status: params.status,
        }
    }
}
