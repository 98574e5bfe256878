use domain::notification::NewNotification;
use domain::Id;
use serde::Deserialize;
use utoipa::ToSchema;

/// Request body for `POST /notifications`.
#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct CreateParams {
    #[schema(value_type = String, format = Uuid)]
    pub user_id: Id,
    #[schema(value_type = String, format = Uuid)]
    pub reservation_id: Id,
    pub message: String,
}

impl From<CreateParams> for NewNotification {
    fn from(params: CreateParams) -> Self {
        NewNotification {
            user_id: params.user_id,
            reservation_id: params.reservation_id,
            message: params.message,
        }
    }
}
