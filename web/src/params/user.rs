use domain::user::NewUser;
use serde::Deserialize;
use utoipa::ToSchema;

/// Request body for `POST /users`.
#[derive(Deserialize, ToSchema)]
pub(crate) struct CreateParams {
    pub name: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    /// Plain text; only a hash is stored
    pub password: String,
}

impl From<CreateParams> for NewUser {
    fn from(params: CreateParams) -> Self {
        NewUser {
            name: params.name,
            email: params.email,
            password: params.password,
        }
    }
}
