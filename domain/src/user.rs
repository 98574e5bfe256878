use crate::error::Error;
use crate::users::Model;
use crate::Id;
use entity_api::user;
use sea_orm::DatabaseConnection;

use log::*;

/// Input for [`create`]. `password` is plain text and is hashed before it
/// is stored.
#[derive(Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Registers a user. The email must be unused.
pub async fn create(db: &DatabaseConnection, new_user: NewUser) -> Result<Model, Error> {
    let name = new_user.name.trim().to_owned();
    let email = new_user.email.trim().to_owned();
    if name.is_empty() || email.is_empty() || new_user.password.is_empty() {
        return Err(Error::validation("name, email and password are required"));
    }
    if !is_valid_email(&email) {
        return Err(Error::validation("email is not a valid address"));
    }

    if user::find_by_email(db, &email).await?.is_some() {
        return Err(Error::conflict("user already exists"));
    }

    let now = chrono::Utc::now();
    let user = user::create(
        db,
        Model {
            id: Id::nil(),
            name,
            email,
            password: new_user.password,
            created_at: now.into(),
            updated_at: now.into(),
        },
    )
    .await?;
    info!("Created user {}", user.id);

    Ok(user)
}

/// All users, oldest first.
pub async fn find_all(db: &DatabaseConnection) -> Result<Vec<Model>, Error> {
    Ok(user::find_all(db).await?)
}

/// `local@domain.tld` with no whitespace and a single `@`.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape_is_checked() {
        assert!(is_valid_email("ada@example.com"));
        assert!(is_valid_email("ada.lovelace@mail.example.co.uk"));

        for bad in ["", "ada", "ada@", "@example.com", "ada@example", "a da@example.com", "a@b@c.com"] {
            assert!(!is_valid_email(bad), "{bad} should be rejected");
        }
    }

    #[test]
    fn debug_output_omits_the_password() {
        let new_user = NewUser {
            name: "Ada".to_owned(),
            email: "ada@example.com".to_owned(),
            password: "correct horse".to_owned(),
        };

        assert!(!format!("{new_user:?}").contains("correct horse"));
    }
}
