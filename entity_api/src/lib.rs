use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

pub use entity::{notifications, reservations, users, Id};

pub mod error;
pub mod notification;
pub mod reservation;
pub mod user;

/// Wire format accepted for `reservation_date`.
pub const RESERVATION_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn naive_date_time_parse_str(date_str: &str) -> Result<chrono::NaiveDateTime, error::Error> {
    chrono::NaiveDateTime::parse_from_str(date_str, RESERVATION_DATE_FORMAT)
        .map_err(|_| error::Error::new(error::EntityApiErrorKind::InvalidQueryTerm))
}

/// Inserts a demo user and one reservation for local development.
pub async fn seed_database(db: &DatabaseConnection) -> Result<users::Model, error::Error> {
    let now = Utc::now();

    let demo_user = users::ActiveModel {
        name: Set("Demo Diner".to_owned()),
        email: Set("demo@reservations.local".to_owned()),
        password: Set(user::generate_hash("password".to_owned())),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    reservations::ActiveModel {
        user_id: Set(demo_user.id),
        reservation_date: Set(now.naive_utc()),
        num_people: Set(2),
        special_request: Set(Some("Window seat".to_owned())),
        status: Set(reservations::DEFAULT_STATUS.to_owned()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(demo_user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn naive_date_time_parse_str_accepts_the_wire_format() {
        let parsed = naive_date_time_parse_str("2024-12-24 19:30:00").unwrap();
        assert_eq!(parsed.to_string(), "2024-12-24 19:30:00");
    }

    #[test]
    fn naive_date_time_parse_str_rejects_other_formats() {
        assert!(naive_date_time_parse_str("2024-12-24").is_err());
        assert!(naive_date_time_parse_str("2024-12-24T19:30:00Z").is_err());
        assert!(naive_date_time_parse_str("invalid").is_err());
    }
}
