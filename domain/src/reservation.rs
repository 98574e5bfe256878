use crate::error::Error;
use crate::reservations::{Model, DEFAULT_STATUS};
use crate::{notifications, to_event_value, Id};
use entity_api::{naive_date_time_parse_str, notification, reservation, user};
use events::{DomainEvent, EventPublisher};
use sea_orm::DatabaseConnection;

use log::*;

/// Input for [`create`]. `reservation_date` uses `YYYY-MM-DD HH:MM:SS`.
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub user_id: Id,
    pub reservation_date: String,
    pub num_people: i32,
    pub special_request: Option<String>,
    pub status: Option<String>,
}

/// Text stored with, and pushed for, every new reservation.
pub fn created_message(user_id: Id) -> String {
    format!("New reservation created for user {user_id}")
}

/// Stores a reservation and its companion notification, then announces it.
pub async fn create(
    db: &DatabaseConnection,
    event_publisher: &EventPublisher,
    new_reservation: NewReservation,
) -> Result<Model, Error> {
    if new_reservation.num_people <= 0 {
        return Err(Error::validation("num_people must be greater than zero"));
    }
    let reservation_date = naive_date_time_parse_str(&new_reservation.reservation_date)
        .map_err(|_| Error::validation("reservation_date must be formatted as YYYY-MM-DD HH:MM:SS"))?;

    let user = user::find_by_id(db, new_reservation.user_id).await?;

    let status = new_reservation
        .status
        .map(|status| status.trim().to_owned())
        .filter(|status| !status.is_empty())
        .unwrap_or_else(|| DEFAULT_STATUS.to_owned());

    let now = chrono::Utc::now();
    let reservation = reservation::create(
        db,
        Model {
            id: Id::nil(),
            user_id: user.id,
            reservation_date,
            num_people: new_reservation.num_people,
            special_request: new_reservation.special_request,
            status,
            created_at: now.into(),
            updated_at: now.into(),
        },
    )
    .await?;
    info!("Created reservation {} for user {}", reservation.id, user.id);

    let message = created_message(user.id);
    notification::create(
        db,
        notifications::Model {
            id: Id::nil(),
            user_id: user.id,
            reservation_id: reservation.id,
            message: message.clone(),
            created_at: now.into(),
        },
    )
    .await?;

    event_publisher
        .publish(DomainEvent::ReservationCreated {
            user_id: user.id,
            reservation: to_event_value(&reservation),
            message,
        })
        .await;

    Ok(reservation)
}

/// All reservations, newest first.
pub async fn find_all(db: &DatabaseConnection) -> Result<Vec<Model>, Error> {
    Ok(reservation::find_all(db).await?)
}

/// Reservations belonging to `user_id`, newest first.
pub async fn find_by_user_id(db: &DatabaseConnection, user_id: Id) -> Result<Vec<Model>, Error> {
    Ok(reservation::find_by_user_id(db, user_id).await?)
}

#[cfg(test)]
// We need to gate seaORM's mock feature behind conditional compilation because
// the feature removes the Clone trait implementation from seaORM's DatabaseConnection.
// see https://github.com/SeaQL/sea-orm/issues/830
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use crate::error::{DomainErrorKind, EntityErrorKind, InternalErrorKind};
    use crate::users;
    use async_trait::async_trait;
    use events::EventHandler;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingHandler {
        events: Mutex<Vec<DomainEvent>>,
    }

    #[async_trait]
    impl EventHandler for RecordingHandler {
        async fn handle(&self, event: &DomainEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    fn user_model() -> users::Model {
        let now = chrono::Utc::now();
        users::Model {
            id: Id::new_v4(),
            name: "Ada".to_owned(),
            email: "ada@example.com".to_owned(),
            password: "hash".to_owned(),
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    fn reservation_model(user_id: Id, status: &str) -> Model {
        let now = chrono::Utc::now();
        Model {
            id: Id::new_v4(),
            user_id,
            reservation_date: naive_date_time_parse_str("2026-12-24 19:30:00").unwrap(),
            num_people: 4,
            special_request: None,
            status: status.to_owned(),
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    fn new_reservation(user_id: Id) -> NewReservation {
        NewReservation {
            user_id,
            reservation_date: "2026-12-24 19:30:00".to_owned(),
            num_people: 4,
            special_request: None,
            status: None,
        }
    }

    #[tokio::test]
    async fn create_stores_reservation_and_notification_then_publishes() -> Result<(), Error> {
        let user = user_model();
        let stored = reservation_model(user.id, DEFAULT_STATUS);
        let stored_notification = notifications::Model {
            id: Id::new_v4(),
            user_id: user.id,
            reservation_id: stored.id,
            message: created_message(user.id),
            created_at: chrono::Utc::now().into(),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![user.clone()]])
            .append_query_results(vec![vec![stored.clone()]])
            .append_query_results(vec![vec![stored_notification]])
            .into_connection();
        let handler = Arc::new(RecordingHandler::default());
        let publisher = EventPublisher::new().with_handler(handler.clone());

        let reservation = create(&db, &publisher, new_reservation(user.id)).await?;

        assert_eq!(reservation.id, stored.id);
        let events = handler.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        match &events[0] {
            DomainEvent::ReservationCreated {
                user_id,
                reservation,
                message,
            } => {
                assert_eq!(*user_id, user.id);
                assert_eq!(reservation["num_people"], 4);
                assert_eq!(*message, format!("New reservation created for user {}", user.id));
            }
            other => panic!("unexpected event {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn create_rejects_non_positive_party_size_before_touching_the_db() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let publisher = EventPublisher::new();
        let mut params = new_reservation(Id::new_v4());
        params.num_people = 0;

        let err = create(&db, &publisher, params).await.unwrap_err();

        assert!(matches!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Validation(_))
        ));
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn create_rejects_badly_formatted_dates() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let publisher = EventPublisher::new();
        let mut params = new_reservation(Id::new_v4());
        params.reservation_date = "24/12/2026 7pm".to_owned();

        let err = create(&db, &publisher, params).await.unwrap_err();

        assert!(matches!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Validation(_))
        ));
    }

    #[tokio::test]
    async fn create_for_unknown_user_is_not_found_and_publishes_nothing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![Vec::<users::Model>::new()])
            .into_connection();
        let handler = Arc::new(RecordingHandler::default());
        let publisher = EventPublisher::new().with_handler(handler.clone());

        let err = create(&db, &publisher, new_reservation(Id::new_v4()))
            .await
            .unwrap_err();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::NotFound))
        );
        assert!(handler.events.lock().unwrap().is_empty());
    }
}
