use crate::error::Error;
use crate::notifications::Model;
use crate::{to_event_value, Id};
use entity_api::{notification, reservation, user};
use events::{DomainEvent, EventPublisher};
use sea_orm::DatabaseConnection;

use log::*;

/// Input for [`create`].
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Id,
    pub reservation_id: Id,
    pub message: String,
}

/// Stores a notification for an existing reservation, then announces it.
pub async fn create(
    db: &DatabaseConnection,
    event_publisher: &EventPublisher,
    new_notification: NewNotification,
) -> Result<Model, Error> {
    let message = new_notification.message.trim().to_owned();
    if message.is_empty() {
        return Err(Error::validation("message must not be empty"));
    }

    let user = user::find_by_id(db, new_notification.user_id).await?;
    let reservation = reservation::find_by_id(db, new_notification.reservation_id).await?;

    let notification = notification::create(
        db,
        Model {
            id: Id::nil(),
            user_id: user.id,
            reservation_id: reservation.id,
            message,
            created_at: chrono::Utc::now().into(),
        },
    )
    .await?;
    debug!(
        "Created notification {} for reservation {}",
        notification.id, reservation.id
    );

    event_publisher
        .publish(DomainEvent::NotificationCreated {
            user_id: user.id,
            reservation_id: reservation.id,
            notification: to_event_value(&notification),
            message: notification.message.clone(),
        })
        .await;

    Ok(notification)
}

/// All notifications, newest first.
pub async fn find_all(db: &DatabaseConnection) -> Result<Vec<Model>, Error> {
    Ok(notification::find_all(db).await?)
}
