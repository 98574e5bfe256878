use super::error::Error;
use entity::notifications::{ActiveModel, Column, Entity, Model};
use sea_orm::{
    entity::prelude::*, ActiveModelTrait, ActiveValue::Set, DatabaseConnection, QueryOrder,
};

use log::*;

pub async fn create(db: &DatabaseConnection, notification_model: Model) -> Result<Model, Error> {
    debug!("New Notification Model to be inserted: {notification_model:?}");

    let notification_active_model: ActiveModel = ActiveModel {
        user_id: Set(notification_model.user_id),
        reservation_id: Set(notification_model.reservation_id),
        message: Set(notification_model.message),
        created_at: Set(chrono::Utc::now().into()),
        ..Default::default()
    };

    Ok(notification_active_model.insert(db).await?)
}

/// All notifications, newest first.
pub async fn find_all(db: &DatabaseConnection) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .order_by_desc(Column::CreatedAt)
        .all(db)
        .await?)
}
