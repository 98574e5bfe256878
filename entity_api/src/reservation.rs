use super::error::{EntityApiErrorKind, Error};
use entity::reservations::{ActiveModel, Column, Entity, Model};
use entity::Id;
use sea_orm::{
    entity::prelude::*, ActiveModelTrait, ActiveValue::Set, DatabaseConnection, QueryOrder,
};

use log::*;

pub async fn create(db: &DatabaseConnection, reservation_model: Model) -> Result<Model, Error> {
    debug!("New Reservation Model to be inserted: {reservation_model:?}");

    let now = chrono::Utc::now();

    let reservation_active_model: ActiveModel = ActiveModel {
        user_id: Set(reservation_model.user_id),
        reservation_date: Set(reservation_model.reservation_date),
        num_people: Set(reservation_model.num_people),
        special_request: Set(reservation_model.special_request),
        status: Set(reservation_model.status),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    };

    Ok(reservation_active_model.insert(db).await?)
}

/// All reservations, newest first.
pub async fn find_all(db: &DatabaseConnection) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .order_by_desc(Column::CreatedAt)
        .all(db)
        .await?)
}

pub async fn find_by_id(db: &DatabaseConnection, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id).one(db).await?.ok_or_else(|| {
        debug!("Reservation with id {id} not found");
        Error::new(EntityApiErrorKind::RecordNotFound)
    })
}

/// Reservations belonging to `user_id`, newest first.
pub async fn find_by_user_id(db: &DatabaseConnection, user_id: Id) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::UserId.eq(user_id))
        .order_by_desc(Column::CreatedAt)
        .all(db)
        .await?)
}
