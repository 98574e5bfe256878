use super::error::{EntityApiErrorKind, Error};
use entity::users::{ActiveModel, Column, Entity, Model};
use entity::Id;
use sea_orm::{
    entity::prelude::*, ActiveModelTrait, ActiveValue::Set, DatabaseConnection, QueryOrder,
};

use log::*;

/// Inserts a user. `user_model.password` is the plain text password; only
/// its hash is stored.
pub async fn create(db: &DatabaseConnection, user_model: Model) -> Result<Model, Error> {
    debug!("New User to be inserted: {}", user_model.email);

    let now = chrono::Utc::now();
    let user_active_model: ActiveModel = ActiveModel {
        name: Set(user_model.name),
        email: Set(user_model.email),
        password: Set(generate_hash(user_model.password)),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    };

    Ok(user_active_model.insert(db).await?)
}

/// All users, oldest first.
pub async fn find_all(db: &DatabaseConnection) -> Result<Vec<Model>, Error> {
    Ok(Entity::find().order_by_asc(Column::CreatedAt).all(db).await?)
}

pub async fn find_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::Email.eq(email))
        .one(db)
        .await?)
}

pub async fn find_by_id(db: &DatabaseConnection, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id).one(db).await?.ok_or_else(|| {
        debug!("User with id {id} not found");
        Error::new(EntityApiErrorKind::RecordNotFound)
    })
}

pub fn generate_hash(password: String) -> String {
    password_auth::generate_hash(password)
}
