use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(
            "CREATE TABLE IF NOT EXISTS reservation_platform.users (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name VARCHAR(255) NOT NULL,
            email VARCHAR(255) NOT NULL UNIQUE,
            password VARCHAR(255) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )",
        )
        .await?;

        db.execute_unprepared(
            "CREATE TABLE IF NOT EXISTS reservation_platform.reservations (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            user_id UUID NOT NULL,
            reservation_date TIMESTAMP NOT NULL,
            num_people INTEGER NOT NULL CHECK (num_people > 0),
            special_request TEXT,
            status VARCHAR(50) NOT NULL DEFAULT 'pending',
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            CONSTRAINT fk_reservations_user
                FOREIGN KEY (user_id)
                REFERENCES reservation_platform.users(id)
                ON DELETE CASCADE
        )",
        )
        .await?;

        db.execute_unprepared(
            "CREATE TABLE IF NOT EXISTS reservation_platform.notifications (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            user_id UUID NOT NULL,
            reservation_id UUID NOT NULL,
            message TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            CONSTRAINT fk_notifications_user
                FOREIGN KEY (user_id)
                REFERENCES reservation_platform.users(id)
                ON DELETE CASCADE,
            CONSTRAINT fk_notifications_reservation
                FOREIGN KEY (reservation_id)
                REFERENCES reservation_platform.reservations(id)
                ON DELETE CASCADE
        )",
        )
        .await?;

        // Listing endpoints read newest first, per user for reservations
        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS reservations_user_id_created_at_idx
            ON reservation_platform.reservations(user_id, created_at DESC)",
        )
        .await?;

        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS notifications_created_at_idx
            ON reservation_platform.notifications(created_at DESC)",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared("DROP TABLE IF EXISTS reservation_platform.notifications")
            .await?;
        db.execute_unprepared("DROP TABLE IF EXISTS reservation_platform.reservations")
            .await?;
        db.execute_unprepared("DROP TABLE IF EXISTS reservation_platform.users")
            .await?;

        Ok(())
    }
}
