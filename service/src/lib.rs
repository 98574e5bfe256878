use config::Config;
use log::info;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use std::sync::Arc;
use tokio::time::Duration;

pub mod config;
pub mod logging;

/// Postgres schema holding the users, reservations and notifications tables.
pub const DATABASE_SCHEMA: &str = "reservation_platform";

/// Pool settings derived from `config`, with the search path pinned to
/// [`DATABASE_SCHEMA`].
pub fn connect_options(config: &Config) -> ConnectOptions {
    let mut opt = ConnectOptions::new(config.database_url());
    opt.max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .connect_timeout(Duration::from_secs(config.db_connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime_secs))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug)
        .set_schema_search_path(DATABASE_SCHEMA);
    opt
}

/// Opens the pool and checks that the server answers before returning it.
pub async fn init_database(config: &Config) -> Result<DatabaseConnection, DbErr> {
    info!(
        "Database pool config: max_connections={}, min_connections={}, \
         connect_timeout={}s, acquire_timeout={}s, idle_timeout={}s, max_lifetime={}s",
        config.db_max_connections,
        config.db_min_connections,
        config.db_connect_timeout_secs,
        config.db_acquire_timeout_secs,
        config.db_idle_timeout_secs,
        config.db_max_lifetime_secs,
    );

    let db = Database::connect(connect_options(config)).await?;
    db.ping().await?;
    info!(
        "Connected to {:?} database, schema {DATABASE_SCHEMA}",
        db.get_database_backend()
    );

    Ok(db)
}

/// Infrastructure shared by every request: the database pool and the
/// startup configuration. Realtime collaborators live in `web::AppState`.
#[derive(Clone)]
pub struct AppState {
    pub database_connection: Arc<DatabaseConnection>,
    pub config: Config,
}

impl AppState {
    pub fn new(app_config: Config, db: &Arc<DatabaseConnection>) -> Self {
        Self {
            database_connection: Arc::clone(db),
            config: app_config,
        }
    }

    pub fn db_conn_ref(&self) -> &DatabaseConnection {
        self.database_connection.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn connect_options_follow_the_config() {
        let config = Config::parse_from([
            "reservation_platform_rs",
            "--database-url",
            "postgres://diner:secret@db:5432/reservations",
            "--db-max-connections",
            "12",
            "--db-min-connections",
            "2",
        ]);

        let opt = connect_options(&config);

        assert_eq!(opt.get_url(), "postgres://diner:secret@db:5432/reservations");
        assert_eq!(opt.get_max_connections(), Some(12));
        assert_eq!(opt.get_min_connections(), Some(2));
        assert_eq!(
            opt.get_connect_timeout(),
            Some(Duration::from_secs(config.db_connect_timeout_secs))
        );
    }
}
