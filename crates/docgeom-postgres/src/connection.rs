//! PostgreSQL connection pool
//!
//! The migration is sequential, so the pool stays small; it exists for
//! acquire timeouts and reconnects rather than parallelism.

use crate::error::{PostgresError, PostgresResult};
use docgeom_config::RelationalConfig;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};
use std::time::Duration;
use tracing::info;

const MAX_CONNECTIONS: u32 = 2;

/// Connection options equivalent to `config.connection_string()`
pub fn connect_options(config: &RelationalConfig) -> PgConnectOptions {
    let ssl_mode = if config.ssl {
        PgSslMode::Require
    } else {
        PgSslMode::Disable
    };
    let mut options = PgConnectOptions::new()
        .host(&config.host)
        .username(&config.user)
        .password(&config.password)
        .database(&config.database)
        .ssl_mode(ssl_mode)
        .application_name("docgeom");
    if config.port != 0 {
        options = options.port(config.port);
    }
    options
}

/// Open a pool and check it with a trivial query
pub async fn connect(config: &RelationalConfig) -> PostgresResult<PgPool> {
    // Display redacts the password
    let target = config.to_string();
    info!(%target, "Connecting to PostgreSQL");

    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .connect_with(connect_options(config))
        .await
        .map_err(|source| PostgresError::Connection {
            target: target.clone(),
            source,
        })?;

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .map_err(|source| PostgresError::Connection { target, source })?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docgeom_config::RelationalDriver;

    fn config(port: u16, ssl: bool) -> RelationalConfig {
        RelationalConfig {
            driver: RelationalDriver::Postgres,
            host: "db.local".to_string(),
            port,
            database: "geo".to_string(),
            user: "imqs".to_string(),
            password: "secret".to_string(),
            ssl,
            output_table: "DocumentGeometry".to_string(),
            geometry_column: "Geometry".to_string(),
            connect_timeout_seconds: 1,
        }
    }

    #[test]
    fn test_options_follow_config() {
        let options = connect_options(&config(6543, true));
        assert_eq!(options.get_host(), "db.local");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_username(), "imqs");
        assert_eq!(options.get_database(), Some("geo"));
        assert!(matches!(options.get_ssl_mode(), PgSslMode::Require));
    }

    #[test]
    fn test_zero_port_keeps_default() {
        let options = connect_options(&config(0, false));
        assert_eq!(options.get_port(), PgConnectOptions::new().get_port());
        assert!(matches!(options.get_ssl_mode(), PgSslMode::Disable));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_a_connection_error() {
        let mut config = config(1, false);
        config.host = "127.0.0.1".to_string();
        let err = connect(&config).await.unwrap_err();
        assert!(matches!(err, PostgresError::Connection { .. }));
        assert!(!err.to_string().contains("secret"));
    }
}
