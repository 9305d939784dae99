/**
 * Server Configuration
 *
 * Loading and validation of server configuration from environment
 * variables.
 *
 * # Configuration Sources
 *
 * - `DATABASE_URL` - PostgreSQL connection string (required; the draft
 *   subsystem cannot run without its store, so startup fails fast)
 * - `SERVER_PORT` - listen port, default 3000
 * - `DRAFT_EVENT_LOG` - `off` disables the recovery event log;
 *   anything else (or unset) enables the database-backed log
 *
 * The draft TTL is deliberately *not* configuration here: it is owned
 * by the billing collaborator and read from the database on every
 * write (see `backend::billing`).
 */

use sqlx::PgPool;
use thiserror::Error;

use crate::backend::draft::events::DraftEventLog;

/// Configuration failures that abort startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("DATABASE_URL is not set")]
    MissingDatabaseUrl,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Load the database connection pool and run migrations
///
/// # Errors
///
/// Fails when `DATABASE_URL` is missing or the pool cannot connect.
/// Migration failures are logged but tolerated - they have usually
/// already been applied by an earlier deployment.
pub async fn load_database() -> Result<PgPool, ConfigError> {
    let database_url =
        std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(&database_url).await?;
    tracing::info!("Database connection pool created");

    tracing::info!("Running database migrations...");
    match sqlx::migrate!("./migrations").run(&pool).await {
        Ok(_) => tracing::info!("Database migrations completed"),
        Err(e) => {
            tracing::warn!("Failed to run database migrations: {}", e);
            tracing::warn!("Continuing - database might already be up to date");
        }
    }

    Ok(pool)
}

/// Event log selection from `DRAFT_EVENT_LOG`
pub fn load_event_log(pool: &PgPool) -> DraftEventLog {
    match std::env::var("DRAFT_EVENT_LOG").as_deref() {
        Ok("off") => {
            tracing::info!("Draft event log disabled");
            DraftEventLog::Disabled
        }
        _ => DraftEventLog::Database(pool.clone()),
    }
}

/// Listen port from `SERVER_PORT`, default 3000
pub fn server_port() -> u16 {
    std::env::var("SERVER_PORT")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(3000)
}
