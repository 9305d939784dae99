//! Database test fixtures and utilities
//!
//! Provides utilities for setting up a test database, running
//! migrations, and creating fixture rows. The whole integration suite
//! needs a live PostgreSQL instance; when `DATABASE_URL` is not set,
//! `TestDatabase::connect` returns `None` and each test skips itself
//! with a note instead of failing.

use sqlx::PgPool;
use uuid::Uuid;

/// Test database fixture
pub struct TestDatabase {
    pool: PgPool,
}

impl TestDatabase {
    /// Connect and migrate, or `None` when no database is configured
    pub async fn connect() -> Option<Self> {
        let database_url = match std::env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                eprintln!("DATABASE_URL not set - skipping database test");
                return None;
            }
        };

        let pool = PgPool::connect(&database_url)
            .await
            .expect("Failed to create test database pool");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        Some(Self { pool })
    }

    /// Get the database pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Insert a fresh user row and return its id
    pub async fn create_user(&self) -> Uuid {
        let id = Uuid::new_v4();
        let tag = &id.simple().to_string()[..12];

        sqlx::query(
            "INSERT INTO users (id, username, email) VALUES ($1, $2, $3)",
        )
        .bind(id)
        .bind(format!("user_{}", tag))
        .bind(format!("user_{}@example.com", tag))
        .execute(&self.pool)
        .await
        .expect("Failed to insert test user");

        id
    }

    /// Set the live TTL configuration row
    pub async fn set_ttl_hours(&self, hours: i32) {
        sqlx::query(
            r#"
            INSERT INTO billing_config (id, draft_ttl_hours)
            VALUES (1, $1)
            ON CONFLICT (id) DO UPDATE SET draft_ttl_hours = EXCLUDED.draft_ttl_hours
            "#,
        )
        .bind(hours)
        .execute(&self.pool)
        .await
        .expect("Failed to update billing config");
    }

    /// Force a draft's expiry into the past
    pub async fn expire_draft(&self, user_id: Uuid) {
        sqlx::query(
            "UPDATE drafts SET expires_at = NOW() - INTERVAL '1 hour' WHERE user_id = $1",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .expect("Failed to expire draft");
    }

    /// Count stored events for one client session
    pub async fn event_count(&self, user_id: Uuid, client_id: &str) -> i64 {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM draft_events WHERE user_id = $1 AND client_id = $2",
        )
        .bind(user_id)
        .bind(client_id)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to count events");
        count
    }
}
