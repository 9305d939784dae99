/**
 * Billing Collaborator
 *
 * The billing/quota engine is an external collaborator to the draft
 * subsystem; the only value consumed here is the draft time-to-live.
 *
 * The TTL is read through to the `billing_config` table on every call
 * and never cached, so operators can change retention live and the next
 * write picks it up.
 */

use sqlx::PgPool;

/// TTL used when no billing configuration row exists
pub const DEFAULT_TTL_HOURS: i64 = 24;

/// Read-through source for the draft TTL
///
/// Injected into the draft store; queried at the moment of every write.
#[derive(Clone)]
pub struct DraftTtl {
    pool: PgPool,
}

impl DraftTtl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Current draft TTL in hours, clamped at >= 0
    ///
    /// A missing configuration row falls back to `DEFAULT_TTL_HOURS`;
    /// a database failure propagates so the caller reports the write
    /// as failed instead of silently applying a guessed retention.
    pub async fn hours(&self) -> Result<i64, sqlx::Error> {
        let row: Option<(i32,)> =
            sqlx::query_as("SELECT draft_ttl_hours FROM billing_config WHERE id = 1")
                .fetch_optional(&self.pool)
                .await?;

        Ok(match row {
            Some((hours,)) => i64::from(hours).max(0),
            None => DEFAULT_TTL_HOURS,
        })
    }
}
