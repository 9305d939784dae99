/**
 * Draft Store
 *
 * Durable persistence of the per-user document draft. One row per user
 * (`user_id` is the primary key), holding the JSON snapshot plus
 * `updated_at` / `expires_at` timestamps.
 *
 * # Lifecycle
 *
 * A draft is created on the first successful commit for a user, updated
 * by every subsequent patch or commit (each write refreshes
 * `expires_at = now + TTL`), and deleted explicitly via `clear`,
 * implicitly on read-after-expiry, or replaced outright by a commit.
 *
 * # Concurrency
 *
 * Sessions for the same user may run in parallel, possibly in different
 * processes, so the store is the sole serialization point:
 *
 * - `apply_patch` runs its read-modify-write inside a transaction with
 *   `SELECT ... FOR UPDATE`, so no concurrent reader ever observes a
 *   partially-applied batch and two patches for one user serialize at
 *   the row.
 * - `commit` is a single atomic upsert; last write wins across
 *   connections.
 */

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::backend::billing::DraftTtl;
use crate::backend::draft::patch::{self, PatchOutcome};
use crate::backend::draft::snapshot::{ensure_overlay_ids, Snapshot};
use crate::backend::error::StoreError;

/// A loaded draft with its persistence metadata
#[derive(Debug, Clone)]
pub struct Draft {
    /// Document snapshot
    pub data: Snapshot,
    /// Last write time
    pub updated_at: DateTime<Utc>,
    /// Absolute expiry; the row is purged when this has passed
    pub expires_at: DateTime<Utc>,
}

/// Row shape shared by `load` and `apply_patch`
#[derive(sqlx::FromRow)]
struct DraftRow {
    data: serde_json::Value,
    updated_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

/// The durable draft store, single source of truth for drafts
#[derive(Clone)]
pub struct DraftStore {
    pool: PgPool,
    ttl: DraftTtl,
}

impl DraftStore {
    pub fn new(pool: PgPool, ttl: DraftTtl) -> Self {
        Self { pool, ttl }
    }

    /// Load the current draft for a user
    ///
    /// Returns `None` when no draft exists or when the stored draft has
    /// expired; an expired row is deleted as a side effect of the read.
    /// Overlay ids are backfilled on the way out, so callers always see
    /// a snapshot the patch engine can work on.
    pub async fn load(&self, user_id: Uuid) -> Result<Option<Draft>, StoreError> {
        let row = sqlx::query_as::<_, DraftRow>(
            "SELECT data, updated_at, expires_at FROM drafts WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        if row.expires_at <= Utc::now() {
            tracing::debug!(user_id = %user_id, "purging expired draft on read");
            self.purge_expired(user_id).await?;
            return Ok(None);
        }

        let mut data: Snapshot = serde_json::from_value(row.data)?;
        ensure_overlay_ids(&mut data);

        Ok(Some(Draft {
            data,
            updated_at: row.updated_at,
            expires_at: row.expires_at,
        }))
    }

    /// Apply a patch batch to the user's existing draft
    ///
    /// Fails with `StoreError::NotFound` when no live draft exists -
    /// patches never create a draft. The read-modify-write runs under a
    /// row lock and the write refreshes `expires_at`, even when every
    /// operation in the batch was skipped.
    pub async fn apply_patch(
        &self,
        user_id: Uuid,
        ops: &[serde_json::Value],
    ) -> Result<PatchOutcome, StoreError> {
        // TTL read happens before the row lock is taken
        let ttl_hours = self.ttl.hours().await?;

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, DraftRow>(
            "SELECT data, updated_at, expires_at FROM drafts WHERE user_id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Err(StoreError::NotFound);
        };

        if row.expires_at <= Utc::now() {
            sqlx::query("DELETE FROM drafts WHERE user_id = $1 AND expires_at <= NOW()")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            return Err(StoreError::NotFound);
        }

        let mut snapshot: Snapshot = serde_json::from_value(row.data)?;
        ensure_overlay_ids(&mut snapshot);

        let outcome = patch::apply(snapshot, ops);

        let now = Utc::now();
        sqlx::query("UPDATE drafts SET data = $2, updated_at = $3, expires_at = $4 WHERE user_id = $1")
            .bind(user_id)
            .bind(serde_json::to_value(&outcome.snapshot)?)
            .bind(now)
            .bind(now + Duration::hours(ttl_hours))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(
            user_id = %user_id,
            applied = outcome.applied,
            skipped = outcome.skipped,
            "patch batch applied"
        );

        Ok(outcome)
    }

    /// Replace (or create) the user's draft with a full snapshot
    ///
    /// The authoritative "save everything" path: runs the overlay-id
    /// backfill, then upserts unconditionally with a fresh expiry.
    pub async fn commit(&self, user_id: Uuid, mut snapshot: Snapshot) -> Result<(), StoreError> {
        ensure_overlay_ids(&mut snapshot);

        let ttl_hours = self.ttl.hours().await?;
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO drafts (user_id, data, updated_at, expires_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE SET
                data = EXCLUDED.data,
                updated_at = EXCLUDED.updated_at,
                expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(user_id)
        .bind(serde_json::to_value(&snapshot)?)
        .bind(now)
        .bind(now + Duration::hours(ttl_hours))
        .execute(&self.pool)
        .await?;

        tracing::debug!(user_id = %user_id, pages = snapshot.pages.len(), "draft committed");
        Ok(())
    }

    /// Delete the user's draft only when it has expired
    ///
    /// The expiry predicate is re-evaluated by the database at delete
    /// time, so a draft refreshed by a concurrent commit between the
    /// caller's read and this delete survives.
    ///
    /// # Returns
    /// `true` if an expired row was deleted
    pub async fn purge_expired(&self, user_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM drafts WHERE user_id = $1 AND expires_at <= NOW()")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete the user's draft; no-op when absent
    pub async fn clear(&self, user_id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM drafts WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
