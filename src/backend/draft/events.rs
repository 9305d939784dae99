/**
 * Draft Event Log
 *
 * Best-effort append-only record of raw edit operations per
 * (user, client id). It is purely a recovery and audit trail: never
 * authoritative, cleared in bulk when that client's commit succeeds,
 * and the rest of the system behaves identically whether events are
 * stored or not.
 *
 * The log is pluggable: `Disabled` stores nothing, `Database` appends
 * to the `draft_events` table. Failures are logged and swallowed -
 * an unavailable event log must never fail a patch or commit.
 */

use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

/// Stored operation kinds are truncated to this length
pub const MAX_KIND_LEN: usize = 64;

/// Pluggable event log collaborator
#[derive(Clone)]
pub enum DraftEventLog {
    /// Store-nothing implementation
    Disabled,
    /// Append-only log in the `draft_events` table
    Database(PgPool),
}

impl DraftEventLog {
    /// Append one batch of raw operations for a client session
    ///
    /// # Returns
    /// The number of events stored (0 when disabled or on failure)
    pub async fn append(&self, user_id: Uuid, client_id: &str, ops: &[Value]) -> u64 {
        let pool = match self {
            Self::Disabled => return 0,
            Self::Database(pool) => pool,
        };

        match store_events(pool, user_id, client_id, ops).await {
            Ok(saved) => saved,
            Err(err) => {
                tracing::warn!(user_id = %user_id, client_id, "event log append failed: {}", err);
                0
            }
        }
    }

    /// Drop all stored events for a client session
    ///
    /// Called after that client's commit succeeded; the snapshot now
    /// supersedes the trail.
    pub async fn clear_for_client(&self, user_id: Uuid, client_id: &str) {
        let pool = match self {
            Self::Disabled => return,
            Self::Database(pool) => pool,
        };

        let result = sqlx::query("DELETE FROM draft_events WHERE user_id = $1 AND client_id = $2")
            .bind(user_id)
            .bind(client_id)
            .execute(pool)
            .await;

        if let Err(err) = result {
            tracing::warn!(user_id = %user_id, client_id, "event log cleanup failed: {}", err);
        }
    }
}

/// Insert a batch of events inside one transaction
async fn store_events(
    pool: &PgPool,
    user_id: Uuid,
    client_id: &str,
    ops: &[Value],
) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut saved = 0u64;

    for op in ops {
        let kind = event_kind(op);
        sqlx::query(
            "INSERT INTO draft_events (user_id, client_id, kind, payload) VALUES ($1, $2, $3, $4)",
        )
        .bind(user_id)
        .bind(client_id)
        .bind(kind)
        .bind(op.clone())
        .execute(&mut *tx)
        .await?;
        saved += 1;
    }

    tx.commit().await?;
    Ok(saved)
}

/// Normalize an operation's kind for storage (`unknown` when absent,
/// truncated to `MAX_KIND_LEN`)
fn event_kind(op: &Value) -> String {
    let kind = op.get("op").and_then(Value::as_str).unwrap_or("unknown");
    kind.chars().take(MAX_KIND_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_kind_defaults_to_unknown() {
        assert_eq!(event_kind(&json!({"payload": 1})), "unknown");
        assert_eq!(event_kind(&json!("string")), "unknown");
        assert_eq!(event_kind(&json!({"op": "set_name"})), "set_name");
    }

    #[test]
    fn test_event_kind_is_truncated() {
        let long = "x".repeat(200);
        let kind = event_kind(&json!({ "op": long }));
        assert_eq!(kind.len(), MAX_KIND_LEN);
    }

    #[tokio::test]
    async fn test_disabled_log_is_inert() {
        let log = DraftEventLog::Disabled;
        let saved = log
            .append(Uuid::new_v4(), "tab-1", &[json!({"op": "ping"})])
            .await;
        assert_eq!(saved, 0);
        log.clear_for_client(Uuid::new_v4(), "tab-1").await;
    }
}
