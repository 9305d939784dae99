/**
 * Auth Module
 *
 * Resolution of bearer access tokens to user identities. Token
 * issuance (signup/login endpoints) lives outside this subsystem; the
 * draft channel only ever *consumes* a verified identity.
 */

pub mod sessions;
pub mod users;

use sqlx::PgPool;
use uuid::Uuid;

use crate::backend::auth::users::{get_user_by_id, User};

/// Resolve a bearer token to a user, or `None` for anonymous
///
/// A malformed token, an expired token, and a token naming a user that
/// does not exist all collapse to the same `None` - callers must not be
/// able to distinguish the three cases from the outcome. The specific
/// cause is only visible in server-side logs.
pub async fn resolve_user(pool: &PgPool, token: &str) -> Option<User> {
    let claims = match sessions::verify_token(token) {
        Ok(claims) => claims,
        Err(err) => {
            tracing::debug!("token verification failed: {}", err);
            return None;
        }
    };

    let user_id = match Uuid::parse_str(&claims.sub) {
        Ok(id) => id,
        Err(err) => {
            tracing::debug!("token subject is not a user id: {}", err);
            return None;
        }
    };

    match get_user_by_id(pool, user_id).await {
        Ok(user) => user,
        Err(err) => {
            tracing::warn!(user_id = %user_id, "user lookup failed: {}", err);
            None
        }
    }
}
