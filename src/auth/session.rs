use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use super::jwt::TokenKeys;
use super::repo_types::User;
use crate::error::ApiError;

/// A freshly issued access/refresh pair. Only the refresh half is ever
/// persisted, as the user's single active session.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issue a pair for a verified login, replacing whatever session the
/// account had before.
pub async fn issue_pair(db: &PgPool, keys: &TokenKeys, user: &User) -> Result<TokenPair, ApiError> {
    let access_token = keys.sign_access(user)?;
    let refresh_token = keys.sign_refresh(user.id)?;
    User::set_refresh_token(db, user.id, Some(&refresh_token)).await?;
    info!(user_id = %user.id, "session issued");
    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

/// One step of the session state machine. A refresh token is valid for
/// exactly one rotation; presenting a token that no longer matches the
/// stored session is treated as replay and revokes the session outright.
pub async fn rotate(db: &PgPool, keys: &TokenKeys, presented: &str) -> Result<TokenPair, ApiError> {
    let claims = keys
        .verify_refresh(presented)
        .map_err(|_| ApiError::Unauthorized("invalid or expired refresh token"))?;

    let user = User::find_by_id(db, claims.sub)
        .await?
        .ok_or(ApiError::Unauthorized("user no longer exists"))?;

    if user.refresh_token.as_deref() != Some(presented) {
        // The token was rotated away already, or the session is gone.
        // Either the client replayed itself or someone stole the token;
        // both end the session.
        warn!(user_id = %user.id, "refresh token reuse detected, revoking session");
        User::set_refresh_token(db, user.id, None).await?;
        return Err(ApiError::Unauthorized("refresh token expired or reused"));
    }

    let access_token = keys.sign_access(&user)?;
    let refresh_token = keys.sign_refresh(user.id)?;

    // Compare-and-swap against the presented token: of two concurrent
    // rotations only one may win. The loser is a stale attempt and
    // fails closed, never retries.
    let swapped = User::swap_refresh_token(db, user.id, presented, &refresh_token).await?;
    if !swapped {
        warn!(user_id = %user.id, "refresh token rotated concurrently");
        return Err(ApiError::Unauthorized("refresh token expired or reused"));
    }

    info!(user_id = %user.id, "session rotated");
    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

/// End the active session (logout, or password-change policy).
pub async fn revoke(db: &PgPool, user_id: Uuid) -> Result<(), ApiError> {
    User::set_refresh_token(db, user_id, None).await?;
    info!(user_id = %user_id, "session revoked");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_pair_serializes_both_halves() {
        let pair = TokenPair {
            access_token: "aaa.bbb.ccc".into(),
            refresh_token: "ddd.eee.fff".into(),
        };
        let json = serde_json::to_string(&pair).unwrap();
        assert!(json.contains("\"access_token\":\"aaa.bbb.ccc\""));
        assert!(json.contains("\"refresh_token\":\"ddd.eee.fff\""));
    }
}
