use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claim set carried by an access token: enough identity to serve a
/// request without touching the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: Uuid,       // user ID
    pub email: String,
    pub username: String,
    pub full_name: String,
    pub iat: usize,      // issued at (unix timestamp)
    pub exp: usize,      // expires at (unix timestamp)
    pub iss: String,     // issuer
    pub aud: String,     // audience
}

/// Claim set carried by a refresh token. Identity only; everything else
/// lives server-side as the stored session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: Uuid,
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
}
