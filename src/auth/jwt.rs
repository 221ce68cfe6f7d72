use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::{AccessClaims, RefreshClaims};
use super::repo_types::User;
use crate::{config::JwtConfig, state::AppState};

/// Signing and verification material for both token types. Access and
/// refresh tokens use independent secrets, so one can never pass for
/// the other.
#[derive(Clone)]
pub struct TokenKeys {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl FromRef<AppState> for TokenKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::from_config(&state.config.jwt)
    }
}

impl TokenKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(cfg.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(cfg.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(cfg.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(cfg.refresh_secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            access_ttl: Duration::from_secs((cfg.access_ttl_minutes as u64) * 60),
            refresh_ttl: Duration::from_secs((cfg.refresh_ttl_days as u64) * 24 * 60 * 60),
        }
    }

    fn stamp(&self, ttl: Duration) -> (usize, usize) {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        (
            now.unix_timestamp() as usize,
            exp.unix_timestamp() as usize,
        )
    }

    pub fn sign_access(&self, user: &User) -> anyhow::Result<String> {
        let (iat, exp) = self.stamp(self.access_ttl);
        let claims = AccessClaims {
            sub: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            iat,
            exp,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.access_encoding)?;
        debug!(user_id = %user.id, "access token signed");
        Ok(token)
    }

    pub fn sign_refresh(&self, user_id: Uuid) -> anyhow::Result<String> {
        let (iat, exp) = self.stamp(self.refresh_ttl);
        let claims = RefreshClaims {
            sub: user_id,
            iat,
            exp,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.refresh_encoding)?;
        debug!(user_id = %user_id, "refresh token signed");
        Ok(token)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation
    }

    /// Pure check: signature, expiry, issuer, audience. No I/O.
    pub fn verify_access(&self, token: &str) -> anyhow::Result<AccessClaims> {
        let data = decode::<AccessClaims>(token, &self.access_decoding, &self.validation())?;
        debug!(user_id = %data.claims.sub, "access token verified");
        Ok(data.claims)
    }

    /// Signature/expiry half of refresh validation; equality with the
    /// stored session token is checked by the caller.
    pub fn verify_refresh(&self, token: &str) -> anyhow::Result<RefreshClaims> {
        let data = decode::<RefreshClaims>(token, &self.refresh_decoding, &self.validation())?;
        debug!(user_id = %data.claims.sub, "refresh token verified");
        Ok(data.claims)
    }
}
