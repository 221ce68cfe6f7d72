use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use super::jwt::TokenKeys;
use super::repo_types::PublicUser;
use crate::{error::ApiError, state::AppState};

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// The authenticated caller, resolved to the credential-free
/// projection. Handlers receive this instead of raw tokens.
pub struct CurrentUser(pub PublicUser);

/// Cookie first, then `Authorization: Bearer`.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE) {
        return Some(cookie.value().to_string());
    }
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let token =
            bearer_token(&parts.headers).ok_or(ApiError::Unauthorized("missing token"))?;

        let keys = TokenKeys::from_ref(state);
        let claims = keys.verify_access(&token).map_err(|_| {
            warn!("invalid or expired access token");
            ApiError::Unauthorized("invalid or expired token")
        })?;

        let user = PublicUser::find_by_id(&state.db, claims.sub)
            .await?
            .ok_or(ApiError::Unauthorized("user no longer exists"))?;

        Ok(CurrentUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("accessToken=tok-from-cookie; theme=dark"),
        );
        assert_eq!(bearer_token(&headers).as_deref(), Some("tok-from-cookie"));
    }

    #[test]
    fn reads_token_from_authorization_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_static("Bearer tok-from-header"),
        );
        assert_eq!(bearer_token(&headers).as_deref(), Some("tok-from-header"));
    }

    #[test]
    fn cookie_wins_over_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("accessToken=cookie-tok"),
        );
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer header-tok"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("cookie-tok"));
    }

    #[test]
    fn missing_or_malformed_is_none() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert_eq!(bearer_token(&headers), None);
    }
}
