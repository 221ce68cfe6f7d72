use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{
            AuthResponse, ChangePasswordRequest, LoginRequest, RefreshRequest, RegisterRequest,
            UpdateAccountRequest, UpdateAvatarRequest, UpdateCoverImageRequest,
        },
        extractors::{CurrentUser, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE},
        jwt::TokenKeys,
        password::{hash_password, verify_password},
        repo,
        repo_types::{PublicUser, User},
        session::{self, TokenPair},
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/refresh-token", post(refresh))
}

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/change-password", post(change_password))
        .route("/current-user", get(current_user))
        .route("/update-account", patch(update_account))
        .route("/avatar", patch(update_avatar))
        .route("/cover-image", patch(update_cover_image))
        .route("/history", get(watch_history))
}

fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);
    cookie.set_http_only(true);
    cookie.set_secure(true);
    cookie.set_same_site(SameSite::Strict);
    cookie.set_path("/");
    cookie
}

fn with_session_cookies(jar: CookieJar, pair: &TokenPair) -> CookieJar {
    jar.add(session_cookie(
        ACCESS_TOKEN_COOKIE,
        pair.access_token.clone(),
    ))
    .add(session_cookie(
        REFRESH_TOKEN_COOKIE,
        pair.refresh_token.clone(),
    ))
}

fn without_session_cookies(jar: CookieJar) -> CookieJar {
    // Removal cookies must carry the same path they were set with.
    jar.remove(session_cookie(ACCESS_TOKEN_COOKIE, String::new()))
        .remove(session_cookie(REFRESH_TOKEN_COOKIE, String::new()))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    let payload = payload.normalize()?;
    let password_hash = hash_password(&payload.password)?;

    let user = User::create(
        &state.db,
        &payload.username,
        &payload.email,
        &payload.full_name,
        &password_hash,
        &payload.avatar,
        payload.cover_image.as_deref().unwrap_or(""),
    )
    .await?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok((StatusCode::CREATED, Json(PublicUser::from(user))))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    let payload = payload.normalize()?;

    let user = User::find_by_identifier(&state.db, &payload.identifier)
        .await?
        .ok_or(ApiError::Unauthorized("invalid credentials"))?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login with wrong password");
        return Err(ApiError::Unauthorized("invalid credentials"));
    }

    let keys = TokenKeys::from_ref(&state);
    let pair = session::issue_pair(&state.db, &keys, &user).await?;
    let jar = with_session_cookies(jar, &pair);

    info!(user_id = %user.id, "user logged in");
    Ok((
        jar,
        Json(AuthResponse {
            tokens: pair,
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, jar))]
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode), ApiError> {
    session::revoke(&state.db, user.id).await?;
    info!(user_id = %user.id, "user logged out");
    Ok((without_session_cookies(jar), StatusCode::NO_CONTENT))
}

#[instrument(skip(state, jar, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Option<Json<RefreshRequest>>,
) -> Result<(CookieJar, Json<TokenPair>), ApiError> {
    let presented = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| payload.and_then(|Json(p)| p.refresh_token))
        .ok_or(ApiError::Unauthorized("missing token"))?;

    let keys = TokenKeys::from_ref(&state);
    let pair = session::rotate(&state.db, &keys, &presented).await?;
    let jar = with_session_cookies(jar, &pair);
    Ok((jar, Json(pair)))
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    let payload = payload.normalize()?;

    let user = User::find_by_id(&state.db, current.id)
        .await?
        .ok_or(ApiError::Unauthorized("user no longer exists"))?;

    if !verify_password(&payload.old_password, &user.password_hash)? {
        warn!(user_id = %user.id, "password change with wrong old password");
        return Err(ApiError::Unauthorized("wrong password"));
    }

    let hash = hash_password(&payload.new_password)?;
    User::set_password_hash(&state.db, user.id, &hash).await?;

    if state.config.revoke_session_on_password_change {
        session::revoke(&state.db, user.id).await?;
    }

    info!(user_id = %user.id, "password changed");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip_all)]
pub async fn current_user(CurrentUser(user): CurrentUser) -> Json<PublicUser> {
    Json(user)
}

#[instrument(skip(state, payload))]
pub async fn update_account(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Json(payload): Json<UpdateAccountRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    let payload = payload.normalize()?;
    let user = PublicUser::update_account(
        &state.db,
        current.id,
        payload.email.as_deref(),
        payload.full_name.as_deref(),
    )
    .await?;
    info!(user_id = %user.id, "account updated");
    Ok(Json(user))
}

#[instrument(skip(state, payload))]
pub async fn update_avatar(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Json(payload): Json<UpdateAvatarRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    let avatar = payload.avatar.trim().to_string();
    if avatar.is_empty() {
        return Err(ApiError::validation("avatar is required"));
    }

    let (user, previous) = PublicUser::set_avatar(&state.db, current.id, &avatar).await?;
    if !previous.is_empty() && previous != avatar {
        state.storage.delete_object(&previous).await?;
    }

    info!(user_id = %user.id, "avatar updated");
    Ok(Json(user))
}

#[instrument(skip(state, payload))]
pub async fn update_cover_image(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Json(payload): Json<UpdateCoverImageRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    let cover = payload.cover_image.trim().to_string();
    if cover.is_empty() {
        return Err(ApiError::validation("cover image is required"));
    }

    let (user, previous) = PublicUser::set_cover_image(&state.db, current.id, &cover).await?;
    if !previous.is_empty() && previous != cover {
        state.storage.delete_object(&previous).await?;
    }

    info!(user_id = %user.id, "cover image updated");
    Ok(Json(user))
}

#[instrument(skip(state))]
pub async fn watch_history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Uuid>>, ApiError> {
    let ids = repo::watch_history(&state.db, user.id).await?;
    Ok(Json(ids))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    #[test]
    fn session_cookies_are_locked_down() {
        let cookie = session_cookie(ACCESS_TOKEN_COOKIE, "tok".into());
        assert_eq!(cookie.name(), "accessToken");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn login_response_carries_pair_and_projection() {
        let response = AuthResponse {
            tokens: TokenPair {
                access_token: "acc".into(),
                refresh_token: "ref".into(),
            },
            user: PublicUser {
                id: Uuid::new_v4(),
                username: "creator".into(),
                email: "creator@example.com".into(),
                full_name: "Channel Creator".into(),
                avatar_url: "avatars/creator.jpg".into(),
                cover_image_url: String::new(),
                created_at: OffsetDateTime::now_utc(),
            },
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"access_token\":\"acc\""));
        assert!(json.contains("\"refresh_token\":\"ref\""));
        assert!(json.contains("\"username\":\"creator\""));
        assert!(!json.contains("password"));
    }

    #[test]
    fn both_session_cookies_are_set() {
        let pair = TokenPair {
            access_token: "acc".into(),
            refresh_token: "ref".into(),
        };
        let jar = with_session_cookies(CookieJar::new(), &pair);
        assert_eq!(jar.get(ACCESS_TOKEN_COOKIE).map(|c| c.value()), Some("acc"));
        assert_eq!(
            jar.get(REFRESH_TOKEN_COOKIE).map(|c| c.value()),
            Some("ref")
        );
    }
}
