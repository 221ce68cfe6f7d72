use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::extractors::CurrentUser, channels::repo_types::ChannelProfile, error::ApiError,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/c/:username", get(channel_profile))
}

#[instrument(skip(state))]
pub async fn channel_profile(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    Path(username): Path<String>,
) -> Result<Json<ChannelProfile>, ApiError> {
    let username = username.trim().to_lowercase();
    if username.is_empty() {
        return Err(ApiError::validation("username is required"));
    }

    let profile = ChannelProfile::load(&state.db, &username, Some(viewer.id))
        .await?
        .ok_or_else(|| ApiError::not_found(format!("channel {username} does not exist")))?;

    Ok(Json(profile))
}
