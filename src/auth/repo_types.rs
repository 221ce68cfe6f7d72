use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Full user row. Credential fields are never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub avatar_url: String,
    pub cover_image_url: String,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Projection safe to return to clients: selected without
/// `password_hash` and `refresh_token` at the SQL level.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: String,
    pub cover_image_url: String,
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            full_name: u.full_name,
            avatar_url: u.avatar_url,
            cover_image_url: u.cover_image_url,
            created_at: u.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "creator".into(),
            email: "creator@example.com".into(),
            full_name: "Channel Creator".into(),
            password_hash: "$argon2id$fake".into(),
            avatar_url: "avatars/creator.jpg".into(),
            cover_image_url: String::new(),
            refresh_token: Some("opaque-refresh".into()),
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn user_row_never_serializes_credentials() {
        let json = serde_json::to_string(&sample_user()).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("refresh_token"));
        assert!(!json.contains("opaque-refresh"));
        assert!(json.contains("creator@example.com"));
    }

    #[test]
    fn public_projection_keeps_profile_fields() {
        let public = PublicUser::from(sample_user());
        let json = serde_json::to_string(&public).unwrap();
        assert!(json.contains("\"username\":\"creator\""));
        assert!(json.contains("\"avatar_url\":\"avatars/creator.jpg\""));
        assert!(!json.contains("password"));
        assert!(!json.contains("refresh"));
    }
}
