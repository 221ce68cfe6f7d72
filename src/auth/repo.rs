use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::auth::repo_types::{PublicUser, User};
use crate::error::ApiError;

const USER_COLUMNS: &str = "id, username, email, full_name, password_hash, avatar_url, \
                            cover_image_url, refresh_token, created_at, updated_at";
const PUBLIC_COLUMNS: &str =
    "id, username, email, full_name, avatar_url, cover_image_url, created_at";

fn map_unique_violation(e: sqlx::Error) -> ApiError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return match db_err.constraint() {
                Some("users_email_key") => ApiError::DuplicateIdentity("email"),
                _ => ApiError::DuplicateIdentity("username"),
            };
        }
    }
    ApiError::from(e)
}

impl User {
    /// Insert a new account. Uniqueness is the database's constraint,
    /// not a read-then-write check, so concurrent registrations cannot
    /// both succeed.
    pub async fn create(
        db: &PgPool,
        username: &str,
        email: &str,
        full_name: &str,
        password_hash: &str,
        avatar_url: &str,
        cover_image_url: &str,
    ) -> Result<User, ApiError> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, full_name, password_hash, avatar_url, cover_image_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(username)
        .bind(email)
        .bind(full_name)
        .bind(password_hash)
        .bind(avatar_url)
        .bind(cover_image_url)
        .fetch_one(db)
        .await
        .map_err(map_unique_violation)
    }

    /// Look up by lowercased username or email.
    pub async fn find_by_identifier(db: &PgPool, identifier: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE username = $1 OR email = $1
            "#
        ))
        .bind(identifier)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn set_password_hash(db: &PgPool, id: Uuid, hash: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(hash)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Unconditional session replacement: issuance stores the new token,
    /// logout and replay revocation store NULL.
    pub async fn set_refresh_token(
        db: &PgPool,
        id: Uuid,
        token: Option<&str>,
    ) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET refresh_token = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(token)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Conditional rotation. The row only changes while it still holds
    /// `expected`, so of two concurrent rotations exactly one sees
    /// `true`; the loser must fail closed.
    pub async fn swap_refresh_token(
        db: &PgPool,
        id: Uuid,
        expected: &str,
        new: &str,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE users SET refresh_token = $3, updated_at = now() \
             WHERE id = $1 AND refresh_token = $2",
        )
        .bind(id)
        .bind(expected)
        .bind(new)
        .execute(db)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[derive(FromRow)]
struct ImageSwap {
    #[sqlx(flatten)]
    user: PublicUser,
    prev_url: String,
}

impl PublicUser {
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<PublicUser>> {
        let user = sqlx::query_as::<_, PublicUser>(&format!(
            "SELECT {PUBLIC_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn update_account(
        db: &PgPool,
        id: Uuid,
        email: Option<&str>,
        full_name: Option<&str>,
    ) -> Result<PublicUser, ApiError> {
        sqlx::query_as::<_, PublicUser>(&format!(
            r#"
            UPDATE users
            SET email = COALESCE($2, email),
                full_name = COALESCE($3, full_name),
                updated_at = now()
            WHERE id = $1
            RETURNING {PUBLIC_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(email)
        .bind(full_name)
        .fetch_one(db)
        .await
        .map_err(map_unique_violation)
    }

    /// Replace the avatar, returning the updated projection and the
    /// previous object key so the caller can delete it from storage.
    pub async fn set_avatar(
        db: &PgPool,
        id: Uuid,
        avatar_url: &str,
    ) -> anyhow::Result<(PublicUser, String)> {
        let row = sqlx::query_as::<_, ImageSwap>(&format!(
            r#"
            WITH prev AS (SELECT avatar_url FROM users WHERE id = $1)
            UPDATE users
            SET avatar_url = $2, updated_at = now()
            WHERE id = $1
            RETURNING {PUBLIC_COLUMNS}, (SELECT avatar_url FROM prev) AS prev_url
            "#
        ))
        .bind(id)
        .bind(avatar_url)
        .fetch_one(db)
        .await?;
        Ok((row.user, row.prev_url))
    }

    pub async fn set_cover_image(
        db: &PgPool,
        id: Uuid,
        cover_image_url: &str,
    ) -> anyhow::Result<(PublicUser, String)> {
        let row = sqlx::query_as::<_, ImageSwap>(&format!(
            r#"
            WITH prev AS (SELECT cover_image_url FROM users WHERE id = $1)
            UPDATE users
            SET cover_image_url = $2, updated_at = now()
            WHERE id = $1
            RETURNING {PUBLIC_COLUMNS}, (SELECT cover_image_url FROM prev) AS prev_url
            "#
        ))
        .bind(id)
        .bind(cover_image_url)
        .fetch_one(db)
        .await?;
        Ok((row.user, row.prev_url))
    }
}

/// Watched video ids, most recent first.
pub async fn watch_history(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Uuid>> {
    let ids = sqlx::query_scalar::<_, Uuid>(
        "SELECT video_id FROM watch_history WHERE user_id = $1 \
         ORDER BY watched_at DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(ids)
}

/// Append seam for the playback collaborator.
pub async fn push_watch_history(db: &PgPool, user_id: Uuid, video_id: Uuid) -> anyhow::Result<()> {
    sqlx::query("INSERT INTO watch_history (user_id, video_id) VALUES ($1, $2)")
        .bind(user_id)
        .bind(video_id)
        .execute(db)
        .await?;
    Ok(())
}
