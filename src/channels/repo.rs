use sqlx::PgPool;
use uuid::Uuid;

use crate::channels::repo_types::{ChannelProfile, Subscription};
use crate::error::ApiError;

impl ChannelProfile {
    /// Resolve a channel by normalized username together with its
    /// subscriber count, subscribed-to count and the viewer's own
    /// subscription status. A single statement, so all three numbers
    /// come from the same MVCC snapshot and can never disagree with
    /// each other, even under concurrent edge writes.
    ///
    /// `viewer` is NULL for anonymous reads; `EXISTS` is then false.
    pub async fn load(
        db: &PgPool,
        username: &str,
        viewer: Option<Uuid>,
    ) -> anyhow::Result<Option<ChannelProfile>> {
        let profile = sqlx::query_as::<_, ChannelProfile>(
            r#"
            SELECT u.id,
                   u.username,
                   u.full_name,
                   u.email,
                   u.avatar_url,
                   u.cover_image_url,
                   (SELECT count(*) FROM subscriptions s
                     WHERE s.channel_id = u.id)                    AS subscriber_count,
                   (SELECT count(*) FROM subscriptions s
                     WHERE s.subscriber_id = u.id)                 AS subscribed_to_count,
                   EXISTS (SELECT 1 FROM subscriptions s
                     WHERE s.channel_id = u.id
                       AND s.subscriber_id = $2)                   AS is_subscribed,
                   u.created_at
            FROM users u
            WHERE u.username = $1
            "#,
        )
        .bind(username)
        .bind(viewer)
        .fetch_optional(db)
        .await?;
        Ok(profile)
    }
}

impl Subscription {
    /// Record an edge. Idempotent: re-subscribing is a no-op.
    pub async fn subscribe(
        db: &PgPool,
        subscriber_id: Uuid,
        channel_id: Uuid,
    ) -> Result<(), ApiError> {
        if subscriber_id == channel_id {
            return Err(ApiError::validation("cannot subscribe to yourself"));
        }
        sqlx::query(
            "INSERT INTO subscriptions (subscriber_id, channel_id) VALUES ($1, $2) \
             ON CONFLICT (subscriber_id, channel_id) DO NOTHING",
        )
        .bind(subscriber_id)
        .bind(channel_id)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Remove an edge; returns whether one existed.
    pub async fn unsubscribe(
        db: &PgPool,
        subscriber_id: Uuid,
        channel_id: Uuid,
    ) -> anyhow::Result<bool> {
        let result =
            sqlx::query("DELETE FROM subscriptions WHERE subscriber_id = $1 AND channel_id = $2")
                .bind(subscriber_id)
                .bind(channel_id)
                .execute(db)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn self_subscription_is_rejected_before_any_io() {
        let state = crate::state::AppState::fake();
        let id = Uuid::new_v4();
        let err = Subscription::subscribe(&state.db, id, id).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
