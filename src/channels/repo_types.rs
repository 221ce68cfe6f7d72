use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Directed edge: `subscriber_id` follows `channel_id`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    pub id: Uuid,
    pub subscriber_id: Uuid,
    pub channel_id: Uuid,
    pub created_at: OffsetDateTime,
}

/// A channel as seen by a viewer: profile fields plus derived
/// relationship numbers. All counts come from one snapshot read.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ChannelProfile {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub avatar_url: String,
    pub cover_image_url: String,
    pub subscriber_count: i64,
    pub subscribed_to_count: i64,
    pub is_subscribed: bool,
    pub created_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_serializes_counts_and_status() {
        let profile = ChannelProfile {
            id: Uuid::new_v4(),
            username: "creator".into(),
            full_name: "Channel Creator".into(),
            email: "creator@example.com".into(),
            avatar_url: "avatars/creator.jpg".into(),
            cover_image_url: "covers/creator.jpg".into(),
            subscriber_count: 2,
            subscribed_to_count: 1,
            is_subscribed: true,
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&profile).unwrap();
        assert!(json.contains("\"subscriber_count\":2"));
        assert!(json.contains("\"subscribed_to_count\":1"));
        assert!(json.contains("\"is_subscribed\":true"));
        assert!(!json.contains("password"));
        assert!(!json.contains("refresh"));
    }
}
