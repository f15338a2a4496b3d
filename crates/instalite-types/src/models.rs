use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A post as stored, without author details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub image_url: String,
    pub caption: String,
    pub likes_count: i64,
    pub created_at: DateTime<Utc>,
}

/// A feed entry: the post plus its author's name and avatar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedPost {
    #[serde(flatten)]
    pub post: Post,
    pub username: String,
    pub avatar: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub user_id: i64,
    pub post_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub username: String,
    pub avatar: String,
}

/// The account view returned to its owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub avatar: String,
    pub bio: String,
}
