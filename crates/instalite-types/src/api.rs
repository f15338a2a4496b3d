use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Post;

// -- JWT Claims --

/// JWT claims issued at register/login and checked by the auth middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub exp: usize,
}

// -- Envelope --

/// `{success: true, message?, data}` body used by the newer endpoints.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data,
        }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data,
        }
    }
}

// -- Auth --

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: AuthUser,
}

// -- Posts --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostResponse {
    pub id: i64,
    pub image_url: String,
    pub caption: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCaptionRequest {
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub liked: bool,
    pub likes_count: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateCommentResponse {
    pub id: i64,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct CaptionSuggestions {
    pub success: bool,
    pub captions: Vec<String>,
    pub message: String,
}

// -- Users --

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub avatar: String,
    pub bio: String,
    pub created_at: DateTime<Utc>,
    pub followers_count: i64,
    pub following_count: i64,
    pub posts: Vec<Post>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBioRequest {
    #[serde(default)]
    pub bio: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AvatarData {
    pub avatar: String,
}

#[derive(Debug, Serialize)]
pub struct BioData {
    pub bio: String,
}

// -- Follow --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowCreated {
    pub follow_id: i64,
    pub follower_id: i64,
    pub following_id: i64,
    pub following_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowRemoved {
    pub following_id: i64,
    pub following_count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowerEntry {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub avatar: String,
    pub bio: String,
    pub followed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowingEntry {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub avatar: String,
    pub bio: String,
    pub following_since: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowersPage {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
    pub followers: Vec<FollowerEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowingPage {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
    pub following: Vec<FollowingEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowStatus {
    pub is_following: bool,
    pub followed_at: Option<DateTime<Utc>>,
    pub target_user_id: i64,
    pub current_user_id: i64,
}

// -- Health --

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}
