/// Database row types. These map directly to SQLite rows and stay
/// independent of the instalite-types wire models.

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub avatar: String,
    pub bio: String,
    pub created_at: String,
}

pub struct PostRow {
    pub id: i64,
    pub user_id: i64,
    pub image_url: String,
    pub caption: String,
    pub likes_count: i64,
    pub created_at: String,
}

/// A post joined with its author.
pub struct FeedRow {
    pub post: PostRow,
    pub username: String,
    pub avatar: String,
}

pub struct CommentRow {
    pub id: i64,
    pub user_id: i64,
    pub post_id: i64,
    pub content: String,
    pub created_at: String,
    pub username: String,
    pub avatar: String,
}

/// A user on one end of a follow edge; `since` is the edge's creation time.
pub struct FollowUserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub avatar: String,
    pub bio: String,
    pub since: String,
}

pub struct FollowRow {
    pub id: i64,
    pub follower_id: i64,
    pub following_id: i64,
    pub created_at: String,
}

pub enum FollowOutcome {
    Created(FollowRow),
    AlreadyFollowing,
}

/// Result of toggling a like: the new state and the post's like count.
pub struct LikeToggle {
    pub liked: bool,
    pub likes_count: i64,
}
