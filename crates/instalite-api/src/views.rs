//! Row -> wire model conversions.

use instalite_db::models::{CommentRow, FeedRow, FollowUserRow, PostRow, UserRow};
use instalite_types::api::{FollowerEntry, FollowingEntry};
use instalite_types::models::{Account, Comment, FeedPost, Post};
use instalite_types::time::timestamp_or_epoch;

pub(crate) fn post(row: PostRow) -> Post {
    Post {
        id: row.id,
        user_id: row.user_id,
        image_url: row.image_url,
        caption: row.caption,
        likes_count: row.likes_count,
        created_at: timestamp_or_epoch(&row.created_at),
    }
}

pub(crate) fn feed_post(row: FeedRow) -> FeedPost {
    FeedPost {
        post: post(row.post),
        username: row.username,
        avatar: row.avatar,
    }
}

pub(crate) fn comment(row: CommentRow) -> Comment {
    Comment {
        id: row.id,
        user_id: row.user_id,
        post_id: row.post_id,
        content: row.content,
        created_at: timestamp_or_epoch(&row.created_at),
        username: row.username,
        avatar: row.avatar,
    }
}

pub(crate) fn account(row: UserRow) -> Account {
    Account {
        id: row.id,
        username: row.username,
        email: row.email,
        avatar: row.avatar,
        bio: row.bio,
    }
}

pub(crate) fn follower(row: FollowUserRow) -> FollowerEntry {
    FollowerEntry {
        id: row.id,
        username: row.username,
        email: row.email,
        avatar: row.avatar,
        bio: row.bio,
        followed_at: timestamp_or_epoch(&row.since),
    }
}

pub(crate) fn following(row: FollowUserRow) -> FollowingEntry {
    FollowingEntry {
        id: row.id,
        username: row.username,
        email: row.email,
        avatar: row.avatar,
        bio: row.bio,
        following_since: timestamp_or_epoch(&row.since),
    }
}
