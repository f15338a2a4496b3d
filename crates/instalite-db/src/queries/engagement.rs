use anyhow::Result;

use super::OptionalExt;
use crate::Database;
use crate::models::{CommentRow, LikeToggle};

impl Database {
    // -- Likes --

    /// Toggle a like: removes it if present, inserts it otherwise, and keeps
    /// `posts.likes_count` in step within the same transaction.
    pub fn toggle_like(&self, user_id: i64, post_id: i64) -> Result<LikeToggle> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let existing: Option<i64> = tx
                .query_row(
                    "SELECT id FROM likes WHERE user_id = ?1 AND post_id = ?2",
                    [user_id, post_id],
                    |row| row.get(0),
                )
                .optional()?;

            let liked = match existing {
                Some(like_id) => {
                    tx.execute("DELETE FROM likes WHERE id = ?1", [like_id])?;
                    tx.execute(
                        "UPDATE posts SET likes_count = MAX(likes_count - 1, 0) WHERE id = ?1",
                        [post_id],
                    )?;
                    false
                }
                None => {
                    tx.execute(
                        "INSERT INTO likes (user_id, post_id) VALUES (?1, ?2)",
                        [user_id, post_id],
                    )?;
                    tx.execute(
                        "UPDATE posts SET likes_count = likes_count + 1 WHERE id = ?1",
                        [post_id],
                    )?;
                    true
                }
            };

            let likes_count: i64 =
                tx.query_row("SELECT likes_count FROM posts WHERE id = ?1", [post_id], |row| {
                    row.get(0)
                })?;

            tx.commit()?;
            Ok(LikeToggle { liked, likes_count })
        })
    }

    // -- Comments --

    pub fn add_comment(&self, user_id: i64, post_id: i64, content: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (user_id, post_id, content) VALUES (?1, ?2, ?3)",
                rusqlite::params![user_id, post_id, content],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Comments on a post with their authors, oldest first.
    pub fn comments_for_post(&self, post_id: i64) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.user_id, c.post_id, c.content, c.created_at, u.username, u.avatar
                 FROM comments c
                 JOIN users u ON c.user_id = u.id
                 WHERE c.post_id = ?1
                 ORDER BY c.created_at ASC, c.id ASC",
            )?;

            let rows = stmt
                .query_map([post_id], |row| {
                    Ok(CommentRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        post_id: row.get(2)?,
                        content: row.get(3)?,
                        created_at: row.get(4)?,
                        username: row.get(5)?,
                        avatar: row.get(6)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}
