use anyhow::Result;
use rusqlite::{Connection, Row};

use super::OptionalExt;
use crate::Database;
use crate::models::{FeedRow, PostRow};

impl Database {
    pub fn create_post(&self, user_id: i64, image_url: &str, caption: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO posts (user_id, image_url, caption) VALUES (?1, ?2, ?3)",
                rusqlite::params![user_id, image_url, caption],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Every post with its author, newest first.
    pub fn list_feed(&self) -> Result<Vec<FeedRow>> {
        self.with_conn(query_feed)
    }

    pub fn posts_by_user(&self, user_id: i64) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, image_url, caption, likes_count, created_at
                 FROM posts
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, id DESC",
            )?;
            let rows = stmt
                .query_map([user_id], map_post)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn post_exists(&self, post_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let found = conn
                .query_row("SELECT 1 FROM posts WHERE id = ?1", [post_id], |_| Ok(()))
                .optional()?;
            Ok(found.is_some())
        })
    }

    /// Fetch a post only if `user_id` owns it.
    pub fn get_owned_post(&self, post_id: i64, user_id: i64) -> Result<Option<PostRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, user_id, image_url, caption, likes_count, created_at
                     FROM posts WHERE id = ?1 AND user_id = ?2",
                    [post_id, user_id],
                    map_post,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn update_caption(&self, post_id: i64, caption: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE posts SET caption = ?1 WHERE id = ?2",
                rusqlite::params![caption, post_id],
            )?;
            Ok(())
        })
    }

    /// Delete a post together with its likes and comments.
    pub fn delete_post(&self, post_id: i64) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM likes WHERE post_id = ?1", [post_id])?;
            tx.execute("DELETE FROM comments WHERE post_id = ?1", [post_id])?;
            tx.execute("DELETE FROM posts WHERE id = ?1", [post_id])?;
            tx.commit()?;
            Ok(())
        })
    }
}

fn query_feed(conn: &Connection) -> Result<Vec<FeedRow>> {
    // JOIN users to fetch the author in a single query
    let mut stmt = conn.prepare(
        "SELECT p.id, p.user_id, p.image_url, p.caption, p.likes_count, p.created_at,
                u.username, u.avatar
         FROM posts p
         JOIN users u ON p.user_id = u.id
         ORDER BY p.created_at DESC, p.id DESC",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok(FeedRow {
                post: map_post(row)?,
                username: row.get(6)?,
                avatar: row.get(7)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn map_post(row: &Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        image_url: row.get(2)?,
        caption: row.get(3)?,
        likes_count: row.get(4)?,
        created_at: row.get(5)?,
    })
}
