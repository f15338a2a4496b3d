use anyhow::Result;
use rusqlite::Connection;

use super::OptionalExt;
use crate::Database;
use crate::models::{FollowOutcome, FollowRow, FollowUserRow};

impl Database {
    /// Create the edge `follower_id -> following_id` unless it already exists.
    pub fn follow_user(&self, follower_id: i64, following_id: i64) -> Result<FollowOutcome> {
        self.with_conn(|conn| {
            if follow_created_at(conn, follower_id, following_id)?.is_some() {
                return Ok(FollowOutcome::AlreadyFollowing);
            }

            conn.execute(
                "INSERT INTO user_follows (follower_id, following_id) VALUES (?1, ?2)",
                [follower_id, following_id],
            )?;
            let id = conn.last_insert_rowid();

            let row = conn.query_row(
                "SELECT id, follower_id, following_id, created_at FROM user_follows WHERE id = ?1",
                [id],
                |row| {
                    Ok(FollowRow {
                        id: row.get(0)?,
                        follower_id: row.get(1)?,
                        following_id: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                },
            )?;

            Ok(FollowOutcome::Created(row))
        })
    }

    /// Remove the edge. Returns false when it did not exist.
    pub fn unfollow_user(&self, follower_id: i64, following_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM user_follows WHERE follower_id = ?1 AND following_id = ?2",
                [follower_id, following_id],
            )?;
            Ok(removed > 0)
        })
    }

    /// When `follower_id` started following `following_id`, if it does.
    pub fn follow_since(&self, follower_id: i64, following_id: i64) -> Result<Option<String>> {
        self.with_conn(|conn| follow_created_at(conn, follower_id, following_id))
    }

    pub fn follower_count(&self, user_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM user_follows WHERE following_id = ?1",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    pub fn following_count(&self, user_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM user_follows WHERE follower_id = ?1",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    /// Users following `user_id`, most recent follow first.
    pub fn list_followers(&self, user_id: i64, limit: u32, offset: i64) -> Result<Vec<FollowUserRow>> {
        self.with_conn(|conn| {
            query_follow_users(
                conn,
                "SELECT u.id, u.username, u.email, u.avatar, u.bio, uf.created_at
                 FROM users u
                 INNER JOIN user_follows uf ON u.id = uf.follower_id
                 WHERE uf.following_id = ?1
                 ORDER BY uf.created_at DESC, uf.id DESC
                 LIMIT ?2 OFFSET ?3",
                user_id,
                limit,
                offset,
            )
        })
    }

    /// Users that `user_id` follows, by username.
    pub fn list_following(&self, user_id: i64, limit: u32, offset: i64) -> Result<Vec<FollowUserRow>> {
        self.with_conn(|conn| {
            query_follow_users(
                conn,
                "SELECT u.id, u.username, u.email, u.avatar, u.bio, uf.created_at
                 FROM users u
                 INNER JOIN user_follows uf ON u.id = uf.following_id
                 WHERE uf.follower_id = ?1
                 ORDER BY u.username ASC
                 LIMIT ?2 OFFSET ?3",
                user_id,
                limit,
                offset,
            )
        })
    }
}

fn follow_created_at(conn: &Connection, follower_id: i64, following_id: i64) -> Result<Option<String>> {
    conn.query_row(
        "SELECT created_at FROM user_follows WHERE follower_id = ?1 AND following_id = ?2",
        [follower_id, following_id],
        |row| row.get(0),
    )
    .optional()
}

fn query_follow_users(
    conn: &Connection,
    sql: &str,
    user_id: i64,
    limit: u32,
    offset: i64,
) -> Result<Vec<FollowUserRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(rusqlite::params![user_id, limit, offset], |row| {
            Ok(FollowUserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                email: row.get(2)?,
                avatar: row.get(3)?,
                bio: row.get(4)?,
                since: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
