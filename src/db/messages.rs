use rusqlite::{params, OptionalExtension, Row};

use crate::db::map_sqlite_err;
use crate::db::models::{Message, MessageWithAuthor};
use crate::error::{AppError, AppResult};
use crate::state::DbPool;

/// Outcome of a like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeToggle {
    Liked,
    Unliked,
}

fn message_from_row(row: &Row) -> rusqlite::Result<Message> {
    Ok(Message {
        id: row.get(0)?,
        user_id: row.get(1)?,
        text: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn with_author_from_row(row: &Row) -> rusqlite::Result<MessageWithAuthor> {
    Ok(MessageWithAuthor {
        id: row.get(0)?,
        user_id: row.get(1)?,
        username: row.get(2)?,
        text: row.get(3)?,
        created_at: row.get(4)?,
    })
}

const AUTHOR_SELECT: &str = "SELECT m.id, m.user_id, u.username, m.text, m.created_at
     FROM messages m JOIN users u ON u.id = m.user_id";

/// Insert a message owned by `user_id`. NOT NULL, length, and foreign-key
/// violations surface as `AppError::Constraint` with nothing written.
pub fn create(pool: &DbPool, user_id: &str, text: &str) -> AppResult<Message> {
    let conn = pool.get()?;
    let id = uuid::Uuid::now_v7().to_string();

    conn.execute(
        "INSERT INTO messages (id, user_id, text) VALUES (?1, ?2, ?3)",
        params![id, user_id, text],
    )
    .map_err(map_sqlite_err)?;

    conn.query_row(
        "SELECT id, user_id, text, created_at FROM messages WHERE id = ?1",
        params![id],
        message_from_row,
    )
    .map_err(AppError::from)
}

pub fn get_with_author(pool: &DbPool, id: &str) -> AppResult<Option<MessageWithAuthor>> {
    let conn = pool.get()?;
    let message = conn
        .query_row(
            &format!("{AUTHOR_SELECT} WHERE m.id = ?1"),
            params![id],
            with_author_from_row,
        )
        .optional()?;
    Ok(message)
}

pub fn count(pool: &DbPool) -> AppResult<i64> {
    let conn = pool.get()?;
    let n = conn.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?;
    Ok(n)
}

pub fn for_user(pool: &DbPool, user_id: &str) -> AppResult<Vec<MessageWithAuthor>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(&format!(
        "{AUTHOR_SELECT} WHERE m.user_id = ?1 ORDER BY m.created_at DESC"
    ))?;
    let messages = stmt
        .query_map(params![user_id], with_author_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(messages)
}

/// The home feed for a logged-in user: their own messages plus those of
/// everyone they follow, newest first.
pub fn timeline(pool: &DbPool, user_id: &str, limit: i64) -> AppResult<Vec<MessageWithAuthor>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(&format!(
        "{AUTHOR_SELECT}
         WHERE m.user_id = ?1
            OR m.user_id IN (SELECT followed_id FROM follows WHERE follower_id = ?1)
         ORDER BY m.created_at DESC
         LIMIT ?2"
    ))?;
    let messages = stmt
        .query_map(params![user_id, limit], with_author_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(messages)
}

/// Delete a message on behalf of `actor_id`. Unknown id is `NotFound`; a
/// non-owner gets `Forbidden` and the row stays put.
pub fn delete(pool: &DbPool, actor_id: &str, message_id: &str) -> AppResult<()> {
    let conn = pool.get()?;
    let owner: Option<String> = conn
        .query_row(
            "SELECT user_id FROM messages WHERE id = ?1",
            params![message_id],
            |row| row.get(0),
        )
        .optional()?;

    let owner = owner.ok_or(AppError::NotFound)?;
    if owner != actor_id {
        return Err(AppError::Forbidden("Unauthorized".into()));
    }

    conn.execute("DELETE FROM messages WHERE id = ?1", params![message_id])?;
    Ok(())
}

/// Toggle a like by `actor_id` on `message_id` inside one transaction.
/// Liking your own message is rejected and never writes a row.
pub fn toggle_like(pool: &DbPool, actor_id: &str, message_id: &str) -> AppResult<LikeToggle> {
    let mut conn = pool.get()?;
    let tx = conn.transaction()?;

    let owner: Option<String> = tx
        .query_row(
            "SELECT user_id FROM messages WHERE id = ?1",
            params![message_id],
            |row| row.get(0),
        )
        .optional()?;
    let owner = owner.ok_or(AppError::NotFound)?;

    if owner == actor_id {
        return Err(AppError::Forbidden("Cannot like your own post".into()));
    }

    let removed = tx.execute(
        "DELETE FROM likes WHERE user_id = ?1 AND message_id = ?2",
        params![actor_id, message_id],
    )?;

    let outcome = if removed > 0 {
        LikeToggle::Unliked
    } else {
        tx.execute(
            "INSERT INTO likes (user_id, message_id) VALUES (?1, ?2)",
            params![actor_id, message_id],
        )
        .map_err(map_sqlite_err)?;
        LikeToggle::Liked
    };

    tx.commit()?;
    Ok(outcome)
}

pub fn is_liked(pool: &DbPool, user_id: &str, message_id: &str) -> AppResult<bool> {
    let conn = pool.get()?;
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM likes WHERE user_id = ?1 AND message_id = ?2)",
        params![user_id, message_id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

pub fn like_count(pool: &DbPool) -> AppResult<i64> {
    let conn = pool.get()?;
    let n = conn.query_row("SELECT COUNT(*) FROM likes", [], |row| row.get(0))?;
    Ok(n)
}

/// Messages that `user_id` has liked, for the /users/{id}/likes page.
pub fn liked_by(pool: &DbPool, user_id: &str) -> AppResult<Vec<MessageWithAuthor>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(&format!(
        "{AUTHOR_SELECT}
         JOIN likes l ON l.message_id = m.id
         WHERE l.user_id = ?1
         ORDER BY l.created_at DESC"
    ))?;
    let messages = stmt
        .query_map(params![user_id], with_author_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(messages)
}
