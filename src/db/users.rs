use rusqlite::{params, OptionalExtension, Row};

use crate::auth::password;
use crate::db::map_sqlite_err;
use crate::db::models::User;
use crate::error::{AppError, AppResult};
use crate::state::DbPool;

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        image_url: row.get(4)?,
        created_at: row.get(5)?,
    })
}

const USER_COLS: &str = "id, username, email, password_hash, image_url, created_at";

/// Create a user with a bcrypt-hashed password. Duplicate username or email
/// surfaces as `AppError::Constraint`; nothing is written in that case.
pub fn signup(
    pool: &DbPool,
    username: &str,
    email: &str,
    password: &str,
    image_url: Option<&str>,
) -> AppResult<User> {
    let conn = pool.get()?;
    let id = uuid::Uuid::now_v7().to_string();
    let password_hash = password::hash(password)?;

    conn.execute(
        "INSERT INTO users (id, username, email, password_hash, image_url)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![id, username, email, password_hash, image_url],
    )
    .map_err(map_sqlite_err)?;

    conn.query_row(
        &format!("SELECT {USER_COLS} FROM users WHERE id = ?1"),
        params![id],
        user_from_row,
    )
    .map_err(AppError::from)
}

/// Look up a user by username and verify the password. A missing username and
/// a wrong password are deliberately the same outcome: `None`.
pub fn authenticate(pool: &DbPool, username: &str, password: &str) -> AppResult<Option<User>> {
    let conn = pool.get()?;
    let user = conn
        .query_row(
            &format!("SELECT {USER_COLS} FROM users WHERE username = ?1"),
            params![username],
            user_from_row,
        )
        .optional()?;

    match user {
        Some(user) if password::verify(password, &user.password_hash) => Ok(Some(user)),
        _ => Ok(None),
    }
}

pub fn get(pool: &DbPool, id: &str) -> AppResult<Option<User>> {
    let conn = pool.get()?;
    let user = conn
        .query_row(
            &format!("SELECT {USER_COLS} FROM users WHERE id = ?1"),
            params![id],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

pub fn get_by_username(pool: &DbPool, username: &str) -> AppResult<Option<User>> {
    let conn = pool.get()?;
    let user = conn
        .query_row(
            &format!("SELECT {USER_COLS} FROM users WHERE username = ?1"),
            params![username],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

pub fn count(pool: &DbPool) -> AppResult<i64> {
    let conn = pool.get()?;
    let n = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    Ok(n)
}

/// Username substring search for the /users page.
pub fn search(pool: &DbPool, query: &str) -> AppResult<Vec<User>> {
    let conn = pool.get()?;
    let pattern = format!("%{}%", query);
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLS} FROM users WHERE username LIKE ?1 ORDER BY username"
    ))?;
    let users = stmt
        .query_map(params![pattern], user_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

/// Update profile fields. Requires the caller to have already verified the
/// actor's password. Unique violations surface as `Constraint`.
pub fn update_profile(
    pool: &DbPool,
    id: &str,
    username: &str,
    email: &str,
    image_url: Option<&str>,
) -> AppResult<()> {
    let conn = pool.get()?;
    conn.execute(
        "UPDATE users SET username = ?2, email = ?3, image_url = ?4 WHERE id = ?1",
        params![id, username, email, image_url],
    )
    .map_err(map_sqlite_err)?;
    Ok(())
}

/// Delete a user. Messages, follow edges, like edges, and sessions go with it
/// via ON DELETE CASCADE.
pub fn delete(pool: &DbPool, id: &str) -> AppResult<()> {
    let conn = pool.get()?;
    conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
    Ok(())
}

// -- Social graph --

/// Add a follow edge from `follower_id` to `followed_id`. Re-following is a
/// no-op; following yourself is rejected before the edge table is touched.
pub fn follow(pool: &DbPool, follower_id: &str, followed_id: &str) -> AppResult<()> {
    if follower_id == followed_id {
        return Err(AppError::BadRequest("You cannot follow yourself.".into()));
    }

    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO follows (follower_id, followed_id) VALUES (?1, ?2)
         ON CONFLICT (follower_id, followed_id) DO NOTHING",
        params![follower_id, followed_id],
    )
    .map_err(map_sqlite_err)?;
    Ok(())
}

pub fn unfollow(pool: &DbPool, follower_id: &str, followed_id: &str) -> AppResult<()> {
    let conn = pool.get()?;
    conn.execute(
        "DELETE FROM follows WHERE follower_id = ?1 AND followed_id = ?2",
        params![follower_id, followed_id],
    )?;
    Ok(())
}

pub fn is_following(pool: &DbPool, follower_id: &str, followed_id: &str) -> AppResult<bool> {
    let conn = pool.get()?;
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = ?1 AND followed_id = ?2)",
        params![follower_id, followed_id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

pub fn is_followed_by(pool: &DbPool, user_id: &str, other_id: &str) -> AppResult<bool> {
    is_following(pool, other_id, user_id)
}

/// Users that `user_id` follows.
pub fn following(pool: &DbPool, user_id: &str) -> AppResult<Vec<User>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT u.id, u.username, u.email, u.password_hash, u.image_url, u.created_at
         FROM users u
         JOIN follows f ON f.followed_id = u.id
         WHERE f.follower_id = ?1
         ORDER BY f.created_at DESC"
    ))?;
    let users = stmt
        .query_map(params![user_id], user_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

/// Users that follow `user_id`.
pub fn followers(pool: &DbPool, user_id: &str) -> AppResult<Vec<User>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT u.id, u.username, u.email, u.password_hash, u.image_url, u.created_at
         FROM users u
         JOIN follows f ON f.follower_id = u.id
         WHERE f.followed_id = ?1
         ORDER BY f.created_at DESC"
    ))?;
    let users = stmt
        .query_map(params![user_id], user_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}
