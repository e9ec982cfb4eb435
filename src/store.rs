use std::str::FromStr;

use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::error::AppError;
use crate::model::{Room, RoomField};

/// One row per account. `user_id` is minted here, not by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user_id: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: String,
}

/// Opens (creating if missing) the database behind `database_url` and
/// brings the schema up to date. The pool is the only handle the rest
/// of the crate sees; nothing else touches SQLite directly.
pub async fn open(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);
    let pool = SqlitePoolOptions::new()
        .max_connections(16)
        .connect_with(options)
        .await?;
    migrate(&pool).await?;
    info!("room store ready at {database_url}");
    Ok(pool)
}

async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            user_id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS rooms (
            room_id TEXT PRIMARY KEY,
            doc TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

pub async fn insert_user(pool: &SqlitePool, user: &UserRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO users (user_id, username, password_hash, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&user.user_id)
    .bind(&user.username)
    .bind(&user.password_hash)
    .bind(&user.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_user(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<UserRecord>, sqlx::Error> {
    let row = sqlx::query_as::<_, (String, String, String, String)>(
        "SELECT user_id, username, password_hash, created_at FROM users WHERE username = ?",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(user_id, username, password_hash, created_at)| UserRecord {
        user_id,
        username,
        password_hash,
        created_at,
    }))
}

pub async fn insert_room(pool: &SqlitePool, room: &Room) -> Result<(), AppError> {
    let doc = serde_json::to_string(room)?;
    sqlx::query("INSERT INTO rooms (room_id, doc) VALUES (?, ?)")
        .bind(&room.room_id)
        .bind(doc)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn find_room(pool: &SqlitePool, room_id: &str) -> Result<Option<Room>, AppError> {
    let row = sqlx::query_as::<_, (String,)>("SELECT doc FROM rooms WHERE room_id = ?")
        .bind(room_id)
        .fetch_optional(pool)
        .await?;
    match row {
        Some((doc,)) => Ok(Some(serde_json::from_str(&doc)?)),
        None => Ok(None),
    }
}

/// Rewrites the whole document. Used for membership changes, where the
/// room was just read in the same handler anyway.
pub async fn save_room(pool: &SqlitePool, room: &Room) -> Result<(), AppError> {
    let doc = serde_json::to_string(room)?;
    sqlx::query("UPDATE rooms SET doc = ? WHERE room_id = ?")
        .bind(doc)
        .bind(&room.room_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Replaces the given fields inside the stored document in one
/// statement. A single `json_set` keeps the write atomic: concurrent
/// syncs interleave per statement, never per field.
pub async fn set_fields(
    pool: &SqlitePool,
    room_id: &str,
    fields: &[(RoomField, Value)],
) -> Result<(), AppError> {
    if fields.is_empty() {
        return Ok(());
    }
    let mut sql = String::from("UPDATE rooms SET doc = json_set(doc");
    for _ in fields {
        sql.push_str(", ?, json(?)");
    }
    sql.push_str(") WHERE room_id = ?");

    let mut query = sqlx::query(&sql);
    for (field, value) in fields {
        query = query.bind(field.json_path()).bind(value.to_string());
    }
    query.bind(room_id).execute(pool).await?;
    Ok(())
}

/// All rooms whose member list contains `username`, via `json_each`
/// over the stored documents.
pub async fn rooms_with_member(pool: &SqlitePool, username: &str) -> Result<Vec<Room>, AppError> {
    let rows = sqlx::query_as::<_, (String,)>(
        "SELECT doc FROM rooms WHERE EXISTS (
            SELECT 1 FROM json_each(rooms.doc, '$.members') WHERE json_each.value = ?
        )",
    )
    .bind(username)
    .fetch_all(pool)
    .await?;
    rows.into_iter()
        .map(|(doc,)| serde_json::from_str(&doc).map_err(AppError::from))
        .collect()
}

#[cfg(test)]
pub(crate) async fn open_in_memory() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    migrate(&pool).await.unwrap();
    pool
}
