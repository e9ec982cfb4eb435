use axum::Json;
use axum::response::{IntoResponse, Response};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::AppResult;
use crate::countdown::now_rfc3339;
use crate::error::AppError;
use crate::store::{self, UserRecord};

const SALT_LEN: usize = 16;

#[derive(Deserialize)]
pub(crate) struct Credentials {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthOk {
    success: bool,
    user_id: String,
    username: String,
}

pub(crate) async fn register(
    db_pool: &SqlitePool,
    Credentials { username, password }: Credentials,
) -> AppResult<Response> {
    let username = username.trim().to_owned();
    if username.is_empty() || password.is_empty() {
        return Err(AppError::Validation(
            "Username and password are required".to_owned(),
        ));
    }
    if store::find_user(db_pool, &username).await?.is_some() {
        return Err(AppError::Duplicate("Username already taken".to_owned()));
    }
    let record = UserRecord {
        user_id: Uuid::now_v7().to_string(),
        username,
        password_hash: hash_password(&password),
        created_at: now_rfc3339(),
    };
    // Two concurrent registrations can both pass the lookup above; the
    // unique index picks the winner.
    match store::insert_user(db_pool, &record).await {
        Ok(()) => {}
        Err(err) if store::is_unique_violation(&err) => {
            return Err(AppError::Duplicate("Username already taken".to_owned()));
        }
        Err(err) => return Err(err.into()),
    }
    info!("registered {}", record.username);
    Ok(Json(AuthOk {
        success: true,
        user_id: record.user_id,
        username: record.username,
    })
    .into_response())
}

pub(crate) async fn login(
    db_pool: &SqlitePool,
    Credentials { username, password }: Credentials,
) -> AppResult<Response> {
    let Some(user) = store::find_user(db_pool, username.trim()).await? else {
        return Err(AppError::InvalidCredentials);
    };
    if !verify_password(&password, &user.password_hash) {
        return Err(AppError::InvalidCredentials);
    }
    Ok(Json(AuthOk {
        success: true,
        user_id: user.user_id,
        username: user.username,
    })
    .into_response())
}

/// `base64(salt)$base64(sha256(salt || password))`, fresh salt per call.
pub(crate) fn hash_password(password: &str) -> String {
    let salt: [u8; SALT_LEN] = rand::random();
    let digest = Sha256::new()
        .chain_update(salt)
        .chain_update(password.as_bytes())
        .finalize();
    format!("{}${}", STANDARD.encode(salt), STANDARD.encode(digest))
}

pub(crate) fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, digest)) = stored.split_once('$') else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (STANDARD.decode(salt), STANDARD.decode(digest)) else {
        return false;
    };
    let actual = Sha256::new()
        .chain_update(&salt)
        .chain_update(password.as_bytes())
        .finalize();
    constant_time_eq(actual.as_slice(), &expected)
}

// Comparison must not leak how far the digests agree.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |diff, (x, y)| diff | (x ^ y)) == 0
}
