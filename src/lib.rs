//! Shared countdown rooms: a couple (or a whole friend group) keeps a
//! canvas of stickers, notes and chat around one anniversary date.
//! The server half stores room documents and answers the action RPC;
//! the client half keeps an optimistic local copy in sync with it.

pub mod api;
pub mod client;
pub mod config;
pub mod countdown;
pub mod error;
pub mod model;
pub mod store;

use axum::extract::FromRef;
use sqlx::SqlitePool;

pub use error::AppError;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
}

pub type AppResult<T> = Result<T, AppError>;
