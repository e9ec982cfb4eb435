mod auth;
mod room;
mod sync;

use axum::extract::{DefaultBodyLimit, State};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router, debug_handler};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::{AppResult, AppState};

/// Photos and custom stickers travel inside the document as data URLs,
/// so the body cap is generous.
pub const BODY_LIMIT: usize = 10 * 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(liveness).post(dispatch))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
}

/// Every operation arrives as `{ "action": ..., "payload": ... }` on
/// the one POST route.
#[derive(Deserialize)]
struct Rpc {
    action: Option<String>,
    #[serde(default)]
    payload: Value,
}

#[debug_handler]
async fn liveness() -> Json<Value> {
    Json(json!({ "status": "API is running" }))
}

#[debug_handler]
async fn dispatch(
    State(db_pool): State<SqlitePool>,
    Json(Rpc { action, payload }): Json<Rpc>,
) -> AppResult<Response> {
    let Some(action) = action else {
        return Err(AppError::Validation("No action provided".to_owned()));
    };
    match action.as_str() {
        "REGISTER" => auth::register(&db_pool, parse(payload)?).await,
        "LOGIN" => auth::login(&db_pool, parse(payload)?).await,
        "CREATE_ROOM" => room::create(&db_pool, parse(payload)?).await,
        "JOIN_ROOM" => room::join(&db_pool, parse(payload)?).await,
        "GET_ROOM" => room::get(&db_pool, parse(payload)?).await,
        "GET_USER_ROOMS" => room::for_user(&db_pool, parse(payload)?).await,
        "SYNC_ROOM" => sync::sync_room(&db_pool, parse(payload)?).await,
        "UPDATE_ROOM_DETAILS" => sync::update_details(&db_pool, parse(payload)?).await,
        "CLEAR_CANVAS" => sync::clear_canvas(&db_pool, parse(payload)?).await,
        _ => Err(AppError::Validation("Unknown action".to_owned())),
    }
}

fn parse<T: DeserializeOwned>(payload: Value) -> AppResult<T> {
    serde_json::from_value(payload)
        .map_err(|err| AppError::Validation(format!("bad payload: {err}")))
}
