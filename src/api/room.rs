use axum::Json;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

use crate::AppResult;
use crate::countdown;
use crate::error::AppError;
use crate::model::Room;
use crate::store;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateRoom {
    #[serde(default)]
    room_id: String,
    #[serde(default)]
    pin: String,
    #[serde(default, rename = "targetISO")]
    target_iso: String,
    #[serde(default)]
    creator_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JoinRoom {
    #[serde(default)]
    room_id: String,
    #[serde(default)]
    pin: String,
    #[serde(default)]
    username: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RoomRef {
    room_id: String,
}

#[derive(Deserialize)]
pub(crate) struct UserRef {
    username: String,
}

#[derive(Serialize)]
struct RoomOk {
    success: bool,
    room: Room,
}

#[derive(Serialize)]
struct RoomsOk {
    success: bool,
    rooms: Vec<Room>,
}

pub(crate) async fn create(
    db_pool: &SqlitePool,
    CreateRoom {
        room_id,
        pin,
        target_iso,
        creator_id,
    }: CreateRoom,
) -> AppResult<Response> {
    if room_id.trim().is_empty() || pin.is_empty() || target_iso.is_empty() || creator_id.is_empty()
    {
        return Err(AppError::Validation("Missing required fields".to_owned()));
    }
    if countdown::parse_target(&target_iso).is_err() {
        return Err(AppError::Validation(
            "targetISO must be an RFC 3339 timestamp".to_owned(),
        ));
    }
    let mut room = Room::new(room_id.trim().to_owned(), pin, target_iso, creator_id);
    room.members.push(room.creator_id.clone());
    match store::insert_room(db_pool, &room).await {
        Ok(()) => {}
        Err(AppError::Database(err)) if store::is_unique_violation(&err) => {
            return Err(AppError::Duplicate("Room Name already exists".to_owned()));
        }
        Err(err) => return Err(err),
    }
    info!("room {} created by {}", room.room_id, room.creator_id);
    Ok(Json(RoomOk {
        success: true,
        room,
    })
    .into_response())
}

pub(crate) async fn join(
    db_pool: &SqlitePool,
    JoinRoom {
        room_id,
        pin,
        username,
    }: JoinRoom,
) -> AppResult<Response> {
    let Some(mut room) = store::find_room(db_pool, room_id.trim()).await? else {
        return Err(AppError::RoomNotFound);
    };
    if room.pin != pin {
        return Err(AppError::WrongPin);
    }
    if !username.is_empty() && !room.members.iter().any(|m| m == &username) {
        room.members.push(username);
        store::save_room(db_pool, &room).await?;
    }
    Ok(Json(RoomOk {
        success: true,
        room,
    })
    .into_response())
}

/// Members re-entering a room they already joined skip the PIN, so the
/// response here is the bare document.
pub(crate) async fn get(
    db_pool: &SqlitePool,
    RoomRef { room_id }: RoomRef,
) -> AppResult<Response> {
    let Some(room) = store::find_room(db_pool, &room_id).await? else {
        return Err(AppError::RoomNotFound);
    };
    Ok(Json(room).into_response())
}

pub(crate) async fn for_user(
    db_pool: &SqlitePool,
    UserRef { username }: UserRef,
) -> AppResult<Response> {
    let rooms = store::rooms_with_member(db_pool, &username).await?;
    Ok(Json(RoomsOk {
        success: true,
        rooms,
    })
    .into_response())
}
