use axum::Json;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use sqlx::SqlitePool;
use tracing::debug;

use crate::AppResult;
use crate::countdown;
use crate::error::AppError;
use crate::model::{DEFAULT_PHOTO, NoteState, RoomField};
use crate::store;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SyncRoom {
    room_id: String,
    #[serde(default)]
    updates: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateDetails {
    room_id: String,
    event_name: String,
    #[serde(rename = "targetISO")]
    target_iso: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ClearCanvas {
    room_id: String,
}

#[derive(Serialize)]
struct Ack {
    success: bool,
}

fn ack() -> Response {
    Json(Ack { success: true }).into_response()
}

/// Last write wins: the fields named in `updates` are replaced
/// wholesale, untouched fields keep whatever the store holds. Identity
/// fields are rejected rather than silently dropped.
pub(crate) async fn sync_room(
    db_pool: &SqlitePool,
    SyncRoom { room_id, updates }: SyncRoom,
) -> AppResult<Response> {
    if updates.is_empty() {
        return Err(AppError::Validation("No updates provided".to_owned()));
    }
    let mut fields = Vec::with_capacity(updates.len());
    for (name, value) in updates {
        let accepted = RoomField::from_wire(&name).filter(|f| f.is_syncable());
        let Some(field) = accepted else {
            return Err(AppError::Validation(format!(
                "Field '{name}' cannot be synced"
            )));
        };
        fields.push((field, value));
    }
    debug!(
        "sync {} fields [{}]",
        room_id,
        fields
            .iter()
            .map(|(f, _)| f.wire_name())
            .collect::<Vec<_>>()
            .join(", ")
    );
    store::set_fields(db_pool, &room_id, &fields).await?;
    Ok(ack())
}

pub(crate) async fn update_details(
    db_pool: &SqlitePool,
    UpdateDetails {
        room_id,
        event_name,
        target_iso,
    }: UpdateDetails,
) -> AppResult<Response> {
    if event_name.trim().is_empty() {
        return Err(AppError::Validation("Event name is required".to_owned()));
    }
    if countdown::parse_target(&target_iso).is_err() {
        return Err(AppError::Validation(
            "targetISO must be an RFC 3339 timestamp".to_owned(),
        ));
    }
    store::set_fields(
        db_pool,
        &room_id,
        &[
            (RoomField::EventName, json!(event_name)),
            (RoomField::TargetIso, json!(target_iso)),
        ],
    )
    .await?;
    Ok(ack())
}

pub(crate) async fn clear_canvas(
    db_pool: &SqlitePool,
    ClearCanvas { room_id }: ClearCanvas,
) -> AppResult<Response> {
    let note = serde_json::to_value(NoteState::default())?;
    store::set_fields(
        db_pool,
        &room_id,
        &[
            (RoomField::Stickers, json!([])),
            (RoomField::TodoItems, json!([])),
            (RoomField::NoteState, note),
            (RoomField::Photo, json!(DEFAULT_PHOTO)),
            (RoomField::Quote, Value::Null),
            (RoomField::MusicSrc, Value::Null),
            (RoomField::StatusCard, Value::Null),
        ],
    )
    .await?;
    debug!("canvas cleared for {room_id}");
    Ok(ack())
}
