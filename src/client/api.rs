use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use thiserror::Error;

use crate::model::{Room, RoomPatch};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub user_id: String,
    pub username: String,
}

/// Thin wrapper over the one-endpoint RPC: every call is a POST of
/// `{action, payload}` against the base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> ApiClient {
        ApiClient {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn call(&self, action: &str, payload: Value) -> Result<Value, ClientError> {
        let response = self
            .http
            .post(&self.base_url)
            .json(&json!({ "action": action, "payload": payload }))
            .send()
            .await?;
        let status = response.status();
        let body: Value = response.json().await?;
        if !status.is_success() {
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("request failed")
                .to_owned();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(body)
    }

    fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ClientError> {
        Ok(serde_json::from_value(value)?)
    }

    pub async fn register(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthSession, ClientError> {
        let body = self
            .call(
                "REGISTER",
                json!({ "username": username, "password": password }),
            )
            .await?;
        Self::decode(body)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<AuthSession, ClientError> {
        let body = self
            .call(
                "LOGIN",
                json!({ "username": username, "password": password }),
            )
            .await?;
        Self::decode(body)
    }

    pub async fn create_room(
        &self,
        room_id: &str,
        pin: &str,
        target_iso: &str,
        creator_id: &str,
    ) -> Result<Room, ClientError> {
        let mut body = self
            .call(
                "CREATE_ROOM",
                json!({
                    "roomId": room_id,
                    "pin": pin,
                    "targetISO": target_iso,
                    "creatorId": creator_id,
                }),
            )
            .await?;
        Self::decode(body["room"].take())
    }

    pub async fn join_room(
        &self,
        room_id: &str,
        pin: &str,
        username: &str,
    ) -> Result<Room, ClientError> {
        let mut body = self
            .call(
                "JOIN_ROOM",
                json!({ "roomId": room_id, "pin": pin, "username": username }),
            )
            .await?;
        Self::decode(body["room"].take())
    }

    /// The response is the bare document, no `success` wrapper.
    pub async fn get_room(&self, room_id: &str) -> Result<Room, ClientError> {
        let body = self.call("GET_ROOM", json!({ "roomId": room_id })).await?;
        Self::decode(body)
    }

    pub async fn user_rooms(&self, username: &str) -> Result<Vec<Room>, ClientError> {
        let mut body = self
            .call("GET_USER_ROOMS", json!({ "username": username }))
            .await?;
        Self::decode(body["rooms"].take())
    }

    pub async fn sync_room(&self, room_id: &str, patch: &RoomPatch) -> Result<(), ClientError> {
        self.call(
            "SYNC_ROOM",
            json!({ "roomId": room_id, "updates": patch }),
        )
        .await?;
        Ok(())
    }

    pub async fn update_details(
        &self,
        room_id: &str,
        event_name: &str,
        target_iso: &str,
    ) -> Result<(), ClientError> {
        self.call(
            "UPDATE_ROOM_DETAILS",
            json!({
                "roomId": room_id,
                "eventName": event_name,
                "targetISO": target_iso,
            }),
        )
        .await?;
        Ok(())
    }

    pub async fn clear_canvas(&self, room_id: &str) -> Result<(), ClientError> {
        self.call("CLEAR_CANVAS", json!({ "roomId": room_id }))
            .await?;
        Ok(())
    }

    /// GET on the base URL; answers the liveness line.
    pub async fn liveness(&self) -> Result<String, ClientError> {
        let body: Value = self
            .http
            .get(&self.base_url)
            .send()
            .await?
            .json()
            .await?;
        Ok(body
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned())
    }
}
