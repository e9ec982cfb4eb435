use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;
use untilus::{AppState, api, store};

async fn test_app() -> (Router, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}/rooms.db", dir.path().display());
    let db_pool = store::open(&url).await.unwrap();
    let app = api::router().with_state(AppState { db_pool });
    (app, dir)
}

async fn rpc(app: &Router, action: &str, payload: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "action": action, "payload": payload }).to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn liveness_answers_on_get() {
    let (app, _dir) = test_app().await;
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({ "status": "API is running" }));
}

#[tokio::test]
async fn missing_and_unknown_actions_are_rejected() {
    let (app, _dir) = test_app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "payload": {} }).to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "No action provided");

    let (status, body) = rpc(&app, "TELEPORT", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Unknown action");
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let (app, _dir) = test_app().await;
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ this is not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_and_login_contract() {
    let (app, _dir) = test_app().await;

    let (status, body) = rpc(
        &app,
        "REGISTER",
        json!({ "username": "alice", "password": "wonder" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["username"], "alice");
    assert!(body["userId"].as_str().is_some_and(|id| !id.is_empty()));

    let (status, body) = rpc(
        &app,
        "REGISTER",
        json!({ "username": "alice", "password": "other" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Username already taken");

    let (status, _) = rpc(
        &app,
        "REGISTER",
        json!({ "username": "", "password": "x" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = rpc(
        &app,
        "LOGIN",
        json!({ "username": "alice", "password": "wonder" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    for bad in [
        json!({ "username": "alice", "password": "nope" }),
        json!({ "username": "bob", "password": "wonder" }),
    ] {
        let (status, body) = rpc(&app, "LOGIN", bad).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid username or password");
    }
}

#[tokio::test]
async fn room_lifecycle_contract() {
    let (app, _dir) = test_app().await;

    // create as alice
    let (status, body) = rpc(
        &app,
        "CREATE_ROOM",
        json!({
            "roomId": "trip2025",
            "pin": "4242",
            "targetISO": "2025-12-31T00:00:00Z",
            "creatorId": "alice",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["room"]["members"], json!(["alice"]));
    assert_eq!(body["room"]["eventName"], "Us");
    assert_eq!(body["room"]["photo"], "us.png");

    // duplicate name
    let (status, body) = rpc(
        &app,
        "CREATE_ROOM",
        json!({
            "roomId": "trip2025",
            "pin": "1111",
            "targetISO": "2026-01-01T00:00:00Z",
            "creatorId": "mallory",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Room Name already exists");

    // wrong pin is forbidden
    let (status, body) = rpc(
        &app,
        "JOIN_ROOM",
        json!({ "roomId": "trip2025", "pin": "0000", "username": "bob" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Incorrect PIN");

    // joining twice keeps one membership entry
    for _ in 0..2 {
        let (status, body) = rpc(
            &app,
            "JOIN_ROOM",
            json!({ "roomId": "trip2025", "pin": "4242", "username": "bob" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["room"]["members"], json!(["alice", "bob"]));
    }

    // unknown rooms are 404 on both paths
    let (status, body) = rpc(
        &app,
        "JOIN_ROOM",
        json!({ "roomId": "ghost", "pin": "4242", "username": "bob" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Room not found");
    let (status, _) = rpc(&app, "GET_ROOM", json!({ "roomId": "ghost" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // GET_ROOM returns the bare document
    let (status, body) = rpc(&app, "GET_ROOM", json!({ "roomId": "trip2025" })).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("success").is_none());
    assert_eq!(body["roomId"], "trip2025");
    assert_eq!(body["targetISO"], "2025-12-31T00:00:00Z");

    // rooms per user
    let (status, body) = rpc(&app, "GET_USER_ROOMS", json!({ "username": "bob" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rooms"][0]["roomId"], "trip2025");
    let (_, body) = rpc(&app, "GET_USER_ROOMS", json!({ "username": "nobody" })).await;
    assert_eq!(body["rooms"], json!([]));
}

#[tokio::test]
async fn sync_round_trip_and_idempotence() {
    let (app, _dir) = test_app().await;
    rpc(
        &app,
        "CREATE_ROOM",
        json!({
            "roomId": "trip2025",
            "pin": "4242",
            "targetISO": "2025-12-31T00:00:00Z",
            "creatorId": "alice",
        }),
    )
    .await;

    let sticker = json!({
        "id": "s-1",
        "type": "image",
        "src": "heart.png",
        "x": 120.0,
        "y": 80.0,
        "rotation": -4.0,
        "scale": 1.5,
    });
    let updates = json!({ "stickers": [sticker], "todoItems": ["book flights"] });

    let (status, body) = rpc(
        &app,
        "SYNC_ROOM",
        json!({ "roomId": "trip2025", "updates": updates.clone() }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    let (_, first) = rpc(&app, "GET_ROOM", json!({ "roomId": "trip2025" })).await;
    assert_eq!(first["stickers"][0]["src"], "heart.png");

    // applying the same updates again changes nothing
    rpc(
        &app,
        "SYNC_ROOM",
        json!({ "roomId": "trip2025", "updates": updates }),
    )
    .await;
    let (_, second) = rpc(&app, "GET_ROOM", json!({ "roomId": "trip2025" })).await;
    assert_eq!(first, second);

    // deleting by pushing the filtered array
    rpc(
        &app,
        "SYNC_ROOM",
        json!({ "roomId": "trip2025", "updates": { "stickers": [] } }),
    )
    .await;
    let (_, gone) = rpc(&app, "GET_ROOM", json!({ "roomId": "trip2025" })).await;
    assert_eq!(gone["stickers"], json!([]));
    // the other field survived the sticker delete
    assert_eq!(gone["todoItems"], json!(["book flights"]));
}

#[tokio::test]
async fn sync_rejects_identity_fields_and_empty_updates() {
    let (app, _dir) = test_app().await;
    rpc(
        &app,
        "CREATE_ROOM",
        json!({
            "roomId": "trip2025",
            "pin": "4242",
            "targetISO": "2025-12-31T00:00:00Z",
            "creatorId": "alice",
        }),
    )
    .await;

    let (status, body) = rpc(
        &app,
        "SYNC_ROOM",
        json!({ "roomId": "trip2025", "updates": { "pin": "0000" } }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("pin"));

    let (status, body) = rpc(
        &app,
        "SYNC_ROOM",
        json!({ "roomId": "trip2025", "updates": {} }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No updates provided");

    let (_, room) = rpc(&app, "GET_ROOM", json!({ "roomId": "trip2025" })).await;
    assert_eq!(room["pin"], "4242");
}

#[tokio::test]
async fn details_and_clear_canvas_contract() {
    let (app, _dir) = test_app().await;
    rpc(
        &app,
        "CREATE_ROOM",
        json!({
            "roomId": "trip2025",
            "pin": "4242",
            "targetISO": "2025-12-31T00:00:00Z",
            "creatorId": "alice",
        }),
    )
    .await;
    rpc(
        &app,
        "SYNC_ROOM",
        json!({
            "roomId": "trip2025",
            "updates": {
                "todoItems": ["book flights"],
                "photo": "beach.png",
                "quote": "always",
                "chatMessages": [
                    { "id": "m-1", "user": "alice", "text": "hi", "timestamp": "2025-01-01T00:00:00Z" }
                ],
            },
        }),
    )
    .await;

    let (status, _) = rpc(
        &app,
        "UPDATE_ROOM_DETAILS",
        json!({
            "roomId": "trip2025",
            "eventName": "Honeymoon",
            "targetISO": "2026-02-14T12:00:00Z",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = rpc(
        &app,
        "UPDATE_ROOM_DETAILS",
        json!({
            "roomId": "trip2025",
            "eventName": "Honeymoon",
            "targetISO": "soon",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = rpc(&app, "CLEAR_CANVAS", json!({ "roomId": "trip2025" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    let (_, room) = rpc(&app, "GET_ROOM", json!({ "roomId": "trip2025" })).await;
    assert_eq!(room["stickers"], json!([]));
    assert_eq!(room["todoItems"], json!([]));
    assert_eq!(room["photo"], "us.png");
    assert_eq!(room["noteState"]["rotation"], -2.0);
    assert_eq!(room["quote"], Value::Null);
    // chat survives a canvas clear, and so do the updated details
    assert_eq!(room["chatMessages"][0]["text"], "hi");
    assert_eq!(room["eventName"], "Honeymoon");
    assert_eq!(room["targetISO"], "2026-02-14T12:00:00Z");
}
