//! Client half of the sync protocol: an optimistic local copy of the
//! room, fire-and-forget pushes, and a polled merge gated by per-field
//! leases. The server never pushes; everything converges through
//! last-write-wins snapshots.

mod api;
mod cache;
mod gesture;
mod lease;
mod reconcile;

pub use api::{ApiClient, AuthSession, ClientError};
pub use cache::{CACHE_VERSION, CachedIdentity, LocalCache};
pub use gesture::{
    Gesture, GestureKind, GestureTarget, Point, TRASH_RADIUS, Transform, TrashZone, clamp_scale,
};
pub use lease::{Holder, Lease, LeaseSet};
pub use reconcile::{ChatNotice, MergeOutcome, merge_snapshot};

use std::time::{Duration, Instant};

use rand::Rng as _;
use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::countdown::{self, TimeLeft};
use crate::model::{
    ChatMessage, LibraryItem, NoteState, Room, RoomField, RoomPatch, Sticker, StickerKind,
};

#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// How often the embedding UI is expected to call `poll_once`.
    pub poll_interval: Duration,
    /// How long a just-pushed field stays locally authoritative.
    pub push_cooldown: Duration,
    /// A gesture older than this was abandoned (pointer-up lost) and
    /// is dropped by the next poll.
    pub gesture_timeout: Duration,
    pub trash_zone: Option<TrashZone>,
}

impl Default for SyncConfig {
    fn default() -> SyncConfig {
        SyncConfig {
            poll_interval: Duration::from_secs(1),
            push_cooldown: Duration::from_secs(3),
            gesture_timeout: Duration::from_secs(30),
            trash_zone: None,
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum PollOutcome {
    Applied(MergeOutcome),
    /// Poll skipped entirely; a gesture is mid-flight.
    GestureInProgress,
    /// Fetch failed; local state stands and the next tick retries.
    FetchFailed,
}

#[derive(Debug, PartialEq, Eq)]
pub enum GestureEnd {
    Moved(GestureTarget),
    /// The dragged sticker landed in the trash; carries its id.
    Deleted(String),
}

/// One user's live connection to one room.
pub struct SyncClient {
    api: ApiClient,
    config: SyncConfig,
    cache: Option<LocalCache>,
    current_user: String,
    room: Room,
    leases: LeaseSet,
    gesture: Option<Gesture>,
    last_chat_len: usize,
}

impl SyncClient {
    /// Wraps a room snapshot fresh from `create_room` or `join_room`.
    pub fn new(
        api: ApiClient,
        current_user: impl Into<String>,
        room: Room,
        config: SyncConfig,
    ) -> SyncClient {
        let last_chat_len = room.chat_messages.len();
        SyncClient {
            api,
            config,
            cache: None,
            current_user: current_user.into(),
            room,
            leases: LeaseSet::new(),
            gesture: None,
            last_chat_len,
        }
    }

    pub fn with_cache(mut self, cache: LocalCache) -> SyncClient {
        cache.save_room(&self.room);
        self.cache = Some(cache);
        self
    }

    /// Re-enters a room from its cached snapshot, for paint-before-
    /// fetch on revisits. Call `load_room` afterwards to catch up.
    pub fn resume(
        api: ApiClient,
        current_user: impl Into<String>,
        room_id: &str,
        config: SyncConfig,
        cache: LocalCache,
    ) -> Option<SyncClient> {
        let room = cache.load_room(room_id)?;
        Some(SyncClient::new(api, current_user, room, config).with_cache(cache))
    }

    pub fn room(&self) -> &Room {
        &self.room
    }

    pub fn user(&self) -> &str {
        &self.current_user
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn leases(&self) -> &LeaseSet {
        &self.leases
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn gesture(&self) -> Option<&Gesture> {
        self.gesture.as_ref()
    }

    pub fn set_trash_zone(&mut self, zone: Option<TrashZone>) {
        self.config.trash_zone = zone;
    }

    /// Countdown to this room's target, None while the stored target
    /// does not parse.
    pub fn time_left(&self) -> Option<TimeLeft> {
        let target = countdown::parse_target(&self.room.target_iso).ok()?;
        Some(countdown::time_left(target, OffsetDateTime::now_utc()))
    }

    /// Full refetch, adopted unconditionally. First entry into a room
    /// goes through here; later ticks use `poll_once`.
    pub async fn load_room(&mut self) -> Result<(), ClientError> {
        let room = self.api.get_room(&self.room.room_id).await?;
        self.last_chat_len = room.chat_messages.len();
        self.room = room;
        self.save_cache();
        Ok(())
    }

    /// One poll tick: skip while a gesture is live, otherwise fetch
    /// the server snapshot and merge it through the lease gate.
    pub async fn poll_once(&mut self) -> PollOutcome {
        let now = Instant::now();
        if let Some(gesture) = &self.gesture {
            if gesture.age(now) < self.config.gesture_timeout {
                return PollOutcome::GestureInProgress;
            }
            warn!(
                "gesture outlived {:?} without a pointer-up, abandoning",
                self.config.gesture_timeout
            );
            self.abandon_gesture();
        }
        self.leases.purge_expired(now);
        match self.api.get_room(&self.room.room_id).await {
            Ok(incoming) => {
                let outcome = merge_snapshot(
                    &mut self.room,
                    incoming,
                    &self.leases,
                    self.last_chat_len,
                    &self.current_user,
                    now,
                );
                self.last_chat_len = self.room.chat_messages.len();
                if outcome.adopted_any() {
                    self.save_cache();
                }
                PollOutcome::Applied(outcome)
            }
            Err(err) => {
                warn!("poll failed, keeping local state: {err}");
                PollOutcome::FetchFailed
            }
        }
    }

    // ---- local edits, pushed fire-and-forget ----

    pub fn add_sticker(&mut self, src: impl Into<String>, at: Point) -> String {
        let sticker = Sticker {
            id: format!("s-{}", Uuid::now_v7().simple()),
            kind: StickerKind::Image,
            src: src.into(),
            x: at.x,
            y: at.y,
            rotation: rand::rng().random_range(-10.0..=10.0),
            scale: 1.0,
        };
        let id = sticker.id.clone();
        self.room.stickers.push(sticker);
        self.push_stickers();
        id
    }

    pub fn set_todo_items(&mut self, items: Vec<String>) {
        self.room.todo_items = items;
        self.push(RoomPatch {
            todo_items: Some(self.room.todo_items.clone()),
            ..RoomPatch::default()
        });
    }

    pub fn set_photo(&mut self, photo: impl Into<String>) {
        self.room.photo = photo.into();
        self.push(RoomPatch {
            photo: Some(self.room.photo.clone()),
            ..RoomPatch::default()
        });
    }

    pub fn set_quote(&mut self, quote: impl Into<String>) {
        self.room.quote = Some(quote.into());
        self.push(RoomPatch {
            quote: self.room.quote.clone(),
            ..RoomPatch::default()
        });
    }

    pub fn set_music_src(&mut self, src: impl Into<String>) {
        self.room.music_src = Some(src.into());
        self.push(RoomPatch {
            music_src: self.room.music_src.clone(),
            ..RoomPatch::default()
        });
    }

    pub fn set_status_card(&mut self, status: impl Into<String>) {
        self.room.status_card = Some(status.into());
        self.push(RoomPatch {
            status_card: self.room.status_card.clone(),
            ..RoomPatch::default()
        });
    }

    pub fn send_chat(&mut self, text: impl Into<String>) -> ChatMessage {
        let message = ChatMessage {
            id: format!("m-{}", Uuid::now_v7().simple()),
            user: self.current_user.clone(),
            text: text.into(),
            timestamp: countdown::now_rfc3339(),
        };
        self.room.chat_messages.push(message.clone());
        // our own append counts as seen
        self.last_chat_len = self.room.chat_messages.len();
        self.push(RoomPatch {
            chat_messages: Some(self.room.chat_messages.clone()),
            ..RoomPatch::default()
        });
        message
    }

    pub fn add_library_item(&mut self, src: impl Into<String>) -> String {
        let item = LibraryItem {
            id: format!("c-{}", Uuid::now_v7().simple()),
            src: src.into(),
            label: "Custom".to_owned(),
        };
        let id = item.id.clone();
        self.room.custom_library.push(item);
        self.push(RoomPatch {
            custom_library: Some(self.room.custom_library.clone()),
            ..RoomPatch::default()
        });
        id
    }

    pub fn remove_library_item(&mut self, id: &str) -> bool {
        let before = self.room.custom_library.len();
        self.room.custom_library.retain(|item| item.id != id);
        if self.room.custom_library.len() == before {
            return false;
        }
        self.push(RoomPatch {
            custom_library: Some(self.room.custom_library.clone()),
            ..RoomPatch::default()
        });
        true
    }

    /// Resets the canvas locally and on the server. Awaited rather
    /// than fire-and-forget: clearing is destructive enough that the
    /// caller wants to hear about failure.
    pub async fn clear_canvas(&mut self) -> Result<(), ClientError> {
        self.api.clear_canvas(&self.room.room_id).await?;
        self.room.stickers.clear();
        self.room.todo_items.clear();
        self.room.note_state = NoteState::default();
        self.room.photo = crate::model::DEFAULT_PHOTO.to_owned();
        self.room.quote = None;
        self.room.music_src = None;
        self.room.status_card = None;
        let now = Instant::now();
        for field in [
            RoomField::Stickers,
            RoomField::TodoItems,
            RoomField::NoteState,
            RoomField::Photo,
            RoomField::Quote,
            RoomField::MusicSrc,
            RoomField::StatusCard,
        ] {
            self.leases
                .hold_for(field, Holder::PushCooldown, self.config.push_cooldown, now);
        }
        self.save_cache();
        Ok(())
    }

    /// Renames the event and moves the target. Awaited so the details
    /// form can surface validation errors; local state changes only
    /// once the server accepted.
    pub async fn update_details(
        &mut self,
        event_name: impl Into<String>,
        target_iso: impl Into<String>,
    ) -> Result<(), ClientError> {
        let event_name = event_name.into();
        let target_iso = target_iso.into();
        self.api
            .update_details(&self.room.room_id, &event_name, &target_iso)
            .await?;
        self.room.event_name = event_name;
        self.room.target_iso = target_iso;
        let now = Instant::now();
        for field in [RoomField::EventName, RoomField::TargetIso] {
            self.leases
                .hold_for(field, Holder::PushCooldown, self.config.push_cooldown, now);
        }
        self.save_cache();
        Ok(())
    }

    // ---- modal editors ----

    pub fn open_todo_editor(&mut self) {
        self.leases.hold(RoomField::TodoItems, Holder::Editor);
    }

    /// Closing always starts a cooldown: the editor's last push may
    /// still be in flight.
    pub fn close_todo_editor(&mut self) {
        self.leases.release(RoomField::TodoItems);
        self.leases.hold_for(
            RoomField::TodoItems,
            Holder::PushCooldown,
            self.config.push_cooldown,
            Instant::now(),
        );
    }

    pub fn open_details_editor(&mut self) {
        self.leases.hold(RoomField::EventName, Holder::Editor);
        self.leases.hold(RoomField::TargetIso, Holder::Editor);
    }

    pub fn close_details_editor(&mut self) {
        let now = Instant::now();
        for field in [RoomField::EventName, RoomField::TargetIso] {
            self.leases.release(field);
            self.leases
                .hold_for(field, Holder::PushCooldown, self.config.push_cooldown, now);
        }
    }

    // ---- pointer gestures ----

    /// Starts a gesture on the note or a sticker. Returns false if
    /// another gesture is live or the sticker no longer exists.
    pub fn begin_gesture(
        &mut self,
        target: GestureTarget,
        kind: GestureKind,
        pointer: Point,
    ) -> bool {
        if self.gesture.is_some() {
            return false;
        }
        let initial = match &target {
            GestureTarget::Note => Transform::from(&self.room.note_state),
            GestureTarget::Sticker(id) => {
                match self.room.stickers.iter().find(|s| &s.id == id) {
                    Some(sticker) => Transform::from(sticker),
                    None => return false,
                }
            }
        };
        self.leases.hold(lease_field(&target), Holder::Gesture);
        self.gesture = Some(Gesture::begin(kind, target, pointer, initial, Instant::now()));
        true
    }

    /// Feeds a pointer move into the live gesture and mirrors the
    /// resulting transform into local state. Nothing is pushed until
    /// `end_gesture`.
    pub fn gesture_move(&mut self, pointer: Point) -> Option<Transform> {
        let gesture = self.gesture.as_mut()?;
        let transform = gesture.update(pointer, self.config.trash_zone.as_ref());
        let target = gesture.target().clone();
        apply_transform(&mut self.room, &target, transform);
        Some(transform)
    }

    /// Pointer-up: pushes the final state, or deletes the sticker if
    /// it was dropped on the trash.
    pub fn end_gesture(&mut self) -> Option<GestureEnd> {
        let gesture = self.gesture.take()?;
        self.leases.release_holder(Holder::Gesture);
        match (gesture.kind(), gesture.target()) {
            (GestureKind::Drag, GestureTarget::Sticker(id)) if gesture.over_trash() => {
                let id = id.clone();
                self.room.stickers.retain(|s| s.id != id);
                debug!("sticker {id} dropped on the trash");
                self.push_stickers();
                Some(GestureEnd::Deleted(id))
            }
            (_, GestureTarget::Note) => {
                self.push(RoomPatch {
                    note_state: Some(self.room.note_state),
                    ..RoomPatch::default()
                });
                Some(GestureEnd::Moved(GestureTarget::Note))
            }
            (_, GestureTarget::Sticker(_)) => {
                let target = gesture.target().clone();
                self.push_stickers();
                Some(GestureEnd::Moved(target))
            }
        }
    }

    /// Drops the live gesture and rolls its object back to the
    /// captured start state. Nothing is pushed.
    pub fn abandon_gesture(&mut self) {
        if let Some(gesture) = self.gesture.take() {
            let target = gesture.target().clone();
            apply_transform(&mut self.room, &target, gesture.initial());
            self.leases.release_holder(Holder::Gesture);
        }
    }

    fn push_stickers(&mut self) {
        self.push(RoomPatch {
            stickers: Some(self.room.stickers.clone()),
            ..RoomPatch::default()
        });
    }

    /// Queues the patch for delivery and cools down its fields. The
    /// send itself happens on a spawned task so canvas interactions
    /// never wait on the network.
    fn push(&mut self, patch: RoomPatch) {
        let now = Instant::now();
        for field in patch.fields() {
            self.leases
                .hold_for(field, Holder::PushCooldown, self.config.push_cooldown, now);
        }
        self.save_cache();
        let api = self.api.clone();
        let room_id = self.room.room_id.clone();
        tokio::spawn(async move {
            if let Err(err) = api.sync_room(&room_id, &patch).await {
                warn!("push for {room_id} failed: {err}");
            }
        });
    }

    fn save_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.save_room(&self.room);
        }
    }
}

fn lease_field(target: &GestureTarget) -> RoomField {
    match target {
        GestureTarget::Note => RoomField::NoteState,
        GestureTarget::Sticker(_) => RoomField::Stickers,
    }
}

fn apply_transform(room: &mut Room, target: &GestureTarget, t: Transform) {
    match target {
        GestureTarget::Note => room.note_state = NoteState::from(t),
        GestureTarget::Sticker(id) => {
            if let Some(sticker) = room.stickers.iter_mut().find(|s| &s.id == id) {
                sticker.x = t.x;
                sticker.y = t.y;
                sticker.rotation = t.rotation;
                sticker.scale = t.scale;
            }
        }
    }
}
