use serde::{Deserialize, Serialize};

pub const DEFAULT_EVENT_NAME: &str = "Us";
pub const DEFAULT_PHOTO: &str = "us.png";

pub const MIN_STICKER_SCALE: f64 = 0.5;
pub const MAX_STICKER_SCALE: f64 = 3.0;

/// A room field that polls may adopt and pushes may replace. `SYNCABLE`
/// is the exact set `SYNC_ROOM` accepts; identity fields (`roomId`,
/// `pin`, `creatorId`, `members`) are deliberately not represented here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomField {
    Stickers,
    TodoItems,
    NoteState,
    Photo,
    CustomLibrary,
    ChatMessages,
    Quote,
    MusicSrc,
    StatusCard,
    EventName,
    TargetIso,
}

impl RoomField {
    pub const SYNCABLE: [RoomField; 9] = [
        RoomField::Stickers,
        RoomField::TodoItems,
        RoomField::NoteState,
        RoomField::Photo,
        RoomField::CustomLibrary,
        RoomField::ChatMessages,
        RoomField::Quote,
        RoomField::MusicSrc,
        RoomField::StatusCard,
    ];

    pub fn wire_name(self) -> &'static str {
        match self {
            RoomField::Stickers => "stickers",
            RoomField::TodoItems => "todoItems",
            RoomField::NoteState => "noteState",
            RoomField::Photo => "photo",
            RoomField::CustomLibrary => "customLibrary",
            RoomField::ChatMessages => "chatMessages",
            RoomField::Quote => "quote",
            RoomField::MusicSrc => "musicSrc",
            RoomField::StatusCard => "statusCard",
            RoomField::EventName => "eventName",
            RoomField::TargetIso => "targetISO",
        }
    }

    pub fn from_wire(name: &str) -> Option<RoomField> {
        match name {
            "stickers" => Some(RoomField::Stickers),
            "todoItems" => Some(RoomField::TodoItems),
            "noteState" => Some(RoomField::NoteState),
            "photo" => Some(RoomField::Photo),
            "customLibrary" => Some(RoomField::CustomLibrary),
            "chatMessages" => Some(RoomField::ChatMessages),
            "quote" => Some(RoomField::Quote),
            "musicSrc" => Some(RoomField::MusicSrc),
            "statusCard" => Some(RoomField::StatusCard),
            "eventName" => Some(RoomField::EventName),
            "targetISO" => Some(RoomField::TargetIso),
            _ => None,
        }
    }

    pub fn is_syncable(self) -> bool {
        Self::SYNCABLE.contains(&self)
    }

    /// JSON1 path of the field inside the stored room document.
    pub fn json_path(self) -> &'static str {
        match self {
            RoomField::Stickers => "$.stickers",
            RoomField::TodoItems => "$.todoItems",
            RoomField::NoteState => "$.noteState",
            RoomField::Photo => "$.photo",
            RoomField::CustomLibrary => "$.customLibrary",
            RoomField::ChatMessages => "$.chatMessages",
            RoomField::Quote => "$.quote",
            RoomField::MusicSrc => "$.musicSrc",
            RoomField::StatusCard => "$.statusCard",
            RoomField::EventName => "$.eventName",
            RoomField::TargetIso => "$.targetISO",
        }
    }
}

/// Placement of the anniversary note on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteState {
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
    pub scale: f64,
}

impl Default for NoteState {
    fn default() -> Self {
        NoteState {
            x: 0.0,
            y: 0.0,
            rotation: -2.0,
            scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StickerKind {
    Image,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sticker {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: StickerKind,
    pub src: String,
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
    pub scale: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryItem {
    pub id: String,
    pub src: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub user: String,
    pub text: String,
    pub timestamp: String,
}

/// The full room document, stored as one JSON value per room and sent
/// whole over the wire. Everything except the identity fields has a
/// default so documents written by older revisions still deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub room_id: String,
    pub pin: String,
    #[serde(default = "default_event_name")]
    pub event_name: String,
    #[serde(rename = "targetISO")]
    pub target_iso: String,
    pub creator_id: String,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub stickers: Vec<Sticker>,
    #[serde(default)]
    pub todo_items: Vec<String>,
    #[serde(default)]
    pub note_state: NoteState,
    #[serde(default = "default_photo")]
    pub photo: String,
    #[serde(default)]
    pub custom_library: Vec<LibraryItem>,
    #[serde(default)]
    pub chat_messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music_src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_card: Option<String>,
}

fn default_event_name() -> String {
    DEFAULT_EVENT_NAME.to_owned()
}

fn default_photo() -> String {
    DEFAULT_PHOTO.to_owned()
}

impl Room {
    pub fn new(room_id: String, pin: String, target_iso: String, creator_id: String) -> Room {
        Room {
            room_id,
            pin,
            event_name: default_event_name(),
            target_iso,
            creator_id,
            members: Vec::new(),
            stickers: Vec::new(),
            todo_items: Vec::new(),
            note_state: NoteState::default(),
            photo: default_photo(),
            custom_library: Vec::new(),
            chat_messages: Vec::new(),
            quote: None,
            music_src: None,
            status_card: None,
        }
    }
}

/// A partial room update, exactly the shape `SYNC_ROOM` carries in its
/// `updates` map. Absent fields are left untouched on the server;
/// present fields replace the stored value wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stickers: Option<Vec<Sticker>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub todo_items: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note_state: Option<NoteState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_library: Option<Vec<LibraryItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_messages: Option<Vec<ChatMessage>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub music_src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_card: Option<String>,
}

impl RoomPatch {
    /// The fields this patch sets, in wire order.
    pub fn fields(&self) -> Vec<RoomField> {
        let mut out = Vec::new();
        if self.stickers.is_some() {
            out.push(RoomField::Stickers);
        }
        if self.todo_items.is_some() {
            out.push(RoomField::TodoItems);
        }
        if self.note_state.is_some() {
            out.push(RoomField::NoteState);
        }
        if self.photo.is_some() {
            out.push(RoomField::Photo);
        }
        if self.custom_library.is_some() {
            out.push(RoomField::CustomLibrary);
        }
        if self.chat_messages.is_some() {
            out.push(RoomField::ChatMessages);
        }
        if self.quote.is_some() {
            out.push(RoomField::Quote);
        }
        if self.music_src.is_some() {
            out.push(RoomField::MusicSrc);
        }
        if self.status_card.is_some() {
            out.push(RoomField::StatusCard);
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }
}
