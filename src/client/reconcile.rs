use std::time::Instant;

use crate::model::{Room, RoomField};

use super::lease::LeaseSet;

/// Raised when a merge adopts a chat log whose newest message was
/// written by someone else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatNotice {
    pub user: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
    pub adopted: Vec<RoomField>,
    pub held: Vec<RoomField>,
    pub notice: Option<ChatNotice>,
}

impl MergeOutcome {
    pub fn adopted_any(&self) -> bool {
        !self.adopted.is_empty()
    }
}

fn gate(field: RoomField, leases: &LeaseSet, now: Instant, outcome: &mut MergeOutcome) -> bool {
    if leases.is_held(field, now) {
        outcome.held.push(field);
        false
    } else {
        outcome.adopted.push(field);
        true
    }
}

/// Folds a fetched snapshot into the local room. Unheld fields adopt
/// the server value wholesale; held fields keep the local value for
/// this poll and will adopt on a later one. Chat is special: it only
/// ever grows, and a snapshot that does not grow it is ignored, so a
/// stale read can never swallow messages.
pub fn merge_snapshot(
    local: &mut Room,
    incoming: Room,
    leases: &LeaseSet,
    last_chat_len: usize,
    current_user: &str,
    now: Instant,
) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();

    // Identity rides along unconditionally. Members only ever grow
    // (rooms are never left), so adopting is always safe.
    local.pin = incoming.pin;
    local.creator_id = incoming.creator_id;
    local.members = incoming.members;

    if gate(RoomField::Stickers, leases, now, &mut outcome) {
        local.stickers = incoming.stickers;
    }
    if gate(RoomField::TodoItems, leases, now, &mut outcome) {
        local.todo_items = incoming.todo_items;
    }
    if gate(RoomField::NoteState, leases, now, &mut outcome) {
        local.note_state = incoming.note_state;
    }
    if gate(RoomField::Photo, leases, now, &mut outcome) {
        local.photo = incoming.photo;
    }
    if gate(RoomField::CustomLibrary, leases, now, &mut outcome) {
        local.custom_library = incoming.custom_library;
    }
    if gate(RoomField::Quote, leases, now, &mut outcome) {
        local.quote = incoming.quote;
    }
    if gate(RoomField::MusicSrc, leases, now, &mut outcome) {
        local.music_src = incoming.music_src;
    }
    if gate(RoomField::StatusCard, leases, now, &mut outcome) {
        local.status_card = incoming.status_card;
    }
    if gate(RoomField::EventName, leases, now, &mut outcome) {
        local.event_name = incoming.event_name;
    }
    if gate(RoomField::TargetIso, leases, now, &mut outcome) {
        local.target_iso = incoming.target_iso;
    }

    if incoming.chat_messages.len() > last_chat_len {
        outcome.notice = incoming
            .chat_messages
            .last()
            .filter(|message| message.user != current_user)
            .map(|message| ChatNotice {
                user: message.user.clone(),
                text: message.text.clone(),
            });
        local.chat_messages = incoming.chat_messages;
        outcome.adopted.push(RoomField::ChatMessages);
    }

    outcome
}
