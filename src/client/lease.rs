use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::model::RoomField;

/// Who is keeping a field out of reach of incoming snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Holder {
    /// A pointer gesture is mid-flight on the field's object.
    Gesture,
    /// A modal editor over the field is open.
    Editor,
    /// The field was just pushed; remote reads may still be stale.
    PushCooldown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lease {
    pub holder: Holder,
    /// None holds until an explicit `release`.
    pub held_until: Option<Instant>,
}

impl Lease {
    pub fn is_expired(&self, now: Instant) -> bool {
        self.held_until.is_some_and(|until| until <= now)
    }
}

/// Per-field leases. A held field is locally authoritative: the merge
/// skips it instead of adopting the server's value. Everything here is
/// time-boxed or explicitly released, so no lease outlives its cause.
#[derive(Debug, Default)]
pub struct LeaseSet {
    leases: HashMap<RoomField, Lease>,
}

impl LeaseSet {
    pub fn new() -> LeaseSet {
        LeaseSet::default()
    }

    /// Holds the field until `release`, replacing any timed lease.
    pub fn hold(&mut self, field: RoomField, holder: Holder) {
        self.leases.insert(
            field,
            Lease {
                holder,
                held_until: None,
            },
        );
    }

    /// Holds the field until `now + ttl`. A live lease that is
    /// open-ended or expires later is left alone, so a push cooldown
    /// never shortens an open editor's hold.
    pub fn hold_for(&mut self, field: RoomField, holder: Holder, ttl: Duration, now: Instant) {
        let until = now + ttl;
        if let Some(existing) = self.leases.get(&field) {
            if !existing.is_expired(now) {
                match existing.held_until {
                    None => return,
                    Some(t) if t >= until => return,
                    Some(_) => {}
                }
            }
        }
        self.leases.insert(
            field,
            Lease {
                holder,
                held_until: Some(until),
            },
        );
    }

    pub fn release(&mut self, field: RoomField) {
        self.leases.remove(&field);
    }

    pub fn release_holder(&mut self, holder: Holder) {
        self.leases.retain(|_, lease| lease.holder != holder);
    }

    pub fn is_held(&self, field: RoomField, now: Instant) -> bool {
        self.leases
            .get(&field)
            .is_some_and(|lease| !lease.is_expired(now))
    }

    pub fn holder(&self, field: RoomField, now: Instant) -> Option<Holder> {
        self.leases
            .get(&field)
            .filter(|lease| !lease.is_expired(now))
            .map(|lease| lease.holder)
    }

    pub fn purge_expired(&mut self, now: Instant) {
        self.leases.retain(|_, lease| !lease.is_expired(now));
    }
}
