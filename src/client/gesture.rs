use std::time::{Duration, Instant};

use crate::model::{MAX_STICKER_SCALE, MIN_STICKER_SCALE, NoteState, Sticker};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Point {
        Point { x, y }
    }

    fn distance_to(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Screen-coordinate angle of `other` around `self`, degrees.
    fn angle_to(self, other: Point) -> f64 {
        (other.y - self.y).atan2(other.x - self.x).to_degrees()
    }
}

/// Canvas placement of a movable object, shared by stickers and the
/// note.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
    pub scale: f64,
}

impl From<&Sticker> for Transform {
    fn from(sticker: &Sticker) -> Transform {
        Transform {
            x: sticker.x,
            y: sticker.y,
            rotation: sticker.rotation,
            scale: sticker.scale,
        }
    }
}

impl From<&NoteState> for Transform {
    fn from(note: &NoteState) -> Transform {
        Transform {
            x: note.x,
            y: note.y,
            rotation: note.rotation,
            scale: note.scale,
        }
    }
}

impl From<Transform> for NoteState {
    fn from(t: Transform) -> NoteState {
        NoteState {
            x: t.x,
            y: t.y,
            rotation: t.rotation,
            scale: t.scale,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Drag,
    Resize,
    Rotate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureTarget {
    Sticker(String),
    Note,
}

/// The circular delete target. Dropping a dragged sticker inside it
/// removes the sticker; the note is immune.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrashZone {
    pub center: Point,
    pub radius: f64,
}

pub const TRASH_RADIUS: f64 = 80.0;

impl TrashZone {
    pub fn new(center: Point) -> TrashZone {
        TrashZone {
            center,
            radius: TRASH_RADIUS,
        }
    }

    pub fn contains(&self, point: Point) -> bool {
        self.center.distance_to(point) <= self.radius
    }
}

pub fn clamp_scale(raw: f64) -> f64 {
    raw.clamp(MIN_STICKER_SCALE, MAX_STICKER_SCALE)
}

/// One pointer interaction from pointer-down to pointer-up. Every
/// update recomputes the transform from the captured start state, so
/// out-of-order or repeated move events cannot accumulate drift.
#[derive(Debug, Clone)]
pub struct Gesture {
    kind: GestureKind,
    target: GestureTarget,
    start_pointer: Point,
    initial: Transform,
    started_at: Instant,
    over_trash: bool,
}

impl Gesture {
    pub fn begin(
        kind: GestureKind,
        target: GestureTarget,
        pointer: Point,
        initial: Transform,
        now: Instant,
    ) -> Gesture {
        Gesture {
            kind,
            target,
            start_pointer: pointer,
            initial,
            started_at: now,
            over_trash: false,
        }
    }

    pub fn kind(&self) -> GestureKind {
        self.kind
    }

    pub fn target(&self) -> &GestureTarget {
        &self.target
    }

    pub fn initial(&self) -> Transform {
        self.initial
    }

    /// True while a dragged sticker hovers the trash zone.
    pub fn over_trash(&self) -> bool {
        self.over_trash
    }

    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started_at)
    }

    /// Folds a pointer move into the gesture and returns the resulting
    /// transform. Resize scales by the ratio of pointer-to-center
    /// distances; rotate adds the angle swept around the center.
    pub fn update(&mut self, pointer: Point, trash: Option<&TrashZone>) -> Transform {
        match self.kind {
            GestureKind::Drag => {
                let moved = Transform {
                    x: self.initial.x + (pointer.x - self.start_pointer.x),
                    y: self.initial.y + (pointer.y - self.start_pointer.y),
                    ..self.initial
                };
                self.over_trash = matches!(self.target, GestureTarget::Sticker(_))
                    && trash.is_some_and(|zone| zone.contains(pointer));
                moved
            }
            GestureKind::Resize => {
                let center = Point::new(self.initial.x, self.initial.y);
                let start_dist = self.start_pointer.distance_to(center).max(f64::EPSILON);
                let ratio = pointer.distance_to(center) / start_dist;
                Transform {
                    scale: clamp_scale(self.initial.scale * ratio),
                    ..self.initial
                }
            }
            GestureKind::Rotate => {
                let center = Point::new(self.initial.x, self.initial.y);
                let swept = center.angle_to(pointer) - center.angle_to(self.start_pointer);
                Transform {
                    rotation: self.initial.rotation + swept,
                    ..self.initial
                }
            }
        }
    }
}
