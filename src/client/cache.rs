use std::fs;
use std::io;
use std::path::PathBuf;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::Room;

/// Bumped whenever the cached layout changes shape; older files are
/// ignored rather than migrated.
pub const CACHE_VERSION: u32 = 1;

const IDENTITY_FILE: &str = "identity.json";

#[derive(Deserialize)]
struct Envelope {
    version: u32,
    room: Room,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedIdentity {
    pub user_id: String,
    pub username: String,
}

/// Per-room snapshots plus the signed-in identity, kept on disk so a
/// revisited room paints before its first fetch answers. Everything is
/// best effort: a failed write costs the next visit its instant paint,
/// nothing more.
#[derive(Debug, Clone)]
pub struct LocalCache {
    dir: PathBuf,
}

impl LocalCache {
    pub fn new(dir: impl Into<PathBuf>) -> LocalCache {
        LocalCache { dir: dir.into() }
    }

    // Room ids are user input, so the filename is their base64 form.
    fn room_path(&self, room_id: &str) -> PathBuf {
        let name = URL_SAFE_NO_PAD.encode(room_id.as_bytes());
        self.dir.join(format!("room-{name}.json"))
    }

    pub fn load_room(&self, room_id: &str) -> Option<Room> {
        let raw = fs::read_to_string(self.room_path(room_id)).ok()?;
        let envelope: Envelope = serde_json::from_str(&raw).ok()?;
        (envelope.version == CACHE_VERSION).then_some(envelope.room)
    }

    pub fn save_room(&self, room: &Room) {
        if let Err(err) = self.write_room(room) {
            warn!("failed to cache room {}: {err}", room.room_id);
        }
    }

    fn write_room(&self, room: &Room) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let body = serde_json::json!({ "version": CACHE_VERSION, "room": room });
        fs::write(self.room_path(&room.room_id), body.to_string())
    }

    pub fn clear_room(&self, room_id: &str) {
        let _ = fs::remove_file(self.room_path(room_id));
    }

    pub fn load_identity(&self) -> Option<CachedIdentity> {
        let raw = fs::read_to_string(self.dir.join(IDENTITY_FILE)).ok()?;
        serde_json::from_str(&raw).ok()
    }

    pub fn save_identity(&self, identity: &CachedIdentity) {
        if let Err(err) = self.write_identity(identity) {
            warn!("failed to cache identity: {err}");
        }
    }

    fn write_identity(&self, identity: &CachedIdentity) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let body = serde_json::to_string(identity).map_err(io::Error::other)?;
        fs::write(self.dir.join(IDENTITY_FILE), body)
    }

    pub fn clear_identity(&self) {
        let _ = fs::remove_file(self.dir.join(IDENTITY_FILE));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_room(room_id: &str) -> Room {
        Room::new(
            room_id.into(),
            "4242".into(),
            "2025-07-01T00:00:00Z".into(),
            "ada".into(),
        )
    }

    #[test]
    fn rooms_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path());
        let mut room = sample_room("trip2025");
        room.todo_items.push("pack bags".into());

        cache.save_room(&room);
        assert_eq!(cache.load_room("trip2025"), Some(room));
        assert_eq!(cache.load_room("elsewhere"), None);

        cache.clear_room("trip2025");
        assert_eq!(cache.load_room("trip2025"), None);
    }

    #[test]
    fn awkward_room_ids_get_safe_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path());
        cache.save_room(&sample_room("week/end café"));
        cache.save_room(&sample_room("week end café"));
        assert_eq!(
            cache.load_room("week/end café").unwrap().room_id,
            "week/end café"
        );
        assert_eq!(
            cache.load_room("week end café").unwrap().room_id,
            "week end café"
        );
    }

    #[test]
    fn unknown_versions_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path());
        cache.save_room(&sample_room("trip2025"));

        let path = cache.room_path("trip2025");
        let doctored = fs::read_to_string(&path)
            .unwrap()
            .replacen("\"version\":1", "\"version\":999", 1);
        fs::write(&path, doctored).unwrap();

        assert_eq!(cache.load_room("trip2025"), None);
    }

    #[test]
    fn garbage_files_read_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path());
        fs::create_dir_all(dir.path()).unwrap();
        fs::write(cache.room_path("trip2025"), "not json at all").unwrap();
        assert_eq!(cache.load_room("trip2025"), None);
    }

    #[test]
    fn identity_round_trips_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path());
        assert_eq!(cache.load_identity(), None);

        let identity = CachedIdentity {
            user_id: "u-1".into(),
            username: "ada".into(),
        };
        cache.save_identity(&identity);
        assert_eq!(cache.load_identity(), Some(identity));

        cache.clear_identity();
        assert_eq!(cache.load_identity(), None);
    }
}
