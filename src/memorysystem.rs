//! Persistence of the swarm state into host memory segments.
//!
//! The snapshot is JSON, gzipped and base64 encoded, then split across
//! `SNAPSHOT_SEGMENTS`. Loading is forgiving: a room that fails to parse is
//! replaced by a fresh record and the rest of the snapshot is kept.

use crate::operations::overmind::StrategicState;
use crate::posture::data::Directives;
use crate::room::data::*;
use crate::serialize::*;
use itertools::*;
use log::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

pub const SNAPSHOT_VERSION: u32 = 1;

pub const SNAPSHOT_SEGMENTS: &[u32] = &[50, 51, 52];

pub const SEGMENT_SIZE: usize = 50 * 1024;

/// Host memory segments. Segments that were never written read as `None`.
pub trait SegmentStorage {
    fn get(&self, segment: u32) -> Option<String>;

    fn set(&mut self, segment: u32, data: &str);
}

/// Segment storage kept in process, for tests and headless hosts.
#[derive(Clone, Debug, Default)]
pub struct InMemorySegments {
    segments: HashMap<u32, String>,
}

impl InMemorySegments {
    pub fn new() -> InMemorySegments {
        Self::default()
    }
}

impl SegmentStorage for InMemorySegments {
    fn get(&self, segment: u32) -> Option<String> {
        self.segments.get(&segment).cloned()
    }

    fn set(&mut self, segment: u32, data: &str) {
        if data.len() > SEGMENT_SIZE {
            error!("Memory segment too large - Segment: {} - Length: {}", segment, data.len());
        }

        self.segments.insert(segment, data.to_owned());
    }
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to encode snapshot: {0}")]
    Encode(String),
    #[error("failed to decode snapshot: {0}")]
    Decode(String),
    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot version {found} is not supported (expected {expected})")]
    Version { found: u32, expected: u32 },
    #[error("snapshot needs {needed} bytes but only {available} are available")]
    TooLarge { needed: usize, available: usize },
}

/// Everything that survives between ticks.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SwarmSnapshot {
    pub tick: u32,
    pub rooms: Vec<RoomRecord>,
    pub strategic: StrategicState,
    pub directives: Directives,
}

#[derive(Serialize)]
struct SnapshotOut<'a> {
    version: u32,
    tick: u32,
    rooms: BTreeMap<RoomName, &'a RoomRecord>,
    strategic: &'a StrategicState,
    directives: &'a Directives,
}

#[derive(Deserialize)]
struct SnapshotIn {
    version: u32,
    #[serde(default)]
    tick: u32,
    #[serde(default)]
    rooms: BTreeMap<String, Value>,
    #[serde(default)]
    strategic: Value,
    #[serde(default)]
    directives: Value,
}

fn section_or_default<T>(name: &str, value: Value) -> T
where
    T: Default + for<'de> Deserialize<'de>,
{
    if value.is_null() {
        return T::default();
    }

    serde_json::from_value(value).unwrap_or_else(|err| {
        warn!("Discarding malformed snapshot section - Section: {} - Error: {}", name, err);

        T::default()
    })
}

/// Parse one persisted room. The map key is authoritative for the name.
fn load_room(name: RoomName, mut value: Value) -> RoomRecord {
    if let Value::Object(fields) = &mut value {
        fields.insert("name".to_owned(), Value::String(name.to_string()));
    }

    match serde_json::from_value::<RoomRecord>(value) {
        Ok(record) => record,
        Err(err) => {
            warn!("Discarding malformed room state - Room: {} - Error: {}", name, err);

            RoomRecord::new(name)
        }
    }
}

impl SwarmSnapshot {
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        let out = SnapshotOut {
            version: SNAPSHOT_VERSION,
            tick: self.tick,
            rooms: self.rooms.iter().map(|record| (record.name, record)).collect(),
            strategic: &self.strategic,
            directives: &self.directives,
        };

        Ok(serde_json::to_string(&out)?)
    }

    pub fn from_json(data: &str) -> Result<SwarmSnapshot, SnapshotError> {
        let raw: SnapshotIn = serde_json::from_str(data)?;

        if raw.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::Version {
                found: raw.version,
                expected: SNAPSHOT_VERSION,
            });
        }

        let mut rooms: Vec<RoomRecord> = raw
            .rooms
            .into_iter()
            .filter_map(|(key, value)| match key.parse::<RoomName>() {
                Ok(name) => Some(load_room(name, value)),
                Err(err) => {
                    warn!("Discarding room state with invalid name - Error: {}", err);
                    None
                }
            })
            .collect();

        rooms.sort_by_key(|record| record.name);

        Ok(SwarmSnapshot {
            tick: raw.tick,
            rooms,
            strategic: section_or_default("strategic", raw.strategic),
            directives: section_or_default("directives", raw.directives),
        })
    }
}

// ─── Segment chunking ────────────────────────────────────────────────────────

pub fn save_snapshot(storage: &mut dyn SegmentStorage, snapshot: &SwarmSnapshot) -> Result<(), SnapshotError> {
    let json = snapshot.to_json()?;

    let encoded_data = encode_buffer_to_string(json.as_bytes()).map_err(SnapshotError::Encode)?;

    let available = SNAPSHOT_SEGMENTS.len() * SEGMENT_SIZE;

    if encoded_data.len() > available {
        return Err(SnapshotError::TooLarge {
            needed: encoded_data.len(),
            available,
        });
    }

    let mut segments = SNAPSHOT_SEGMENTS.iter();

    // Base64 output is ASCII so byte chunks are always valid strings.
    for chunk in encoded_data.as_bytes().chunks(SEGMENT_SIZE) {
        if let Some(segment) = segments.next() {
            let chunk_str = String::from_utf8_lossy(chunk);

            storage.set(*segment, &chunk_str);
        }
    }

    for segment in segments {
        storage.set(*segment, "");
    }

    Ok(())
}

/// Read the snapshot back. `Ok(None)` means nothing has been saved yet.
pub fn load_snapshot(storage: &dyn SegmentStorage) -> Result<Option<SwarmSnapshot>, SnapshotError> {
    let encoded_data = SNAPSHOT_SEGMENTS.iter().filter_map(|segment| storage.get(*segment)).join("");

    if encoded_data.is_empty() {
        return Ok(None);
    }

    let decoded_data = decode_buffer_from_string(&encoded_data).map_err(SnapshotError::Decode)?;

    let json = String::from_utf8(decoded_data).map_err(|e| SnapshotError::Decode(e.to_string()))?;

    SwarmSnapshot::from_json(&json).map(Some)
}

pub fn clear_snapshot(storage: &mut dyn SegmentStorage) {
    for segment in SNAPSHOT_SEGMENTS.iter() {
        storage.set(*segment, "");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::military::threatmap::DangerLevel;
    use crate::posture::data::Posture;

    fn snapshot() -> SwarmSnapshot {
        let mut record = RoomRecord::new("W1N1".parse().unwrap());
        record.danger = DangerLevel::High;
        record.posture = Posture::War;
        record.events.push(EventTag::DangerRaised, 12);

        SwarmSnapshot {
            tick: 12,
            rooms: vec![record],
            strategic: StrategicState {
                war_targets: vec!["W1N1".parse().unwrap()],
                last_rebuilt: Some(12),
                ..Default::default()
            },
            directives: Directives::default(),
        }
    }

    #[test]
    fn empty_storage_has_no_snapshot() {
        let storage = InMemorySegments::new();

        assert!(load_snapshot(&storage).unwrap().is_none());
    }

    #[test]
    fn saved_snapshot_loads_back() {
        let mut storage = InMemorySegments::new();
        let original = snapshot();

        save_snapshot(&mut storage, &original).unwrap();

        assert_eq!(load_snapshot(&storage).unwrap(), Some(original));
    }

    #[test]
    fn malformed_room_becomes_default_record() {
        let json = r#"{
            "version": 1,
            "tick": 4,
            "rooms": {
                "W1N1": {"name": "W1N1", "danger": "very"},
                "W2N1": {"name": "W2N1", "danger": 2}
            }
        }"#;

        let loaded = SwarmSnapshot::from_json(json).unwrap();

        let find = |name: &str| loaded.rooms.iter().find(|record| record.name.to_string() == name).cloned();

        assert_eq!(loaded.rooms.len(), 2);
        assert_eq!(find("W1N1"), Some(RoomRecord::new("W1N1".parse().unwrap())));
        assert_eq!(find("W2N1").map(|record| record.danger), Some(DangerLevel::High));
        assert_eq!(loaded.strategic, StrategicState::default());
    }

    #[test]
    fn room_key_wins_over_stored_name() {
        let json = r#"{"version": 1, "rooms": {"E3S4": {"name": "W1N1"}}}"#;

        let loaded = SwarmSnapshot::from_json(json).unwrap();

        assert_eq!(loaded.rooms[0].name.to_string(), "E3S4");
    }

    #[test]
    fn room_without_stored_name_keeps_its_state() {
        let json = r#"{"version": 1, "rooms": {"W1N1": {"danger": 2, "ownership": "hostile", "controllerLevel": 7}}}"#;

        let loaded = SwarmSnapshot::from_json(json).unwrap();
        let record = &loaded.rooms[0];

        assert_eq!(record.name.to_string(), "W1N1");
        assert_eq!(record.danger, DangerLevel::High);
        assert_eq!(record.ownership, RoomOwnership::Hostile);
        assert_eq!(record.controller_level, 7);
    }

    #[test]
    fn other_versions_are_rejected() {
        let result = SwarmSnapshot::from_json(r#"{"version": 99}"#);

        assert!(matches!(result, Err(SnapshotError::Version { found: 99, .. })));
    }

    #[test]
    fn unused_segments_are_cleared() {
        let mut storage = InMemorySegments::new();
        storage.set(52, "stale");

        save_snapshot(&mut storage, &snapshot()).unwrap();

        assert_eq!(storage.get(52), Some(String::new()));
        assert!(load_snapshot(&storage).unwrap().is_some());
    }
}
