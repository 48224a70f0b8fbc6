use crate::military::threatmap::DangerLevel;
use crate::posture::data::Posture;
use crate::signals::field::SignalVector;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use specs::prelude::*;
use specs::Component;
use std::collections::VecDeque;
use std::convert::TryFrom;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

// ─── Room names ──────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid room name: {0}")]
pub struct RoomNameParseError(pub String);

/// Largest coordinate accepted on either axis of a room name.
pub const MAX_ROOM_COORD: u32 = 255;

/// World coordinate room name. `E0`/`S0` map to 0 and `W0`/`N0` map to -1 so
/// that adjacent rooms always differ by exactly one on an axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomName {
    x: i32,
    y: i32,
}

impl RoomName {
    pub fn from_coords(x: i32, y: i32) -> RoomName {
        RoomName { x, y }
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    /// The four rooms sharing an exit with this room.
    pub fn neighbors(&self) -> [RoomName; 4] {
        [
            RoomName::from_coords(self.x, self.y.saturating_sub(1)),
            RoomName::from_coords(self.x.saturating_add(1), self.y),
            RoomName::from_coords(self.x, self.y.saturating_add(1)),
            RoomName::from_coords(self.x.saturating_sub(1), self.y),
        ]
    }

    /// Room distance ignoring terrain, counting diagonal steps as one.
    pub fn linear_distance(&self, other: &RoomName) -> u32 {
        let dx = (i64::from(self.x) - i64::from(other.x)).unsigned_abs();
        let dy = (i64::from(self.y) - i64::from(other.y)).unsigned_abs();

        u32::try_from(dx.max(dy)).unwrap_or(u32::MAX)
    }
}

impl Display for RoomName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.x >= 0 {
            write!(f, "E{}", self.x)?;
        } else {
            write!(f, "W{}", -i64::from(self.x) - 1)?;
        }

        if self.y >= 0 {
            write!(f, "S{}", self.y)
        } else {
            write!(f, "N{}", -i64::from(self.y) - 1)
        }
    }
}

impl FromStr for RoomName {
    type Err = RoomNameParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let error = || RoomNameParseError(value.to_string());

        let upper = value.trim().to_ascii_uppercase();
        let bytes = upper.as_bytes();

        let split = bytes
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, c)| **c == b'N' || **c == b'S')
            .map(|(index, _)| index)
            .ok_or_else(error)?;

        let (horizontal, vertical) = upper.split_at(split);

        let parse_axis = |axis: &str, positive: char, negative: char| -> Option<i32> {
            let mut chars = axis.chars();
            let direction = chars.next()?;
            let digits = chars.as_str();

            if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }

            let magnitude: u32 = digits.parse().ok()?;

            if magnitude > MAX_ROOM_COORD {
                return None;
            }

            let magnitude = magnitude as i32;

            if direction == positive {
                Some(magnitude)
            } else if direction == negative {
                Some(-magnitude - 1)
            } else {
                None
            }
        };

        let x = parse_axis(horizontal, 'E', 'W').ok_or_else(error)?;
        let y = parse_axis(vertical, 'S', 'N').ok_or_else(error)?;

        Ok(RoomName { x, y })
    }
}

impl TryFrom<String> for RoomName {
    type Error = RoomNameParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RoomName> for String {
    fn from(value: RoomName) -> String {
        value.to_string()
    }
}

// ─── Ownership and maturity ──────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoomOwnership {
    #[default]
    Unknown,
    Neutral,
    Mine,
    Friendly,
    Hostile,
}

impl RoomOwnership {
    pub fn mine(&self) -> bool {
        matches!(self, RoomOwnership::Mine)
    }

    pub fn hostile(&self) -> bool {
        matches!(self, RoomOwnership::Hostile)
    }

    /// Rooms nobody holds, the only ones a claim can target.
    pub fn claimable(&self) -> bool {
        matches!(self, RoomOwnership::Neutral | RoomOwnership::Unknown)
    }
}

impl Display for RoomOwnership {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoomOwnership::Unknown => write!(f, "Unknown"),
            RoomOwnership::Neutral => write!(f, "Neutral"),
            RoomOwnership::Mine => write!(f, "Mine"),
            RoomOwnership::Friendly => write!(f, "Friendly"),
            RoomOwnership::Hostile => write!(f, "Hostile"),
        }
    }
}

/// Colony maturity, ordered from youngest to most developed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColonyLevel {
    SeedNest,
    Foraging,
    Mature,
    Fortified,
}

impl ColonyLevel {
    pub fn from_controller_level(level: u8) -> ColonyLevel {
        match level {
            0..=3 => ColonyLevel::SeedNest,
            4..=5 => ColonyLevel::Foraging,
            6..=7 => ColonyLevel::Mature,
            _ => ColonyLevel::Fortified,
        }
    }

    pub fn ordinal(&self) -> u8 {
        *self as u8
    }
}

// ─── Structures ──────────────────────────────────────────────────────────────

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct StructureFlags: u16 {
        const SPAWN = 1 << 0;
        const TOWER = 1 << 1;
        const STORAGE = 1 << 2;
        const LINK = 1 << 3;
        const TERMINAL = 1 << 4;
        const EXTRACTOR = 1 << 5;
        const LABS = 1 << 6;
        const FACTORY = 1 << 7;
        const POWER_SPAWN = 1 << 8;
        const NUKER = 1 << 9;
        const OBSERVER = 1 << 10;
    }
}

impl StructureFlags {
    /// Structures a colony is expected to have built at the given controller level.
    pub fn required_for_level(level: u8) -> StructureFlags {
        let mut required = StructureFlags::empty();

        if level >= 1 {
            required |= StructureFlags::SPAWN;
        }
        if level >= 3 {
            required |= StructureFlags::TOWER;
        }
        if level >= 4 {
            required |= StructureFlags::STORAGE;
        }
        if level >= 5 {
            required |= StructureFlags::LINK;
        }
        if level >= 6 {
            required |= StructureFlags::TERMINAL | StructureFlags::EXTRACTOR | StructureFlags::LABS;
        }
        if level >= 7 {
            required |= StructureFlags::FACTORY;
        }
        if level >= 8 {
            required |= StructureFlags::POWER_SPAWN | StructureFlags::NUKER | StructureFlags::OBSERVER;
        }

        required
    }

    pub fn missing_for_level(level: u8, present: StructureFlags) -> StructureFlags {
        StructureFlags::required_for_level(level) - present
    }
}

/// Persist structure flags as their raw bits so the stored shape stays a plain number.
pub mod structure_bits {
    use super::StructureFlags;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(flags: &StructureFlags, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(flags.bits())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<StructureFlags, D::Error> {
        let bits = u16::deserialize(deserializer)?;

        Ok(StructureFlags::from_bits_truncate(bits))
    }
}

// ─── Event log ───────────────────────────────────────────────────────────────

pub const EVENT_LOG_CAPACITY: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventTag {
    RoomDiscovered,
    DangerRaised,
    DangerCleared,
    NukeDetected,
    PostureChanged,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedEvent {
    pub tag: EventTag,
    pub tick: u32,
}

/// Fixed capacity event history. Pushing past capacity evicts the oldest entry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<LoggedEvent>", into = "Vec<LoggedEvent>")]
pub struct EventLog {
    entries: VecDeque<LoggedEvent>,
}

impl EventLog {
    pub fn push(&mut self, tag: EventTag, tick: u32) {
        self.entries.push_back(LoggedEvent { tag, tick });

        while self.entries.len() > EVENT_LOG_CAPACITY {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LoggedEvent> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&LoggedEvent> {
        self.entries.back()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl From<Vec<LoggedEvent>> for EventLog {
    fn from(entries: Vec<LoggedEvent>) -> EventLog {
        let skip = entries.len().saturating_sub(EVENT_LOG_CAPACITY);

        EventLog {
            entries: entries.into_iter().skip(skip).collect(),
        }
    }
}

impl From<EventLog> for Vec<LoggedEvent> {
    fn from(log: EventLog) -> Vec<LoggedEvent> {
        log.entries.into_iter().collect()
    }
}

// ─── Room record ─────────────────────────────────────────────────────────────

/// Per-room aggregate state, attached as a component to room entities.
///
/// Everything the posture and queue logic needs is stored here directly so a
/// record restored from memory is immediately usable without re-observation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Component)]
#[storage(DenseVecStorage)]
#[serde(rename_all = "camelCase")]
pub struct RoomRecord {
    pub name: RoomName,
    #[serde(default)]
    pub ownership: RoomOwnership,
    #[serde(default)]
    pub controller_level: u8,
    #[serde(default)]
    pub posture: Posture,
    #[serde(default)]
    pub danger: DangerLevel,
    #[serde(default)]
    pub signals: SignalVector,
    #[serde(default)]
    pub events: EventLog,
    #[serde(default = "StructureFlags::empty", with = "structure_bits")]
    pub missing_structures: StructureFlags,
    /// Game tick this room was last observed.
    #[serde(default)]
    pub last_seen: u32,
}

impl RoomRecord {
    pub fn new(name: RoomName) -> RoomRecord {
        RoomRecord {
            name,
            ownership: RoomOwnership::Unknown,
            controller_level: 0,
            posture: Posture::default(),
            danger: DangerLevel::default(),
            signals: SignalVector::default(),
            events: EventLog::default(),
            missing_structures: StructureFlags::empty(),
            last_seen: 0,
        }
    }

    pub fn colony_level(&self) -> ColonyLevel {
        ColonyLevel::from_controller_level(self.controller_level)
    }

    pub fn mine(&self) -> bool {
        self.ownership.mine()
    }
}
