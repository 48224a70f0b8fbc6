use super::data::*;
use serde::{Deserialize, Serialize};
use shrinkwraprs::Shrinkwrap;
use std::collections::HashMap;

/// Information about an incoming nuke.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NukeObservation {
    /// Game tick when the nuke will land.
    pub landing_tick: u32,
    pub x: u8,
    pub y: u8,
}

/// What the host could see of a room this tick.
///
/// Every field defaults to zero/absent: partial observations are normal and
/// never an error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoomObservation {
    pub ownership: RoomOwnership,
    pub controller_level: u8,
    /// Ticks until the controller downgrades, when the room has a controller we care about.
    pub controller_downgrade: Option<u32>,
    pub hostile_count: u32,
    pub estimated_incoming_damage: f32,
    pub hostile_structures: bool,
    pub nukes: Vec<NukeObservation>,
    pub energy_stored: u32,
    pub construction_sites: u32,
    pub damaged_structures: u32,
    #[serde(with = "structure_bits")]
    pub structures: StructureFlags,
}

impl Default for RoomObservation {
    fn default() -> RoomObservation {
        RoomObservation {
            ownership: RoomOwnership::Unknown,
            controller_level: 0,
            controller_downgrade: None,
            hostile_count: 0,
            estimated_incoming_damage: 0.0,
            hostile_structures: false,
            nukes: Vec::new(),
            energy_stored: 0,
            construction_sites: 0,
            damaged_structures: 0,
            structures: StructureFlags::empty(),
        }
    }
}

impl RoomObservation {
    /// Incoming damage with garbage readings treated as no damage.
    pub fn incoming_damage(&self) -> f32 {
        if self.estimated_incoming_damage.is_finite() && self.estimated_incoming_damage > 0.0 {
            self.estimated_incoming_damage
        } else {
            0.0
        }
    }
}

/// Observations for the current tick, keyed by room. Replaced wholesale every tick.
#[derive(Clone, Debug, Default, Shrinkwrap)]
#[shrinkwrap(mutable)]
pub struct RoomObservations(pub HashMap<RoomName, RoomObservation>);

/// Current game tick as supplied by the scheduler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GameTick(pub u32);
