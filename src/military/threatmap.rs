use crate::features::*;
use crate::room::data::*;
use crate::room::observation::*;
use crate::signals::field::*;
use log::*;
use serde::{Deserialize, Serialize};
use specs::prelude::*;
use std::fmt::Display;

/// Discrete danger classification for a room, driving posture escalation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum DangerLevel {
    /// No threats detected.
    #[default]
    None = 0,
    /// Hostile structures or a light presence.
    Low = 1,
    /// A fight the room has to answer.
    High = 2,
    /// Overwhelming force or an incoming nuke.
    Critical = 3,
}

impl DangerLevel {
    pub fn level(&self) -> u8 {
        *self as u8
    }
}

impl From<u8> for DangerLevel {
    fn from(level: u8) -> DangerLevel {
        match level {
            0 => DangerLevel::None,
            1 => DangerLevel::Low,
            2 => DangerLevel::High,
            _ => DangerLevel::Critical,
        }
    }
}

impl From<DangerLevel> for u8 {
    fn from(level: DangerLevel) -> u8 {
        level.level()
    }
}

impl Display for DangerLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.level())
    }
}

/// Classify the danger of a room from raw hostile observations.
///
/// Bands are checked from most to least severe and each boundary belongs to
/// the higher level. The critical hostile count and critical damage are
/// independent triggers.
pub fn classify_threat(hostile_count: u32, estimated_incoming_damage: f32, has_hostile_structures: bool, features: &ThreatFeatures) -> DangerLevel {
    let damage = if estimated_incoming_damage.is_finite() && estimated_incoming_damage > 0.0 {
        estimated_incoming_damage
    } else {
        0.0
    };

    if hostile_count >= features.critical_hostiles || damage >= features.critical_damage {
        return DangerLevel::Critical;
    }

    if hostile_count >= features.medium_hostiles || damage >= features.medium_damage {
        return DangerLevel::High;
    }

    if has_hostile_structures || hostile_count > 0 || damage > 0.0 {
        return DangerLevel::Low;
    }

    DangerLevel::None
}

/// Feed a danger classification into the room's signals.
///
/// Returns the effective danger level: incoming nukes always make a room critical.
pub fn apply_threat(signals: &mut SignalVector, danger: DangerLevel, hostile_count: u32, nuke_count: usize, features: &ThreatFeatures) -> DangerLevel {
    let mut danger = danger;

    if danger >= DangerLevel::High {
        let level = danger.level() as f32;

        signals.emit(SignalCategory::War, features.war_per_danger * level);
        signals.emit(
            SignalCategory::Defense,
            features.defense_per_danger * level + features.defense_per_hostile * hostile_count as f32,
        );
    }

    if nuke_count > 0 {
        signals.emit(SignalCategory::Siege, features.siege_per_nuke * nuke_count as f32);
        signals.emit(SignalCategory::NukeTarget, features.nuke_target_per_nuke * nuke_count as f32);

        danger = danger.max(DangerLevel::Critical);
    }

    danger
}

/// System that classifies danger for every observed room each tick.
///
/// Runs after signal decay so that this tick's threat emissions are not
/// decayed until the next tick. Rooms without an observation this tick keep
/// their last danger level.
pub struct ThreatAssessmentSystem;

impl<'a> System<'a> for ThreatAssessmentSystem {
    type SystemData = (
        Read<'a, GameTick>,
        Read<'a, RoomObservations>,
        ReadExpect<'a, Features>,
        WriteStorage<'a, RoomRecord>,
    );

    fn run(&mut self, (tick, observations, features, mut records): Self::SystemData) {
        let tick = tick.0;

        for record in (&mut records).join() {
            let observation = match observations.get(&record.name) {
                Some(o) => o,
                None => continue,
            };

            let previous = record.danger;

            let classified = classify_threat(
                observation.hostile_count,
                observation.incoming_damage(),
                observation.hostile_structures,
                &features.threat,
            );

            let danger = apply_threat(
                &mut record.signals,
                classified,
                observation.hostile_count,
                observation.nukes.len(),
                &features.threat,
            );

            if !observation.nukes.is_empty() && previous < DangerLevel::Critical {
                warn!("Incoming nukes detected - Room: {} - Count: {}", record.name, observation.nukes.len());

                record.events.push(EventTag::NukeDetected, tick);
            }

            if danger > previous {
                info!("Danger raised - Room: {} - Level: {} -> {}", record.name, previous, danger);

                record.events.push(EventTag::DangerRaised, tick);
            } else if danger == DangerLevel::None && previous > DangerLevel::None {
                info!("Danger cleared - Room: {}", record.name);

                record.events.push(EventTag::DangerCleared, tick);
            }

            record.danger = danger;
        }
    }
}
