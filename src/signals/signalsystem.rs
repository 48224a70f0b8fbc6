use super::field::*;
use crate::features::*;
use crate::military::threatmap::DangerLevel;
use crate::room::data::*;
use crate::room::observation::*;
use specs::prelude::*;
use std::collections::HashMap;

/// Decays every room's signals. Runs first each tick, before any emission.
pub struct SignalDecaySystem;

impl<'a> System<'a> for SignalDecaySystem {
    type SystemData = (ReadExpect<'a, Features>, WriteStorage<'a, RoomRecord>);

    fn run(&mut self, (features, mut records): Self::SystemData) {
        let factor = features.signals.decay_factor;

        for record in (&mut records).join() {
            record.signals = record.signals.decayed(factor);
        }
    }
}

/// Economic and strategic emissions derived from a single room observation.
pub fn emit_from_observation(
    signals: &mut SignalVector,
    observation: &RoomObservation,
    missing_structures: StructureFlags,
    danger: DangerLevel,
    features: &SignalFeatures,
) {
    if !observation.ownership.mine() {
        if observation.hostile_structures {
            signals.emit(SignalCategory::NukeTarget, features.hostile_structure_strike_amount);
        }

        return;
    }

    let construction = observation.construction_sites as f32 * features.build_per_construction_site;
    let missing = missing_structures.bits().count_ones() as f32 * features.build_per_missing_structure;

    signals.emit(SignalCategory::Build, construction + missing);

    signals.emit(
        SignalCategory::Defense,
        observation.damaged_structures as f32 * features.defense_per_damaged_structure,
    );

    match observation.controller_downgrade {
        Some(ticks) if ticks < features.upgrade_downgrade_ticks => {
            signals.emit(SignalCategory::Upgrade, features.upgrade_downgrade_amount);
        }
        _ => {
            signals.emit(SignalCategory::Upgrade, features.upgrade_baseline);
        }
    }

    if observation.energy_stored < features.harvest_low_energy {
        signals.emit(SignalCategory::Harvest, features.harvest_amount);
    }

    signals.emit(SignalCategory::Logistics, observation.energy_stored as f32 * features.logistics_per_energy);

    let can_expand = danger == DangerLevel::None
        && observation.controller_level >= features.expand_min_controller_level
        && observation.energy_stored >= features.expand_energy_surplus;

    if can_expand {
        signals.emit(SignalCategory::Expand, features.expand_amount);
    }
}

/// Applies observation driven emissions to every observed room.
pub struct SignalEmissionSystem;

impl<'a> System<'a> for SignalEmissionSystem {
    type SystemData = (Read<'a, RoomObservations>, ReadExpect<'a, Features>, WriteStorage<'a, RoomRecord>);

    fn run(&mut self, (observations, features, mut records): Self::SystemData) {
        for record in (&mut records).join() {
            if let Some(observation) = observations.get(&record.name) {
                emit_from_observation(
                    &mut record.signals,
                    observation,
                    record.missing_structures,
                    record.danger,
                    &features.signals,
                );
            }
        }
    }
}

/// Broadcasts diffusing categories to adjacent known rooms.
///
/// All contributions are computed from the values as they stood before
/// diffusion, so the result does not depend on room iteration order.
pub struct SignalDiffusionSystem;

impl<'a> System<'a> for SignalDiffusionSystem {
    type SystemData = (ReadExpect<'a, Features>, WriteStorage<'a, RoomRecord>);

    fn run(&mut self, (features, mut records): Self::SystemData) {
        let signal_features = &features.signals;

        let sources: HashMap<RoomName, SignalVector> = (&records)
            .join()
            .filter(|record| {
                signal_features
                    .diffusing_categories
                    .iter()
                    .any(|category| record.signals.get(*category) >= signal_features.diffusion_min)
            })
            .map(|record| (record.name, record.signals))
            .collect();

        if sources.is_empty() {
            return;
        }

        for record in (&mut records).join() {
            for neighbor in record.name.neighbors().iter() {
                if let Some(source) = sources.get(neighbor) {
                    let categories: Vec<SignalCategory> = signal_features
                        .diffusing_categories
                        .iter()
                        .cloned()
                        .filter(|category| source.get(*category) >= signal_features.diffusion_min)
                        .collect();

                    diffuse(source, std::iter::once(&mut record.signals), &categories, signal_features.diffusion_fraction);
                }
            }
        }
    }
}
