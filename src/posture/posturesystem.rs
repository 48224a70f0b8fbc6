use super::data::*;
use crate::features::*;
use crate::room::data::*;
use crate::room::observation::GameTick;
use log::*;
use specs::prelude::*;
use specs::Component;

/// Read-only per-tick snapshot handed to the spawning and dispatch collaborators.
#[derive(Clone, Copy, Debug, PartialEq, Component)]
#[storage(DenseVecStorage)]
pub struct ColonyDirective {
    pub posture: Posture,
    pub spawn_profile: SpawnProfile,
    pub resource_priorities: ResourcePriorities,
    pub capabilities: PostureCapabilities,
}

impl ColonyDirective {
    pub fn for_posture(posture: Posture) -> ColonyDirective {
        ColonyDirective {
            posture,
            spawn_profile: posture.spawn_profile(),
            resource_priorities: posture.resource_priorities(),
            capabilities: posture.capabilities(),
        }
    }
}

#[derive(SystemData)]
pub struct PostureSystemData<'a> {
    entities: Entities<'a>,
    tick: Read<'a, GameTick>,
    features: ReadExpect<'a, Features>,
    directives: Read<'a, Directives>,
    records: WriteStorage<'a, RoomRecord>,
    colony_directives: WriteStorage<'a, ColonyDirective>,
}

/// Recomputes every room's posture from its danger level and signals.
pub struct PostureSystem;

impl<'a> System<'a> for PostureSystem {
    type SystemData = PostureSystemData<'a>;

    fn run(&mut self, mut data: Self::SystemData) {
        let tick = data.tick.0;

        for (entity, record) in (&data.entities, &mut data.records).join() {
            let strategic_override = data.directives.override_for(record);
            let posture = determine_posture(record, strategic_override, &data.features.posture);

            if posture != record.posture {
                let dominant = record
                    .signals
                    .dominant(data.features.signals.dominant_floor)
                    .map(|category| category.to_string())
                    .unwrap_or_else(|| "none".to_owned());

                info!(
                    "Posture changed - Room: {} - {} -> {} - Dominant signal: {}",
                    record.name, record.posture, posture, dominant
                );

                record.posture = posture;
                record.events.push(EventTag::PostureChanged, tick);
            }

            if let Err(err) = data.colony_directives.insert(entity, ColonyDirective::for_posture(posture)) {
                error!("Failed to store colony directive - Room: {} - Error: {}", record.name, err);
            }
        }
    }
}
