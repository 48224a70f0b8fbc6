use super::data::*;
use super::observation::*;
use log::*;
use specs::prelude::*;
use std::collections::HashSet;

/// Creates a record for every observed room that does not have one yet.
pub struct CreateRoomSystem;

impl<'a> System<'a> for CreateRoomSystem {
    type SystemData = (
        Entities<'a>,
        Read<'a, GameTick>,
        Read<'a, RoomObservations>,
        WriteStorage<'a, RoomRecord>,
    );

    fn run(&mut self, (entities, tick, observations, mut records): Self::SystemData) {
        let existing_rooms = (&entities, &records)
            .join()
            .map(|(_, record)| record.name)
            .collect::<HashSet<RoomName>>();

        let mut missing_rooms = observations
            .keys()
            .filter(|name| !existing_rooms.contains(name))
            .cloned()
            .collect::<Vec<_>>();

        missing_rooms.sort();

        for name in missing_rooms {
            let mut record = RoomRecord::new(name);

            record.events.push(EventTag::RoomDiscovered, tick.0);

            info!("Discovered room - Room: {}", name);

            entities.build_entity().with(record, &mut records).build();
        }
    }
}
