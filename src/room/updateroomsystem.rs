use super::data::*;
use super::observation::*;
use specs::prelude::*;

/// Copies the static parts of this tick's observations onto the room records.
/// Rooms that were not observed keep what they last knew.
pub struct UpdateRoomSystem;

impl<'a> System<'a> for UpdateRoomSystem {
    type SystemData = (Read<'a, GameTick>, Read<'a, RoomObservations>, WriteStorage<'a, RoomRecord>);

    fn run(&mut self, (tick, observations, mut records): Self::SystemData) {
        for record in (&mut records).join() {
            if let Some(observation) = observations.get(&record.name) {
                update_record(record, observation, tick.0);
            }
        }
    }
}

pub fn update_record(record: &mut RoomRecord, observation: &RoomObservation, tick: u32) {
    if observation.ownership != RoomOwnership::Unknown {
        record.ownership = observation.ownership;
    }

    record.controller_level = observation.controller_level;
    record.last_seen = tick;

    record.missing_structures = if record.mine() {
        StructureFlags::missing_for_level(record.controller_level, observation.structures)
    } else {
        StructureFlags::empty()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owned_rooms_track_missing_structures() {
        let mut record = RoomRecord::new("W1N1".parse().unwrap());
        let observation = RoomObservation {
            ownership: RoomOwnership::Mine,
            controller_level: 4,
            structures: StructureFlags::SPAWN,
            ..Default::default()
        };

        update_record(&mut record, &observation, 77);

        assert_eq!(record.last_seen, 77);
        assert_eq!(record.controller_level, 4);
        assert_eq!(record.missing_structures, StructureFlags::missing_for_level(4, StructureFlags::SPAWN));
        assert!(!record.missing_structures.contains(StructureFlags::SPAWN));
    }

    #[test]
    fn unknown_ownership_does_not_forget_what_we_knew() {
        let mut record = RoomRecord::new("W1N1".parse().unwrap());
        record.ownership = RoomOwnership::Hostile;

        update_record(&mut record, &RoomObservation::default(), 5);

        assert_eq!(record.ownership, RoomOwnership::Hostile);
        assert!(record.missing_structures.is_empty());
    }
}
