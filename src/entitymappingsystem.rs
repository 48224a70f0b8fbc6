use crate::room::data::*;
use specs::prelude::*;
use std::collections::HashMap;

/// Lookup from room name to the entity carrying its record.
#[derive(Default)]
pub struct EntityMappingData {
    pub rooms: HashMap<RoomName, Entity>,
}

impl EntityMappingData {
    pub fn get_room(&self, name: &RoomName) -> Option<Entity> {
        self.rooms.get(name).cloned()
    }
}

#[derive(SystemData)]
pub struct EntityMappingSystemData<'a> {
    mapping: Write<'a, EntityMappingData>,
    entities: Entities<'a>,
    records: ReadStorage<'a, RoomRecord>,
}

pub struct EntityMappingSystem;

impl<'a> System<'a> for EntityMappingSystem {
    type SystemData = EntityMappingSystemData<'a>;

    fn run(&mut self, mut data: Self::SystemData) {
        let mapping = &mut data.mapping;

        mapping.rooms.clear();

        for (entity, record) in (&data.entities, &data.records).join() {
            mapping.rooms.insert(record.name, entity);
        }
    }
}
