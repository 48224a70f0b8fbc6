use crate::decision::DecisionError;
use crate::entitymappingsystem::*;
use crate::features::*;
use crate::jobs::behavior::*;
use crate::jobs::data::*;
use crate::jobs::jobsystem::*;
use crate::memorysystem::*;
use crate::military::threatmap::*;
use crate::operations::overmind::*;
use crate::operations::overmindsystem::*;
use crate::posture::data::*;
use crate::posture::posturesystem::*;
use crate::room::createroomsystem::*;
use crate::room::data::*;
use crate::room::observation::*;
use crate::room::updateroomsystem::*;
use crate::signals::signalsystem::*;
use log::*;
use specs::prelude::*;

/// Outcome of one call to `SwarmEnvironment::tick`.
#[derive(Clone, Debug, Default)]
pub struct TickReport {
    pub tick: u32,
    pub rooms: usize,
    /// The environment was rebuilt because a tick was skipped.
    pub reset: bool,
    /// Persisted state was read from storage this tick.
    pub loaded: bool,
    pub saved: bool,
    pub intents: Vec<AgentDecision>,
    pub trace: Option<timing::Trace>,
}

/// Owns the ECS world and the per tick pipeline. The host drives it by
/// calling `tick` once per game tick.
pub struct SwarmEnvironment {
    world: World,
    dispatcher: Dispatcher<'static, 'static>,
    loaded: bool,
    tick: Option<u32>,
    pending_directives: Option<Directives>,
    #[cfg(feature = "profile")]
    profiler: Option<(fn() -> u64, u64)>,
}

impl SwarmEnvironment {
    pub fn new(features: Features) -> Result<SwarmEnvironment, DecisionError> {
        Ok(Self::with_behavior(features, agent_tree()?))
    }

    /// Create an environment that evaluates agents with a custom policy.
    pub fn with_behavior(features: Features, behavior: AgentTree) -> SwarmEnvironment {
        info!("Initializing swarm environment");

        let mut world = World::new();

        world.insert(features);
        world.insert(AgentBehavior(behavior));
        world.insert(StrategicState::default());
        world.insert(Directives::default());

        let mut dispatcher = DispatcherBuilder::new()
            .with(CreateRoomSystem, "create_room", &[])
            .with(UpdateRoomSystem, "update_room", &["create_room"])
            .with_barrier()
            .with(EntityMappingSystem, "entity_mapping", &[])
            .with_barrier()
            .with(SignalDecaySystem, "signal_decay", &[])
            .with(ThreatAssessmentSystem, "threat_assessment", &["signal_decay"])
            .with(SignalEmissionSystem, "signal_emission", &["threat_assessment"])
            .with(SignalDiffusionSystem, "signal_diffusion", &["signal_emission"])
            .with_barrier()
            .with(PostureSystem, "posture", &[])
            .with(OvermindSystem, "overmind", &["posture"])
            .with(AgentIntentSystem, "agent_intents", &["posture"])
            .build();

        dispatcher.setup(&mut world);

        SwarmEnvironment {
            world,
            dispatcher,
            loaded: false,
            tick: None,
            pending_directives: None,
            #[cfg(feature = "profile")]
            profiler: None,
        }
    }

    /// Collect a timing trace every tick and warn when a tick takes longer than `long_tick`.
    #[cfg(feature = "profile")]
    pub fn set_profiler(&mut self, clock: fn() -> u64, long_tick: u64) {
        self.profiler = Some((clock, long_tick));
    }

    pub fn tick(&mut self, storage: &mut dyn SegmentStorage, tick: u32, observations: RoomObservations, agents: Vec<AgentState>) -> TickReport {
        let mut report = TickReport {
            tick,
            ..Default::default()
        };

        if self.tick.map(|last| last.wrapping_add(1) != tick).unwrap_or(false) {
            info!("Resetting environment - Last tick: {:?} - Current tick: {}", self.tick, tick);

            // Directives may have been set after the last save.
            self.pending_directives = Some(self.directives());

            self.reset();

            report.reset = true;
        }

        if !self.loaded {
            self.load(storage);

            self.loaded = true;
            report.loaded = true;
        }

        self.tick = Some(tick);

        #[cfg(feature = "profile")]
        if let Some((clock, _)) = self.profiler {
            timing::start_trace(Box::new(clock));
        }

        self.world.insert(GameTick(tick));
        self.world.insert(observations);
        self.world.insert(AgentRoster(agents));

        {
            let _guard = timing::start_guard("tick");

            self.dispatcher.dispatch(&self.world);
            self.world.maintain();
        }

        match save_snapshot(storage, &self.snapshot()) {
            Ok(()) => report.saved = true,
            Err(err) => error!("Failed to save swarm state - Tick: {} - Error: {}", tick, err),
        }

        report.rooms = self.world.read_storage::<RoomRecord>().join().count();
        report.intents = self.world.read_resource::<AgentIntents>().0.clone();
        report.trace = timing::stop_trace();

        #[cfg(feature = "profile")]
        if let (Some((_, long_tick)), Some(trace)) = (self.profiler, report.trace.as_ref()) {
            let duration = trace.total("tick");

            if duration > long_tick {
                warn!("Long tick - Tick: {} - Duration: {} - Overmind: {} - Trees: {}", tick, duration, trace.total("overmind_rebuild"), trace.total("tree_evaluation"));
            }
        }

        report
    }

    /// Wipe persisted state and start over from nothing on the next tick.
    pub fn reset_memory(&mut self, storage: &mut dyn SegmentStorage) {
        info!("Resetting memory");

        clear_snapshot(storage);

        self.reset();
    }

    fn reset(&mut self) {
        self.world.delete_all();
        self.world.maintain();

        self.world.insert(StrategicState::default());
        self.world.insert(Directives::default());
        self.world.insert(EntityMappingData::default());
        self.world.insert(AgentIntents::default());

        self.loaded = false;
        self.tick = None;
    }

    fn load(&mut self, storage: &dyn SegmentStorage) {
        match load_snapshot(storage) {
            Ok(Some(snapshot)) => {
                info!("Loaded swarm state - Rooms: {} - Saved tick: {}", snapshot.rooms.len(), snapshot.tick);

                for record in snapshot.rooms {
                    self.world.create_entity().with(record).build();
                }

                self.world.insert(snapshot.strategic);
                self.world.insert(snapshot.directives);
            }
            Ok(None) => info!("No persisted swarm state, starting fresh"),
            Err(err) => warn!("Discarding persisted swarm state - Error: {}", err),
        }

        if let Some(directives) = self.pending_directives.take() {
            self.world.insert(directives);
        }
    }

    fn snapshot(&self) -> SwarmSnapshot {
        let mut rooms: Vec<RoomRecord> = self.world.read_storage::<RoomRecord>().join().cloned().collect();

        rooms.sort_by_key(|record| record.name);

        SwarmSnapshot {
            tick: self.tick.unwrap_or(0),
            rooms,
            strategic: self.strategic_state(),
            directives: self.directives(),
        }
    }

    pub fn features(&self) -> Features {
        (*self.world.read_resource::<Features>()).clone()
    }

    pub fn strategic_state(&self) -> StrategicState {
        (*self.world.read_resource::<StrategicState>()).clone()
    }

    pub fn directives(&self) -> Directives {
        (*self.world.read_resource::<Directives>()).clone()
    }

    /// Replace the strategic directives. They take effect on the next tick.
    pub fn set_directives(&mut self, directives: Directives) {
        if !self.loaded {
            self.pending_directives = Some(directives.clone());
        }

        self.world.insert(directives);
    }

    pub fn rooms(&self) -> Vec<RoomRecord> {
        let mut rooms: Vec<RoomRecord> = self.world.read_storage::<RoomRecord>().join().cloned().collect();

        rooms.sort_by_key(|record| record.name);

        rooms
    }

    pub fn room_record(&self, name: RoomName) -> Option<RoomRecord> {
        self.world.read_storage::<RoomRecord>().join().find(|record| record.name == name).cloned()
    }

    pub fn colony_directive(&self, name: RoomName) -> Option<ColonyDirective> {
        let records = self.world.read_storage::<RoomRecord>();
        let directives = self.world.read_storage::<ColonyDirective>();

        (&records, &directives)
            .join()
            .find(|(record, _)| record.name == name)
            .map(|(_, directive)| *directive)
    }

    /// Forget a room entirely. Returns false if the room was not known.
    pub fn remove_room(&mut self, name: RoomName) -> bool {
        let entity = {
            let entities = self.world.entities();
            let records = self.world.read_storage::<RoomRecord>();

            (&entities, &records)
                .join()
                .find(|(_, record)| record.name == name)
                .map(|(entity, _)| entity)
        };

        match entity {
            Some(entity) => {
                if let Err(err) = self.world.delete_entity(entity) {
                    error!("Failed to remove room - Room: {} - Error: {}", name, err);
                    return false;
                }

                self.world.maintain();

                info!("Removed room - Room: {}", name);

                true
            }
            None => false,
        }
    }

    pub fn describe_behavior(&self) -> String {
        self.world.read_resource::<AgentBehavior>().describe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observations(entries: &[(&str, RoomObservation)]) -> RoomObservations {
        RoomObservations(entries.iter().map(|(name, observation)| (name.parse().unwrap(), observation.clone())).collect())
    }

    #[test]
    fn first_tick_creates_and_saves_rooms() {
        let mut environment = SwarmEnvironment::new(Features::default()).unwrap();
        let mut storage = InMemorySegments::new();

        let report = environment.tick(&mut storage, 1, observations(&[("W1N1", RoomObservation::default())]), Vec::new());

        assert!(report.loaded);
        assert!(report.saved);
        assert!(!report.reset);
        assert_eq!(report.rooms, 1);
        assert!(load_snapshot(&storage).unwrap().is_some());
    }

    #[test]
    fn skipped_tick_reloads_from_storage() {
        let mut environment = SwarmEnvironment::new(Features::default()).unwrap();
        let mut storage = InMemorySegments::new();

        environment.tick(&mut storage, 1, observations(&[("W1N1", RoomObservation::default())]), Vec::new());
        environment.tick(&mut storage, 2, RoomObservations::default(), Vec::new());

        let report = environment.tick(&mut storage, 9, RoomObservations::default(), Vec::new());

        assert!(report.reset);
        assert!(report.loaded);
        assert_eq!(report.rooms, 1);
    }

    #[test]
    fn accessors_return_owned_copies() {
        let mut features = Features::default();
        features.signals.decay_factor = 0.5;

        let mut environment = SwarmEnvironment::new(features.clone()).unwrap();
        let mut storage = InMemorySegments::new();

        environment.tick(&mut storage, 1, observations(&[("W1N1", RoomObservation::default())]), Vec::new());

        let copied: Features = environment.features();
        let strategic: StrategicState = environment.strategic_state();
        let directives: Directives = environment.directives();

        assert_eq!(copied, features);
        assert_eq!(strategic.last_rebuilt, Some(1));
        assert_eq!(directives, Directives::default());
    }

    #[test]
    fn removed_rooms_are_forgotten() {
        let mut environment = SwarmEnvironment::new(Features::default()).unwrap();
        let mut storage = InMemorySegments::new();
        let name: RoomName = "W1N1".parse().unwrap();

        environment.tick(&mut storage, 1, observations(&[("W1N1", RoomObservation::default())]), Vec::new());

        assert!(environment.remove_room(name));
        assert!(!environment.remove_room(name));
        assert!(environment.room_record(name).is_none());
    }

    #[test]
    fn reset_memory_forgets_everything() {
        let mut environment = SwarmEnvironment::new(Features::default()).unwrap();
        let mut storage = InMemorySegments::new();

        environment.tick(&mut storage, 1, observations(&[("W1N1", RoomObservation::default())]), Vec::new());
        environment.reset_memory(&mut storage);

        let report = environment.tick(&mut storage, 2, RoomObservations::default(), Vec::new());

        assert!(report.loaded);
        assert_eq!(report.rooms, 0);
        assert!(environment.rooms().is_empty());
    }

    #[test]
    fn directives_set_before_loading_survive_the_load() {
        let mut environment = SwarmEnvironment::new(Features::default()).unwrap();
        let mut storage = InMemorySegments::new();

        environment.set_directives(Directives {
            global: Some(Posture::NukePrep),
            ..Default::default()
        });

        let home = RoomObservation {
            ownership: RoomOwnership::Mine,
            controller_level: 3,
            ..Default::default()
        };

        environment.tick(&mut storage, 1, observations(&[("W1N1", home)]), Vec::new());

        let directive = environment.colony_directive("W1N1".parse().unwrap()).unwrap();

        assert_eq!(directive.posture, Posture::NukePrep);
    }

    #[test]
    fn directives_set_between_ticks_survive_a_skipped_tick() {
        let mut environment = SwarmEnvironment::new(Features::default()).unwrap();
        let mut storage = InMemorySegments::new();

        let home = RoomObservation {
            ownership: RoomOwnership::Mine,
            controller_level: 3,
            ..Default::default()
        };

        environment.tick(&mut storage, 1, observations(&[("W1N1", home.clone())]), Vec::new());
        environment.set_directives(Directives {
            global: Some(Posture::Evacuate),
            ..Default::default()
        });

        let report = environment.tick(&mut storage, 5, observations(&[("W1N1", home)]), Vec::new());

        assert!(report.reset);
        assert_eq!(environment.directives().global, Some(Posture::Evacuate));
        assert_eq!(environment.room_record("W1N1".parse().unwrap()).unwrap().posture, Posture::Evacuate);
        assert_eq!(load_snapshot(&storage).unwrap().unwrap().directives.global, Some(Posture::Evacuate));
    }
}
