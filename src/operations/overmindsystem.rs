use super::overmind::*;
use crate::features::*;
use crate::room::data::*;
use crate::room::observation::GameTick;
use log::*;
use specs::prelude::*;

/// Rebuilds the strategic queues from every room record and swaps the result in.
pub struct OvermindSystem;

impl<'a> System<'a> for OvermindSystem {
    type SystemData = (
        Read<'a, GameTick>,
        ReadExpect<'a, Features>,
        ReadStorage<'a, RoomRecord>,
        Write<'a, StrategicState>,
    );

    fn run(&mut self, (tick, features, records, mut strategic_state): Self::SystemData) {
        let rooms: Vec<&RoomRecord> = (&records).join().collect();

        let rebuilt = timing::timed("overmind_rebuild", || rebuild_strategic_state(&rooms, tick.0, &features.overmind));

        if rebuilt.claim_queue != strategic_state.claim_queue
            || rebuilt.war_targets != strategic_state.war_targets
            || rebuilt.strike_candidates != strategic_state.strike_candidates
        {
            debug!(
                "Strategic queues updated - Claim: {:?} - War: {:?} - Strike: {:?}",
                rebuilt.claim_queue.iter().map(|r| r.to_string()).collect::<Vec<_>>(),
                rebuilt.war_targets.iter().map(|r| r.to_string()).collect::<Vec<_>>(),
                rebuilt.strike_candidates.iter().map(|r| r.to_string()).collect::<Vec<_>>(),
            );
        }

        *strategic_state = rebuilt;
    }
}
