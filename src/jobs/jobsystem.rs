use super::behavior::*;
use super::data::*;
use crate::decision::DecisionError;
use crate::entitymappingsystem::*;
use crate::military::threatmap::DangerLevel;
use crate::posture::data::Posture;
use crate::room::data::*;
use log::*;
use shrinkwraprs::Shrinkwrap;
use specs::prelude::*;

/// Agents submitted by the host for this tick.
#[derive(Clone, Debug, Default, Shrinkwrap)]
#[shrinkwrap(mutable)]
pub struct AgentRoster(pub Vec<AgentState>);

/// The shared policy evaluated for every agent.
#[derive(Shrinkwrap)]
pub struct AgentBehavior(pub AgentTree);

#[derive(Clone, Debug, PartialEq)]
pub struct AgentDecision {
    pub agent: String,
    pub room: RoomName,
    pub outcome: Result<AgentAction, DecisionError>,
}

/// Decisions made this tick, in roster order.
#[derive(Clone, Debug, Default, Shrinkwrap)]
#[shrinkwrap(mutable)]
pub struct AgentIntents(pub Vec<AgentDecision>);

#[derive(SystemData)]
pub struct AgentIntentSystemData<'a> {
    roster: Read<'a, AgentRoster>,
    behavior: ReadExpect<'a, AgentBehavior>,
    mapping: Read<'a, EntityMappingData>,
    records: ReadStorage<'a, RoomRecord>,
    intents: Write<'a, AgentIntents>,
}

/// Picks an action for every agent. A failed evaluation only costs that
/// agent its turn.
pub struct AgentIntentSystem;

impl<'a> System<'a> for AgentIntentSystem {
    type SystemData = AgentIntentSystemData<'a>;

    fn run(&mut self, mut data: Self::SystemData) {
        let _guard = timing::start_guard("tree_evaluation");

        data.intents.clear();

        for agent in data.roster.iter() {
            let record = data.mapping.get_room(&agent.room).and_then(|entity| data.records.get(entity));

            let context = AgentContext {
                agent: agent.clone(),
                posture: record.map(|r| r.posture).unwrap_or(Posture::Eco),
                danger: record.map(|r| r.danger).unwrap_or(DangerLevel::None),
            };

            let outcome = data.behavior.evaluate(&context).map(|action| *action);

            if let Err(err) = &outcome {
                error!("Agent decision failed - Agent: {} - Room: {} - Error: {}", agent.name, agent.room, err);
            }

            data.intents.push(AgentDecision {
                agent: agent.name.clone(),
                room: agent.room,
                outcome,
            });
        }
    }
}
