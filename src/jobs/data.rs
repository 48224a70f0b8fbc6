use crate::military::threatmap::DangerLevel;
use crate::posture::data::*;
use crate::room::data::RoomName;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AgentRole {
    Harvester,
    Hauler,
    Upgrader,
    Builder,
    Defender,
    Attacker,
    Healer,
    Claimer,
    Scout,
}

impl AgentRole {
    pub fn is_military(&self) -> bool {
        matches!(self, AgentRole::Defender | AgentRole::Attacker | AgentRole::Healer)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AgentAction {
    Harvest,
    Deliver,
    Collect,
    Upgrade,
    Build,
    Repair,
    Attack,
    Heal,
    Retreat,
    Flee,
    Rally,
    Claim,
    Scout,
    Idle,
}

impl Display for AgentAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Per tick state of one agent as reported by the host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentState {
    pub name: String,
    pub room: RoomName,
    pub role: AgentRole,
    #[serde(default = "full_health")]
    pub hits_fraction: f32,
    #[serde(default)]
    pub hostiles_nearby: u32,
    #[serde(default)]
    pub carrying_energy: bool,
}

fn full_health() -> f32 {
    1.0
}

impl AgentState {
    pub fn new(name: &str, room: RoomName, role: AgentRole) -> AgentState {
        AgentState {
            name: name.to_owned(),
            room,
            role,
            hits_fraction: full_health(),
            hostiles_nearby: 0,
            carrying_energy: false,
        }
    }
}

/// What an agent decision tree sees: the agent plus the state of its room.
/// Rooms without a record are treated as calm and in eco posture.
#[derive(Clone, Debug, PartialEq)]
pub struct AgentContext {
    pub agent: AgentState,
    pub posture: Posture,
    pub danger: DangerLevel,
}

impl AgentContext {
    pub fn capabilities(&self) -> PostureCapabilities {
        self.posture.capabilities()
    }
}
