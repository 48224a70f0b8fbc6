//! The default agent policy.
//!
//! Survival checks run first, then the agent's role picks its branch. Every
//! role has a case, so the role switch never dead ends for a valid agent.

use super::data::*;
use crate::decision::*;
use crate::military::threatmap::DangerLevel;
use crate::posture::data::Posture;

/// Below this fraction of hit points an agent stops what it is doing.
pub const CRITICAL_HITS_FRACTION: f32 = 0.3;

pub type AgentTree = DecisionTree<AgentContext, AgentAction>;

fn badly_hurt(context: &AgentContext) -> bool {
    context.agent.hits_fraction < CRITICAL_HITS_FRACTION
}

fn under_threat(context: &AgentContext) -> bool {
    context.agent.hostiles_nearby > 0 || context.danger > DangerLevel::None
}

fn role_is(role: AgentRole) -> impl Fn(&AgentContext) -> bool + Send + Sync + 'static {
    move |context: &AgentContext| context.agent.role == role
}

fn worker_branch(
    builder: &mut DecisionTreeBuilder<AgentContext, AgentAction>,
    role: AgentRole,
) -> NodeId {
    let collect = builder.leaf(AgentAction::Collect);
    let deliver = builder.leaf(AgentAction::Deliver);

    let branch = match role {
        AgentRole::Harvester => {
            let harvest = builder.leaf(AgentAction::Harvest);

            builder.conditional(|context: &AgentContext| context.agent.carrying_energy, deliver, harvest)
        }
        AgentRole::Hauler => builder.conditional(|context: &AgentContext| context.agent.carrying_energy, deliver, collect),
        AgentRole::Upgrader => {
            let upgrade = builder.leaf(AgentAction::Upgrade);

            builder.multiway(
                vec![
                    case(|context: &AgentContext| !context.agent.carrying_energy, collect),
                    case(|context: &AgentContext| context.posture.allows_upgrading(), upgrade),
                ],
                Some(deliver),
            )
        }
        _ => {
            let build = builder.leaf(AgentAction::Build);
            let repair = builder.leaf(AgentAction::Repair);

            builder.multiway(
                vec![
                    case(|context: &AgentContext| !context.agent.carrying_energy, collect),
                    case(|context: &AgentContext| context.posture.allows_building() && context.danger == DangerLevel::None, build),
                ],
                Some(repair),
            )
        }
    };

    builder.label(branch, &format!("{:?}", role).to_lowercase())
}

fn military_branch(
    builder: &mut DecisionTreeBuilder<AgentContext, AgentAction>,
    role: AgentRole,
) -> NodeId {
    let idle = builder.leaf(AgentAction::Idle);
    let rally = builder.leaf(AgentAction::Rally);

    let branch = match role {
        AgentRole::Healer => {
            let heal = builder.leaf(AgentAction::Heal);

            builder.multiway(
                vec![case(under_threat, heal), case(|context: &AgentContext| context.posture.is_combat_posture(), rally)],
                Some(idle),
            )
        }
        AgentRole::Defender => {
            let attack = builder.leaf(AgentAction::Attack);

            builder.multiway(
                vec![
                    case(|context: &AgentContext| context.agent.hostiles_nearby > 0, attack),
                    case(|context: &AgentContext| context.danger > DangerLevel::None, rally),
                ],
                Some(idle),
            )
        }
        _ => {
            let attack = builder.leaf(AgentAction::Attack);

            builder.multiway(
                vec![
                    case(|context: &AgentContext| context.agent.hostiles_nearby > 0, attack),
                    case(|context: &AgentContext| context.posture.is_combat_posture(), rally),
                ],
                Some(idle),
            )
        }
    };

    builder.label(branch, &format!("{:?}", role).to_lowercase())
}

/// Build the shared agent decision tree.
pub fn agent_tree() -> Result<AgentTree, DecisionError> {
    let mut builder = DecisionTreeBuilder::new();

    let roles = [
        AgentRole::Harvester,
        AgentRole::Hauler,
        AgentRole::Upgrader,
        AgentRole::Builder,
        AgentRole::Defender,
        AgentRole::Attacker,
        AgentRole::Healer,
    ];

    let mut role_cases = Vec::new();

    for role in roles {
        let branch = if role.is_military() {
            military_branch(&mut builder, role)
        } else {
            worker_branch(&mut builder, role)
        };

        role_cases.push(case(role_is(role), branch));
    }

    let claim = builder.leaf(AgentAction::Claim);
    let claimer_idle = builder.leaf(AgentAction::Idle);
    let claimer = builder.conditional(|context: &AgentContext| context.danger == DangerLevel::None, claim, claimer_idle);
    role_cases.push(case(role_is(AgentRole::Claimer), claimer));

    let scout = builder.leaf(AgentAction::Scout);
    role_cases.push(case(role_is(AgentRole::Scout), scout));

    let by_role = builder.multiway(role_cases, None);
    let by_role = builder.label(by_role, "role");

    let flee = builder.leaf(AgentAction::Flee);
    let retreat = builder.leaf(AgentAction::Retreat);
    let hurt = builder.conditional(|context: &AgentContext| context.agent.role.is_military(), retreat, flee);

    let survival = builder.multiway(
        vec![
            case(badly_hurt, hurt),
            case(|context: &AgentContext| context.posture == Posture::Evacuate, flee),
        ],
        Some(by_role),
    );
    let survival = builder.label(survival, "survival");

    let root = builder.passthrough("agent", survival);

    builder.build(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::data::RoomName;

    fn context(role: AgentRole, posture: Posture, danger: DangerLevel) -> AgentContext {
        AgentContext {
            agent: AgentState::new("agent", RoomName::from_coords(0, 0), role),
            posture,
            danger,
        }
    }

    fn decide(tree: &AgentTree, context: &AgentContext) -> AgentAction {
        *tree.evaluate(context).unwrap()
    }

    #[test]
    fn every_role_gets_an_action() {
        let tree = agent_tree().unwrap();

        for role in [
            AgentRole::Harvester,
            AgentRole::Hauler,
            AgentRole::Upgrader,
            AgentRole::Builder,
            AgentRole::Defender,
            AgentRole::Attacker,
            AgentRole::Healer,
            AgentRole::Claimer,
            AgentRole::Scout,
        ] {
            for posture in [Posture::Eco, Posture::Siege, Posture::NukePrep] {
                assert!(tree.evaluate(&context(role, posture, DangerLevel::High)).is_ok());
            }
        }
    }

    #[test]
    fn hurt_agents_leave() {
        let tree = agent_tree().unwrap();

        let mut worker = context(AgentRole::Builder, Posture::Eco, DangerLevel::None);
        worker.agent.hits_fraction = 0.1;
        let mut soldier = context(AgentRole::Attacker, Posture::War, DangerLevel::High);
        soldier.agent.hits_fraction = 0.1;

        assert_eq!(decide(&tree, &worker), AgentAction::Flee);
        assert_eq!(decide(&tree, &soldier), AgentAction::Retreat);
    }

    #[test]
    fn evacuation_sends_everyone_away() {
        let tree = agent_tree().unwrap();

        assert_eq!(decide(&tree, &context(AgentRole::Upgrader, Posture::Evacuate, DangerLevel::None)), AgentAction::Flee);
    }

    #[test]
    fn workers_follow_their_energy() {
        let tree = agent_tree().unwrap();

        let mut harvester = context(AgentRole::Harvester, Posture::Eco, DangerLevel::None);
        assert_eq!(decide(&tree, &harvester), AgentAction::Harvest);

        harvester.agent.carrying_energy = true;
        assert_eq!(decide(&tree, &harvester), AgentAction::Deliver);

        let mut upgrader = context(AgentRole::Upgrader, Posture::Eco, DangerLevel::None);
        upgrader.agent.carrying_energy = true;
        assert_eq!(decide(&tree, &upgrader), AgentAction::Upgrade);

        upgrader.posture = Posture::War;
        assert_eq!(decide(&tree, &upgrader), AgentAction::Deliver);
    }

    #[test]
    fn builders_repair_when_building_is_unsafe() {
        let tree = agent_tree().unwrap();

        let mut builder = context(AgentRole::Builder, Posture::Eco, DangerLevel::None);
        builder.agent.carrying_energy = true;
        assert_eq!(decide(&tree, &builder), AgentAction::Build);

        builder.posture = Posture::Siege;
        builder.danger = DangerLevel::Critical;
        assert_eq!(decide(&tree, &builder), AgentAction::Repair);
    }

    #[test]
    fn military_reacts_to_hostiles() {
        let tree = agent_tree().unwrap();

        let mut defender = context(AgentRole::Defender, Posture::Defensive, DangerLevel::Low);
        assert_eq!(decide(&tree, &defender), AgentAction::Rally);

        defender.agent.hostiles_nearby = 2;
        assert_eq!(decide(&tree, &defender), AgentAction::Attack);

        assert_eq!(decide(&tree, &context(AgentRole::Attacker, Posture::Eco, DangerLevel::None)), AgentAction::Idle);
        assert_eq!(decide(&tree, &context(AgentRole::Healer, Posture::War, DangerLevel::High)), AgentAction::Heal);
    }

    #[test]
    fn claimers_wait_out_danger() {
        let tree = agent_tree().unwrap();

        assert_eq!(decide(&tree, &context(AgentRole::Claimer, Posture::Eco, DangerLevel::None)), AgentAction::Claim);
        assert_eq!(decide(&tree, &context(AgentRole::Claimer, Posture::Eco, DangerLevel::Low)), AgentAction::Idle);
    }
}
