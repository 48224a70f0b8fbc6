use criterion::{black_box, criterion_group, criterion_main, Criterion};
use screeps_swarm::features::OvermindFeatures;
use screeps_swarm::jobs::behavior::agent_tree;
use screeps_swarm::jobs::data::*;
use screeps_swarm::military::threatmap::DangerLevel;
use screeps_swarm::operations::overmind::rebuild_strategic_state;
use screeps_swarm::posture::data::Posture;
use screeps_swarm::room::data::*;
use screeps_swarm::signals::field::SignalCategory;

fn world(rooms: i32) -> Vec<RoomRecord> {
    (0..rooms)
        .map(|i| {
            let mut record = RoomRecord::new(RoomName::from_coords(i % 30 - 15, i / 30 - 15));

            record.ownership = match i % 5 {
                0 => RoomOwnership::Mine,
                1 | 2 => RoomOwnership::Neutral,
                3 => RoomOwnership::Hostile,
                _ => RoomOwnership::Unknown,
            };
            record.controller_level = (i % 9) as u8;
            record.signals.emit(SignalCategory::Expand, (i % 41) as f32);
            record.signals.emit(SignalCategory::War, (i % 37) as f32);
            record.signals.emit(SignalCategory::NukeTarget, (i % 23) as f32);
            record
        })
        .collect()
}

fn bench_rebuild(c: &mut Criterion) {
    let features = OvermindFeatures::default();
    let mut group = c.benchmark_group("overmind_rebuild");

    for rooms in [50, 250, 900] {
        let records = world(rooms);
        let refs: Vec<&RoomRecord> = records.iter().collect();

        group.bench_function(format!("rooms{}", rooms), |b| {
            b.iter(|| rebuild_strategic_state(black_box(&refs), 1, &features))
        });
    }

    group.finish();
}

fn bench_tree(c: &mut Criterion) {
    let tree = agent_tree().unwrap();
    let roles = [
        AgentRole::Harvester,
        AgentRole::Hauler,
        AgentRole::Upgrader,
        AgentRole::Builder,
        AgentRole::Defender,
        AgentRole::Attacker,
        AgentRole::Healer,
        AgentRole::Claimer,
        AgentRole::Scout,
    ];

    let contexts: Vec<AgentContext> = (0..1000)
        .map(|i| {
            let mut agent = AgentState::new("bench", RoomName::from_coords(0, 0), roles[i % roles.len()]);
            agent.carrying_energy = i % 2 == 0;
            agent.hostiles_nearby = (i % 4) as u32;

            AgentContext {
                agent,
                posture: if i % 3 == 0 { Posture::War } else { Posture::Eco },
                danger: if i % 3 == 0 { DangerLevel::High } else { DangerLevel::None },
            }
        })
        .collect();

    c.bench_function("tree_evaluation_agents1000", |b| {
        b.iter(|| {
            for context in contexts.iter() {
                let _ = black_box(tree.evaluate(context));
            }
        })
    });
}

criterion_group!(benches, bench_rebuild, bench_tree);
criterion_main!(benches);
