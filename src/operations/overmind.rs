//! Global strategic queues ("Overmind").
//!
//! The queues are rebuilt from the room records every tick and never patched
//! in place, so they always match the records exactly.

use crate::features::OvermindFeatures;
use crate::posture::data::Posture;
use crate::room::data::*;
use crate::signals::field::SignalCategory;
use itertools::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A room and the score it was ranked by.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoredRoom {
    pub room: RoomName,
    pub score: f32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StrategicState {
    pub claim_queue: Vec<RoomName>,
    pub war_targets: Vec<RoomName>,
    pub strike_candidates: Vec<RoomName>,
    /// Tick each known room was last observed.
    pub rooms_seen: BTreeMap<RoomName, u32>,
    pub last_rebuilt: Option<u32>,
}

/// Sort descending by score and keep at most `limit` entries. The sort is
/// stable, so equal scores keep the order the candidates were supplied in.
fn rank(candidates: Vec<ScoredRoom>, limit: usize) -> Vec<ScoredRoom> {
    candidates
        .into_iter()
        .sorted_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal))
        .take(limit)
        .collect()
}

pub fn build_claim_queue(records: &[&RoomRecord], features: &OvermindFeatures) -> Vec<ScoredRoom> {
    if !features.claim {
        return Vec::new();
    }

    let candidates = records
        .iter()
        .filter(|record| record.ownership.claimable())
        .map(|record| ScoredRoom {
            room: record.name,
            score: record.signals.get(SignalCategory::Expand),
        })
        .filter(|candidate| candidate.score >= features.claim_min_signal)
        .collect();

    rank(candidates, features.max_claim_queue)
}

pub fn build_war_targets(records: &[&RoomRecord], features: &OvermindFeatures) -> Vec<ScoredRoom> {
    if !features.war {
        return Vec::new();
    }

    let candidates = records
        .iter()
        .filter(|record| record.posture == Posture::War || record.signals.get(SignalCategory::War) > features.war_min_signal)
        .map(|record| ScoredRoom {
            room: record.name,
            score: record.signals.get(SignalCategory::War),
        })
        .collect();

    rank(candidates, features.max_war_targets)
}

/// Weighted value of striking `record` from the nearest owned room.
pub fn strike_score(record: &RoomRecord, distance: u32, features: &OvermindFeatures) -> f32 {
    record.controller_level as f32 * features.strike_maturity_weight
        + record.signals.get(SignalCategory::NukeTarget) * features.strike_structure_weight
        + record.signals.get(SignalCategory::War) * features.strike_war_weight
        - distance as f32 * features.strike_distance_weight
}

pub fn build_strike_candidates(records: &[&RoomRecord], features: &OvermindFeatures) -> Vec<ScoredRoom> {
    if !features.strike {
        return Vec::new();
    }

    let home_rooms: Vec<RoomName> = records.iter().filter(|record| record.mine()).map(|record| record.name).collect();

    if home_rooms.is_empty() {
        return Vec::new();
    }

    let candidates = records
        .iter()
        .filter(|record| record.ownership.hostile())
        .filter_map(|record| {
            let distance = home_rooms.iter().map(|home| home.linear_distance(&record.name)).min()?;

            Some(ScoredRoom {
                room: record.name,
                score: strike_score(record, distance, features),
            })
        })
        .filter(|candidate| candidate.score >= features.strike_min_score)
        .collect();

    rank(candidates, features.max_strike_candidates)
}

/// Build a complete strategic state from the current room records.
///
/// Records are considered in room coordinate order so equal scores always
/// rank the same way, whatever order the storage yields them in.
pub fn rebuild_strategic_state(records: &[&RoomRecord], tick: u32, features: &OvermindFeatures) -> StrategicState {
    let mut ordered: Vec<&RoomRecord> = records.to_vec();

    ordered.sort_by_key(|record| record.name);

    let names = |queue: Vec<ScoredRoom>| queue.into_iter().map(|entry| entry.room).collect::<Vec<_>>();

    StrategicState {
        claim_queue: names(build_claim_queue(&ordered, features)),
        war_targets: names(build_war_targets(&ordered, features)),
        strike_candidates: names(build_strike_candidates(&ordered, features)),
        rooms_seen: ordered
            .iter()
            .map(|record| (record.name, record.last_seen))
            .collect(),
        last_rebuilt: Some(tick),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::field::SignalVector;

    fn room(name: &str, ownership: RoomOwnership, signals: &[(SignalCategory, f32)]) -> RoomRecord {
        let mut record = RoomRecord::new(name.parse().unwrap());
        let mut vector = SignalVector::default();

        for (category, value) in signals {
            vector.emit(*category, *value);
        }

        record.ownership = ownership;
        record.signals = vector;
        record
    }

    fn names(queue: &[ScoredRoom]) -> Vec<String> {
        queue.iter().map(|entry| entry.room.to_string()).collect()
    }

    #[test]
    fn claim_queue_orders_by_expand_signal() {
        let features = OvermindFeatures::default();
        let a = room("W1N1", RoomOwnership::Neutral, &[(SignalCategory::Expand, 40.0)]);
        let b = room("W2N1", RoomOwnership::Neutral, &[(SignalCategory::Expand, 10.0)]);
        let c = room("W3N1", RoomOwnership::Neutral, &[(SignalCategory::Expand, 25.0)]);

        let queue = build_claim_queue(&[&a, &b, &c], &features);

        assert_eq!(names(&queue), vec!["W1N1", "W3N1", "W2N1"]);
    }

    #[test]
    fn claim_queue_skips_owned_and_weak_rooms() {
        let features = OvermindFeatures::default();
        let owned = room("W1N1", RoomOwnership::Mine, &[(SignalCategory::Expand, 90.0)]);
        let hostile = room("W2N1", RoomOwnership::Hostile, &[(SignalCategory::Expand, 90.0)]);
        let weak = room("W3N1", RoomOwnership::Neutral, &[(SignalCategory::Expand, 1.0)]);

        assert!(build_claim_queue(&[&owned, &hostile, &weak], &features).is_empty());
    }

    #[test]
    fn war_targets_include_war_posture_or_strong_war_signal() {
        let features = OvermindFeatures::default();
        let mut at_war = room("W1N1", RoomOwnership::Mine, &[(SignalCategory::War, 5.0)]);
        at_war.posture = Posture::War;
        let loud = room("W2N1", RoomOwnership::Hostile, &[(SignalCategory::War, 60.0)]);
        let quiet = room("W3N1", RoomOwnership::Hostile, &[(SignalCategory::War, 10.0)]);

        let targets = build_war_targets(&[&at_war, &loud, &quiet], &features);

        assert_eq!(names(&targets), vec!["W2N1", "W1N1"]);
    }

    #[test]
    fn distance_penalizes_but_does_not_exclude_strike_targets() {
        let features = OvermindFeatures::default();
        let home = room("W1N1", RoomOwnership::Mine, &[]);

        let mut near = room("W2N1", RoomOwnership::Hostile, &[(SignalCategory::NukeTarget, 20.0)]);
        near.controller_level = 6;
        let mut far = room("W20N1", RoomOwnership::Hostile, &[(SignalCategory::NukeTarget, 100.0), (SignalCategory::War, 50.0)]);
        far.controller_level = 8;
        let mut weak = room("W3N1", RoomOwnership::Hostile, &[]);
        weak.controller_level = 2;

        let candidates = build_strike_candidates(&[&home, &near, &far, &weak], &features);

        // far: 40 + 50 + 15 - 19 = 86, near: 30 + 10 - 1 = 39, weak: 10 - 2 = 8
        assert_eq!(names(&candidates), vec!["W20N1", "W2N1"]);
    }

    #[test]
    fn strike_needs_a_home_room() {
        let features = OvermindFeatures::default();
        let mut target = room("W2N1", RoomOwnership::Hostile, &[(SignalCategory::NukeTarget, 100.0)]);
        target.controller_level = 8;

        assert!(build_strike_candidates(&[&target], &features).is_empty());
    }

    #[test]
    fn queues_are_bounded() {
        let features = OvermindFeatures {
            max_claim_queue: 2,
            ..Default::default()
        };

        let rooms: Vec<RoomRecord> = (0..5)
            .map(|i| room(&format!("W{}N1", i), RoomOwnership::Neutral, &[(SignalCategory::Expand, 10.0 + i as f32)]))
            .collect();
        let refs: Vec<&RoomRecord> = rooms.iter().collect();

        assert_eq!(names(&build_claim_queue(&refs, &features)), vec!["W4N1", "W3N1"]);
    }

    #[test]
    fn equal_scores_rank_independently_of_input_order() {
        let features = OvermindFeatures::default();
        let b = room("W2N1", RoomOwnership::Neutral, &[(SignalCategory::Expand, 20.0)]);
        let a = room("W1N1", RoomOwnership::Neutral, &[(SignalCategory::Expand, 20.0)]);

        let first = rebuild_strategic_state(&[&b, &a], 10, &features);
        let second = rebuild_strategic_state(&[&a, &b], 10, &features);

        assert_eq!(first, second);
        assert_eq!(first.last_rebuilt, Some(10));
    }
}
