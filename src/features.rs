//! Tunable constants for the swarm, loaded from host supplied JSON.
//!
//! Every section defaults field by field, so a partial document only overrides
//! what it names. Malformed documents fall back to the defaults with a warning
//! rather than halting the control loop.

use crate::signals::field::SignalCategory;
use log::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SignalFeatures {
    /// Multiplier applied to every category once per tick. Must be in `[0, 1)`.
    pub decay_factor: f32,
    pub diffusion_fraction: f32,
    /// Source values below this are not diffused.
    pub diffusion_min: f32,
    pub diffusing_categories: Vec<SignalCategory>,
    pub dominant_floor: f32,
    pub build_per_construction_site: f32,
    pub build_per_missing_structure: f32,
    pub defense_per_damaged_structure: f32,
    pub upgrade_downgrade_ticks: u32,
    pub upgrade_downgrade_amount: f32,
    pub upgrade_baseline: f32,
    pub harvest_low_energy: u32,
    pub harvest_amount: f32,
    pub logistics_per_energy: f32,
    pub expand_energy_surplus: u32,
    pub expand_min_controller_level: u8,
    pub expand_amount: f32,
    pub hostile_structure_strike_amount: f32,
}

impl Default for SignalFeatures {
    fn default() -> SignalFeatures {
        SignalFeatures {
            decay_factor: 0.95,
            diffusion_fraction: 0.1,
            diffusion_min: 1.0,
            diffusing_categories: vec![SignalCategory::Expand, SignalCategory::War, SignalCategory::Harvest],
            dominant_floor: 1.0,
            build_per_construction_site: 1.0,
            build_per_missing_structure: 2.0,
            defense_per_damaged_structure: 0.5,
            upgrade_downgrade_ticks: 5000,
            upgrade_downgrade_amount: 10.0,
            upgrade_baseline: 1.0,
            harvest_low_energy: 20_000,
            harvest_amount: 3.0,
            logistics_per_energy: 1.0 / 10_000.0,
            expand_energy_surplus: 100_000,
            expand_min_controller_level: 4,
            expand_amount: 5.0,
            hostile_structure_strike_amount: 10.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThreatFeatures {
    pub medium_hostiles: u32,
    pub medium_damage: f32,
    pub critical_hostiles: u32,
    pub critical_damage: f32,
    pub war_per_danger: f32,
    pub defense_per_danger: f32,
    pub defense_per_hostile: f32,
    pub siege_per_nuke: f32,
    pub nuke_target_per_nuke: f32,
}

impl Default for ThreatFeatures {
    fn default() -> ThreatFeatures {
        ThreatFeatures {
            medium_hostiles: 3,
            medium_damage: 500.0,
            critical_hostiles: 10,
            critical_damage: 2000.0,
            war_per_danger: 5.0,
            defense_per_danger: 10.0,
            defense_per_hostile: 2.0,
            siege_per_nuke: 50.0,
            nuke_target_per_nuke: 50.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PostureFeatures {
    /// Expand signal a safe room must exceed before switching to the expand posture.
    pub expand_threshold: f32,
}

impl Default for PostureFeatures {
    fn default() -> PostureFeatures {
        PostureFeatures { expand_threshold: 30.0 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OvermindFeatures {
    pub claim: bool,
    pub war: bool,
    pub strike: bool,
    pub claim_min_signal: f32,
    pub war_min_signal: f32,
    pub strike_maturity_weight: f32,
    pub strike_structure_weight: f32,
    pub strike_war_weight: f32,
    pub strike_distance_weight: f32,
    pub strike_min_score: f32,
    pub max_claim_queue: usize,
    pub max_war_targets: usize,
    pub max_strike_candidates: usize,
}

impl Default for OvermindFeatures {
    fn default() -> OvermindFeatures {
        OvermindFeatures {
            claim: true,
            war: true,
            strike: true,
            claim_min_signal: 5.0,
            war_min_signal: 20.0,
            strike_maturity_weight: 5.0,
            strike_structure_weight: 0.5,
            strike_war_weight: 0.3,
            strike_distance_weight: 1.0,
            strike_min_score: 20.0,
            max_claim_queue: 10,
            max_war_targets: 10,
            max_strike_candidates: 5,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Features {
    pub signals: SignalFeatures,
    pub threat: ThreatFeatures,
    pub posture: PostureFeatures,
    pub overmind: OvermindFeatures,
}

impl Features {
    /// Parse features from JSON, falling back to defaults when the document is unusable.
    pub fn from_json(data: &str) -> Features {
        match serde_json::from_str::<Features>(data) {
            Ok(features) => features.sanitized(),
            Err(err) => {
                warn!("Discarding malformed feature configuration, using defaults: {}", err);

                Features::default()
            }
        }
    }

    /// Replace values that would break signal bounds with their defaults.
    pub fn sanitized(mut self) -> Features {
        let defaults = SignalFeatures::default();

        if !(self.signals.decay_factor.is_finite() && (0.0..1.0).contains(&self.signals.decay_factor)) {
            warn!("Decay factor {} out of range, using {}", self.signals.decay_factor, defaults.decay_factor);

            self.signals.decay_factor = defaults.decay_factor;
        }

        if !(self.signals.diffusion_fraction.is_finite() && (0.0..=1.0).contains(&self.signals.diffusion_fraction)) {
            warn!(
                "Diffusion fraction {} out of range, using {}",
                self.signals.diffusion_fraction, defaults.diffusion_fraction
            );

            self.signals.diffusion_fraction = defaults.diffusion_fraction;
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_documents_override_only_named_fields() {
        let features = Features::from_json(r#"{"posture": {"expandThreshold": 45.0}, "signals": {"decayFactor": 0.9}}"#);

        assert_eq!(features.posture.expand_threshold, 45.0);
        assert_eq!(features.signals.decay_factor, 0.9);
        assert_eq!(features.threat, ThreatFeatures::default());
        assert_eq!(features.overmind, OvermindFeatures::default());
    }

    #[test]
    fn malformed_documents_fall_back_to_defaults() {
        assert_eq!(Features::from_json("not json"), Features::default());
        assert_eq!(Features::from_json(r#"{"threat": {"criticalHostiles": "many"}}"#), Features::default());
    }

    #[test]
    fn out_of_range_decay_is_replaced() {
        let features = Features::from_json(r#"{"signals": {"decayFactor": 1.5, "diffusionFraction": -1.0}}"#);

        assert_eq!(features.signals.decay_factor, SignalFeatures::default().decay_factor);
        assert_eq!(features.signals.diffusion_fraction, SignalFeatures::default().diffusion_fraction);
    }
}
