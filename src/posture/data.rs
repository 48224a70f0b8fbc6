//! Room operating postures and the static tables keyed by them.
//!
//! Posture is recomputed from scratch every tick; nothing here remembers the
//! previous posture, so a restored snapshot always yields the same answer.

use crate::features::PostureFeatures;
use crate::military::threatmap::DangerLevel;
use crate::room::data::*;
use crate::signals::field::SignalCategory;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Posture {
    #[default]
    Eco,
    Expand,
    Defensive,
    War,
    Siege,
    Evacuate,
    NukePrep,
}

impl Display for Posture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Posture::Eco => "eco",
            Posture::Expand => "expand",
            Posture::Defensive => "defensive",
            Posture::War => "war",
            Posture::Siege => "siege",
            Posture::Evacuate => "evacuate",
            Posture::NukePrep => "nukePrep",
        };

        write!(f, "{}", name)
    }
}

/// Select the posture for a room. Rule order is the tie-break: an override
/// beats everything, and any danger beats the desire to expand.
pub fn determine_posture(record: &RoomRecord, strategic_override: Option<Posture>, features: &PostureFeatures) -> Posture {
    if let Some(posture) = strategic_override {
        return posture;
    }

    match record.danger {
        DangerLevel::Critical => Posture::Siege,
        DangerLevel::High => Posture::War,
        DangerLevel::Low => Posture::Defensive,
        DangerLevel::None => {
            if record.signals.get(SignalCategory::Expand) > features.expand_threshold {
                Posture::Expand
            } else {
                Posture::Eco
            }
        }
    }
}

// ─── Spawn and resource tables ───────────────────────────────────────────────

/// Relative spawn weights. Each profile sums to 1.0.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnProfile {
    pub economy: f32,
    pub military: f32,
    pub utility: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourcePriorities {
    pub upgrade: f32,
    pub build: f32,
    pub repair: f32,
    pub military: f32,
    pub logistics: f32,
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct PostureCapabilities: u8 {
        const BUILD = 1 << 0;
        const UPGRADE = 1 << 1;
        const EXPAND = 1 << 2;
        const COMBAT = 1 << 3;
    }
}

impl Posture {
    pub fn spawn_profile(&self) -> SpawnProfile {
        let (economy, military, utility) = match self {
            Posture::Eco => (0.75, 0.05, 0.20),
            Posture::Expand => (0.60, 0.10, 0.30),
            Posture::Defensive => (0.45, 0.45, 0.10),
            Posture::War => (0.30, 0.60, 0.10),
            Posture::Siege => (0.15, 0.80, 0.05),
            Posture::Evacuate => (0.10, 0.10, 0.80),
            Posture::NukePrep => (0.50, 0.25, 0.25),
        };

        SpawnProfile { economy, military, utility }
    }

    pub fn resource_priorities(&self) -> ResourcePriorities {
        let (upgrade, build, repair, military, logistics) = match self {
            Posture::Eco => (1.0, 0.8, 0.5, 0.1, 0.6),
            Posture::Expand => (0.6, 1.0, 0.4, 0.2, 0.8),
            Posture::Defensive => (0.4, 0.6, 0.9, 0.8, 0.5),
            Posture::War => (0.1, 0.4, 0.9, 1.0, 0.6),
            Posture::Siege => (0.0, 0.1, 1.0, 1.0, 0.7),
            Posture::Evacuate => (0.0, 0.0, 0.0, 0.3, 1.0),
            Posture::NukePrep => (0.3, 0.7, 1.0, 0.6, 0.6),
        };

        ResourcePriorities {
            upgrade,
            build,
            repair,
            military,
            logistics,
        }
    }

    pub fn capabilities(&self) -> PostureCapabilities {
        match self {
            Posture::Eco | Posture::Expand => PostureCapabilities::BUILD | PostureCapabilities::UPGRADE | PostureCapabilities::EXPAND,
            Posture::Defensive => PostureCapabilities::BUILD | PostureCapabilities::UPGRADE | PostureCapabilities::COMBAT,
            Posture::War => PostureCapabilities::BUILD | PostureCapabilities::COMBAT,
            Posture::Siege => PostureCapabilities::COMBAT,
            Posture::Evacuate => PostureCapabilities::empty(),
            Posture::NukePrep => PostureCapabilities::BUILD | PostureCapabilities::UPGRADE,
        }
    }

    pub fn allows_building(&self) -> bool {
        self.capabilities().contains(PostureCapabilities::BUILD)
    }

    pub fn allows_upgrading(&self) -> bool {
        self.capabilities().contains(PostureCapabilities::UPGRADE)
    }

    pub fn allows_expansion(&self) -> bool {
        self.capabilities().contains(PostureCapabilities::EXPAND)
    }

    pub fn is_combat_posture(&self) -> bool {
        self.capabilities().contains(PostureCapabilities::COMBAT)
    }
}

// ─── Strategic overrides ─────────────────────────────────────────────────────

/// Host issued posture overrides. A room specific override wins over the
/// global one, and the global one only applies to rooms we own.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Directives {
    pub global: Option<Posture>,
    pub rooms: BTreeMap<RoomName, Posture>,
}

impl Directives {
    pub fn override_for(&self, record: &RoomRecord) -> Option<Posture> {
        self.rooms
            .get(&record.name)
            .cloned()
            .or_else(|| if record.mine() { self.global } else { None })
    }
}
