//! Bounded per-room signal intensities ("pheromones").
//!
//! Every category is clamped to `[SIGNAL_MIN, SIGNAL_MAX]` after each
//! mutation: values are added first and clamped second, so no operation can
//! leave a category out of range.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

pub const SIGNAL_MIN: f32 = 0.0;
pub const SIGNAL_MAX: f32 = 100.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SignalCategory {
    Harvest,
    Build,
    Upgrade,
    Expand,
    Defense,
    War,
    Siege,
    NukeTarget,
    Logistics,
}

impl SignalCategory {
    pub const COUNT: usize = 9;

    pub const ALL: [SignalCategory; SignalCategory::COUNT] = [
        SignalCategory::Harvest,
        SignalCategory::Build,
        SignalCategory::Upgrade,
        SignalCategory::Expand,
        SignalCategory::Defense,
        SignalCategory::War,
        SignalCategory::Siege,
        SignalCategory::NukeTarget,
        SignalCategory::Logistics,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

impl Display for SignalCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SignalCategory::Harvest => "harvest",
            SignalCategory::Build => "build",
            SignalCategory::Upgrade => "upgrade",
            SignalCategory::Expand => "expand",
            SignalCategory::Defense => "defense",
            SignalCategory::War => "war",
            SignalCategory::Siege => "siege",
            SignalCategory::NukeTarget => "nukeTarget",
            SignalCategory::Logistics => "logistics",
        };

        write!(f, "{}", name)
    }
}

fn clamp_signal(value: f32) -> f32 {
    if value.is_nan() {
        SIGNAL_MIN
    } else {
        value.clamp(SIGNAL_MIN, SIGNAL_MAX)
    }
}

/// Fixed set of bounded signal intensities for a single room.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<SignalCategory, f32>", into = "BTreeMap<SignalCategory, f32>")]
pub struct SignalVector {
    values: [f32; SignalCategory::COUNT],
}

impl SignalVector {
    pub fn get(&self, category: SignalCategory) -> f32 {
        self.values[category.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (SignalCategory, f32)> + '_ {
        SignalCategory::ALL.iter().map(move |category| (*category, self.get(*category)))
    }

    /// Copy of this vector with every category scaled by `factor` and floored at zero.
    pub fn decayed(&self, factor: f32) -> SignalVector {
        let mut values = self.values;

        for value in values.iter_mut() {
            *value = clamp_signal(*value * factor);
        }

        SignalVector { values }
    }

    /// Add `amount` to `category`. Non-positive and non-finite amounts are ignored.
    pub fn emit(&mut self, category: SignalCategory, amount: f32) {
        if !amount.is_finite() || amount <= 0.0 {
            return;
        }

        let value = &mut self.values[category.index()];

        *value = clamp_signal(*value + amount);
    }

    /// The single strongest category above `floor`. Ties for the maximum report nothing.
    pub fn dominant(&self, floor: f32) -> Option<SignalCategory> {
        let mut best: Option<(SignalCategory, f32)> = None;
        let mut tied = false;

        for (category, value) in self.iter() {
            match best {
                Some((_, best_value)) if value > best_value => {
                    best = Some((category, value));
                    tied = false;
                }
                Some((_, best_value)) if value == best_value => {
                    tied = true;
                }
                None => {
                    best = Some((category, value));
                }
                _ => {}
            }
        }

        match best {
            Some((category, value)) if !tied && value > floor => Some(category),
            _ => None,
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.values.iter().all(|v| *v <= SIGNAL_MIN)
    }
}

impl From<BTreeMap<SignalCategory, f32>> for SignalVector {
    fn from(map: BTreeMap<SignalCategory, f32>) -> SignalVector {
        let mut vector = SignalVector::default();

        for (category, value) in map {
            vector.values[category.index()] = clamp_signal(value);
        }

        vector
    }
}

impl From<SignalVector> for BTreeMap<SignalCategory, f32> {
    fn from(vector: SignalVector) -> BTreeMap<SignalCategory, f32> {
        vector.iter().collect()
    }
}

/// Broadcast a fraction of the source's diffusing categories into each neighbor.
///
/// The source is read only: diffusion copies awareness outward rather than
/// transferring a conserved quantity.
pub fn diffuse<'a, I>(source: &SignalVector, neighbors: I, categories: &[SignalCategory], fraction: f32)
where
    I: IntoIterator<Item = &'a mut SignalVector>,
{
    if !fraction.is_finite() || fraction <= 0.0 {
        return;
    }

    for neighbor in neighbors {
        for category in categories {
            neighbor.emit(*category, source.get(*category) * fraction);
        }
    }
}
