//! Problem feature flags: which optional characteristics apply to a run.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

bitflags! {
    /// Bitset over the optional problem characteristics.
    ///
    /// Fixed once a run starts. The engine gates depot movement on
    /// `MOVING_DEPOT` and energy drain on `ELECTRIC`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FeatureFlags: u32 {
        /// Vehicle capacity and customer demand apply.
        const CAPACITATED = 1 << 0;
        /// Battery range, consumption and charging stations apply.
        const ELECTRIC = 1 << 1;
        /// Customers are released over time.
        const DYNAMIC = 1 << 2;
        /// The depot travels between candidate stops.
        const MOVING_DEPOT = 1 << 3;
    }
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self::empty()
    }
}

impl FeatureFlags {
    /// Short problem-kind label, e.g. `C`, `CD`, `CDEM`.
    pub fn kind_label(self) -> String {
        let mut label = String::new();
        for (flag, c) in [
            (Self::CAPACITATED, 'C'),
            (Self::DYNAMIC, 'D'),
            (Self::ELECTRIC, 'E'),
            (Self::MOVING_DEPOT, 'M'),
        ] {
            if self.contains(flag) {
                label.push(c);
            }
        }
        label
    }
}

impl fmt::Display for FeatureFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&self.kind_label())
        }
    }
}

impl Serialize for FeatureFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FeatureFlags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u32::deserialize(deserializer)?;
        Ok(Self::from_bits_retain(bits))
    }
}
