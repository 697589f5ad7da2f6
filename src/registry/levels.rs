use std::fmt;
use std::ops::{BitAnd, BitOr};

use serde::{Deserialize, Serialize};

/// Set of facility upgrade tiers, one bit per tier.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct FacilityLevels(u8);

impl FacilityLevels {
    pub const NONE: FacilityLevels = FacilityLevels(0x00);
    pub const LEVEL_1: FacilityLevels = FacilityLevels(0x01);
    pub const LEVEL_2: FacilityLevels = FacilityLevels(0x02);
    pub const LEVEL_3: FacilityLevels = FacilityLevels(0x04);
    pub const ALL: FacilityLevels = FacilityLevels(0x07);

    /// Number of upgrade tiers a facility can have.
    pub const TIERS: usize = 3;

    pub const fn from_bits(bits: u8) -> Self {
        FacilityLevels(bits & Self::ALL.0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// The single-bit mask for a 1-based tier.
    pub fn tier(tier: usize) -> Option<Self> {
        (1..=Self::TIERS)
            .contains(&tier)
            .then(|| FacilityLevels(1 << (tier - 1)))
    }

    /// Maps the host's upgrade state onto a tier. Facilities with a single
    /// level count as fully upgraded.
    pub fn from_upgrade_state(level_count: u32, fraction: f32) -> Self {
        if level_count <= 1 {
            return Self::LEVEL_3;
        }
        if fraction < 0.25 {
            Self::LEVEL_1
        } else if fraction < 0.75 {
            Self::LEVEL_2
        } else {
            Self::LEVEL_3
        }
    }

    pub fn intersects(self, other: FacilityLevels) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for FacilityLevels {
    type Output = FacilityLevels;

    fn bitor(self, rhs: Self) -> Self {
        FacilityLevels(self.0 | rhs.0)
    }
}

impl BitAnd for FacilityLevels {
    type Output = FacilityLevels;

    fn bitand(self, rhs: Self) -> Self {
        FacilityLevels(self.0 & rhs.0)
    }
}

impl fmt::Display for FacilityLevels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "none");
        }
        let tiers: Vec<String> = (1..=Self::TIERS)
            .filter(|&t| self.0 & (1 << (t - 1)) != 0)
            .map(|t| t.to_string())
            .collect();
        write!(f, "levels {}", tiers.join(","))
    }
}
