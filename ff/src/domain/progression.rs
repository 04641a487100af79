//! Garden progression engine
//!
//! Converts earned experience into discrete growth stages and wrap-around
//! cycles. Everything here is pure: callers own the state and persist the
//! value returned by each deposit.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// XP needed to advance one stage
pub const XP_TO_LEVEL_UP: u32 = 300;

/// Number of stages in one growth cycle
pub const STAGE_COUNT: u8 = 5;

/// Highest stage index within a cycle
pub const MAX_STAGE: u8 = STAGE_COUNT - 1;

/// Reward deposited when a completed task carries no usable reward
pub const DEFAULT_TASK_REWARD: u32 = 20;

/// Reward deposited by the manual grow trigger
pub const MANUAL_GROW_REWARD: u32 = 50;

/// Visual growth stage within a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GardenStage {
    Dormant,
    Sprout,
    Leaf,
    Tree,
    Bloom,
}

impl GardenStage {
    pub const ALL: [GardenStage; STAGE_COUNT as usize] = [
        GardenStage::Dormant,
        GardenStage::Sprout,
        GardenStage::Leaf,
        GardenStage::Tree,
        GardenStage::Bloom,
    ];

    /// Stage for an index in `[0, 4]`
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    /// Label used when describing the garden to the model
    pub fn label(self) -> &'static str {
        match self {
            Self::Dormant => "Seed",
            Self::Sprout => "Sprout",
            Self::Leaf => "Sapling",
            Self::Tree => "Tree",
            Self::Bloom => "Bloom",
        }
    }

    /// Small glyph for terminal rendering
    pub fn glyph(self) -> &'static str {
        match self {
            Self::Dormant => "·",
            Self::Sprout => "🌱",
            Self::Leaf => "🌿",
            Self::Tree => "🌳",
            Self::Bloom => "🌸",
        }
    }
}

impl std::fmt::Display for GardenStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Dormant => "dormant",
            Self::Sprout => "sprout",
            Self::Leaf => "leaf",
            Self::Tree => "tree",
            Self::Bloom => "bloom",
        };
        write!(f, "{}", name)
    }
}

/// Durable `(xp, stage, cycle)` triple
///
/// Invariant: `xp < XP_TO_LEVEL_UP` and `stage <= MAX_STAGE`. Every
/// constructor and transition in this module preserves it; values read
/// from storage are checked with [`ProgressionState::is_normalized`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgressionState {
    /// Experience accumulated within the current stage
    pub xp: u32,
    /// Growth stage within the current cycle, `0..=4`
    pub stage: u8,
    /// Completed full growth cycles
    pub cycle: u32,
}

impl ProgressionState {
    /// The zero state a fresh garden starts from
    pub const ZERO: ProgressionState = ProgressionState {
        xp: 0,
        stage: 0,
        cycle: 0,
    };

    /// Whether the value satisfies the normalization invariant
    pub fn is_normalized(&self) -> bool {
        self.xp < XP_TO_LEVEL_UP && self.stage <= MAX_STAGE
    }

    pub fn garden_stage(&self) -> GardenStage {
        GardenStage::from_index(self.stage).unwrap_or(GardenStage::Bloom)
    }

    /// 1-based level shown to the user, monotonic across cycles
    pub fn level(&self) -> u64 {
        u64::from(self.cycle) * u64::from(STAGE_COUNT) + u64::from(self.stage) + 1
    }

    /// Fraction of the current stage completed, in `[0, 1)`
    pub fn progress_ratio(&self) -> f64 {
        f64::from(self.xp) / f64::from(XP_TO_LEVEL_UP)
    }

    /// Total stages advanced since the zero state
    fn stages_total(&self) -> u64 {
        self.level() - 1
    }

    /// Apply a deposit, returning the new state and what changed
    pub fn deposit(self, amount: u32) -> Growth {
        let after = add_experience(self, amount);
        let stages_gained = after.stages_total().saturating_sub(self.stages_total());
        let cycles_completed = after.cycle.saturating_sub(self.cycle);
        debug!(
            amount,
            before = ?self,
            after = ?after,
            stages_gained,
            cycles_completed,
            "ProgressionState::deposit: applied"
        );
        Growth {
            before: self,
            after,
            amount,
            stages_gained,
            cycles_completed,
        }
    }
}

/// Add `amount` XP and resolve every resulting level-up eagerly
///
/// A zero deposit returns the state unchanged. One large deposit may advance
/// several stages or wrap a whole cycle; the loop handles all of it in one
/// call. A garden on the last representable cycle stops at its final stage.
pub fn add_experience(state: ProgressionState, amount: u32) -> ProgressionState {
    if amount == 0 {
        return state;
    }

    // u64 so xp near u32::MAX plus a deposit cannot overflow
    let mut xp = u64::from(state.xp) + u64::from(amount);
    let mut stage = state.stage;
    let mut cycle = state.cycle;

    while xp >= u64::from(XP_TO_LEVEL_UP) {
        xp -= u64::from(XP_TO_LEVEL_UP);
        stage += 1;
        if stage > MAX_STAGE {
            let Some(next) = cycle.checked_add(1) else {
                // Out of cycles: pin at the last XP point of the last stage
                return ProgressionState {
                    xp: XP_TO_LEVEL_UP - 1,
                    stage: MAX_STAGE,
                    cycle,
                };
            };
            stage = 0;
            cycle = next;
        }
    }

    ProgressionState {
        xp: xp as u32,
        stage,
        cycle,
    }
}

/// Outcome of one deposit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Growth {
    pub before: ProgressionState,
    pub after: ProgressionState,
    pub amount: u32,
    /// Stages advanced, counting across cycle wraps
    pub stages_gained: u64,
    pub cycles_completed: u32,
}

impl Growth {
    pub fn leveled_up(&self) -> bool {
        self.stages_gained > 0
    }
}
