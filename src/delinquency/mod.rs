//! Delinquency roll-rate modeling
//!
//! Splits each period's outstanding balance across delinquency buckets using
//! an 8x8 transition matrix.

mod matrix;
mod model;

pub use matrix::TransitionMatrix;
pub use model::{apply_transitions, DelinqArrays};

use serde::{Deserialize, Serialize};

/// Number of delinquency states tracked
pub const NUM_STATES: usize = 8;

/// Delinquency status, ordered from current to defaulted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DelinquencyState {
    Performing,
    Dq30,
    Dq60,
    Dq90,
    Dq120,
    Dq150,
    Dq180,
    Default,
}

impl DelinquencyState {
    /// All states in matrix row/column order
    pub const ALL: [DelinquencyState; NUM_STATES] = [
        DelinquencyState::Performing,
        DelinquencyState::Dq30,
        DelinquencyState::Dq60,
        DelinquencyState::Dq90,
        DelinquencyState::Dq120,
        DelinquencyState::Dq150,
        DelinquencyState::Dq180,
        DelinquencyState::Default,
    ];

    /// Row/column index in the transition matrix
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            DelinquencyState::Performing => "Performing",
            DelinquencyState::Dq30 => "DQ30",
            DelinquencyState::Dq60 => "DQ60",
            DelinquencyState::Dq90 => "DQ90",
            DelinquencyState::Dq120 => "DQ120",
            DelinquencyState::Dq150 => "DQ150",
            DelinquencyState::Dq180 => "DQ180",
            DelinquencyState::Default => "Default",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_order() {
        for (i, state) in DelinquencyState::ALL.iter().enumerate() {
            assert_eq!(state.index(), i);
        }
        assert_eq!(DelinquencyState::Default.name(), "Default");
    }
}
