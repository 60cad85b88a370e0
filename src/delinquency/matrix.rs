//! Transition matrix between delinquency states

use super::{DelinquencyState, NUM_STATES};
use crate::loan::LoanDescriptor;

/// Monthly roll rates: `rows[from][to]` is the fraction of the balance in
/// state `from` that moves to state `to` over one period.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionMatrix {
    rows: [[f64; NUM_STATES]; NUM_STATES],
}

impl TransitionMatrix {
    /// Built-in roll rates
    pub fn default_roll_rates() -> Self {
        Self {
            // Each row sums to 1.0
            rows: [
                [0.98, 0.02, 0.00, 0.00, 0.00, 0.00, 0.00, 0.00], // Performing
                [0.50, 0.25, 0.25, 0.00, 0.00, 0.00, 0.00, 0.00], // DQ30
                [0.25, 0.10, 0.15, 0.50, 0.00, 0.00, 0.00, 0.00], // DQ60
                [0.10, 0.05, 0.05, 0.15, 0.65, 0.00, 0.00, 0.00], // DQ90
                [0.05, 0.00, 0.05, 0.05, 0.15, 0.70, 0.00, 0.00], // DQ120
                [0.05, 0.00, 0.00, 0.05, 0.05, 0.15, 0.70, 0.00], // DQ150
                [0.02, 0.00, 0.00, 0.00, 0.03, 0.05, 0.30, 0.60], // DQ180
                [0.00, 0.00, 0.00, 0.00, 0.00, 0.00, 0.00, 1.00], // Default (absorbing)
            ],
        }
    }

    /// Build from explicit rows
    pub fn from_rows(rows: [[f64; NUM_STATES]; NUM_STATES]) -> Self {
        Self { rows }
    }

    /// Matrix for a loan: caller-supplied rows where present, built-in rows otherwise
    ///
    /// Supplied rows are taken as-is. A row of the wrong length (which the
    /// validator rejects) is ignored in favour of the built-in row.
    pub fn for_loan(loan: &LoanDescriptor) -> Self {
        Self::default_roll_rates().with_loan_overrides(loan)
    }

    /// Copy of this matrix with the loan's supplied rows swapped in
    pub fn with_loan_overrides(&self, loan: &LoanDescriptor) -> Self {
        let mut matrix = self.clone();
        for state in DelinquencyState::ALL {
            if let Some(row) = loan.transition(state) {
                if let Ok(row) = <[f64; NUM_STATES]>::try_from(row) {
                    matrix.rows[state.index()] = row;
                }
            }
        }
        matrix
    }

    pub fn row(&self, from: DelinquencyState) -> &[f64; NUM_STATES] {
        &self.rows[from.index()]
    }

    /// Transition probability from one state to another
    pub fn get(&self, from: DelinquencyState, to: DelinquencyState) -> f64 {
        self.rows[from.index()][to.index()]
    }

    /// Row-vector times matrix: `dest[j] = sum_i src[i] * m[i][j]`
    pub fn apply(&self, src: &[f64; NUM_STATES]) -> [f64; NUM_STATES] {
        let mut dest = [0.0; NUM_STATES];
        for (i, &amount) in src.iter().enumerate() {
            if amount == 0.0 {
                continue;
            }
            for (j, &p) in self.rows[i].iter().enumerate() {
                dest[j] += amount * p;
            }
        }
        dest
    }

    /// Sum of each row, in state order
    pub fn row_sums(&self) -> [f64; NUM_STATES] {
        let mut sums = [0.0; NUM_STATES];
        for (i, row) in self.rows.iter().enumerate() {
            sums[i] = row.iter().sum();
        }
        sums
    }
}

impl Default for TransitionMatrix {
    fn default() -> Self {
        Self::default_roll_rates()
    }
}
