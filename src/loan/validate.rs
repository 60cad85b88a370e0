//! Loan descriptor validation
//!
//! Validation is pure: it never mutates the descriptor and never panics.
//! Transition rows are checked for shape and sign; their row sums are only
//! checked when strict mode is requested, because the delinquency model
//! rescales each period's distribution anyway.

use super::data::{LoanDescriptor, MAX_ID_LEN};
use crate::delinquency::{DelinquencyState, NUM_STATES};
use crate::error::ValidationError;

/// Longest supported remaining term (40 years)
pub const MAX_WAM: u32 = 480;

/// Upper bound on WAC in percentage points
pub const MAX_WAC: f64 = 30.0;

/// Sanity limit on a single loan's balance
pub const MAX_FACE: f64 = 1e8;

/// Tolerance for transition row sums in strict mode
pub const ROW_SUM_TOLERANCE: f64 = 1e-6;

/// Knobs for the validator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Reject transition rows that do not sum to 1.0
    pub strict_transition_rows: bool,
}

/// Validate with default options
pub fn validate(loan: &LoanDescriptor) -> Result<(), ValidationError> {
    validate_with(loan, ValidationOptions::default())
}

/// Validate a loan descriptor
pub fn validate_with(
    loan: &LoanDescriptor,
    options: ValidationOptions,
) -> Result<(), ValidationError> {
    if loan.id.is_empty() {
        return Err(ValidationError::EmptyId);
    }
    let id_len = loan.id.chars().count();
    if id_len > MAX_ID_LEN {
        return Err(ValidationError::IdTooLong { len: id_len, max: MAX_ID_LEN });
    }
    if loan.wam < 1 || loan.wam > i64::from(MAX_WAM) {
        return Err(ValidationError::WamOutOfRange(loan.wam));
    }
    // Negated comparisons so NaN falls into the error branch
    if !(loan.wac >= 0.0 && loan.wac <= MAX_WAC) {
        return Err(ValidationError::WacOutOfRange(loan.wac));
    }
    if !(loan.face > 0.0 && loan.face <= MAX_FACE) {
        return Err(ValidationError::FaceOutOfRange(loan.face));
    }
    if !(loan.prepay_cpr >= 0.0 && loan.prepay_cpr < 1.0) {
        return Err(ValidationError::CprOutOfRange(loan.prepay_cpr));
    }

    if let Some(smm) = &loan.smm_arr {
        if smm.len() != loan.term() as usize {
            return Err(ValidationError::SmmLength {
                expected: loan.term() as usize,
                len: smm.len(),
            });
        }
        if let Some((index, &value)) = smm
            .iter()
            .enumerate()
            .find(|(_, v)| !(**v >= 0.0 && **v <= 1.0))
        {
            return Err(ValidationError::SmmEntry { index, value });
        }
    }

    for state in DelinquencyState::ALL {
        if let Some(row) = loan.transition(state) {
            validate_row(state, row, options)?;
        }
    }

    Ok(())
}

fn validate_row(
    state: DelinquencyState,
    row: &[f64],
    options: ValidationOptions,
) -> Result<(), ValidationError> {
    if row.len() != NUM_STATES {
        return Err(ValidationError::TransitionLength {
            state: state.name(),
            expected: NUM_STATES,
            len: row.len(),
        });
    }
    for (index, &value) in row.iter().enumerate() {
        if !(value.is_finite() && value >= 0.0) {
            return Err(ValidationError::TransitionEntry {
                state: state.name(),
                index,
                value,
            });
        }
    }
    if options.strict_transition_rows {
        let sum: f64 = row.iter().sum();
        if (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
            return Err(ValidationError::TransitionRowSum { state: state.name(), sum });
        }
    }
    Ok(())
}
