//! Prepayment assumptions
//!
//! Converts an annual conditional prepayment rate (CPR) into the monthly
//! single monthly mortality (SMM) schedule consumed by the amortization engine.

use serde::{Deserialize, Serialize};

use crate::loan::LoanDescriptor;

/// Convert annual CPR to monthly SMM
/// SMM = 1 - (1 - CPR)^(1/12)
pub fn cpr_to_smm(cpr: f64) -> f64 {
    1.0 - (1.0 - cpr).powf(1.0 / 12.0)
}

/// Convert monthly SMM back to annual CPR
/// CPR = 1 - (1 - SMM)^12
pub fn smm_to_cpr(smm: f64) -> f64 {
    1.0 - (1.0 - smm).powi(12)
}

/// Monthly SMM rates, one per remaining period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepaymentSchedule {
    smm: Vec<f64>,
}

impl PrepaymentSchedule {
    /// Constant-speed schedule derived from CPR
    ///
    /// Prepayment speed is held flat for the life of the loan (no seasoning
    /// ramp). A zero CPR yields an all-zero schedule.
    pub fn from_cpr(cpr: f64, wam: u32) -> Self {
        let smm = if cpr > 0.0 { cpr_to_smm(cpr) } else { 0.0 };
        Self {
            smm: vec![smm; wam as usize],
        }
    }

    /// Schedule with no prepayment
    pub fn zero(wam: u32) -> Self {
        Self {
            smm: vec![0.0; wam as usize],
        }
    }

    /// Caller-supplied period-varying schedule
    pub fn from_smm(smm: Vec<f64>) -> Self {
        Self { smm }
    }

    /// Build the schedule for a loan
    ///
    /// A positive CPR always wins. With zero CPR, a supplied SMM vector is used
    /// when its length matches the loan's term; otherwise the schedule is flat zero.
    pub fn for_loan(loan: &LoanDescriptor) -> Self {
        if loan.prepay_cpr > 0.0 {
            log::debug!("Converting CPR to SMM array for loan {}", loan.id);
            return Self::from_cpr(loan.prepay_cpr, loan.term());
        }
        match &loan.smm_arr {
            Some(smm) if smm.len() == loan.term() as usize => Self::from_smm(smm.clone()),
            _ => Self::zero(loan.term()),
        }
    }

    /// SMM for a 0-based period index; zero beyond the end of the schedule
    pub fn get(&self, index: usize) -> f64 {
        self.smm.get(index).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.smm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.smm.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.smm
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_from_cpr() {
        let schedule = PrepaymentSchedule::from_cpr(0.05, 360);
        assert_eq!(schedule.len(), 360);

        let expected = 1.0 - (1.0 - 0.05_f64).powf(1.0 / 12.0);
        for &smm in schedule.as_slice() {
            assert_abs_diff_eq!(smm, expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_zero_cpr() {
        let schedule = PrepaymentSchedule::from_cpr(0.0, 120);
        assert_eq!(schedule.len(), 120);
        assert!(schedule.as_slice().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_typical_speed() {
        // 6% CPR is the standard 100% PSA plateau
        let smm = cpr_to_smm(0.06);
        assert_abs_diff_eq!(smm, 0.005143, epsilon = 1e-6);
    }

    #[test]
    fn test_round_trip() {
        for cpr in [0.001, 0.02, 0.06, 0.15, 0.20, 0.50, 0.99] {
            let smm = cpr_to_smm(cpr);
            assert_abs_diff_eq!(smm_to_cpr(smm), cpr, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_length_tracks_term() {
        // Same CPR, different terms must never share a schedule length
        assert_eq!(PrepaymentSchedule::from_cpr(0.1, 12).len(), 12);
        assert_eq!(PrepaymentSchedule::from_cpr(0.1, 1).len(), 1);
        assert_eq!(PrepaymentSchedule::from_cpr(0.1, 480).len(), 480);
    }

    #[test]
    fn test_for_loan_prefers_cpr() {
        let mut loan = LoanDescriptor::new("A", 3, 5.0, 1000.0).with_cpr(0.12);
        loan.smm_arr = Some(vec![0.5, 0.5, 0.5]);
        let schedule = PrepaymentSchedule::for_loan(&loan);
        assert_abs_diff_eq!(schedule.get(0), cpr_to_smm(0.12), epsilon = 1e-12);
    }

    #[test]
    fn test_for_loan_uses_smm_array() {
        let mut loan = LoanDescriptor::new("A", 3, 5.0, 1000.0);
        loan.smm_arr = Some(vec![0.01, 0.02, 0.03]);
        let schedule = PrepaymentSchedule::for_loan(&loan);
        assert_eq!(schedule.as_slice(), &[0.01, 0.02, 0.03]);

        // Mismatched length falls back to zero
        loan.smm_arr = Some(vec![0.01]);
        assert_eq!(PrepaymentSchedule::for_loan(&loan), PrepaymentSchedule::zero(3));
    }

    #[test]
    fn test_get_past_end() {
        let schedule = PrepaymentSchedule::from_cpr(0.1, 2);
        assert_eq!(schedule.get(5), 0.0);
    }
}
