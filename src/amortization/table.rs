//! Amortization table and per-loan result types

use serde::{Deserialize, Serialize};

use crate::delinquency::DelinqArrays;

/// Complete amortization schedule for one loan.
///
/// Seven parallel sequences of length `wam`, indexed by period, plus the
/// delinquency bucket arrays when roll-rate modeling is enabled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AmortizationTable {
    /// Beginning balance for each period
    pub beg_bal: Vec<f64>,
    /// Interest for each period
    pub interest: Vec<f64>,
    /// Scheduled principal for each period
    pub principal: Vec<f64>,
    /// Balance after scheduled principal, before prepayment
    pub sched_bal: Vec<f64>,
    /// Prepayment for each period
    pub prepay_amount_arr: Vec<f64>,
    /// Ending balance for each period
    pub end_bal: Vec<f64>,
    /// Period numbers (1, 2, 3, ...)
    pub period: Vec<u32>,
    /// Delinquency bucket balances (empty unless modeled)
    pub delinq_arrays: DelinqArrays,
}

impl AmortizationTable {
    pub(crate) fn with_capacity(n: usize) -> Self {
        Self {
            beg_bal: Vec::with_capacity(n),
            interest: Vec::with_capacity(n),
            principal: Vec::with_capacity(n),
            sched_bal: Vec::with_capacity(n),
            prepay_amount_arr: Vec::with_capacity(n),
            end_bal: Vec::with_capacity(n),
            period: Vec::with_capacity(n),
            delinq_arrays: DelinqArrays::default(),
        }
    }

    /// Number of periods
    pub fn len(&self) -> usize {
        self.period.len()
    }

    pub fn is_empty(&self) -> bool {
        self.period.is_empty()
    }

    /// Ending balance of the final period (0.0 for an empty table)
    pub fn terminal_balance(&self) -> f64 {
        self.end_bal.last().copied().unwrap_or(0.0)
    }

    /// Totals and weighted average life
    pub fn summary(&self) -> CashflowSummary {
        let total_interest: f64 = self.interest.iter().sum();
        let total_principal: f64 = self.principal.iter().sum();
        let total_prepayment: f64 = self.prepay_amount_arr.iter().sum();

        // WAL = sum(t * principal_t) / sum(principal_t), in years
        let mut weighted = 0.0;
        let mut returned = 0.0;
        for i in 0..self.len() {
            let paid = self.principal[i] + self.prepay_amount_arr[i];
            weighted += f64::from(self.period[i]) * paid;
            returned += paid;
        }
        let wal_years = if returned > 0.0 {
            weighted / returned / 12.0
        } else {
            0.0
        };

        CashflowSummary {
            total_interest: super::round_to_cent(total_interest),
            total_principal: super::round_to_cent(total_principal),
            total_prepayment: super::round_to_cent(total_prepayment),
            wal_years,
        }
    }
}

/// Aggregate measures over a loan's schedule
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CashflowSummary {
    pub total_interest: f64,
    pub total_principal: f64,
    pub total_prepayment: f64,
    /// Weighted average life of principal returned, in years
    pub wal_years: f64,
}

/// Result for one loan in a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanCashflow {
    pub loan_id: String,
    pub cashflow: AmortizationTable,
    pub summary: CashflowSummary,
}

impl LoanCashflow {
    pub fn new(loan_id: impl Into<String>, cashflow: AmortizationTable) -> Self {
        let summary = cashflow.summary();
        Self {
            loan_id: loan_id.into(),
            cashflow,
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_wal() {
        // Two-period bullet-like schedule: 100 returned in period 1, 300 in period 2
        let table = AmortizationTable {
            beg_bal: vec![400.0, 300.0],
            interest: vec![2.0, 1.5],
            principal: vec![50.0, 300.0],
            sched_bal: vec![350.0, 0.0],
            prepay_amount_arr: vec![50.0, 0.0],
            end_bal: vec![300.0, 0.0],
            period: vec![1, 2],
            delinq_arrays: DelinqArrays::default(),
        };
        let summary = table.summary();

        assert_eq!(summary.total_interest, 3.5);
        assert_eq!(summary.total_principal, 350.0);
        assert_eq!(summary.total_prepayment, 50.0);
        assert!((summary.wal_years - (100.0 + 600.0) / 400.0 / 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_table() {
        let table = AmortizationTable::default();
        assert!(table.is_empty());
        assert_eq!(table.terminal_balance(), 0.0);
        assert_eq!(table.summary().wal_years, 0.0);
    }

    #[test]
    fn test_serialized_field_names() {
        let value = serde_json::to_value(LoanCashflow::new("A", AmortizationTable::default())).unwrap();
        assert_eq!(value["loan_id"], "A");
        for key in ["beg_bal", "interest", "principal", "sched_bal", "prepay_amount_arr", "end_bal", "period"] {
            assert!(value["cashflow"].get(key).is_some(), "missing {key}");
        }
        assert!(value["cashflow"]["delinq_arrays"]["perf_arr"].as_array().unwrap().is_empty());
    }
}
