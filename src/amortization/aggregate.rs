//! Pool-level cashflows summed across loans by period

use serde::{Deserialize, Serialize};

use super::table::LoanCashflow;
use super::round_to_cent;

/// Aggregated monthly results across all loans in a pool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolPeriod {
    pub period: u32,
    pub total_beg_bal: f64,
    pub total_interest: f64,
    pub total_principal: f64,
    pub total_prepayment: f64,
    pub total_end_bal: f64,
    /// Balance in any delinquent bucket (DQ30 through DQ180) for modeled loans
    pub total_delinquent: f64,
    /// Balance in the Default bucket for modeled loans
    pub total_default: f64,
}

/// Period-by-period pool cashflow
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolCashflow {
    pub loan_count: usize,
    pub periods: Vec<PoolPeriod>,
}

impl PoolCashflow {
    /// Sum loan cashflows by period; the pool runs as long as its longest loan
    pub fn aggregate(results: &[LoanCashflow]) -> Self {
        let horizon = results.iter().map(|r| r.cashflow.len()).max().unwrap_or(0);
        let mut periods: Vec<PoolPeriod> = (1..=horizon as u32)
            .map(|p| PoolPeriod { period: p, ..Default::default() })
            .collect();

        for result in results {
            let table = &result.cashflow;
            for (idx, agg) in periods.iter_mut().enumerate().take(table.len()) {
                agg.total_beg_bal += table.beg_bal[idx];
                agg.total_interest += table.interest[idx];
                agg.total_principal += table.principal[idx];
                agg.total_prepayment += table.prepay_amount_arr[idx];
                agg.total_end_bal += table.end_bal[idx];

                if let Some(buckets) = table.delinq_arrays.period(idx) {
                    agg.total_delinquent += buckets[1..7].iter().sum::<f64>();
                    agg.total_default += buckets[7];
                }
            }
        }

        for agg in &mut periods {
            agg.total_beg_bal = round_to_cent(agg.total_beg_bal);
            agg.total_interest = round_to_cent(agg.total_interest);
            agg.total_principal = round_to_cent(agg.total_principal);
            agg.total_prepayment = round_to_cent(agg.total_prepayment);
            agg.total_end_bal = round_to_cent(agg.total_end_bal);
            agg.total_delinquent = round_to_cent(agg.total_delinquent);
            agg.total_default = round_to_cent(agg.total_default);
        }

        Self {
            loan_count: results.len(),
            periods,
        }
    }

    /// Row for a 1-based period number
    pub fn period(&self, period: u32) -> Option<&PoolPeriod> {
        let idx = (period as usize).checked_sub(1)?;
        self.periods.get(idx)
    }
}
