//! Amortization engine for single-loan and pool cashflows

mod table;
mod engine;
mod reconcile;
mod aggregate;

pub use table::{AmortizationTable, CashflowSummary, LoanCashflow};
pub use engine::{amortize, level_payment, AmortizationEngine};
pub use reconcile::{reconcile_final_period, RECONCILE_TOLERANCE};
pub use aggregate::{PoolCashflow, PoolPeriod};

// ============================================================================
// Monetary Rounding
// ============================================================================
// Amounts are reported at cent precision, the way servicers report them.
// Rounding happens at every step of the schedule, not just at the end.

/// Round to the nearest cent, halves away from zero
pub fn round_to_cent(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
