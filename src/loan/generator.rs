//! Synthetic loan pool generator for load testing
//!
//! Builds a deterministic pool from a fixed template of term/coupon/balance
//! cells:
//! - Term mix across 10/15/20/30-year products
//! - Coupon spread around a base WAC
//! - Balance buckets scaled to a target pool balance
//! - A share of loans flagged for delinquency modeling

use super::LoanDescriptor;
use serde::{Deserialize, Serialize};

/// Parameters for generating a loan pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolParams {
    /// Number of loans to generate
    /// Default: 1000
    #[serde(default = "default_loan_count")]
    pub loan_count: usize,

    /// Target total pool balance (default: $250M)
    #[serde(default = "default_target_balance")]
    pub target_balance: f64,

    /// Base coupon in percentage points; cells add a spread to this
    #[serde(default = "default_base_wac")]
    pub base_wac: f64,

    /// Annual CPR applied to every loan
    #[serde(default = "default_cpr")]
    pub prepay_cpr: f64,

    /// Fraction of loans with delinquency modeling enabled (0.0 to 1.0)
    #[serde(default)]
    pub dq_share: f64,

    /// Prefix for generated loan IDs
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,
}

fn default_loan_count() -> usize { 1000 }
fn default_target_balance() -> f64 { 250_000_000.0 }
fn default_base_wac() -> f64 { 5.5 }
fn default_cpr() -> f64 { 0.06 }
fn default_id_prefix() -> String { "SYN".to_string() }

impl Default for PoolParams {
    fn default() -> Self {
        Self {
            loan_count: 1000,
            target_balance: 250_000_000.0,
            base_wac: 5.5,
            prepay_cpr: 0.06,
            dq_share: 0.0,
            id_prefix: "SYN".to_string(),
        }
    }
}

/// One template cell: a term, coupon spread and relative balance weight
#[derive(Debug, Clone)]
struct PoolCell {
    wam: u32,
    wac_spread: f64,
    /// Relative balance weight before scaling to the target
    weight: f64,
}

/// Pre-computed template for generating pools
pub struct PoolTemplate {
    cells: Vec<PoolCell>,
}

impl PoolTemplate {
    pub fn new() -> Self {
        Self { cells: build_cells() }
    }

    /// Generate a loan pool based on parameters
    pub fn generate(&self, params: &PoolParams) -> Vec<LoanDescriptor> {
        if params.loan_count == 0 || self.cells.is_empty() {
            return Vec::new();
        }

        // First pass: total raw weight across the loans we will emit
        let total_weight: f64 = (0..params.loan_count)
            .map(|i| self.cells[i % self.cells.len()].weight)
            .sum();

        // Scale factor to hit the target balance
        let scale = if total_weight > 0.0 {
            params.target_balance / total_weight
        } else {
            1.0
        };

        // Every k-th loan gets delinquency modeling so the share is spread evenly
        let dq_every = if params.dq_share > 0.0 {
            Some(((1.0 / params.dq_share.min(1.0)).round() as usize).max(1))
        } else {
            None
        };

        let mut loans = Vec::with_capacity(params.loan_count);
        for i in 0..params.loan_count {
            let cell = &self.cells[i % self.cells.len()];
            let face = (cell.weight * scale).clamp(1_000.0, 1e8);
            let wac = (params.base_wac + cell.wac_spread).clamp(0.0, 30.0);
            let static_dq = dq_every.map_or(false, |k| i % k == 0);

            loans.push(
                LoanDescriptor::new(format!("{}{:06}", params.id_prefix, i + 1), cell.wam, wac, face)
                    .with_cpr(params.prepay_cpr)
                    .with_static_dq(static_dq),
            );
        }

        loans
    }
}

impl Default for PoolTemplate {
    fn default() -> Self {
        Self::new()
    }
}

/// Build template cells from the term, coupon and balance grids
fn build_cells() -> Vec<PoolCell> {
    // Format: (wam, share of pool by term)
    let terms: &[(u32, f64)] = &[
        (360, 0.70),
        (240, 0.08),
        (180, 0.17),
        (120, 0.05),
    ];
    let wac_spreads = [-0.50, -0.25, 0.0, 0.25, 0.50];
    // Relative balances for small, conforming and jumbo loans
    let balance_buckets = [150_000.0, 300_000.0, 450_000.0, 800_000.0];

    let mut cells = Vec::with_capacity(terms.len() * wac_spreads.len() * balance_buckets.len());
    for &(wam, share) in terms {
        for &wac_spread in &wac_spreads {
            for &balance in &balance_buckets {
                cells.push(PoolCell {
                    wam,
                    wac_spread,
                    weight: balance * share,
                });
            }
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loan::validate;

    #[test]
    fn test_default_generation() {
        let template = PoolTemplate::new();
        let loans = template.generate(&PoolParams::default());

        assert_eq!(loans.len(), 1000);

        // Check total balance is approximately $250M
        let total: f64 = loans.iter().map(|l| l.face).sum();
        assert!((total - 250_000_000.0).abs() / 250_000_000.0 < 0.01);

        // Every generated loan must pass validation
        assert!(loans.iter().all(|l| validate(l).is_ok()));
    }

    #[test]
    fn test_ids_unique_and_ordered() {
        let loans = PoolTemplate::new().generate(&PoolParams {
            loan_count: 25,
            ..Default::default()
        });
        assert_eq!(loans[0].id, "SYN000001");
        assert_eq!(loans[24].id, "SYN000025");
    }

    #[test]
    fn test_dq_share() {
        let params = PoolParams {
            loan_count: 100,
            dq_share: 0.25,
            ..Default::default()
        };
        let loans = PoolTemplate::new().generate(&params);
        let flagged = loans.iter().filter(|l| l.static_dq).count();
        assert_eq!(flagged, 25);
    }

    #[test]
    fn test_empty_pool() {
        let params = PoolParams { loan_count: 0, ..Default::default() };
        assert!(PoolTemplate::new().generate(&params).is_empty());
    }
}
