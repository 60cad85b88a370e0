//! Per-period delinquency bucket distribution

use serde::{Deserialize, Serialize};

use super::{TransitionMatrix, NUM_STATES};
use crate::amortization::round_to_cent;

/// Dollar balances by delinquency bucket, one entry per period.
///
/// All eight sequences are empty when delinquency modeling is off.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DelinqArrays {
    /// Current/performing balance
    pub perf_arr: Vec<f64>,
    pub dq30_arr: Vec<f64>,
    pub dq60_arr: Vec<f64>,
    pub dq90_arr: Vec<f64>,
    pub dq120_arr: Vec<f64>,
    pub dq150_arr: Vec<f64>,
    pub dq180_arr: Vec<f64>,
    /// Defaulted balance
    pub default_arr: Vec<f64>,
}

impl DelinqArrays {
    fn with_capacity(n: usize) -> Self {
        Self {
            perf_arr: Vec::with_capacity(n),
            dq30_arr: Vec::with_capacity(n),
            dq60_arr: Vec::with_capacity(n),
            dq90_arr: Vec::with_capacity(n),
            dq120_arr: Vec::with_capacity(n),
            dq150_arr: Vec::with_capacity(n),
            dq180_arr: Vec::with_capacity(n),
            default_arr: Vec::with_capacity(n),
        }
    }

    fn push(&mut self, v: [f64; NUM_STATES]) {
        self.perf_arr.push(v[0]);
        self.dq30_arr.push(v[1]);
        self.dq60_arr.push(v[2]);
        self.dq90_arr.push(v[3]);
        self.dq120_arr.push(v[4]);
        self.dq150_arr.push(v[5]);
        self.dq180_arr.push(v[6]);
        self.default_arr.push(v[7]);
    }

    /// Number of periods covered (0 when modeling is off)
    pub fn len(&self) -> usize {
        self.perf_arr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.perf_arr.is_empty()
    }

    /// Bucket vector for a 0-based period index
    pub fn period(&self, index: usize) -> Option<[f64; NUM_STATES]> {
        Some([
            *self.perf_arr.get(index)?,
            *self.dq30_arr.get(index)?,
            *self.dq60_arr.get(index)?,
            *self.dq90_arr.get(index)?,
            *self.dq120_arr.get(index)?,
            *self.dq150_arr.get(index)?,
            *self.dq180_arr.get(index)?,
            *self.default_arr.get(index)?,
        ])
    }
}

/// Distribute each period's outstanding balance across delinquency buckets.
///
/// Each period starts from the full balance in Performing and applies one
/// step of the transition matrix. Non-performing balances are not carried
/// from one period to the next. The result is rescaled to sum to the
/// balance (rows that do not sum to 1.0 are absorbed here) and rounded to
/// the cent, with any rounding residual booked to the largest bucket. A
/// Performing row that moves nothing leaves the whole balance in Performing.
pub fn apply_transitions(balances: &[f64], matrix: &TransitionMatrix) -> DelinqArrays {
    let mut arrays = DelinqArrays::with_capacity(balances.len());

    for &balance in balances {
        let mut prior = [0.0; NUM_STATES];
        prior[0] = balance;

        let mut dist = matrix.apply(&prior);
        let total: f64 = dist.iter().sum();

        if balance <= 0.0 {
            arrays.push([0.0; NUM_STATES]);
            continue;
        }
        if total <= 0.0 || !total.is_finite() {
            let mut kept = [0.0; NUM_STATES];
            kept[0] = round_to_cent(balance);
            arrays.push(kept);
            continue;
        }

        let scale = balance / total;
        for v in dist.iter_mut() {
            *v = round_to_cent(*v * scale);
        }

        let residual = round_to_cent(balance - dist.iter().sum::<f64>());
        if residual != 0.0 {
            let largest = dist
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(i, _)| i)
                .unwrap_or(0);
            dist[largest] = round_to_cent(dist[largest] + residual);
        }

        arrays.push(dist);
    }

    arrays
}
