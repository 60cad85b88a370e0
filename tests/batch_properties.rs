//! Batch-level properties: ordering, concurrency bound, terminal balances

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use approx::assert_abs_diff_eq;
use chrono::{DateTime, Local};

use mortgage_cashflow::amortization::LoanCashflow;
use mortgage_cashflow::batch::{BatchOrchestrator, WorkerPool};
use mortgage_cashflow::error::{BatchError, PersistError, ValidationError};
use mortgage_cashflow::loan::{LoanDescriptor, PoolParams, PoolTemplate};
use mortgage_cashflow::store::{InMemoryLoanRepository, LoanRepository, ResultSink};

fn orchestrator(workers: usize) -> BatchOrchestrator {
    BatchOrchestrator::new(
        Arc::new(WorkerPool::new(workers).unwrap()),
        Arc::new(InMemoryLoanRepository::new()),
    )
}

fn mixed_pool(n: usize) -> Vec<LoanDescriptor> {
    let params = PoolParams {
        loan_count: n,
        target_balance: n as f64 * 200_000.0,
        dq_share: 0.25,
        ..Default::default()
    };
    PoolTemplate::new().generate(&params)
}

/// Tracks how many loans are inside the sink at once
#[derive(Default)]
struct ConcurrencyTracker {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl ResultSink for ConcurrencyTracker {
    fn persist(
        &self,
        _loan: &LoanDescriptor,
        _result: &LoanCashflow,
        _batch_time: &DateTime<Local>,
    ) -> Result<(), PersistError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(5));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn results_follow_input_order() {
    let loans = mixed_pool(60);
    let results = orchestrator(7).run(&loans).unwrap();

    assert_eq!(results.len(), loans.len());
    for (loan, result) in loans.iter().zip(&results) {
        assert_eq!(result.loan_id, loan.id);
    }
}

#[test]
fn permuting_input_permutes_output() {
    let loans = mixed_pool(40);
    let mut reversed = loans.clone();
    reversed.reverse();

    let orch = orchestrator(4);
    let forward = orch.run(&loans).unwrap();
    let mut backward = orch.run(&reversed).unwrap();
    backward.reverse();

    assert_eq!(forward, backward);
}

#[test]
fn worker_count_does_not_change_results() {
    let loans = mixed_pool(30);
    let sequential = orchestrator(1).run(&loans).unwrap();
    let parallel = orchestrator(16).run(&loans).unwrap();
    assert_eq!(sequential, parallel);
}

#[test]
fn at_most_w_loans_in_flight() {
    let tracker = Arc::new(ConcurrencyTracker::default());
    let orch = orchestrator(5).with_sink(tracker.clone());

    let loans: Vec<LoanDescriptor> = (0..50)
        .map(|i| LoanDescriptor::new(format!("L{i:03}"), 24, 5.0, 50_000.0))
        .collect();
    orch.run(&loans).unwrap();

    assert_eq!(tracker.calls.load(Ordering::SeqCst), 50);
    let peak = tracker.peak.load(Ordering::SeqCst);
    assert!(peak >= 1 && peak <= 5, "peak concurrency {peak}");
}

#[test]
fn every_loan_retires_its_balance() {
    let loans = mixed_pool(100);
    for result in orchestrator(8).run(&loans).unwrap() {
        let table = &result.cashflow;
        assert!(table.terminal_balance().abs() < 0.01, "loan {}", result.loan_id);
        assert!(table.end_bal.iter().all(|&b| b >= 0.0));
        assert!(table.prepay_amount_arr.iter().all(|&p| p >= 0.0));
    }
}

#[test]
fn reference_loan_first_period() {
    let loans = vec![LoanDescriptor::new("LOAN001", 360, 4.5, 250_000.0).with_cpr(0.06)];
    let results = orchestrator(2).run(&loans).unwrap();
    let table = &results[0].cashflow;

    assert_eq!(table.len(), 360);
    assert_abs_diff_eq!(table.beg_bal[0], 250_000.0, epsilon = 1e-9);
    assert_abs_diff_eq!(table.interest[0], 937.50, epsilon = 1e-9);
    assert_abs_diff_eq!(table.principal[0], 329.21, epsilon = 1e-9);
    assert!(table.delinq_arrays.is_empty());
}

#[test]
fn zero_cpr_has_no_prepayment() {
    let loans = vec![LoanDescriptor::new("FLAT", 180, 3.25, 150_000.0)];
    let results = orchestrator(2).run(&loans).unwrap();
    let table = &results[0].cashflow;

    assert!(table.prepay_amount_arr.iter().all(|&p| p == 0.0));
    assert!(table.terminal_balance().abs() < 0.01);
}

#[test]
fn delinquency_buckets_track_balance() {
    let loans = vec![LoanDescriptor::new("DQ", 120, 5.0, 100_000.0).with_static_dq(true)];
    let results = orchestrator(2).run(&loans).unwrap();
    let table = &results[0].cashflow;

    assert_eq!(table.delinq_arrays.len(), 120);
    for i in 0..table.len() {
        let buckets = table.delinq_arrays.period(i).unwrap();
        assert!(buckets.iter().all(|&b| b >= 0.0));
        assert_abs_diff_eq!(buckets.iter().sum::<f64>(), table.beg_bal[i], epsilon = 0.01);
    }
}

#[test]
fn zero_performing_row_keeps_balance_performing() {
    let mut loan = LoanDescriptor::new("STUCK", 24, 6.0, 20_000.0).with_static_dq(true);
    loan.performing_transition = Some(vec![0.0; 8]);

    let results = orchestrator(2).run(&[loan]).unwrap();
    let table = &results[0].cashflow;

    for i in 0..table.len() {
        let buckets = table.delinq_arrays.period(i).unwrap();
        assert_abs_diff_eq!(buckets[0], table.beg_bal[i], epsilon = 1e-9);
        assert!(buckets[1..].iter().all(|&b| b == 0.0));
    }
}

#[test]
fn invalid_loan_rejects_whole_batch() {
    let mut loans = mixed_pool(10);
    loans[6].wac = 45.0;

    let orch = orchestrator(3);
    match orch.run(&loans) {
        Err(BatchError::InvalidLoan { index, loan_id, source }) => {
            assert_eq!(index, 6);
            assert_eq!(loan_id, loans[6].id);
            assert_eq!(source, ValidationError::WacOutOfRange(45.0));
        }
        other => panic!("expected InvalidLoan, got {other:?}"),
    }
    assert_eq!(orch.repository().count(), 0);
}
