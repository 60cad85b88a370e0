//! Batch orchestration: validate, fan out, collect in input order

use std::sync::{mpsc, Arc};
use std::time::Instant;

use chrono::{DateTime, Local};
use serde::Serialize;

use super::pool::WorkerPool;
use crate::amortization::{AmortizationEngine, LoanCashflow};
use crate::error::{BatchError, ValidationError};
use crate::loan::{validate_with, LoanDescriptor, ValidationOptions};
use crate::store::{LoanRepository, ResultSink};

/// Acknowledgement for a batch dispatched with [`BatchOrchestrator::submit`]
#[derive(Debug, Serialize)]
pub struct BatchReceipt {
    pub message: String,
    pub loan_count: usize,
    /// Batch timestamp, RFC 3339 in local time
    pub local_date: String,
    #[serde(skip)]
    pending: Vec<mpsc::Receiver<LoanCashflow>>,
}

impl BatchReceipt {
    /// Block until every loan in the batch has finished; results in input order.
    ///
    /// Fails with the index of the first loan whose worker exited without
    /// reporting a result.
    pub fn wait(self) -> Result<Vec<LoanCashflow>, BatchError> {
        self.pending
            .into_iter()
            .enumerate()
            .map(|(index, rx)| rx.recv().map_err(|_| BatchError::WorkerLost { index }))
            .collect()
    }
}

/// Runs batches of loans through the amortization pipeline on a bounded pool.
///
/// The default mode is fail-fast: one invalid loan rejects the whole batch
/// before any computation starts.
pub struct BatchOrchestrator {
    pool: Arc<WorkerPool>,
    engine: Arc<AmortizationEngine>,
    repository: Arc<dyn LoanRepository>,
    sink: Option<Arc<dyn ResultSink>>,
    validation: ValidationOptions,
}

impl BatchOrchestrator {
    pub fn new(pool: Arc<WorkerPool>, repository: Arc<dyn LoanRepository>) -> Self {
        Self {
            pool,
            engine: Arc::new(AmortizationEngine::default()),
            repository,
            sink: None,
            validation: ValidationOptions::default(),
        }
    }

    pub fn with_engine(mut self, engine: AmortizationEngine) -> Self {
        self.engine = Arc::new(engine);
        self
    }

    /// Persist every finished loan through `sink`
    pub fn with_sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_validation(mut self, validation: ValidationOptions) -> Self {
        self.validation = validation;
        self
    }

    pub fn worker_limit(&self) -> usize {
        self.pool.capacity()
    }

    pub fn repository(&self) -> &Arc<dyn LoanRepository> {
        &self.repository
    }

    /// Validate every loan, stopping at the first failure
    pub fn validate_batch(&self, loans: &[LoanDescriptor]) -> Result<(), BatchError> {
        for (index, loan) in loans.iter().enumerate() {
            validate_with(loan, self.validation).map_err(|source| BatchError::InvalidLoan {
                index,
                loan_id: loan.id.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Compute every loan and wait for all of them.
    ///
    /// `result[i]` belongs to `loans[i]`. The loans are recorded in the
    /// repository once the whole batch has finished.
    pub fn run(&self, loans: &[LoanDescriptor]) -> Result<Vec<LoanCashflow>, BatchError> {
        if let Err(e) = self.validate_batch(loans) {
            log::warn!("Rejected batch of {} loans: {}", loans.len(), e);
            return Err(e);
        }

        let start = Instant::now();
        let batch_time = Local::now();
        log::info!(
            "Received {} loans for processing ({} workers)",
            loans.len(),
            self.pool.capacity()
        );

        let results = self
            .pool
            .map_ordered(loans, |_, loan| self.process(loan, &batch_time));

        self.repository.append(loans);
        log::info!("Completed {} loans in {:?}", results.len(), start.elapsed());
        Ok(results)
    }

    /// Partial-success alternative to [`run`](Self::run).
    ///
    /// Each slot holds either the loan's cashflow or its own validation error;
    /// valid loans are computed and recorded even when others fail.
    pub fn run_partial(
        &self,
        loans: &[LoanDescriptor],
    ) -> Vec<Result<LoanCashflow, ValidationError>> {
        let start = Instant::now();
        let batch_time = Local::now();
        log::info!("Received {} loans for partial processing", loans.len());

        let results = self.pool.map_ordered(loans, |_, loan| {
            validate_with(loan, self.validation).map(|_| self.process(loan, &batch_time))
        });

        let accepted: Vec<LoanDescriptor> = loans
            .iter()
            .zip(&results)
            .filter(|(_, r)| r.is_ok())
            .map(|(loan, _)| loan.clone())
            .collect();
        let rejected = loans.len() - accepted.len();
        self.repository.append(&accepted);

        if rejected > 0 {
            log::warn!("{} of {} loans failed validation", rejected, loans.len());
        }
        log::info!("Completed {} loans in {:?}", accepted.len(), start.elapsed());
        results
    }

    /// Validate, record and dispatch a batch without waiting for it.
    ///
    /// Workers persist results through the configured sink as they finish.
    pub fn submit(&self, loans: Vec<LoanDescriptor>) -> Result<BatchReceipt, BatchError> {
        self.validate_batch(&loans)?;
        self.repository.append(&loans);

        let batch_time = Local::now();
        let loan_count = loans.len();
        log::info!("Received {} loans, dispatching asynchronously", loan_count);

        let mut pending = Vec::with_capacity(loan_count);
        for loan in loans {
            let engine = Arc::clone(&self.engine);
            let sink = self.sink.clone();
            pending.push(self.pool.submit(move || {
                compute_and_persist(&engine, sink.as_deref(), &loan, &batch_time)
            }));
        }

        Ok(BatchReceipt {
            message: format!(
                "Received {} loans, amortization calculations started",
                loan_count
            ),
            loan_count,
            local_date: batch_time.to_rfc3339(),
            pending,
        })
    }

    fn process(&self, loan: &LoanDescriptor, batch_time: &DateTime<Local>) -> LoanCashflow {
        compute_and_persist(&self.engine, self.sink.as_deref(), loan, batch_time)
    }
}

fn compute_and_persist(
    engine: &AmortizationEngine,
    sink: Option<&dyn ResultSink>,
    loan: &LoanDescriptor,
    batch_time: &DateTime<Local>,
) -> LoanCashflow {
    log::debug!("Starting amortization calculation for loan {}", loan.id);
    let result = engine.project_loan(loan);

    if let Some(sink) = sink {
        // Persistence problems are reported, never allowed to fail the batch
        if let Err(e) = sink.persist(loan, &result, batch_time) {
            log::error!("Failed to persist cashflow for loan {}: {}", loan.id, e);
        }
    }

    log::debug!("Completed amortization calculation for loan {}", loan.id);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryLoanRepository;

    fn orchestrator(workers: usize) -> BatchOrchestrator {
        BatchOrchestrator::new(
            Arc::new(WorkerPool::new(workers).unwrap()),
            Arc::new(InMemoryLoanRepository::new()),
        )
    }

    fn loans(n: usize) -> Vec<LoanDescriptor> {
        (0..n)
            .map(|i| {
                LoanDescriptor::new(format!("L{i}"), 12 + (i as u32 % 5) * 60, 3.0 + i as f64 * 0.1, 10_000.0 * (i + 1) as f64)
                    .with_cpr(0.05)
            })
            .collect()
    }

    #[test]
    fn test_run_in_order() {
        let orch = orchestrator(4);
        let batch = loans(20);
        let results = orch.run(&batch).unwrap();

        assert_eq!(results.len(), 20);
        for (loan, result) in batch.iter().zip(&results) {
            assert_eq!(result.loan_id, loan.id);
            assert_eq!(result.cashflow.len(), loan.wam as usize);
        }
        assert_eq!(orch.repository().count(), 20);
    }

    #[test]
    fn test_fail_fast() {
        let orch = orchestrator(2);
        let mut batch = loans(5);
        batch[3].wam = 0;

        let err = orch.run(&batch).unwrap_err();
        assert_eq!(err.loan_index(), Some(3));
        assert!(matches!(
            err,
            BatchError::InvalidLoan { source: ValidationError::WamOutOfRange(0), .. }
        ));
        // Nothing recorded for a rejected batch
        assert_eq!(orch.repository().count(), 0);
    }

    #[test]
    fn test_partial_mode() {
        let orch = orchestrator(2);
        let mut batch = loans(4);
        batch[1].id.clear();

        let results = orch.run_partial(&batch);
        assert!(results[0].is_ok());
        assert_eq!(results[1], Err(ValidationError::EmptyId));
        assert!(results[2].is_ok() && results[3].is_ok());
        assert_eq!(orch.repository().count(), 3);
    }

    #[test]
    fn test_submit_then_wait() {
        let orch = orchestrator(3);
        let batch = loans(10);
        let receipt = orch.submit(batch.clone()).unwrap();

        assert_eq!(receipt.loan_count, 10);
        assert!(receipt.message.contains("10 loans"));
        // Recorded at dispatch time
        assert_eq!(orch.repository().count(), 10);

        let results = receipt.wait().unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.loan_id.as_str()).collect();
        let expected: Vec<&str> = batch.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_wait_reports_lost_worker() {
        let engine = AmortizationEngine::default();
        let loan = LoanDescriptor::new("OK", 12, 5.0, 1000.0);

        let (done_tx, done_rx) = mpsc::channel();
        done_tx.send(engine.project_loan(&loan)).unwrap();
        let (lost_tx, lost_rx) = mpsc::channel::<LoanCashflow>();
        drop(lost_tx);

        let receipt = BatchReceipt {
            message: String::new(),
            loan_count: 2,
            local_date: String::new(),
            pending: vec![done_rx, lost_rx],
        };
        assert!(matches!(receipt.wait(), Err(BatchError::WorkerLost { index: 1 })));
    }

    #[test]
    fn test_empty_batch() {
        let orch = orchestrator(1);
        assert!(orch.run(&[]).unwrap().is_empty());
        assert_eq!(orch.repository().count(), 0);
    }
}
