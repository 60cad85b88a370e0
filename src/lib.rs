//! Mortgage cashflow engine
//!
//! Level-payment amortization with CPR prepayment and optional delinquency
//! roll-rate bucketing, run over batches of loans on a bounded worker pool.
//!
//! ```no_run
//! use std::sync::Arc;
//! use mortgage_cashflow::{
//!     batch::{BatchOrchestrator, WorkerPool},
//!     loan::LoanDescriptor,
//!     store::InMemoryLoanRepository,
//! };
//!
//! let orchestrator = BatchOrchestrator::new(
//!     Arc::new(WorkerPool::new(8).unwrap()),
//!     Arc::new(InMemoryLoanRepository::new()),
//! );
//! let loans = vec![LoanDescriptor::new("LOAN001", 360, 4.5, 250_000.0).with_cpr(0.06)];
//! let results = orchestrator.run(&loans).unwrap();
//! println!("period 1 interest: {}", results[0].cashflow.interest[0]);
//! ```

pub mod amortization;
pub mod batch;
pub mod config;
pub mod delinquency;
pub mod error;
pub mod loan;
pub mod logging;
pub mod prepayment;
pub mod service;
pub mod store;

pub use amortization::{AmortizationEngine, AmortizationTable, LoanCashflow, PoolCashflow};
pub use batch::{BatchOrchestrator, WorkerPool};
pub use config::ServiceConfig;
pub use error::{BatchError, ValidationError};
pub use loan::LoanDescriptor;
