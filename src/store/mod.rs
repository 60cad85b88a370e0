//! Processed-loan repository and result persistence

pub mod repository;
pub mod writer;

pub use repository::{InMemoryLoanRepository, LoanRepository};
pub use writer::{JsonFileWriter, ResultSink};
