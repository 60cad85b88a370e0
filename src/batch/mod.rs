//! Bounded-concurrency batch dispatch

mod pool;
mod orchestrator;

pub use pool::{WorkerPool, DEFAULT_WORKERS};
pub use orchestrator::{BatchOrchestrator, BatchReceipt};
