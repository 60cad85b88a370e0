//! Request handling for the loan service, independent of the transport
//!
//! Routes:
//! - `GET /info`: service description
//! - `GET /loans`: loans processed so far
//! - `POST /loans`: submit a JSON array of loans for amortization

use std::sync::Arc;

use chrono::Local;
use serde_json::{json, Value};

use crate::batch::{BatchOrchestrator, WorkerPool};
use crate::config::ServiceConfig;
use crate::error::BatchError;
use crate::loan::LoanDescriptor;
use crate::store::{InMemoryLoanRepository, JsonFileWriter, LoanRepository};

pub const SERVICE_NAME: &str = "mortgage-cashflow";

/// Status code and JSON body of a handled request
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceResponse {
    pub status: u16,
    pub body: Value,
}

impl ServiceResponse {
    fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }
}

/// Loan service state shared across requests
pub struct LoanService {
    orchestrator: BatchOrchestrator,
    async_dispatch: bool,
}

impl LoanService {
    pub fn new(orchestrator: BatchOrchestrator, async_dispatch: bool) -> Self {
        Self {
            orchestrator,
            async_dispatch,
        }
    }

    /// Wire up pool, repository and (optionally) the file writer from config
    pub fn from_config(config: &ServiceConfig) -> Result<Self, BatchError> {
        let pool = Arc::new(WorkerPool::new(config.workers)?);
        let repository: Arc<dyn LoanRepository> = Arc::new(InMemoryLoanRepository::new());

        let mut orchestrator = BatchOrchestrator::new(pool, repository)
            .with_validation(config.validation_options());
        // Async batches have no response to carry results, so they always persist
        if config.persist_results || config.async_dispatch {
            orchestrator = orchestrator.with_sink(Arc::new(JsonFileWriter::new(&config.output_dir)));
        }

        Ok(Self::new(orchestrator, config.async_dispatch))
    }

    pub fn orchestrator(&self) -> &BatchOrchestrator {
        &self.orchestrator
    }

    /// Route a request
    pub fn handle(&self, method: &str, path: &str, body: &[u8]) -> ServiceResponse {
        let path = path.trim_end_matches('/');
        match (method, path) {
            ("GET", "/info") => ServiceResponse::new(200, service_info()),
            ("GET", "/loans") => self.list_loans(),
            ("POST", "/loans") => self.submit_loans(body),
            _ => ServiceResponse::new(404, json!({ "error": format!("no route for {method} {path}") })),
        }
    }

    fn list_loans(&self) -> ServiceResponse {
        let loans = self.orchestrator.repository().list();
        match serde_json::to_value(loans) {
            Ok(body) => ServiceResponse::new(200, body),
            Err(e) => internal_error(e),
        }
    }

    fn submit_loans(&self, body: &[u8]) -> ServiceResponse {
        log::info!("POST /loans received");

        let loans: Vec<LoanDescriptor> = match serde_json::from_slice(body) {
            Ok(loans) => loans,
            Err(e) => {
                log::warn!("Error binding JSON: {}", e);
                return ServiceResponse::new(400, json!({ "error": "Invalid JSON" }));
            }
        };

        if self.async_dispatch {
            return match self.orchestrator.submit(loans) {
                Ok(receipt) => match serde_json::to_value(&receipt) {
                    Ok(body) => ServiceResponse::new(202, body),
                    Err(e) => internal_error(e),
                },
                Err(e) => batch_error(e),
            };
        }

        match self.orchestrator.run(&loans) {
            Ok(results) => ServiceResponse::new(
                200,
                json!({
                    "loan_count": results.len(),
                    "local_date": Local::now().to_rfc3339(),
                    "results": results,
                }),
            ),
            Err(e) => batch_error(e),
        }
    }
}

fn batch_error(e: BatchError) -> ServiceResponse {
    match &e {
        BatchError::InvalidLoan { index, loan_id, source } => ServiceResponse::new(
            422,
            json!({
                "error": source.to_string(),
                "index": index,
                "loan_id": loan_id,
            }),
        ),
        BatchError::Pool(_) | BatchError::WorkerLost { .. } => internal_error(e),
    }
}

fn internal_error(e: impl std::fmt::Display) -> ServiceResponse {
    log::error!("Internal error: {}", e);
    ServiceResponse::new(500, json!({ "error": "internal error" }))
}

/// Description of the service and its inputs
pub fn service_info() -> Value {
    json!({
        "service": SERVICE_NAME,
        "description": "Mortgage loan amortization calculation service",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "GET /info": "Get service information and capabilities",
            "GET /loans": "Retrieve list of processed loans",
            "POST /loans": "Submit loan data for amortization calculation",
        },
        "capabilities": [
            "Loan amortization schedule generation",
            "CPR to SMM conversion for prepayment modeling",
            "Concurrent loan processing",
            "JSON serialization for API responses",
            "Delinquency tracking support",
        ],
        "loan_parameters": {
            "id": "Unique loan identifier (string, at most 50 characters)",
            "wam": "Weighted Average Maturity in months (integer, 1-480)",
            "wac": "Weighted Average Coupon rate per annum as percentage (float, 0-30)",
            "face": "Mortgage principal amount in dollars (float, > 0)",
            "prepay_cpr": "Conditional Prepayment Rate as decimal (float, optional)",
            "static_dq": "Apply delinquency transition modeling (bool, optional)",
        },
    })
}
