//! HTTP front end for the loan service on AWS Lambda
//!
//! Routes: `GET /info`, `GET /loans`, `POST /loans`.

use std::sync::Arc;

use lambda_http::{run, service_fn, Body, Request, Response};
use lambda_runtime::Error;

use mortgage_cashflow::config::ServiceConfig;
use mortgage_cashflow::logging;
use mortgage_cashflow::service::LoanService;

async fn function_handler(service: Arc<LoanService>, event: Request) -> Result<Response<Body>, Error> {
    let method = event.method().as_str().to_string();
    let path = event.uri().path().to_string();
    let body = event.body().to_vec();

    // Amortization is CPU-bound
    let response = tokio::task::spawn_blocking(move || service.handle(&method, &path, &body)).await?;

    let resp = Response::builder()
        .status(response.status)
        .header("content-type", "application/json")
        .body(Body::from(response.body.to_string()))?;
    Ok(resp)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = ServiceConfig::load()?;
    logging::init_with_file(&config.log_file_path());
    log::info!(
        "Starting loan service ({} workers, async dispatch: {})",
        config.workers,
        config.async_dispatch
    );

    let service = Arc::new(LoanService::from_config(&config)?);

    run(service_fn(move |event: Request| {
        let service = Arc::clone(&service);
        async move { function_handler(service, event).await }
    }))
    .await
}
