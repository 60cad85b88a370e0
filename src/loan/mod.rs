//! Loan descriptors, validation and batch loading

mod data;
pub mod validate;
pub mod loader;
pub mod generator;

pub use data::{LoanDescriptor, MAX_ID_LEN};
pub use validate::{validate, validate_with, ValidationOptions};
pub use loader::{load_loans, load_loans_from_json, load_loans_from_reader};
pub use generator::{PoolParams, PoolTemplate};
