//! Store of processed loans

use std::sync::{PoisonError, RwLock};

use crate::loan::LoanDescriptor;

/// Record of every loan the service has accepted.
///
/// Appends are whole batches: readers see either none or all of a batch.
pub trait LoanRepository: Send + Sync {
    /// Append a batch of loans in input order
    fn append(&self, loans: &[LoanDescriptor]);

    /// Snapshot of all stored loans, oldest first
    fn list(&self) -> Vec<LoanDescriptor>;

    /// Number of stored loans
    fn count(&self) -> usize;
}

/// Process-local repository behind a reader/writer lock
#[derive(Debug, Default)]
pub struct InMemoryLoanRepository {
    loans: RwLock<Vec<LoanDescriptor>>,
}

impl InMemoryLoanRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoanRepository for InMemoryLoanRepository {
    fn append(&self, loans: &[LoanDescriptor]) {
        if loans.is_empty() {
            return;
        }
        // Nothing under this lock can panic mid-append, so a poisoned guard is still consistent
        let mut guard = self.loans.write().unwrap_or_else(PoisonError::into_inner);
        guard.extend_from_slice(loans);
        log::debug!("Repository now holds {} loans", guard.len());
    }

    fn list(&self) -> Vec<LoanDescriptor> {
        self.loans
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn count(&self) -> usize {
        self.loans.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_list() {
        let repo = InMemoryLoanRepository::new();
        assert_eq!(repo.count(), 0);

        repo.append(&[
            LoanDescriptor::new("A", 12, 5.0, 100.0),
            LoanDescriptor::new("B", 24, 5.0, 200.0),
        ]);
        repo.append(&[LoanDescriptor::new("C", 36, 5.0, 300.0)]);
        repo.append(&[]);

        let ids: Vec<String> = repo.list().into_iter().map(|l| l.id).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
        assert_eq!(repo.count(), 3);
    }
}
