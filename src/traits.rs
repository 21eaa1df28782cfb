//! Collaborator traits injected around the reconciliation engine

use async_trait::async_trait;
use bigdecimal::{BigDecimal, Zero};

use crate::types::*;

/// Storage abstraction for loan snapshots
///
/// Lets the servicing layer work with any document store (MongoDB,
/// PostgreSQL, in-memory, etc.). Saves are compare-and-swap on
/// [`Loan::revision`] so that concurrent read-modify-write cycles cannot
/// silently discard each other's history entries.
#[async_trait]
pub trait LoanRepository: Send + Sync {
    /// Load a loan by ID
    async fn load(&self, loan_id: &str) -> LoanResult<Option<Loan>>;

    /// List every stored loan
    async fn list(&self) -> LoanResult<Vec<Loan>>;

    /// Store a new loan, failing with `DuplicateLoan` if the ID is taken
    async fn insert(&mut self, loan: &Loan) -> LoanResult<()>;

    /// Replace a loan if the stored revision equals `expected_revision`
    ///
    /// Returns the new revision, which the store assigns.
    async fn save(&mut self, loan: &Loan, expected_revision: u64) -> LoanResult<u64>;

    /// Remove a loan
    async fn delete(&mut self, loan_id: &str) -> LoanResult<()>;
}

/// Destination for audit entries
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: AuditEntry) -> LoanResult<()>;
}

/// Blacklist consulted before a loan is opened
#[async_trait]
pub trait BlacklistLookup: Send + Sync {
    /// Find an entry matching the client's name or document number
    async fn find(&self, client: &str) -> LoanResult<Option<BlacklistEntry>>;
}

/// Trait for implementing custom loan validation rules
pub trait LoanValidator: Send + Sync {
    /// Validate a loan request before it is opened
    fn validate_new_loan(&self, request: &NewLoan) -> LoanResult<()>;

    /// Validate a snapshot before it is saved
    fn validate_loan(&self, loan: &Loan) -> LoanResult<()>;
}

/// Default loan validator with basic rules
pub struct DefaultLoanValidator;

impl LoanValidator for DefaultLoanValidator {
    fn validate_new_loan(&self, request: &NewLoan) -> LoanResult<()> {
        if request.client.trim().is_empty() {
            return Err(LoanError::Validation(
                "Client name cannot be empty".to_string(),
            ));
        }

        if request.principal <= BigDecimal::zero() {
            return Err(LoanError::Validation(
                "Principal must be positive".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_loan(&self, loan: &Loan) -> LoanResult<()> {
        if loan.id.trim().is_empty() {
            return Err(LoanError::Validation("Loan ID cannot be empty".to_string()));
        }

        Ok(())
    }
}
