//! # Loan Servicing Core
//!
//! Payment reconciliation and lifecycle status engine for loan contracts,
//! with a storage-agnostic servicing layer around it.
//!
//! ## Features
//!
//! - **Classification**: each history entry counts as principal, interest, or
//!   a non-payment (origination/restructuring), with explicit splits taking
//!   precedence over label heuristics for legacy records
//! - **Reconciliation**: lifetime paid totals recomputed from the full history
//!   on every pass
//! - **Lifecycle status**: `Pago` / `Em Dia` derived from the remaining balance,
//!   overdue marking left to the due-date refresh
//! - **Servicing**: loan book with payment posting, optimistic revision checks,
//!   blacklist screening, audit trail and portfolio summary
//! - **Storage abstraction**: trait-based repository, audit and blacklist
//!   collaborators
//!
//! ## Quick Start
//!
//! ```rust
//! use loan_servicing_core::{Loan, LoanStatus, PaymentRecord, ReconciliationService};
//! use bigdecimal::BigDecimal;
//!
//! let mut loan = Loan::new("01/2024".to_string(), "Ana".to_string(), BigDecimal::from(920));
//! loan.push_record(PaymentRecord::new(
//!     "2024-01-10".to_string(),
//!     "Abertura".to_string(),
//!     BigDecimal::from(1000),
//! ));
//! loan.push_record(PaymentRecord::with_split(
//!     "2024-02-10".to_string(),
//!     "Parcela".to_string(),
//!     BigDecimal::from(80),
//!     BigDecimal::from(20),
//! ));
//!
//! let loan = ReconciliationService::default().reconcile(loan);
//! assert_eq!(loan.total_paid_capital, BigDecimal::from(80));
//! assert_eq!(loan.total_paid_interest, BigDecimal::from(20));
//! assert_eq!(loan.status, LoanStatus::EmDia);
//! ```

pub mod config;
pub mod reconciliation;
pub mod servicing;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::EngineConfig;
pub use reconciliation::*;
pub use servicing::*;
pub use traits::*;
pub use types::*;

// Re-export record patterns for convenience
pub use servicing::payment::patterns;
