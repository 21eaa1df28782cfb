//! Payment reconciliation and lifecycle status engine
//!
//! [`Classifier`] maps each history record to a principal/interest
//! allocation, [`Reconciler`] folds those over the full history and
//! [`StatusResolver`] derives the lifecycle status from the balance.
//! [`ReconciliationService`] runs the three for one loan.

pub mod classifier;
pub mod reconciler;
pub mod service;
pub mod status;

pub use classifier::*;
pub use reconciler::*;
pub use service::*;
pub use status::*;
