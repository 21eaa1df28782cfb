//! Servicing layer: loan book, payment posting, overdue marking and reporting

pub mod book;
pub mod overdue;
pub mod payment;
pub mod summary;

pub use book::*;
pub use payment::*;
pub use summary::*;
