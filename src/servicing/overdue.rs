//! Time-based overdue marking
//!
//! Kept apart from reconciliation, which never sets `Atrasado` itself.

use chrono::NaiveDate;

use crate::reconciliation::StatusResolver;
use crate::types::{Loan, LoanStatus};

/// Parse the leading `YYYY-MM-DD` of a stored due date
pub fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    let head = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Status a loan should carry on `today` judged by its due date alone
///
/// Paid loans stay paid, and a balance the resolver counts as settled is
/// paid whatever its due date. Loans without a readable due date keep their
/// current status.
pub fn status_on(loan: &Loan, today: NaiveDate, resolver: &StatusResolver) -> LoanStatus {
    if loan.status == LoanStatus::Pago || resolver.is_settled(&loan.amount) {
        return LoanStatus::Pago;
    }

    match parse_due_date(&loan.next_due) {
        Some(due) if due < today => LoanStatus::Atrasado,
        Some(_) => LoanStatus::EmDia,
        None => loan.status.clone(),
    }
}

/// Update the loan's status for `today`; returns whether it changed
pub fn mark(loan: &mut Loan, today: NaiveDate, resolver: &StatusResolver) -> bool {
    let next = status_on(loan, today, resolver);
    if next == loan.status {
        return false;
    }
    loan.status = next;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;

    fn loan(status: LoanStatus, next_due: &str) -> Loan {
        let mut loan = Loan::new("01/2024".into(), "Ana".into(), BigDecimal::from(300));
        loan.status = status;
        loan.next_due = next_due.to_string();
        loan
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[test]
    fn test_parse_due_date() {
        assert_eq!(
            parse_due_date("2024-06-14T03:00:00.000Z"),
            NaiveDate::from_ymd_opt(2024, 6, 14)
        );
        assert_eq!(parse_due_date("14/06/2024"), None);
        assert_eq!(parse_due_date(""), None);
    }

    #[test]
    fn test_past_due_becomes_overdue() {
        let mut overdue = loan(LoanStatus::EmDia, "2024-06-14");
        assert!(mark(&mut overdue, today(), &StatusResolver::default()));
        assert_eq!(overdue.status, LoanStatus::Atrasado);
    }

    #[test]
    fn test_due_today_is_current() {
        let mut current = loan(LoanStatus::Atrasado, "2024-06-15");
        assert!(mark(&mut current, today(), &StatusResolver::default()));
        assert_eq!(current.status, LoanStatus::EmDia);
    }

    #[test]
    fn test_paid_and_undated_loans_are_untouched() {
        let mut paid = loan(LoanStatus::Pago, "2020-01-01");
        assert!(!mark(&mut paid, today(), &StatusResolver::default()));

        let mut undated = loan(LoanStatus::Pendente, "");
        assert!(!mark(&mut undated, today(), &StatusResolver::default()));
        assert_eq!(undated.status, LoanStatus::Pendente);
    }

    #[test]
    fn test_settled_balance_is_never_overdue() {
        let mut residue = loan(LoanStatus::EmDia, "2024-01-10");
        residue.amount = "0.05".parse().unwrap();
        assert_eq!(
            status_on(&residue, today(), &StatusResolver::default()),
            LoanStatus::Pago
        );
        assert!(mark(&mut residue, today(), &StatusResolver::default()));
        assert_eq!(residue.status, LoanStatus::Pago);
    }
}
