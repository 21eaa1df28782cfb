//! Single-loan reconciliation pass

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::reconciliation::classifier::{Classification, Classifier};
use crate::reconciliation::reconciler::{PaidTotals, Reconciler};
use crate::reconciliation::status::StatusResolver;
use crate::types::{Loan, LoanStatus};

/// What a reconciliation pass changed on a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationOutcome {
    /// The corrected snapshot
    pub loan: Loan,
    pub previous_status: LoanStatus,
    pub previous_totals: PaidTotals,
    /// One entry per history record, in history order
    pub classifications: Vec<Classification>,
}

impl ReconciliationOutcome {
    pub fn status_changed(&self) -> bool {
        self.previous_status != self.loan.status
    }

    pub fn totals_changed(&self) -> bool {
        self.previous_totals.capital != self.loan.total_paid_capital
            || self.previous_totals.interest != self.loan.total_paid_interest
    }
}

/// Recomputes a loan's totals and status from its history
///
/// Pure: no storage, no clock, no ambient state. Any loan value is accepted.
#[derive(Debug, Clone, Default)]
pub struct ReconciliationService {
    reconciler: Reconciler,
    resolver: StatusResolver,
}

impl ReconciliationService {
    pub fn new(classifier: Classifier, resolver: StatusResolver) -> Self {
        Self {
            reconciler: Reconciler::new(classifier),
            resolver,
        }
    }

    pub fn classifier(&self) -> &Classifier {
        self.reconciler.classifier()
    }

    pub fn resolver(&self) -> &StatusResolver {
        &self.resolver
    }

    /// Return the loan with recomputed totals and status
    pub fn reconcile(&self, loan: Loan) -> Loan {
        self.reconcile_with_outcome(loan).loan
    }

    /// Reconcile and report what changed
    pub fn reconcile_with_outcome(&self, mut loan: Loan) -> ReconciliationOutcome {
        let previous_status = loan.status.clone();
        let previous_totals = PaidTotals {
            capital: loan.total_paid_capital.clone(),
            interest: loan.total_paid_interest.clone(),
        };

        let (classifications, totals) = self.reconciler.classify_all(&loan.history);
        loan.total_paid_capital = totals.capital;
        loan.total_paid_interest = totals.interest;
        loan.status = self.resolver.resolve(&loan.amount, &loan.status);

        debug!(
            loan_id = %loan.id,
            records = loan.history.len(),
            capital = %loan.total_paid_capital,
            interest = %loan.total_paid_interest,
            "reconciled loan"
        );
        if previous_status != loan.status {
            info!(
                loan_id = %loan.id,
                from = %previous_status,
                to = %loan.status,
                balance = %loan.amount,
                "loan status changed"
            );
        }

        ReconciliationOutcome {
            loan,
            previous_status,
            previous_totals,
            classifications,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PaymentRecord;
    use bigdecimal::{BigDecimal, Zero};
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn sample_loan() -> Loan {
        let mut loan = Loan::new("01/2024".into(), "João Lima".into(), dec("920"));
        loan.push_record(PaymentRecord::new(
            "2024-01-10".into(),
            "Abertura".into(),
            dec("1000"),
        ));
        loan.push_record(PaymentRecord::with_split(
            "2024-02-10".into(),
            "Pagamento".into(),
            dec("80"),
            dec("20"),
        ));
        loan.push_record(PaymentRecord::new("2024-03-10".into(), "Juros".into(), dec("50")));
        loan
    }

    #[test]
    fn test_end_to_end_scenario() {
        let loan = ReconciliationService::default().reconcile(sample_loan());
        assert_eq!(loan.total_paid_capital, dec("80"));
        assert_eq!(loan.total_paid_interest, dec("70"));
        assert_eq!(loan.status, LoanStatus::EmDia);
        assert_eq!(loan.history.len(), 3);
    }

    #[test]
    fn test_idempotent() {
        let service = ReconciliationService::default();
        let once = service.reconcile(sample_loan());
        let twice = service.reconcile(once.clone());
        assert_eq!(once, twice);

        let outcome = service.reconcile_with_outcome(twice);
        assert!(!outcome.totals_changed());
        assert!(!outcome.status_changed());
    }

    #[test]
    fn test_corrupted_totals_are_overwritten() {
        let mut loan = sample_loan();
        loan.total_paid_capital = dec("99999");
        loan.total_paid_interest = dec("-3");

        let outcome = ReconciliationService::default().reconcile_with_outcome(loan);
        assert!(outcome.totals_changed());
        assert_eq!(outcome.previous_totals.capital, dec("99999"));
        assert_eq!(outcome.loan.total_paid_capital, dec("80"));
        assert_eq!(outcome.loan.total_paid_interest, dec("70"));
    }

    #[test]
    fn test_settled_loan_with_empty_history() {
        let mut loan = Loan::new("02/2024".into(), "Ana".into(), dec("0.05"));
        loan.status = LoanStatus::Atrasado;

        let outcome = ReconciliationService::default().reconcile_with_outcome(loan);
        assert_eq!(outcome.loan.status, LoanStatus::Pago);
        assert!(outcome.status_changed());
        assert_eq!(outcome.loan.total_paid_capital, BigDecimal::zero());
        assert!(outcome.classifications.is_empty());
    }

    #[test]
    fn test_status_transitions() {
        let service = ReconciliationService::default();

        let mut paid = Loan::new("03/2024".into(), "Ana".into(), dec("500"));
        paid.status = LoanStatus::Pago;
        assert_eq!(service.reconcile(paid).status, LoanStatus::EmDia);

        let mut overdue = Loan::new("04/2024".into(), "Ana".into(), dec("500"));
        overdue.status = LoanStatus::Atrasado;
        assert_eq!(service.reconcile(overdue).status, LoanStatus::Atrasado);
    }

    #[test]
    fn test_negative_balance_is_left_as_is() {
        let loan = Loan::new("05/2024".into(), "Ana".into(), dec("-12.5"));
        let loan = ReconciliationService::default().reconcile(loan);
        assert_eq!(loan.amount, dec("-12.5"));
        assert_eq!(loan.status, LoanStatus::Pago);
    }
}
