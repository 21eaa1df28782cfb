//! Payment posting and history record patterns

use bigdecimal::{BigDecimal, Zero};
use chrono::{Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::reconciliation::StatusResolver;
use crate::servicing::overdue::parse_due_date;
use crate::types::*;

/// A payment received against a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentPosting {
    pub paid_on: NaiveDate,
    pub capital: BigDecimal,
    pub interest: BigDecimal,
    /// Move the due date one month ahead and count one installment as paid
    pub advance_due: bool,
    pub note: Option<String>,
}

impl PaymentPosting {
    pub fn new(paid_on: NaiveDate, capital: BigDecimal, interest: BigDecimal) -> Self {
        Self {
            paid_on,
            capital,
            interest,
            advance_due: false,
            note: None,
        }
    }

    pub fn advance_due(mut self) -> Self {
        self.advance_due = true;
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn total(&self) -> BigDecimal {
        &self.capital + &self.interest
    }

    /// History label for the split this posting carries
    pub fn kind(&self) -> &'static str {
        let zero = BigDecimal::zero();
        match (self.capital > zero, self.interest > zero) {
            (true, true) => "Parcela",
            (true, false) => "Amortização",
            _ => "Juros",
        }
    }

    pub fn validate(&self) -> LoanResult<()> {
        let zero = BigDecimal::zero();
        if self.capital < zero || self.interest < zero {
            return Err(LoanError::InvalidPayment(
                "Capital and interest cannot be negative".to_string(),
            ));
        }
        if self.total() <= zero {
            return Err(LoanError::InvalidPayment(
                "Payment total must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply the posting to a loan snapshot and return the appended record
    ///
    /// The balance drops by the capital part, floored at zero. A balance the
    /// resolver counts as settled closes the schedule instead of advancing it.
    /// Totals and status are left for the reconciliation pass.
    pub fn apply_to(
        &self,
        loan: &mut Loan,
        resolver: &StatusResolver,
    ) -> LoanResult<PaymentRecord> {
        self.validate()?;

        let remaining = &loan.amount - &self.capital;
        loan.amount = if remaining < BigDecimal::zero() {
            BigDecimal::zero()
        } else {
            remaining
        };

        if resolver.is_settled(&loan.amount) {
            loan.installments = 0;
        } else if self.advance_due {
            match parse_due_date(&loan.next_due).and_then(|d| d.checked_add_months(Months::new(1)))
            {
                Some(next) => loan.next_due = next.format("%Y-%m-%d").to_string(),
                None => debug!(loan_id = %loan.id, next_due = %loan.next_due, "due date not advanced"),
            }
            loan.installments = loan.installments.saturating_sub(1);
        }

        let note = self
            .note
            .clone()
            .unwrap_or_else(|| format!("Baixa Manual. Ref: {}", self.paid_on.format("%d/%m/%Y")));
        let record = PaymentRecord::with_split(
            self.paid_on.format("%Y-%m-%d").to_string(),
            self.kind().to_string(),
            self.capital.clone(),
            self.interest.clone(),
        )
        .registered_at(Utc::now().to_rfc3339())
        .note(note);

        loan.push_record(record.clone());
        Ok(record)
    }
}

/// Common history records
pub mod patterns {
    use super::*;

    /// Capital disbursed when the loan is opened
    pub fn origination(date: NaiveDate, principal: BigDecimal) -> PaymentRecord {
        PaymentRecord::new(
            date.format("%Y-%m-%d").to_string(),
            "Abertura".to_string(),
            principal,
        )
        .registered_at(Utc::now().to_rfc3339())
        .note("Empréstimo Concedido")
    }

    /// Contract renegotiation; never counted as a payment
    pub fn restructuring(date: NaiveDate, amount: BigDecimal, note: &str) -> PaymentRecord {
        PaymentRecord::new(
            date.format("%Y-%m-%d").to_string(),
            "Acordo".to_string(),
            amount,
        )
        .registered_at(Utc::now().to_rfc3339())
        .note(note)
    }
}
