//! Classification of history records into principal, interest or non-payment

use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};

use crate::types::PaymentRecord;

/// Default markers for records that disburse capital or amend the contract
pub const DEFAULT_NON_PAYMENT_MARKERS: &[&str] = &["empréstimo", "contrato", "abertura", "acordo"];

/// Default markers for legacy records that carried only interest
pub const DEFAULT_INTEREST_MARKERS: &[&str] = &["juros", "interest"];

/// Case-insensitive set of substrings matched against a record's `type`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerSet {
    markers: Vec<String>,
}

impl MarkerSet {
    /// Build a set, lowercasing every marker and dropping blank ones
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let markers = markers
            .into_iter()
            .map(|m| m.as_ref().trim().to_lowercase())
            .filter(|m| !m.is_empty())
            .collect();
        Self { markers }
    }

    /// Whether `label` contains any marker, ignoring case
    pub fn matches(&self, label: &str) -> bool {
        let label = label.to_lowercase();
        self.markers.iter().any(|m| label.contains(m.as_str()))
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }
}

/// Amounts a record adds to the lifetime totals
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Allocation {
    pub capital: BigDecimal,
    pub interest: BigDecimal,
}

impl Allocation {
    pub fn new(capital: BigDecimal, interest: BigDecimal) -> Self {
        Self { capital, interest }
    }

    pub fn capital(amount: BigDecimal) -> Self {
        Self::new(amount, BigDecimal::zero())
    }

    pub fn interest(amount: BigDecimal) -> Self {
        Self::new(BigDecimal::zero(), amount)
    }
}

/// Outcome of classifying one record, tagged with the rule that fired
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    /// Origination or restructuring; contributes nothing
    NonPayment,
    /// Taken from the record's explicit capital/interest split
    Explicit(Allocation),
    /// Inferred from the label of a record without a split
    Inferred(Allocation),
}

impl Classification {
    /// The allocation to add, or `None` for non-payment records
    pub fn allocation(&self) -> Option<&Allocation> {
        match self {
            Classification::NonPayment => None,
            Classification::Explicit(allocation) | Classification::Inferred(allocation) => {
                Some(allocation)
            }
        }
    }

    pub fn is_payment(&self) -> bool {
        self.allocation().is_some()
    }
}

/// Maps history records to allocations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classifier {
    non_payment: MarkerSet,
    interest: MarkerSet,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(
            MarkerSet::new(DEFAULT_NON_PAYMENT_MARKERS),
            MarkerSet::new(DEFAULT_INTEREST_MARKERS),
        )
    }
}

impl Classifier {
    pub fn new(non_payment: MarkerSet, interest: MarkerSet) -> Self {
        Self {
            non_payment,
            interest,
        }
    }

    pub fn non_payment_markers(&self) -> &MarkerSet {
        &self.non_payment
    }

    pub fn interest_markers(&self) -> &MarkerSet {
        &self.interest
    }

    /// Classify one record
    ///
    /// The non-payment check runs before anything else, so an origination
    /// record never contributes even when it carries a split. A non-zero
    /// split always wins over the label heuristic.
    pub fn classify(&self, record: &PaymentRecord) -> Classification {
        if self.non_payment.matches(&record.kind) {
            return Classification::NonPayment;
        }

        let zero = BigDecimal::zero();
        if record.capital_paid > zero || record.interest_paid > zero {
            return Classification::Explicit(Allocation::new(
                record.capital_paid.clone(),
                record.interest_paid.clone(),
            ));
        }

        if self.interest.matches(&record.kind) {
            Classification::Inferred(Allocation::interest(record.amount.clone()))
        } else {
            Classification::Inferred(Allocation::capital(record.amount.clone()))
        }
    }
}
