//! Full-history fold producing lifetime paid totals

use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::reconciliation::classifier::{Classification, Classifier};
use crate::types::PaymentRecord;

/// Lifetime principal and interest received on a loan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaidTotals {
    pub capital: BigDecimal,
    pub interest: BigDecimal,
}

impl Default for PaidTotals {
    fn default() -> Self {
        Self {
            capital: BigDecimal::zero(),
            interest: BigDecimal::zero(),
        }
    }
}

impl PaidTotals {
    /// Principal plus interest
    pub fn total(&self) -> BigDecimal {
        &self.capital + &self.interest
    }

    fn add(&mut self, classification: &Classification) {
        if let Some(allocation) = classification.allocation() {
            self.capital += &allocation.capital;
            self.interest += &allocation.interest;
        }
    }
}

/// Recomputes totals from the complete history on every call
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    classifier: Classifier,
}

impl Reconciler {
    pub fn new(classifier: Classifier) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Sum the allocations of every record
    pub fn totals(&self, history: &[PaymentRecord]) -> PaidTotals {
        self.classify_all(history).1
    }

    /// Classify every record and sum the allocations
    pub fn classify_all(&self, history: &[PaymentRecord]) -> (Vec<Classification>, PaidTotals) {
        let mut totals = PaidTotals::default();
        let mut classifications = Vec::with_capacity(history.len());

        for (index, record) in history.iter().enumerate() {
            let classification = self.classifier.classify(record);
            debug!(index, kind = %record.kind, ?classification, "classified history record");
            totals.add(&classification);
            classifications.push(classification);
        }

        (classifications, totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn history() -> Vec<PaymentRecord> {
        vec![
            PaymentRecord::new("2024-01-05".into(), "Abertura".into(), dec("1000")),
            PaymentRecord::with_split("2024-02-05".into(), "Parcela".into(), dec("80"), dec("20")),
            PaymentRecord::new("2024-03-05".into(), "Juros".into(), dec("50")),
            PaymentRecord::new("2024-04-05".into(), "Amortização".into(), dec("120.35")),
        ]
    }

    #[test]
    fn test_totals_over_mixed_history() {
        let totals = Reconciler::default().totals(&history());
        assert_eq!(totals.capital, dec("200.35"));
        assert_eq!(totals.interest, dec("70"));
        assert_eq!(totals.total(), dec("270.35"));
    }

    #[test]
    fn test_order_does_not_matter() {
        let reconciler = Reconciler::default();
        let mut reversed = history();
        reversed.reverse();
        assert_eq!(reconciler.totals(&history()), reconciler.totals(&reversed));
    }

    #[test]
    fn test_empty_history_is_zero() {
        assert_eq!(Reconciler::default().totals(&[]), PaidTotals::default());
    }

    #[test]
    fn test_classifications_follow_history_order() {
        let (classifications, _) = Reconciler::default().classify_all(&history());
        assert_eq!(classifications.len(), 4);
        assert_eq!(classifications[0], Classification::NonPayment);
        assert!(matches!(classifications[1], Classification::Explicit(_)));
        assert!(matches!(classifications[2], Classification::Inferred(_)));
    }
}
