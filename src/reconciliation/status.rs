//! Lifecycle status derived from the outstanding balance

use bigdecimal::BigDecimal;
use std::str::FromStr;

use crate::types::LoanStatus;

/// Balance at or below which a loan counts as settled
pub const DEFAULT_SETTLEMENT_EPSILON: &str = "0.10";

/// Derives `Pago`/`Em Dia` from the balance, leaving other states alone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusResolver {
    settlement_epsilon: BigDecimal,
}

impl Default for StatusResolver {
    fn default() -> Self {
        Self {
            settlement_epsilon: BigDecimal::from_str(DEFAULT_SETTLEMENT_EPSILON)
                .unwrap_or_default(),
        }
    }
}

impl StatusResolver {
    pub fn new(settlement_epsilon: BigDecimal) -> Self {
        Self { settlement_epsilon }
    }

    pub fn settlement_epsilon(&self) -> &BigDecimal {
        &self.settlement_epsilon
    }

    /// Whether a balance is small enough to treat as paid off
    pub fn is_settled(&self, balance: &BigDecimal) -> bool {
        *balance <= self.settlement_epsilon
    }

    /// Next status for a loan with `balance` outstanding
    pub fn resolve(&self, balance: &BigDecimal, current: &LoanStatus) -> LoanStatus {
        if self.is_settled(balance) {
            LoanStatus::Pago
        } else if *current == LoanStatus::Pago {
            LoanStatus::EmDia
        } else {
            current.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn test_small_balance_settles_any_status() {
        let resolver = StatusResolver::default();
        for status in [
            LoanStatus::EmDia,
            LoanStatus::Atrasado,
            LoanStatus::Pago,
            LoanStatus::Pendente,
            LoanStatus::Other("Renegociado".to_string()),
        ] {
            assert_eq!(resolver.resolve(&dec("0.05"), &status), LoanStatus::Pago);
        }
    }

    #[test]
    fn test_epsilon_boundary() {
        let resolver = StatusResolver::default();
        assert_eq!(resolver.resolve(&dec("0.10"), &LoanStatus::EmDia), LoanStatus::Pago);
        assert_eq!(resolver.resolve(&dec("0.11"), &LoanStatus::EmDia), LoanStatus::EmDia);
        assert_eq!(resolver.resolve(&dec("-25"), &LoanStatus::EmDia), LoanStatus::Pago);
    }

    #[test]
    fn test_paid_loan_reactivates() {
        let resolver = StatusResolver::default();
        assert_eq!(resolver.resolve(&dec("500"), &LoanStatus::Pago), LoanStatus::EmDia);
    }

    #[test]
    fn test_overdue_is_preserved() {
        let resolver = StatusResolver::default();
        assert_eq!(resolver.resolve(&dec("500"), &LoanStatus::Atrasado), LoanStatus::Atrasado);
        assert_eq!(resolver.resolve(&dec("500"), &LoanStatus::Pendente), LoanStatus::Pendente);
    }

    #[test]
    fn test_custom_epsilon() {
        let resolver = StatusResolver::new(dec("1"));
        assert_eq!(resolver.resolve(&dec("0.99"), &LoanStatus::EmDia), LoanStatus::Pago);
        assert_eq!(resolver.resolve(&dec("1.01"), &LoanStatus::Pago), LoanStatus::EmDia);
    }
}
