//! Portfolio-level figures for dashboards

use bigdecimal::{BigDecimal, Zero};
use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::types::{Loan, LoanStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    /// Loans not yet paid off
    pub total_active: usize,
    pub total_overdue: usize,
    /// Σ(amount − totalPaidCapital) over loans not yet paid off
    pub outstanding_capital: BigDecimal,
    /// Σ totalPaidInterest over every loan
    pub interest_received: BigDecimal,
}

impl PortfolioSummary {
    pub fn from_loans(loans: &[Loan]) -> Self {
        let mut summary = Self {
            total_active: 0,
            total_overdue: 0,
            outstanding_capital: BigDecimal::zero(),
            interest_received: BigDecimal::zero(),
        };

        for loan in loans {
            summary.interest_received += &loan.total_paid_interest;
            if loan.status.is_active() {
                summary.total_active += 1;
                summary.outstanding_capital += loan.outstanding_capital();
            }
            if loan.status == LoanStatus::Atrasado {
                summary.total_overdue += 1;
            }
        }

        summary
    }
}

/// Next sequential ID of the form `NN/YYYY` for `year`
///
/// IDs from other years or in other shapes are ignored.
pub fn next_loan_id<'a, I>(existing: I, year: i32) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let suffix = format!("/{}", year);
    let max_seq = existing
        .into_iter()
        .filter_map(|id| id.strip_suffix(suffix.as_str()))
        .filter_map(|seq| seq.parse::<u32>().ok())
        .max()
        .unwrap_or(0);

    format!("{:02}/{}", max_seq + 1, year)
}

/// Year used for IDs of loans starting on `start_date`, or the current year
pub fn id_year(start_date: &str) -> i32 {
    crate::servicing::overdue::parse_due_date(start_date)
        .map(|d| d.year())
        .unwrap_or_else(|| chrono::Utc::now().year())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn loan(id: &str, amount: &str, paid_capital: &str, paid_interest: &str, status: LoanStatus) -> Loan {
        let mut loan = Loan::new(id.into(), "Ana".into(), BigDecimal::from_str(amount).unwrap());
        loan.total_paid_capital = BigDecimal::from_str(paid_capital).unwrap();
        loan.total_paid_interest = BigDecimal::from_str(paid_interest).unwrap();
        loan.status = status;
        loan
    }

    #[test]
    fn test_summary() {
        let loans = vec![
            loan("01/2024", "1000", "200", "50", LoanStatus::EmDia),
            loan("02/2024", "500", "0", "10", LoanStatus::Atrasado),
            loan("03/2024", "0", "800", "120", LoanStatus::Pago),
        ];

        let summary = PortfolioSummary::from_loans(&loans);
        assert_eq!(summary.total_active, 2);
        assert_eq!(summary.total_overdue, 1);
        assert_eq!(summary.outstanding_capital, BigDecimal::from(1300));
        assert_eq!(summary.interest_received, BigDecimal::from(180));
    }

    #[test]
    fn test_empty_portfolio() {
        let summary = PortfolioSummary::from_loans(&[]);
        assert_eq!(summary.total_active, 0);
        assert_eq!(summary.outstanding_capital, BigDecimal::zero());
    }

    #[test]
    fn test_next_loan_id() {
        let ids = ["01/2024", "09/2024", "12/2023", "legacy", "x/2024"];
        assert_eq!(next_loan_id(ids, 2024), "10/2024");
        assert_eq!(next_loan_id(ids, 2025), "01/2025");
        assert_eq!(next_loan_id(["99/2024"], 2024), "100/2024");
    }

    #[test]
    fn test_id_year() {
        assert_eq!(id_year("2023-11-30"), 2023);
    }
}
