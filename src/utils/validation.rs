//! Validation utilities

use crate::traits::*;
use crate::types::*;
use bigdecimal::{BigDecimal, Zero};

/// Validate that an amount is positive
pub fn validate_positive_amount(amount: &BigDecimal) -> LoanResult<()> {
    if *amount <= BigDecimal::zero() {
        Err(LoanError::Validation("Amount must be positive".to_string()))
    } else {
        Ok(())
    }
}

/// Validate that a loan ID is valid
pub fn validate_loan_id(loan_id: &str) -> LoanResult<()> {
    if loan_id.trim().is_empty() {
        return Err(LoanError::Validation(
            "Loan ID cannot be empty".to_string(),
        ));
    }

    if loan_id.len() > 50 {
        return Err(LoanError::Validation(
            "Loan ID cannot exceed 50 characters".to_string(),
        ));
    }

    // Sequence IDs look like "07/2024"
    if !loan_id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '/')
    {
        return Err(LoanError::Validation(
            "Loan ID can only contain alphanumeric characters, dashes, underscores, and slashes"
                .to_string(),
        ));
    }

    Ok(())
}

/// Validate that a client name is valid
pub fn validate_client_name(name: &str) -> LoanResult<()> {
    if name.trim().is_empty() {
        return Err(LoanError::Validation(
            "Client name cannot be empty".to_string(),
        ));
    }

    if name.chars().count() > 100 {
        return Err(LoanError::Validation(
            "Client name cannot exceed 100 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validate that an interest rate percentage is within 0..=100
pub fn validate_interest_rate(rate: &BigDecimal) -> LoanResult<()> {
    if *rate < BigDecimal::zero() || *rate > BigDecimal::from(100) {
        return Err(LoanError::Validation(format!(
            "Interest rate must be between 0 and 100, got {}",
            rate
        )));
    }

    Ok(())
}

/// Strict loan validator with detailed checks
pub struct StrictLoanValidator;

impl LoanValidator for StrictLoanValidator {
    fn validate_new_loan(&self, request: &NewLoan) -> LoanResult<()> {
        DefaultLoanValidator.validate_new_loan(request)?;

        if let Some(ref id) = request.id {
            validate_loan_id(id)?;
        }
        validate_client_name(&request.client)?;
        validate_positive_amount(&request.principal)?;
        validate_interest_rate(&request.interest_rate)?;

        if chrono::NaiveDate::parse_from_str(&request.start_date, "%Y-%m-%d").is_err() {
            return Err(LoanError::Validation(format!(
                "Start date '{}' is not a YYYY-MM-DD date",
                request.start_date
            )));
        }

        Ok(())
    }

    fn validate_loan(&self, loan: &Loan) -> LoanResult<()> {
        validate_loan_id(&loan.id)?;
        validate_client_name(&loan.client)?;
        validate_interest_rate(&loan.interest_rate)?;

        Ok(())
    }
}
