//! Loan servicing walkthrough with in-memory collaborators

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use loan_servicing_core::utils::{MemoryAuditLog, MemoryBlacklist, MemoryRepository};
use loan_servicing_core::{EngineConfig, LoanBook, NewLoan, PaymentPosting};
use std::str::FromStr;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Loan Servicing Core - Reconciliation Example\n");

    let config = EngineConfig::from_toml_str(
        r#"
        [status]
        settlement_epsilon = "0.10"
        "#,
    )?;

    let audit = MemoryAuditLog::new();
    let mut book = LoanBook::with_config(
        MemoryRepository::new(),
        audit.clone(),
        MemoryBlacklist::new(),
        &config,
    )?;

    // 1. Open a loan
    let loan = book
        .create_loan(NewLoan {
            id: None,
            client: "Helena Prado".to_string(),
            principal: BigDecimal::from(1000),
            installments: 6,
            interest_rate: BigDecimal::from(10),
            installment_value: BigDecimal::from(266),
            fine_rate: BigDecimal::from(2),
            start_date: "2024-01-15".to_string(),
            next_due: String::new(),
        })
        .await?;
    println!(
        "Opened {} for {}: R$ {} (due {})",
        loan.id, loan.client, loan.amount, loan.next_due
    );

    // 2. Post a few payments
    let payments = [
        ("2024-02-15", "166", "100"),
        ("2024-03-15", "0", "83.40"),
        ("2024-04-15", "833.95", "0"),
    ];
    for (day, capital, interest) in payments {
        let posting = PaymentPosting::new(
            NaiveDate::parse_from_str(day, "%Y-%m-%d")?,
            BigDecimal::from_str(capital)?,
            BigDecimal::from_str(interest)?,
        )
        .advance_due();
        let loan = book.register_payment(&loan.id, posting).await?;
        println!(
            "  {} -> balance R$ {} | capital paid {} | interest paid {} | {}",
            day, loan.amount, loan.total_paid_capital, loan.total_paid_interest, loan.status
        );
    }

    // 3. Overdue refresh and portfolio figures
    let changed = book
        .refresh_overdue(NaiveDate::from_ymd_opt(2024, 6, 1).ok_or("bad date")?)
        .await?;
    println!("\nStatus refreshed for {} loan(s)", changed.len());

    let summary = book.portfolio_summary().await?;
    println!(
        "Active: {} | Overdue: {} | Outstanding: R$ {} | Interest received: R$ {}",
        summary.total_active,
        summary.total_overdue,
        summary.outstanding_capital,
        summary.interest_received
    );

    println!("\nAudit trail:");
    for entry in audit.entries() {
        println!("  [{}] {}", entry.action, entry.details);
    }

    Ok(())
}
