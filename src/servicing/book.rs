//! Loan book orchestrating storage, auditing and the reconciliation engine

use chrono::{Months, NaiveDate, Utc};
use tracing::{info, instrument, warn};

use crate::config::EngineConfig;
use crate::reconciliation::{ReconciliationOutcome, ReconciliationService};
use crate::servicing::overdue::{self, parse_due_date};
use crate::servicing::payment::{patterns, PaymentPosting};
use crate::servicing::summary::{id_year, next_loan_id, PortfolioSummary};
use crate::traits::*;
use crate::types::*;

/// Servicing front door for loans
///
/// Every write runs the reconciliation engine on the full snapshot and
/// saves it with a revision check, so the read-modify-write cycle is atomic
/// per loan.
pub struct LoanBook<R: LoanRepository, A: AuditSink, B: BlacklistLookup> {
    repository: R,
    audit: A,
    blacklist: B,
    engine: ReconciliationService,
    validator: Box<dyn LoanValidator>,
    max_conflict_retries: u32,
}

impl<R: LoanRepository, A: AuditSink, B: BlacklistLookup> LoanBook<R, A, B> {
    /// Create a loan book with the default policy
    pub fn new(repository: R, audit: A, blacklist: B) -> Self {
        let defaults = EngineConfig::default();
        Self {
            repository,
            audit,
            blacklist,
            engine: ReconciliationService::default(),
            validator: Box::new(DefaultLoanValidator),
            max_conflict_retries: defaults.servicing.max_conflict_retries,
        }
    }

    /// Create a loan book with the policy from `config`
    pub fn with_config(
        repository: R,
        audit: A,
        blacklist: B,
        config: &EngineConfig,
    ) -> LoanResult<Self> {
        config.validate()?;
        Ok(Self {
            repository,
            audit,
            blacklist,
            engine: config.reconciliation_service()?,
            validator: Box::new(DefaultLoanValidator),
            max_conflict_retries: config.servicing.max_conflict_retries,
        })
    }

    /// Replace the loan validator
    pub fn with_validator(mut self, validator: Box<dyn LoanValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn engine(&self) -> &ReconciliationService {
        &self.engine
    }

    /// Open a new loan
    ///
    /// Rejects blacklisted clients. The history starts with the origination
    /// record for the principal.
    #[instrument(skip(self, request), fields(client = %request.client))]
    pub async fn create_loan(&mut self, request: NewLoan) -> LoanResult<Loan> {
        self.validator.validate_new_loan(&request)?;

        if let Some(entry) = self.blacklist.find(&request.client).await? {
            warn!(blacklist_id = %entry.id, "loan refused for blacklisted client");
            return Err(LoanError::Blacklisted {
                client: request.client,
                reason: entry.reason,
            });
        }

        let id = match request.id {
            Some(ref id) if !id.trim().is_empty() => id.trim().to_string(),
            _ => {
                let existing = self.repository.list().await?;
                next_loan_id(
                    existing.iter().map(|l| l.id.as_str()),
                    id_year(&request.start_date),
                )
            }
        };

        let start = parse_due_date(&request.start_date).unwrap_or_else(|| Utc::now().date_naive());
        let next_due = if request.next_due.trim().is_empty() {
            start
                .checked_add_months(Months::new(1))
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default()
        } else {
            request.next_due.clone()
        };

        let mut loan = Loan::new(id, request.client, request.principal.clone());
        loan.installments = request.installments;
        loan.interest_rate = request.interest_rate;
        loan.installment_value = request.installment_value;
        loan.fine_rate = request.fine_rate;
        loan.start_date = request.start_date;
        loan.next_due = next_due;
        loan.push_record(patterns::origination(start, request.principal));

        let loan = self.engine.reconcile(loan);
        self.validator.validate_loan(&loan)?;
        self.repository.insert(&loan).await?;

        info!(loan_id = %loan.id, amount = %loan.amount, "loan created");
        self.audit(
            AuditAction::LoanCreated,
            &loan.id,
            format!(
                "Criado contrato para {} no valor de R$ {}",
                loan.client,
                loan.amount.round(2)
            ),
        )
        .await;

        Ok(loan)
    }

    /// Get a loan by ID
    pub async fn get_loan(&self, loan_id: &str) -> LoanResult<Option<Loan>> {
        self.repository.load(loan_id).await
    }

    /// Get a loan by ID, returning an error if not found
    pub async fn get_loan_required(&self, loan_id: &str) -> LoanResult<Loan> {
        self.repository
            .load(loan_id)
            .await?
            .ok_or_else(|| LoanError::LoanNotFound(loan_id.to_string()))
    }

    /// List all loans
    pub async fn list_loans(&self) -> LoanResult<Vec<Loan>> {
        self.repository.list().await
    }

    /// Replace a loan with a caller-edited snapshot
    ///
    /// `loan.revision` must be the revision the caller loaded; a stale
    /// snapshot fails with `RevisionConflict` instead of overwriting newer
    /// history.
    #[instrument(skip(self, loan), fields(loan_id = %loan.id))]
    pub async fn replace_loan(&mut self, loan: Loan) -> LoanResult<Loan> {
        let expected = loan.revision;
        let outcome = self.engine.reconcile_with_outcome(loan);
        let mut loan = outcome.loan;
        self.validator.validate_loan(&loan)?;

        loan.revision = self.repository.save(&loan, expected).await?;

        self.audit(
            AuditAction::LoanUpdated,
            &loan.id,
            balance_details(&loan),
        )
        .await;

        Ok(loan)
    }

    /// Load, edit, reconcile and save a loan, retrying lost revision races
    pub async fn modify_loan<F>(&mut self, loan_id: &str, edit: F) -> LoanResult<Loan>
    where
        F: FnMut(&mut Loan) -> LoanResult<()>,
    {
        let outcome = self.commit(loan_id, edit).await?;
        let loan = outcome.loan;

        self.audit(
            AuditAction::LoanUpdated,
            &loan.id,
            balance_details(&loan),
        )
        .await;

        Ok(loan)
    }

    /// Post a payment to a loan
    #[instrument(skip(self, posting), fields(total = %posting.total()))]
    pub async fn register_payment(
        &mut self,
        loan_id: &str,
        posting: PaymentPosting,
    ) -> LoanResult<Loan> {
        posting.validate()?;

        let resolver = self.engine.resolver().clone();
        let outcome = self
            .commit(loan_id, |loan| posting.apply_to(loan, &resolver).map(|_| ()))
            .await?;
        let loan = outcome.loan;

        info!(
            loan_id = %loan.id,
            balance = %loan.amount,
            status = %loan.status,
            "payment registered"
        );
        self.audit(
            AuditAction::PaymentRegistered,
            &loan.id,
            format!(
                "Contrato {} | {} de R$ {} | Saldo Restante: R$ {} | Status: {}",
                loan.id,
                posting.kind(),
                posting.total().round(2),
                loan.amount.round(2),
                loan.status
            ),
        )
        .await;

        Ok(loan)
    }

    /// Delete a loan
    #[instrument(skip(self))]
    pub async fn delete_loan(&mut self, loan_id: &str) -> LoanResult<()> {
        self.repository.delete(loan_id).await?;

        info!(loan_id, "loan deleted");
        self.audit(
            AuditAction::LoanDeleted,
            loan_id,
            format!("Contrato removido permanentemente: {}", loan_id),
        )
        .await;

        Ok(())
    }

    /// Mark loans overdue or current according to their due dates
    ///
    /// Returns the IDs whose status changed. A loan that loses a revision
    /// race is skipped; the next refresh picks it up.
    #[instrument(skip(self))]
    pub async fn refresh_overdue(&mut self, today: NaiveDate) -> LoanResult<Vec<String>> {
        let mut changed = Vec::new();

        for mut loan in self.repository.list().await? {
            let previous = loan.status.clone();
            if !overdue::mark(&mut loan, today, self.engine.resolver()) {
                continue;
            }

            let expected = loan.revision;
            match self.repository.save(&loan, expected).await {
                Ok(_) => {}
                Err(LoanError::RevisionConflict { .. }) => {
                    warn!(loan_id = %loan.id, "skipped overdue refresh after concurrent update");
                    continue;
                }
                Err(e) => return Err(e),
            }

            info!(loan_id = %loan.id, from = %previous, to = %loan.status, "due-date status refreshed");
            self.audit(
                AuditAction::StatusChanged,
                &loan.id,
                format!("Contrato {} | {} -> {}", loan.id, previous, loan.status),
            )
            .await;
            changed.push(loan.id);
        }

        Ok(changed)
    }

    /// Dashboard figures over the whole book
    pub async fn portfolio_summary(&self) -> LoanResult<PortfolioSummary> {
        let loans = self.repository.list().await?;
        Ok(PortfolioSummary::from_loans(&loans))
    }

    async fn commit<F>(&mut self, loan_id: &str, mut edit: F) -> LoanResult<ReconciliationOutcome>
    where
        F: FnMut(&mut Loan) -> LoanResult<()>,
    {
        let mut attempt = 0;
        loop {
            let mut loan = self.get_loan_required(loan_id).await?;
            let expected = loan.revision;
            edit(&mut loan)?;

            let mut outcome = self.engine.reconcile_with_outcome(loan);
            self.validator.validate_loan(&outcome.loan)?;

            match self.repository.save(&outcome.loan, expected).await {
                Ok(revision) => {
                    outcome.loan.revision = revision;
                    return Ok(outcome);
                }
                Err(LoanError::RevisionConflict { found, .. })
                    if attempt < self.max_conflict_retries =>
                {
                    attempt += 1;
                    warn!(loan_id, expected, found, attempt, "revision conflict, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn audit(&self, action: AuditAction, loan_id: &str, details: String) {
        let entry = AuditEntry::new(action, loan_id, details);
        if let Err(e) = self.audit.record(entry).await {
            warn!(loan_id, error = %e, "failed to record audit entry");
        }
    }
}

fn balance_details(loan: &Loan) -> String {
    format!(
        "Contrato {} | Saldo Restante: R$ {}",
        loan.id,
        loan.amount.round(2)
    )
}
