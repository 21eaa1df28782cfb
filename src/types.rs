//! Core types and data structures for the loan servicing system

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::utils::{lenient, money};

/// Lifecycle status of a loan contract
///
/// The reconciliation engine only ever writes [`LoanStatus::EmDia`] or
/// [`LoanStatus::Pago`]. `Atrasado` is set by time-based overdue marking and
/// any other label is carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(into = "String")]
pub enum LoanStatus {
    /// Current: no installment past due
    #[default]
    EmDia,
    /// Overdue: an installment is past its due date
    Atrasado,
    /// Paid off: the outstanding balance is settled
    Pago,
    /// Awaiting approval
    Pendente,
    /// Any label this crate does not know about
    Other(String),
}

impl LoanStatus {
    /// Wire label used in persisted documents
    pub fn label(&self) -> &str {
        match self {
            LoanStatus::EmDia => "Em Dia",
            LoanStatus::Atrasado => "Atrasado",
            LoanStatus::Pago => "Pago",
            LoanStatus::Pendente => "Pendente",
            LoanStatus::Other(label) => label,
        }
    }

    /// Whether the loan still has a balance being serviced
    pub fn is_active(&self) -> bool {
        *self != LoanStatus::Pago
    }
}

impl From<String> for LoanStatus {
    fn from(label: String) -> Self {
        match label.trim() {
            "Em Dia" | "EmDia" => LoanStatus::EmDia,
            "Atrasado" => LoanStatus::Atrasado,
            "Pago" => LoanStatus::Pago,
            "Pendente" => LoanStatus::Pendente,
            "" => LoanStatus::EmDia,
            _ => LoanStatus::Other(label),
        }
    }
}

impl From<&str> for LoanStatus {
    fn from(label: &str) -> Self {
        LoanStatus::from(label.to_string())
    }
}

impl From<LoanStatus> for String {
    fn from(status: LoanStatus) -> Self {
        status.label().to_string()
    }
}

impl<'de> Deserialize<'de> for LoanStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        lenient::text::deserialize(deserializer).map(LoanStatus::from)
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One entry of a loan's payment history
///
/// Records are immutable once appended. Every field decodes leniently:
/// a missing, `null` or malformed value is zero or empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    /// Date the event is attributed to (ISO-like, not validated)
    #[serde(default, deserialize_with = "lenient::text::deserialize")]
    pub date: String,
    /// When the event was recorded
    #[serde(default, deserialize_with = "lenient::text::deserialize")]
    pub registered_at: String,
    /// Total value of the event
    #[serde(default, with = "money")]
    pub amount: BigDecimal,
    /// Principal component, when the split was recorded explicitly
    #[serde(default, with = "money")]
    pub capital_paid: BigDecimal,
    /// Interest component, when the split was recorded explicitly
    #[serde(default, with = "money")]
    pub interest_paid: BigDecimal,
    /// Free-text label such as "Abertura", "Parcela" or "Juros"
    #[serde(rename = "type", default, deserialize_with = "lenient::text::deserialize")]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient::text::deserialize")]
    pub note: String,
}

impl PaymentRecord {
    /// Create a record without an explicit principal/interest split
    pub fn new(date: String, kind: String, amount: BigDecimal) -> Self {
        Self {
            registered_at: date.clone(),
            date,
            amount,
            capital_paid: BigDecimal::zero(),
            interest_paid: BigDecimal::zero(),
            kind,
            note: String::new(),
        }
    }

    /// Create a record carrying an explicit split; `amount` is their sum
    pub fn with_split(
        date: String,
        kind: String,
        capital_paid: BigDecimal,
        interest_paid: BigDecimal,
    ) -> Self {
        Self {
            registered_at: date.clone(),
            date,
            amount: &capital_paid + &interest_paid,
            capital_paid,
            interest_paid,
            kind,
            note: String::new(),
        }
    }

    /// Attach a note
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    /// Override the recording timestamp
    pub fn registered_at(mut self, registered_at: impl Into<String>) -> Self {
        self.registered_at = registered_at.into();
        self
    }
}

/// Loan contract snapshot as persisted by the servicing system
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    /// Stable identifier, assigned once at creation
    #[serde(default, deserialize_with = "lenient::text::deserialize")]
    pub id: String,
    /// Borrower name
    #[serde(default, deserialize_with = "lenient::text::deserialize")]
    pub client: String,
    /// Current outstanding principal balance
    #[serde(default, with = "money")]
    pub amount: BigDecimal,
    /// Remaining installments
    #[serde(default, deserialize_with = "lenient::count::deserialize")]
    pub installments: u32,
    /// Contract interest rate, percent per period
    #[serde(default, with = "money")]
    pub interest_rate: BigDecimal,
    #[serde(default, deserialize_with = "lenient::text::deserialize")]
    pub start_date: String,
    /// Next installment due date (ISO-like)
    #[serde(default, deserialize_with = "lenient::text::deserialize")]
    pub next_due: String,
    #[serde(default)]
    pub status: LoanStatus,
    #[serde(default, with = "money")]
    pub installment_value: BigDecimal,
    #[serde(default, with = "money")]
    pub fine_rate: BigDecimal,
    #[serde(default, with = "money")]
    pub mora_interest_rate: BigDecimal,
    /// Lifetime interest received; derived by reconciliation
    #[serde(default, with = "money")]
    pub total_paid_interest: BigDecimal,
    /// Lifetime principal received; derived by reconciliation
    #[serde(default, with = "money")]
    pub total_paid_capital: BigDecimal,
    /// Append-only payment ledger, in recording order
    #[serde(default, deserialize_with = "lenient::records")]
    pub history: Vec<PaymentRecord>,
    /// Optimistic concurrency counter, bumped on every successful save
    #[serde(default, deserialize_with = "lenient::count::deserialize")]
    pub revision: u64,
    /// Fields this crate does not model, preserved verbatim
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Loan {
    /// Create a loan with an empty history, zero totals and status `Em Dia`
    pub fn new(id: String, client: String, amount: BigDecimal) -> Self {
        Self {
            id,
            client,
            amount,
            ..Default::default()
        }
    }

    /// Append a record to the history
    pub fn push_record(&mut self, record: PaymentRecord) {
        self.history.push(record);
    }

    /// Principal still owed according to the running totals
    pub fn outstanding_capital(&self) -> BigDecimal {
        &self.amount - &self.total_paid_capital
    }
}

/// Input for opening a new loan
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLoan {
    /// Explicit identifier; generated as `NN/YYYY` when absent
    #[serde(default)]
    pub id: Option<String>,
    pub client: String,
    #[serde(with = "money")]
    pub principal: BigDecimal,
    #[serde(default)]
    pub installments: u32,
    #[serde(default, with = "money")]
    pub interest_rate: BigDecimal,
    #[serde(default, with = "money")]
    pub installment_value: BigDecimal,
    #[serde(default, with = "money")]
    pub fine_rate: BigDecimal,
    /// Contract start date (`YYYY-MM-DD`)
    pub start_date: String,
    #[serde(default)]
    pub next_due: String,
}

/// Blacklisted party, looked up before a loan is opened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlacklistEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub cpf: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub risk_level: String,
    #[serde(default)]
    pub notes: String,
}

/// Actions reported to the audit sink
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditAction {
    LoanCreated,
    LoanUpdated,
    LoanDeleted,
    PaymentRegistered,
    StatusChanged,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AuditAction::LoanCreated => "NOVO EMPRÉSTIMO",
            AuditAction::LoanUpdated => "ATUALIZAÇÃO CONTRATO",
            AuditAction::LoanDeleted => "EXCLUSÃO EMPRÉSTIMO",
            AuditAction::PaymentRegistered => "BAIXA REGISTRADA",
            AuditAction::StatusChanged => "ALTERAÇÃO STATUS",
        };
        f.write_str(label)
    }
}

/// Audit log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: uuid::Uuid,
    pub action: AuditAction,
    pub user: String,
    pub loan_id: String,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    /// Create an entry attributed to the system user
    pub fn new(action: AuditAction, loan_id: &str, details: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            action,
            user: "Sistema".to_string(),
            loan_id: loan_id.to_string(),
            details,
            timestamp: Utc::now(),
        }
    }
}

/// Errors that can occur in the servicing system
#[derive(Debug, thiserror::Error)]
pub enum LoanError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Loan not found: {0}")]
    LoanNotFound(String),
    #[error("Loan already exists: {0}")]
    DuplicateLoan(String),
    #[error("Revision conflict on loan {loan_id}: expected {expected}, found {found}")]
    RevisionConflict {
        loan_id: String,
        expected: u64,
        found: u64,
    },
    #[error("Client '{client}' is blacklisted: {reason}")]
    Blacklisted { client: String, reason: String },
    #[error("Invalid payment: {0}")]
    InvalidPayment(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for servicing operations
pub type LoanResult<T> = Result<T, LoanError>;
