//! Engine policy loaded from TOML
//!
//! Every section is optional; omitted values fall back to the built-in
//! policy (the marker lists and the `0.10` settlement epsilon).

use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use crate::reconciliation::{
    Classifier, MarkerSet, ReconciliationService, StatusResolver, DEFAULT_INTEREST_MARKERS,
    DEFAULT_NON_PAYMENT_MARKERS, DEFAULT_SETTLEMENT_EPSILON,
};
use crate::types::{LoanError, LoanResult};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub status: StatusConfig,
    #[serde(default)]
    pub servicing: ServicingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifierConfig {
    #[serde(default = "default_non_payment_markers")]
    pub non_payment_markers: Vec<String>,
    #[serde(default = "default_interest_markers")]
    pub interest_markers: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            non_payment_markers: default_non_payment_markers(),
            interest_markers: default_interest_markers(),
        }
    }
}

fn default_non_payment_markers() -> Vec<String> {
    DEFAULT_NON_PAYMENT_MARKERS.iter().map(|m| m.to_string()).collect()
}

fn default_interest_markers() -> Vec<String> {
    DEFAULT_INTEREST_MARKERS.iter().map(|m| m.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatusConfig {
    /// Decimal string; balances at or below it are settled
    #[serde(default = "default_settlement_epsilon")]
    pub settlement_epsilon: String,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            settlement_epsilon: default_settlement_epsilon(),
        }
    }
}

fn default_settlement_epsilon() -> String {
    DEFAULT_SETTLEMENT_EPSILON.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServicingConfig {
    /// Retries for read-modify-write cycles that lose a revision race
    #[serde(default = "default_max_conflict_retries")]
    pub max_conflict_retries: u32,
}

impl Default for ServicingConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: default_max_conflict_retries(),
        }
    }
}

fn default_max_conflict_retries() -> u32 {
    3
}

impl EngineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> LoanResult<Self> {
        let config: EngineConfig =
            toml::from_str(text).map_err(|e| LoanError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> LoanResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| LoanError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> LoanResult<()> {
        self.settlement_epsilon()?;

        for (name, markers) in [
            ("non_payment_markers", &self.classifier.non_payment_markers),
            ("interest_markers", &self.classifier.interest_markers),
        ] {
            if markers.iter().any(|m| m.trim().is_empty()) {
                return Err(LoanError::Config(format!(
                    "classifier.{} cannot contain blank markers",
                    name
                )));
            }
        }

        Ok(())
    }

    /// The parsed settlement epsilon
    pub fn settlement_epsilon(&self) -> LoanResult<BigDecimal> {
        let raw = self.status.settlement_epsilon.trim();
        let epsilon = BigDecimal::from_str(raw).map_err(|_| {
            LoanError::Config(format!("status.settlement_epsilon '{}' is not a decimal", raw))
        })?;
        if epsilon < BigDecimal::zero() {
            return Err(LoanError::Config(format!(
                "status.settlement_epsilon must not be negative, got {}",
                raw
            )));
        }
        Ok(epsilon)
    }

    pub fn classifier(&self) -> Classifier {
        Classifier::new(
            MarkerSet::new(&self.classifier.non_payment_markers),
            MarkerSet::new(&self.classifier.interest_markers),
        )
    }

    pub fn status_resolver(&self) -> LoanResult<StatusResolver> {
        Ok(StatusResolver::new(self.settlement_epsilon()?))
    }

    /// Build the reconciliation engine this configuration describes
    pub fn reconciliation_service(&self) -> LoanResult<ReconciliationService> {
        Ok(ReconciliationService::new(
            self.classifier(),
            self.status_resolver()?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Loan, LoanStatus, PaymentRecord};
    use std::io::Write;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(
            config.settlement_epsilon().unwrap(),
            BigDecimal::from_str("0.10").unwrap()
        );
        assert_eq!(config.servicing.max_conflict_retries, 3);
        assert_eq!(config.classifier(), Classifier::default());
    }

    #[test]
    fn test_partial_override() {
        let config = EngineConfig::from_toml_str(
            r#"
            [classifier]
            interest_markers = ["juros", "mora"]

            [status]
            settlement_epsilon = "0.50"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.classifier.non_payment_markers,
            default_non_payment_markers()
        );

        let service = config.reconciliation_service().unwrap();
        let mut loan = Loan::new("01/2025".into(), "Carla".into(), BigDecimal::from_str("0.40").unwrap());
        loan.push_record(PaymentRecord::new(
            "2025-01-01".into(),
            "Mora".into(),
            BigDecimal::from(12),
        ));

        let loan = service.reconcile(loan);
        assert_eq!(loan.status, LoanStatus::Pago);
        assert_eq!(loan.total_paid_interest, BigDecimal::from(12));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            EngineConfig::from_toml_str("[status]\nsettlement_epsilon = \"ten cents\""),
            Err(LoanError::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("[status]\nsettlement_epsilon = \"-1\""),
            Err(LoanError::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("[classifier]\ninterest_markers = [\"\"]"),
            Err(LoanError::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("[unknown]\nkey = 1"),
            Err(LoanError::Config(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[servicing]\nmax_conflict_retries = 7").unwrap();

        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.servicing.max_conflict_retries, 7);

        assert!(matches!(
            EngineConfig::from_file("/nonexistent/engine.toml"),
            Err(LoanError::Config(_))
        ));
    }
}
