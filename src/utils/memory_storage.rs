//! In-memory collaborator implementations for testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::traits::*;
use crate::types::*;

fn read_lock<T>(lock: &RwLock<T>) -> LoanResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| LoanError::Storage("lock poisoned".to_string()))
}

fn write_lock<T>(lock: &RwLock<T>) -> LoanResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| LoanError::Storage("lock poisoned".to_string()))
}

/// In-memory loan repository for testing and development
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    loans: Arc<RwLock<HashMap<String, Loan>>>,
}

impl MemoryRepository {
    /// Create a new memory repository instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a loan as-is, bypassing revision checks
    pub fn seed(&self, loan: Loan) -> LoanResult<()> {
        write_lock(&self.loans)?.insert(loan.id.clone(), loan);
        Ok(())
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) -> LoanResult<()> {
        write_lock(&self.loans)?.clear();
        Ok(())
    }
}

#[async_trait]
impl LoanRepository for MemoryRepository {
    async fn load(&self, loan_id: &str) -> LoanResult<Option<Loan>> {
        Ok(read_lock(&self.loans)?.get(loan_id).cloned())
    }

    async fn list(&self) -> LoanResult<Vec<Loan>> {
        let loans = read_lock(&self.loans)?;
        let mut all: Vec<Loan> = loans.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }

    async fn insert(&mut self, loan: &Loan) -> LoanResult<()> {
        let mut loans = write_lock(&self.loans)?;
        if loans.contains_key(&loan.id) {
            return Err(LoanError::DuplicateLoan(loan.id.clone()));
        }
        loans.insert(loan.id.clone(), loan.clone());
        Ok(())
    }

    async fn save(&mut self, loan: &Loan, expected_revision: u64) -> LoanResult<u64> {
        // Check and write under one guard so the swap is atomic
        let mut loans = write_lock(&self.loans)?;
        let stored = loans
            .get(&loan.id)
            .ok_or_else(|| LoanError::LoanNotFound(loan.id.clone()))?;

        if stored.revision != expected_revision {
            return Err(LoanError::RevisionConflict {
                loan_id: loan.id.clone(),
                expected: expected_revision,
                found: stored.revision,
            });
        }

        let mut updated = loan.clone();
        updated.revision = expected_revision + 1;
        let revision = updated.revision;
        loans.insert(updated.id.clone(), updated);
        Ok(revision)
    }

    async fn delete(&mut self, loan_id: &str) -> LoanResult<()> {
        if write_lock(&self.loans)?.remove(loan_id).is_some() {
            Ok(())
        } else {
            Err(LoanError::LoanNotFound(loan_id.to_string()))
        }
    }
}

/// Audit sink that keeps entries in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryAuditLog {
    entries: Arc<RwLock<Vec<AuditEntry>>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded entries, oldest first
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .read()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Entries recorded for one loan
    pub fn entries_for(&self, loan_id: &str) -> Vec<AuditEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.loan_id == loan_id)
            .collect()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditLog {
    async fn record(&self, entry: AuditEntry) -> LoanResult<()> {
        write_lock(&self.entries)?.push(entry);
        Ok(())
    }
}

/// Blacklist held in memory, matched by name or CPF
#[derive(Debug, Clone, Default)]
pub struct MemoryBlacklist {
    entries: Arc<RwLock<Vec<BlacklistEntry>>>,
}

impl MemoryBlacklist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, entry: BlacklistEntry) -> LoanResult<()> {
        write_lock(&self.entries)?.push(entry);
        Ok(())
    }
}

fn digits(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[async_trait]
impl BlacklistLookup for MemoryBlacklist {
    async fn find(&self, client: &str) -> LoanResult<Option<BlacklistEntry>> {
        let needle = client.trim().to_lowercase();
        let needle_digits = digits(client);
        let entries = read_lock(&self.entries)?;

        Ok(entries
            .iter()
            .find(|entry| {
                entry.name.trim().to_lowercase() == needle
                    || (!needle_digits.is_empty() && digits(&entry.cpf) == needle_digits)
            })
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;

    #[tokio::test]
    async fn test_save_is_compare_and_swap() {
        let mut repo = MemoryRepository::new();
        let loan = Loan::new("01/2024".into(), "Ana".into(), BigDecimal::from(100));
        repo.insert(&loan).await.unwrap();

        let first = repo.load("01/2024").await.unwrap().unwrap();
        let second = first.clone();

        assert_eq!(repo.save(&first, first.revision).await.unwrap(), 1);

        match repo.save(&second, second.revision).await {
            Err(LoanError::RevisionConflict {
                expected, found, ..
            }) => {
                assert_eq!(expected, 0);
                assert_eq!(found, 1);
            }
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicates() {
        let mut repo = MemoryRepository::new();
        let loan = Loan::new("01/2024".into(), "Ana".into(), BigDecimal::from(100));
        repo.insert(&loan).await.unwrap();
        assert!(matches!(
            repo.insert(&loan).await,
            Err(LoanError::DuplicateLoan(_))
        ));
        assert!(matches!(
            repo.delete("02/2024").await,
            Err(LoanError::LoanNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_blacklist_matches_name_or_cpf() {
        let blacklist = MemoryBlacklist::new();
        blacklist
            .add(BlacklistEntry {
                id: "1".to_string(),
                name: "Carlos Mendes".to_string(),
                cpf: "123.456.789-00".to_string(),
                reason: "Fraude documental".to_string(),
                date: "2024-01-01".to_string(),
                risk_level: "Alto".to_string(),
                notes: String::new(),
            })
            .unwrap();

        assert!(blacklist.find("carlos mendes ").await.unwrap().is_some());
        assert!(blacklist.find("12345678900").await.unwrap().is_some());
        assert!(blacklist.find("Carla Mendes").await.unwrap().is_none());
    }
}
