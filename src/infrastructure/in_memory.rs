use crate::domain::account::{Account, LedgerEntry, OwnerId, TransferRecord};
use crate::domain::ports::{AccountStore, LedgerStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for accounts.
///
/// Uses `Arc<RwLock<HashMap<OwnerId, Account>>>` to allow shared concurrent
/// access. The only adapter shipped; durable persistence is a collaborator
/// concern.
#[derive(Default, Clone)]
pub struct InMemoryAccountStore {
    accounts: Arc<RwLock<HashMap<OwnerId, Account>>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn store(&self, account: Account) -> io::Result<()> {
        let mut accounts = self.accounts.write().await;
        accounts.insert(account.owner, account);
        Ok(())
    }

    async fn get(&self, owner: OwnerId) -> io::Result<Option<Account>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.get(&owner).cloned())
    }

    async fn all(&self) -> io::Result<Vec<Account>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().cloned().collect())
    }
}

/// A thread-safe in-memory append-only ledger history.
#[derive(Default, Clone)]
pub struct InMemoryLedgerStore {
    entries: Arc<RwLock<Vec<LedgerEntry>>>,
    transfers: Arc<RwLock<Vec<TransferRecord>>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn append(&self, entry: LedgerEntry) -> io::Result<()> {
        let mut entries = self.entries.write().await;
        entries.push(entry);
        Ok(())
    }

    async fn record_transfer(&self, transfer: TransferRecord) -> io::Result<()> {
        let mut transfers = self.transfers.write().await;
        transfers.push(transfer);
        Ok(())
    }

    async fn entries_of(&self, owner: OwnerId) -> io::Result<Vec<LedgerEntry>> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|entry| entry.owner == owner)
            .cloned()
            .collect())
    }

    async fn all_entries(&self) -> io::Result<Vec<LedgerEntry>> {
        let entries = self.entries.read().await;
        Ok(entries.clone())
    }

    async fn transfers(&self) -> io::Result<Vec<TransferRecord>> {
        let transfers = self.transfers.read().await;
        Ok(transfers.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::EntryKind;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_account_store_roundtrip() {
        let store = InMemoryAccountStore::new();
        let account = Account::open(1, Utc::now());

        store.store(account.clone()).await.unwrap();
        let retrieved = store.get(1).await.unwrap().unwrap();
        assert_eq!(retrieved, account);

        assert!(store.get(2).await.unwrap().is_none());
        assert_eq!(store.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ledger_store_filters_by_owner() {
        let store = InMemoryLedgerStore::new();
        for owner in [1u64, 2, 1] {
            store
                .append(LedgerEntry {
                    owner,
                    amount: dec!(1.0),
                    at: Utc::now(),
                    kind: EntryKind::Deposit,
                })
                .await
                .unwrap();
        }

        assert_eq!(store.entries_of(1).await.unwrap().len(), 2);
        assert_eq!(store.entries_of(2).await.unwrap().len(), 1);
        assert_eq!(store.all_entries().await.unwrap().len(), 3);
    }
}
