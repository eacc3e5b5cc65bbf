use crate::domain::account::{
    Account, Amount, EntryKind, LedgerEntry, OwnerId, TransferRecord, WithdrawRequest,
    WithdrawStatus,
};
use crate::domain::ports::{Notification, SharedAccountStore, SharedLedgerStore, SharedNotifier};
use crate::domain::pricing::Tier;
use crate::error::{PoolError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

/// Per-owner mutual exclusion. Money operations hold the lock for exactly the
/// accounts they touch; two-account operations acquire in ascending owner
/// order so opposite-direction transfers cannot deadlock.
#[derive(Default)]
pub(crate) struct KeyedLocks {
    locks: Mutex<HashMap<OwnerId, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    pub(crate) async fn acquire(&self, owner: OwnerId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(owner).or_default())
        };
        lock.lock_owned().await
    }

    pub(crate) async fn acquire_pair(
        &self,
        a: OwnerId,
        b: OwnerId,
    ) -> (OwnedMutexGuard<()>, Option<OwnedMutexGuard<()>>) {
        if a == b {
            return (self.acquire(a).await, None);
        }
        let (first, second) = if a < b { (a, b) } else { (b, a) };
        let g1 = self.acquire(first).await;
        let g2 = self.acquire(second).await;
        (g1, Some(g2))
    }
}

/// The only writer of account balances and ledger history. Every mutation
/// appends the matching signed entry, so an account's card balance always
/// equals the sum of its entries.
pub struct Ledger {
    accounts: SharedAccountStore,
    history: SharedLedgerStore,
    notifier: SharedNotifier,
    locks: Arc<KeyedLocks>,
    withdraws: Mutex<HashMap<u64, WithdrawRequest>>,
    next_withdraw_id: AtomicU64,
}

impl Ledger {
    pub fn new(
        accounts: SharedAccountStore,
        history: SharedLedgerStore,
        notifier: SharedNotifier,
        locks: Arc<KeyedLocks>,
    ) -> Self {
        Self {
            accounts,
            history,
            notifier,
            locks,
            withdraws: Mutex::new(HashMap::new()),
            next_withdraw_id: AtomicU64::new(1),
        }
    }

    /// Fetches the account, creating an inactive one on first contact.
    pub async fn open_account(&self, owner: OwnerId, now: DateTime<Utc>) -> Result<Account> {
        let _guard = self.locks.acquire(owner).await;
        self.load_or_open(owner, now).await
    }

    pub async fn account(&self, owner: OwnerId) -> Result<Option<Account>> {
        Ok(self.accounts.get(owner).await?)
    }

    pub async fn all_accounts(&self) -> Result<Vec<Account>> {
        Ok(self.accounts.all().await?)
    }

    pub async fn entries_of(&self, owner: OwnerId) -> Result<Vec<LedgerEntry>> {
        Ok(self.history.entries_of(owner).await?)
    }

    pub async fn all_entries(&self) -> Result<Vec<LedgerEntry>> {
        Ok(self.history.all_entries().await?)
    }

    pub async fn transfers(&self) -> Result<Vec<TransferRecord>> {
        Ok(self.history.transfers().await?)
    }

    pub async fn credit(
        &self,
        owner: OwnerId,
        amount: Amount,
        kind: EntryKind,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let _guard = self.locks.acquire(owner).await;
        let mut account = self.load_or_open(owner, now).await?;
        account.credit_card(amount);
        self.accounts.store(account).await?;
        self.history
            .append(LedgerEntry {
                owner,
                amount: amount.value(),
                at: now,
                kind,
            })
            .await?;
        debug!(owner, amount = %amount.value(), ?kind, "card credited");
        Ok(())
    }

    pub async fn debit(
        &self,
        owner: OwnerId,
        amount: Amount,
        kind: EntryKind,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let _guard = self.locks.acquire(owner).await;
        let mut account = self
            .accounts
            .get(owner)
            .await?
            .ok_or(PoolError::UnknownAccount(owner))?;
        account.debit_card(amount)?;
        self.accounts.store(account).await?;
        self.history
            .append(LedgerEntry {
                owner,
                amount: -amount.value(),
                at: now,
                kind,
            })
            .await?;
        debug!(owner, amount = %amount.value(), ?kind, "card debited");
        Ok(())
    }

    /// Moves funds between card balances: one TransferOut on the source, one
    /// TransferIn on the destination, same timestamp and magnitude. Both
    /// account locks are held for the whole operation, so no reader going
    /// through the ledger observes a half-applied transfer.
    pub async fn transfer(
        &self,
        from: OwnerId,
        to: OwnerId,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let amount = Amount::new(amount)?;
        let (_guard_a, _guard_b) = self.locks.acquire_pair(from, to).await;

        let mut source = self
            .accounts
            .get(from)
            .await?
            .ok_or(PoolError::UnknownAccount(from))?;

        if from == to {
            // Permitted; the balance is unchanged but both rows still land.
            source.debit_card(amount)?;
            source.credit_card(amount);
            self.accounts.store(source).await?;
        } else {
            let mut destination = self
                .accounts
                .get(to)
                .await?
                .ok_or(PoolError::UnknownAccount(to))?;
            if !destination.can_receive() {
                return Err(PoolError::UnknownAccount(to));
            }
            source.debit_card(amount)?;
            destination.credit_card(amount);
            self.accounts.store(destination).await?;
            self.accounts.store(source).await?;
        }

        self.history
            .append(LedgerEntry {
                owner: from,
                amount: -amount.value(),
                at: now,
                kind: EntryKind::TransferOut,
            })
            .await?;
        self.history
            .append(LedgerEntry {
                owner: to,
                amount: amount.value(),
                at: now,
                kind: EntryKind::TransferIn,
            })
            .await?;
        self.history
            .record_transfer(TransferRecord {
                from,
                to,
                amount: amount.value(),
                at: now,
            })
            .await?;

        info!(from, to, amount = %amount.value(), "transfer applied");
        if from != to {
            self.send(
                to,
                Notification::TransferReceived {
                    from,
                    amount: amount.value(),
                },
            );
        }
        Ok(())
    }

    pub async fn set_tier(&self, owner: OwnerId, tier: Option<Tier>) -> Result<()> {
        let _guard = self.locks.acquire(owner).await;
        let mut account = self
            .accounts
            .get(owner)
            .await?
            .ok_or(PoolError::UnknownAccount(owner))?;
        account.tier = tier;
        self.accounts.store(account).await?;
        Ok(())
    }

    pub async fn set_reputation(&self, owner: OwnerId, reputation: Decimal) -> Result<()> {
        let _guard = self.locks.acquire(owner).await;
        let mut account = self
            .accounts
            .get(owner)
            .await?
            .ok_or(PoolError::UnknownAccount(owner))?;
        account.reputation = reputation;
        self.accounts.store(account).await?;
        Ok(())
    }

    pub async fn activate_account(&self, owner: OwnerId) -> Result<()> {
        let _guard = self.locks.acquire(owner).await;
        let mut account = self
            .accounts
            .get(owner)
            .await?
            .ok_or(PoolError::UnknownAccount(owner))?;
        account.activate();
        self.accounts.store(account).await?;
        info!(owner, "account activated");
        Ok(())
    }

    /// Blocks the account; any remaining card balance is seized and recorded
    /// as a withdrawal so the entry history stays consistent.
    pub async fn block_account(&self, owner: OwnerId, now: DateTime<Utc>) -> Result<()> {
        let _guard = self.locks.acquire(owner).await;
        let mut account = self
            .accounts
            .get(owner)
            .await?
            .ok_or(PoolError::UnknownAccount(owner))?;
        let seized = account.block();
        self.accounts.store(account).await?;
        if seized.value() > Decimal::ZERO {
            self.history
                .append(LedgerEntry {
                    owner,
                    amount: -seized.value(),
                    at: now,
                    kind: EntryKind::Withdraw,
                })
                .await?;
        }
        info!(owner, seized = %seized.value(), "account blocked");
        Ok(())
    }

    pub async fn request_withdraw(&self, owner: OwnerId, amount: Decimal) -> Result<WithdrawRequest> {
        let amount = Amount::new(amount)?;
        if self.accounts.get(owner).await?.is_none() {
            return Err(PoolError::UnknownAccount(owner));
        }
        let request = WithdrawRequest {
            id: self.next_withdraw_id.fetch_add(1, Ordering::Relaxed),
            owner,
            amount: amount.value(),
            status: WithdrawStatus::Pending,
        };
        self.withdraws
            .lock()
            .await
            .insert(request.id, request.clone());
        info!(owner, id = request.id, amount = %request.amount, "withdraw requested");
        Ok(request)
    }

    /// Pays a pending request out of the owner's referral balance.
    pub async fn approve_withdraw(&self, id: u64) -> Result<WithdrawRequest> {
        let (owner, amount) = {
            let withdraws = self.withdraws.lock().await;
            let request = withdraws
                .get(&id)
                .filter(|request| request.status == WithdrawStatus::Pending)
                .ok_or_else(|| PoolError::Validation(format!("no pending withdraw request {id}")))?;
            (request.owner, request.amount)
        };

        let _guard = self.locks.acquire(owner).await;
        let mut account = self
            .accounts
            .get(owner)
            .await?
            .ok_or(PoolError::UnknownAccount(owner))?;
        account.debit_referral(Amount::new(amount)?)?;
        self.accounts.store(account).await?;

        let mut withdraws = self.withdraws.lock().await;
        let request = withdraws
            .get_mut(&id)
            .ok_or_else(|| PoolError::Validation(format!("no pending withdraw request {id}")))?;
        request.status = WithdrawStatus::Paid;
        let paid = request.clone();
        drop(withdraws);

        info!(owner, id, amount = %amount, "withdraw paid");
        self.send(owner, Notification::WithdrawApproved { amount });
        Ok(paid)
    }

    pub async fn close_withdraw(&self, id: u64) -> Result<WithdrawRequest> {
        let mut withdraws = self.withdraws.lock().await;
        let request = withdraws
            .get_mut(&id)
            .filter(|request| request.status == WithdrawStatus::Pending)
            .ok_or_else(|| PoolError::Validation(format!("no pending withdraw request {id}")))?;
        request.status = WithdrawStatus::Closed;
        Ok(request.clone())
    }

    pub async fn pending_withdraws(&self) -> Vec<WithdrawRequest> {
        self.withdraws
            .lock()
            .await
            .values()
            .filter(|request| request.status == WithdrawStatus::Pending)
            .cloned()
            .collect()
    }

    async fn load_or_open(&self, owner: OwnerId, now: DateTime<Utc>) -> Result<Account> {
        match self.accounts.get(owner).await? {
            Some(account) => Ok(account),
            None => {
                let account = Account::open(owner, now);
                self.accounts.store(account.clone()).await?;
                Ok(account)
            }
        }
    }

    fn send(&self, recipient: OwnerId, event: Notification) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            notifier.notify(recipient, event).await;
        });
    }
}
