use crate::domain::account::{Account, LedgerEntry, OwnerId, TransferRecord};
use crate::domain::number::PhoneNumber;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::io;
use std::sync::Arc;

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn store(&self, account: Account) -> io::Result<()>;
    async fn get(&self, owner: OwnerId) -> io::Result<Option<Account>>;
    async fn all(&self) -> io::Result<Vec<Account>>;
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn append(&self, entry: LedgerEntry) -> io::Result<()>;
    async fn record_transfer(&self, transfer: TransferRecord) -> io::Result<()>;
    async fn entries_of(&self, owner: OwnerId) -> io::Result<Vec<LedgerEntry>>;
    async fn all_entries(&self) -> io::Result<Vec<LedgerEntry>>;
    async fn transfers(&self) -> io::Result<Vec<TransferRecord>>;
}

/// Events pushed to owners and admins as state changes commit. Delivery is
/// best-effort: a transition never rolls back because a notification failed.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    ActivationExpired { phone: PhoneNumber },
    CodeEntered { phone: PhoneNumber, by: OwnerId },
    ActivationSkipped { phone: PhoneNumber, by: OwnerId },
    HoldRecorded { phone: PhoneNumber, hold: String },
    NumberBlocked { phone: PhoneNumber },
    PayoutArrived { amount: Decimal },
    TransferReceived { from: OwnerId, amount: Decimal },
    ReferralReward { referee: OwnerId, amount: Decimal },
    ReferralForfeit { referee: OwnerId, amount: Decimal },
    WithdrawApproved { amount: Decimal },
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, recipient: OwnerId, event: Notification);
}

pub type SharedAccountStore = Arc<dyn AccountStore>;
pub type SharedLedgerStore = Arc<dyn LedgerStore>;
pub type SharedNotifier = Arc<dyn Notifier>;
