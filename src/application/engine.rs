use crate::application::coordinator::ActivationCoordinator;
use crate::application::ledger::{KeyedLocks, Ledger};
use crate::application::payout::{PayoutEngine, PayoutSummary};
use crate::application::queue::QueuePriority;
use crate::application::referral::ReferralProgram;
use crate::config::{Settings, SharedSettings};
use crate::domain::account::{
    Account, Amount, EntryKind, LedgerEntry, OwnerId, TransferRecord, WithdrawRequest,
};
use crate::domain::hold::Hold;
use crate::domain::number::{NumberKind, PhoneNumber};
use crate::domain::ports::{SharedAccountStore, SharedLedgerStore, SharedNotifier};
use crate::domain::pricing::{self, Tier};
use crate::domain::work::{
    BlockedRecord, HoldRecord, OutcomeKind, PendingActivation, WorkItem, WorkingEntry,
};
use crate::error::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// The pool's public face. Owns the wiring between the queue/activation
/// coordinator, the ledger, the referral program, and the payout engine, and
/// exposes the operations the (external) user and admin layers call.
pub struct PoolEngine {
    settings: SharedSettings,
    coordinator: Arc<ActivationCoordinator>,
    ledger: Arc<Ledger>,
    referrals: ReferralProgram,
    payouts: PayoutEngine,
}

impl PoolEngine {
    pub fn new(
        accounts: SharedAccountStore,
        history: SharedLedgerStore,
        notifier: SharedNotifier,
        settings: Settings,
    ) -> Self {
        let settings = SharedSettings::new(settings);
        let locks = Arc::new(KeyedLocks::default());
        let coordinator = Arc::new(ActivationCoordinator::new(
            settings.clone(),
            Arc::clone(&notifier),
        ));
        let ledger = Arc::new(Ledger::new(
            Arc::clone(&accounts),
            history,
            Arc::clone(&notifier),
            Arc::clone(&locks),
        ));
        let referrals = ReferralProgram::new(
            Arc::clone(&accounts),
            Arc::clone(&locks),
            settings.clone(),
            Arc::clone(&notifier),
        );
        let payouts = PayoutEngine::new(
            Arc::clone(&coordinator),
            Arc::clone(&ledger),
            settings.clone(),
            notifier,
        );
        Self {
            settings,
            coordinator,
            ledger,
            referrals,
            payouts,
        }
    }

    /// Runtime configuration entry point.
    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    // ---- owners -----------------------------------------------------------

    pub async fn register(
        &self,
        owner: OwnerId,
        referred_by: Option<OwnerId>,
    ) -> Result<Account> {
        self.referrals.register(owner, referred_by, Utc::now()).await
    }

    pub async fn touch(&self, owner: OwnerId) -> Result<()> {
        self.referrals.touch(owner, Utc::now()).await
    }

    pub async fn inactivity_sweep(&self) -> Result<usize> {
        self.referrals.inactivity_sweep(Utc::now()).await
    }

    // ---- queue & activation ----------------------------------------------

    /// Validates and queues a number for the owner, opening the account on
    /// first contact.
    pub async fn submit(&self, owner: OwnerId, raw: &str, kind: NumberKind) -> Result<()> {
        let phone = PhoneNumber::parse(raw, kind)?;
        let now = Utc::now();
        self.ledger.open_account(owner, now).await?;
        self.coordinator.submit(owner, phone, kind, now).await?;
        self.referrals.touch(owner, now).await
    }

    pub async fn cancel(&self, owner: OwnerId, phone: &PhoneNumber) -> Result<()> {
        self.coordinator.cancel(owner, phone).await
    }

    pub async fn list_queue(&self) -> Result<Vec<WorkItem>> {
        let priorities = self.queue_priorities().await?;
        Ok(self.coordinator.queue_snapshot(&priorities).await)
    }

    pub async fn peek_queue(&self) -> Result<Option<WorkItem>> {
        let priorities = self.queue_priorities().await?;
        Ok(self.coordinator.queue_peek(&priorities).await)
    }

    pub async fn queue_len(&self) -> usize {
        self.coordinator.queue_len().await
    }

    pub async fn start_activation(
        &self,
        admin: OwnerId,
        phone: &PhoneNumber,
    ) -> Result<PendingActivation> {
        self.coordinator
            .start_activation(admin, phone, Utc::now())
            .await
    }

    pub async fn confirm(&self, user: OwnerId, phone: &PhoneNumber) -> Result<WorkingEntry> {
        let entry = self.coordinator.confirm(user, phone, Utc::now()).await?;
        self.referrals.touch(user, Utc::now()).await?;
        Ok(entry)
    }

    pub async fn skip(&self, user: OwnerId, phone: &PhoneNumber) -> Result<()> {
        self.coordinator.skip(user, phone).await?;
        self.referrals.touch(user, Utc::now()).await
    }

    pub async fn record_outcome(
        &self,
        admin: OwnerId,
        phone: &PhoneNumber,
        resolved_at: DateTime<Utc>,
        outcome: OutcomeKind,
    ) -> Result<Hold> {
        debug!(admin, %phone, ?outcome, "outcome submitted");
        self.coordinator
            .record_outcome(phone, resolved_at, outcome, self.settings.min_hold_minutes())
            .await
    }

    /// Outcome with the resolution time given as minutes after the number
    /// entered work.
    pub async fn record_outcome_after(
        &self,
        admin: OwnerId,
        phone: &PhoneNumber,
        minutes: i64,
        outcome: OutcomeKind,
    ) -> Result<Hold> {
        debug!(admin, %phone, ?outcome, minutes, "outcome submitted");
        self.coordinator
            .record_outcome_after(phone, minutes, outcome, self.settings.min_hold_minutes())
            .await
    }

    // ---- money ------------------------------------------------------------

    pub async fn run_payout(&self) -> Result<PayoutSummary> {
        self.payouts.run(Utc::now()).await
    }

    pub async fn transfer(&self, from: OwnerId, to: OwnerId, amount: Decimal) -> Result<()> {
        self.ledger.transfer(from, to, amount, Utc::now()).await?;
        self.referrals.touch(from, Utc::now()).await
    }

    pub async fn credit(&self, owner: OwnerId, amount: Decimal) -> Result<()> {
        self.ledger
            .credit(owner, Amount::new(amount)?, EntryKind::Deposit, Utc::now())
            .await
    }

    pub async fn debit(&self, owner: OwnerId, amount: Decimal) -> Result<()> {
        self.ledger
            .debit(owner, Amount::new(amount)?, EntryKind::Withdraw, Utc::now())
            .await
    }

    pub async fn activate_account(&self, owner: OwnerId) -> Result<()> {
        self.ledger.activate_account(owner).await
    }

    pub async fn block_account(&self, owner: OwnerId) -> Result<()> {
        self.ledger.block_account(owner, Utc::now()).await
    }

    pub async fn set_tier(&self, owner: OwnerId, tier: Option<Tier>) -> Result<()> {
        self.ledger.set_tier(owner, tier).await
    }

    pub async fn set_reputation(&self, owner: OwnerId, reputation: Decimal) -> Result<()> {
        self.ledger.set_reputation(owner, reputation).await
    }

    pub async fn request_withdraw(
        &self,
        owner: OwnerId,
        amount: Decimal,
    ) -> Result<WithdrawRequest> {
        self.ledger.request_withdraw(owner, amount).await
    }

    pub async fn approve_withdraw(&self, id: u64) -> Result<WithdrawRequest> {
        self.ledger.approve_withdraw(id).await
    }

    pub async fn close_withdraw(&self, id: u64) -> Result<WithdrawRequest> {
        self.ledger.close_withdraw(id).await
    }

    pub async fn pending_withdraws(&self) -> Vec<WithdrawRequest> {
        self.ledger.pending_withdraws().await
    }

    // ---- read side --------------------------------------------------------

    pub async fn account(&self, owner: OwnerId) -> Result<Option<Account>> {
        self.ledger.account(owner).await
    }

    pub async fn balances(&self) -> Result<Vec<Account>> {
        let mut accounts = self.ledger.all_accounts().await?;
        accounts.sort_by_key(|account| account.owner);
        Ok(accounts)
    }

    pub async fn entries_of(&self, owner: OwnerId) -> Result<Vec<LedgerEntry>> {
        self.ledger.entries_of(owner).await
    }

    pub async fn all_entries(&self) -> Result<Vec<LedgerEntry>> {
        self.ledger.all_entries().await
    }

    pub async fn transfers(&self) -> Result<Vec<TransferRecord>> {
        self.ledger.transfers().await
    }

    pub async fn queued_of(&self, owner: OwnerId) -> Vec<WorkItem> {
        self.coordinator.queued_of(owner).await
    }

    pub async fn working_of(&self, owner: OwnerId) -> Vec<WorkingEntry> {
        self.coordinator.working_of(owner).await
    }

    pub async fn holds_of(&self, owner: OwnerId) -> Vec<HoldRecord> {
        self.coordinator.holds_of(owner).await
    }

    pub async fn blocked_of(&self, owner: OwnerId) -> Vec<BlockedRecord> {
        self.coordinator.blocked_of(owner).await
    }

    /// How many of the live collections currently track `phone` (0 or 1).
    pub async fn occupancy(&self, phone: &PhoneNumber) -> usize {
        self.coordinator.occupancy(phone).await
    }

    async fn queue_priorities(&self) -> Result<HashMap<OwnerId, QueuePriority>> {
        let mut priorities = HashMap::new();
        for owner in self.coordinator.queue_owners().await {
            if priorities.contains_key(&owner) {
                continue;
            }
            if let Some(account) = self.ledger.account(owner).await? {
                priorities.insert(
                    owner,
                    QueuePriority {
                        tier_rank: pricing::rank(account.tier),
                        reputation: account.reputation,
                    },
                );
            }
        }
        Ok(priorities)
    }
}
