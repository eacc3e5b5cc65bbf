use crate::application::ledger::KeyedLocks;
use crate::config::SharedSettings;
use crate::domain::account::{Account, Amount, OwnerId};
use crate::domain::ports::{Notification, SharedAccountStore, SharedNotifier};
use crate::error::{PoolError, Result};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info};

/// Referral rewards and the inactivity sweep. Shares the ledger's per-owner
/// locks so referral-balance mutations serialize with everything else that
/// touches the same account.
pub struct ReferralProgram {
    accounts: SharedAccountStore,
    locks: Arc<KeyedLocks>,
    settings: SharedSettings,
    notifier: SharedNotifier,
}

impl ReferralProgram {
    pub fn new(
        accounts: SharedAccountStore,
        locks: Arc<KeyedLocks>,
        settings: SharedSettings,
        notifier: SharedNotifier,
    ) -> Self {
        Self {
            accounts,
            locks,
            settings,
            notifier,
        }
    }

    /// First contact for `owner`. When a valid referrer is given, the
    /// referrer earns the configured reward on the referral balance.
    /// Re-registering an existing owner only refreshes activity.
    pub async fn register(
        &self,
        owner: OwnerId,
        referred_by: Option<OwnerId>,
        now: DateTime<Utc>,
    ) -> Result<Account> {
        {
            let _guard = self.locks.acquire(owner).await;
            if let Some(mut existing) = self.accounts.get(owner).await? {
                existing.last_active = now;
                self.accounts.store(existing.clone()).await?;
                return Ok(existing);
            }
            let mut account = Account::open(owner, now);
            account.referred_by = referred_by.filter(|&referrer| referrer != owner);
            self.accounts.store(account).await?;
        }

        if let Some(referrer) = referred_by.filter(|&referrer| referrer != owner) {
            self.reward_referrer(referrer, owner).await?;
        }

        let account = self
            .accounts
            .get(owner)
            .await?
            .ok_or(PoolError::UnknownAccount(owner))?;
        info!(owner, referred_by = ?account.referred_by, "owner registered");
        Ok(account)
    }

    async fn reward_referrer(&self, referrer: OwnerId, referee: OwnerId) -> Result<()> {
        let reward = self.settings.referral_reward();
        let _guard = self.locks.acquire(referrer).await;
        let Some(mut account) = self.accounts.get(referrer).await? else {
            debug!(referrer, "referrer unknown, no reward");
            return Ok(());
        };
        if let Ok(amount) = Amount::new(reward) {
            account.credit_referral(amount);
        }
        account.referral_count += 1;
        self.accounts.store(account).await?;

        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            notifier
                .notify(
                    referrer,
                    Notification::ReferralReward {
                        referee,
                        amount: reward,
                    },
                )
                .await;
        });
        Ok(())
    }

    /// Marks the owner as active now.
    pub async fn touch(&self, owner: OwnerId, now: DateTime<Utc>) -> Result<()> {
        let _guard = self.locks.acquire(owner).await;
        if let Some(mut account) = self.accounts.get(owner).await? {
            account.last_active = now;
            self.accounts.store(account).await?;
        }
        Ok(())
    }

    /// For every owner idle past the configured threshold, their referrer
    /// forfeits one reward (clamped at zero) and one referral count. Locks
    /// one account at a time; the batch never holds a global lock.
    pub async fn inactivity_sweep(&self, now: DateTime<Utc>) -> Result<usize> {
        let threshold = now - Duration::days(self.settings.inactivity_days());
        let reward = self.settings.referral_reward();
        let mut forfeits = 0usize;

        for account in self.accounts.all().await? {
            if account.last_active >= threshold {
                continue;
            }
            let Some(referrer) = account.referred_by else {
                continue;
            };

            let _guard = self.locks.acquire(referrer).await;
            let Some(mut sponsor) = self.accounts.get(referrer).await? else {
                continue;
            };
            let forfeited = match Amount::new(reward) {
                Ok(amount) => sponsor.forfeit_referral(amount),
                Err(_) => Decimal::ZERO,
            };
            sponsor.referral_count = sponsor.referral_count.saturating_sub(1);
            self.accounts.store(sponsor).await?;
            forfeits += 1;

            debug!(referrer, referee = account.owner, %forfeited, "referral forfeited");
            let notifier = Arc::clone(&self.notifier);
            let referee = account.owner;
            tokio::spawn(async move {
                notifier
                    .notify(
                        referrer,
                        Notification::ReferralForfeit {
                            referee,
                            amount: forfeited,
                        },
                    )
                    .await;
            });
        }

        info!(forfeits, "inactivity sweep complete");
        Ok(forfeits)
    }
}
