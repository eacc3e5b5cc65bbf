use crate::application::queue::{QueuePriority, WorkQueue};
use crate::config::SharedSettings;
use crate::domain::account::OwnerId;
use crate::domain::hold::{self, Hold};
use crate::domain::number::{NumberKind, PhoneNumber};
use crate::domain::ports::{Notification, SharedNotifier};
use crate::domain::work::{
    BlockedRecord, HoldRecord, OutcomeKind, PendingActivation, WorkItem, WorkingEntry,
};
use crate::error::{PoolError, Result};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info};

#[derive(Default)]
struct WorkState {
    queue: WorkQueue,
    pending: HashMap<PhoneNumber, PendingActivation>,
    working: HashMap<PhoneNumber, WorkingEntry>,
    holds: Vec<HoldRecord>,
    blocked: Vec<BlockedRecord>,
}

/// The activation state machine. A number moves queue → pending → working →
/// hold/blocked; expiry and skip drop it entirely. All three live collections
/// sit behind one mutex so the uniqueness check sees a consistent view; the
/// lock is held only for map operations, never across timer arming, store
/// calls, or notification delivery.
pub struct ActivationCoordinator {
    state: Arc<Mutex<WorkState>>,
    notifier: SharedNotifier,
    settings: SharedSettings,
    next_token: AtomicU64,
}

impl ActivationCoordinator {
    pub fn new(settings: SharedSettings, notifier: SharedNotifier) -> Self {
        Self {
            state: Arc::new(Mutex::new(WorkState::default())),
            notifier,
            settings,
            next_token: AtomicU64::new(1),
        }
    }

    /// Adds a number to the queue. The number must not be tracked anywhere:
    /// queued, pending, or in work.
    pub async fn submit(
        &self,
        owner: OwnerId,
        phone: PhoneNumber,
        kind: NumberKind,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.queue.contains(&phone)
            || state.pending.contains_key(&phone)
            || state.working.contains_key(&phone)
        {
            return Err(PoolError::DuplicateKey(phone.to_string()));
        }
        state.queue.push(WorkItem {
            phone: phone.clone(),
            owner,
            kind,
            submitted_at: now,
        });
        info!(%phone, owner, "number queued");
        Ok(())
    }

    /// Owner-initiated removal of a still-queued number.
    pub async fn cancel(&self, owner: OwnerId, phone: &PhoneNumber) -> Result<()> {
        let mut state = self.state.lock().await;
        state
            .queue
            .cancel(owner, phone)
            .ok_or_else(|| PoolError::NotInQueue(phone.to_string()))?;
        info!(%phone, owner, "number cancelled");
        Ok(())
    }

    /// Pulls a queued number into a pending activation and arms its expiry
    /// timer. The admin has already sent the activation code through the UI.
    pub async fn start_activation(
        &self,
        admin: OwnerId,
        phone: &PhoneNumber,
        now: DateTime<Utc>,
    ) -> Result<PendingActivation> {
        let window = self.settings.activation_window();
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);

        let pending = {
            let mut state = self.state.lock().await;
            let item = state
                .queue
                .remove(phone)
                .ok_or_else(|| PoolError::NotInQueue(phone.to_string()))?;
            let pending = PendingActivation {
                phone: item.phone,
                owner: item.owner,
                admin,
                kind: item.kind,
                started_at: now,
                token,
            };
            state.pending.insert(phone.clone(), pending.clone());
            pending
        };

        self.arm_expiry(phone.clone(), token, window);
        info!(%phone, admin, "activation started");
        Ok(pending)
    }

    fn arm_expiry(&self, phone: PhoneNumber, token: u64, window: std::time::Duration) {
        let state = Arc::clone(&self.state);
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            // Compare-and-clear: only the pending this timer was armed for
            // may be expired. Anything else means it was already resolved.
            let expired = {
                let mut state = state.lock().await;
                match state.pending.get(&phone) {
                    Some(pending) if pending.token == token => state.pending.remove(&phone),
                    _ => None,
                }
            };
            if let Some(pending) = expired {
                info!(%phone, owner = pending.owner, "activation window elapsed");
                notifier
                    .notify(
                        pending.owner,
                        Notification::ActivationExpired {
                            phone: pending.phone,
                        },
                    )
                    .await;
            }
        });
    }

    /// The owner confirmed the activation code: the number goes to work and
    /// starts accruing hold time from `now`.
    pub async fn confirm(
        &self,
        user: OwnerId,
        phone: &PhoneNumber,
        now: DateTime<Utc>,
    ) -> Result<WorkingEntry> {
        let (entry, admin) = {
            let mut state = self.state.lock().await;
            let pending = self.take_pending(&mut state, user, phone)?;
            let entry = WorkingEntry {
                phone: pending.phone,
                owner: pending.owner,
                admin: pending.admin,
                kind: pending.kind,
                started_at: now,
            };
            state.working.insert(phone.clone(), entry.clone());
            (entry, pending.admin)
        };
        info!(%phone, owner = user, "code entered, number in work");
        self.send(
            admin,
            Notification::CodeEntered {
                phone: phone.clone(),
                by: user,
            },
        );
        Ok(entry)
    }

    /// The owner rejected the activation. The number is discarded, not
    /// requeued.
    pub async fn skip(&self, user: OwnerId, phone: &PhoneNumber) -> Result<()> {
        let admin = {
            let mut state = self.state.lock().await;
            self.take_pending(&mut state, user, phone)?.admin
        };
        info!(%phone, owner = user, "activation skipped");
        self.send(
            admin,
            Notification::ActivationSkipped {
                phone: phone.clone(),
                by: user,
            },
        );
        Ok(())
    }

    /// Removes the live pending for `phone`, enforcing ownership. A missing
    /// pending means the window expired or another resolution won the race.
    fn take_pending(
        &self,
        state: &mut WorkState,
        user: OwnerId,
        phone: &PhoneNumber,
    ) -> Result<PendingActivation> {
        match state.pending.get(phone) {
            None => Err(PoolError::ActivationExpired(phone.to_string())),
            Some(pending) if pending.owner != user => Err(PoolError::Validation(format!(
                "number {phone} belongs to another owner"
            ))),
            Some(_) => {
                debug!(%phone, "pending activation resolved");
                state
                    .pending
                    .remove(phone)
                    .ok_or_else(|| PoolError::ActivationExpired(phone.to_string()))
            }
        }
    }

    /// Records the admin's classification of a working number. A successful
    /// classification is only accepted when the hold meets the minimum; a
    /// blocked classification is always accepted, including for qualifying
    /// holds.
    pub async fn record_outcome(
        &self,
        phone: &PhoneNumber,
        resolved_at: DateTime<Utc>,
        outcome: OutcomeKind,
        minimum_minutes: i64,
    ) -> Result<Hold> {
        let (owner, hold) = {
            let mut state = self.state.lock().await;
            let entry = state
                .working
                .get(phone)
                .ok_or_else(|| PoolError::NotWorking(phone.to_string()))?;
            let hold = hold::assess(entry.started_at, resolved_at, minimum_minutes)?;
            if outcome == OutcomeKind::Successful && !hold.qualifies {
                return Err(PoolError::Validation(format!(
                    "hold {} is below the {minimum_minutes} minute minimum",
                    hold.text
                )));
            }
            let Some(entry) = state.working.remove(phone) else {
                return Err(PoolError::NotWorking(phone.to_string()));
            };
            let owner = entry.owner;
            match outcome {
                OutcomeKind::Successful => state.holds.push(HoldRecord {
                    owner,
                    phone: entry.phone,
                    kind: entry.kind,
                    hold: hold.text.clone(),
                    minutes: hold.minutes,
                    accepted_at: entry.started_at,
                    resolved_at,
                }),
                OutcomeKind::Blocked => state.blocked.push(BlockedRecord {
                    owner,
                    phone: entry.phone,
                    kind: entry.kind,
                }),
            }
            (owner, hold)
        };
        info!(%phone, owner, ?outcome, hold = %hold.text, "outcome recorded");
        let event = match outcome {
            OutcomeKind::Successful => Notification::HoldRecorded {
                phone: phone.clone(),
                hold: hold.text.clone(),
            },
            OutcomeKind::Blocked => Notification::NumberBlocked {
                phone: phone.clone(),
            },
        };
        self.send(owner, event);
        Ok(hold)
    }

    /// Like [`Self::record_outcome`], with the resolution time given as an
    /// offset from when the number entered work.
    pub async fn record_outcome_after(
        &self,
        phone: &PhoneNumber,
        minutes: i64,
        outcome: OutcomeKind,
        minimum_minutes: i64,
    ) -> Result<Hold> {
        let resolved_at = {
            let state = self.state.lock().await;
            let entry = state
                .working
                .get(phone)
                .ok_or_else(|| PoolError::NotWorking(phone.to_string()))?;
            entry.started_at + Duration::minutes(minutes)
        };
        self.record_outcome(phone, resolved_at, outcome, minimum_minutes)
            .await
    }

    /// Hands the accumulated hold records to a payout run and clears them.
    pub async fn drain_holds(&self) -> Vec<HoldRecord> {
        let mut state = self.state.lock().await;
        std::mem::take(&mut state.holds)
    }

    pub async fn queue_snapshot(
        &self,
        priorities: &HashMap<OwnerId, QueuePriority>,
    ) -> Vec<WorkItem> {
        self.state.lock().await.queue.ordered(priorities)
    }

    pub async fn queue_peek(
        &self,
        priorities: &HashMap<OwnerId, QueuePriority>,
    ) -> Option<WorkItem> {
        self.state.lock().await.queue.peek(priorities)
    }

    pub async fn queue_owners(&self) -> Vec<OwnerId> {
        self.state.lock().await.queue.owners()
    }

    pub async fn queue_len(&self) -> usize {
        self.state.lock().await.queue.len()
    }

    pub async fn queued_of(&self, owner: OwnerId) -> Vec<WorkItem> {
        self.state.lock().await.queue.of_owner(owner)
    }

    pub async fn working_of(&self, owner: OwnerId) -> Vec<WorkingEntry> {
        let state = self.state.lock().await;
        state
            .working
            .values()
            .filter(|entry| entry.owner == owner)
            .cloned()
            .collect()
    }

    pub async fn holds_of(&self, owner: OwnerId) -> Vec<HoldRecord> {
        let state = self.state.lock().await;
        state
            .holds
            .iter()
            .filter(|record| record.owner == owner)
            .cloned()
            .collect()
    }

    pub async fn blocked_of(&self, owner: OwnerId) -> Vec<BlockedRecord> {
        let state = self.state.lock().await;
        state
            .blocked
            .iter()
            .filter(|record| record.owner == owner)
            .cloned()
            .collect()
    }

    /// Number of live collections currently holding `phone`. By the
    /// uniqueness invariant this is 0 or 1.
    pub async fn occupancy(&self, phone: &PhoneNumber) -> usize {
        let state = self.state.lock().await;
        usize::from(state.queue.contains(phone))
            + usize::from(state.pending.contains_key(phone))
            + usize::from(state.working.contains_key(phone))
    }

    fn send(&self, recipient: OwnerId, event: Notification) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            notifier.notify(recipient, event).await;
        });
    }
}
