use crate::application::coordinator::ActivationCoordinator;
use crate::application::ledger::Ledger;
use crate::config::SharedSettings;
use crate::domain::account::{Amount, EntryKind, OwnerId};
use crate::domain::number::{NumberKind, PhoneNumber};
use crate::domain::ports::{Notification, SharedNotifier};
use crate::error::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// One payable line of a payout run.
#[derive(Debug, Clone, PartialEq)]
pub struct PayoutLine {
    pub owner: OwnerId,
    pub phone: PhoneNumber,
    pub kind: NumberKind,
    pub hold: String,
    pub amount: Decimal,
}

/// What a payout run computed and credited.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PayoutSummary {
    pub lines: Vec<PayoutLine>,
    pub totals: BTreeMap<OwnerId, Decimal>,
}

impl PayoutSummary {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Converts accumulated hold records into card credits. Runs are serialized:
/// each record is drained from the coordinator exactly once, so concurrent
/// invocations cannot pay the same hold twice.
pub struct PayoutEngine {
    coordinator: Arc<ActivationCoordinator>,
    ledger: Arc<Ledger>,
    settings: SharedSettings,
    notifier: SharedNotifier,
    gate: Mutex<()>,
}

impl PayoutEngine {
    pub fn new(
        coordinator: Arc<ActivationCoordinator>,
        ledger: Arc<Ledger>,
        settings: SharedSettings,
        notifier: SharedNotifier,
    ) -> Self {
        Self {
            coordinator,
            ledger,
            settings,
            notifier,
            gate: Mutex::new(()),
        }
    }

    /// Prices every drained hold record at the owner's tier as of now,
    /// aggregates per owner, and credits each owner once. An empty record set
    /// yields an empty summary and touches nothing.
    ///
    /// A record is worth one `per_hour` unit per full hour of hold plus one
    /// `per_half_hour` unit per full half hour of the total duration.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<PayoutSummary> {
        let _gate = self.gate.lock().await;
        let records = self.coordinator.drain_holds().await;
        if records.is_empty() {
            return Ok(PayoutSummary::default());
        }

        let mut summary = PayoutSummary::default();
        for record in records {
            let tier = self
                .ledger
                .account(record.owner)
                .await?
                .and_then(|account| account.tier);
            let rate = self.settings.rate(tier);
            let hours = record.minutes / 60;
            let half_hours = record.minutes / 30;
            let amount = Decimal::from(hours) * rate.per_hour
                + Decimal::from(half_hours) * rate.per_half_hour;
            *summary.totals.entry(record.owner).or_default() += amount;
            summary.lines.push(PayoutLine {
                owner: record.owner,
                phone: record.phone,
                kind: record.kind,
                hold: record.hold,
                amount,
            });
        }

        for (&owner, &total) in &summary.totals {
            if total <= Decimal::ZERO {
                continue;
            }
            self.ledger
                .credit(owner, Amount::new(total)?, EntryKind::Deposit, now)
                .await?;
            let notifier = Arc::clone(&self.notifier);
            tokio::spawn(async move {
                notifier
                    .notify(owner, Notification::PayoutArrived { amount: total })
                    .await;
            });
        }

        info!(
            lines = summary.lines.len(),
            owners = summary.totals.len(),
            "payout run complete"
        );
        Ok(summary)
    }
}
