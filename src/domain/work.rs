use crate::domain::account::OwnerId;
use crate::domain::number::{NumberKind, PhoneNumber};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A number waiting in the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub phone: PhoneNumber,
    pub owner: OwnerId,
    pub kind: NumberKind,
    pub submitted_at: DateTime<Utc>,
}

/// A number whose owner has been prompted to enter an activation code.
/// `token` tags the expiry timer armed for this pending; a timer whose token
/// no longer matches finds the activation already resolved and does nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingActivation {
    pub phone: PhoneNumber,
    pub owner: OwnerId,
    pub admin: OwnerId,
    pub kind: NumberKind,
    pub started_at: DateTime<Utc>,
    pub token: u64,
}

/// A number in work, accruing hold time since `started_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingEntry {
    pub phone: PhoneNumber,
    pub owner: OwnerId,
    pub admin: OwnerId,
    pub kind: NumberKind,
    pub started_at: DateTime<Utc>,
}

/// A resolved number whose hold met the minimum. Drained by payout runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoldRecord {
    pub owner: OwnerId,
    pub phone: PhoneNumber,
    pub kind: NumberKind,
    /// `HH:MM` as computed at resolution time; later minimum changes do not
    /// reclassify this record.
    pub hold: String,
    pub minutes: i64,
    pub accepted_at: DateTime<Utc>,
    pub resolved_at: DateTime<Utc>,
}

/// A resolved number that ended blocked. Informational only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockedRecord {
    pub owner: OwnerId,
    pub phone: PhoneNumber,
    pub kind: NumberKind,
}

/// Admin classification of a working number's end.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    Successful,
    Blocked,
}
