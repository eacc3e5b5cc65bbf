use crate::domain::account::OwnerId;
use crate::domain::number::PhoneNumber;
use crate::domain::work::WorkItem;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Ordering inputs for one owner, read from the account profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueuePriority {
    pub tier_rank: u8,
    pub reputation: Decimal,
}

/// The pending-number queue. Items are kept in insertion order; priority is
/// applied on read with a stable sort, so equal-priority items keep their
/// submission order.
#[derive(Debug, Default)]
pub struct WorkQueue {
    items: Vec<WorkItem>,
}

impl WorkQueue {
    pub fn contains(&self, phone: &PhoneNumber) -> bool {
        self.items.iter().any(|item| &item.phone == phone)
    }

    /// Caller is responsible for the cross-collection uniqueness check.
    pub fn push(&mut self, item: WorkItem) {
        self.items.push(item);
    }

    pub fn remove(&mut self, phone: &PhoneNumber) -> Option<WorkItem> {
        let index = self.items.iter().position(|item| &item.phone == phone)?;
        Some(self.items.remove(index))
    }

    /// Owner-initiated removal; only succeeds for the submitting owner.
    pub fn cancel(&mut self, owner: OwnerId, phone: &PhoneNumber) -> Option<WorkItem> {
        let index = self
            .items
            .iter()
            .position(|item| &item.phone == phone && item.owner == owner)?;
        Some(self.items.remove(index))
    }

    /// Full listing in priority order: tier rank descending, reputation
    /// descending, submission time ascending.
    pub fn ordered(&self, priorities: &HashMap<OwnerId, QueuePriority>) -> Vec<WorkItem> {
        let mut items = self.items.clone();
        items.sort_by(|a, b| {
            let pa = priorities.get(&a.owner).copied().unwrap_or_default();
            let pb = priorities.get(&b.owner).copied().unwrap_or_default();
            pb.tier_rank
                .cmp(&pa.tier_rank)
                .then(pb.reputation.cmp(&pa.reputation))
                .then(a.submitted_at.cmp(&b.submitted_at))
        });
        items
    }

    pub fn peek(&self, priorities: &HashMap<OwnerId, QueuePriority>) -> Option<WorkItem> {
        self.ordered(priorities).into_iter().next()
    }

    pub fn of_owner(&self, owner: OwnerId) -> Vec<WorkItem> {
        self.items
            .iter()
            .filter(|item| item.owner == owner)
            .cloned()
            .collect()
    }

    pub fn owners(&self) -> Vec<OwnerId> {
        self.items.iter().map(|item| item.owner).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
