use crate::domain::pricing::Tier;
use crate::error::PoolError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Sub, SubAssign};

pub type OwnerId = u64;

/// A monetary balance.
///
/// Wrapper around `rust_decimal::Decimal` to keep balances distinct from raw
/// numbers and confine arithmetic to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Balance(pub Decimal);

/// A strictly positive amount, the only currency of ledger operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, PoolError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(PoolError::InvalidAmount)
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = PoolError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl From<Amount> for Balance {
    fn from(amount: Amount) -> Self {
        Self(amount.0)
    }
}

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl Add for Balance {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Balance {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Balance {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Balance {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// Opened but not yet able to receive transfers.
    Inactive,
    Active,
    Blocked,
}

/// An owner's account: the card balance fed by payouts and transfers, the
/// referral balance fed by the referral program, and the profile fields the
/// queue ordering reads.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Account {
    pub owner: OwnerId,
    pub card_balance: Balance,
    pub referral_balance: Balance,
    /// Real-valued standing; higher sorts earlier in the queue.
    pub reputation: Decimal,
    pub tier: Option<Tier>,
    pub status: AccountStatus,
    pub last_active: DateTime<Utc>,
    pub referred_by: Option<OwnerId>,
    pub referral_count: u32,
}

impl Account {
    pub fn open(owner: OwnerId, now: DateTime<Utc>) -> Self {
        Self {
            owner,
            card_balance: Balance::ZERO,
            referral_balance: Balance::ZERO,
            reputation: Decimal::TEN,
            tier: None,
            status: AccountStatus::Inactive,
            last_active: now,
            referred_by: None,
            referral_count: 0,
        }
    }

    pub fn credit_card(&mut self, amount: Amount) {
        self.card_balance += amount.into();
    }

    pub fn debit_card(&mut self, amount: Amount) -> Result<(), PoolError> {
        if self.card_balance.value() < amount.value() {
            return Err(PoolError::InsufficientFunds {
                requested: amount.value(),
                available: self.card_balance.value(),
            });
        }
        self.card_balance -= amount.into();
        Ok(())
    }

    pub fn credit_referral(&mut self, amount: Amount) {
        self.referral_balance += amount.into();
    }

    pub fn debit_referral(&mut self, amount: Amount) -> Result<(), PoolError> {
        if self.referral_balance.value() < amount.value() {
            return Err(PoolError::InsufficientFunds {
                requested: amount.value(),
                available: self.referral_balance.value(),
            });
        }
        self.referral_balance -= amount.into();
        Ok(())
    }

    /// Deducts up to `amount` from the referral balance, clamping at zero.
    /// Returns what was actually forfeited.
    pub fn forfeit_referral(&mut self, amount: Amount) -> Decimal {
        let forfeited = self.referral_balance.value().min(amount.value());
        self.referral_balance -= Balance::new(forfeited);
        forfeited
    }

    pub fn activate(&mut self) {
        self.status = AccountStatus::Active;
    }

    /// Blocks the account and empties the card balance. Returns the balance
    /// that was seized so the caller can ledger it as a withdrawal.
    pub fn block(&mut self) -> Balance {
        let seized = self.card_balance;
        self.card_balance = Balance::ZERO;
        self.status = AccountStatus::Blocked;
        seized
    }

    pub fn can_receive(&self) -> bool {
        self.status == AccountStatus::Active
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Deposit,
    Withdraw,
    TransferIn,
    TransferOut,
}

/// One append-only row of card-balance history. `amount` is signed: credits
/// are positive, debits negative.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct LedgerEntry {
    pub owner: OwnerId,
    pub amount: Decimal,
    pub at: DateTime<Utc>,
    pub kind: EntryKind,
}

/// The pairing record behind a TransferOut/TransferIn entry pair.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct TransferRecord {
    pub from: OwnerId,
    pub to: OwnerId,
    pub amount: Decimal,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawStatus {
    Pending,
    Paid,
    Closed,
}

/// A referral-balance withdrawal awaiting admin review.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct WithdrawRequest {
    pub id: u64,
    pub owner: OwnerId,
    pub amount: Decimal,
    pub status: WithdrawStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn account() -> Account {
        Account::open(1, Utc::now())
    }

    #[test]
    fn test_amount_validation() {
        assert!(Amount::new(dec!(1.0)).is_ok());
        assert!(matches!(
            Amount::new(dec!(0.0)),
            Err(PoolError::InvalidAmount)
        ));
        assert!(matches!(
            Amount::new(dec!(-1.0)),
            Err(PoolError::InvalidAmount)
        ));
    }

    #[test]
    fn test_balance_arithmetic() {
        let b1 = Balance::new(dec!(10.0));
        let b2 = Balance::new(dec!(5.0));
        assert_eq!(b1 + b2, Balance::new(dec!(15.0)));
        assert_eq!(b1 - b2, Balance::new(dec!(5.0)));
    }

    #[test]
    fn test_card_debit_guard() {
        let mut account = account();
        account.credit_card(Amount::new(dec!(10.0)).unwrap());

        assert!(account.debit_card(Amount::new(dec!(4.0)).unwrap()).is_ok());
        assert_eq!(account.card_balance, Balance::new(dec!(6.0)));

        let result = account.debit_card(Amount::new(dec!(7.0)).unwrap());
        assert!(matches!(result, Err(PoolError::InsufficientFunds { .. })));
        assert_eq!(account.card_balance, Balance::new(dec!(6.0)));
    }

    #[test]
    fn test_forfeit_clamps_at_zero() {
        let mut account = account();
        account.credit_referral(Amount::new(dec!(0.3)).unwrap());

        let forfeited = account.forfeit_referral(Amount::new(dec!(0.5)).unwrap());
        assert_eq!(forfeited, dec!(0.3));
        assert_eq!(account.referral_balance, Balance::ZERO);
    }

    #[test]
    fn test_block_seizes_card_balance() {
        let mut account = account();
        account.activate();
        account.credit_card(Amount::new(dec!(25.0)).unwrap());

        let seized = account.block();
        assert_eq!(seized, Balance::new(dec!(25.0)));
        assert_eq!(account.card_balance, Balance::ZERO);
        assert_eq!(account.status, AccountStatus::Blocked);
        assert!(!account.can_receive());
    }

    #[test]
    fn test_new_account_cannot_receive() {
        assert!(!account().can_receive());
    }
}
