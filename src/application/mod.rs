//! Application services orchestrating the domain: the queue, the activation
//! state machine, the ledger, payouts, referrals, and the `PoolEngine`
//! facade the external layers talk to.

pub mod coordinator;
pub mod engine;
pub mod ledger;
pub mod payout;
pub mod queue;
pub mod referral;
