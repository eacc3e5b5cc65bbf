use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Subscription tiers, in strictly increasing order of queue priority and
/// payout rate. `Option<Tier>` is used everywhere a subscription may be
/// absent; no subscription ranks below every tier.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Bronze, Tier::Silver, Tier::Gold, Tier::Platinum];
}

/// Queue priority rank for an optional subscription.
pub fn rank(tier: Option<Tier>) -> u8 {
    match tier {
        None => 0,
        Some(Tier::Bronze) => 1,
        Some(Tier::Silver) => 2,
        Some(Tier::Gold) => 3,
        Some(Tier::Platinum) => 4,
    }
}

/// A payout rate pair: per full hour of hold, and per started half hour of
/// the remainder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    pub per_hour: Decimal,
    pub per_half_hour: Decimal,
}

/// Maps a subscription to its payout rate. Pure lookup; the table itself is
/// runtime-mutable through [`crate::config::SharedSettings`].
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    base: Rate,
    bronze: Rate,
    silver: Rate,
    gold: Rate,
    platinum: Rate,
}

impl Default for PriceTable {
    fn default() -> Self {
        Self {
            base: Rate {
                per_hour: dec!(2.0),
                per_half_hour: dec!(0.8),
            },
            bronze: Rate {
                per_hour: dec!(6.4),
                per_half_hour: dec!(2.5),
            },
            silver: Rate {
                per_hour: dec!(7.0),
                per_half_hour: dec!(3.0),
            },
            gold: Rate {
                per_hour: dec!(9.0),
                per_half_hour: dec!(4.0),
            },
            platinum: Rate {
                per_hour: dec!(15.0),
                per_half_hour: dec!(6.0),
            },
        }
    }
}

impl PriceTable {
    pub fn rate(&self, tier: Option<Tier>) -> Rate {
        match tier {
            None => self.base,
            Some(Tier::Bronze) => self.bronze,
            Some(Tier::Silver) => self.silver,
            Some(Tier::Gold) => self.gold,
            Some(Tier::Platinum) => self.platinum,
        }
    }

    pub fn set_rate(&mut self, tier: Option<Tier>, rate: Rate) {
        match tier {
            None => self.base = rate,
            Some(Tier::Bronze) => self.bronze = rate,
            Some(Tier::Silver) => self.silver = rate,
            Some(Tier::Gold) => self.gold = rate,
            Some(Tier::Platinum) => self.platinum = rate,
        }
    }
}
