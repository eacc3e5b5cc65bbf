use crate::domain::pricing::{PriceTable, Rate, Tier};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// Runtime-tunable knobs, gathered in one place instead of ambient process
/// state. Changes apply to future computations only; nothing recorded earlier
/// is reclassified.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Minimum hold, in minutes, for an outcome to qualify as successful.
    pub min_hold_minutes: i64,
    /// How long an owner has to confirm or skip an activation prompt.
    pub activation_window: Duration,
    /// Referral-balance reward for bringing in a new owner.
    pub referral_reward: Decimal,
    /// Days without activity before referrers forfeit a reward.
    pub inactivity_days: i64,
    pub prices: PriceTable,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            min_hold_minutes: 54,
            activation_window: Duration::from_secs(120),
            referral_reward: dec!(0.5),
            inactivity_days: 7,
            prices: PriceTable::default(),
        }
    }
}

/// Shared handle to [`Settings`]. Reads are cheap and synchronous; the lock
/// is never held across an await point.
#[derive(Debug, Clone, Default)]
pub struct SharedSettings(Arc<RwLock<Settings>>);

impl SharedSettings {
    pub fn new(settings: Settings) -> Self {
        Self(Arc::new(RwLock::new(settings)))
    }

    pub fn min_hold_minutes(&self) -> i64 {
        self.read().min_hold_minutes
    }

    pub fn activation_window(&self) -> Duration {
        self.read().activation_window
    }

    pub fn referral_reward(&self) -> Decimal {
        self.read().referral_reward
    }

    pub fn inactivity_days(&self) -> i64 {
        self.read().inactivity_days
    }

    pub fn rate(&self, tier: Option<Tier>) -> Rate {
        self.read().prices.rate(tier)
    }

    pub fn set_min_hold_minutes(&self, minutes: i64) {
        self.write().min_hold_minutes = minutes;
    }

    pub fn set_activation_window(&self, window: Duration) {
        self.write().activation_window = window;
    }

    pub fn set_referral_reward(&self, reward: Decimal) {
        self.write().referral_reward = reward;
    }

    pub fn set_inactivity_days(&self, days: i64) {
        self.write().inactivity_days = days;
    }

    pub fn set_rate(&self, tier: Option<Tier>, rate: Rate) {
        self.write().prices.set_rate(tier, rate);
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Settings> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Settings> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = SharedSettings::default();
        assert_eq!(settings.min_hold_minutes(), 54);
        assert_eq!(settings.activation_window(), Duration::from_secs(120));
    }

    #[test]
    fn test_runtime_updates_are_visible() {
        let settings = SharedSettings::default();
        let handle = settings.clone();

        handle.set_min_hold_minutes(30);
        assert_eq!(settings.min_hold_minutes(), 30);

        let rate = Rate {
            per_hour: dec!(3.0),
            per_half_hour: dec!(1.0),
        };
        handle.set_rate(None, rate);
        assert_eq!(settings.rate(None), rate);
    }
}
