use crate::error::PoolError;
use chrono::{DateTime, Utc};

/// Result of assessing how long a number stayed in work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hold {
    /// Whether the duration reached the configured minimum.
    pub qualifies: bool,
    /// Elapsed whole minutes between acceptance and resolution.
    pub minutes: i64,
    /// `HH:MM`, always populated; only meaningful for payout when qualifying.
    pub text: String,
}

/// Computes the hold between acceptance and resolution. A resolution earlier
/// than the acceptance is a caller error and leaves no trace in any state.
pub fn assess(
    accepted_at: DateTime<Utc>,
    resolved_at: DateTime<Utc>,
    minimum_minutes: i64,
) -> Result<Hold, PoolError> {
    let minutes = (resolved_at - accepted_at).num_minutes();
    if minutes < 0 {
        return Err(PoolError::InvalidTimeRange);
    }
    Ok(Hold {
        qualifies: minutes >= minimum_minutes,
        minutes,
        text: format!("{:02}:{:02}", minutes / 60, minutes % 60),
    })
}
