use thiserror::Error;

pub type Result<T> = std::result::Result<T, PoolError>;

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("number {0} is already tracked")]
    DuplicateKey(String),
    #[error("number {0} is not in the queue")]
    NotInQueue(String),
    #[error("number {0} is not in work")]
    NotWorking(String),
    /// Expected whenever a user action races the expiry timer or another
    /// resolution of the same pending activation.
    #[error("activation window for {0} already closed")]
    ActivationExpired(String),
    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds {
        requested: rust_decimal::Decimal,
        available: rust_decimal::Decimal,
    },
    #[error("amount must be positive")]
    InvalidAmount,
    #[error("account {0} does not exist or cannot receive funds")]
    UnknownAccount(u64),
    #[error("resolution time precedes acceptance time")]
    InvalidTimeRange,
    #[error("validation error: {0}")]
    Validation(String),
    #[error("storage error: {0}")]
    Store(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
