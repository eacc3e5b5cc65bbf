use crate::domain::number::NumberKind;
use crate::domain::pricing::Tier;
use crate::error::{PoolError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum Op {
    Register,
    Submit,
    Cancel,
    Start,
    Confirm,
    Skip,
    Success,
    Block,
    Credit,
    Debit,
    Transfer,
    Activate,
    BlockAccount,
    Tier,
    Payout,
    SetMinHold,
    Sweep,
}

/// One operation of a replayed stream. Which columns are required depends on
/// the op; the dispatcher rejects rows with missing fields before any state
/// is touched.
#[derive(Debug, Deserialize, Clone)]
pub struct CommandRow {
    pub op: Op,
    pub actor: Option<u64>,
    pub phone: Option<String>,
    pub kind: Option<NumberKind>,
    pub to: Option<u64>,
    pub amount: Option<Decimal>,
    pub minutes: Option<i64>,
    pub tier: Option<Tier>,
}

/// Reads operations from a CSV source.
///
/// Wraps `csv::Reader` and yields `Result<CommandRow>`, trimming whitespace
/// and tolerating flexible record lengths.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily reads and deserializes operations, so large streams never load
    /// into memory at once.
    pub fn commands(self) -> impl Iterator<Item = Result<CommandRow>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(PoolError::from))
    }
}
