use crate::application::payout::PayoutLine;
use crate::domain::account::{Account, AccountStatus};
use crate::domain::number::NumberKind;
use crate::domain::pricing::Tier;
use crate::error::Result;
use std::io::Write;

fn kind_label(kind: NumberKind) -> &'static str {
    match kind {
        NumberKind::International => "international",
        NumberKind::Local => "local",
    }
}

fn tier_label(tier: Option<Tier>) -> &'static str {
    match tier {
        None => "",
        Some(Tier::Bronze) => "bronze",
        Some(Tier::Silver) => "silver",
        Some(Tier::Gold) => "gold",
        Some(Tier::Platinum) => "platinum",
    }
}

fn status_label(status: AccountStatus) -> &'static str {
    match status {
        AccountStatus::Inactive => "inactive",
        AccountStatus::Active => "active",
        AccountStatus::Blocked => "blocked",
    }
}

/// Writes final account balances as CSV.
pub struct BalanceWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> BalanceWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_accounts(&mut self, accounts: &[Account]) -> Result<()> {
        self.writer
            .write_record(["owner", "card", "referral", "tier", "status"])?;
        for account in accounts {
            self.writer.write_record([
                account.owner.to_string().as_str(),
                account.card_balance.value().to_string().as_str(),
                account.referral_balance.value().to_string().as_str(),
                tier_label(account.tier),
                status_label(account.status),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

/// Writes the per-record lines of payout runs as CSV.
pub struct PayoutReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> PayoutReportWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_lines(&mut self, lines: &[PayoutLine]) -> Result<()> {
        self.writer
            .write_record(["owner", "phone", "kind", "hold", "amount"])?;
        for line in lines {
            self.writer.write_record([
                line.owner.to_string().as_str(),
                line.phone.as_str(),
                kind_label(line.kind),
                line.hold.as_str(),
                line.amount.to_string().as_str(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
