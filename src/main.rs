use clap::Parser;
use miette::{IntoDiagnostic, Result};
use numpool::application::engine::PoolEngine;
use numpool::application::payout::PayoutLine;
use numpool::config::Settings;
use numpool::domain::number::PhoneNumber;
use numpool::domain::ports::{SharedAccountStore, SharedLedgerStore, SharedNotifier};
use numpool::domain::work::OutcomeKind;
use numpool::error::PoolError;
use numpool::infrastructure::in_memory::{InMemoryAccountStore, InMemoryLedgerStore};
use numpool::infrastructure::notify::LogNotifier;
use numpool::interfaces::csv::command_reader::{CommandReader, CommandRow, Op};
use numpool::interfaces::csv::report_writer::{BalanceWriter, PayoutReportWriter};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input operations CSV file
    input: PathBuf,

    /// Write the per-record payout report produced by payout runs here.
    #[arg(long)]
    payout_report: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let accounts: SharedAccountStore = Arc::new(InMemoryAccountStore::new());
    let history: SharedLedgerStore = Arc::new(InMemoryLedgerStore::new());
    let notifier: SharedNotifier = Arc::new(LogNotifier);
    let engine = PoolEngine::new(accounts, history, notifier, Settings::default());

    let file = File::open(cli.input).into_diagnostic()?;
    let reader = CommandReader::new(file);
    let mut payout_lines: Vec<PayoutLine> = Vec::new();
    for row in reader.commands() {
        match row {
            Ok(row) => {
                if let Err(e) = apply(&engine, row, &mut payout_lines).await {
                    eprintln!("Error processing command: {}", e);
                }
            }
            Err(e) => {
                eprintln!("Error reading command: {}", e);
            }
        }
    }

    let balances = engine.balances().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = BalanceWriter::new(stdout.lock());
    writer.write_accounts(&balances).into_diagnostic()?;

    if let Some(path) = cli.payout_report {
        let report = File::create(path).into_diagnostic()?;
        let mut writer = PayoutReportWriter::new(report);
        writer.write_lines(&payout_lines).into_diagnostic()?;
    }

    Ok(())
}

fn require<T>(value: Option<T>, field: &str) -> std::result::Result<T, PoolError> {
    value.ok_or_else(|| PoolError::Validation(format!("missing {field} column")))
}

async fn apply(
    engine: &PoolEngine,
    row: CommandRow,
    payout_lines: &mut Vec<PayoutLine>,
) -> std::result::Result<(), PoolError> {
    let key = |phone: &Option<String>| -> std::result::Result<PhoneNumber, PoolError> {
        Ok(PhoneNumber::new_unchecked(require(
            phone.clone(),
            "phone",
        )?))
    };

    match row.op {
        Op::Register => {
            engine.register(require(row.actor, "actor")?, row.to).await?;
        }
        Op::Submit => {
            engine
                .submit(
                    require(row.actor, "actor")?,
                    &require(row.phone, "phone")?,
                    require(row.kind, "kind")?,
                )
                .await?;
        }
        Op::Cancel => {
            engine
                .cancel(require(row.actor, "actor")?, &key(&row.phone)?)
                .await?;
        }
        Op::Start => {
            engine
                .start_activation(require(row.actor, "actor")?, &key(&row.phone)?)
                .await?;
        }
        Op::Confirm => {
            engine
                .confirm(require(row.actor, "actor")?, &key(&row.phone)?)
                .await?;
        }
        Op::Skip => {
            engine
                .skip(require(row.actor, "actor")?, &key(&row.phone)?)
                .await?;
        }
        Op::Success => {
            engine
                .record_outcome_after(
                    require(row.actor, "actor")?,
                    &key(&row.phone)?,
                    require(row.minutes, "minutes")?,
                    OutcomeKind::Successful,
                )
                .await?;
        }
        Op::Block => {
            engine
                .record_outcome_after(
                    require(row.actor, "actor")?,
                    &key(&row.phone)?,
                    require(row.minutes, "minutes")?,
                    OutcomeKind::Blocked,
                )
                .await?;
        }
        Op::Credit => {
            engine
                .credit(require(row.actor, "actor")?, require(row.amount, "amount")?)
                .await?;
        }
        Op::Debit => {
            engine
                .debit(require(row.actor, "actor")?, require(row.amount, "amount")?)
                .await?;
        }
        Op::Transfer => {
            engine
                .transfer(
                    require(row.actor, "actor")?,
                    require(row.to, "to")?,
                    require(row.amount, "amount")?,
                )
                .await?;
        }
        Op::Activate => {
            engine.activate_account(require(row.actor, "actor")?).await?;
        }
        Op::BlockAccount => {
            engine.block_account(require(row.actor, "actor")?).await?;
        }
        Op::Tier => {
            engine.set_tier(require(row.actor, "actor")?, row.tier).await?;
        }
        Op::Payout => {
            let summary = engine.run_payout().await?;
            payout_lines.extend(summary.lines);
        }
        Op::SetMinHold => {
            engine
                .settings()
                .set_min_hold_minutes(require(row.minutes, "minutes")?);
        }
        Op::Sweep => {
            engine.inactivity_sweep().await?;
        }
    }
    Ok(())
}
