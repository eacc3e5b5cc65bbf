#![allow(dead_code)]

use numpool::application::engine::PoolEngine;
use numpool::config::Settings;
use numpool::domain::ports::{SharedAccountStore, SharedLedgerStore};
use numpool::infrastructure::in_memory::{InMemoryAccountStore, InMemoryLedgerStore};
use numpool::infrastructure::notify::RecordingNotifier;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

pub fn engine() -> PoolEngine {
    engine_with_notifier().0
}

pub fn engine_with_notifier() -> (PoolEngine, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let accounts: SharedAccountStore = Arc::new(InMemoryAccountStore::new());
    let history: SharedLedgerStore = Arc::new(InMemoryLedgerStore::new());
    let engine = PoolEngine::new(accounts, history, notifier.clone(), Settings::default());
    (engine, notifier)
}

pub const OPS_HEADER: [&str; 8] = ["op", "actor", "phone", "kind", "to", "amount", "minutes", "tier"];

/// Writes an operation-stream CSV for driving the binary.
pub fn write_ops(path: &Path, rows: &[[&str; 8]]) {
    let file = File::create(path).unwrap();
    let mut writer = csv::WriterBuilder::new().from_writer(file);
    writer.write_record(OPS_HEADER).unwrap();
    for row in rows {
        writer.write_record(row).unwrap();
    }
    writer.flush().unwrap();
}
