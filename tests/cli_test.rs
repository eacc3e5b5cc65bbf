mod common;

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn test_full_lifecycle_pays_out() {
    let dir = tempdir().unwrap();
    let ops = dir.path().join("ops.csv");
    common::write_ops(
        &ops,
        &[
            ["register", "1", "", "", "", "", "", ""],
            ["submit", "1", "9123456789", "local", "", "", "", ""],
            ["start", "99", "9123456789", "", "", "", "", ""],
            ["confirm", "1", "9123456789", "", "", "", "", ""],
            ["success", "99", "9123456789", "", "", "", "70", ""],
            ["payout", "", "", "", "", "", "", ""],
        ],
    );

    let mut cmd = Command::new(cargo_bin!("numpool"));
    cmd.arg(&ops);

    // 70 minutes at the base rate: 1 hour (2.0) + 2 half hours (1.6).
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("1,3.6,0,,inactive"));
}

#[test]
fn test_transfer_between_accounts() {
    let dir = tempdir().unwrap();
    let ops = dir.path().join("ops.csv");
    common::write_ops(
        &ops,
        &[
            ["register", "1", "", "", "", "", "", ""],
            ["register", "2", "", "", "", "", "", ""],
            ["credit", "1", "", "", "", "10.0", "", ""],
            ["activate", "2", "", "", "", "", "", ""],
            ["transfer", "1", "", "", "2", "4.0", "", ""],
        ],
    );

    let mut cmd = Command::new(cargo_bin!("numpool"));
    cmd.arg(&ops);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("1,6.0,0,,inactive"))
        .stdout(predicate::str::contains("2,4.0,0,,active"));
}

#[test]
fn test_payout_report_file() {
    let dir = tempdir().unwrap();
    let ops = dir.path().join("ops.csv");
    let report = dir.path().join("payouts.csv");
    common::write_ops(
        &ops,
        &[
            ["submit", "1", "9123456789", "local", "", "", "", ""],
            ["start", "99", "9123456789", "", "", "", "", ""],
            ["confirm", "1", "9123456789", "", "", "", "", ""],
            ["success", "99", "9123456789", "", "", "", "70", ""],
            ["payout", "", "", "", "", "", "", ""],
        ],
    );

    let mut cmd = Command::new(cargo_bin!("numpool"));
    cmd.arg(&ops).arg("--payout-report").arg(&report);
    cmd.assert().success();

    let report = std::fs::read_to_string(&report).unwrap();
    assert!(report.starts_with("owner,phone,kind,hold,amount\n"));
    assert!(report.contains("1,9123456789,local,01:10,3.6"));
}

#[test]
fn test_runtime_minimum_hold_update() {
    let dir = tempdir().unwrap();
    let ops = dir.path().join("ops.csv");
    common::write_ops(
        &ops,
        &[
            ["submit", "1", "9123456789", "local", "", "", "", ""],
            ["start", "99", "9123456789", "", "", "", "", ""],
            ["confirm", "1", "9123456789", "", "", "", "", ""],
            ["set_min_hold", "", "", "", "", "", "30", ""],
            ["success", "99", "9123456789", "", "", "", "40", ""],
            ["payout", "", "", "", "", "", "", ""],
        ],
    );

    let mut cmd = Command::new(cargo_bin!("numpool"));
    cmd.arg(&ops);

    // 40 minutes at the base rate: no full hour, one half hour.
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("1,0.8,0,,inactive"));
}

#[test]
fn test_tier_changes_payout_rate() {
    let dir = tempdir().unwrap();
    let ops = dir.path().join("ops.csv");
    common::write_ops(
        &ops,
        &[
            ["register", "1", "", "", "", "", "", ""],
            ["tier", "1", "", "", "", "", "", "platinum"],
            ["submit", "1", "9123456789", "local", "", "", "", ""],
            ["start", "99", "9123456789", "", "", "", "", ""],
            ["confirm", "1", "9123456789", "", "", "", "", ""],
            ["success", "99", "9123456789", "", "", "", "60", ""],
            ["payout", "", "", "", "", "", "", ""],
        ],
    );

    let mut cmd = Command::new(cargo_bin!("numpool"));
    cmd.arg(&ops);

    // 60 minutes at platinum: 1 hour (15.0) + 2 half hours (12.0).
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("1,27.0,0,platinum,inactive"));
}
