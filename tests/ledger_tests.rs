mod common;

use numpool::domain::account::EntryKind;
use numpool::error::PoolError;
use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

#[tokio::test]
async fn test_transfers_conserve_value() {
    let engine = Arc::new(common::engine());
    for owner in 1..=4u64 {
        engine.register(owner, None).await.unwrap();
        engine.activate_account(owner).await.unwrap();
        engine.credit(owner, dec!(100.0)).await.unwrap();
    }

    let mut handles = Vec::new();
    for i in 0..40u64 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            let from = i % 4 + 1;
            let to = (i + 1) % 4 + 1;
            // Insufficient funds is an acceptable outcome under contention.
            let _ = engine.transfer(from, to, dec!(7.5)).await;
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let balances: Decimal = engine
        .balances()
        .await
        .unwrap()
        .iter()
        .map(|account| account.card_balance.value())
        .sum();
    let deposits_less_withdrawals: Decimal = engine
        .all_entries()
        .await
        .unwrap()
        .iter()
        .filter(|entry| matches!(entry.kind, EntryKind::Deposit | EntryKind::Withdraw))
        .map(|entry| entry.amount)
        .sum();

    // Transfers moved money around but created and destroyed none.
    assert_eq!(balances, dec!(400.0));
    assert_eq!(balances, deposits_less_withdrawals);
}

#[tokio::test]
async fn test_opposite_direction_transfers_do_not_deadlock() {
    let engine = Arc::new(common::engine());
    for owner in [1u64, 2] {
        engine.register(owner, None).await.unwrap();
        engine.activate_account(owner).await.unwrap();
        engine.credit(owner, dec!(50.0)).await.unwrap();
    }

    let forward = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            for _ in 0..25 {
                engine.transfer(1, 2, dec!(1.0)).await.unwrap();
            }
        })
    };
    let backward = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            for _ in 0..25 {
                engine.transfer(2, 1, dec!(1.0)).await.unwrap();
            }
        })
    };
    forward.await.unwrap();
    backward.await.unwrap();

    let balances = engine.balances().await.unwrap();
    let total: Decimal = balances
        .iter()
        .map(|account| account.card_balance.value())
        .sum();
    assert_eq!(total, dec!(100.0));
}

#[tokio::test]
async fn test_random_operations_never_overdraw() {
    let engine = common::engine();
    for owner in 1..=3u64 {
        engine.register(owner, None).await.unwrap();
        engine.activate_account(owner).await.unwrap();
    }

    let mut rng = rand::thread_rng();
    for _ in 0..200 {
        let owner = rng.gen_range(1..=3u64);
        let amount = Decimal::from(rng.gen_range(1..=20u32));
        match rng.gen_range(0..3) {
            0 => engine.credit(owner, amount).await.unwrap(),
            1 => {
                let result = engine.debit(owner, amount).await;
                if let Err(error) = result {
                    assert!(matches!(error, PoolError::InsufficientFunds { .. }));
                }
            }
            _ => {
                let to = rng.gen_range(1..=3u64);
                let result = engine.transfer(owner, to, amount).await;
                if let Err(error) = result {
                    assert!(matches!(error, PoolError::InsufficientFunds { .. }));
                }
            }
        }
    }

    for account in engine.balances().await.unwrap() {
        assert!(account.card_balance.value() >= Decimal::ZERO);
        // Balance always equals the signed sum of the owner's history.
        let signed: Decimal = engine
            .entries_of(account.owner)
            .await
            .unwrap()
            .iter()
            .map(|entry| entry.amount)
            .sum();
        assert_eq!(account.card_balance.value(), signed);
    }
}

#[tokio::test]
async fn test_transfer_rejects_ineligible_destination() {
    let engine = common::engine();
    engine.register(1, None).await.unwrap();
    engine.credit(1, dec!(10.0)).await.unwrap();
    engine.register(2, None).await.unwrap();

    // Destination never activated.
    assert!(matches!(
        engine.transfer(1, 2, dec!(1.0)).await,
        Err(PoolError::UnknownAccount(2))
    ));

    // Destination blocked.
    engine.activate_account(2).await.unwrap();
    engine.block_account(2).await.unwrap();
    assert!(matches!(
        engine.transfer(1, 2, dec!(1.0)).await,
        Err(PoolError::UnknownAccount(2))
    ));

    // Nothing moved, nothing recorded.
    let account = engine.account(1).await.unwrap().unwrap();
    assert_eq!(account.card_balance.value(), dec!(10.0));
    assert!(engine.transfers().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_self_transfer_allowed_with_both_rows() {
    let engine = common::engine();
    engine.register(1, None).await.unwrap();
    engine.credit(1, dec!(10.0)).await.unwrap();

    engine.transfer(1, 1, dec!(4.0)).await.unwrap();

    let account = engine.account(1).await.unwrap().unwrap();
    assert_eq!(account.card_balance.value(), dec!(10.0));

    let entries = engine.entries_of(1).await.unwrap();
    let outs = entries
        .iter()
        .filter(|entry| entry.kind == EntryKind::TransferOut)
        .count();
    let ins = entries
        .iter()
        .filter(|entry| entry.kind == EntryKind::TransferIn)
        .count();
    assert_eq!((outs, ins), (1, 1));
    assert_eq!(engine.transfers().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_withdraw_request_pays_from_referral_balance() {
    let engine = common::engine();
    engine.register(1, None).await.unwrap();
    engine.register(2, Some(1)).await.unwrap();
    engine.register(3, Some(1)).await.unwrap();

    // Two referrals at the default reward of 0.5 each.
    let account = engine.account(1).await.unwrap().unwrap();
    assert_eq!(account.referral_balance.value(), dec!(1.0));

    let request = engine.request_withdraw(1, dec!(0.8)).await.unwrap();
    engine.approve_withdraw(request.id).await.unwrap();

    let account = engine.account(1).await.unwrap().unwrap();
    assert_eq!(account.referral_balance.value(), dec!(0.2));

    // The card history is untouched by referral-balance movement.
    assert!(engine.entries_of(1).await.unwrap().is_empty());
}
