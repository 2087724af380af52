//! Settlement integration tests
//!
//! Runs whole epochs through the public API: the double-spend race, the fee
//! policy, multi-epoch hand-off through the snapshot store, and conservation.

use ledger_settlement::{
    build_handler, core::handler::PARALLEL_THRESHOLD, EcdsaP256Verifier, EpochHandler, MaxFeeTxHandler, SettlementPolicy,
    SnapshotStore, TXOutput, Transaction, TxHandler, UTXOPool, Wallet, UTXO,
};
use std::sync::Arc;
use tempfile::tempdir;

fn genesis(index: usize) -> UTXO {
    UTXO::new(b"genesis-block", index)
}

/// pool = {O1: (10, A)} plus the two spends of O1 from the race scenario
fn race() -> (UTXOPool, Transaction, Transaction, Wallet, Wallet) {
    let a = Wallet::new().unwrap();
    let b = Wallet::new().unwrap();
    let c = Wallet::new().unwrap();

    let mut pool = UTXOPool::new();
    pool.insert(genesis(0), TXOutput::to_wallet(10, &a));

    let tx_a = Transaction::new_signed(&[(genesis(0), &a)], vec![TXOutput::to_wallet(4, &b)])
        .unwrap();
    let tx_b = Transaction::new_signed(&[(genesis(0), &a)], vec![TXOutput::to_wallet(9, &c)])
        .unwrap();
    (pool, tx_a, tx_b, b, c)
}

#[test]
fn test_first_spend_in_batch_order_wins() {
    let (pool, tx_a, tx_b, b, _) = race();

    let mut handler = TxHandler::new(&pool).unwrap();
    let accepted = handler.handle_txs(&[tx_a.clone(), tx_b]).unwrap();

    assert_eq!(accepted, vec![tx_a.clone()]);
    let mut expected = UTXOPool::new();
    expected.insert(UTXO::new(tx_a.get_id(), 0), TXOutput::to_wallet(4, &b));
    assert_eq!(handler.pool(), &expected);
}

#[test]
fn test_fee_policy_changes_the_winner() {
    let (pool, tx_a, tx_b, _, _) = race();

    let mut plain = TxHandler::new(&pool).unwrap();
    assert_eq!(
        plain.handle_txs(&[tx_b.clone(), tx_a.clone()]).unwrap(),
        vec![tx_b.clone()]
    );

    let mut max_fee = MaxFeeTxHandler::new(&pool).unwrap();
    assert_eq!(
        max_fee.order(&[tx_b.clone(), tx_a.clone()]),
        vec![tx_a.clone(), tx_b.clone()]
    );
    assert_eq!(
        max_fee.handle_txs(&[tx_b, tx_a.clone()]).unwrap(),
        vec![tx_a]
    );
}

#[test]
fn test_empty_transaction_is_accepted_with_zero_fee() {
    let pool = UTXOPool::new();
    let empty = Transaction::new(vec![], vec![]).unwrap();

    let mut handler = TxHandler::new(&pool).unwrap();
    let report = handler.handle_epoch(&[empty.clone()]).unwrap();
    assert_eq!(report.accepted, vec![empty]);
    assert_eq!(report.total_fees, 0);
    assert!(handler.pool().is_empty());
}

#[test]
fn test_epochs_chain_through_snapshot_store() {
    let temp_dir = tempdir().unwrap();
    let store = SnapshotStore::open(temp_dir.path().join("snapshots")).unwrap();
    let (pool, tx_a, tx_b, b, _) = race();
    store.save(&pool).unwrap();

    // epoch 1
    let mut handler = build_handler(
        SettlementPolicy::MaxFee,
        &store.load().unwrap(),
        Arc::new(EcdsaP256Verifier),
        false,
    )
    .unwrap();
    assert_eq!(
        handler.handle_txs(&[tx_b.clone(), tx_a.clone()]).unwrap(),
        vec![tx_a.clone()]
    );
    store.save(handler.pool()).unwrap();

    // epoch 2: b spends what it received; replaying tx_b still fails
    let d = Wallet::new().unwrap();
    let onward = Transaction::new_signed(
        &[(UTXO::new(tx_a.get_id(), 0), &b)],
        vec![TXOutput::to_wallet(3, &d), TXOutput::to_wallet(1, &b)],
    )
    .unwrap();
    let mut handler = build_handler(
        SettlementPolicy::Arrival,
        &store.load().unwrap(),
        Arc::new(EcdsaP256Verifier),
        false,
    )
    .unwrap();
    let report = handler.handle_epoch(&[tx_b, onward.clone()]).unwrap();
    assert_eq!(report.accepted, vec![onward.clone()]);
    assert_eq!(report.rejected.len(), 1);
    store.save(handler.pool()).unwrap();

    let final_pool = store.load().unwrap();
    assert_eq!(
        final_pool.all(),
        vec![UTXO::new(onward.get_id(), 0), UTXO::new(onward.get_id(), 1)]
    );
    assert_eq!(final_pool.total_value(), 4);
}

#[test]
fn test_conservation_over_mixed_batch() {
    let owners: Vec<Wallet> = (0..4).map(|_| Wallet::new().unwrap()).collect();
    let sink = Wallet::new().unwrap();
    let pool: UTXOPool = owners
        .iter()
        .enumerate()
        .map(|(idx, w)| (genesis(idx), TXOutput::to_wallet(10 * (idx as i64 + 1), w)))
        .collect();

    let batch = vec![
        // valid, fee 2
        Transaction::new_signed(
            &[(genesis(0), &owners[0])],
            vec![TXOutput::to_wallet(8, &sink)],
        )
        .unwrap(),
        // creates value: rejected
        Transaction::new_signed(
            &[(genesis(1), &owners[1])],
            vec![TXOutput::to_wallet(21, &sink)],
        )
        .unwrap(),
        // valid, fee 5
        Transaction::new_signed(
            &[(genesis(1), &owners[1]), (genesis(2), &owners[2])],
            vec![TXOutput::to_wallet(45, &sink)],
        )
        .unwrap(),
        // conflicts with the previous one
        Transaction::new_signed(
            &[(genesis(2), &owners[2])],
            vec![TXOutput::to_wallet(1, &sink)],
        )
        .unwrap(),
        // negative output: rejected
        Transaction::new_signed(
            &[(genesis(3), &owners[3])],
            vec![TXOutput::to_wallet(50, &sink), TXOutput::to_wallet(-20, &sink)],
        )
        .unwrap(),
    ];

    // five transactions: large enough for the parallel verification phase
    assert!(batch.len() >= PARALLEL_THRESHOLD);
    for policy in [SettlementPolicy::Arrival, SettlementPolicy::MaxFee] {
        let mut sequential =
            build_handler(policy, &pool, Arc::new(EcdsaP256Verifier), false).unwrap();
        let mut parallel =
            build_handler(policy, &pool, Arc::new(EcdsaP256Verifier), true).unwrap();

        let report = sequential.handle_epoch(&batch).unwrap();
        assert_eq!(report.submitted(), batch.len());
        assert_eq!(
            sequential.pool().total_value(),
            pool.total_value() - report.total_fees
        );

        let parallel_report = parallel.handle_epoch(&batch).unwrap();
        assert_eq!(parallel_report.accepted, report.accepted);
        assert_eq!(parallel_report.rejected, report.rejected);
        assert_eq!(parallel.pool(), sequential.pool());
    }
}
