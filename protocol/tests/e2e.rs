//! End-to-end flows through the public API, exercising the worked scenarios
//! the payment team uses as acceptance checks.

use wavepay_protocol::attestation::SimulatedSensorOracle;
use wavepay_protocol::ledger::{LedgerEngine, LedgerError};
use wavepay_protocol::sales::{SaleDraft, SalesFilter};
use wavepay_protocol::transaction::{
    sign_transaction, Amount, Currency, PaymentType, TransactionBuilder,
};

fn cad(s: &str) -> Amount {
    s.parse().unwrap()
}

#[test]
fn full_transfer_lifecycle() {
    let engine = LedgerEngine::new();

    // Wallet A holds 100.00 CAD, wallet B is empty.
    let a = engine.create_wallet(cad("100.00"), Currency::default());
    let b = engine.create_wallet(cad("0"), Currency::default());

    // Client side: build and sign a 30.00 transfer.
    let payload = TransactionBuilder::new(a.wallet.wallet_id.clone(), b.wallet.wallet_id.clone())
        .amount(cad("30.00"))
        .build(&SimulatedSensorOracle)
        .unwrap();
    let signed = sign_transaction(payload, &a.private_key).unwrap();

    // Server side: verify, then apply.
    engine.verify_transaction(&signed).unwrap();
    let outcome = engine.process_transaction(signed.clone()).unwrap();
    assert_eq!(outcome.sender_balance, cad("70.00"));
    assert_eq!(outcome.receiver_balance, cad("30.00"));

    // Resubmitting the identical signed transaction is refused and changes
    // nothing.
    let err = engine.process_transaction(signed).unwrap_err();
    assert!(matches!(err, LedgerError::DuplicateTransaction(_)));
    assert_eq!(engine.get_wallet(&a.wallet.wallet_id).unwrap().balance, cad("70.00"));
    assert_eq!(engine.get_wallet(&b.wallet.wallet_id).unwrap().balance, cad("30.00"));

    // Both wallets see the transfer in their history; the POS book carries
    // the linked sale.
    assert_eq!(engine.list_wallet_transactions(&a.wallet.wallet_id).len(), 1);
    assert_eq!(engine.list_wallet_transactions(&b.wallet.wallet_id).len(), 1);
    let sales = engine.list_sales(&SalesFilter::default());
    assert_eq!(sales.len(), 1);
    assert_eq!(sales[0].product_name, "WavePay Payment");
    assert_eq!(sales[0].payment_type, PaymentType::WalletTransfer);
}

#[test]
fn tampering_is_caught_at_each_layer() {
    let engine = LedgerEngine::new();
    let a = engine.create_wallet(cad("100.00"), Currency::default());
    let b = engine.create_wallet(cad("0"), Currency::default());

    let payload = TransactionBuilder::new(a.wallet.wallet_id.clone(), b.wallet.wallet_id.clone())
        .amount(cad("30.00"))
        .build(&SimulatedSensorOracle)
        .unwrap();
    let signed = sign_transaction(payload, &a.private_key).unwrap();

    // Inflated amount, original signature.
    let mut inflated = signed.clone();
    inflated.payload.amount = cad("90.00");
    assert_eq!(
        engine.process_transaction(inflated).unwrap_err(),
        LedgerError::InvalidSignature
    );

    // Altered sensor data, digest left stale, re-signed with the real key.
    let mut altered = signed.clone();
    altered.payload.attestation_data.motion.acceleration_x += 1.0;
    let resigned = sign_transaction(altered.payload, &a.private_key).unwrap();
    assert_eq!(
        engine.process_transaction(resigned).unwrap_err(),
        LedgerError::InvalidAttestation
    );

    // Nothing got through.
    assert_eq!(engine.get_wallet(&a.wallet.wallet_id).unwrap().balance, cad("100.00"));
    assert_eq!(engine.get_wallet(&b.wallet.wallet_id).unwrap().balance, cad("0.00"));
    assert_eq!(engine.transaction_count(), 0);
}

#[test]
fn overspending_leaves_the_ledger_untouched() {
    let engine = LedgerEngine::new();
    let a = engine.create_wallet(cad("10.00"), Currency::default());
    let b = engine.create_wallet(cad("0"), Currency::default());

    let payload = TransactionBuilder::new(a.wallet.wallet_id.clone(), b.wallet.wallet_id.clone())
        .amount(cad("25.00"))
        .build(&SimulatedSensorOracle)
        .unwrap();
    let signed = sign_transaction(payload, &a.private_key).unwrap();

    let err = engine.process_transaction(signed).unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
    assert_eq!(engine.get_wallet(&a.wallet.wallet_id).unwrap().balance, cad("10.00"));
    assert_eq!(engine.get_wallet(&b.wallet.wallet_id).unwrap().balance, cad("0.00"));
}

#[test]
fn offline_sale_batch_reconciles_exactly_once() {
    let engine = LedgerEngine::new();

    let sale = |name: &str, price: &str, local_id: &str| SaleDraft {
        product_name: name.into(),
        amount: cad(price),
        quantity: 1,
        payment_type: PaymentType::Cash,
        timestamp: None,
        local_id: Some(local_id.into()),
        wavepay_transaction_id: None,
    };

    // One record arrives ahead of the batch (flaky network, partial upload).
    engine.add_sale(sale("Espresso", "3.50", "pos-7"));

    let report = engine.sync_sales(vec![
        sale("Espresso", "3.50", "pos-7"), // duplicate
        sale("Croissant", "4.25", "pos-8"),
        sale("Latte", "5.00", "pos-9"),
    ]);

    assert_eq!(report.synced_count, 2);
    assert_eq!(report.synced_ids, vec!["pos-8".to_owned(), "pos-9".to_owned()]);
    assert_eq!(engine.list_sales(&SalesFilter::default()).len(), 3);

    // Retrying the whole batch is a no-op.
    let retry = engine.sync_sales(vec![
        sale("Espresso", "3.50", "pos-7"),
        sale("Croissant", "4.25", "pos-8"),
        sale("Latte", "5.00", "pos-9"),
    ]);
    assert_eq!(retry.synced_count, 0);
    assert_eq!(engine.list_sales(&SalesFilter::default()).len(), 3);
}

#[test]
fn offline_transfer_batch_reconciles_without_moving_balances() {
    let engine = LedgerEngine::new();
    let a = engine.create_wallet(cad("100.00"), Currency::default());
    let b = engine.create_wallet(cad("0"), Currency::default());

    let mut batch = Vec::new();
    for _ in 0..3 {
        let payload =
            TransactionBuilder::new(a.wallet.wallet_id.clone(), b.wallet.wallet_id.clone())
                .amount(cad("5.00"))
                .build(&SimulatedSensorOracle)
                .unwrap();
        batch.push(sign_transaction(payload, &a.private_key).unwrap());
    }

    let report = engine.sync_transactions(batch.clone());
    assert_eq!(report.synced_count, 3);

    // Reconciliation records history; balances were settled where the
    // transfers originally happened.
    assert_eq!(engine.get_wallet(&a.wallet.wallet_id).unwrap().balance, cad("100.00"));
    assert_eq!(engine.list_wallet_transactions(&b.wallet.wallet_id).len(), 3);

    let again = engine.sync_transactions(batch);
    assert_eq!(again.synced_count, 0);
}
