//! The ledger engine.
//!
//! One `parking_lot::Mutex` guards the whole ledger state: wallets,
//! transaction records, and the sales book. That makes every operation a
//! single-writer transactional commit — the debit, the credit, the record
//! insert, and the linked sale all land inside one critical section, so no
//! reader ever observes a half-applied transfer and no interleaving can lose
//! an update. Operations are short (a couple of hashmap hits plus one
//! signature check), so the coarse lock is not a throughput concern at POS
//! request rates.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{LINKED_SALE_LOCAL_ID_PREFIX, LINKED_SALE_PRODUCT_NAME};
use crate::crypto::{generate_wallet_id, WalletKeypair};
use crate::ledger::error::LedgerError;
use crate::ledger::wallet::Wallet;
use crate::sales::{SaleDraft, SaleInsert, SaleRecord, SalesBook, SalesFilter, SalesStats, SyncReport};
use crate::transaction::builder::SignedTransaction;
use crate::transaction::types::{Amount, Currency, PaymentType, TransactionStatus};
use crate::transaction::verification::{verify_attestation, verify_signature};

// ---------------------------------------------------------------------------
// Result Types
// ---------------------------------------------------------------------------

/// Result of creating a wallet.
///
/// This is the one and only place the private key ever appears. It is not
/// stored, not logged, and there is no API to retrieve it again.
#[derive(Debug)]
pub struct WalletCreation {
    pub wallet: Wallet,
    /// Base64-encoded Ed25519 private key. Hand it to the client and forget it.
    pub private_key: String,
}

/// A persisted ledger transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    #[serde(flatten)]
    pub transaction: SignedTransaction,
    pub status: TransactionStatus,
    pub synced: bool,
    /// Server-side commit time, used for newest-first listings.
    pub recorded_at: DateTime<Utc>,
}

/// What a successful transfer reports back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferOutcome {
    pub transaction_id: String,
    pub sender_balance: Amount,
    pub receiver_balance: Amount,
}

#[derive(Default)]
struct LedgerState {
    wallets: HashMap<String, Wallet>,
    transactions: HashMap<String, TransactionRecord>,
    sales: SalesBook,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The single ledger authority.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
#[derive(Default)]
pub struct LedgerEngine {
    state: Mutex<LedgerState>,
}

impl LedgerEngine {
    pub fn new() -> Self {
        LedgerEngine::default()
    }

    // -- Wallets ------------------------------------------------------------

    /// Creates a wallet with a fresh keypair.
    ///
    /// The public key is persisted on the wallet record; the private key is
    /// returned exactly once in the [`WalletCreation`] and exists nowhere
    /// else server-side.
    pub fn create_wallet(&self, initial_balance: Amount, currency: Currency) -> WalletCreation {
        let keypair = WalletKeypair::generate();
        let mut state = self.state.lock();
        let mut wallet_id = generate_wallet_id();
        // Same-millisecond, same-suffix collisions are vanishingly rare, but
        // the id must be unique, so the map is the backstop.
        while state.wallets.contains_key(&wallet_id) {
            wallet_id = generate_wallet_id();
        }
        let wallet = Wallet::new(wallet_id, keypair.public_key(), initial_balance, currency);
        state.wallets.insert(wallet.wallet_id.clone(), wallet.clone());
        info!(wallet_id = %wallet.wallet_id, balance = %wallet.balance, "wallet created");
        WalletCreation {
            wallet,
            private_key: keypair.private_key_base64(),
        }
    }

    /// Looks up a wallet by id.
    pub fn get_wallet(&self, wallet_id: &str) -> Result<Wallet, LedgerError> {
        self.state
            .lock()
            .wallets
            .get(wallet_id)
            .cloned()
            .ok_or_else(|| LedgerError::WalletNotFound(wallet_id.to_owned()))
    }

    pub fn wallet_count(&self) -> usize {
        self.state.lock().wallets.len()
    }

    // -- Transfers ----------------------------------------------------------

    /// Runs the integrity checks without touching any state: sender exists,
    /// signature verifies, attestation digest matches.
    pub fn verify_transaction(&self, tx: &SignedTransaction) -> Result<(), LedgerError> {
        let state = self.state.lock();
        Self::check_integrity(&state, tx)
    }

    /// Applies a signed transfer to the ledger.
    ///
    /// The full pipeline, in order: sender lookup, signature check,
    /// attestation check, duplicate-id check, receiver lookup, balance check
    /// — and only then, atomically, the debit, the credit, the `completed`
    /// transaction record, and the linked POS sale. Any failure before the
    /// commit leaves the ledger byte-for-byte untouched.
    pub fn process_transaction(
        &self,
        tx: SignedTransaction,
    ) -> Result<TransferOutcome, LedgerError> {
        let mut state = self.state.lock();

        Self::check_integrity(&state, &tx)?;

        // The builder refuses these, but the engine cannot trust submitted
        // payloads: a self-transfer would credit and debit the same wallet
        // and the second write would mint the amount out of thin air.
        if tx.payload.sender_wallet_id == tx.payload.receiver_wallet_id {
            return Err(LedgerError::Validation(
                "sender and receiver wallets are the same".to_owned(),
            ));
        }

        let transaction_id = tx.payload.transaction_id.clone();
        if state.transactions.contains_key(&transaction_id) {
            debug!(%transaction_id, "duplicate transaction rejected");
            return Err(LedgerError::DuplicateTransaction(transaction_id));
        }

        let receiver_id = tx.payload.receiver_wallet_id.clone();
        if !state.wallets.contains_key(&receiver_id) {
            return Err(LedgerError::WalletNotFound(receiver_id));
        }

        let sender_id = tx.payload.sender_wallet_id.clone();
        let amount = tx.payload.amount;
        let sender_balance = state
            .wallets
            .get(&sender_id)
            .map(|w| w.balance)
            .ok_or_else(|| LedgerError::WalletNotFound(sender_id.clone()))?;
        let new_sender_balance = sender_balance.checked_sub(amount).ok_or_else(|| {
            warn!(
                wallet_id = %sender_id,
                balance = %sender_balance,
                required = %amount,
                "transfer rejected: insufficient balance"
            );
            LedgerError::InsufficientBalance {
                wallet_id: sender_id.clone(),
                balance: sender_balance,
                required: amount,
            }
        })?;
        let new_receiver_balance = state
            .wallets
            .get(&receiver_id)
            .map(|w| w.balance)
            .ok_or_else(|| LedgerError::WalletNotFound(receiver_id.clone()))?
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Internal("receiver balance overflow".to_owned()))?;

        // All checks passed. Everything below is the atomic commit: we hold
        // the state lock, so no other operation can observe or interleave
        // with a partial application.
        let now = Utc::now();
        if let Some(sender) = state.wallets.get_mut(&sender_id) {
            sender.balance = new_sender_balance;
            sender.last_sync = now;
        }
        if let Some(receiver) = state.wallets.get_mut(&receiver_id) {
            receiver.balance = new_receiver_balance;
            receiver.last_sync = now;
        }

        let sale_timestamp = DateTime::parse_from_rfc3339(&tx.payload.timestamp)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or(now);
        state.sales.add(
            SaleDraft {
                product_name: LINKED_SALE_PRODUCT_NAME.to_owned(),
                amount,
                quantity: 1,
                payment_type: PaymentType::WalletTransfer,
                timestamp: Some(sale_timestamp),
                local_id: Some(format!("{}{}", LINKED_SALE_LOCAL_ID_PREFIX, transaction_id)),
                wavepay_transaction_id: Some(transaction_id.clone()),
            },
            true,
        );

        state.transactions.insert(
            transaction_id.clone(),
            TransactionRecord {
                transaction: tx,
                status: TransactionStatus::Completed,
                synced: true,
                recorded_at: now,
            },
        );

        info!(
            %transaction_id,
            sender = %sender_id,
            receiver = %receiver_id,
            %amount,
            "transfer committed"
        );
        Ok(TransferOutcome {
            transaction_id,
            sender_balance: new_sender_balance,
            receiver_balance: new_receiver_balance,
        })
    }

    /// Reconciles a batch of wallet transfers from an offline queue.
    ///
    /// Items whose `transaction_id` is already known are skipped silently;
    /// the rest are inserted directly as `completed` without re-running
    /// signature or balance checks. The sync channel is a trusted internal
    /// one: these transfers were verified by whichever node accepted them
    /// originally, and replaying balance mutations here would double-apply
    /// them. See `DESIGN.md` for the trust-boundary discussion.
    pub fn sync_transactions(&self, batch: Vec<SignedTransaction>) -> SyncReport {
        let mut state = self.state.lock();
        let mut report = SyncReport::default();
        let now = Utc::now();
        for tx in batch {
            let transaction_id = tx.payload.transaction_id.clone();
            if state.transactions.contains_key(&transaction_id) {
                continue;
            }
            state.transactions.insert(
                transaction_id.clone(),
                TransactionRecord {
                    transaction: tx,
                    status: TransactionStatus::Completed,
                    synced: true,
                    recorded_at: now,
                },
            );
            report.synced_count += 1;
            report.synced_ids.push(transaction_id);
        }
        info!(synced = report.synced_count, "wallet transfer batch reconciled");
        report
    }

    /// Lists every transaction a wallet took part in, newest first.
    pub fn list_wallet_transactions(&self, wallet_id: &str) -> Vec<TransactionRecord> {
        let state = self.state.lock();
        let mut records: Vec<TransactionRecord> = state
            .transactions
            .values()
            .filter(|r| {
                r.transaction.payload.sender_wallet_id == wallet_id
                    || r.transaction.payload.receiver_wallet_id == wallet_id
            })
            .cloned()
            .collect();
        records.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        records
    }

    pub fn transaction_count(&self) -> usize {
        self.state.lock().transactions.len()
    }

    fn check_integrity(state: &LedgerState, tx: &SignedTransaction) -> Result<(), LedgerError> {
        let sender = state
            .wallets
            .get(&tx.payload.sender_wallet_id)
            .ok_or_else(|| LedgerError::WalletNotFound(tx.payload.sender_wallet_id.clone()))?;
        if !verify_signature(tx, &sender.public_key) {
            warn!(
                transaction_id = %tx.payload.transaction_id,
                sender = %tx.payload.sender_wallet_id,
                "signature verification failed"
            );
            return Err(LedgerError::InvalidSignature);
        }
        if !verify_attestation(tx) {
            warn!(
                transaction_id = %tx.payload.transaction_id,
                "attestation digest mismatch"
            );
            return Err(LedgerError::InvalidAttestation);
        }
        Ok(())
    }

    // -- POS Sales ----------------------------------------------------------

    /// Records a sale entered directly at the register.
    ///
    /// Direct entries land already reconciled: `synced` is true the moment
    /// the record exists server-side, same as a batch-synced sale.
    pub fn add_sale(&self, draft: SaleDraft) -> SaleInsert {
        self.state.lock().sales.add(draft, true)
    }

    /// Reconciles a batch of offline sales.
    pub fn sync_sales(&self, batch: Vec<SaleDraft>) -> SyncReport {
        self.state.lock().sales.sync(batch)
    }

    /// Lists sales, newest first, honoring the filter.
    pub fn list_sales(&self, filter: &SalesFilter) -> Vec<SaleRecord> {
        self.state.lock().sales.list(filter)
    }

    /// Daily and weekly revenue summaries.
    pub fn sales_stats(&self) -> SalesStats {
        self.state.lock().sales.stats(Utc::now())
    }

    pub fn sales_count(&self) -> usize {
        self.state.lock().sales.len()
    }
}
