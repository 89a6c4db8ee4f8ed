//! # The Ledger
//!
//! Where money actually moves. The engine owns every wallet balance and every
//! transaction record, and it is the only code in the system allowed to touch
//! either. Everything upstream — builders, signers, the HTTP surface — hands
//! it a finished [`SignedTransaction`](crate::transaction::SignedTransaction)
//! and gets back either a committed transfer or a specific refusal.
//!
//! Two promises define this module:
//!
//! 1. **Atomicity.** A transfer debits the sender, credits the receiver,
//!    records the transaction, and records the linked POS sale as one unit.
//!    There is no observable state where some of those happened.
//! 2. **Idempotency.** A `transaction_id` is applied at most once, ever.
//!    Resubmitting a committed transfer is a polite no-op refusal, not a
//!    second payment.

pub mod engine;
pub mod error;
pub mod wallet;

pub use engine::{LedgerEngine, TransactionRecord, TransferOutcome, WalletCreation};
pub use error::LedgerError;
pub use wallet::Wallet;
