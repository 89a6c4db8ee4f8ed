//! # Transactions
//!
//! Payload construction, signing, and verification for wallet transfers.
//!
//! The lifecycle splits deliberately: the builder assembles an *unsigned*
//! payload (ids, amount, sensor attestation, timestamp), and signing is a
//! separate step against the sender's private key. The split exists because
//! signing can happen elsewhere — on a different device, after user
//! confirmation, over a QR handoff — while the server only ever sees the
//! finished [`SignedTransaction`].
//!
//! Verification is the mirror image and is total: malformed keys, truncated
//! signatures, and tampered payloads all come back as `false`, never as a
//! panic or an error. Rejecting a forged transaction is the system working.

pub mod builder;
pub mod signing;
pub mod types;
pub mod verification;

pub use builder::{BuildError, SignedTransaction, TransactionBuilder, TransactionPayload};
pub use signing::{sign_transaction, SigningError};
pub use types::{Amount, AmountError, Currency, PaymentType, TransactionStatus};
pub use verification::{verify_attestation, verify_signature};
