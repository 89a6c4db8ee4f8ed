//! Signature and attestation verification.
//!
//! Both checks return plain booleans. A forged signature, a truncated key,
//! a tampered sensor blob — these are expected inputs for a payment system
//! facing the open internet, and rejecting them is a normal outcome, not an
//! error condition.

use tracing::debug;

use crate::attestation;
use crate::crypto::{WalletPublicKey, WalletSignature};
use crate::transaction::builder::SignedTransaction;
use crate::transaction::signing::canonical_payload_bytes;

/// Checks the transaction's Ed25519 signature against the sender's stored
/// public key.
///
/// Recomputes the canonical payload bytes and verifies the base64 signature
/// over them. Returns `false` on undecodable signatures, wrong-length
/// material, or cryptographic mismatch.
pub fn verify_signature(tx: &SignedTransaction, sender_key: &WalletPublicKey) -> bool {
    let Some(signature) = WalletSignature::from_base64(&tx.signature) else {
        debug!(
            transaction_id = %tx.payload.transaction_id,
            "signature is not valid base64"
        );
        return false;
    };
    let Ok(message) = canonical_payload_bytes(&tx.payload) else {
        return false;
    };
    sender_key.verify(&message, &signature)
}

/// Checks that the attestation digest inside the payload matches the sensor
/// data it claims to cover.
///
/// The digest is inside the signed region, so this only adds information when
/// the signature already verified: it detects a client that signed an
/// inconsistent payload.
pub fn verify_attestation(tx: &SignedTransaction) -> bool {
    attestation::verify(&tx.payload.attestation_data, &tx.payload.attestation_signature)
}
