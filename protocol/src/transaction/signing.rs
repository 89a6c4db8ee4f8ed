//! Payload canonicalization and signing.

use serde_json::Value;
use thiserror::Error;
use tracing::trace;

use crate::crypto::{canonical_json, KeyError, WalletKeypair};
use crate::transaction::builder::{SignedTransaction, TransactionPayload};

/// Failures while signing a payload.
#[derive(Debug, Error)]
pub enum SigningError {
    #[error(transparent)]
    Key(#[from] KeyError),

    #[error("payload could not be serialized for signing")]
    Serialization(#[from] serde_json::Error),
}

/// Canonical byte form of an unsigned payload.
///
/// This is the exact message the Ed25519 signature covers: the payload
/// serialized to JSON with keys sorted recursively and compact separators.
/// Signer and verifier both come through here; there is no second code path.
pub fn canonical_payload_bytes(payload: &TransactionPayload) -> Result<Vec<u8>, serde_json::Error> {
    let value: Value = serde_json::to_value(payload)?;
    Ok(canonical_json(&value).into_bytes())
}

/// Signs a payload with the sender's private key (base64-encoded, as held by
/// the client) and returns the finished [`SignedTransaction`].
pub fn sign_transaction(
    payload: TransactionPayload,
    private_key_b64: &str,
) -> Result<SignedTransaction, SigningError> {
    let keypair = WalletKeypair::from_base64(private_key_b64)?;
    let message = canonical_payload_bytes(&payload)?;
    let signature = keypair.sign(&message);
    trace!(
        transaction_id = %payload.transaction_id,
        sender = %payload.sender_wallet_id,
        "payload signed"
    );
    Ok(SignedTransaction {
        payload,
        signature: signature.to_base64(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attestation::SimulatedSensorOracle;
    use crate::transaction::builder::TransactionBuilder;
    use crate::transaction::types::Amount;

    fn payload() -> TransactionPayload {
        TransactionBuilder::new("WPQ1", "WPQ2")
            .amount(Amount::from_minor_units(3000))
            .build(&SimulatedSensorOracle)
            .unwrap()
    }

    #[test]
    fn canonical_bytes_are_deterministic() {
        let p = payload();
        assert_eq!(
            canonical_payload_bytes(&p).unwrap(),
            canonical_payload_bytes(&p).unwrap()
        );
    }

    #[test]
    fn canonical_bytes_survive_wire_round_trip() {
        // The verifier reconstructs the payload from JSON sent by the client;
        // its canonical bytes must match what the client signed.
        let p = payload();
        let wire = serde_json::to_string(&p).unwrap();
        let back: TransactionPayload = serde_json::from_str(&wire).unwrap();
        assert_eq!(
            canonical_payload_bytes(&p).unwrap(),
            canonical_payload_bytes(&back).unwrap()
        );
    }

    #[test]
    fn canonical_bytes_start_sorted() {
        let bytes = canonical_payload_bytes(&payload()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        // "amount" sorts first among the payload's field names.
        assert!(text.starts_with(r#"{"amount":"#));
    }

    #[test]
    fn sign_produces_valid_signature() {
        let kp = WalletKeypair::generate();
        let p = payload();
        let signed = sign_transaction(p.clone(), &kp.private_key_base64()).unwrap();
        assert_eq!(signed.payload, p);
        assert!(crate::transaction::verification::verify_signature(
            &signed,
            &kp.public_key()
        ));
    }

    #[test]
    fn sign_rejects_malformed_private_key() {
        let err = sign_transaction(payload(), "not a key").unwrap_err();
        assert!(matches!(err, SigningError::Key(KeyError::InvalidPrivateKey)));
    }
}
