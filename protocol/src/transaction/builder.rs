//! Transaction payload assembly.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::attestation::{self, AttestationData, SensorOracle};
use crate::config::TRANSACTION_ID_PREFIX;
use crate::crypto::keys::random_suffixed_id;
use crate::transaction::types::{Amount, Currency};

/// Validation failures while assembling a payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("sender wallet id is empty")]
    MissingSender,
    #[error("receiver wallet id is empty")]
    MissingReceiver,
    #[error("transfer amount must be strictly positive")]
    ZeroAmount,
    #[error("sender and receiver wallets are the same: {0}")]
    SelfTransfer(String),
}

/// An unsigned transfer payload.
///
/// Every field here is covered by the digital signature. The canonical JSON
/// form of this struct (keys sorted, compact separators) is exactly what gets
/// signed, so field names are part of the wire contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionPayload {
    pub transaction_id: String,
    pub sender_wallet_id: String,
    pub receiver_wallet_id: String,
    pub amount: Amount,
    pub currency: Currency,
    pub attestation_data: AttestationData,
    /// SHA-512 hex digest of `attestation_data` in canonical form.
    pub attestation_signature: String,
    /// ISO-8601 build time, as stamped by the originating device.
    pub timestamp: String,
}

/// A payload plus its Ed25519 signature, ready for submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedTransaction {
    #[serde(flatten)]
    pub payload: TransactionPayload,
    /// Base64-encoded Ed25519 signature over the canonical payload bytes.
    #[serde(rename = "digital_signature")]
    pub signature: String,
}

/// Fluent builder for transfer payloads.
///
/// ```
/// use wavepay_protocol::attestation::SimulatedSensorOracle;
/// use wavepay_protocol::transaction::{Amount, TransactionBuilder};
///
/// let payload = TransactionBuilder::new("WPQ17000000000001234", "WPQ17000000000005678")
///     .amount(Amount::from_minor_units(3000))
///     .build(&SimulatedSensorOracle)
///     .unwrap();
/// assert!(payload.transaction_id.starts_with("TX"));
/// ```
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    sender_wallet_id: String,
    receiver_wallet_id: String,
    amount: Amount,
    currency: Currency,
}

impl TransactionBuilder {
    pub fn new(sender_wallet_id: impl Into<String>, receiver_wallet_id: impl Into<String>) -> Self {
        TransactionBuilder {
            sender_wallet_id: sender_wallet_id.into(),
            receiver_wallet_id: receiver_wallet_id.into(),
            amount: Amount::ZERO,
            currency: Currency::default(),
        }
    }

    pub fn amount(mut self, amount: Amount) -> Self {
        self.amount = amount;
        self
    }

    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    /// Validates the transfer parameters, captures a sensor snapshot from the
    /// oracle, and assembles the unsigned payload.
    ///
    /// Generates a fresh transaction id and stamps the current time. The
    /// result still needs [`sign_transaction`](crate::transaction::signing::sign_transaction)
    /// before the ledger will look at it.
    pub fn build(self, oracle: &dyn SensorOracle) -> Result<TransactionPayload, BuildError> {
        if self.sender_wallet_id.is_empty() {
            return Err(BuildError::MissingSender);
        }
        if self.receiver_wallet_id.is_empty() {
            return Err(BuildError::MissingReceiver);
        }
        if self.amount.is_zero() {
            return Err(BuildError::ZeroAmount);
        }
        if self.sender_wallet_id == self.receiver_wallet_id {
            return Err(BuildError::SelfTransfer(self.sender_wallet_id));
        }

        let attestation_data = oracle.capture();
        let attestation_signature = attestation::digest(&attestation_data);

        Ok(TransactionPayload {
            transaction_id: random_suffixed_id(TRANSACTION_ID_PREFIX),
            sender_wallet_id: self.sender_wallet_id,
            receiver_wallet_id: self.receiver_wallet_id,
            amount: self.amount,
            currency: self.currency,
            attestation_data,
            attestation_signature,
            timestamp: chrono::Utc::now().to_rfc3339(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attestation::SimulatedSensorOracle;
    use crate::config::TRANSACTION_ID_PREFIX;

    fn builder() -> TransactionBuilder {
        TransactionBuilder::new("WPQ1", "WPQ2").amount(Amount::from_minor_units(3000))
    }

    #[test]
    fn builds_a_complete_payload() {
        let payload = builder().build(&SimulatedSensorOracle).unwrap();
        assert!(payload.transaction_id.starts_with(TRANSACTION_ID_PREFIX));
        assert_eq!(payload.sender_wallet_id, "WPQ1");
        assert_eq!(payload.receiver_wallet_id, "WPQ2");
        assert_eq!(payload.amount, Amount::from_minor_units(3000));
        assert_eq!(payload.currency, Currency::default());
        assert!(!payload.timestamp.is_empty());
    }

    #[test]
    fn attestation_digest_matches_captured_data() {
        let payload = builder().build(&SimulatedSensorOracle).unwrap();
        assert!(crate::attestation::verify(
            &payload.attestation_data,
            &payload.attestation_signature
        ));
    }

    #[test]
    fn transaction_ids_are_fresh_per_build() {
        let a = builder().build(&SimulatedSensorOracle).unwrap();
        let b = builder().build(&SimulatedSensorOracle).unwrap();
        assert_ne!(a.transaction_id, b.transaction_id);
    }

    #[test]
    fn rejects_zero_amount() {
        let err = TransactionBuilder::new("WPQ1", "WPQ2")
            .build(&SimulatedSensorOracle)
            .unwrap_err();
        assert_eq!(err, BuildError::ZeroAmount);
    }

    #[test]
    fn rejects_self_transfer() {
        let err = TransactionBuilder::new("WPQ1", "WPQ1")
            .amount(Amount::from_minor_units(100))
            .build(&SimulatedSensorOracle)
            .unwrap_err();
        assert_eq!(err, BuildError::SelfTransfer("WPQ1".into()));
    }

    #[test]
    fn rejects_empty_wallet_ids() {
        let err = TransactionBuilder::new("", "WPQ2")
            .amount(Amount::from_minor_units(100))
            .build(&SimulatedSensorOracle)
            .unwrap_err();
        assert_eq!(err, BuildError::MissingSender);

        let err = TransactionBuilder::new("WPQ1", "")
            .amount(Amount::from_minor_units(100))
            .build(&SimulatedSensorOracle)
            .unwrap_err();
        assert_eq!(err, BuildError::MissingReceiver);
    }

    #[test]
    fn signed_transaction_wire_form_is_flat() {
        let payload = builder().build(&SimulatedSensorOracle).unwrap();
        let signed = SignedTransaction {
            payload,
            signature: "c2ln".into(),
        };
        let value = serde_json::to_value(&signed).unwrap();
        // Signature sits beside the payload fields, not nested under them.
        assert!(value.get("digital_signature").is_some());
        assert!(value.get("transaction_id").is_some());
        assert!(value.get("payload").is_none());
    }
}
