//! # Key Management
//!
//! Ed25519 keypair generation and serialization for WavePay wallets.
//!
//! Every wallet is born with exactly one keypair. The server keeps the public
//! half on the wallet record; the private half is handed to the client once,
//! at creation, and never seen again. This module handles generation and the
//! base64 text forms that travel over the wire.
//!
//! ## Why Ed25519?
//!
//! - Deterministic signatures (no k-value footguns like ECDSA).
//! - 128-bit security level in 32+32 bytes. Compact and sufficient.
//! - Fast verification — the ledger verifies a signature on every transfer.
//!
//! ## Security considerations
//!
//! - We use OS-level RNG (`OsRng`) for key generation.
//! - Key bytes are never logged. If you add logging to this module,
//!   you will be asked to leave.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use ed25519_dalek::{
    Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey, SECRET_KEY_LENGTH,
};
use rand::rngs::OsRng;
use rand::Rng;
use serde::de::{Deserializer, Error as _};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

use crate::config::{SIGNATURE_LENGTH, VERIFYING_KEY_LENGTH, WALLET_ID_PREFIX};

/// Errors that can occur during key operations.
///
/// These are intentionally vague about *why* something failed — leaking
/// details about key material through error messages is a classic footgun.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid private key: not valid base64 or wrong length")]
    InvalidPrivateKey,

    #[error("invalid public key: not valid base64 or not a valid Ed25519 point")]
    InvalidPublicKey,
}

/// Builds an identifier of the form `{prefix}{unix_millis}{4-digit random}`.
///
/// Unique with overwhelming probability at realistic issuance rates; the
/// ledger's uniqueness constraint is the authoritative backstop if two ids
/// are ever minted in the same millisecond with the same suffix.
pub fn random_suffixed_id(prefix: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix: u16 = rand::thread_rng().gen_range(1000..10000);
    format!("{}{}{}", prefix, millis, suffix)
}

/// Generates a wallet identifier: `WPQ{unix_millis}{4-digit random}`.
pub fn generate_wallet_id() -> String {
    random_suffixed_id(WALLET_ID_PREFIX)
}

/// A WavePay wallet keypair wrapping an Ed25519 signing key.
///
/// ## Serialization
///
/// `WalletKeypair` intentionally does NOT implement `Serialize`/`Deserialize`.
/// Serializing private keys should be a deliberate, conscious act, not
/// something that happens because someone shoved a keypair into a JSON
/// response. Use [`private_key_base64`](Self::private_key_base64) explicitly —
/// the wallet-creation path is its only legitimate caller.
pub struct WalletKeypair {
    signing_key: SigningKey,
}

/// The public half of a wallet identity, safe to share with the world.
///
/// This is what the ledger stores on the wallet record and what verifies
/// every outgoing transfer from that wallet. Serializes as base64 text —
/// the only form keys ever take on the wire.
#[derive(Clone, PartialEq, Eq)]
pub struct WalletPublicKey {
    bytes: [u8; 32],
}

impl Serialize for WalletPublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for WalletPublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let b64 = String::deserialize(deserializer)?;
        WalletPublicKey::from_base64(&b64).map_err(D::Error::custom)
    }
}

/// An Ed25519 signature over a canonical transaction serialization.
///
/// 64 bytes, base64-encoded on the wire. Stored as `Vec<u8>` so foreign
/// input can be carried before length validation: if someone hands us a
/// signature that isn't 64 bytes, verification simply returns `false` —
/// no panics, no undefined behavior.
#[derive(Clone, PartialEq, Eq)]
pub struct WalletSignature {
    bytes: Vec<u8>,
}

impl Serialize for WalletSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for WalletSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let b64 = String::deserialize(deserializer)?;
        WalletSignature::from_base64(&b64)
            .ok_or_else(|| D::Error::custom("signature is not valid base64"))
    }
}

impl WalletKeypair {
    /// Generate a fresh keypair using the OS cryptographic RNG.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Reconstruct a keypair from a base64-encoded 32-byte private key.
    ///
    /// This is how a client-held private key re-enters the system for
    /// signing. The public key is re-derived from the secret, so a valid
    /// private key always yields a consistent pair.
    pub fn from_base64(private_key_b64: &str) -> Result<Self, KeyError> {
        let bytes = BASE64
            .decode(private_key_b64.trim())
            .map_err(|_| KeyError::InvalidPrivateKey)?;
        if bytes.len() != SECRET_KEY_LENGTH {
            return Err(KeyError::InvalidPrivateKey);
        }
        let mut seed = [0u8; SECRET_KEY_LENGTH];
        seed.copy_from_slice(&bytes);
        Ok(Self {
            signing_key: SigningKey::from_bytes(&seed),
        })
    }

    /// Returns the public key associated with this keypair.
    pub fn public_key(&self) -> WalletPublicKey {
        WalletPublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// Export the private key as base64 text.
    ///
    /// **Handle with extreme care.** This is called exactly once per wallet,
    /// during creation, to hand the key to the client. Don't log it. Don't
    /// store it. There is deliberately no persisted field for it anywhere.
    pub fn private_key_base64(&self) -> String {
        BASE64.encode(self.signing_key.to_bytes())
    }

    /// Sign a message and return a [`WalletSignature`].
    ///
    /// Ed25519 signatures are deterministic — the same (key, message) pair
    /// always produces the same signature. No nonce management, no sleepless
    /// nights wondering if the RNG was seeded properly at signing time.
    pub fn sign(&self, message: &[u8]) -> WalletSignature {
        let sig = self.signing_key.sign(message);
        WalletSignature {
            bytes: sig.to_bytes().to_vec(),
        }
    }

    /// Verify a signature against this keypair's public key.
    ///
    /// Convenience method — equivalent to `self.public_key().verify()`.
    pub fn verify(&self, message: &[u8], signature: &WalletSignature) -> bool {
        self.public_key().verify(message, signature)
    }
}

impl fmt::Debug for WalletKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print secret key material in debug output. Not even partially.
        write!(f, "WalletKeypair(pub={})", self.public_key().to_base64())
    }
}

// ---------------------------------------------------------------------------
// WalletPublicKey
// ---------------------------------------------------------------------------

impl WalletPublicKey {
    /// Create a `WalletPublicKey` from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Parse a base64-encoded public key.
    ///
    /// Validates the length and that the bytes represent a valid Ed25519
    /// point. We don't just accept any 32 bytes — some values aren't valid
    /// points on the curve.
    pub fn from_base64(b64: &str) -> Result<Self, KeyError> {
        let decoded = BASE64
            .decode(b64.trim())
            .map_err(|_| KeyError::InvalidPublicKey)?;
        if decoded.len() != VERIFYING_KEY_LENGTH {
            return Err(KeyError::InvalidPublicKey);
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&decoded);

        // Catches low-order points and other degenerate cases.
        VerifyingKey::from_bytes(&bytes).map_err(|_| KeyError::InvalidPublicKey)?;

        Ok(Self { bytes })
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Base64 representation — the form stored on the wallet record and
    /// transmitted to clients.
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.bytes)
    }

    /// Verify a signature against this public key.
    ///
    /// Returns `true` if the signature is valid, `false` otherwise. A boolean
    /// (rather than `Result`) because verification failure is a normal,
    /// expected outcome: malformed signature bytes, an invalid stored key,
    /// and a cryptographic mismatch all just mean "not valid".
    pub fn verify(&self, message: &[u8], signature: &WalletSignature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let sig_bytes: [u8; 64] = match signature.bytes.as_slice().try_into() {
            Ok(b) => b,
            Err(_) => return false,
        };
        let dalek_sig = DalekSignature::from_bytes(&sig_bytes);
        verifying_key.verify(message, &dalek_sig).is_ok()
    }
}

impl fmt::Display for WalletPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base64())
    }
}

impl fmt::Debug for WalletPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WalletPublicKey({})", &self.to_base64()[..12])
    }
}

// ---------------------------------------------------------------------------
// WalletSignature
// ---------------------------------------------------------------------------

impl WalletSignature {
    /// Create a signature from its raw 64-byte representation.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    /// Parse a base64-encoded signature.
    ///
    /// Accepts any decodable input; length is checked at verification time,
    /// where a wrong-length signature verifies as `false` rather than
    /// erroring. Callers who want early rejection can check
    /// [`is_well_formed`](Self::is_well_formed).
    pub fn from_base64(b64: &str) -> Option<Self> {
        let bytes = BASE64.decode(b64.trim()).ok()?;
        Some(Self { bytes })
    }

    /// Returns `true` if the signature has the exact Ed25519 length.
    pub fn is_well_formed(&self) -> bool {
        self.bytes.len() == SIGNATURE_LENGTH
    }

    /// Returns the raw signature bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Base64 representation — the wire form carried in `digital_signature`.
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }
}

impl fmt::Display for WalletSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base64())
    }
}

impl fmt::Debug for WalletSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b64 = self.to_base64();
        if b64.len() >= 16 {
            write!(f, "WalletSignature({}...)", &b64[..16])
        } else {
            write!(f, "WalletSignature({})", b64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_produces_valid_keypair() {
        let kp = WalletKeypair::generate();
        assert_eq!(kp.public_key().as_bytes().len(), 32);
    }

    #[test]
    fn sign_verify_roundtrip() {
        let kp = WalletKeypair::generate();
        let msg = b"transfer 30.00 CAD";
        let sig = kp.sign(msg);
        assert!(kp.verify(msg, &sig));
    }

    #[test]
    fn wrong_message_fails_verification() {
        let kp = WalletKeypair::generate();
        let sig = kp.sign(b"correct message");
        assert!(!kp.verify(b"wrong message", &sig));
    }

    #[test]
    fn wrong_key_fails_verification() {
        let kp1 = WalletKeypair::generate();
        let kp2 = WalletKeypair::generate();
        let sig = kp1.sign(b"message");
        assert!(!kp2.verify(b"message", &sig));
    }

    #[test]
    fn private_key_base64_roundtrip() {
        let kp = WalletKeypair::generate();
        let b64 = kp.private_key_base64();
        let restored = WalletKeypair::from_base64(&b64).unwrap();
        assert_eq!(kp.public_key(), restored.public_key());
    }

    #[test]
    fn invalid_private_key_rejected() {
        // Not base64 at all.
        assert!(WalletKeypair::from_base64("not-valid-base64!!!").is_err());
        // Valid base64, wrong length.
        assert!(WalletKeypair::from_base64(&BASE64.encode([0u8; 16])).is_err());
    }

    #[test]
    fn public_key_base64_roundtrip() {
        let kp = WalletKeypair::generate();
        let pk = kp.public_key();
        let recovered = WalletPublicKey::from_base64(&pk.to_base64()).unwrap();
        assert_eq!(pk, recovered);
    }

    #[test]
    fn public_key_rejects_wrong_length() {
        assert!(WalletPublicKey::from_base64(&BASE64.encode([0u8; 16])).is_err());
    }

    #[test]
    fn two_generated_keypairs_are_different() {
        // If this fails, your RNG is broken and you have bigger problems.
        let kp1 = WalletKeypair::generate();
        let kp2 = WalletKeypair::generate();
        assert_ne!(kp1.public_key(), kp2.public_key());
    }

    #[test]
    fn deterministic_signatures() {
        let kp = WalletKeypair::generate();
        let msg = b"determinism is underrated";
        assert_eq!(kp.sign(msg).as_bytes(), kp.sign(msg).as_bytes());
    }

    #[test]
    fn signature_base64_roundtrip() {
        let kp = WalletKeypair::generate();
        let sig = kp.sign(b"test");
        let recovered = WalletSignature::from_base64(&sig.to_base64()).unwrap();
        assert_eq!(sig, recovered);
        assert!(recovered.is_well_formed());
    }

    #[test]
    fn malformed_signature_verifies_false() {
        let kp = WalletKeypair::generate();
        let short = WalletSignature { bytes: vec![0u8; 10] };
        assert!(!kp.public_key().verify(b"message", &short));
    }

    #[test]
    fn public_key_serde_is_base64_text() {
        let pk = WalletKeypair::generate().public_key();
        let json = serde_json::to_string(&pk).unwrap();
        assert_eq!(json, format!("\"{}\"", pk.to_base64()));
        let back: WalletPublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pk);
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let kp = WalletKeypair::generate();
        let debug_str = format!("{:?}", kp);
        assert!(debug_str.starts_with("WalletKeypair(pub="));
        assert!(!debug_str.contains(&kp.private_key_base64()));
    }

    #[test]
    fn wallet_id_format() {
        let id = generate_wallet_id();
        assert!(id.starts_with("WPQ"));
        // Prefix + 13-digit millis + 4-digit suffix.
        assert_eq!(id.len(), 3 + 13 + 4);
        assert!(id[3..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn wallet_ids_are_unique_in_practice() {
        let a = generate_wallet_id();
        let b = generate_wallet_id();
        assert_ne!(a, b);
    }
}
