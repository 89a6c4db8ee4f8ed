//! # Protocol Configuration & Constants
//!
//! Every magic number in WavePay lives here. If you're hardcoding a constant
//! somewhere else, you're doing it wrong and you owe the team coffee.
//!
//! Wallet and transaction id prefixes are part of the wire contract with the
//! MobilePOS clients — changing them orphans every id already issued, so
//! treat them as frozen.

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Prefix for wallet identifiers. Full format: `WPQ{unix_millis}{4-digit random}`.
pub const WALLET_ID_PREFIX: &str = "WPQ";

/// Prefix for transaction identifiers. Full format: `TX{unix_millis}{4-digit random}`.
pub const TRANSACTION_ID_PREFIX: &str = "TX";

/// Prefix for the `local_id` of the POS sale record that mirrors a completed
/// wallet transfer. Full format: `wavepay_{transaction_id}`.
pub const LINKED_SALE_LOCAL_ID_PREFIX: &str = "wavepay_";

/// Product name recorded on the POS side of a wallet transfer.
pub const LINKED_SALE_PRODUCT_NAME: &str = "WavePay Payment";

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// Ed25519 — deterministic signatures, 128-bit security, no k-value footguns.
pub const SIGNING_ALGORITHM: &str = "Ed25519";

/// Ed25519 secret keys are 32 bytes.
pub const SIGNING_KEY_LENGTH: usize = 32;

/// Ed25519 public (verifying) keys are 32 bytes.
pub const VERIFYING_KEY_LENGTH: usize = 32;

/// Ed25519 signatures are 64 bytes. If yours isn't, something has gone
/// terribly wrong.
pub const SIGNATURE_LENGTH: usize = 64;

/// Hash function for attestation digests. SHA-512 over the canonical JSON
/// form of the attestation data; the digest travels hex-encoded.
pub const ATTESTATION_HASH_FUNCTION: &str = "SHA-512";

/// SHA-512 digest length in bytes (128 hex characters on the wire).
pub const ATTESTATION_DIGEST_LENGTH: usize = 64;

// ---------------------------------------------------------------------------
// Monetary Parameters
// ---------------------------------------------------------------------------

/// Decimal places carried by every amount. All arithmetic happens on integer
/// minor units (cents); the wire form is a decimal string like `"30.00"`.
pub const AMOUNT_DECIMALS: u32 = 2;

/// Minor units per whole currency unit (`10^AMOUNT_DECIMALS`).
pub const AMOUNT_SCALE: u64 = 100;

/// Currency assumed when a request omits one.
pub const DEFAULT_CURRENCY: &str = "CAD";
