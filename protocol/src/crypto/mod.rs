//! # Cryptographic Primitives for WavePay
//!
//! Every signing operation, every digest, every base64-encoded key flows
//! through here. We deliberately chose boring, well-audited cryptography:
//!
//! - **Ed25519** for signatures — fast, deterministic, and nobody has broken it.
//! - **SHA-512** for attestation digests — the wire contract with every
//!   deployed MobilePOS client, so it is not up for debate.
//! - **Canonical JSON** for anything that gets hashed or signed — sorted keys,
//!   compact separators, no exceptions. A single reordered key silently
//!   invalidates every signature in the system.
//!
//! Everything here is a thin, type-safe wrapper around audited
//! implementations. If you're tempted to optimize these functions, please
//! reconsider. Then reconsider again.

pub mod canonical;
pub mod hash;
pub mod keys;

// Re-export the things people actually need so they don't have to memorize
// our module hierarchy.
pub use canonical::canonical_json;
pub use hash::{sha512, sha512_hex};
pub use keys::{
    generate_wallet_id, random_suffixed_id, KeyError, WalletKeypair, WalletPublicKey,
    WalletSignature,
};
