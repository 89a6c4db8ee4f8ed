//! SHA-512 digests.
//!
//! The attestation digest is SHA-512 over the canonical JSON form of the
//! sensor data, and it travels hex-encoded. These two helpers are the only
//! place in the crate that touches the hasher directly.

use sha2::{Digest, Sha512};

/// Computes the raw SHA-512 digest of `data`.
pub fn sha512(data: &[u8]) -> [u8; 64] {
    let mut hasher = Sha512::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Computes the SHA-512 digest of `data` and returns it as a lowercase hex
/// string (128 characters).
pub fn sha512_hex(data: &[u8]) -> String {
    hex::encode(sha512(data))
}
