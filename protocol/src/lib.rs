// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # WavePay — Core Library
//!
//! WavePay is the peer-to-peer wallet subsystem behind MobilePOS: value moves
//! between wallets through cryptographically signed, sensor-attested
//! transactions, and every sale the register rings up lands in the same
//! ledger — online or offline.
//!
//! The design is deliberately boring where it counts: Ed25519 for signatures,
//! SHA-512 over a canonical JSON form for attestation digests, integer minor
//! units for money, and a single-writer ledger commit so a transfer either
//! happens completely or not at all.
//!
//! ## Architecture
//!
//! The crate is split into modules that mirror the actual concerns of the
//! payment flow:
//!
//! - **crypto** — Keypairs, canonical serialization, hashing. Don't roll your own.
//! - **attestation** — The "physics signature": a digest binding sensor context
//!   into every transfer as tamper-evidence.
//! - **transaction** — Payload construction, signing, and verification.
//! - **ledger** — Wallet balances and the transaction engine. Where money moves.
//! - **sales** — POS sale records and offline-sync reconciliation.
//! - **config** — Protocol constants. Every magic number lives there.
//!
//! ## Design Philosophy
//!
//! 1. Correctness over performance — this ledger moves money.
//! 2. Verification failures are normal outcomes, not panics.
//! 3. A private key is returned exactly once, at wallet creation, and never
//!    persisted server-side. The API shape enforces this, not convention.
//! 4. If it touches a balance, it has tests. Plural.

pub mod attestation;
pub mod config;
pub mod crypto;
pub mod ledger;
pub mod sales;
pub mod transaction;
