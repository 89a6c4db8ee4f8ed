//! Wallet records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::WalletPublicKey;
use crate::transaction::types::{Amount, Currency};

/// A wallet as the ledger stores it.
///
/// Note what's *not* here: the private key. The server keeps only the public
/// half; the secret is handed to the client once at creation and has no
/// persisted field anywhere. Balance is mutated exclusively by the ledger
/// engine's transaction application and never goes negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub wallet_id: String,
    pub public_key: WalletPublicKey,
    pub balance: Amount,
    pub currency: Currency,
    pub created_at: DateTime<Utc>,
    /// Last time this wallet was touched by a sync or transfer.
    pub last_sync: DateTime<Utc>,
}

impl Wallet {
    pub fn new(
        wallet_id: String,
        public_key: WalletPublicKey,
        balance: Amount,
        currency: Currency,
    ) -> Self {
        let now = Utc::now();
        Wallet {
            wallet_id,
            public_key,
            balance,
            currency,
            created_at: now,
            last_sync: now,
        }
    }
}
