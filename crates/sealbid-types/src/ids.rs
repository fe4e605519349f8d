//! Identifiers used throughout sealbid.
//!
//! Every account lives at a 32-byte [`Address`]. Program-owned accounts
//! (auctions, vaults, open orders) derive theirs from seeds, so any caller
//! can recompute them without a lookup.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{AuctionError, Result, constants::AUCTION_ID_LEN};

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 32-byte account address. Users, mints and program accounts share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Address(pub [u8; 32]);

impl Address {
    pub const ZERO: Self = Self([0u8; 32]);

    /// Derive a program address from an ordered list of seeds.
    #[must_use]
    pub fn derive(seeds: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"sealbid:address:v1:");
        for seed in seeds {
            hasher.update((seed.len() as u64).to_le_bytes());
            hasher.update(seed);
        }
        Self(hasher.finalize().into())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Short hex prefix for log lines.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Random address for tests.
    #[cfg(any(test, feature = "test-helpers"))]
    #[must_use]
    pub fn new_unique() -> Self {
        Self(rand::random())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0[..8]))
    }
}

// ---------------------------------------------------------------------------
// AuctionId
// ---------------------------------------------------------------------------

/// Human-chosen auction identifier, at most 10 bytes, zero padded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuctionId([u8; AUCTION_ID_LEN]);

impl AuctionId {
    pub fn new(id: &str) -> Result<Self> {
        if id.is_empty() {
            return Err(AuctionError::InvalidAuctionId {
                reason: "empty".into(),
            });
        }
        if id.len() > AUCTION_ID_LEN {
            return Err(AuctionError::InvalidAuctionId {
                reason: format!("{} bytes, max {AUCTION_ID_LEN}", id.len()),
            });
        }
        let mut bytes = [0u8; AUCTION_ID_LEN];
        bytes[..id.len()].copy_from_slice(id.as_bytes());
        Ok(Self(bytes))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; AUCTION_ID_LEN] {
        &self.0
    }
}

impl fmt::Display for AuctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = self.0.iter().position(|b| *b == 0).unwrap_or(AUCTION_ID_LEN);
        write!(f, "{}", String::from_utf8_lossy(&self.0[..end]))
    }
}

// ---------------------------------------------------------------------------
// EncryptionPubkey
// ---------------------------------------------------------------------------

/// An x25519 public key as stored on accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct EncryptionPubkey(pub [u8; 32]);

impl EncryptionPubkey {
    /// An account that has not submitted a sealed order yet holds the zero key.
    #[must_use]
    pub fn is_unset(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for EncryptionPubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x25519:{}", hex::encode(&self.0[..8]))
    }
}
