//! Order model: sides, book keys and sealed orders.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Result, constants::NONCE_LEN, fixed_point};

/// Which side of the book an account or order is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Bid => Self::Ask,
            Self::Ask => Self::Bid,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bid => write!(f, "BID"),
            Self::Ask => write!(f, "ASK"),
        }
    }
}

// ---------------------------------------------------------------------------
// OrderKey
// ---------------------------------------------------------------------------

/// 128-bit book key: limit price in the high 64 bits, insertion sequence in
/// the low 64 bits.
///
/// Asks walk keys ascending and bids descending. Bid sequences are stored
/// inverted so that, within one price, the earlier order still comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OrderKey(pub u128);

impl OrderKey {
    #[must_use]
    pub fn new(side: Side, price: u64, sequence: u64) -> Self {
        let low = match side {
            Side::Bid => !sequence,
            Side::Ask => sequence,
        };
        Self((u128::from(price) << 64) | u128::from(low))
    }

    /// Fixed-point limit price.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn price(&self) -> u64 {
        (self.0 >> 64) as u64
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#034x}", self.0)
    }
}

/// Collateral an order of `base_qty` at `price` locks: the base itself for
/// an ask, `ceil(base_qty * price)` quote for a bid.
pub fn order_collateral(side: Side, base_qty: u64, price: u64) -> Result<u64> {
    match side {
        Side::Ask => Ok(base_qty),
        Side::Bid => fixed_point::fp32_mul_ceil(base_qty, price),
    }
}

// ---------------------------------------------------------------------------
// EncryptedOrder
// ---------------------------------------------------------------------------

/// A sealed order parked on an OpenOrders account until reveal.
///
/// `token_qty` is the collateral deposited alongside it, in the asset the
/// side pays with (base for asks, quote for bids). It stays in the clear so
/// solvency can be checked without decrypting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedOrder {
    pub nonce: [u8; NONCE_LEN],
    pub cipher_text: Vec<u8>,
    pub token_qty: u64,
}

impl EncryptedOrder {
    /// Same envelope, regardless of the collateral attached.
    #[must_use]
    pub fn same_envelope(&self, nonce: &[u8; NONCE_LEN], cipher_text: &[u8]) -> bool {
        self.nonce == *nonce && self.cipher_text == cipher_text
    }
}
