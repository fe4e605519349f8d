//! Events emitted by matching and drained by the consumer.

use serde::{Deserialize, Serialize};

use crate::{Address, OrderKey, Side};

/// One entry of the event queue. `owner` is the OpenOrders address that
/// must be credited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// `base_size` traded at `price` for `quote_size`.
    Fill {
        side: Side,
        order_key: OrderKey,
        owner: Address,
        price: u64,
        quote_size: u64,
        base_size: u64,
    },
    /// The order left the book. `released` collateral goes from locked to
    /// free: the unfilled base for an ask, the unspent quote for a bid.
    Out {
        side: Side,
        order_key: OrderKey,
        owner: Address,
        base_size: u64,
        released: u64,
    },
}

impl Event {
    #[must_use]
    pub fn owner(&self) -> Address {
        match self {
            Self::Fill { owner, .. } | Self::Out { owner, .. } => *owner,
        }
    }

    #[must_use]
    pub fn side(&self) -> Side {
        match self {
            Self::Fill { side, .. } | Self::Out { side, .. } => *side,
        }
    }

    #[must_use]
    pub fn order_key(&self) -> OrderKey {
        match self {
            Self::Fill { order_key, .. } | Self::Out { order_key, .. } => *order_key,
        }
    }
}
