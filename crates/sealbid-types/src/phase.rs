//! Auction phases.
//!
//! The phase is never stored. It is derived on every read from the three
//! phase timestamps, the ledger clock and the clearing counters:
//! **PENDING → ORDERING → DECRYPTION → CLEARING → MATCHING → SETTLEMENT**

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Auction, OrderKey};

/// Where an auction is in its lifecycle at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuctionPhase {
    /// Before `start_order_phase`.
    Pending,
    /// Plain and sealed orders may be placed and cancelled.
    Ordering,
    /// Sealed orders are revealed; sealed orders may still be withdrawn.
    Decryption,
    /// The clearing walk runs, resuming from the persisted cursors.
    Clearing {
        bid_cursor: Option<OrderKey>,
        ask_cursor: Option<OrderKey>,
    },
    /// Matched quantity or resting orders are still to be turned into events.
    Matching {
        remaining_bid_fills: u64,
        remaining_ask_fills: u64,
    },
    /// Everything matched and the book is drained.
    Settlement,
}

impl AuctionPhase {
    #[must_use]
    pub fn derive(auction: &Auction, now: i64) -> Self {
        let clearing = &auction.clearing;
        if now < auction.start_order_phase {
            Self::Pending
        } else if now < auction.end_order_phase {
            Self::Ordering
        } else if now < auction.end_decryption_phase {
            Self::Decryption
        } else if !clearing.has_found_clearing_price {
            Self::Clearing {
                bid_cursor: clearing.current_bid_key,
                ask_cursor: clearing.current_ask_key,
            }
        } else if clearing.remaining_bid_fills > 0
            || clearing.remaining_ask_fills > 0
            || auction.resting_orders > 0
        {
            Self::Matching {
                remaining_bid_fills: clearing.remaining_bid_fills,
                remaining_ask_fills: clearing.remaining_ask_fills,
            }
        } else {
            Self::Settlement
        }
    }

    #[must_use]
    pub fn is_clearing(&self) -> bool {
        matches!(self, Self::Clearing { .. })
    }

    #[must_use]
    pub fn is_matching(&self) -> bool {
        matches!(self, Self::Matching { .. })
    }
}

impl fmt::Display for AuctionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Ordering => write!(f, "ORDERING"),
            Self::Decryption => write!(f, "DECRYPTION"),
            Self::Clearing { .. } => write!(f, "CLEARING"),
            Self::Matching { .. } => write!(f, "MATCHING"),
            Self::Settlement => write!(f, "SETTLEMENT"),
        }
    }
}

impl Auction {
    /// Phase at ledger time `now`.
    #[must_use]
    pub fn phase(&self, now: i64) -> AuctionPhase {
        AuctionPhase::derive(self, now)
    }
}
