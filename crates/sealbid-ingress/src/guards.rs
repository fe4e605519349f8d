//! Phase and side guards.
//!
//! Every operation calls exactly one phase guard before touching state.
//! Guards never no-op: a call in the wrong phase fails with the error the
//! crank orchestrator uses to decide whether to stop, wait or give up.

use sealbid_types::{Address, Auction, AuctionError, AuctionPhase, OpenOrders, Result, Side};

/// Order entry and plain-order cancellation.
pub fn require_order_phase(auction: &Auction, now: i64) -> Result<()> {
    match auction.phase(now) {
        AuctionPhase::Ordering => Ok(()),
        AuctionPhase::Pending => Err(AuctionError::OrderPhaseHasNotStarted),
        _ => Err(AuctionError::OrderPhaseIsOver),
    }
}

/// Opening an account is only meaningful while orders can still be placed.
pub fn require_open_orders_window(auction: &Auction, now: i64) -> Result<()> {
    match auction.phase(now) {
        AuctionPhase::Ordering => Ok(()),
        _ => Err(AuctionError::OrderPhaseNotActive),
    }
}

/// Sealed orders can be withdrawn from the start of the order phase on.
pub fn require_sealed_withdrawal_window(auction: &Auction, now: i64) -> Result<()> {
    match auction.phase(now) {
        AuctionPhase::Pending => Err(AuctionError::OrderPhaseHasNotStarted),
        _ => Ok(()),
    }
}

pub fn require_decryption_phase(auction: &Auction, now: i64) -> Result<()> {
    match auction.phase(now) {
        AuctionPhase::Decryption => Ok(()),
        AuctionPhase::Pending | AuctionPhase::Ordering => {
            Err(AuctionError::DecryptionPhaseHasNotStarted)
        }
        _ => Err(AuctionError::DecryptionPhaseHasEnded),
    }
}

pub fn require_clearing_phase(auction: &Auction, now: i64) -> Result<()> {
    match auction.phase(now) {
        AuctionPhase::Clearing { .. } => Ok(()),
        AuctionPhase::Matching { .. } | AuctionPhase::Settlement => {
            Err(AuctionError::ClearingPriceAlreadyFound)
        }
        _ => Err(AuctionError::CalcClearingPricePhaseNotActive),
    }
}

pub fn require_matching_phase(auction: &Auction, now: i64) -> Result<()> {
    match auction.phase(now) {
        AuctionPhase::Matching { .. } => Ok(()),
        AuctionPhase::Settlement => Err(AuctionError::MatchOrdersPhaseNotActive),
        _ => Err(AuctionError::NoClearingPriceYet),
    }
}

pub fn require_settlement_phase(auction: &Auction, now: i64) -> Result<()> {
    match auction.phase(now) {
        AuctionPhase::Settlement => Ok(()),
        _ => Err(AuctionError::AuctionNotFinished),
    }
}

pub fn require_plain_side(auction: &Auction, side: Side) -> Result<()> {
    if auction.is_side_encrypted(side) {
        return Err(AuctionError::EncryptedOrdersOnlyOnThisSide);
    }
    Ok(())
}

pub fn require_sealed_side(auction: &Auction, side: Side) -> Result<()> {
    if !auction.is_side_encrypted(side) {
        return Err(AuctionError::UnencryptedOrdersOnlyOnThisSide);
    }
    Ok(())
}

pub fn require_owner(open_orders: &OpenOrders, signer: &Address) -> Result<()> {
    if open_orders.authority != *signer {
        return Err(AuctionError::Unauthorized);
    }
    Ok(())
}

pub fn require_authority(auction: &Auction, signer: &Address) -> Result<()> {
    if auction.authority != *signer {
        return Err(AuctionError::Unauthorized);
    }
    Ok(())
}
