//! Settle-and-close and auction teardown.

use sealbid_ingress::guards;
use sealbid_matchcore::Market;
use sealbid_types::{
    Address, Auction, AuctionError, Custody, OpenOrders, OrderHistory, Result,
};
use serde::{Deserialize, Serialize};

/// Tokens paid out to the owner when an account is closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub quote: u64,
    pub base: u64,
}

/// Whether `open_orders` has nothing left in flight.
pub fn require_settleable(open_orders: &OpenOrders) -> Result<()> {
    if !open_orders.orders.is_empty() || open_orders.has_sealed_orders() {
        return Err(AuctionError::OpenOrdersHasOpenOrders);
    }
    if open_orders.quote.locked != 0 || open_orders.base.locked != 0 {
        return Err(AuctionError::OpenOrdersHasLockedTokens);
    }
    Ok(())
}

/// Record the user's outcome and pay out every free balance.
///
/// The caller drops the OpenOrders account afterwards; the history stays.
/// Anyone may call this: tokens only ever go to `open_orders.authority`.
pub fn settle_and_close(
    auction: &Auction,
    open_orders: &mut OpenOrders,
    history: &mut OrderHistory,
    custody: &mut impl Custody,
) -> Result<Payout> {
    require_settleable(open_orders)?;
    history.record_settlement(open_orders, auction.clearing.clearing_price)?;

    let payout = Payout {
        quote: open_orders.quote.free,
        base: open_orders.base.free,
    };
    open_orders.quote.free = 0;
    open_orders.base.free = 0;
    let owner = open_orders.authority;
    if payout.quote > 0 {
        custody.withdraw_from_vault(&auction.quote_vault, &auction.quote_mint, &owner, payout.quote)?;
    }
    if payout.base > 0 {
        custody.withdraw_from_vault(&auction.base_vault, &auction.base_mint, &owner, payout.base)?;
    }

    tracing::info!(
        user = %owner,
        side = %history.side,
        quote = payout.quote,
        base = payout.base,
        "Open orders settled"
    );
    Ok(payout)
}

/// Check that the book and queue of a finished auction may be released.
pub fn close_auction_accounts(market: &Market, signer: &Address, now: i64) -> Result<()> {
    guards::require_authority(&market.auction, signer)?;
    guards::require_settlement_phase(&market.auction, now)?;
    if !market.book.is_empty() {
        return Err(AuctionError::OrderBookNotEmpty);
    }
    if !market.event_queue.is_empty() {
        return Err(AuctionError::EventQueueNotEmpty);
    }
    tracing::info!(auction = %market.auction.auction_id, "Auction accounts closed");
    Ok(())
}
