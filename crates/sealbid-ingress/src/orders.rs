//! Account opening and plain (unsealed) order entry.
//!
//! Plain orders are post-only: they rest in the book at their limit and
//! never cross on entry. Their collateral is taken from the user's wallet
//! into the auction vault and locked on the OpenOrders account.

use sealbid_matchcore::Market;
use sealbid_types::{
    Address, Auction, AuctionError, AuctionPhase, Custody, OpenOrders, OrderHistory, OrderKey,
    Result, Side, order_collateral,
};

use crate::guards;

/// Open a position on one side of an auction, plus its order history.
pub fn init_open_orders(
    auction: &Auction,
    user: Address,
    side: Side,
    max_orders: u8,
    now: i64,
) -> Result<(OpenOrders, OrderHistory)> {
    guards::require_open_orders_window(auction, now)?;
    let this_auction = auction.this_address();
    let open_orders = OpenOrders::new(user, this_auction, side, max_orders)?;
    let history = OrderHistory::new(user, this_auction, side);
    tracing::debug!(user = %user, side = %side, max_orders, "Opened open orders");
    Ok((open_orders, history))
}

/// Check the order shape shared by plain and revealed orders.
pub(crate) fn validate_order(auction: &Auction, limit_price: u64, base_qty: u64) -> Result<()> {
    if limit_price % auction.tick_size != 0 {
        return Err(AuctionError::LimitPriceNotAMultipleOfTickSize { limit_price });
    }
    if base_qty < auction.min_base_order_size {
        return Err(AuctionError::OrderBelowMinBaseOrderSize {
            size: base_qty,
            min: auction.min_base_order_size,
        });
    }
    Ok(())
}

/// Place a plain order of `max_base_qty` at fixed-point `limit_price`.
pub fn new_order(
    market: &mut Market,
    open_orders: &mut OpenOrders,
    custody: &mut impl Custody,
    now: i64,
    limit_price: u64,
    max_base_qty: u64,
) -> Result<OrderKey> {
    let side = open_orders.side;
    guards::require_order_phase(&market.auction, now)?;
    guards::require_plain_side(&market.auction, side)?;
    if !open_orders.has_space() {
        return Err(AuctionError::TooManyOrders);
    }
    validate_order(&market.auction, limit_price, max_base_qty)?;

    let collateral = order_collateral(side, max_base_qty, limit_price)?;
    let (mint, vault) = market.auction.collateral_accounts(side);
    let key = market.rest_order(side, open_orders.this_open_orders, limit_price, max_base_qty)?;
    custody.deposit_to_vault(&open_orders.authority, &mint, &vault, collateral)?;
    open_orders.collateral_mut().deposit_locked(collateral)?;
    open_orders.orders.push(key);

    tracing::debug!(
        user = %open_orders.authority,
        side = %side,
        key = %key,
        qty = max_base_qty,
        collateral,
        "Plain order placed"
    );
    Ok(key)
}

/// An auction with one side empty can never clear; its resting orders may
/// then be cancelled so their collateral is not stranded.
fn cancellable_after_order_phase(market: &Market, side: Side, now: i64) -> bool {
    matches!(market.auction.phase(now), AuctionPhase::Clearing { .. })
        && market.book.len(side.opposite()) == 0
}

/// Pull a revealed order from the book and release its exact lock to free.
pub fn cancel_order(
    market: &mut Market,
    open_orders: &mut OpenOrders,
    now: i64,
    key: OrderKey,
) -> Result<()> {
    let side = open_orders.side;
    if !cancellable_after_order_phase(market, side, now) {
        guards::require_order_phase(&market.auction, now)?;
    }
    let idx = open_orders.find_order_index(key)?;
    let node = market.pull_order(side, key)?;
    let collateral = order_collateral(side, node.base_quantity, key.price())?;
    open_orders.orders.remove(idx);
    open_orders.collateral_mut().unlock(collateral)?;

    tracing::debug!(user = %open_orders.authority, key = %key, collateral, "Order cancelled");
    Ok(())
}
