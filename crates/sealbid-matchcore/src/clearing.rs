//! Resumable uniform-price clearing.
//!
//! The walk pairs the best remaining bid against the best remaining ask and
//! fills whichever has less left, advancing that side's cursor. It stops
//! when the next order on the advancing side no longer crosses the current
//! order on the other side, or that side runs out.
//!
//! The clearing price is the limit of the last order filled on the side
//! that could not advance: the last ask when supply ran out or stopped
//! crossing, the last bid otherwise. At that price demand and supply both
//! cover the matched quantity, and the greedy walk matches the most
//! quantity any single price can.
//!
//! Each call visits at most `limit` nodes and persists both cursors and the
//! partial fills in [`ClearingState`], so a large book is cleared by many
//! small calls.

use sealbid_types::{AuctionError, ClearingState, Result, Side, fixed_point::fp32_to_decimal};

use crate::orderbook::{BookCursor, OrderBook};

/// What one clearing call achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearingProgress {
    pub nodes_visited: u16,
    pub found: bool,
}

/// Reject walks larger than the per-invocation budget.
pub fn check_node_budget(limit: u16, budget: u16) -> Result<()> {
    if limit > budget {
        return Err(AuctionError::SlabIteratorOverflow {
            requested: limit,
            budget,
        });
    }
    Ok(())
}

fn remaining(quantity: u64, filled: u64) -> Result<u64> {
    quantity
        .checked_sub(filled)
        .ok_or(AuctionError::NumericalOverflow)
}

fn add(a: u64, b: u64) -> Result<u64> {
    a.checked_add(b).ok_or(AuctionError::NumericalOverflow)
}

fn conclude(state: &mut ClearingState, price: u64) {
    state.has_found_clearing_price = true;
    state.clearing_price = price;
    state.total_quantity_matched = state.total_quantity_filled_so_far;
    state.remaining_bid_fills = state.total_quantity_filled_so_far;
    state.remaining_ask_fills = state.total_quantity_filled_so_far;
    tracing::info!(
        clearing_price = %fp32_to_decimal(price),
        matched = state.total_quantity_matched,
        "Clearing price found"
    );
}

/// Advance the clearing walk by at most `limit` nodes.
pub fn calculate_clearing_price(
    state: &mut ClearingState,
    book: &OrderBook,
    limit: u16,
) -> Result<ClearingProgress> {
    if state.has_found_clearing_price {
        return Err(AuctionError::ClearingPriceAlreadyFound);
    }

    let fresh = state.current_bid_key.is_none() && state.current_ask_key.is_none();
    let mut bids = BookCursor::resume(Side::Bid, state.current_bid_key);
    let mut asks = BookCursor::resume(Side::Ask, state.current_ask_key);
    let mut bid = bids.current(book)?.ok_or(AuctionError::NoBidOrders)?;
    let mut ask = asks.current(book)?.ok_or(AuctionError::NoAskOrders)?;

    if fresh && bid.price() < ask.price() {
        tracing::info!(
            best_bid = %fp32_to_decimal(bid.price()),
            best_ask = %fp32_to_decimal(ask.price()),
            "Book does not cross"
        );
        conclude(state, 0);
        return Ok(ClearingProgress {
            nodes_visited: 0,
            found: true,
        });
    }

    let mut visited: u16 = 0;
    while visited < limit {
        let bid_left = remaining(bid.base_quantity, state.current_bid_quantity_filled)?;
        let ask_left = remaining(ask.base_quantity, state.current_ask_quantity_filled)?;
        visited += 1;

        if bid_left >= ask_left {
            // ask fully filled
            state.total_quantity_filled_so_far = add(state.total_quantity_filled_so_far, ask_left)?;
            state.current_bid_quantity_filled = add(state.current_bid_quantity_filled, ask_left)?;
            state.current_ask_quantity_filled = 0;
            match asks.advance(book) {
                Some(next) if next.price() <= bid.price() => ask = next,
                _ => {
                    conclude(state, ask.price());
                    break;
                }
            }
        } else {
            // bid fully filled
            state.total_quantity_filled_so_far = add(state.total_quantity_filled_so_far, bid_left)?;
            state.current_ask_quantity_filled = add(state.current_ask_quantity_filled, bid_left)?;
            state.current_bid_quantity_filled = 0;
            match bids.advance(book) {
                Some(next) if next.price() >= ask.price() => bid = next,
                _ => {
                    conclude(state, bid.price());
                    break;
                }
            }
        }
    }

    state.current_bid_key = Some(bid.key);
    state.current_ask_key = Some(ask.key);
    tracing::debug!(
        visited,
        filled_so_far = state.total_quantity_filled_so_far,
        found = state.has_found_clearing_price,
        "Clearing walk step"
    );
    Ok(ClearingProgress {
        nodes_visited: visited,
        found: state.has_found_clearing_price,
    })
}
