//! Bounded matching at the clearing price.
//!
//! Bids are drained first, then asks, each best-first. Every resting order
//! gets one Fill for the part of it that trades (if any) followed by one
//! Out that releases whatever collateral it no longer needs. The book is
//! emptied completely, so unmatched orders are refunded the same way.
//!
//! Bidders pay `ceil(fill * clearing_price)` and sellers receive
//! `floor(fill * clearing_price)`, so the quote vault never comes up short
//! of what it owes.

use sealbid_types::{
    Auction, AuctionError, Event, Result, Side,
    fixed_point::{fp32_mul, fp32_mul_ceil},
    order_collateral,
};

use crate::{event_queue::EventQueue, orderbook::OrderBook};

/// What one matching call achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchProgress {
    pub nodes_matched: u16,
    pub events_pushed: usize,
    /// The book is empty and both fill counters reached zero.
    pub complete: bool,
}

fn is_done(auction: &Auction, book: &OrderBook) -> bool {
    auction.clearing.remaining_bid_fills == 0
        && auction.clearing.remaining_ask_fills == 0
        && book.is_empty()
}

/// Take up to `limit` orders out of the book, pushing their events.
///
/// Stops early, without error, when the queue cannot hold the two events of
/// the next order; errors with `AobEventQueueFull` only if not even the
/// first order fits.
pub fn match_orders(
    auction: &mut Auction,
    book: &mut OrderBook,
    queue: &mut EventQueue,
    limit: u16,
) -> Result<MatchProgress> {
    if !auction.clearing.has_found_clearing_price {
        return Err(AuctionError::NoClearingPriceYet);
    }
    if is_done(auction, book) {
        return Err(AuctionError::MatchOrdersPhaseNotActive);
    }

    let price = auction.clearing.clearing_price;
    let mut matched: u16 = 0;
    let mut pushed = 0;

    'sides: for side in [Side::Bid, Side::Ask] {
        while matched < limit {
            let Some(node) = book.best(side).copied() else {
                continue 'sides;
            };
            if queue.free_slots() < 2 {
                if matched == 0 {
                    return Err(AuctionError::AobEventQueueFull);
                }
                break 'sides;
            }

            let remaining = auction.clearing.remaining_fills(side);
            let fill = node.base_quantity.min(remaining);
            let paid = match side {
                Side::Bid => fp32_mul_ceil(fill, price)?,
                Side::Ask => fp32_mul(fill, price)?,
            };
            let unfilled = node.base_quantity - fill;
            let released = match side {
                Side::Ask => unfilled,
                Side::Bid => order_collateral(side, node.base_quantity, node.price())?
                    .checked_sub(paid)
                    .ok_or(AuctionError::NumericalOverflow)?,
            };
            let resting = auction.resting_orders.checked_sub(1).ok_or_else(|| {
                AuctionError::Internal("resting order count out of sync with book".into())
            })?;

            if fill > 0 {
                queue.push(Event::Fill {
                    side,
                    order_key: node.key,
                    owner: node.owner,
                    price,
                    quote_size: paid,
                    base_size: fill,
                })?;
                pushed += 1;
            }
            queue.push(Event::Out {
                side,
                order_key: node.key,
                owner: node.owner,
                base_size: unfilled,
                released,
            })?;
            pushed += 1;

            book.remove(side, node.key)?;
            *auction.clearing.remaining_fills_mut(side) = remaining - fill;
            auction.resting_orders = resting;
            matched += 1;
        }
    }

    if book.is_empty()
        && (auction.clearing.remaining_bid_fills > 0 || auction.clearing.remaining_ask_fills > 0)
    {
        return Err(AuctionError::Internal(format!(
            "book drained with {} bid / {} ask fills outstanding",
            auction.clearing.remaining_bid_fills, auction.clearing.remaining_ask_fills
        )));
    }

    let complete = is_done(auction, book);
    tracing::debug!(matched, pushed, complete, "Matching step");
    if complete {
        tracing::info!(
            total_matched = auction.clearing.total_quantity_matched,
            "Matching complete"
        );
    }
    Ok(MatchProgress {
        nodes_matched: matched,
        events_pushed: pushed,
        complete,
    })
}
