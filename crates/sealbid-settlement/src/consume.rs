//! Event consumption.
//!
//! Drains Fill/Out events from the front of the queue and credits the
//! OpenOrders accounts they name. Every owner in the batch is resolved and
//! checked before any balance moves, and events are popped only after all
//! of them were applied.
//!
//! | Event | Ask account | Bid account |
//! |---|---|---|
//! | Fill | quote free += quote, base locked -= base | base free += base, quote locked -= quote |
//! | Out | base locked → free (`released`) | quote locked → free (`released`) |

use sealbid_matchcore::Market;
use sealbid_types::{Address, AuctionError, Event, OpenOrders, Result, Side};

fn position_of(accounts: &[OpenOrders], owner: Address) -> Result<usize> {
    accounts
        .iter()
        .position(|oo| oo.this_open_orders == owner)
        .ok_or(AuctionError::MissingOpenOrdersPubkeyInRemainingAccounts(owner))
}

fn apply(open_orders: &mut OpenOrders, event: &Event) -> Result<()> {
    match *event {
        Event::Fill {
            side,
            quote_size,
            base_size,
            ..
        } => match side {
            Side::Ask => {
                open_orders.base.spend_locked(base_size)?;
                open_orders.quote.credit_free(quote_size)
            }
            Side::Bid => {
                open_orders.quote.spend_locked(quote_size)?;
                open_orders.base.credit_free(base_size)
            }
        },
        Event::Out {
            order_key, released, ..
        } => {
            open_orders.collateral_mut().unlock(released)?;
            open_orders.remove_order(order_key)
        }
    }
}

/// Apply up to `limit` events to `accounts` and pop them.
///
/// Returns the number of events consumed. With nothing to consume the call
/// fails with `NoEventsProcessed` unless `allow_no_op` is set.
pub fn consume_events(
    market: &mut Market,
    accounts: &mut [OpenOrders],
    limit: u16,
    allow_no_op: bool,
) -> Result<usize> {
    let this_auction = market.auction.this_address();
    let batch: Vec<(usize, Event)> = market
        .event_queue
        .peek(usize::from(limit))
        .map(|event| {
            let idx = position_of(accounts, event.owner())?;
            let account = &accounts[idx];
            if account.auction != this_auction || account.side != event.side() {
                return Err(AuctionError::UserSideDiffFromEventSide);
            }
            Ok((idx, *event))
        })
        .collect::<Result<_>>()?;

    if batch.is_empty() && !allow_no_op {
        return Err(AuctionError::NoEventsProcessed);
    }
    for (idx, event) in &batch {
        apply(&mut accounts[*idx], event)?;
    }
    market.event_queue.pop_n(batch.len());

    tracing::debug!(
        consumed = batch.len(),
        remaining = market.event_queue.len(),
        head = market.event_queue.head_seq(),
        "Events consumed"
    );
    Ok(batch.len())
}

/// Distinct owners of the next `limit` events, in queue order.
#[must_use]
pub fn pending_owners(market: &Market, limit: u16) -> Vec<Address> {
    let mut owners: Vec<Address> = Vec::new();
    for event in market.event_queue.peek(usize::from(limit)) {
        if !owners.contains(&event.owner()) {
            owners.push(event.owner());
        }
    }
    owners
}
