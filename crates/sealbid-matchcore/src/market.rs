//! One auction together with the book and queue it owns.

use sealbid_types::{Address, Auction, AuctionConfig, AuctionError, OrderKey, Result, Side};

use crate::event_queue::EventQueue;
use crate::orderbook::{LeafNode, OrderBook};

#[derive(Debug, Clone)]
pub struct Market {
    pub auction: Auction,
    pub book: OrderBook,
    pub event_queue: EventQueue,
}

impl Market {
    #[must_use]
    pub fn new(auction: Auction, config: &AuctionConfig) -> Self {
        Self {
            auction,
            book: OrderBook::new(config.book_side_capacity),
            event_queue: EventQueue::new(config.event_queue_capacity),
        }
    }

    /// Rest a revealed order under a fresh key and count it.
    pub fn rest_order(
        &mut self,
        side: Side,
        owner: Address,
        price: u64,
        base_quantity: u64,
    ) -> Result<OrderKey> {
        let key = OrderKey::new(side, price, self.auction.next_sequence()?);
        self.book.insert(side, key, owner, base_quantity)?;
        self.auction.resting_orders = self
            .auction
            .resting_orders
            .checked_add(1)
            .ok_or(AuctionError::NumericalOverflow)?;
        Ok(key)
    }

    /// Take a resting order back out of the book.
    pub fn pull_order(&mut self, side: Side, key: OrderKey) -> Result<LeafNode> {
        let node = self.book.remove(side, key)?;
        self.auction.resting_orders = self.auction.resting_orders.saturating_sub(1);
        Ok(node)
    }
}
