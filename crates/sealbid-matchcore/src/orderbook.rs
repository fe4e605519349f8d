//! The order book for a single auction.
//!
//! Each side is a `BTreeMap<OrderKey, LeafNode>`. Keys carry the price in
//! their high bits, so:
//! - **Asks** are walked ascending: lowest price first, earliest first
//! - **Bids** are walked descending: highest price first, earliest first
//!
//! Walks are driven by a [`BookCursor`], which is nothing but a side and
//! the last key visited. It can be persisted between invocations and
//! resumed against the same book later.

use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};

use sealbid_types::{Address, AuctionError, OrderKey, Result, Side};
use serde::{Deserialize, Serialize};

/// One resting order as the book sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafNode {
    pub key: OrderKey,
    /// OpenOrders address credited by events for this order.
    pub owner: Address,
    pub base_quantity: u64,
}

impl LeafNode {
    #[must_use]
    pub fn price(&self) -> u64 {
        self.key.price()
    }
}

/// The two sides of one auction's book.
#[derive(Debug, Clone)]
pub struct OrderBook {
    side_capacity: usize,
    bids: BTreeMap<OrderKey, LeafNode>,
    asks: BTreeMap<OrderKey, LeafNode>,
}

impl OrderBook {
    /// Create an empty book holding at most `side_capacity` orders per side.
    #[must_use]
    pub fn new(side_capacity: usize) -> Self {
        Self {
            side_capacity,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
        }
    }

    fn side(&self, side: Side) -> &BTreeMap<OrderKey, LeafNode> {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut BTreeMap<OrderKey, LeafNode> {
        match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        }
    }

    // =================================================================
    // Insertion / removal
    // =================================================================

    /// Rest a post-only order. Nothing ever crosses on insert.
    pub fn insert(&mut self, side: Side, key: OrderKey, owner: Address, base_quantity: u64) -> Result<()> {
        let capacity = self.side_capacity;
        let book = self.side_mut(side);
        if book.len() >= capacity {
            return Err(AuctionError::OrderBookFull);
        }
        if book.contains_key(&key) {
            return Err(AuctionError::Internal(format!("duplicate book key {key}")));
        }
        book.insert(
            key,
            LeafNode {
                key,
                owner,
                base_quantity,
            },
        );
        Ok(())
    }

    /// Remove a resting order and hand back its node.
    pub fn remove(&mut self, side: Side, key: OrderKey) -> Result<LeafNode> {
        self.side_mut(side)
            .remove(&key)
            .ok_or(AuctionError::NodeKeyNotFound { key: key.0 })
    }

    // =================================================================
    // Queries
    // =================================================================

    #[must_use]
    pub fn get(&self, side: Side, key: OrderKey) -> Option<&LeafNode> {
        self.side(side).get(&key)
    }

    /// Best order on a side: highest bid or lowest ask.
    #[must_use]
    pub fn best(&self, side: Side) -> Option<&LeafNode> {
        match side {
            Side::Bid => self.bids.values().next_back(),
            Side::Ask => self.asks.values().next(),
        }
    }

    /// The order that follows `key` in walk order.
    #[must_use]
    pub fn next_after(&self, side: Side, key: OrderKey) -> Option<&LeafNode> {
        match side {
            Side::Bid => self.bids.range(..key).next_back().map(|(_, n)| n),
            Side::Ask => self.asks.range((Excluded(key), Unbounded)).next().map(|(_, n)| n),
        }
    }

    #[must_use]
    pub fn len(&self, side: Side) -> usize {
        self.side(side).len()
    }

    /// How many more orders `side` can hold.
    #[must_use]
    pub fn free_space(&self, side: Side) -> usize {
        self.side_capacity.saturating_sub(self.len(side))
    }

    /// Total number of orders currently in the book.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.bids.len() + self.asks.len()
    }

    /// Returns `true` if the book has no orders on either side.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Orders of one side in walk order.
    pub fn walk(&self, side: Side) -> Box<dyn Iterator<Item = &LeafNode> + '_> {
        match side {
            Side::Bid => Box::new(self.bids.values().rev()),
            Side::Ask => Box::new(self.asks.values()),
        }
    }
}

// =================================================================
// Cursor
// =================================================================

/// A resumable position in one side's walk.
///
/// `position == None` means the walk has not started; the first call to
/// [`BookCursor::current`] lands on the best order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookCursor {
    pub side: Side,
    pub position: Option<OrderKey>,
}

impl BookCursor {
    #[must_use]
    pub fn resume(side: Side, position: Option<OrderKey>) -> Self {
        Self { side, position }
    }

    /// The node under the cursor, pinning the position on first use.
    ///
    /// A persisted position that no longer resolves is an error: the book
    /// changed under a walk that was supposed to own it.
    pub fn current<'b>(&mut self, book: &'b OrderBook) -> Result<Option<&'b LeafNode>> {
        match self.position {
            Some(key) => book
                .get(self.side, key)
                .map(Some)
                .ok_or(AuctionError::NodeKeyNotFound { key: key.0 }),
            None => {
                let best = book.best(self.side);
                self.position = best.map(|n| n.key);
                Ok(best)
            }
        }
    }

    /// Step to the next node. The position only moves if there is one.
    pub fn advance<'b>(&mut self, book: &'b OrderBook) -> Option<&'b LeafNode> {
        let next = match self.position {
            Some(key) => book.next_after(self.side, key),
            None => book.best(self.side),
        };
        if let Some(node) = next {
            self.position = Some(node.key);
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book_with(bids: &[(u64, u64)], asks: &[(u64, u64)]) -> OrderBook {
        let mut book = OrderBook::new(16);
        let mut seq = 0;
        for &(price, qty) in bids {
            book.insert(Side::Bid, OrderKey::new(Side::Bid, price, seq), Address::ZERO, qty)
                .unwrap();
            seq += 1;
        }
        for &(price, qty) in asks {
            book.insert(Side::Ask, OrderKey::new(Side::Ask, price, seq), Address::ZERO, qty)
                .unwrap();
            seq += 1;
        }
        book
    }

    #[test]
    fn best_orders() {
        let book = book_with(&[(100, 1), (99, 1)], &[(101, 1), (102, 1)]);
        assert_eq!(book.best(Side::Bid).unwrap().price(), 100);
        assert_eq!(book.best(Side::Ask).unwrap().price(), 101);
        assert_eq!(book.order_count(), 4);
    }

    #[test]
    fn walk_respects_price_time_priority() {
        let book = book_with(&[(10, 1), (10, 2), (12, 3)], &[(20, 1), (20, 2), (19, 3)]);
        let bids: Vec<u64> = book.walk(Side::Bid).map(|n| n.base_quantity).collect();
        assert_eq!(bids, vec![3, 1, 2]);
        let asks: Vec<u64> = book.walk(Side::Ask).map(|n| n.base_quantity).collect();
        assert_eq!(asks, vec![3, 1, 2]);
    }

    #[test]
    fn cursor_resumes_from_persisted_key() {
        let book = book_with(&[(12, 1), (11, 2), (10, 3)], &[]);
        let mut cursor = BookCursor::resume(Side::Bid, None);
        assert_eq!(cursor.current(&book).unwrap().unwrap().base_quantity, 1);
        assert_eq!(cursor.advance(&book).unwrap().base_quantity, 2);

        // persist, then pick the walk up again
        let json = serde_json::to_string(&cursor).unwrap();
        let mut resumed: BookCursor = serde_json::from_str(&json).unwrap();
        assert_eq!(resumed.current(&book).unwrap().unwrap().base_quantity, 2);
        assert_eq!(resumed.advance(&book).unwrap().base_quantity, 3);
        assert!(resumed.advance(&book).is_none());
        // stays on the last node
        assert_eq!(resumed.current(&book).unwrap().unwrap().base_quantity, 3);
    }

    #[test]
    fn stale_cursor_is_reported() {
        let mut book = book_with(&[], &[(5, 1)]);
        let key = book.best(Side::Ask).unwrap().key;
        let mut cursor = BookCursor::resume(Side::Ask, Some(key));
        book.remove(Side::Ask, key).unwrap();
        assert_eq!(
            cursor.current(&book),
            Err(AuctionError::NodeKeyNotFound { key: key.0 })
        );
    }

    #[test]
    fn capacity_is_enforced() {
        let mut book = OrderBook::new(1);
        book.insert(Side::Ask, OrderKey::new(Side::Ask, 1, 0), Address::ZERO, 1)
            .unwrap();
        assert_eq!(
            book.insert(Side::Ask, OrderKey::new(Side::Ask, 1, 1), Address::ZERO, 1),
            Err(AuctionError::OrderBookFull)
        );
        // the other side has its own capacity
        book.insert(Side::Bid, OrderKey::new(Side::Bid, 1, 2), Address::ZERO, 1)
            .unwrap();
    }

    #[test]
    fn remove_missing_key() {
        let mut book = OrderBook::new(4);
        assert!(matches!(
            book.remove(Side::Bid, OrderKey(1)),
            Err(AuctionError::NodeKeyNotFound { .. })
        ));
        assert!(book.is_empty());
    }
}
