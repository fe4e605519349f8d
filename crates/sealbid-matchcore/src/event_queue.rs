//! Bounded FIFO of Fill/Out events.
//!
//! Matching pushes at the tail, the consumer peeks and pops at the head.
//! `head_seq` counts every event ever popped, so two callers that read the
//! queue at different times can tell whether it moved in between.

use std::collections::VecDeque;

use sealbid_types::{AuctionError, Event, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventQueue {
    capacity: usize,
    head_seq: u64,
    events: VecDeque<Event>,
}

impl EventQueue {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            head_seq: 0,
            events: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, event: Event) -> Result<()> {
        if self.events.len() >= self.capacity {
            return Err(AuctionError::AobEventQueueFull);
        }
        self.events.push_back(event);
        Ok(())
    }

    #[must_use]
    pub fn free_slots(&self) -> usize {
        self.capacity.saturating_sub(self.events.len())
    }

    /// Up to `limit` events from the head, oldest first.
    pub fn peek(&self, limit: usize) -> impl Iterator<Item = &Event> {
        self.events.iter().take(limit)
    }

    /// Drop `n` events from the head.
    pub fn pop_n(&mut self, n: usize) {
        let n = n.min(self.events.len());
        self.events.drain(..n);
        self.head_seq += n as u64;
    }

    #[must_use]
    pub fn head_seq(&self) -> u64 {
        self.head_seq
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use sealbid_types::{Address, OrderKey, Side};

    use super::*;

    fn out(qty: u64) -> Event {
        Event::Out {
            side: Side::Ask,
            order_key: OrderKey(u128::from(qty)),
            owner: Address::ZERO,
            base_size: qty,
            released: qty,
        }
    }

    #[test]
    fn push_until_full() {
        let mut q = EventQueue::new(2);
        q.push(out(1)).unwrap();
        q.push(out(2)).unwrap();
        assert_eq!(q.free_slots(), 0);
        assert_eq!(q.push(out(3)), Err(AuctionError::AobEventQueueFull));
    }

    #[test]
    fn peek_then_pop_is_fifo() {
        let mut q = EventQueue::new(8);
        for i in 1..=3 {
            q.push(out(i)).unwrap();
        }
        let head: Vec<Event> = q.peek(2).copied().collect();
        assert_eq!(head, vec![out(1), out(2)]);
        q.pop_n(2);
        assert_eq!(q.head_seq(), 2);
        assert_eq!(q.peek(10).copied().collect::<Vec<_>>(), vec![out(3)]);
        q.pop_n(5);
        assert!(q.is_empty());
        assert_eq!(q.head_seq(), 3);
    }
}
