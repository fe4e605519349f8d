//! Configuration for auction accounts created by the ledger facade.

use serde::{Deserialize, Serialize};

use crate::constants;

/// Capacities of the fixed-size accounts behind one auction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuctionConfig {
    pub event_queue_capacity: usize,
    pub book_side_capacity: usize,
    /// Largest `limit` accepted by a clearing or matching call.
    pub max_nodes_per_invocation: u16,
}

impl Default for AuctionConfig {
    fn default() -> Self {
        Self {
            event_queue_capacity: constants::DEFAULT_EVENT_QUEUE_CAPACITY,
            book_side_capacity: constants::DEFAULT_BOOK_SIDE_CAPACITY,
            max_nodes_per_invocation: constants::DEFAULT_MAX_NODES_PER_INVOCATION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: AuctionConfig = serde_json::from_str(r#"{"event_queue_capacity": 8}"#).unwrap();
        assert_eq!(cfg.event_queue_capacity, 8);
        assert_eq!(cfg.book_side_capacity, constants::DEFAULT_BOOK_SIDE_CAPACITY);
    }
}
