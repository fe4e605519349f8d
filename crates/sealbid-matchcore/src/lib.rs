//! # sealbid-matchcore
//!
//! **The order book and the two bounded walks over it.**
//!
//! MatchCore owns no clock and no tokens. It takes an auction's clearing
//! state, its book and its event queue, and advances them by a bounded
//! amount of work:
//!
//! - **Order book**: price-time ordered sides with a resumable [`BookCursor`]
//! - **Clearing**: a walk that persists its cursors and partial fills
//! - **Matching**: turns the book into Fill/Out events at the clearing price
//! - **Event queue**: bounded FIFO drained by the settlement crate
//! - **Market**: an auction bundled with the book and queue it owns

pub mod clearing;
pub mod event_queue;
pub mod market;
pub mod matcher;
pub mod orderbook;

pub use clearing::{ClearingProgress, calculate_clearing_price, check_node_budget};
pub use event_queue::EventQueue;
pub use market::Market;
pub use matcher::{MatchProgress, match_orders};
pub use orderbook::{BookCursor, LeafNode, OrderBook};
