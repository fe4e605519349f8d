//! # sealbid-types
//!
//! Shared types, errors, and configuration for the **sealbid** sealed-bid
//! batch auction.
//!
//! This crate is the leaf dependency of the workspace. It defines:
//!
//! - **Identifiers**: [`Address`], [`AuctionId`], [`EncryptionPubkey`]
//! - **Fixed point**: 32.32 helpers in [`fixed_point`]
//! - **Accounts**: [`Auction`], [`OpenOrders`], [`OrderHistory`], [`EncryptedOrder`]
//! - **Phases**: [`AuctionPhase`], derived from time and counters, never stored
//! - **Events**: [`Event`] (Fill / Out)
//! - **Custody**: the [`Custody`] collaborator trait
//! - **Errors**: [`AuctionError`] with `SB_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod auction;
pub mod config;
pub mod constants;
pub mod custody;
pub mod error;
pub mod event;
pub mod fixed_point;
pub mod ids;
pub mod open_orders;
pub mod order;
pub mod order_history;
pub mod phase;

pub use auction::*;
pub use config::*;
pub use custody::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use open_orders::*;
pub use order::*;
pub use order_history::*;
pub use phase::*;

// Constants and fixed-point helpers are accessed by module path.
