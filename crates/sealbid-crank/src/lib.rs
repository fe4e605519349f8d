//! # sealbid-crank
//!
//! Crank orchestrator for the **sealbid** auction.
//!
//! No single invocation can process a whole order book, so an auction is
//! driven to completion by many small ones. This crate sends them:
//!
//! - [`AuctionClient`]: the ledger surface a crank talks to
//! - [`classify`]: per-step mapping of failures to the next move
//! - [`Crank`]: drivers for decrypt-all, clear, match, consume and
//!   settle-all, and [`Crank::run`] chaining them
//!
//! ## Failure Policy
//!
//! ```text
//! invocation ──▶ Ok ──────────────▶ continue (failure counter reset)
//!            └─▶ Err ─▶ terminal ─▶ stop, step complete / not ready
//!                   ├─▶ transient ▶ retry, give up after N in a row
//!                   └─▶ fatal ────▶ abort and surface the error
//! ```

pub mod classify;
pub mod client;
pub mod config;
pub mod driver;
pub mod error;

pub use classify::{CrankStep, Outcome, classify};
pub use client::AuctionClient;
pub use config::CrankConfig;
pub use driver::{Crank, CrankReport, CrankStatus, RunReport};
pub use error::{CrankError, CrankResult};
