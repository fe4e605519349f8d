//! Error types for the sealbid auction.
//!
//! All errors use the `SB_ERR_` prefix convention for easy grepping in logs.
//! Codes 6001..=6043 form the auction taxonomy; 7xxx covers the ledger
//! facade and custody. Each kind belongs to exactly one [`ErrorClass`],
//! which is what the crank orchestrator matches on.

use std::fmt;

use thiserror::Error;

use crate::Address;

/// Coarse classification of an [`AuctionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Bad arguments at auction or open-orders creation. Never retried.
    Configuration,
    /// The operation is not allowed in the current auction phase.
    PhaseGuard,
    /// The invocation referenced something inconsistent; only it aborts.
    DataIntegrity,
    /// A capacity, balance or arithmetic limit was hit.
    Resource,
    /// Account store or custody failure outside the auction taxonomy.
    Ledger,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::PhaseGuard => write!(f, "PHASE_GUARD"),
            Self::DataIntegrity => write!(f, "DATA_INTEGRITY"),
            Self::Resource => write!(f, "RESOURCE"),
            Self::Ledger => write!(f, "LEDGER"),
        }
    }
}

/// Central error enum for all auction operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuctionError {
    // =================================================================
    // Auction / market setup (600x)
    // =================================================================
    #[error("SB_ERR_6001: Order book or event queue of this auction is unavailable")]
    InvalidAobMarketState,

    #[error("SB_ERR_6002: The order phase must end in the future")]
    InvalidEndTimes,

    #[error("SB_ERR_6003: The order phase must start before it ends")]
    InvalidStartTimes,

    #[error("SB_ERR_6004: The decryption phase must end after the order phase")]
    InvalidDecryptionEndTime,

    #[error("SB_ERR_6005: Minimum base order size must be greater than zero")]
    InvalidMinBaseOrderSize,

    #[error("SB_ERR_6006: Tick size must be greater than zero")]
    InvalidTickSize,

    // =================================================================
    // Clearing and matching (6007..6016)
    // =================================================================
    #[error("SB_ERR_6007: There are no ask orders in the book")]
    NoAskOrders,

    #[error("SB_ERR_6008: There are no bid orders in the book")]
    NoBidOrders,

    #[error("SB_ERR_6009: The order book is empty")]
    NoOrdersInOrderbook,

    #[error("SB_ERR_6010: Clearing price calculation is not active")]
    CalcClearingPricePhaseNotActive,

    #[error("SB_ERR_6011: The clearing price has already been found")]
    ClearingPriceAlreadyFound,

    #[error("SB_ERR_6012: No clearing price has been found yet")]
    NoClearingPriceYet,

    #[error("SB_ERR_6013: Order matching is not active")]
    MatchOrdersPhaseNotActive,

    #[error("SB_ERR_6014: The auction is not finished")]
    AuctionNotFinished,

    #[error("SB_ERR_6015: The event queue is full")]
    AobEventQueueFull,

    #[error("SB_ERR_6016: No events were processed")]
    NoEventsProcessed,

    // =================================================================
    // Event consumption (6017..6020)
    // =================================================================
    #[error("SB_ERR_6017: Open orders account {0} was not supplied")]
    MissingOpenOrdersPubkeyInRemainingAccounts(Address),

    #[error("SB_ERR_6018: Open orders side differs from the event side")]
    UserSideDiffFromEventSide,

    #[error("SB_ERR_6019: Order id not found on this account")]
    OrderIdNotFound,

    #[error("SB_ERR_6020: Sealed order index {idx} is out of range")]
    OrderIdxNotValid { idx: usize },

    // =================================================================
    // Phase guards (6021..6026)
    // =================================================================
    #[error("SB_ERR_6021: The order phase has not started")]
    OrderPhaseHasNotStarted,

    #[error("SB_ERR_6022: The order phase is over")]
    OrderPhaseIsOver,

    #[error("SB_ERR_6023: It is not the time for placing or cancelling orders")]
    OrderPhaseNotActive,

    #[error("SB_ERR_6024: The decryption phase has not started")]
    DecryptionPhaseHasNotStarted,

    #[error("SB_ERR_6025: The decryption phase has ended")]
    DecryptionPhaseHasEnded,

    #[error("SB_ERR_6026: It is not the time for decrypting orders")]
    DecryptionPhaseNotActive,

    // =================================================================
    // Order entry (6027..6040)
    // =================================================================
    #[error("SB_ERR_6027: Max orders must be between 1 and {max}", max = crate::constants::MAX_ORDERS_PER_ACCOUNT)]
    MaxOrdersValueIsInvalid,

    #[error("SB_ERR_6028: Only sealed orders are accepted on this side")]
    EncryptedOrdersOnlyOnThisSide,

    #[error("SB_ERR_6029: Only plain orders are accepted on this side")]
    UnencryptedOrdersOnlyOnThisSide,

    #[error("SB_ERR_6030: Limit price {limit_price} is not a multiple of the tick size")]
    LimitPriceNotAMultipleOfTickSize { limit_price: u64 },

    #[error("SB_ERR_6031: Order size {size} is below the minimum {min}")]
    OrderBelowMinBaseOrderSize { size: u64, min: u64 },

    #[error("SB_ERR_6032: Too many orders on this account")]
    TooManyOrders,

    #[error("SB_ERR_6033: Encryption public key does not match the one on record")]
    EncryptionPubkeysDoNotMatch,

    #[error("SB_ERR_6034: An identical sealed order already exists")]
    IdenticalEncryptedOrderFound,

    #[error("SB_ERR_6035: Insufficient collateral: need {needed}, deposited {deposited}")]
    InsufficientTokensForOrder { needed: u64, deposited: u64 },

    #[error("SB_ERR_6036: Sealed order could not be opened with the supplied shared key")]
    InvalidSharedKey,

    #[error("SB_ERR_6037: Book node {key:#034x} not found")]
    NodeKeyNotFound { key: u128 },

    #[error("SB_ERR_6038: Open orders account still has orders")]
    OpenOrdersHasOpenOrders,

    #[error("SB_ERR_6039: Open orders account still has locked tokens")]
    OpenOrdersHasLockedTokens,

    #[error("SB_ERR_6040: The order book is not empty")]
    OrderBookNotEmpty,

    // =================================================================
    // Resource limits (6041..6042)
    // =================================================================
    #[error("SB_ERR_6041: The event queue is not empty")]
    EventQueueNotEmpty,

    #[error("SB_ERR_6042: Numerical overflow")]
    NumericalOverflow,

    #[error("SB_ERR_6043: Walk of {requested} nodes exceeds the budget of {budget}")]
    SlabIteratorOverflow { requested: u16, budget: u16 },

    // =================================================================
    // Ledger / custody (7xxx)
    // =================================================================
    #[error("SB_ERR_7000: Account {0} not found")]
    AccountNotFound(Address),

    #[error("SB_ERR_7001: Account {0} already exists")]
    AccountAlreadyExists(Address),

    #[error("SB_ERR_7002: Signer is not allowed to perform this operation")]
    Unauthorized,

    #[error("SB_ERR_7003: Order book side is full")]
    OrderBookFull,

    #[error("SB_ERR_7004: Insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },

    #[error("SB_ERR_7005: Invalid auction id: {reason}")]
    InvalidAuctionId { reason: String },

    #[error("SB_ERR_7006: Only one side of an auction may be sealed")]
    BothSidesEncrypted,

    #[error("SB_ERR_7007: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },

    #[error("SB_ERR_7008: Internal error: {0}")]
    Internal(String),
}

impl AuctionError {
    /// Numeric code embedded in the message prefix.
    #[must_use]
    pub fn code(&self) -> u32 {
        match self {
            Self::InvalidAobMarketState => 6001,
            Self::InvalidEndTimes => 6002,
            Self::InvalidStartTimes => 6003,
            Self::InvalidDecryptionEndTime => 6004,
            Self::InvalidMinBaseOrderSize => 6005,
            Self::InvalidTickSize => 6006,
            Self::NoAskOrders => 6007,
            Self::NoBidOrders => 6008,
            Self::NoOrdersInOrderbook => 6009,
            Self::CalcClearingPricePhaseNotActive => 6010,
            Self::ClearingPriceAlreadyFound => 6011,
            Self::NoClearingPriceYet => 6012,
            Self::MatchOrdersPhaseNotActive => 6013,
            Self::AuctionNotFinished => 6014,
            Self::AobEventQueueFull => 6015,
            Self::NoEventsProcessed => 6016,
            Self::MissingOpenOrdersPubkeyInRemainingAccounts(_) => 6017,
            Self::UserSideDiffFromEventSide => 6018,
            Self::OrderIdNotFound => 6019,
            Self::OrderIdxNotValid { .. } => 6020,
            Self::OrderPhaseHasNotStarted => 6021,
            Self::OrderPhaseIsOver => 6022,
            Self::OrderPhaseNotActive => 6023,
            Self::DecryptionPhaseHasNotStarted => 6024,
            Self::DecryptionPhaseHasEnded => 6025,
            Self::DecryptionPhaseNotActive => 6026,
            Self::MaxOrdersValueIsInvalid => 6027,
            Self::EncryptedOrdersOnlyOnThisSide => 6028,
            Self::UnencryptedOrdersOnlyOnThisSide => 6029,
            Self::LimitPriceNotAMultipleOfTickSize { .. } => 6030,
            Self::OrderBelowMinBaseOrderSize { .. } => 6031,
            Self::TooManyOrders => 6032,
            Self::EncryptionPubkeysDoNotMatch => 6033,
            Self::IdenticalEncryptedOrderFound => 6034,
            Self::InsufficientTokensForOrder { .. } => 6035,
            Self::InvalidSharedKey => 6036,
            Self::NodeKeyNotFound { .. } => 6037,
            Self::OpenOrdersHasOpenOrders => 6038,
            Self::OpenOrdersHasLockedTokens => 6039,
            Self::OrderBookNotEmpty => 6040,
            Self::EventQueueNotEmpty => 6041,
            Self::NumericalOverflow => 6042,
            Self::SlabIteratorOverflow { .. } => 6043,
            Self::AccountNotFound(_) => 7000,
            Self::AccountAlreadyExists(_) => 7001,
            Self::Unauthorized => 7002,
            Self::OrderBookFull => 7003,
            Self::InsufficientFunds { .. } => 7004,
            Self::InvalidAuctionId { .. } => 7005,
            Self::BothSidesEncrypted => 7006,
            Self::SupplyInvariantViolation { .. } => 7007,
            Self::Internal(_) => 7008,
        }
    }

    /// Which class this error belongs to.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidEndTimes
            | Self::InvalidStartTimes
            | Self::InvalidDecryptionEndTime
            | Self::InvalidMinBaseOrderSize
            | Self::InvalidTickSize
            | Self::MaxOrdersValueIsInvalid
            | Self::InvalidAuctionId { .. }
            | Self::BothSidesEncrypted => ErrorClass::Configuration,

            Self::CalcClearingPricePhaseNotActive
            | Self::ClearingPriceAlreadyFound
            | Self::NoClearingPriceYet
            | Self::MatchOrdersPhaseNotActive
            | Self::AuctionNotFinished
            | Self::OrderPhaseHasNotStarted
            | Self::OrderPhaseIsOver
            | Self::OrderPhaseNotActive
            | Self::DecryptionPhaseHasNotStarted
            | Self::DecryptionPhaseHasEnded
            | Self::DecryptionPhaseNotActive => ErrorClass::PhaseGuard,

            Self::InvalidAobMarketState
            | Self::NoAskOrders
            | Self::NoBidOrders
            | Self::NoOrdersInOrderbook
            | Self::NoEventsProcessed
            | Self::MissingOpenOrdersPubkeyInRemainingAccounts(_)
            | Self::UserSideDiffFromEventSide
            | Self::OrderIdNotFound
            | Self::OrderIdxNotValid { .. }
            | Self::EncryptedOrdersOnlyOnThisSide
            | Self::UnencryptedOrdersOnlyOnThisSide
            | Self::LimitPriceNotAMultipleOfTickSize { .. }
            | Self::OrderBelowMinBaseOrderSize { .. }
            | Self::EncryptionPubkeysDoNotMatch
            | Self::IdenticalEncryptedOrderFound
            | Self::InvalidSharedKey
            | Self::NodeKeyNotFound { .. }
            | Self::OpenOrdersHasOpenOrders
            | Self::OpenOrdersHasLockedTokens
            | Self::OrderBookNotEmpty
            | Self::EventQueueNotEmpty => ErrorClass::DataIntegrity,

            Self::AobEventQueueFull
            | Self::TooManyOrders
            | Self::InsufficientTokensForOrder { .. }
            | Self::NumericalOverflow
            | Self::SlabIteratorOverflow { .. }
            | Self::OrderBookFull
            | Self::InsufficientFunds { .. } => ErrorClass::Resource,

            Self::AccountNotFound(_)
            | Self::AccountAlreadyExists(_)
            | Self::Unauthorized
            | Self::SupplyInvariantViolation { .. }
            | Self::Internal(_) => ErrorClass::Ledger,
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, AuctionError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<AuctionError> {
        vec![
            AuctionError::InvalidTickSize,
            AuctionError::ClearingPriceAlreadyFound,
            AuctionError::MissingOpenOrdersPubkeyInRemainingAccounts(Address::ZERO),
            AuctionError::OrderIdxNotValid { idx: 3 },
            AuctionError::InsufficientTokensForOrder {
                needed: 10,
                deposited: 9,
            },
            AuctionError::NodeKeyNotFound { key: 1 << 64 },
            AuctionError::SlabIteratorOverflow {
                requested: 600,
                budget: 512,
            },
            AuctionError::AccountNotFound(Address::ZERO),
            AuctionError::Internal("boom".into()),
        ]
    }

    #[test]
    fn all_errors_have_sb_err_prefix() {
        for err in sample() {
            let msg = err.to_string();
            assert!(msg.starts_with("SB_ERR_"), "missing prefix: {msg}");
        }
    }

    #[test]
    fn message_prefix_matches_code() {
        for err in sample() {
            let expected = format!("SB_ERR_{}:", err.code());
            assert!(err.to_string().starts_with(&expected), "{err}");
        }
    }

    #[test]
    fn classes_follow_taxonomy() {
        assert_eq!(AuctionError::InvalidTickSize.class(), ErrorClass::Configuration);
        assert_eq!(AuctionError::MatchOrdersPhaseNotActive.class(), ErrorClass::PhaseGuard);
        assert_eq!(AuctionError::InvalidSharedKey.class(), ErrorClass::DataIntegrity);
        assert_eq!(AuctionError::AobEventQueueFull.class(), ErrorClass::Resource);
        assert_eq!(AuctionError::Unauthorized.class(), ErrorClass::Ledger);
    }

    #[test]
    fn max_orders_message_names_the_bound() {
        let msg = AuctionError::MaxOrdersValueIsInvalid.to_string();
        assert!(msg.ends_with("between 1 and 6"));
    }
}
