//! Errors seen by a crank driver.

use sealbid_types::{AuctionError, ErrorClass};
use thiserror::Error;

/// Why an invocation did not land.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CrankError {
    /// The ledger ran the invocation and refused it.
    #[error("SB_CRANK_ERR_8001: Invocation rejected: {0}")]
    Rejected(#[from] AuctionError),

    /// The invocation never reached the ledger, or its result was lost.
    #[error("SB_CRANK_ERR_8002: Transport failure: {reason}")]
    Transport { reason: String },

    #[error("SB_CRANK_ERR_8003: Invalid crank configuration: {reason}")]
    Config { reason: String },
}

impl CrankError {
    /// The ledger error behind a rejection.
    #[must_use]
    pub fn auction_error(&self) -> Option<&AuctionError> {
        match self {
            Self::Rejected(e) => Some(e),
            _ => None,
        }
    }

    #[must_use]
    pub fn class(&self) -> Option<ErrorClass> {
        self.auction_error().map(AuctionError::class)
    }
}

pub type CrankResult<T> = std::result::Result<T, CrankError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_keeps_the_ledger_code() {
        let err = CrankError::from(AuctionError::AobEventQueueFull);
        assert!(err.to_string().contains("SB_ERR_6015"));
        assert_eq!(err.class(), Some(ErrorClass::Resource));
        let lost = CrankError::Transport {
            reason: "timeout".into(),
        };
        assert_eq!(lost.auction_error(), None);
    }
}
