//! Crank tuning.

use std::path::Path;

use sealbid_types::constants;
use serde::{Deserialize, Serialize};

use crate::error::{CrankError, CrankResult};

/// Batch sizes and failure tolerance shared by every driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrankConfig {
    /// `limit` passed to each clearing call.
    pub clear_batch: u16,
    /// `limit` passed to each matching call.
    pub match_batch: u16,
    /// `limit` passed to each consume call.
    pub consume_batch: u16,
    pub accounts_per_consume: usize,
    /// Consecutive failed invocations tolerated before a driver gives up.
    pub max_consecutive_failures: u32,
    pub max_invocations: u32,
}

impl Default for CrankConfig {
    fn default() -> Self {
        Self {
            clear_batch: constants::DEFAULT_CRANK_NODE_BATCH,
            match_batch: constants::DEFAULT_CRANK_NODE_BATCH,
            consume_batch: constants::DEFAULT_CRANK_CONSUME_BATCH,
            accounts_per_consume: constants::DEFAULT_CRANK_ACCOUNTS_PER_CONSUME,
            max_consecutive_failures: constants::DEFAULT_CRANK_FAILURE_LIMIT,
            max_invocations: constants::DEFAULT_CRANK_MAX_INVOCATIONS,
        }
    }
}

impl CrankConfig {
    pub fn from_json(json: &str) -> CrankResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| CrankError::Config {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> CrankResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| CrankError::Config {
            reason: format!("{}: {e}", path.display()),
        })?;
        Self::from_json(&json)
    }

    /// Zero batches would make a driver spin without progress.
    pub fn validate(&self) -> CrankResult<()> {
        let zero = [
            ("clear_batch", self.clear_batch == 0),
            ("match_batch", self.match_batch == 0),
            ("consume_batch", self.consume_batch == 0),
            ("accounts_per_consume", self.accounts_per_consume == 0),
            ("max_consecutive_failures", self.max_consecutive_failures == 0),
            ("max_invocations", self.max_invocations == 0),
        ];
        match zero.iter().find(|(_, is_zero)| *is_zero) {
            Some((field, _)) => Err(CrankError::Config {
                reason: format!("{field} must be greater than zero"),
            }),
            None => Ok(()),
        }
    }
}
