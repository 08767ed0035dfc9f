// crates/strata-core/src/params.rs
//
// Governance parameters consumed read-only by the staking engine.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StrataError;

/// Default unbonding period: 21 days.
pub const DEFAULT_UNBONDING_TIME_SECS: i64 = 21 * 24 * 60 * 60;

/// Default cap on live unbonding / redelegation entries per pair.
pub const DEFAULT_MAX_ENTRIES: u32 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingParams {
    /// Denomination accepted for bonding.
    #[serde(default = "default_bond_denom")]
    pub bond_denom: String,

    /// Delay between undelegation / redelegation and maturity, in seconds.
    #[serde(default = "default_unbonding_time_secs")]
    pub unbonding_time_secs: i64,

    /// Maximum live entries per (delegator, validator) unbonding or per
    /// (delegator, src, dst) redelegation.
    #[serde(default = "default_max_entries")]
    pub max_entries: u32,
}

fn default_bond_denom() -> String {
    "ustrata".to_string()
}

fn default_unbonding_time_secs() -> i64 {
    DEFAULT_UNBONDING_TIME_SECS
}

fn default_max_entries() -> u32 {
    DEFAULT_MAX_ENTRIES
}

impl Default for StakingParams {
    fn default() -> Self {
        Self {
            bond_denom: default_bond_denom(),
            unbonding_time_secs: default_unbonding_time_secs(),
            max_entries: default_max_entries(),
        }
    }
}

impl StakingParams {
    /// The unbonding period, or `None` when `unbonding_time_secs` is not a
    /// positive duration chrono can represent.
    pub fn unbonding_duration(&self) -> Option<Duration> {
        if self.unbonding_time_secs <= 0 {
            return None;
        }
        Duration::try_seconds(self.unbonding_time_secs)
    }

    /// Reject parameters no transition can run with.
    pub fn validate(&self) -> Result<(), StrataError> {
        if self.bond_denom.is_empty() {
            return Err(StrataError::InvalidState("bond denom is empty".to_string()));
        }
        if self.unbonding_duration().is_none() {
            return Err(StrataError::InvalidState(format!(
                "unbonding time of {}s is out of range",
                self.unbonding_time_secs
            )));
        }
        if self.max_entries == 0 {
            return Err(StrataError::InvalidState("max entries must be positive".to_string()));
        }
        Ok(())
    }

    /// When an unbonding or redelegation started at `now` matures.
    pub fn completion_time(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, StrataError> {
        self.unbonding_duration()
            .and_then(|unbonding| now.checked_add_signed(unbonding))
            .ok_or_else(|| {
                StrataError::InvalidState(format!(
                    "completion time {}s after {} is out of range",
                    self.unbonding_time_secs, now
                ))
            })
    }
}
