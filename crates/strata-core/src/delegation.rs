// crates/strata-core/src/delegation.rs
//
// Delegation records and the escrow entries of stake in transit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::amount::{Shares, Tokens};
use crate::identity::Address;

/// Shares a delegator holds in one validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    pub delegator: Address,
    pub validator: Address,
    pub shares: Shares,
    /// Quota units held under license mode. Zero for other modes.
    #[serde(default)]
    pub license_units: u64,
}

impl Delegation {
    pub fn new(delegator: Address, validator: Address) -> Self {
        Self {
            delegator,
            validator,
            shares: Shares::ZERO,
            license_units: 0,
        }
    }
}

/// Tokens escrowed by an undelegation until `completion_time`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbondingEntry {
    pub delegator: Address,
    pub validator: Address,
    /// Insertion sequence; breaks ties between equal completion times.
    pub sequence: u64,
    pub creation_time: DateTime<Utc>,
    pub completion_time: DateTime<Utc>,
    pub initial_balance: Tokens,
    /// Tokens still escrowed. Slashing may lower it before maturity.
    pub balance: Tokens,
}

impl UnbondingEntry {
    pub fn is_mature(&self, now: DateTime<Utc>) -> bool {
        self.completion_time <= now
    }
}

/// A redelegation in its maturity window.
///
/// Destination shares are credited when the entry is created; the entry only
/// records that the stake may not be moved on again until `completion_time`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedelegationEntry {
    pub delegator: Address,
    pub validator_src: Address,
    pub validator_dst: Address,
    pub sequence: u64,
    pub creation_time: DateTime<Utc>,
    pub completion_time: DateTime<Utc>,
    /// Token value moved at creation.
    pub initial_balance: Tokens,
    /// Shares minted at the destination.
    pub shares_dst: Shares,
}

impl RedelegationEntry {
    pub fn is_mature(&self, now: DateTime<Utc>) -> bool {
        self.completion_time <= now
    }
}
