// crates/strata-node/src/error.rs

use chrono::{DateTime, Utc};
use thiserror::Error;

use strata_core::amount::Tokens;
use strata_core::error::StrataError;
use strata_core::identity::Address;
use strata_staking::{InvariantBroken, StakingError};

/// Errors that stop the node.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid genesis file {path}: {reason}")]
    Genesis { path: String, reason: String },

    #[error("Invalid block file {path}: {reason}")]
    Blocks { path: String, reason: String },

    #[error("Store at {0} already holds staking state")]
    AlreadyInitialized(String),

    #[error("Block {height} time {time} precedes previous block time {previous}")]
    TimeRegression {
        height: u64,
        time: DateTime<Utc>,
        previous: DateTime<Utc>,
    },

    #[error("Fatal staking error: {0}")]
    Fatal(StakingError),

    #[error("Invariant broken after block {height}: {source}")]
    Invariant {
        height: u64,
        source: InvariantBroken,
    },

    #[error(transparent)]
    Store(#[from] StrataError),
}

/// Reasons a single transaction is rejected. The block carries on.
#[derive(Debug, Error)]
pub enum TxError {
    #[error("missing signature from {0}")]
    MissingSigner(Address),

    #[error("{account} holds {balance}, needs {needed}")]
    InsufficientFunds {
        account: Address,
        balance: Tokens,
        needed: Tokens,
    },

    #[error(transparent)]
    Staking(#[from] StakingError),
}
