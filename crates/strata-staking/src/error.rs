// crates/strata-staking/src/error.rs
//
// Recoverable failures of staking transitions. Any of these aborts the whole
// transition; staged writes are discarded.

use thiserror::Error;

use strata_core::amount::{Shares, Tokens};
use strata_core::error::StrataError;
use strata_core::identity::Address;

#[derive(Debug, Error)]
pub enum StakingError {
    /// No validator is registered under the operator address.
    #[error("validator {0} does not exist")]
    ValidatorNotFound(Address),

    /// The delegator holds no shares in the validator.
    #[error("no delegation from {delegator} to {validator}")]
    DelegationNotFound { delegator: Address, validator: Address },

    /// The unbond request converts to more shares than the delegation holds.
    #[error("insufficient shares: requested {requested}, held {held}")]
    InsufficientShares { requested: Shares, held: Shares },

    /// A new delegation, or what stays after a partial exit, is below the floor.
    #[error("delegation below the validator's minimum of {minimum}")]
    DelegationBelowMinimum { minimum: Tokens },

    /// The amount is not a whole number of delegation increments.
    #[error("amount {amount} is not a multiple of the delegation increment {increment}")]
    InvalidIncrementDelegation { amount: Tokens, increment: Tokens },

    /// Every license of the validator is already taken.
    #[error("validator has used all {max_license} licenses")]
    LicenseLimit { max_license: u64 },

    /// The request needs more license units than remain.
    #[error("not enough licenses: requested {requested}, available {available}")]
    NotEnoughLicense { requested: u64, available: u64 },

    /// Redelegation is switched off on the source or destination validator.
    #[error("redelegation is disabled for the source or destination validator")]
    RedelegationDisabled,

    /// The caller may not perform this transition.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The coin is not in the bond denomination.
    #[error("invalid coin denomination: got {got}, expected {expected}")]
    InvalidDenomination { got: String, expected: String },

    /// A zero or otherwise unusable amount.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// The operator already runs a validator.
    #[error("validator {0} already exists")]
    ValidatorOwnerExists(Address),

    /// Another validator uses the consensus key.
    #[error("consensus public key is already used by another validator")]
    ValidatorPubKeyExists,

    /// License mode without a non-zero delegation increment.
    #[error("license mode requires a non-zero delegation increment")]
    LicenseIncrementUndefined,

    /// License mode without a max license.
    #[error("license mode requires max license to be defined")]
    MaxLicenseUndefined,

    /// An edit tried to lower max license.
    #[error("max license cannot decrease from {current} to {requested}")]
    MaxLicenseDecreased { current: u64, requested: u64 },

    /// An edit tried to lower the minimum self delegation.
    #[error("minimum self delegation cannot decrease")]
    MinSelfDelegationDecreased,

    /// The self delegation does not cover the minimum self delegation.
    #[error("validator's self delegation is below its minimum")]
    SelfDelegationBelowMinimum,

    /// Commission rates out of bounds, or changed too soon.
    #[error("invalid commission: {0}")]
    InvalidCommission(String),

    /// A description field exceeds its length limit.
    #[error("description field {field} is {len} bytes, limit {max}")]
    DescriptionTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    /// Source and destination are the same validator.
    #[error("cannot redelegate to the same validator")]
    SelfRedelegation,

    /// The source validator still has a maturing redelegation into it from this delegator.
    #[error("redelegation from a validator that is itself receiving a maturing redelegation")]
    TransitiveRedelegation,

    /// The pair already holds the maximum number of queue entries.
    #[error("too many unbonding or redelegation entries for this pair")]
    TooManyEntries,

    /// No unbonding entry with this sequence.
    #[error("no unbonding entry {sequence} from {delegator} to {validator}")]
    UnbondingEntryNotFound {
        delegator: Address,
        validator: Address,
        sequence: u64,
    },

    /// The validator has no whitelist record.
    #[error("validator {0} has no whitelist")]
    WhitelistNotFound(Address),

    /// The approval singleton was never written.
    #[error("validator approval record is missing; genesis must initialize it")]
    MissingApproval,

    /// Genesis state is malformed or breaks an invariant.
    #[error("invalid genesis state: {0}")]
    InvalidGenesis(String),

    /// Storage or codec failure.
    #[error(transparent)]
    Store(#[from] StrataError),
}

impl StakingError {
    /// Errors that indicate a broken node setup rather than a bad transaction.
    /// The host must stop instead of rejecting a single transaction.
    pub fn is_fatal(&self) -> bool {
        match self {
            StakingError::MissingApproval | StakingError::InvalidGenesis(_) => true,
            StakingError::Store(StrataError::NotFound(_)) => false,
            StakingError::Store(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(StakingError::MissingApproval.is_fatal());
        assert!(StakingError::Store(StrataError::Storage("disk".into())).is_fatal());
        assert!(!StakingError::Store(StrataError::NotFound("x".into())).is_fatal());
        assert!(!StakingError::RedelegationDisabled.is_fatal());
        assert!(!StakingError::LicenseLimit { max_license: 3 }.is_fatal());
    }

    #[test]
    fn test_messages() {
        let err = StakingError::InvalidIncrementDelegation {
            amount: 130,
            increment: 50,
        };
        assert_eq!(
            err.to_string(),
            "amount 130 is not a multiple of the delegation increment 50"
        );
    }
}
