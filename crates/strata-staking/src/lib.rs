// crates/strata-staking/src/lib.rs
//
// strata-staking: the bonding and delegation engine.
//
// Components, leaf first:
//   - shares:       token <-> share conversion at a validator's exchange rate
//   - ladder:       floor-plus-increment checks and license quota units
//   - registry:     validator records, CreateValidator, EditValidator
//   - approval:     the validator-creation approval gate
//   - whitelist:    special-mode delegator whitelists
//   - ledger:       delegations and the Delegate transition
//   - unbonding:    unbonding queue and Undelegate
//   - redelegation: redelegation queue and BeginRedelegate
//   - maturity:     per-block queue draining
//   - slash:        hook points for an external slashing module
//   - genesis:      state import / export
//   - invariants:   crisis checks
//
// `StakingKeeper` wraps every transition in a staging overlay so each one
// commits atomically.

pub mod approval;
pub mod error;
pub mod genesis;
pub mod invariants;
pub mod keeper;
pub mod keys;
pub mod ladder;
pub mod ledger;
pub mod maturity;
pub mod msgs;
pub mod redelegation;
pub mod registry;
pub mod shares;
pub mod slash;
pub mod unbonding;
pub mod whitelist;

#[cfg(test)]
mod testutil;

// Re-export key types for ergonomic access from downstream crates.
pub use error::StakingError;
pub use genesis::GenesisState;
pub use invariants::InvariantBroken;
pub use keeper::StakingKeeper;
pub use maturity::{CompletedRedelegation, CompletedUnbonding, MaturityReport};
pub use msgs::{
    CreateValidator, DescriptionUpdate, EditValidator, RedelegateOutcome, RequestedMode,
    UndelegateOutcome,
};
