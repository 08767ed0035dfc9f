// crates/strata-staking/src/slash.rs
//
// Hook points for an external slashing module. Slashing itself (evidence,
// fractions, timing) is decided elsewhere; these only apply the burn.

use strata_core::amount::Tokens;
use strata_core::identity::Address;
use strata_core::traits::KvStore;

use crate::error::StakingError;
use crate::{registry, unbonding};

/// Burn up to `amount` of a validator's bonded tokens. Shares are untouched,
/// so the exchange rate drops. Returns the tokens burned.
pub fn slash_validator_tokens(
    store: &mut dyn KvStore,
    operator: &Address,
    amount: Tokens,
) -> Result<Tokens, StakingError> {
    let mut validator = registry::must_get_validator(store, operator)?;
    let burned = amount.min(validator.tokens);
    validator.tokens -= burned;
    registry::set_validator(store, &validator)?;
    tracing::info!("Slashed {} tokens from validator {}", burned, operator);
    Ok(burned)
}

/// Burn up to `amount` from an unbonding entry's escrowed balance. Returns the
/// tokens burned.
pub fn slash_unbonding_entry(
    store: &mut dyn KvStore,
    delegator: &Address,
    validator: &Address,
    sequence: u64,
    amount: Tokens,
) -> Result<Tokens, StakingError> {
    let mut entry = unbonding::get_entry(store, delegator, validator, sequence)?.ok_or(
        StakingError::UnbondingEntryNotFound {
            delegator: *delegator,
            validator: *validator,
            sequence,
        },
    )?;
    let burned = amount.min(entry.balance);
    entry.balance -= burned;
    unbonding::set_entry(store, &entry)?;
    tracing::info!(
        "Slashed {} from unbonding entry {} of {} at {}",
        burned,
        sequence,
        delegator,
        validator
    );
    Ok(burned)
}
