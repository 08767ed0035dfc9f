// crates/strata-staking/src/ledger.rs
//
// Delegation ledger: the (delegator, validator) -> shares relation, and the
// Delegate transition.
//
// Each delegation is stored under delegator-then-validator with a reverse
// index keyed validator-then-delegator, so both sides can be enumerated by
// prefix. A delegation whose shares reach zero is deleted.

use strata_core::amount::{Coin, Shares, Tokens};
use strata_core::codec;
use strata_core::delegation::Delegation;
use strata_core::error::StrataError;
use strata_core::identity::Address;
use strata_core::params::StakingParams;
use strata_core::traits::KvStore;
use strata_core::validator::Validator;

use crate::error::StakingError;
use crate::keys::{
    address_at, delegation_by_validator_key, delegation_key, delegator_delegations_prefix,
    validator_delegations_prefix, DELEGATION_PREFIX,
};
use crate::{ladder, registry, shares, whitelist};

pub fn get_delegation(
    store: &dyn KvStore,
    delegator: &Address,
    validator: &Address,
) -> Result<Option<Delegation>, StakingError> {
    match store.get(&delegation_key(delegator, validator))? {
        Some(bytes) => Ok(Some(codec::decode(&bytes)?)),
        None => Ok(None),
    }
}

pub fn set_delegation(store: &mut dyn KvStore, delegation: &Delegation) -> Result<(), StakingError> {
    store.set(
        &delegation_key(&delegation.delegator, &delegation.validator),
        &codec::encode(delegation)?,
    )?;
    store.set(
        &delegation_by_validator_key(&delegation.validator, &delegation.delegator),
        &[],
    )?;
    Ok(())
}

pub fn remove_delegation(
    store: &mut dyn KvStore,
    delegator: &Address,
    validator: &Address,
) -> Result<(), StakingError> {
    store.delete(&delegation_key(delegator, validator))?;
    store.delete(&delegation_by_validator_key(validator, delegator))?;
    Ok(())
}

fn decode_all(pairs: Vec<(Vec<u8>, Vec<u8>)>) -> Result<Vec<Delegation>, StakingError> {
    pairs
        .into_iter()
        .map(|(_, bytes)| codec::decode(&bytes).map_err(StakingError::from))
        .collect()
}

/// Every delegation held by `delegator`, in validator order.
pub fn delegator_delegations(
    store: &dyn KvStore,
    delegator: &Address,
) -> Result<Vec<Delegation>, StakingError> {
    decode_all(store.prefix_scan(&delegator_delegations_prefix(delegator))?)
}

/// Every delegation to `validator`, in delegator order.
pub fn validator_delegations(
    store: &dyn KvStore,
    validator: &Address,
) -> Result<Vec<Delegation>, StakingError> {
    let mut delegations = Vec::new();
    for (key, _) in store.prefix_scan(&validator_delegations_prefix(validator))? {
        let delegator = address_at(&key, 1 + validator.as_bytes().len())?;
        match get_delegation(store, &delegator, validator)? {
            Some(delegation) => delegations.push(delegation),
            None => {
                return Err(StakingError::Store(StrataError::InvalidState(format!(
                    "reverse index names missing delegation {} -> {}",
                    delegator, validator
                ))))
            }
        }
    }
    Ok(delegations)
}

pub fn all_delegations(store: &dyn KvStore) -> Result<Vec<Delegation>, StakingError> {
    decode_all(store.prefix_scan(&[DELEGATION_PREFIX])?)
}

/// Reject coins of the wrong denomination or zero amount.
pub(crate) fn check_bond_coin(params: &StakingParams, coin: &Coin) -> Result<(), StakingError> {
    if coin.denom != params.bond_denom {
        return Err(StakingError::InvalidDenomination {
            got: coin.denom.clone(),
            expected: params.bond_denom.clone(),
        });
    }
    if coin.is_zero() {
        return Err(StakingError::InvalidAmount("amount must be positive".to_string()));
    }
    Ok(())
}

/// Bond `amount` tokens from `delegator` into `validator`, reserving `units`
/// of its license quota. Persists the validator and the delegation.
pub(crate) fn credit(
    store: &mut dyn KvStore,
    validator: &mut Validator,
    delegator: &Address,
    amount: Tokens,
    units: u64,
) -> Result<Shares, StakingError> {
    if let Some(quota) = validator.license_mut() {
        ladder::admit(quota, units)?;
    }

    let mut delegation = get_delegation(store, delegator, &validator.operator)?
        .unwrap_or_else(|| Delegation::new(*delegator, validator.operator));

    let issued = shares::add_tokens(validator, amount)?;
    delegation.shares += issued;
    if validator.license().is_some() {
        delegation.license_units += units;
    }

    registry::set_validator(store, validator)?;
    set_delegation(store, &delegation)?;
    Ok(issued)
}

/// A validated request to unbond part or all of a delegation.
#[derive(Debug, Clone)]
pub(crate) struct UnbondRequest {
    pub delegation: Delegation,
    pub shares: Shares,
    pub full_exit: bool,
    /// Token value the delegation keeps after the unbond.
    pub remaining: Tokens,
}

/// Convert `amount` to shares of `validator` and check them against what
/// `delegator` holds.
pub(crate) fn validate_unbond_amount(
    store: &dyn KvStore,
    validator: &Validator,
    delegator: &Address,
    amount: Tokens,
) -> Result<UnbondRequest, StakingError> {
    let delegation = get_delegation(store, delegator, &validator.operator)?.ok_or(
        StakingError::DelegationNotFound {
            delegator: *delegator,
            validator: validator.operator,
        },
    )?;
    if amount == 0 {
        return Err(StakingError::InvalidAmount("amount must be positive".to_string()));
    }

    let mut shares = shares::shares_from_tokens(validator, amount)?;
    if shares > delegation.shares {
        // Rounding may push the requested shares a hair past the holding;
        // only the truncated value decides whether the request is too large.
        let truncated = shares::shares_from_tokens_truncated(validator, amount)?;
        if truncated > delegation.shares {
            return Err(StakingError::InsufficientShares {
                requested: truncated,
                held: delegation.shares,
            });
        }
        shares = delegation.shares;
    }

    let full_exit = shares == delegation.shares;
    let remaining = if full_exit {
        0
    } else {
        shares::tokens_from_shares(validator, delegation.shares - shares)?
    };
    Ok(UnbondRequest {
        delegation,
        shares,
        full_exit,
        remaining,
    })
}

/// Burn the request's shares from the delegation and the validator, returning
/// `units` of license quota. Persists both and returns the released tokens.
///
/// # Panics
/// If the delegation holds fewer license units than are released.
pub(crate) fn debit(
    store: &mut dyn KvStore,
    validator: &mut Validator,
    request: UnbondRequest,
    units: u64,
) -> Result<Tokens, StakingError> {
    let UnbondRequest {
        mut delegation,
        shares: burned,
        ..
    } = request;

    if let Some(quota) = validator.license_mut() {
        ladder::release(quota, units);
        delegation.license_units = match delegation.license_units.checked_sub(units) {
            Some(left) => left,
            None => {
                tracing::error!(
                    "Delegation {} -> {} holds {} license units, releasing {}",
                    delegation.delegator,
                    delegation.validator,
                    delegation.license_units,
                    units
                );
                panic!("delegation license units would go negative");
            }
        };
    }

    delegation.shares -= burned;
    let released = shares::remove_shares(validator, burned)?;

    if delegation.shares.is_zero() {
        remove_delegation(store, &delegation.delegator, &delegation.validator)?;
    } else {
        set_delegation(store, &delegation)?;
    }

    if delegation.delegator == validator.operator && !validator.jailed {
        let self_bond = shares::tokens_from_shares(validator, delegation.shares)?;
        if self_bond < validator.min_self_delegation {
            validator.jailed = true;
            tracing::info!(
                "Validator {} jailed: self delegation {} below minimum {}",
                validator.operator,
                self_bond,
                validator.min_self_delegation
            );
        }
    }

    registry::set_validator(store, validator)?;
    Ok(released)
}

/// Delegate `coin` from `delegator` to `validator_addr`. Returns the shares
/// issued.
pub fn delegate(
    store: &mut dyn KvStore,
    params: &StakingParams,
    delegator: &Address,
    validator_addr: &Address,
    coin: &Coin,
) -> Result<Shares, StakingError> {
    let mut validator = registry::must_get_validator(store, validator_addr)?;
    check_bond_coin(params, coin)?;

    if validator.mode.is_special() && !whitelist::is_special_delegator(store, &validator, delegator)? {
        return Err(StakingError::Unauthorized(format!(
            "{} is not whitelisted on special validator {}",
            delegator, validator_addr
        )));
    }

    let units = if validator.license().is_some() {
        let existing = get_delegation(store, delegator, validator_addr)?.is_some();
        ladder::bond_units(&validator.ladder, existing, coin.amount)?
    } else {
        0
    };

    let issued = credit(store, &mut validator, delegator, coin.amount, units)?;
    tracing::debug!(
        "Delegated {} from {} to {} for {} shares",
        coin,
        delegator,
        validator_addr,
        issued
    );
    Ok(issued)
}
