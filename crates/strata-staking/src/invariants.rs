// crates/strata-staking/src/invariants.rs
//
// Crisis checks over the whole staking state. The node runs them after each
// block when configured to; genesis import runs them once.

use std::collections::BTreeMap;

use thiserror::Error;

use strata_core::amount::{Shares, Tokens};
use strata_core::delegation::Delegation;
use strata_core::identity::Address;
use strata_core::traits::KvStore;

use crate::error::StakingError;
use crate::{ledger, registry};

#[derive(Debug, Error)]
pub enum InvariantBroken {
    /// License count above max, or not equal to the units its delegations hold.
    #[error("validator {validator}: license count {count} with max {max}, delegations hold {held} units")]
    LicenseCount {
        validator: Address,
        count: u64,
        max: u64,
        held: u64,
    },

    /// Validator share total differs from the sum over its delegations.
    #[error("validator {validator}: delegator shares {recorded}, delegations hold {held}")]
    DelegatorShares {
        validator: Address,
        recorded: Shares,
        held: Shares,
    },

    /// Tokens left on a validator with no shares.
    #[error("validator {validator} holds {tokens} tokens without shares")]
    OrphanTokens { validator: Address, tokens: Tokens },

    /// A delegation points at a validator that does not exist.
    #[error("delegation {delegator} -> {validator} names an unknown validator")]
    DanglingDelegation {
        delegator: Address,
        validator: Address,
    },

    /// The state could not be read.
    #[error("state unreadable: {0}")]
    Unreadable(#[from] StakingError),
}

fn delegations_by_validator(
    store: &dyn KvStore,
) -> Result<BTreeMap<Address, Vec<Delegation>>, InvariantBroken> {
    let mut grouped: BTreeMap<Address, Vec<Delegation>> = BTreeMap::new();
    for delegation in ledger::all_delegations(store)? {
        grouped.entry(delegation.validator).or_default().push(delegation);
    }
    Ok(grouped)
}

/// License count stays within quota and equals the units its delegations hold.
pub fn license_counts(store: &dyn KvStore) -> Result<(), InvariantBroken> {
    let grouped = delegations_by_validator(store)?;
    for validator in registry::all_validators(store)? {
        let Some(quota) = validator.license() else {
            continue;
        };
        let held: u64 = grouped
            .get(&validator.operator)
            .map(|ds| ds.iter().map(|d| d.license_units).sum())
            .unwrap_or(0);
        if quota.license_count > quota.max_license || quota.license_count != held {
            return Err(InvariantBroken::LicenseCount {
                validator: validator.operator,
                count: quota.license_count,
                max: quota.max_license,
                held,
            });
        }
    }
    Ok(())
}

/// A validator's share total equals the shares of its delegations, and every
/// delegation points at a known validator.
pub fn delegator_shares(store: &dyn KvStore) -> Result<(), InvariantBroken> {
    let mut grouped = delegations_by_validator(store)?;
    for validator in registry::all_validators(store)? {
        let held: Shares = grouped
            .remove(&validator.operator)
            .map(|ds| ds.iter().map(|d| d.shares).sum())
            .unwrap_or(Shares::ZERO);
        if held != validator.delegator_shares {
            return Err(InvariantBroken::DelegatorShares {
                validator: validator.operator,
                recorded: validator.delegator_shares,
                held,
            });
        }
    }
    if let Some(delegation) = grouped.into_values().flatten().next() {
        return Err(InvariantBroken::DanglingDelegation {
            delegator: delegation.delegator,
            validator: delegation.validator,
        });
    }
    Ok(())
}

/// A validator without shares holds no tokens.
pub fn orphan_tokens(store: &dyn KvStore) -> Result<(), InvariantBroken> {
    for validator in registry::all_validators(store)? {
        if validator.delegator_shares.is_zero() && validator.tokens > 0 {
            return Err(InvariantBroken::OrphanTokens {
                validator: validator.operator,
                tokens: validator.tokens,
            });
        }
    }
    Ok(())
}

pub fn check_all(store: &dyn KvStore) -> Result<(), InvariantBroken> {
    license_counts(store)?;
    delegator_shares(store)?;
    orphan_tokens(store)?;
    Ok(())
}
