// crates/strata-staking/src/ladder.rs
//
// Delegation ladder and license quota math.
//
// A ladder admits a first delegation of at least `min_delegation` and moves in
// multiples of `delegation_increment` after that. Under license mode every
// rung is one quota unit: the floor counts as one unit and each increment
// above it as one more. The same ladder checks run for redelegations into or
// out of validators in any mode; quota only moves for license validators.

use strata_core::amount::Tokens;
use strata_core::validator::{DelegationLadder, LicenseQuota};

use crate::error::StakingError;

/// Units admitted by bonding `amount`, checking it sits on the ladder.
///
/// `existing` is whether the delegator already holds a delegation to the
/// validator; only a new delegation has to clear the floor.
pub fn bond_units(
    ladder: &DelegationLadder,
    existing: bool,
    amount: Tokens,
) -> Result<u64, StakingError> {
    let step = ladder.step();
    if existing {
        if amount % step != 0 {
            return Err(StakingError::InvalidIncrementDelegation {
                amount,
                increment: step,
            });
        }
        return Ok(amount / step);
    }

    let floor = ladder.floor();
    if amount < floor {
        return Err(StakingError::DelegationBelowMinimum { minimum: floor });
    }
    let extra = amount - floor;
    if extra % step != 0 {
        return Err(StakingError::InvalidIncrementDelegation {
            amount: extra,
            increment: step,
        });
    }
    Ok(1 + extra / step)
}

/// Units released by unbonding `amount` out of a delegation.
///
/// A full exit releases every unit the delegation holds and skips the ladder.
/// A partial exit must keep `remaining` at or above the floor and move a
/// whole number of increments.
pub fn unbond_units(
    ladder: &DelegationLadder,
    amount: Tokens,
    remaining: Tokens,
    full_exit: bool,
    held_units: u64,
) -> Result<u64, StakingError> {
    if full_exit {
        return Ok(held_units);
    }
    let floor = ladder.floor();
    if remaining < floor {
        return Err(StakingError::DelegationBelowMinimum { minimum: floor });
    }
    let step = ladder.step();
    if amount % step != 0 {
        return Err(StakingError::InvalidIncrementDelegation {
            amount,
            increment: step,
        });
    }
    Ok((amount / step).min(held_units))
}

/// Units implied by an existing delegation worth `value`, used when a
/// validator switches into license mode. The value must sit on the ladder.
pub fn units_for_value(ladder: &DelegationLadder, value: Tokens) -> Result<u64, StakingError> {
    if value == 0 {
        return Ok(0);
    }
    bond_units(ladder, false, value)
}

/// Reserve `units` of the validator's quota.
pub fn admit(quota: &mut LicenseQuota, units: u64) -> Result<(), StakingError> {
    if quota.license_count >= quota.max_license {
        return Err(StakingError::LicenseLimit {
            max_license: quota.max_license,
        });
    }
    if quota.license_count + units > quota.max_license {
        return Err(StakingError::NotEnoughLicense {
            requested: units,
            available: quota.remaining(),
        });
    }
    quota.license_count += units;
    Ok(())
}

/// Return `units` to the validator's quota.
///
/// # Panics
/// If more units are released than are counted; the count and the
/// delegations it tracks have diverged.
pub fn release(quota: &mut LicenseQuota, units: u64) {
    match quota.license_count.checked_sub(units) {
        Some(count) => quota.license_count = count,
        None => {
            tracing::error!(
                "License count underflow: releasing {} of {}",
                units,
                quota.license_count
            );
            panic!(
                "license count would go negative ({} - {})",
                quota.license_count, units
            );
        }
    }
}
