// crates/strata-staking/src/registry.rs
//
// Validator registry: validator records, the consensus-address index, and the
// CreateValidator / EditValidator transitions.
//
// Validators are never deleted here. A full exit drains a validator's shares
// but the record stays for queries.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use strata_core::amount::Shares;
use strata_core::codec;
use strata_core::identity::{Address, ConsAddress};
use strata_core::params::StakingParams;
use strata_core::traits::KvStore;
use strata_core::validator::{
    BondStatus, Commission, CommissionRates, DelegationLadder, Description, LicenseQuota,
    Validator, ValidatorMode,
};

use crate::error::StakingError;
use crate::keys::{validator_by_cons_key, validator_key, VALIDATOR_PREFIX};
use crate::msgs::{CreateValidator, EditValidator, RequestedMode};
use crate::{approval, ladder, ledger, shares};

/// Minimum time between two commission rate changes.
pub const COMMISSION_CHANGE_INTERVAL_HOURS: i64 = 24;

pub fn get_validator(
    store: &dyn KvStore,
    operator: &Address,
) -> Result<Option<Validator>, StakingError> {
    match store.get(&validator_key(operator))? {
        Some(bytes) => Ok(Some(codec::decode(&bytes)?)),
        None => Ok(None),
    }
}

/// Like [`get_validator`] but a missing validator is an error.
pub fn must_get_validator(store: &dyn KvStore, operator: &Address) -> Result<Validator, StakingError> {
    get_validator(store, operator)?.ok_or(StakingError::ValidatorNotFound(*operator))
}

pub fn set_validator(store: &mut dyn KvStore, validator: &Validator) -> Result<(), StakingError> {
    store.set(&validator_key(&validator.operator), &codec::encode(validator)?)?;
    Ok(())
}

pub fn set_validator_by_cons_addr(
    store: &mut dyn KvStore,
    validator: &Validator,
) -> Result<(), StakingError> {
    let cons = validator.consensus_pubkey.address();
    store.set(&validator_by_cons_key(&cons), validator.operator.as_bytes())?;
    Ok(())
}

pub fn validator_by_cons_addr(
    store: &dyn KvStore,
    cons: &ConsAddress,
) -> Result<Option<Validator>, StakingError> {
    match store.get(&validator_by_cons_key(cons))? {
        Some(bytes) => {
            let operator = Address::from_slice(&bytes)?;
            get_validator(store, &operator)
        }
        None => Ok(None),
    }
}

/// Every validator, in operator order.
pub fn all_validators(store: &dyn KvStore) -> Result<Vec<Validator>, StakingError> {
    store
        .prefix_scan(&[VALIDATOR_PREFIX])?
        .into_iter()
        .map(|(_, bytes)| codec::decode(&bytes).map_err(StakingError::from))
        .collect()
}

/// Check commission rates supplied at creation.
pub fn validate_commission(rates: &CommissionRates) -> Result<(), StakingError> {
    let invalid = |reason: &str| Err(StakingError::InvalidCommission(reason.to_string()));
    if rates.rate.is_sign_negative() || rates.max_rate.is_sign_negative() {
        return invalid("commission rates must not be negative");
    }
    if rates.max_change_rate.is_sign_negative() {
        return invalid("max change rate must not be negative");
    }
    if rates.max_rate > Decimal::ONE {
        return invalid("max rate cannot exceed 1");
    }
    if rates.rate > rates.max_rate {
        return invalid("rate cannot exceed max rate");
    }
    if rates.max_change_rate > rates.max_rate {
        return invalid("max change rate cannot exceed max rate");
    }
    Ok(())
}

/// Apply a new commission rate, enforcing the change interval and bounds.
pub fn update_commission(
    commission: &Commission,
    new_rate: Decimal,
    now: DateTime<Utc>,
) -> Result<Commission, StakingError> {
    let invalid = |reason: &str| Err(StakingError::InvalidCommission(reason.to_string()));
    if now - commission.update_time < Duration::hours(COMMISSION_CHANGE_INTERVAL_HOURS) {
        return invalid("commission cannot be changed more than once in 24h");
    }
    if new_rate.is_sign_negative() {
        return invalid("commission rate must not be negative");
    }
    if new_rate > commission.rates.max_rate {
        return invalid("commission rate cannot exceed max rate");
    }
    if (new_rate - commission.rates.rate).abs() > commission.rates.max_change_rate {
        return invalid("commission change exceeds max change rate");
    }

    let mut updated = commission.clone();
    updated.rates.rate = new_rate;
    updated.update_time = now;
    Ok(updated)
}

fn check_description(description: &Description) -> Result<(), StakingError> {
    match description.overlong_field() {
        Some((field, len, max)) => Err(StakingError::DescriptionTooLong { field, len, max }),
        None => Ok(()),
    }
}

/// Register a validator and bond its self-delegation. Returns the
/// self-delegation shares.
pub fn create_validator(
    store: &mut dyn KvStore,
    params: &StakingParams,
    msg: CreateValidator,
    now: DateTime<Utc>,
) -> Result<Shares, StakingError> {
    let gate = approval::load_approval(store)?;
    approval::check_create_authorized(&gate, &msg.approver)?;

    if get_validator(store, &msg.operator)?.is_some() {
        return Err(StakingError::ValidatorOwnerExists(msg.operator));
    }
    if store.has(&validator_by_cons_key(&msg.consensus_pubkey.address()))? {
        return Err(StakingError::ValidatorPubKeyExists);
    }

    ledger::check_bond_coin(params, &msg.value)?;
    check_description(&msg.description)?;
    validate_commission(&msg.commission)?;
    if msg.min_self_delegation == 0 {
        return Err(StakingError::InvalidAmount(
            "minimum self delegation must be positive".to_string(),
        ));
    }
    if msg.value.amount < msg.min_self_delegation {
        return Err(StakingError::SelfDelegationBelowMinimum);
    }

    let ladder = DelegationLadder {
        min_delegation: msg.min_delegation.or(msg.delegation_increment),
        delegation_increment: msg.delegation_increment,
    };

    let (mode, enable_redelegation) = match msg.mode {
        RequestedMode::License { max_license } => {
            if !matches!(ladder.delegation_increment, Some(step) if step > 0) {
                return Err(StakingError::LicenseIncrementUndefined);
            }
            let max_license = max_license.ok_or(StakingError::MaxLicenseUndefined)?;
            let quota = LicenseQuota {
                max_license,
                license_count: 0,
            };
            (ValidatorMode::License(quota), false)
        }
        RequestedMode::Special => (ValidatorMode::Special, msg.enable_redelegation),
        RequestedMode::Standard => (ValidatorMode::Standard, msg.enable_redelegation),
    };

    let mut validator = Validator {
        operator: msg.operator,
        consensus_pubkey: msg.consensus_pubkey,
        status: BondStatus::Unbonded,
        tokens: 0,
        delegator_shares: Shares::ZERO,
        commission: Commission {
            rates: msg.commission,
            update_time: now,
        },
        min_self_delegation: msg.min_self_delegation,
        jailed: false,
        description: msg.description,
        mode,
        enable_redelegation,
        ladder,
    };

    let units = if validator.license().is_some() {
        ladder::bond_units(&validator.ladder, false, msg.value.amount)?
    } else {
        0
    };

    set_validator(store, &validator)?;
    set_validator_by_cons_addr(store, &validator)?;
    let operator = validator.operator;
    let issued = ledger::credit(store, &mut validator, &operator, msg.value.amount, units)?;

    tracing::info!(
        "Created validator {} ({:?}) with self delegation {}",
        operator,
        validator.mode,
        msg.value
    );
    Ok(issued)
}

/// Edit a validator's description, commission, self-delegation floor or mode.
pub fn edit_validator(
    store: &mut dyn KvStore,
    msg: EditValidator,
    now: DateTime<Utc>,
) -> Result<Validator, StakingError> {
    let mut validator = must_get_validator(store, &msg.operator)?;

    msg.description.apply(&mut validator.description);
    check_description(&validator.description)?;

    if let Some(rate) = msg.commission_rate {
        validator.commission = update_commission(&validator.commission, rate, now)?;
    }

    if let Some(min_self) = msg.min_self_delegation {
        if min_self <= validator.min_self_delegation {
            return Err(StakingError::MinSelfDelegationDecreased);
        }
        if min_self > validator.tokens {
            return Err(StakingError::SelfDelegationBelowMinimum);
        }
        validator.min_self_delegation = min_self;
    }

    if let Some(mode) = msg.mode {
        switch_mode(store, &mut validator, mode)?;
    }

    set_validator(store, &validator)?;
    tracing::debug!("Edited validator {}", validator.operator);
    Ok(validator)
}

fn switch_mode(
    store: &mut dyn KvStore,
    validator: &mut Validator,
    target: RequestedMode,
) -> Result<(), StakingError> {
    match (validator.mode, target) {
        (ValidatorMode::License(quota), RequestedMode::License { max_license }) => {
            if let Some(max_license) = max_license {
                if max_license < quota.max_license {
                    return Err(StakingError::MaxLicenseDecreased {
                        current: quota.max_license,
                        requested: max_license,
                    });
                }
                if let Some(quota) = validator.license_mut() {
                    quota.max_license = max_license;
                }
            }
        }
        (_, RequestedMode::License { max_license }) => {
            let max_license = max_license.ok_or(StakingError::MaxLicenseUndefined)?;
            if !matches!(validator.ladder.delegation_increment, Some(step) if step > 0) {
                return Err(StakingError::LicenseIncrementUndefined);
            }
            if validator.ladder.min_delegation.is_none() {
                validator.ladder.min_delegation = validator.ladder.delegation_increment;
            }

            let mut delegations = ledger::validator_delegations(store, &validator.operator)?;
            let mut total: u64 = 0;
            for delegation in &mut delegations {
                let value = shares::tokens_from_shares(validator, delegation.shares)?;
                delegation.license_units = ladder::units_for_value(&validator.ladder, value)?;
                total += delegation.license_units;
            }
            if total > max_license {
                return Err(StakingError::NotEnoughLicense {
                    requested: total,
                    available: max_license,
                });
            }
            for delegation in &delegations {
                ledger::set_delegation(store, delegation)?;
            }

            validator.mode = ValidatorMode::License(LicenseQuota {
                max_license,
                license_count: total,
            });
            validator.enable_redelegation = false;
        }
        (current, RequestedMode::Standard | RequestedMode::Special) => {
            if current.license().is_some() {
                for mut delegation in ledger::validator_delegations(store, &validator.operator)? {
                    delegation.license_units = 0;
                    ledger::set_delegation(store, &delegation)?;
                }
            }
            validator.mode = match target {
                RequestedMode::Special => ValidatorMode::Special,
                _ => ValidatorMode::Standard,
            };
        }
    }
    Ok(())
}
