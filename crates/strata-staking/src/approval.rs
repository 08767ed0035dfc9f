// crates/strata-staking/src/approval.rs
//
// Validator approval gate.
//
// A singleton written at genesis decides who may create validators. It is
// loaded explicitly and handed to the creation check rather than read as
// ambient state.

use strata_core::codec;
use strata_core::identity::Address;
use strata_core::policy::ValidatorApproval;
use strata_core::traits::KvStore;

use crate::error::StakingError;
use crate::keys::APPROVAL_KEY;

/// Load the approval singleton.
///
/// # Errors
/// `StakingError::MissingApproval` if genesis never wrote it. That error is
/// fatal: the host should stop rather than reject a transaction.
pub fn load_approval(store: &dyn KvStore) -> Result<ValidatorApproval, StakingError> {
    match store.get(APPROVAL_KEY)? {
        Some(bytes) => Ok(codec::decode(&bytes)?),
        None => Err(StakingError::MissingApproval),
    }
}

pub fn set_approval(store: &mut dyn KvStore, approval: &ValidatorApproval) -> Result<(), StakingError> {
    store.set(APPROVAL_KEY, &codec::encode(approval)?)?;
    Ok(())
}

/// Whether `caller` may create a validator under `approval`.
pub fn check_create_authorized(
    approval: &ValidatorApproval,
    caller: &Address,
) -> Result<(), StakingError> {
    if approval.enabled && approval.approver != *caller {
        return Err(StakingError::Unauthorized(format!(
            "{} is not the validator approver",
            caller
        )));
    }
    Ok(())
}

/// Hand the approver role to `new_approver` and set the gate.
///
/// # Panics
/// If the singleton is missing; genesis must have written it.
pub fn transfer_approval(
    store: &mut dyn KvStore,
    caller: &Address,
    new_approver: Address,
    enabled: bool,
) -> Result<ValidatorApproval, StakingError> {
    let current = match load_approval(store) {
        Ok(approval) => approval,
        Err(StakingError::MissingApproval) => {
            tracing::error!("Validator approval singleton missing during transfer");
            panic!("validator approval singleton is not initialized");
        }
        Err(e) => return Err(e),
    };

    if current.approver != *caller {
        return Err(StakingError::Unauthorized(format!(
            "{} is not the current approver",
            caller
        )));
    }

    let updated = ValidatorApproval {
        approver: new_approver,
        enabled,
    };
    set_approval(store, &updated)?;
    tracing::info!(
        "Validator approval transferred to {} (enabled: {})",
        updated.approver,
        updated.enabled
    );
    Ok(updated)
}
