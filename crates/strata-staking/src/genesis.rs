// crates/strata-staking/src/genesis.rs
//
// Genesis import and export of the complete staking state.

use serde::{Deserialize, Serialize};

use strata_core::delegation::{Delegation, RedelegationEntry, UnbondingEntry};
use strata_core::params::StakingParams;
use strata_core::policy::{ValidatorApproval, WhitelistDelegator};
use strata_core::traits::KvStore;
use strata_core::validator::Validator;

use crate::error::StakingError;
use crate::keys::bump_sequence_past;
use crate::{approval, invariants, ledger, redelegation, registry, unbonding, whitelist};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenesisState {
    #[serde(default)]
    pub params: StakingParams,
    pub approval: ValidatorApproval,
    #[serde(default)]
    pub validators: Vec<Validator>,
    #[serde(default)]
    pub delegations: Vec<Delegation>,
    #[serde(default)]
    pub unbonding_entries: Vec<UnbondingEntry>,
    #[serde(default)]
    pub redelegation_entries: Vec<RedelegationEntry>,
    #[serde(default)]
    pub whitelists: Vec<WhitelistDelegator>,
}

impl GenesisState {
    /// Empty state with only parameters and the approval singleton.
    pub fn new(params: StakingParams, approval: ValidatorApproval) -> Self {
        Self {
            params,
            approval,
            validators: Vec::new(),
            delegations: Vec::new(),
            unbonding_entries: Vec::new(),
            redelegation_entries: Vec::new(),
            whitelists: Vec::new(),
        }
    }
}

/// Write `genesis` into an empty store and verify the result.
pub fn init_genesis(store: &mut dyn KvStore, genesis: &GenesisState) -> Result<(), StakingError> {
    genesis
        .params
        .validate()
        .map_err(|e| StakingError::InvalidGenesis(e.to_string()))?;
    approval::set_approval(store, &genesis.approval)?;

    for validator in &genesis.validators {
        if registry::get_validator(store, &validator.operator)?.is_some() {
            return Err(StakingError::InvalidGenesis(format!(
                "duplicate validator {}",
                validator.operator
            )));
        }
        registry::set_validator(store, validator)?;
        registry::set_validator_by_cons_addr(store, validator)?;
    }

    for delegation in &genesis.delegations {
        if delegation.shares.is_zero() || delegation.shares.is_sign_negative() {
            return Err(StakingError::InvalidGenesis(format!(
                "delegation {} -> {} has no shares",
                delegation.delegator, delegation.validator
            )));
        }
        ledger::set_delegation(store, delegation)?;
    }

    for entry in &genesis.unbonding_entries {
        unbonding::set_entry(store, entry)?;
        bump_sequence_past(store, entry.sequence)?;
    }
    for entry in &genesis.redelegation_entries {
        redelegation::set_entry(store, entry)?;
        bump_sequence_past(store, entry.sequence)?;
    }
    for list in &genesis.whitelists {
        whitelist::set_whitelist(store, list)?;
    }

    invariants::check_all(store).map_err(|broken| StakingError::InvalidGenesis(broken.to_string()))?;

    tracing::info!(
        "Initialized staking genesis: {} validators, {} delegations, {} unbonding, {} redelegation entries",
        genesis.validators.len(),
        genesis.delegations.len(),
        genesis.unbonding_entries.len(),
        genesis.redelegation_entries.len()
    );
    Ok(())
}

/// Read the full staking state back out, in key order.
pub fn export_genesis(
    store: &dyn KvStore,
    params: &StakingParams,
) -> Result<GenesisState, StakingError> {
    Ok(GenesisState {
        params: params.clone(),
        approval: approval::load_approval(store)?,
        validators: registry::all_validators(store)?,
        delegations: ledger::all_delegations(store)?,
        unbonding_entries: unbonding::all_entries(store)?,
        redelegation_entries: redelegation::all_entries(store)?,
        whitelists: whitelist::all_whitelists(store)?,
    })
}
