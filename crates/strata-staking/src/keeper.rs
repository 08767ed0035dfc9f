// crates/strata-staking/src/keeper.rs
//
// Transition orchestrator.
//
// `StakingKeeper` is the engine's public face. Each state-changing method runs
// against a `CacheStore` overlay of the caller's store and commits it as one
// batch only when the whole transition succeeds, so a failed transition leaves
// the store untouched. Queries read the store directly.

use chrono::{DateTime, Utc};

use strata_core::amount::{Coin, Shares, Tokens};
use strata_core::delegation::{Delegation, RedelegationEntry, UnbondingEntry};
use strata_core::identity::{Address, ConsAddress};
use strata_core::params::StakingParams;
use strata_core::policy::{ValidatorApproval, WhitelistDelegator};
use strata_core::traits::KvStore;
use strata_core::validator::Validator;
use strata_store::CacheStore;

use crate::error::StakingError;
use crate::genesis::{self, GenesisState};
use crate::maturity::{self, MaturityReport};
use crate::msgs::{CreateValidator, EditValidator, RedelegateOutcome, UndelegateOutcome};
use crate::{approval, ledger, redelegation, registry, slash, unbonding, whitelist};

/// Run `op` against a staging overlay and commit it only if `op` succeeds.
fn staged<T>(
    store: &mut dyn KvStore,
    op: impl FnOnce(&mut dyn KvStore) -> Result<T, StakingError>,
) -> Result<T, StakingError> {
    let mut cache = CacheStore::new(store);
    let output = op(&mut cache)?;
    cache.commit()?;
    Ok(output)
}

#[derive(Debug, Clone)]
pub struct StakingKeeper {
    params: StakingParams,
}

impl StakingKeeper {
    pub fn new(params: StakingParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &StakingParams {
        &self.params
    }

    // ---------------------------------------------------------------
    // Transitions
    // ---------------------------------------------------------------

    pub fn create_validator(
        &self,
        store: &mut dyn KvStore,
        msg: CreateValidator,
        now: DateTime<Utc>,
    ) -> Result<Shares, StakingError> {
        staged(store, |s| registry::create_validator(s, &self.params, msg, now))
    }

    pub fn edit_validator(
        &self,
        store: &mut dyn KvStore,
        msg: EditValidator,
        now: DateTime<Utc>,
    ) -> Result<Validator, StakingError> {
        staged(store, |s| registry::edit_validator(s, msg, now))
    }

    pub fn delegate(
        &self,
        store: &mut dyn KvStore,
        delegator: &Address,
        validator: &Address,
        amount: &Coin,
    ) -> Result<Shares, StakingError> {
        staged(store, |s| {
            ledger::delegate(s, &self.params, delegator, validator, amount)
        })
    }

    pub fn undelegate(
        &self,
        store: &mut dyn KvStore,
        delegator: &Address,
        validator: &Address,
        amount: &Coin,
        now: DateTime<Utc>,
    ) -> Result<UndelegateOutcome, StakingError> {
        staged(store, |s| {
            unbonding::undelegate(s, &self.params, delegator, validator, amount, now)
        })
    }

    pub fn begin_redelegate(
        &self,
        store: &mut dyn KvStore,
        delegator: &Address,
        src: &Address,
        dst: &Address,
        amount: &Coin,
        now: DateTime<Utc>,
    ) -> Result<RedelegateOutcome, StakingError> {
        staged(store, |s| {
            redelegation::begin_redelegate(s, &self.params, delegator, src, dst, amount, now)
        })
    }

    pub fn set_validator_approval(
        &self,
        store: &mut dyn KvStore,
        caller: &Address,
        new_approver: Address,
        enabled: bool,
    ) -> Result<ValidatorApproval, StakingError> {
        staged(store, |s| {
            approval::transfer_approval(s, caller, new_approver, enabled)
        })
    }

    pub fn create_whitelist_delegator(
        &self,
        store: &mut dyn KvStore,
        caller: &Address,
        validator: &Address,
        delegator: Address,
    ) -> Result<WhitelistDelegator, StakingError> {
        staged(store, |s| {
            whitelist::create_whitelist_delegator(s, caller, validator, delegator)
        })
    }

    pub fn delete_whitelist_delegator(
        &self,
        store: &mut dyn KvStore,
        caller: &Address,
        validator: &Address,
        delegator: &Address,
    ) -> Result<WhitelistDelegator, StakingError> {
        staged(store, |s| {
            whitelist::delete_whitelist_delegator(s, caller, validator, delegator)
        })
    }

    /// Maturity driver: settle every queue entry due at `now`.
    pub fn complete_matured(
        &self,
        store: &mut dyn KvStore,
        now: DateTime<Utc>,
    ) -> Result<MaturityReport, StakingError> {
        staged(store, |s| maturity::complete_matured(s, now))
    }

    pub fn slash_validator_tokens(
        &self,
        store: &mut dyn KvStore,
        operator: &Address,
        amount: Tokens,
    ) -> Result<Tokens, StakingError> {
        staged(store, |s| slash::slash_validator_tokens(s, operator, amount))
    }

    pub fn slash_unbonding_entry(
        &self,
        store: &mut dyn KvStore,
        delegator: &Address,
        validator: &Address,
        sequence: u64,
        amount: Tokens,
    ) -> Result<Tokens, StakingError> {
        staged(store, |s| {
            slash::slash_unbonding_entry(s, delegator, validator, sequence, amount)
        })
    }

    pub fn init_genesis(
        &self,
        store: &mut dyn KvStore,
        state: &GenesisState,
    ) -> Result<(), StakingError> {
        staged(store, |s| genesis::init_genesis(s, state))
    }

    pub fn export_genesis(&self, store: &dyn KvStore) -> Result<GenesisState, StakingError> {
        genesis::export_genesis(store, &self.params)
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    pub fn validator(
        &self,
        store: &dyn KvStore,
        operator: &Address,
    ) -> Result<Option<Validator>, StakingError> {
        registry::get_validator(store, operator)
    }

    pub fn validators(&self, store: &dyn KvStore) -> Result<Vec<Validator>, StakingError> {
        registry::all_validators(store)
    }

    pub fn validator_by_cons_addr(
        &self,
        store: &dyn KvStore,
        cons: &ConsAddress,
    ) -> Result<Option<Validator>, StakingError> {
        registry::validator_by_cons_addr(store, cons)
    }

    pub fn delegation(
        &self,
        store: &dyn KvStore,
        delegator: &Address,
        validator: &Address,
    ) -> Result<Option<Delegation>, StakingError> {
        ledger::get_delegation(store, delegator, validator)
    }

    pub fn delegator_delegations(
        &self,
        store: &dyn KvStore,
        delegator: &Address,
    ) -> Result<Vec<Delegation>, StakingError> {
        ledger::delegator_delegations(store, delegator)
    }

    pub fn validator_delegations(
        &self,
        store: &dyn KvStore,
        validator: &Address,
    ) -> Result<Vec<Delegation>, StakingError> {
        ledger::validator_delegations(store, validator)
    }

    pub fn unbonding_entries(
        &self,
        store: &dyn KvStore,
        delegator: &Address,
        validator: &Address,
    ) -> Result<Vec<UnbondingEntry>, StakingError> {
        unbonding::unbonding_entries(store, delegator, validator)
    }

    pub fn redelegation_entries(
        &self,
        store: &dyn KvStore,
        delegator: &Address,
        src: &Address,
        dst: &Address,
    ) -> Result<Vec<RedelegationEntry>, StakingError> {
        redelegation::redelegation_entries(store, delegator, src, dst)
    }

    pub fn has_active_redelegation(
        &self,
        store: &dyn KvStore,
        delegator: &Address,
        validator: &Address,
    ) -> Result<bool, StakingError> {
        redelegation::has_active_redelegation(store, delegator, validator)
    }

    pub fn approval(&self, store: &dyn KvStore) -> Result<ValidatorApproval, StakingError> {
        approval::load_approval(store)
    }

    pub fn whitelist(
        &self,
        store: &dyn KvStore,
        validator: &Address,
    ) -> Result<Option<WhitelistDelegator>, StakingError> {
        whitelist::get_whitelist(store, validator)
    }

    pub fn all_whitelists(&self, store: &dyn KvStore) -> Result<Vec<WhitelistDelegator>, StakingError> {
        whitelist::all_whitelists(store)
    }

    pub fn is_special_delegator(
        &self,
        store: &dyn KvStore,
        validator: &Address,
        delegator: &Address,
    ) -> Result<bool, StakingError> {
        let validator = registry::must_get_validator(store, validator)?;
        whitelist::is_special_delegator(store, &validator, delegator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{create_msg, init_approval, license_validator, store_validator, t0};
    use strata_store::MemStore;

    const OP: Address = Address([7u8; 20]);
    const ALICE: Address = Address([1u8; 20]);

    #[test]
    fn test_staged_discards_on_error() {
        let mut store = MemStore::new();
        store.set(b"kept", b"1").unwrap();
        let result: Result<(), StakingError> = staged(&mut store, |s| {
            s.set(b"kept", b"2")?;
            s.set(b"new", b"3")?;
            Err(StakingError::RedelegationDisabled)
        });
        assert!(result.is_err());
        assert_eq!(store.get(b"kept").unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.get(b"new").unwrap(), None);
    }

    #[test]
    fn test_rejected_delegation_keeps_quota() {
        let mut store = MemStore::new();
        store_validator(&mut store, &license_validator(OP, 100, 50, 3));
        let keeper = StakingKeeper::new(StakingParams::default());

        keeper
            .delegate(&mut store, &ALICE, &OP, &Coin::new("ustrata", 200))
            .unwrap();
        let entries = store.len();
        assert!(matches!(
            keeper.delegate(&mut store, &Address([2u8; 20]), &OP, &Coin::new("ustrata", 100)),
            Err(StakingError::LicenseLimit { max_license: 3 })
        ));
        assert_eq!(store.len(), entries);
        let validator = keeper.validator(&store, &OP).unwrap().unwrap();
        assert_eq!(validator.license().unwrap().license_count, 3);
    }

    #[test]
    fn test_create_then_query() {
        let mut store = MemStore::new();
        init_approval(&mut store, true);
        let keeper = StakingKeeper::new(StakingParams::default());
        keeper.create_validator(&mut store, create_msg(OP, 500), t0()).unwrap();

        let validator = keeper.validator(&store, &OP).unwrap().unwrap();
        let cons = validator.consensus_pubkey.address();
        assert_eq!(
            keeper.validator_by_cons_addr(&store, &cons).unwrap().unwrap().operator,
            OP
        );
        assert_eq!(keeper.validators(&store).unwrap().len(), 1);
        assert_eq!(keeper.validator_delegations(&store, &OP).unwrap().len(), 1);
        assert!(keeper.approval(&store).unwrap().enabled);
    }
}
