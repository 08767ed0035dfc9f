// crates/strata-staking/src/whitelist.rs
//
// Whitelist registry: the delegators a special-mode validator admits.
//
// A validator's operator may always delegate to it; anyone else must be on
// its whitelist. The list is a set, so adding the same delegator twice is a
// no-op.

use strata_core::codec;
use strata_core::identity::Address;
use strata_core::policy::WhitelistDelegator;
use strata_core::traits::KvStore;
use strata_core::validator::Validator;

use crate::error::StakingError;
use crate::keys::{whitelist_key, WHITELIST_PREFIX};
use crate::registry;

pub fn get_whitelist(
    store: &dyn KvStore,
    validator: &Address,
) -> Result<Option<WhitelistDelegator>, StakingError> {
    match store.get(&whitelist_key(validator))? {
        Some(bytes) => Ok(Some(codec::decode(&bytes)?)),
        None => Ok(None),
    }
}

pub fn set_whitelist(store: &mut dyn KvStore, list: &WhitelistDelegator) -> Result<(), StakingError> {
    store.set(&whitelist_key(&list.validator), &codec::encode(list)?)?;
    Ok(())
}

/// Every whitelist, in validator key order.
pub fn all_whitelists(store: &dyn KvStore) -> Result<Vec<WhitelistDelegator>, StakingError> {
    store
        .prefix_scan(&[WHITELIST_PREFIX])?
        .into_iter()
        .map(|(_, bytes)| codec::decode(&bytes).map_err(StakingError::from))
        .collect()
}

/// Add `delegator` to the validator's whitelist, creating the record on first
/// use. Returns whether the delegator was newly added.
pub fn add_delegator(
    store: &mut dyn KvStore,
    validator: &Address,
    delegator: Address,
) -> Result<bool, StakingError> {
    let mut list =
        get_whitelist(store, validator)?.unwrap_or_else(|| WhitelistDelegator::new(*validator));
    let inserted = list.delegators.insert(delegator);
    set_whitelist(store, &list)?;
    Ok(inserted)
}

/// Remove `delegator` from the validator's whitelist. A validator without a
/// whitelist is left alone. Returns whether anything was removed.
pub fn remove_delegator(
    store: &mut dyn KvStore,
    validator: &Address,
    delegator: &Address,
) -> Result<bool, StakingError> {
    let Some(mut list) = get_whitelist(store, validator)? else {
        return Ok(false);
    };
    let removed = list.delegators.remove(delegator);
    if removed {
        set_whitelist(store, &list)?;
    }
    Ok(removed)
}

/// Whether `delegator` may delegate to a special-mode `validator`.
pub fn is_special_delegator(
    store: &dyn KvStore,
    validator: &Validator,
    delegator: &Address,
) -> Result<bool, StakingError> {
    if validator.operator == *delegator {
        return Ok(true);
    }
    Ok(get_whitelist(store, &validator.operator)?
        .map(|list| list.contains(delegator))
        .unwrap_or(false))
}

fn require_operator(caller: &Address, validator: &Address) -> Result<(), StakingError> {
    if caller != validator {
        return Err(StakingError::Unauthorized(format!(
            "{} does not operate validator {}",
            caller, validator
        )));
    }
    Ok(())
}

/// Operator-signed whitelist addition.
pub fn create_whitelist_delegator(
    store: &mut dyn KvStore,
    caller: &Address,
    validator: &Address,
    delegator: Address,
) -> Result<WhitelistDelegator, StakingError> {
    require_operator(caller, validator)?;
    registry::must_get_validator(store, validator)?;
    if add_delegator(store, validator, delegator)? {
        tracing::debug!("Whitelisted {} on validator {}", delegator, validator);
    }
    get_whitelist(store, validator)?.ok_or(StakingError::WhitelistNotFound(*validator))
}

/// Operator-signed whitelist removal. Fails only when the validator has no
/// whitelist at all.
pub fn delete_whitelist_delegator(
    store: &mut dyn KvStore,
    caller: &Address,
    validator: &Address,
    delegator: &Address,
) -> Result<WhitelistDelegator, StakingError> {
    require_operator(caller, validator)?;
    registry::must_get_validator(store, validator)?;
    if get_whitelist(store, validator)?.is_none() {
        return Err(StakingError::WhitelistNotFound(*validator));
    }
    if remove_delegator(store, validator, delegator)? {
        tracing::debug!("Removed {} from whitelist of {}", delegator, validator);
    }
    get_whitelist(store, validator)?.ok_or(StakingError::WhitelistNotFound(*validator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{make_validator, store_validator};
    use strata_core::validator::ValidatorMode;
    use strata_store::MemStore;

    const VAL: Address = Address([9u8; 20]);
    const ALICE: Address = Address([1u8; 20]);
    const BOB: Address = Address([2u8; 20]);

    #[test]
    fn test_add_is_idempotent() {
        let mut store = MemStore::new();
        assert!(add_delegator(&mut store, &VAL, ALICE).unwrap());
        assert!(!add_delegator(&mut store, &VAL, ALICE).unwrap());
        let list = get_whitelist(&store, &VAL).unwrap().unwrap();
        assert_eq!(list.delegators.len(), 1);
    }

    #[test]
    fn test_remove_without_record_is_noop() {
        let mut store = MemStore::new();
        assert!(!remove_delegator(&mut store, &VAL, &ALICE).unwrap());
        assert!(get_whitelist(&store, &VAL).unwrap().is_none());
    }

    #[test]
    fn test_record_may_persist_empty() {
        let mut store = MemStore::new();
        add_delegator(&mut store, &VAL, ALICE).unwrap();
        assert!(remove_delegator(&mut store, &VAL, &ALICE).unwrap());
        let list = get_whitelist(&store, &VAL).unwrap().unwrap();
        assert!(list.delegators.is_empty());
    }

    #[test]
    fn test_is_special_delegator() {
        let mut store = MemStore::new();
        let mut validator = make_validator(VAL);
        validator.mode = ValidatorMode::Special;
        assert!(is_special_delegator(&store, &validator, &VAL).unwrap());
        assert!(!is_special_delegator(&store, &validator, &ALICE).unwrap());
        add_delegator(&mut store, &VAL, ALICE).unwrap();
        assert!(is_special_delegator(&store, &validator, &ALICE).unwrap());
        assert!(!is_special_delegator(&store, &validator, &BOB).unwrap());
    }

    #[test]
    fn test_management_requires_operator() {
        let mut store = MemStore::new();
        store_validator(&mut store, &make_validator(VAL));
        assert!(matches!(
            create_whitelist_delegator(&mut store, &ALICE, &VAL, BOB),
            Err(StakingError::Unauthorized(_))
        ));
        let list = create_whitelist_delegator(&mut store, &VAL, &VAL, BOB).unwrap();
        assert!(list.contains(&BOB));
    }

    #[test]
    fn test_delete_requires_existing_record() {
        let mut store = MemStore::new();
        store_validator(&mut store, &make_validator(VAL));
        assert!(matches!(
            delete_whitelist_delegator(&mut store, &VAL, &VAL, &ALICE),
            Err(StakingError::WhitelistNotFound(_))
        ));

        create_whitelist_delegator(&mut store, &VAL, &VAL, BOB).unwrap();
        // Absent delegator on an existing record is a silent no-op.
        let list = delete_whitelist_delegator(&mut store, &VAL, &VAL, &ALICE).unwrap();
        assert!(list.contains(&BOB));
        let list = delete_whitelist_delegator(&mut store, &VAL, &VAL, &BOB).unwrap();
        assert!(list.delegators.is_empty());
    }

    #[test]
    fn test_all_whitelists_in_key_order() {
        let mut store = MemStore::new();
        add_delegator(&mut store, &Address([5u8; 20]), ALICE).unwrap();
        add_delegator(&mut store, &Address([3u8; 20]), BOB).unwrap();
        let lists = all_whitelists(&store).unwrap();
        assert_eq!(lists.len(), 2);
        assert_eq!(lists[0].validator, Address([3u8; 20]));
    }
}
