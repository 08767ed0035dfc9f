// crates/strata-staking/src/unbonding.rs
//
// Unbonding queue and the Undelegate transition.
//
// An entry is stored under (delegator, validator, sequence) and indexed in a
// time queue keyed (completion time, sequence). The maturity driver drains
// the queue in key order, which is completion time with insertion order
// breaking ties.

use chrono::{DateTime, Utc};

use strata_core::amount::Coin;
use strata_core::codec;
use strata_core::delegation::UnbondingEntry;
use strata_core::error::StrataError;
use strata_core::identity::Address;
use strata_core::params::StakingParams;
use strata_core::traits::KvStore;

use crate::error::StakingError;
use crate::keys::{
    next_sequence, queue_upper_bound, unbonding_key, unbonding_pair_prefix, unbonding_queue_key,
    UNBONDING_PREFIX, UNBONDING_QUEUE_PREFIX,
};
use crate::msgs::UndelegateOutcome;
use crate::{ladder, ledger, registry};

pub fn get_entry(
    store: &dyn KvStore,
    delegator: &Address,
    validator: &Address,
    sequence: u64,
) -> Result<Option<UnbondingEntry>, StakingError> {
    match store.get(&unbonding_key(delegator, validator, sequence))? {
        Some(bytes) => Ok(Some(codec::decode(&bytes)?)),
        None => Ok(None),
    }
}

/// Store an entry and its queue index.
pub fn set_entry(store: &mut dyn KvStore, entry: &UnbondingEntry) -> Result<(), StakingError> {
    let key = unbonding_key(&entry.delegator, &entry.validator, entry.sequence);
    store.set(&key, &codec::encode(entry)?)?;
    store.set(
        &unbonding_queue_key(entry.completion_time, entry.sequence),
        &key,
    )?;
    Ok(())
}

pub fn remove_entry(store: &mut dyn KvStore, entry: &UnbondingEntry) -> Result<(), StakingError> {
    store.delete(&unbonding_key(&entry.delegator, &entry.validator, entry.sequence))?;
    store.delete(&unbonding_queue_key(entry.completion_time, entry.sequence))?;
    Ok(())
}

/// Live entries for one (delegator, validator) pair, oldest first.
pub fn unbonding_entries(
    store: &dyn KvStore,
    delegator: &Address,
    validator: &Address,
) -> Result<Vec<UnbondingEntry>, StakingError> {
    store
        .prefix_scan(&unbonding_pair_prefix(delegator, validator))?
        .into_iter()
        .map(|(_, bytes)| codec::decode(&bytes).map_err(StakingError::from))
        .collect()
}

pub fn all_entries(store: &dyn KvStore) -> Result<Vec<UnbondingEntry>, StakingError> {
    store
        .prefix_scan(&[UNBONDING_PREFIX])?
        .into_iter()
        .map(|(_, bytes)| codec::decode(&bytes).map_err(StakingError::from))
        .collect()
}

/// Remove and return every entry with `completion_time <= now`, in
/// (completion time, sequence) order.
pub fn dequeue_matured(
    store: &mut dyn KvStore,
    now: DateTime<Utc>,
) -> Result<Vec<UnbondingEntry>, StakingError> {
    let bound = queue_upper_bound(UNBONDING_QUEUE_PREFIX, now);
    let queued = store.range(&[UNBONDING_QUEUE_PREFIX], Some(&bound))?;

    let mut matured = Vec::with_capacity(queued.len());
    for (queue_key, entry_key) in queued {
        let bytes = store.get(&entry_key)?.ok_or_else(|| {
            StrataError::InvalidState(format!(
                "unbonding queue points at missing entry {}",
                entry_key.iter().map(|b| format!("{:02x}", b)).collect::<String>()
            ))
        })?;
        let entry: UnbondingEntry = codec::decode(&bytes)?;
        store.delete(&entry_key)?;
        store.delete(&queue_key)?;
        matured.push(entry);
    }
    Ok(matured)
}

/// Undelegate `coin` worth of shares from `validator_addr`.
///
/// Standard and license validators escrow the released tokens in an unbonding
/// entry that matures after the unbonding period. Special validators settle
/// at once and create no entry.
pub fn undelegate(
    store: &mut dyn KvStore,
    params: &StakingParams,
    delegator: &Address,
    validator_addr: &Address,
    coin: &Coin,
    now: DateTime<Utc>,
) -> Result<UndelegateOutcome, StakingError> {
    let mut validator = registry::must_get_validator(store, validator_addr)?;
    ledger::check_bond_coin(params, coin)?;

    let request = ledger::validate_unbond_amount(store, &validator, delegator, coin.amount)?;

    let units = if validator.license().is_some() {
        ladder::unbond_units(
            &validator.ladder,
            coin.amount,
            request.remaining,
            request.full_exit,
            request.delegation.license_units,
        )?
    } else {
        0
    };

    if validator.mode.is_special() {
        let amount = ledger::debit(store, &mut validator, request, units)?;
        tracing::debug!(
            "Special undelegation of {} from {} by {} settled",
            amount,
            validator_addr,
            delegator
        );
        return Ok(UndelegateOutcome::Settled {
            amount,
            completion_time: now,
        });
    }

    if unbonding_entries(store, delegator, validator_addr)?.len() >= params.max_entries as usize {
        return Err(StakingError::TooManyEntries);
    }

    let completion_time = params.completion_time(now)?;
    let amount = ledger::debit(store, &mut validator, request, units)?;
    let sequence = next_sequence(store)?;
    let entry = UnbondingEntry {
        delegator: *delegator,
        validator: *validator_addr,
        sequence,
        creation_time: now,
        completion_time,
        initial_balance: amount,
        balance: amount,
    };
    set_entry(store, &entry)?;

    tracing::debug!(
        "Undelegated {} from {} by {}, matures at {}",
        amount,
        validator_addr,
        delegator,
        completion_time
    );
    Ok(UndelegateOutcome::Queued {
        amount,
        completion_time,
        sequence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{license_validator, make_validator, store_validator, t0};
    use chrono::Duration;
    use strata_core::validator::ValidatorMode;
    use strata_store::MemStore;

    const VAL: Address = Address([9u8; 20]);
    const ALICE: Address = Address([1u8; 20]);

    fn coin(amount: u64) -> Coin {
        Coin::new("ustrata", amount)
    }

    fn entry(delegator: Address, seq: u64, completion: DateTime<Utc>) -> UnbondingEntry {
        UnbondingEntry {
            delegator,
            validator: VAL,
            sequence: seq,
            creation_time: t0(),
            completion_time: completion,
            initial_balance: 10,
            balance: 10,
        }
    }

    #[test]
    fn test_dequeue_orders_by_time_then_sequence() {
        let mut store = MemStore::new();
        let later = t0() + Duration::seconds(20);
        let sooner = t0() + Duration::seconds(10);
        set_entry(&mut store, &entry(ALICE, 5, sooner)).unwrap();
        set_entry(&mut store, &entry(ALICE, 2, later)).unwrap();
        set_entry(&mut store, &entry(Address([0u8; 20]), 9, sooner)).unwrap();

        assert!(dequeue_matured(&mut store, t0()).unwrap().is_empty());

        let matured = dequeue_matured(&mut store, later).unwrap();
        let order: Vec<u64> = matured.iter().map(|e| e.sequence).collect();
        assert_eq!(order, vec![5, 9, 2]);
        assert!(all_entries(&store).unwrap().is_empty());
    }

    #[test]
    fn test_dequeue_includes_exact_completion_time() {
        let mut store = MemStore::new();
        let at = t0() + Duration::seconds(10);
        set_entry(&mut store, &entry(ALICE, 0, at)).unwrap();
        assert!(dequeue_matured(&mut store, at - Duration::nanoseconds(1))
            .unwrap()
            .is_empty());
        assert_eq!(dequeue_matured(&mut store, at).unwrap().len(), 1);
    }

    #[test]
    fn test_undelegate_queues_entry() {
        let mut store = MemStore::new();
        store_validator(&mut store, &make_validator(VAL));
        let params = StakingParams::default();
        ledger::delegate(&mut store, &params, &ALICE, &VAL, &coin(100)).unwrap();

        let outcome = undelegate(&mut store, &params, &ALICE, &VAL, &coin(40), t0()).unwrap();
        assert_eq!(outcome.amount(), 40);
        assert_eq!(outcome.completion_time(), params.completion_time(t0()).unwrap());

        let entries = unbonding_entries(&store, &ALICE, &VAL).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].balance, 40);
        assert_eq!(registry::must_get_validator(&store, &VAL).unwrap().tokens, 60);
    }

    #[test]
    fn test_special_undelegate_settles_immediately() {
        let mut store = MemStore::new();
        let mut validator = make_validator(VAL);
        validator.mode = ValidatorMode::Special;
        store_validator(&mut store, &validator);
        let params = StakingParams::default();
        ledger::delegate(&mut store, &params, &VAL, &VAL, &coin(100)).unwrap();

        let outcome = undelegate(&mut store, &params, &VAL, &VAL, &coin(30), t0()).unwrap();
        assert_eq!(
            outcome,
            UndelegateOutcome::Settled {
                amount: 30,
                completion_time: t0()
            }
        );
        assert!(all_entries(&store).unwrap().is_empty());
    }

    #[test]
    fn test_license_undelegate_releases_units() {
        let mut store = MemStore::new();
        store_validator(&mut store, &license_validator(VAL, 100, 50, 5));
        let params = StakingParams::default();
        ledger::delegate(&mut store, &params, &ALICE, &VAL, &coin(200)).unwrap();

        assert!(matches!(
            undelegate(&mut store, &params, &ALICE, &VAL, &coin(30), t0()),
            Err(StakingError::InvalidIncrementDelegation { .. })
        ));
        assert!(matches!(
            undelegate(&mut store, &params, &ALICE, &VAL, &coin(150), t0()),
            Err(StakingError::DelegationBelowMinimum { .. })
        ));

        undelegate(&mut store, &params, &ALICE, &VAL, &coin(50), t0()).unwrap();
        let validator = registry::must_get_validator(&store, &VAL).unwrap();
        assert_eq!(validator.license().unwrap().license_count, 2);

        undelegate(&mut store, &params, &ALICE, &VAL, &coin(150), t0()).unwrap();
        let validator = registry::must_get_validator(&store, &VAL).unwrap();
        assert_eq!(validator.license().unwrap().license_count, 0);
        assert!(ledger::get_delegation(&store, &ALICE, &VAL).unwrap().is_none());
    }

    #[test]
    fn test_entry_limit() {
        let mut store = MemStore::new();
        store_validator(&mut store, &make_validator(VAL));
        let params = StakingParams {
            max_entries: 2,
            ..StakingParams::default()
        };
        ledger::delegate(&mut store, &params, &ALICE, &VAL, &coin(100)).unwrap();
        undelegate(&mut store, &params, &ALICE, &VAL, &coin(10), t0()).unwrap();
        undelegate(&mut store, &params, &ALICE, &VAL, &coin(10), t0()).unwrap();
        assert!(matches!(
            undelegate(&mut store, &params, &ALICE, &VAL, &coin(10), t0()),
            Err(StakingError::TooManyEntries)
        ));
    }

    #[test]
    fn test_unrepresentable_completion_time_is_an_error() {
        let mut store = MemStore::new();
        store_validator(&mut store, &make_validator(VAL));
        let params = StakingParams {
            unbonding_time_secs: i64::MAX,
            ..StakingParams::default()
        };
        ledger::delegate(&mut store, &params, &ALICE, &VAL, &coin(100)).unwrap();

        let err = undelegate(&mut store, &params, &ALICE, &VAL, &coin(10), t0()).unwrap_err();
        assert!(matches!(err, StakingError::Store(_)));
        assert!(err.is_fatal());
        assert_eq!(registry::must_get_validator(&store, &VAL).unwrap().tokens, 100);
        assert!(unbonding_entries(&store, &ALICE, &VAL).unwrap().is_empty());
    }
}
