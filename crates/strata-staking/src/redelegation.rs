// crates/strata-staking/src/redelegation.rs
//
// Redelegation queue and the BeginRedelegate transition.
//
// A redelegation credits the destination at once; its entry only records
// that the moved stake is still maturing. While an entry into validator V is
// live, the delegator may not redelegate out of V again. Entries are stored
// under (delegator, src, dst, sequence), indexed by (delegator, dst, src,
// sequence) for that check, and queued by (completion time, sequence).

use chrono::{DateTime, Utc};

use strata_core::amount::Coin;
use strata_core::codec;
use strata_core::delegation::RedelegationEntry;
use strata_core::error::StrataError;
use strata_core::identity::Address;
use strata_core::params::StakingParams;
use strata_core::traits::KvStore;

use crate::error::StakingError;
use crate::keys::{
    next_sequence, queue_upper_bound, redelegation_by_dst_key, redelegation_key,
    redelegation_queue_key, redelegation_triple_prefix, redelegations_into_prefix,
    REDELEGATION_PREFIX, REDELEGATION_QUEUE_PREFIX,
};
use crate::msgs::RedelegateOutcome;
use crate::{ladder, ledger, registry, whitelist};

/// Store an entry with its receiving index and queue key.
pub fn set_entry(store: &mut dyn KvStore, entry: &RedelegationEntry) -> Result<(), StakingError> {
    let key = redelegation_key(
        &entry.delegator,
        &entry.validator_src,
        &entry.validator_dst,
        entry.sequence,
    );
    store.set(&key, &codec::encode(entry)?)?;
    store.set(
        &redelegation_by_dst_key(
            &entry.delegator,
            &entry.validator_dst,
            &entry.validator_src,
            entry.sequence,
        ),
        &[],
    )?;
    store.set(
        &redelegation_queue_key(entry.completion_time, entry.sequence),
        &key,
    )?;
    Ok(())
}

fn remove_indexes(store: &mut dyn KvStore, entry: &RedelegationEntry) -> Result<(), StakingError> {
    store.delete(&redelegation_key(
        &entry.delegator,
        &entry.validator_src,
        &entry.validator_dst,
        entry.sequence,
    ))?;
    store.delete(&redelegation_by_dst_key(
        &entry.delegator,
        &entry.validator_dst,
        &entry.validator_src,
        entry.sequence,
    ))?;
    Ok(())
}

/// Live entries for one (delegator, src, dst) triple, oldest first.
pub fn redelegation_entries(
    store: &dyn KvStore,
    delegator: &Address,
    src: &Address,
    dst: &Address,
) -> Result<Vec<RedelegationEntry>, StakingError> {
    store
        .prefix_scan(&redelegation_triple_prefix(delegator, src, dst))?
        .into_iter()
        .map(|(_, bytes)| codec::decode(&bytes).map_err(StakingError::from))
        .collect()
}

pub fn all_entries(store: &dyn KvStore) -> Result<Vec<RedelegationEntry>, StakingError> {
    store
        .prefix_scan(&[REDELEGATION_PREFIX])?
        .into_iter()
        .map(|(_, bytes)| codec::decode(&bytes).map_err(StakingError::from))
        .collect()
}

/// Whether `delegator` has a maturing redelegation into `validator`.
pub fn has_active_redelegation(
    store: &dyn KvStore,
    delegator: &Address,
    validator: &Address,
) -> Result<bool, StakingError> {
    Ok(!store
        .prefix_scan(&redelegations_into_prefix(delegator, validator))?
        .is_empty())
}

/// Remove and return every entry with `completion_time <= now`, in
/// (completion time, sequence) order.
pub fn dequeue_matured(
    store: &mut dyn KvStore,
    now: DateTime<Utc>,
) -> Result<Vec<RedelegationEntry>, StakingError> {
    let bound = queue_upper_bound(REDELEGATION_QUEUE_PREFIX, now);
    let queued = store.range(&[REDELEGATION_QUEUE_PREFIX], Some(&bound))?;

    let mut matured = Vec::with_capacity(queued.len());
    for (queue_key, entry_key) in queued {
        let bytes = store.get(&entry_key)?.ok_or_else(|| {
            StrataError::InvalidState("redelegation queue points at a missing entry".to_string())
        })?;
        let entry: RedelegationEntry = codec::decode(&bytes)?;
        remove_indexes(store, &entry)?;
        store.delete(&queue_key)?;
        matured.push(entry);
    }
    Ok(matured)
}

/// Move `coin` worth of stake from `src_addr` to `dst_addr`.
pub fn begin_redelegate(
    store: &mut dyn KvStore,
    params: &StakingParams,
    delegator: &Address,
    src_addr: &Address,
    dst_addr: &Address,
    coin: &Coin,
    now: DateTime<Utc>,
) -> Result<RedelegateOutcome, StakingError> {
    let mut src = registry::must_get_validator(store, src_addr)?;
    let mut dst = registry::must_get_validator(store, dst_addr)?;
    if !src.enable_redelegation || !dst.enable_redelegation {
        return Err(StakingError::RedelegationDisabled);
    }
    if src_addr == dst_addr {
        return Err(StakingError::SelfRedelegation);
    }
    ledger::check_bond_coin(params, coin)?;
    if has_active_redelegation(store, delegator, src_addr)? {
        return Err(StakingError::TransitiveRedelegation);
    }

    // Source side follows Undelegate's ladder rules.
    let request = ledger::validate_unbond_amount(store, &src, delegator, coin.amount)?;
    let src_units = ladder::unbond_units(
        &src.ladder,
        coin.amount,
        request.remaining,
        request.full_exit,
        request.delegation.license_units,
    )?;
    let src_units = if src.license().is_some() { src_units } else { 0 };

    // Destination side follows Delegate's.
    if dst.mode.is_special() && !whitelist::is_special_delegator(store, &dst, delegator)? {
        return Err(StakingError::Unauthorized(format!(
            "{} is not whitelisted on special validator {}",
            delegator, dst_addr
        )));
    }
    let dst_existing = ledger::get_delegation(store, delegator, dst_addr)?.is_some();

    if redelegation_entries(store, delegator, src_addr, dst_addr)?.len()
        >= params.max_entries as usize
    {
        return Err(StakingError::TooManyEntries);
    }
    let completion_time = params.completion_time(now)?;

    let amount = ledger::debit(store, &mut src, request, src_units)?;
    if amount == 0 {
        return Err(StakingError::InvalidAmount(
            "redelegation releases no tokens".to_string(),
        ));
    }
    // The destination ladder sees what the source released, which can fall
    // short of the request when the source exchange rate is fractional.
    let dst_units = ladder::bond_units(&dst.ladder, dst_existing, amount)?;
    let dst_units = if dst.license().is_some() { dst_units } else { 0 };
    let shares_dst = ledger::credit(store, &mut dst, delegator, amount, dst_units)?;

    let sequence = next_sequence(store)?;
    let entry = RedelegationEntry {
        delegator: *delegator,
        validator_src: *src_addr,
        validator_dst: *dst_addr,
        sequence,
        creation_time: now,
        completion_time,
        initial_balance: amount,
        shares_dst,
    };
    set_entry(store, &entry)?;

    tracing::debug!(
        "Redelegated {} from {} to {} for {}, matures at {}",
        amount,
        src_addr,
        dst_addr,
        delegator,
        completion_time
    );
    Ok(RedelegateOutcome {
        completion_time,
        amount,
        shares_dst,
        sequence,
    })
}
