// crates/strata-staking/src/keys.rs
//
// Store key layout for the staking engine.
//
// Every record lives under a one-byte prefix followed by fixed-width fields,
// so a prefix scan groups records by their leading identity:
//
//   0x21 operator                          -> Validator
//   0x22 cons address                      -> operator
//   0x31 delegator | validator             -> Delegation
//   0x32 validator | delegator             -> () reverse index
//   0x41 delegator | validator | seq       -> UnbondingEntry
//   0x42 time | seq                        -> unbonding entry key
//   0x51 delegator | src | dst | seq       -> RedelegationEntry
//   0x52 delegator | dst | src | seq       -> () receiving index
//   0x53 time | seq                        -> redelegation entry key
//   0x61 validator                         -> WhitelistDelegator
//   0x71                                   -> ValidatorApproval
//   0x81                                   -> queue sequence counter
//
// Times are encoded so byte order equals chronological order, which makes the
// queue prefixes drain by (completion time, insertion sequence).

use chrono::{DateTime, Utc};

use strata_core::error::StrataError;
use strata_core::identity::{Address, ConsAddress, ADDRESS_LEN};
use strata_core::traits::KvStore;

pub const VALIDATOR_PREFIX: u8 = 0x21;
pub const VALIDATOR_BY_CONS_PREFIX: u8 = 0x22;
pub const DELEGATION_PREFIX: u8 = 0x31;
pub const DELEGATION_BY_VALIDATOR_PREFIX: u8 = 0x32;
pub const UNBONDING_PREFIX: u8 = 0x41;
pub const UNBONDING_QUEUE_PREFIX: u8 = 0x42;
pub const REDELEGATION_PREFIX: u8 = 0x51;
pub const REDELEGATION_BY_DST_PREFIX: u8 = 0x52;
pub const REDELEGATION_QUEUE_PREFIX: u8 = 0x53;
pub const WHITELIST_PREFIX: u8 = 0x61;
pub const APPROVAL_KEY: &[u8] = &[0x71];
pub const SEQUENCE_KEY: &[u8] = &[0x81];

/// Width of an encoded timestamp: 8 bytes of seconds, 4 of nanoseconds.
pub const TIME_LEN: usize = 12;

fn compose(prefix: u8, parts: &[&[u8]]) -> Vec<u8> {
    let len = 1 + parts.iter().map(|p| p.len()).sum::<usize>();
    let mut key = Vec::with_capacity(len);
    key.push(prefix);
    for part in parts {
        key.extend_from_slice(part);
    }
    key
}

pub fn validator_key(operator: &Address) -> Vec<u8> {
    compose(VALIDATOR_PREFIX, &[operator.as_bytes()])
}

pub fn validator_by_cons_key(cons: &ConsAddress) -> Vec<u8> {
    compose(VALIDATOR_BY_CONS_PREFIX, &[cons.0.as_bytes()])
}

pub fn delegation_key(delegator: &Address, validator: &Address) -> Vec<u8> {
    compose(DELEGATION_PREFIX, &[delegator.as_bytes(), validator.as_bytes()])
}

pub fn delegator_delegations_prefix(delegator: &Address) -> Vec<u8> {
    compose(DELEGATION_PREFIX, &[delegator.as_bytes()])
}

pub fn delegation_by_validator_key(validator: &Address, delegator: &Address) -> Vec<u8> {
    compose(
        DELEGATION_BY_VALIDATOR_PREFIX,
        &[validator.as_bytes(), delegator.as_bytes()],
    )
}

pub fn validator_delegations_prefix(validator: &Address) -> Vec<u8> {
    compose(DELEGATION_BY_VALIDATOR_PREFIX, &[validator.as_bytes()])
}

pub fn unbonding_key(delegator: &Address, validator: &Address, sequence: u64) -> Vec<u8> {
    compose(
        UNBONDING_PREFIX,
        &[
            delegator.as_bytes(),
            validator.as_bytes(),
            &sequence.to_be_bytes(),
        ],
    )
}

pub fn unbonding_pair_prefix(delegator: &Address, validator: &Address) -> Vec<u8> {
    compose(UNBONDING_PREFIX, &[delegator.as_bytes(), validator.as_bytes()])
}

pub fn redelegation_key(
    delegator: &Address,
    src: &Address,
    dst: &Address,
    sequence: u64,
) -> Vec<u8> {
    compose(
        REDELEGATION_PREFIX,
        &[
            delegator.as_bytes(),
            src.as_bytes(),
            dst.as_bytes(),
            &sequence.to_be_bytes(),
        ],
    )
}

pub fn redelegation_triple_prefix(delegator: &Address, src: &Address, dst: &Address) -> Vec<u8> {
    compose(
        REDELEGATION_PREFIX,
        &[delegator.as_bytes(), src.as_bytes(), dst.as_bytes()],
    )
}

pub fn redelegation_by_dst_key(
    delegator: &Address,
    dst: &Address,
    src: &Address,
    sequence: u64,
) -> Vec<u8> {
    compose(
        REDELEGATION_BY_DST_PREFIX,
        &[
            delegator.as_bytes(),
            dst.as_bytes(),
            src.as_bytes(),
            &sequence.to_be_bytes(),
        ],
    )
}

pub fn redelegations_into_prefix(delegator: &Address, dst: &Address) -> Vec<u8> {
    compose(
        REDELEGATION_BY_DST_PREFIX,
        &[delegator.as_bytes(), dst.as_bytes()],
    )
}

pub fn unbonding_queue_key(time: DateTime<Utc>, sequence: u64) -> Vec<u8> {
    compose(
        UNBONDING_QUEUE_PREFIX,
        &[&encode_time(time), &sequence.to_be_bytes()],
    )
}

pub fn redelegation_queue_key(time: DateTime<Utc>, sequence: u64) -> Vec<u8> {
    compose(
        REDELEGATION_QUEUE_PREFIX,
        &[&encode_time(time), &sequence.to_be_bytes()],
    )
}

/// Exclusive upper bound covering every queue key of `prefix` whose time is
/// at or before `now`.
pub fn queue_upper_bound(prefix: u8, now: DateTime<Utc>) -> Vec<u8> {
    compose(prefix, &[&encode_time(now), &[0xff; 8], &[0x00]])
}

pub fn whitelist_key(validator: &Address) -> Vec<u8> {
    compose(WHITELIST_PREFIX, &[validator.as_bytes()])
}

/// Order-preserving timestamp encoding.
pub fn encode_time(time: DateTime<Utc>) -> [u8; TIME_LEN] {
    let secs = (time.timestamp() as u64) ^ (1u64 << 63);
    let mut out = [0u8; TIME_LEN];
    out[..8].copy_from_slice(&secs.to_be_bytes());
    out[8..].copy_from_slice(&time.timestamp_subsec_nanos().to_be_bytes());
    out
}

/// Read the address stored at `offset` of a composite key.
pub fn address_at(key: &[u8], offset: usize) -> Result<Address, StrataError> {
    key.get(offset..offset + ADDRESS_LEN)
        .ok_or_else(|| {
            StrataError::InvalidState(format!(
                "key of length {} has no address at offset {}",
                key.len(),
                offset
            ))
        })
        .and_then(Address::from_slice)
}

/// Allocate the next queue insertion sequence.
pub fn next_sequence(store: &mut dyn KvStore) -> Result<u64, StrataError> {
    let current = read_sequence(store)?;
    store.set(SEQUENCE_KEY, &(current + 1).to_be_bytes())?;
    Ok(current)
}

/// Make sure future sequences are strictly greater than `used`.
pub fn bump_sequence_past(store: &mut dyn KvStore, used: u64) -> Result<(), StrataError> {
    if read_sequence(store)? <= used {
        store.set(SEQUENCE_KEY, &(used + 1).to_be_bytes())?;
    }
    Ok(())
}

fn read_sequence(store: &dyn KvStore) -> Result<u64, StrataError> {
    match store.get(SEQUENCE_KEY)? {
        None => Ok(0),
        Some(bytes) => {
            let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                StrataError::InvalidState(format!("sequence counter has {} bytes", bytes.len()))
            })?;
            Ok(u64::from_be_bytes(raw))
        }
    }
}
