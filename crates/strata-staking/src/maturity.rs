// crates/strata-staking/src/maturity.rs
//
// Maturity driver entry point. Called once per block with the block time; it
// drains both queues and reports what the host has to settle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use strata_core::amount::Tokens;
use strata_core::identity::Address;
use strata_core::traits::KvStore;

use crate::error::StakingError;
use crate::{redelegation, unbonding};

/// Escrowed tokens the host must now credit to the delegator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedUnbonding {
    pub delegator: Address,
    pub validator: Address,
    pub balance: Tokens,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedRedelegation {
    pub delegator: Address,
    pub src: Address,
    pub dst: Address,
    pub initial_balance: Tokens,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaturityReport {
    pub unbondings: Vec<CompletedUnbonding>,
    pub redelegations: Vec<CompletedRedelegation>,
}

impl MaturityReport {
    pub fn is_empty(&self) -> bool {
        self.unbondings.is_empty() && self.redelegations.is_empty()
    }

    /// Total tokens released to delegators.
    pub fn total_released(&self) -> Tokens {
        self.unbondings.iter().map(|u| u.balance).sum()
    }
}

/// Dequeue every entry with `completion_time <= now` from both queues.
pub fn complete_matured(
    store: &mut dyn KvStore,
    now: DateTime<Utc>,
) -> Result<MaturityReport, StakingError> {
    let mut report = MaturityReport::default();

    for entry in unbonding::dequeue_matured(store, now)? {
        tracing::info!(
            "Unbonding matured: {} receives {} from {}",
            entry.delegator,
            entry.balance,
            entry.validator
        );
        report.unbondings.push(CompletedUnbonding {
            delegator: entry.delegator,
            validator: entry.validator,
            balance: entry.balance,
        });
    }

    for entry in redelegation::dequeue_matured(store, now)? {
        tracing::info!(
            "Redelegation matured: {} moved {} from {} to {}",
            entry.delegator,
            entry.initial_balance,
            entry.validator_src,
            entry.validator_dst
        );
        report.redelegations.push(CompletedRedelegation {
            delegator: entry.delegator,
            src: entry.validator_src,
            dst: entry.validator_dst,
            initial_balance: entry.initial_balance,
        });
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::t0;
    use chrono::Duration;
    use rust_decimal_macros::dec;
    use strata_core::delegation::{RedelegationEntry, UnbondingEntry};
    use strata_store::MemStore;

    #[test]
    fn test_report_collects_both_queues() {
        let mut store = MemStore::new();
        let due = t0() + Duration::seconds(5);
        unbonding::set_entry(
            &mut store,
            &UnbondingEntry {
                delegator: Address([1u8; 20]),
                validator: Address([9u8; 20]),
                sequence: 0,
                creation_time: t0(),
                completion_time: due,
                initial_balance: 40,
                balance: 35,
            },
        )
        .unwrap();
        redelegation::set_entry(
            &mut store,
            &RedelegationEntry {
                delegator: Address([1u8; 20]),
                validator_src: Address([9u8; 20]),
                validator_dst: Address([8u8; 20]),
                sequence: 1,
                creation_time: t0(),
                completion_time: due,
                initial_balance: 10,
                shares_dst: dec!(10),
            },
        )
        .unwrap();

        assert!(complete_matured(&mut store, t0()).unwrap().is_empty());

        let report = complete_matured(&mut store, due).unwrap();
        assert_eq!(report.unbondings.len(), 1);
        assert_eq!(report.redelegations.len(), 1);
        assert_eq!(report.total_released(), 35);
        assert!(complete_matured(&mut store, due).unwrap().is_empty());
    }
}
