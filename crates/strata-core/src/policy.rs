// crates/strata-core/src/policy.rs
//
// Records that gate who may create validators and who may delegate to
// special-mode validators.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::identity::Address;

/// Singleton controlling validator creation.
///
/// While `enabled`, only `approver` may authorize a new validator. The record
/// must be written at genesis; its absence is a setup error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorApproval {
    pub approver: Address,
    pub enabled: bool,
}

/// Delegators a special-mode validator admits besides its own operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistDelegator {
    pub validator: Address,
    #[serde(default)]
    pub delegators: BTreeSet<Address>,
}

impl WhitelistDelegator {
    pub fn new(validator: Address) -> Self {
        Self {
            validator,
            delegators: BTreeSet::new(),
        }
    }

    pub fn contains(&self, delegator: &Address) -> bool {
        self.delegators.contains(delegator)
    }
}
