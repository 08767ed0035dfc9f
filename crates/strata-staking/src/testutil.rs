// crates/strata-staking/src/testutil.rs
//
// Fixtures shared by the unit tests.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal_macros::dec;

use strata_core::amount::{Coin, Shares, Tokens};
use strata_core::identity::{Address, ConsensusPubKey};
use strata_core::policy::ValidatorApproval;
use strata_core::traits::KvStore;
use strata_core::validator::{
    BondStatus, Commission, CommissionRates, DelegationLadder, Description, LicenseQuota,
    Validator, ValidatorMode,
};

use crate::msgs::{CreateValidator, RequestedMode};
use crate::{approval, registry};

pub const APPROVER: Address = Address([0xaa; 20]);

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

pub fn rates() -> CommissionRates {
    CommissionRates {
        rate: dec!(0.10),
        max_rate: dec!(0.20),
        max_change_rate: dec!(0.01),
    }
}

pub fn pubkey_for(operator: Address) -> ConsensusPubKey {
    let mut key = operator.0.to_vec();
    key.extend_from_slice(&[0x01; 12]);
    ConsensusPubKey(key)
}

/// Standard-mode validator with no stake.
pub fn make_validator(operator: Address) -> Validator {
    Validator {
        operator,
        consensus_pubkey: pubkey_for(operator),
        status: BondStatus::Unbonded,
        tokens: 0,
        delegator_shares: Shares::ZERO,
        commission: Commission {
            rates: rates(),
            update_time: t0(),
        },
        min_self_delegation: 1,
        jailed: false,
        description: Description::default(),
        mode: ValidatorMode::Standard,
        enable_redelegation: true,
        ladder: DelegationLadder::default(),
    }
}

pub fn license_validator(operator: Address, min: Tokens, increment: Tokens, max: u64) -> Validator {
    let mut validator = make_validator(operator);
    validator.mode = ValidatorMode::License(LicenseQuota {
        max_license: max,
        license_count: 0,
    });
    validator.enable_redelegation = false;
    validator.ladder = DelegationLadder {
        min_delegation: Some(min),
        delegation_increment: Some(increment),
    };
    validator
}

pub fn store_validator(store: &mut dyn KvStore, validator: &Validator) {
    registry::set_validator(store, validator).unwrap();
    registry::set_validator_by_cons_addr(store, validator).unwrap();
}

pub fn init_approval(store: &mut dyn KvStore, enabled: bool) {
    approval::set_approval(
        store,
        &ValidatorApproval {
            approver: APPROVER,
            enabled,
        },
    )
    .unwrap();
}

/// Standard-mode creation message signed off by [`APPROVER`].
pub fn create_msg(operator: Address, amount: Tokens) -> CreateValidator {
    CreateValidator {
        approver: APPROVER,
        operator,
        consensus_pubkey: pubkey_for(operator),
        description: Description {
            moniker: "node".to_string(),
            ..Description::default()
        },
        commission: rates(),
        min_self_delegation: 1,
        value: Coin::new("ustrata", amount),
        min_delegation: None,
        delegation_increment: None,
        mode: RequestedMode::Standard,
        enable_redelegation: true,
    }
}
