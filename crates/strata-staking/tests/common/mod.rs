// crates/strata-staking/tests/common/mod.rs
//
// Shared fixtures for the staking integration tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal_macros::dec;

use strata_core::amount::{Coin, Shares, Tokens};
use strata_core::identity::{Address, ConsensusPubKey};
use strata_core::params::StakingParams;
use strata_core::policy::ValidatorApproval;
use strata_core::validator::{
    BondStatus, Commission, CommissionRates, DelegationLadder, Description, LicenseQuota,
    Validator, ValidatorMode,
};
use strata_staking::{CreateValidator, GenesisState, RequestedMode, StakingKeeper};
use strata_store::MemStore;

pub const APPROVER: Address = Address([0xaa; 20]);

pub fn addr(n: u8) -> Address {
    Address([n; 20])
}

pub fn coin(amount: Tokens) -> Coin {
    Coin::new("ustrata", amount)
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

pub fn rates() -> CommissionRates {
    CommissionRates {
        rate: dec!(0.05),
        max_rate: dec!(0.20),
        max_change_rate: dec!(0.01),
    }
}

pub fn pubkey(n: u8) -> ConsensusPubKey {
    ConsensusPubKey(vec![n; 32])
}

/// A validator with no stake, as genesis would import it.
pub fn empty_validator(operator: Address, mode: ValidatorMode, ladder: DelegationLadder) -> Validator {
    Validator {
        operator,
        consensus_pubkey: pubkey(operator.0[0]),
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
        enable_redelegation: !matches!(mode, ValidatorMode::License(_)),
        mode,
        ladder,
    }
}

pub fn standard(operator: Address) -> Validator {
    empty_validator(operator, ValidatorMode::Standard, DelegationLadder::default())
}

pub fn licensed(operator: Address, min: Tokens, increment: Tokens, max_license: u64) -> Validator {
    empty_validator(
        operator,
        ValidatorMode::License(LicenseQuota {
            max_license,
            license_count: 0,
        }),
        DelegationLadder {
            min_delegation: Some(min),
            delegation_increment: Some(increment),
        },
    )
}

pub fn special(operator: Address) -> Validator {
    empty_validator(operator, ValidatorMode::Special, DelegationLadder::default())
}

/// A fresh store initialized with `validators` and an enabled approval gate.
pub fn setup(validators: Vec<Validator>) -> (MemStore, StakingKeeper) {
    setup_with(StakingParams::default(), validators)
}

pub fn setup_with(params: StakingParams, validators: Vec<Validator>) -> (MemStore, StakingKeeper) {
    let mut genesis = GenesisState::new(
        params.clone(),
        ValidatorApproval {
            approver: APPROVER,
            enabled: true,
        },
    );
    genesis.validators = validators;

    let mut store = MemStore::new();
    let keeper = StakingKeeper::new(params);
    keeper.init_genesis(&mut store, &genesis).unwrap();
    (store, keeper)
}

pub fn create_msg(operator: Address, amount: Tokens) -> CreateValidator {
    CreateValidator {
        approver: APPROVER,
        operator,
        consensus_pubkey: pubkey(operator.0[0]),
        description: Description {
            moniker: format!("validator-{}", operator.0[0]),
            ..Description::default()
        },
        commission: rates(),
        min_self_delegation: 1,
        value: coin(amount),
        min_delegation: None,
        delegation_increment: None,
        mode: RequestedMode::Standard,
        enable_redelegation: true,
    }
}
