// crates/strata-core/src/lib.rs
//
// strata-core: Core types, store trait, and codec for the Strata staking engine.
//
// This is the leaf crate that all other crates in the workspace depend on.
// It defines the entity records the engine persists, the identity and amount
// types, governance parameters, the keyed-store collaborator trait, and the
// protocol-wide error type.

pub mod amount;
pub mod codec;
pub mod delegation;
pub mod error;
pub mod identity;
pub mod params;
pub mod policy;
pub mod traits;
pub mod validator;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use strata_core::Validator;`

pub use amount::{Coin, Shares, Tokens};
pub use delegation::{Delegation, RedelegationEntry, UnbondingEntry};
pub use error::StrataError;
pub use identity::{Address, ConsAddress, ConsensusPubKey, ADDRESS_LEN};
pub use params::StakingParams;
pub use policy::{ValidatorApproval, WhitelistDelegator};
pub use traits::{prefix_end, KvPair, KvStore, KvWrite};
pub use validator::{
    BondStatus, Commission, CommissionRates, DelegationLadder, Description, LicenseQuota,
    Validator, ValidatorMode,
};
