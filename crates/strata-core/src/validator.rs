// crates/strata-core/src/validator.rs
//
// Validator record and its policy attributes.
//
// A validator pools delegated tokens and issues shares against them. The
// exchange rate is `tokens / delegator_shares`; delegation arithmetic keeps it
// fixed and only an external slashing event can lower it.
//
// Policy extensions:
//   - `ValidatorMode` selects Standard, License (floor-plus-increment ladder
//     capped by a quota) or Special (whitelist-gated, instant exit).
//   - `DelegationLadder` holds the floor and step sizes. It lives outside the
//     mode because redelegation applies it to every validator.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::amount::{Shares, Tokens};
use crate::identity::{Address, ConsensusPubKey};

/// Bonding status as reported by the external validator-set logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BondStatus {
    Unbonded,
    Unbonding,
    Bonded,
}

/// Commission rates fixed at creation (max rates) or editable (rate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionRates {
    pub rate: Decimal,
    pub max_rate: Decimal,
    pub max_change_rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commission {
    pub rates: CommissionRates,
    /// Time of the last rate change (or of creation).
    pub update_time: DateTime<Utc>,
}

/// Human-readable validator metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    #[serde(default)]
    pub moniker: String,
    #[serde(default)]
    pub identity: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub security_contact: String,
    #[serde(default)]
    pub details: String,
}

pub const MAX_MONIKER_LENGTH: usize = 70;
pub const MAX_IDENTITY_LENGTH: usize = 3000;
pub const MAX_WEBSITE_LENGTH: usize = 140;
pub const MAX_SECURITY_CONTACT_LENGTH: usize = 140;
pub const MAX_DETAILS_LENGTH: usize = 280;

impl Description {
    /// Return the first field that exceeds its length limit, as
    /// `(field, actual, limit)`.
    pub fn overlong_field(&self) -> Option<(&'static str, usize, usize)> {
        [
            ("moniker", self.moniker.len(), MAX_MONIKER_LENGTH),
            ("identity", self.identity.len(), MAX_IDENTITY_LENGTH),
            ("website", self.website.len(), MAX_WEBSITE_LENGTH),
            (
                "security_contact",
                self.security_contact.len(),
                MAX_SECURITY_CONTACT_LENGTH,
            ),
            ("details", self.details.len(), MAX_DETAILS_LENGTH),
        ]
        .into_iter()
        .find(|(_, len, max)| len > max)
    }
}

/// Quota state of a license-mode validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseQuota {
    pub max_license: u64,
    pub license_count: u64,
}

impl LicenseQuota {
    pub fn remaining(&self) -> u64 {
        self.max_license.saturating_sub(self.license_count)
    }
}

/// Delegation policy. Exactly one applies at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidatorMode {
    Standard,
    License(LicenseQuota),
    Special,
}

impl ValidatorMode {
    pub fn license(&self) -> Option<&LicenseQuota> {
        match self {
            ValidatorMode::License(quota) => Some(quota),
            _ => None,
        }
    }

    pub fn is_special(&self) -> bool {
        matches!(self, ValidatorMode::Special)
    }
}

/// Floor and step size for delegation amounts.
///
/// `None` means the rule is not set: no floor, and a step of one token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationLadder {
    #[serde(default)]
    pub min_delegation: Option<Tokens>,
    #[serde(default)]
    pub delegation_increment: Option<Tokens>,
}

impl DelegationLadder {
    pub fn floor(&self) -> Tokens {
        self.min_delegation.unwrap_or(0)
    }

    /// Step size, treating an unset or zero increment as one token.
    pub fn step(&self) -> Tokens {
        match self.delegation_increment {
            Some(step) if step > 0 => step,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Validator {
    pub operator: Address,
    pub consensus_pubkey: ConsensusPubKey,
    pub status: BondStatus,
    /// Total bonded tokens backing all shares.
    pub tokens: Tokens,
    /// Total shares issued to delegators.
    pub delegator_shares: Shares,
    pub commission: Commission,
    pub min_self_delegation: Tokens,
    #[serde(default)]
    pub jailed: bool,
    #[serde(default)]
    pub description: Description,
    pub mode: ValidatorMode,
    #[serde(default)]
    pub enable_redelegation: bool,
    #[serde(default)]
    pub ladder: DelegationLadder,
}

impl Validator {
    /// Tokens per share, or `None` while no shares exist.
    pub fn exchange_rate(&self) -> Option<Decimal> {
        if self.delegator_shares.is_zero() {
            None
        } else {
            Some(Decimal::from(self.tokens) / self.delegator_shares)
        }
    }

    pub fn license(&self) -> Option<&LicenseQuota> {
        self.mode.license()
    }

    pub fn license_mut(&mut self) -> Option<&mut LicenseQuota> {
        match &mut self.mode {
            ValidatorMode::License(quota) => Some(quota),
            _ => None,
        }
    }
}
