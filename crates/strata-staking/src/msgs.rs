// crates/strata-staking/src/msgs.rs
//
// Transition inputs and results that carry more than a few arguments.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use strata_core::amount::{Coin, Shares, Tokens};
use strata_core::identity::{Address, ConsensusPubKey};
use strata_core::validator::{CommissionRates, Description};

/// Delegation policy requested when creating or editing a validator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequestedMode {
    #[default]
    Standard,
    License {
        #[serde(default)]
        max_license: Option<u64>,
    },
    Special,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateValidator {
    /// Identity presented to the approval gate.
    pub approver: Address,
    pub operator: Address,
    pub consensus_pubkey: ConsensusPubKey,
    #[serde(default)]
    pub description: Description,
    pub commission: CommissionRates,
    pub min_self_delegation: Tokens,
    /// Initial self-delegation.
    pub value: Coin,
    #[serde(default)]
    pub min_delegation: Option<Tokens>,
    #[serde(default)]
    pub delegation_increment: Option<Tokens>,
    #[serde(default)]
    pub mode: RequestedMode,
    #[serde(default)]
    pub enable_redelegation: bool,
}

/// Description fields to replace; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionUpdate {
    #[serde(default)]
    pub moniker: Option<String>,
    #[serde(default)]
    pub identity: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub security_contact: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
}

impl DescriptionUpdate {
    pub fn apply(&self, description: &mut Description) {
        let fields = [
            (&self.moniker, &mut description.moniker),
            (&self.identity, &mut description.identity),
            (&self.website, &mut description.website),
            (&self.security_contact, &mut description.security_contact),
            (&self.details, &mut description.details),
        ];
        for (update, field) in fields {
            if let Some(value) = update {
                field.clone_from(value);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditValidator {
    pub operator: Address,
    #[serde(default)]
    pub description: DescriptionUpdate,
    #[serde(default)]
    pub commission_rate: Option<Decimal>,
    #[serde(default)]
    pub min_self_delegation: Option<Tokens>,
    /// Mode to switch to; `None` keeps the current mode.
    #[serde(default)]
    pub mode: Option<RequestedMode>,
}

/// How an undelegation settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UndelegateOutcome {
    /// Tokens are escrowed in an unbonding entry until `completion_time`.
    Queued {
        amount: Tokens,
        completion_time: DateTime<Utc>,
        sequence: u64,
    },
    /// Special-mode exit: tokens are released at once.
    Settled {
        amount: Tokens,
        completion_time: DateTime<Utc>,
    },
}

impl UndelegateOutcome {
    pub fn amount(&self) -> Tokens {
        match self {
            UndelegateOutcome::Queued { amount, .. } | UndelegateOutcome::Settled { amount, .. } => {
                *amount
            }
        }
    }

    pub fn completion_time(&self) -> DateTime<Utc> {
        match self {
            UndelegateOutcome::Queued {
                completion_time, ..
            }
            | UndelegateOutcome::Settled {
                completion_time, ..
            } => *completion_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedelegateOutcome {
    pub completion_time: DateTime<Utc>,
    /// Tokens moved out of the source validator.
    pub amount: Tokens,
    pub shares_dst: Shares,
    pub sequence: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_update_replaces_given_fields() {
        let mut description = Description {
            moniker: "old".into(),
            website: "https://old.example".into(),
            ..Description::default()
        };
        let update = DescriptionUpdate {
            moniker: Some("new".into()),
            ..DescriptionUpdate::default()
        };
        update.apply(&mut description);
        assert_eq!(description.moniker, "new");
        assert_eq!(description.website, "https://old.example");
    }

    #[test]
    fn test_requested_mode_json() {
        let mode: RequestedMode =
            serde_json::from_str(r#"{"kind":"license","max_license":5}"#).unwrap();
        assert_eq!(mode, RequestedMode::License { max_license: Some(5) });
        let mode: RequestedMode = serde_json::from_str(r#"{"kind":"special"}"#).unwrap();
        assert_eq!(mode, RequestedMode::Special);
    }
}
