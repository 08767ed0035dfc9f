// crates/strata-node/src/msg.rs
//
// Transactions and blocks fed to the replay loop.

use std::fs;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use strata_core::amount::Coin;
use strata_core::identity::Address;
use strata_staking::{CreateValidator, EditValidator};

use crate::error::NodeError;

/// A staking message. Each variant maps onto one keeper transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Msg {
    CreateValidator(CreateValidator),
    EditValidator(EditValidator),
    Delegate {
        delegator: Address,
        validator: Address,
        amount: Coin,
    },
    Undelegate {
        delegator: Address,
        validator: Address,
        amount: Coin,
    },
    BeginRedelegate {
        delegator: Address,
        validator_src: Address,
        validator_dst: Address,
        amount: Coin,
    },
    SetValidatorApproval {
        approver: Address,
        new_approver: Address,
        enabled: bool,
    },
    CreateWhitelistDelegator {
        validator: Address,
        delegator: Address,
    },
    DeleteWhitelistDelegator {
        validator: Address,
        delegator: Address,
    },
}

impl Msg {
    pub fn name(&self) -> &'static str {
        match self {
            Msg::CreateValidator(_) => "create_validator",
            Msg::EditValidator(_) => "edit_validator",
            Msg::Delegate { .. } => "delegate",
            Msg::Undelegate { .. } => "undelegate",
            Msg::BeginRedelegate { .. } => "begin_redelegate",
            Msg::SetValidatorApproval { .. } => "set_validator_approval",
            Msg::CreateWhitelistDelegator { .. } => "create_whitelist_delegator",
            Msg::DeleteWhitelistDelegator { .. } => "delete_whitelist_delegator",
        }
    }

    /// Accounts that must have signed the transaction.
    ///
    /// Validator creation needs the operator and the approver it names.
    pub fn required_signers(&self) -> Vec<Address> {
        let mut signers = match self {
            Msg::CreateValidator(msg) => vec![msg.operator, msg.approver],
            Msg::EditValidator(msg) => vec![msg.operator],
            Msg::Delegate { delegator, .. }
            | Msg::Undelegate { delegator, .. }
            | Msg::BeginRedelegate { delegator, .. } => vec![*delegator],
            Msg::SetValidatorApproval { approver, .. } => vec![*approver],
            Msg::CreateWhitelistDelegator { validator, .. }
            | Msg::DeleteWhitelistDelegator { validator, .. } => vec![*validator],
        };
        signers.dedup();
        signers
    }
}

/// A message plus the accounts whose signatures were verified upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tx {
    #[serde(default)]
    pub signers: Vec<Address>,
    pub msg: Msg,
}

impl Tx {
    /// First required signer missing from `signers`, if any.
    pub fn missing_signer(&self) -> Option<Address> {
        self.msg
            .required_signers()
            .into_iter()
            .find(|required| !self.signers.contains(required))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub height: u64,
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub txs: Vec<Tx>,
}

impl Block {
    /// Read a JSON array of blocks.
    pub fn load_all(path: &str) -> Result<Vec<Block>, NodeError> {
        let contents = fs::read_to_string(path).map_err(|source| NodeError::Io {
            path: path.to_string(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|e| NodeError::Blocks {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }
}
