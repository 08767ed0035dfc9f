// crates/strata-node/src/genesis.rs
//
// Genesis file handling.
//
// The genesis file is TOML: liquid account balances plus the staking module's
// initial state. The exported form is JSON so that validator records with
// timestamps and decimal shares survive unchanged.

use std::fs;

use serde::{Deserialize, Serialize};

use strata_core::amount::Tokens;
use strata_core::identity::Address;
use strata_staking::GenesisState;

use crate::error::NodeError;

/// Liquid balance of an account outside the staking module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: Address,
    pub balance: Tokens,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeGenesis {
    #[serde(default)]
    pub accounts: Vec<Account>,
    pub staking: GenesisState,
}

impl NodeGenesis {
    /// Load a genesis file. `.json` files are parsed as JSON, everything
    /// else as TOML.
    pub fn load(path: &str) -> Result<Self, NodeError> {
        let contents = fs::read_to_string(path).map_err(|source| NodeError::Io {
            path: path.to_string(),
            source,
        })?;
        let invalid = |reason: String| NodeError::Genesis {
            path: path.to_string(),
            reason,
        };

        let genesis: NodeGenesis = if path.ends_with(".json") {
            serde_json::from_str(&contents).map_err(|e| invalid(e.to_string()))?
        } else {
            toml::from_str(&contents).map_err(|e| invalid(e.to_string()))?
        };

        let mut seen = std::collections::BTreeSet::new();
        for account in &genesis.accounts {
            if !seen.insert(account.address) {
                return Err(invalid(format!("duplicate account {}", account.address)));
            }
        }
        Ok(genesis)
    }

    /// Write the state as pretty-printed JSON.
    pub fn export(&self, path: &str) -> Result<(), NodeError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| NodeError::Genesis {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        fs::write(path, json).map_err(|source| NodeError::Io {
            path: path.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> String {
        std::env::temp_dir()
            .join(format!("strata_genesis_{}_{}", uuid::Uuid::now_v7(), name))
            .to_string_lossy()
            .to_string()
    }

    const GENESIS_TOML: &str = r#"
[[accounts]]
address = "0101010101010101010101010101010101010101"
balance = 5000

[staking.params]
unbonding_time_secs = 60

[staking.approval]
approver = "0909090909090909090909090909090909090909"
enabled = true
"#;

    #[test]
    fn test_load_toml() {
        let path = temp_path("genesis.toml");
        fs::write(&path, GENESIS_TOML).unwrap();

        let genesis = NodeGenesis::load(&path).unwrap();
        assert_eq!(genesis.accounts.len(), 1);
        assert_eq!(genesis.accounts[0].balance, 5000);
        assert_eq!(genesis.staking.params.unbonding_time_secs, 60);
        assert_eq!(genesis.staking.params.bond_denom, "ustrata");
        assert!(genesis.staking.approval.enabled);
        assert!(genesis.staking.validators.is_empty());
    }

    #[test]
    fn test_duplicate_accounts_rejected() {
        let path = temp_path("dup.toml");
        let doubled = format!(
            "[[accounts]]\naddress = \"{0}\"\nbalance = 1\n\n[[accounts]]\naddress = \"{0}\"\nbalance = 2\n{1}",
            "01".repeat(20),
            "[staking.approval]\napprover = \"0909090909090909090909090909090909090909\"\nenabled = false\n"
        );
        fs::write(&path, doubled).unwrap();
        assert!(matches!(
            NodeGenesis::load(&path),
            Err(NodeError::Genesis { .. })
        ));
    }

    #[test]
    fn test_export_then_load_json() {
        let path = temp_path("genesis.toml");
        fs::write(&path, GENESIS_TOML).unwrap();
        let genesis = NodeGenesis::load(&path).unwrap();

        let out = temp_path("export.json");
        genesis.export(&out).unwrap();
        assert_eq!(NodeGenesis::load(&out).unwrap(), genesis);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            NodeGenesis::load("/nonexistent/strata/genesis.toml"),
            Err(NodeError::Io { .. })
        ));
    }
}
