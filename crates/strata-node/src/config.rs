// crates/strata-node/src/config.rs
//
// Runtime configuration for the Strata node.
// Loaded from a TOML file or populated with sensible defaults.

use serde::Deserialize;
use std::fs;

/// Runtime configuration for the node.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    /// Directory for local data storage. The staking store lives in
    /// `<data_dir>/staking`.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Log level: "trace", "debug", "info", "warn", "error".
    /// `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Keep all state in memory instead of RocksDB.
    #[serde(default)]
    pub in_memory: bool,

    /// Run the staking invariant checks after every block.
    #[serde(default = "default_check_invariants")]
    pub check_invariants: bool,
}

fn default_data_dir() -> String {
    "~/.strata/data".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_check_invariants() -> bool {
    true
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            in_memory: false,
            check_invariants: default_check_invariants(),
        }
    }
}

impl NodeConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let config: NodeConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Path of the staking RocksDB database.
    pub fn staking_db_path(&self) -> String {
        format!("{}/staking", expand_tilde(&self.data_dir))
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return format!("{}/{}", home.display(), rest);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NodeConfig::default();
        assert_eq!(config.log_level, "info");
        assert!(!config.in_memory);
        assert!(config.check_invariants);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: NodeConfig = toml::from_str("in_memory = true\nlog_level = \"debug\"").unwrap();
        assert!(config.in_memory);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.data_dir, "~/.strata/data");
    }

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde("/var/lib/strata"), "/var/lib/strata");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                expand_tilde("~/data"),
                format!("{}/data", home.display())
            );
        }
    }

    #[test]
    fn test_staking_db_path() {
        let config = NodeConfig {
            data_dir: "/tmp/strata".to_string(),
            ..NodeConfig::default()
        };
        assert_eq!(config.staking_db_path(), "/tmp/strata/staking");
    }
}
