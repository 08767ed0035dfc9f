// crates/strata-core/src/amount.rs
//
// Token and share amounts.
//
// Tokens are whole base units of the bond denomination and are tracked as
// integers. Shares are a validator-local unit of proportional ownership and
// may be fractional, so they are fixed-point decimals.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Amount of the bond denomination, in base units.
pub type Tokens = u64;

/// Validator-local ownership units.
pub type Shares = Decimal;

/// A token amount tagged with its denomination, as supplied by a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: Tokens,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: Tokens) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coin_display() {
        assert_eq!(Coin::new("ustrata", 1500).to_string(), "1500ustrata");
    }

    #[test]
    fn test_coin_zero() {
        assert!(Coin::new("ustrata", 0).is_zero());
        assert!(!Coin::new("ustrata", 1).is_zero());
    }
}
