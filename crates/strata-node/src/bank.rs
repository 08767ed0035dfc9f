// crates/strata-node/src/bank.rs
//
// Liquid balances held outside the staking module.
//
// Bonding debits the delegator here before the staking transition runs;
// settled undelegations and matured unbondings credit it back.

use std::collections::BTreeMap;

use strata_core::amount::Tokens;
use strata_core::identity::Address;

use crate::error::TxError;
use crate::genesis::Account;

#[derive(Debug, Clone, Default)]
pub struct Bank {
    balances: BTreeMap<Address, Tokens>,
}

impl Bank {
    pub fn from_accounts(accounts: &[Account]) -> Self {
        Self {
            balances: accounts.iter().map(|a| (a.address, a.balance)).collect(),
        }
    }

    pub fn balance(&self, account: &Address) -> Tokens {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Fail unless `account` can pay `amount`.
    pub fn ensure_funds(&self, account: &Address, amount: Tokens) -> Result<(), TxError> {
        let balance = self.balance(account);
        if balance < amount {
            return Err(TxError::InsufficientFunds {
                account: *account,
                balance,
                needed: amount,
            });
        }
        Ok(())
    }

    pub fn debit(&mut self, account: &Address, amount: Tokens) -> Result<(), TxError> {
        self.ensure_funds(account, amount)?;
        let remaining = self.balance(account) - amount;
        if remaining == 0 {
            self.balances.remove(account);
        } else {
            self.balances.insert(*account, remaining);
        }
        Ok(())
    }

    pub fn credit(&mut self, account: &Address, amount: Tokens) {
        if amount == 0 {
            return;
        }
        let balance = self.balances.entry(*account).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    pub fn total(&self) -> Tokens {
        self.balances.values().sum()
    }

    pub fn accounts(&self) -> Vec<Account> {
        self.balances
            .iter()
            .map(|(address, balance)| Account {
                address: *address,
                balance: *balance,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debit_and_credit() {
        let alice = Address([1u8; 20]);
        let mut bank = Bank::from_accounts(&[Account {
            address: alice,
            balance: 100,
        }]);

        bank.debit(&alice, 40).unwrap();
        assert_eq!(bank.balance(&alice), 60);
        bank.credit(&alice, 15);
        assert_eq!(bank.balance(&alice), 75);
        assert_eq!(bank.total(), 75);
    }

    #[test]
    fn test_overdraw_leaves_balance() {
        let alice = Address([1u8; 20]);
        let mut bank = Bank::default();
        bank.credit(&alice, 10);

        let err = bank.debit(&alice, 11).unwrap_err();
        assert!(matches!(
            err,
            TxError::InsufficientFunds {
                balance: 10,
                needed: 11,
                ..
            }
        ));
        assert_eq!(bank.balance(&alice), 10);
    }

    #[test]
    fn test_emptied_accounts_are_dropped() {
        let alice = Address([1u8; 20]);
        let mut bank = Bank::default();
        bank.credit(&alice, 10);
        bank.debit(&alice, 10).unwrap();
        assert!(bank.accounts().is_empty());
    }
}
