// crates/strata-node/src/replay.rs
//
// Block replay loop.
//
// For each block, in order:
//   1. Reject a block time earlier than the previous block.
//   2. Deliver each transaction: check signers, check liquid funds, run the
//      keeper transition, then move liquid tokens. A rejected transaction is
//      logged and skipped; a fatal staking error aborts the replay.
//   3. Drain matured unbonding and redelegation entries and credit released
//      tokens to the delegators.
//   4. Optionally run the staking invariants.

use chrono::{DateTime, Utc};

use strata_core::traits::KvStore;
use strata_staking::{invariants, StakingError, StakingKeeper, UndelegateOutcome};

use crate::bank::Bank;
use crate::error::{NodeError, TxError};
use crate::genesis::NodeGenesis;
use crate::msg::{Block, Msg, Tx};

/// Per-block results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockSummary {
    pub height: u64,
    pub delivered: usize,
    pub rejected: usize,
    pub matured_unbondings: usize,
    pub matured_redelegations: usize,
}

pub struct Replayer {
    keeper: StakingKeeper,
    store: Box<dyn KvStore>,
    bank: Bank,
    check_invariants: bool,
    last_time: Option<DateTime<Utc>>,
}

impl Replayer {
    /// Write `genesis` into an empty store.
    ///
    /// A store that already holds an approval record is refused, since the
    /// liquid balances live only in the genesis file.
    pub fn from_genesis(
        mut store: Box<dyn KvStore>,
        genesis: &NodeGenesis,
        check_invariants: bool,
        location: &str,
    ) -> Result<Self, NodeError> {
        let keeper = StakingKeeper::new(genesis.staking.params.clone());

        match keeper.approval(store.as_ref()) {
            Ok(_) => return Err(NodeError::AlreadyInitialized(location.to_string())),
            Err(StakingError::MissingApproval) => {}
            Err(e) => return Err(NodeError::Fatal(e)),
        }

        keeper
            .init_genesis(store.as_mut(), &genesis.staking)
            .map_err(NodeError::Fatal)?;
        let approval = keeper.approval(store.as_ref()).map_err(NodeError::Fatal)?;

        tracing::info!(
            "Genesis loaded: {} validators, {} delegations, {} accounts, approver {} (gate {})",
            genesis.staking.validators.len(),
            genesis.staking.delegations.len(),
            genesis.accounts.len(),
            approval.approver,
            if approval.enabled { "enabled" } else { "disabled" }
        );

        Ok(Self {
            keeper,
            store,
            bank: Bank::from_accounts(&genesis.accounts),
            check_invariants,
            last_time: None,
        })
    }

    pub fn keeper(&self) -> &StakingKeeper {
        &self.keeper
    }

    pub fn store(&self) -> &dyn KvStore {
        self.store.as_ref()
    }

    pub fn bank(&self) -> &Bank {
        &self.bank
    }

    pub fn apply_block(&mut self, block: &Block) -> Result<BlockSummary, NodeError> {
        if let Some(previous) = self.last_time {
            if block.time < previous {
                return Err(NodeError::TimeRegression {
                    height: block.height,
                    time: block.time,
                    previous,
                });
            }
        }

        let mut summary = BlockSummary {
            height: block.height,
            ..BlockSummary::default()
        };

        for (index, tx) in block.txs.iter().enumerate() {
            match self.deliver_tx(tx, block.time) {
                Ok(()) => summary.delivered += 1,
                Err(TxError::Staking(e)) if e.is_fatal() => return Err(NodeError::Fatal(e)),
                Err(e) => {
                    summary.rejected += 1;
                    tracing::warn!(
                        "Block {} tx {} ({}) rejected: {}",
                        block.height,
                        index,
                        tx.msg.name(),
                        e
                    );
                }
            }
        }

        let report = self
            .keeper
            .complete_matured(self.store.as_mut(), block.time)
            .map_err(NodeError::Fatal)?;
        for unbonding in &report.unbondings {
            self.bank.credit(&unbonding.delegator, unbonding.balance);
        }
        summary.matured_unbondings = report.unbondings.len();
        summary.matured_redelegations = report.redelegations.len();

        if self.check_invariants {
            invariants::check_all(self.store.as_ref()).map_err(|source| {
                NodeError::Invariant {
                    height: block.height,
                    source,
                }
            })?;
        }

        self.last_time = Some(block.time);
        tracing::debug!(
            "Block {} applied: {} delivered, {} rejected, {} unbondings matured",
            summary.height,
            summary.delivered,
            summary.rejected,
            summary.matured_unbondings
        );
        Ok(summary)
    }

    fn deliver_tx(&mut self, tx: &Tx, now: DateTime<Utc>) -> Result<(), TxError> {
        if let Some(missing) = tx.missing_signer() {
            return Err(TxError::MissingSigner(missing));
        }

        let store = self.store.as_mut();
        match &tx.msg {
            Msg::CreateValidator(msg) => {
                self.bank.ensure_funds(&msg.operator, msg.value.amount)?;
                let operator = msg.operator;
                let amount = msg.value.amount;
                self.keeper.create_validator(store, msg.clone(), now)?;
                self.bank.debit(&operator, amount)?;
            }
            Msg::EditValidator(msg) => {
                self.keeper.edit_validator(store, msg.clone(), now)?;
            }
            Msg::Delegate {
                delegator,
                validator,
                amount,
            } => {
                self.bank.ensure_funds(delegator, amount.amount)?;
                self.keeper.delegate(store, delegator, validator, amount)?;
                self.bank.debit(delegator, amount.amount)?;
            }
            Msg::Undelegate {
                delegator,
                validator,
                amount,
            } => {
                let outcome = self
                    .keeper
                    .undelegate(store, delegator, validator, amount, now)?;
                if let UndelegateOutcome::Settled { amount, .. } = outcome {
                    self.bank.credit(delegator, amount);
                }
            }
            Msg::BeginRedelegate {
                delegator,
                validator_src,
                validator_dst,
                amount,
            } => {
                self.keeper.begin_redelegate(
                    store,
                    delegator,
                    validator_src,
                    validator_dst,
                    amount,
                    now,
                )?;
            }
            Msg::SetValidatorApproval {
                approver,
                new_approver,
                enabled,
            } => {
                self.keeper
                    .set_validator_approval(store, approver, *new_approver, *enabled)?;
            }
            Msg::CreateWhitelistDelegator {
                validator,
                delegator,
            } => {
                self.keeper
                    .create_whitelist_delegator(store, validator, validator, *delegator)?;
            }
            Msg::DeleteWhitelistDelegator {
                validator,
                delegator,
            } => {
                self.keeper
                    .delete_whitelist_delegator(store, validator, validator, delegator)?;
            }
        }
        Ok(())
    }

    /// Current liquid balances and staking state, in genesis form.
    pub fn export(&self) -> Result<NodeGenesis, NodeError> {
        Ok(NodeGenesis {
            accounts: self.bank.accounts(),
            staking: self
                .keeper
                .export_genesis(self.store.as_ref())
                .map_err(NodeError::Fatal)?,
        })
    }
}
