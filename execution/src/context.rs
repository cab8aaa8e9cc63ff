use std::collections::HashSet;

use alloy::primitives::{Address, Log, B256, U256};
use tracing::{error, trace};

use common::spec::SpecId;

use crate::bytecode::Bytecode;
use crate::db::{Database, DatabaseCommit};
use crate::errors::{EvmError, StoreError};
use crate::journal::{JournalCheckpoint, JournalOutput, JournaledState, SStoreResult};
use crate::state::{AccountInfo, StateLoad};
use crate::types::{Env, TransactTo};

/// Binds the transaction journal to a backing database and environment.
///
/// Every database failure is fatal for the transaction: the journal is
/// rolled back entirely before the error is returned.
#[derive(Debug)]
pub struct EvmContext<DB: Database> {
    pub env: Box<Env>,
    pub journaled_state: JournaledState,
    pub db: DB,
}

impl<DB: Database> EvmContext<DB> {
    pub fn new(db: DB) -> Self {
        Self::new_with_env(db, Box::default(), SpecId::default())
    }

    pub fn new_with_env(db: DB, env: Box<Env>, spec: SpecId) -> Self {
        Self {
            env,
            journaled_state: JournaledState::new(spec, HashSet::new()),
            db,
        }
    }

    pub fn spec_id(&self) -> SpecId {
        self.journaled_state.spec
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    fn with_db<T, F>(&mut self, f: F) -> Result<T, EvmError>
    where
        F: FnOnce(&mut JournaledState, &mut DB) -> Result<T, DB::Error>,
    {
        let result = f(&mut self.journaled_state, &mut self.db);
        result.map_err(|err| {
            error!(target: "selene::evm", error = %err, "database failure, reverting transaction");
            self.journaled_state.revert_all();
            EvmError::Database(StoreError::new(err))
        })
    }

    /// Warms the transaction's access list, its caller and its target, and
    /// the block coinbase from SHANGHAI (EIP-3651).
    pub fn warm_access_list(&mut self) {
        let tx = &self.env.tx;
        let journal = &mut self.journaled_state;

        for item in &tx.access_list {
            journal.warm_account(item.address);
            for key in &item.storage_keys {
                journal.warm_storage(item.address, U256::from_be_bytes(key.0));
            }
        }

        journal.warm_account(tx.caller);
        if let TransactTo::Call(to) = tx.transact_to {
            journal.warm_account(to);
        }
        if journal.spec.is_enabled_in(SpecId::SHANGHAI) {
            journal.warm_account(self.env.block.coinbase);
        }
    }

    pub fn load_account(&mut self, address: Address) -> Result<StateLoad<AccountInfo>, EvmError> {
        self.with_db(|journal, db| {
            let load = journal.load_account(address, db)?;
            Ok(load.map(|account| account.info.clone()))
        })
    }

    pub fn load_account_existence(&mut self, address: Address) -> Result<StateLoad<bool>, EvmError> {
        self.with_db(|journal, db| journal.load_account_existence(address, db))
    }

    pub fn code(&mut self, address: Address) -> Result<StateLoad<Bytecode>, EvmError> {
        self.with_db(|journal, db| journal.code(address, db))
    }

    /// EXTCODEHASH semantics: zero for accounts that do not exist or are empty.
    pub fn code_hash(&mut self, address: Address) -> Result<StateLoad<B256>, EvmError> {
        self.with_db(|journal, db| {
            let load = journal.load_account(address, db)?;
            Ok(load.map(|account| {
                if account.is_loaded_as_not_existing() || account.is_empty() {
                    B256::ZERO
                } else {
                    account.info.code_hash
                }
            }))
        })
    }

    pub fn block_hash(&mut self, number: u64) -> Result<B256, EvmError> {
        trace!(target: "selene::evm", "fetch block hash for block={:?}", number);
        self.with_db(|_, db| db.load_block_hash(number))
    }

    pub fn sload(&mut self, address: Address, key: U256) -> Result<StateLoad<U256>, EvmError> {
        self.with_db(|journal, db| journal.sload(address, key, db))
    }

    pub fn sstore(
        &mut self,
        address: Address,
        key: U256,
        value: U256,
    ) -> Result<StateLoad<SStoreResult>, EvmError> {
        self.with_db(|journal, db| journal.sstore(address, key, value, db))
    }

    pub fn tload(&self, address: Address, key: U256) -> U256 {
        self.journaled_state.tload(address, key)
    }

    pub fn tstore(&mut self, address: Address, key: U256, value: U256) {
        self.journaled_state.tstore(address, key, value)
    }

    pub fn log(&mut self, log: Log) {
        self.journaled_state.log(log)
    }

    /// Moves value between accounts. A failed balance check leaves state
    /// untouched apart from loading the accounts.
    pub fn transfer(&mut self, from: Address, to: Address, value: U256) -> Result<(), EvmError> {
        match self.with_db(|journal, db| journal.transfer(from, to, value, db))? {
            Some(err) => Err(EvmError::Transfer(err)),
            None => Ok(()),
        }
    }

    pub fn checkpoint(&mut self) -> JournalCheckpoint {
        self.journaled_state.checkpoint()
    }

    pub fn checkpoint_commit(&mut self) {
        self.journaled_state.checkpoint_commit()
    }

    pub fn checkpoint_revert(&mut self, checkpoint: JournalCheckpoint) {
        self.journaled_state.checkpoint_revert(checkpoint)
    }

    /// Ends the transaction without writing anything back.
    pub fn finalize(&mut self) -> JournalOutput {
        self.journaled_state.finalize()
    }
}

impl<DB: Database + DatabaseCommit> EvmContext<DB> {
    /// Ends the transaction, writes its state to the database and returns
    /// the emitted logs.
    pub fn commit_transaction(&mut self) -> Vec<Log> {
        let JournalOutput { state, logs } = self.journaled_state.finalize();
        self.db.commit(state);
        logs
    }
}
