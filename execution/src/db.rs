use std::collections::HashMap;
use std::convert::Infallible;

use alloy::primitives::{keccak256, Address, B256, U256};
use thiserror::Error;
use tracing::trace;

use common::spec::SpecId;

use crate::bytecode::{Bytecode, KECCAK_EMPTY};
use crate::state::{AccountInfo, EvmState};

/// Backing state consulted on the first access of an account, slot, code or
/// block hash within a transaction.
pub trait Database {
    type Error: std::error::Error + Send + Sync + 'static;

    /// `None` when the account does not exist.
    fn load_account(&mut self, address: Address) -> Result<Option<AccountInfo>, Self::Error>;

    fn load_storage(&mut self, address: Address, index: U256) -> Result<U256, Self::Error>;

    fn load_code(&mut self, code_hash: B256) -> Result<Bytecode, Self::Error>;

    fn load_block_hash(&mut self, number: u64) -> Result<B256, Self::Error>;
}

impl<T: Database + ?Sized> Database for &mut T {
    type Error = T::Error;

    fn load_account(&mut self, address: Address) -> Result<Option<AccountInfo>, Self::Error> {
        (**self).load_account(address)
    }

    fn load_storage(&mut self, address: Address, index: U256) -> Result<U256, Self::Error> {
        (**self).load_storage(address, index)
    }

    fn load_code(&mut self, code_hash: B256) -> Result<Bytecode, Self::Error> {
        (**self).load_code(code_hash)
    }

    fn load_block_hash(&mut self, number: u64) -> Result<B256, Self::Error> {
        (**self).load_block_hash(number)
    }
}

/// Accepts the state produced by a finished transaction.
pub trait DatabaseCommit {
    fn commit(&mut self, changes: EvmState);
}

/// A database where nothing exists.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EmptyDB;

impl Database for EmptyDB {
    type Error = Infallible;

    fn load_account(&mut self, _address: Address) -> Result<Option<AccountInfo>, Self::Error> {
        Ok(None)
    }

    fn load_storage(&mut self, _address: Address, _index: U256) -> Result<U256, Self::Error> {
        Ok(U256::ZERO)
    }

    fn load_code(&mut self, _code_hash: B256) -> Result<Bytecode, Self::Error> {
        Ok(Bytecode::default())
    }

    fn load_block_hash(&mut self, number: u64) -> Result<B256, Self::Error> {
        Ok(keccak256(number.to_string().as_bytes()))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InMemoryDBError {
    #[error("code not found for hash {0}")]
    CodeNotFound(B256),
    #[error("block hash not found for block {0}")]
    BlockHashNotFound(u64),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DbAccount {
    pub info: AccountInfo,
    pub storage: HashMap<U256, U256>,
}

/// A map backed database, useful for tests and local simulation.
///
/// `spec_id` decides whether touched empty accounts are removed on commit
/// (EIP-161, from SPURIOUS_DRAGON).
#[derive(Debug, Clone, Default)]
pub struct InMemoryDB {
    accounts: HashMap<Address, DbAccount>,
    contracts: HashMap<B256, Bytecode>,
    block_hashes: HashMap<u64, B256>,
    spec_id: SpecId,
}

impl InMemoryDB {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_spec_id(mut self, spec_id: SpecId) -> Self {
        self.spec_id = spec_id;
        self
    }

    pub fn spec_id(&self) -> SpecId {
        self.spec_id
    }

    pub fn with_account(mut self, address: Address, info: AccountInfo) -> Self {
        self.insert_account_info(address, info);
        self
    }

    pub fn with_storage(mut self, address: Address, index: U256, value: U256) -> Self {
        self.insert_account_storage(address, index, value);
        self
    }

    pub fn with_block_hash(mut self, number: u64, hash: B256) -> Self {
        self.insert_block_hash(number, hash);
        self
    }

    pub fn insert_account_info(&mut self, address: Address, mut info: AccountInfo) {
        self.insert_contract(&mut info);
        self.accounts.entry(address).or_default().info = info;
    }

    pub fn insert_account_storage(&mut self, address: Address, index: U256, value: U256) {
        self.accounts
            .entry(address)
            .or_default()
            .storage
            .insert(index, value);
    }

    pub fn insert_block_hash(&mut self, number: u64, hash: B256) {
        self.block_hashes.insert(number, hash);
    }

    pub fn account(&self, address: &Address) -> Option<&DbAccount> {
        self.accounts.get(address)
    }

    pub fn storage(&self, address: &Address, index: &U256) -> U256 {
        self.accounts
            .get(address)
            .and_then(|account| account.storage.get(index).copied())
            .unwrap_or_default()
    }

    pub fn contract(&self, code_hash: &B256) -> Option<&Bytecode> {
        self.contracts.get(code_hash)
    }

    /// Moves non-empty code into the contract map, filling in the hash when
    /// it is missing.
    fn insert_contract(&mut self, info: &mut AccountInfo) {
        let Some(code) = &info.code else {
            return;
        };
        if code.is_empty() {
            return;
        }
        if info.code_hash == KECCAK_EMPTY {
            info.code_hash = code.hash_slow();
        }
        self.contracts.insert(info.code_hash, code.clone());
    }
}

impl Database for InMemoryDB {
    type Error = InMemoryDBError;

    fn load_account(&mut self, address: Address) -> Result<Option<AccountInfo>, Self::Error> {
        Ok(self.accounts.get(&address).map(|account| account.info.clone()))
    }

    fn load_storage(&mut self, address: Address, index: U256) -> Result<U256, Self::Error> {
        Ok(self.storage(&address, &index))
    }

    fn load_code(&mut self, code_hash: B256) -> Result<Bytecode, Self::Error> {
        if code_hash == KECCAK_EMPTY || code_hash == B256::ZERO {
            return Ok(Bytecode::default());
        }
        self.contracts
            .get(&code_hash)
            .cloned()
            .ok_or(InMemoryDBError::CodeNotFound(code_hash))
    }

    fn load_block_hash(&mut self, number: u64) -> Result<B256, Self::Error> {
        self.block_hashes
            .get(&number)
            .copied()
            .ok_or(InMemoryDBError::BlockHashNotFound(number))
    }
}

impl DatabaseCommit for InMemoryDB {
    fn commit(&mut self, changes: EvmState) {
        let clears_empty = self.spec_id.clears_empty_accounts();
        for (address, mut account) in changes {
            if account.is_selfdestructed() || (clears_empty && account.is_empty_touched()) {
                trace!(target: "selene::db", "prune account address={:?}", address);
                self.accounts.remove(&address);
                continue;
            }
            if !account.is_touched() && !account.is_created() {
                continue;
            }

            self.insert_contract(&mut account.info);

            let db_account = self.accounts.entry(address).or_default();
            if account.is_created() {
                db_account.storage.clear();
            }
            db_account.info = account.info;
            db_account.storage.extend(
                account
                    .storage
                    .into_iter()
                    .filter(|(_, slot)| slot.is_changed())
                    .map(|(index, slot)| (index, slot.present_value)),
            );

            trace!(target: "selene::db", "commit account address={:?}", address);
        }
    }
}
