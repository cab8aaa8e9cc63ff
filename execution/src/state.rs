use std::collections::HashMap;

use alloy::primitives::{Address, B256, U256};
use bitflags::bitflags;

use crate::bytecode::{Bytecode, KECCAK_EMPTY};

pub type EvmState = HashMap<Address, Account>;
pub type EvmStorage = HashMap<U256, EvmStorageSlot>;
pub type TransientStorage = HashMap<(Address, U256), U256>;

bitflags! {
    /// Per-transaction status bits of a resident account.
    ///
    /// `Loaded` is the empty set. Legal combinations:
    ///
    /// | bits                                | meaning                                        |
    /// |-------------------------------------|------------------------------------------------|
    /// | (none)                              | loaded from the database, untouched and warm   |
    /// | `Cold`                              | resident but not yet accessed this transaction |
    /// | `LoadedAsNotExisting`               | absent from the database                       |
    /// | `Touched`                           | modified or touched by a call                  |
    /// | `Created \| Touched`                | created by CREATE/CREATE2 in this transaction  |
    /// | `SelfDestructed \| Touched`         | destroyed; stays set until its frame reverts   |
    /// | `LoadedAsNotExisting \| Touched`    | empty account touched, pruned under EIP-161    |
    ///
    /// `Created` and `SelfDestructed` may be combined with each other and
    /// with `LoadedAsNotExisting`; `Cold` never appears with `Touched`.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct AccountStatus: u8 {
        const Loaded = 0b0000_0000;
        const Created = 0b0000_0001;
        const SelfDestructed = 0b0000_0010;
        const Touched = 0b0000_0100;
        const LoadedAsNotExisting = 0b0000_1000;
        const Cold = 0b0001_0000;
    }
}

#[derive(Debug, Clone)]
pub struct AccountInfo {
    pub balance: U256,
    pub nonce: u64,
    pub code_hash: B256,
    /// Code is loaded lazily; `None` means it has to be fetched by hash.
    pub code: Option<Bytecode>,
}

impl Default for AccountInfo {
    fn default() -> Self {
        Self {
            balance: U256::ZERO,
            nonce: 0,
            code_hash: KECCAK_EMPTY,
            code: Some(Bytecode::default()),
        }
    }
}

impl PartialEq for AccountInfo {
    fn eq(&self, other: &Self) -> bool {
        self.balance == other.balance
            && self.nonce == other.nonce
            && self.code_hash == other.code_hash
    }
}

impl Eq for AccountInfo {}

impl AccountInfo {
    pub fn new(balance: U256, nonce: u64, code_hash: B256, code: Bytecode) -> Self {
        Self {
            balance,
            nonce,
            code_hash,
            code: Some(code),
        }
    }

    pub fn from_balance(balance: U256) -> Self {
        Self {
            balance,
            ..Default::default()
        }
    }

    pub fn from_bytecode(code: Bytecode) -> Self {
        Self {
            code_hash: code.hash_slow(),
            code: Some(code),
            ..Default::default()
        }
    }

    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn is_empty_code_hash(&self) -> bool {
        self.code_hash == KECCAK_EMPTY || self.code_hash == B256::ZERO
    }

    pub fn is_empty(&self) -> bool {
        self.balance.is_zero() && self.nonce == 0 && self.is_empty_code_hash()
    }

    pub fn exists(&self) -> bool {
        !self.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EvmStorageSlot {
    pub original_value: U256,
    pub present_value: U256,
    pub is_cold: bool,
}

impl EvmStorageSlot {
    /// A freshly loaded slot, cold until its first access.
    pub fn new(original: U256) -> Self {
        Self {
            original_value: original,
            present_value: original,
            is_cold: true,
        }
    }

    pub fn new_changed(original_value: U256, present_value: U256) -> Self {
        Self {
            original_value,
            present_value,
            is_cold: false,
        }
    }

    pub fn is_changed(&self) -> bool {
        self.original_value != self.present_value
    }

    pub fn original_value(&self) -> U256 {
        self.original_value
    }

    pub fn present_value(&self) -> U256 {
        self.present_value
    }

    pub fn mark_cold(&mut self) {
        self.is_cold = true;
    }

    /// Returns whether the slot was cold.
    pub fn mark_warm(&mut self) -> bool {
        std::mem::replace(&mut self.is_cold, false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Account {
    pub info: AccountInfo,
    pub storage: EvmStorage,
    pub status: AccountStatus,
}

impl From<AccountInfo> for Account {
    fn from(info: AccountInfo) -> Self {
        Self {
            info,
            storage: HashMap::new(),
            status: AccountStatus::Loaded,
        }
    }
}

impl Account {
    pub fn new_not_existing() -> Self {
        Self {
            info: AccountInfo::default(),
            storage: HashMap::new(),
            status: AccountStatus::LoadedAsNotExisting,
        }
    }

    pub fn mark_selfdestruct(&mut self) {
        self.status |= AccountStatus::SelfDestructed;
    }

    pub fn unmark_selfdestruct(&mut self) {
        self.status -= AccountStatus::SelfDestructed;
    }

    pub fn is_selfdestructed(&self) -> bool {
        self.status.contains(AccountStatus::SelfDestructed)
    }

    pub fn mark_touch(&mut self) {
        self.status |= AccountStatus::Touched;
    }

    pub fn unmark_touch(&mut self) {
        self.status -= AccountStatus::Touched;
    }

    pub fn is_touched(&self) -> bool {
        self.status.contains(AccountStatus::Touched)
    }

    pub fn mark_created(&mut self) {
        self.status |= AccountStatus::Created;
    }

    pub fn unmark_created(&mut self) {
        self.status -= AccountStatus::Created;
    }

    pub fn is_created(&self) -> bool {
        self.status.contains(AccountStatus::Created)
    }

    pub fn mark_cold(&mut self) {
        self.status |= AccountStatus::Cold;
    }

    /// Returns whether the account was cold.
    pub fn mark_warm(&mut self) -> bool {
        let was_cold = self.is_cold();
        self.status -= AccountStatus::Cold;
        was_cold
    }

    pub fn is_cold(&self) -> bool {
        self.status.contains(AccountStatus::Cold)
    }

    pub fn is_loaded_as_not_existing(&self) -> bool {
        self.status.contains(AccountStatus::LoadedAsNotExisting)
    }

    pub fn is_empty(&self) -> bool {
        self.info.is_empty()
    }

    /// Touched and empty: removed at the end of the transaction under EIP-161.
    pub fn is_empty_touched(&self) -> bool {
        self.is_touched() && self.is_empty()
    }

    pub fn changed_storage_slots(&self) -> impl Iterator<Item = (&U256, &EvmStorageSlot)> {
        self.storage.iter().filter(|(_, slot)| slot.is_changed())
    }
}

/// The result of a state access with its EIP-2929 warmth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateLoad<T> {
    pub data: T,
    pub is_cold: bool,
}

impl<T> StateLoad<T> {
    pub fn new(data: T, is_cold: bool) -> Self {
        Self { data, is_cold }
    }

    pub fn map<U, F>(self, f: F) -> StateLoad<U>
    where
        F: FnOnce(T) -> U,
    {
        StateLoad::new(f(self.data), self.is_cold)
    }
}
