use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::mem;

use alloy::primitives::{Address, Log, B256, U256};
use tracing::{debug, trace};

use common::spec::SpecId;

use crate::bytecode::Bytecode;
use crate::db::Database;
use crate::errors::TransferError;
use crate::state::{Account, EvmState, EvmStorageSlot, StateLoad, TransientStorage};

/// Addresses and slots warmed by the transaction access list.
pub type AccessList = HashMap<Address, HashSet<U256>>;

/// One reversible mutation. Reverting a frame undoes its entries newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalEntry {
    /// First load of the account in this transaction; revert removes it.
    AccountLoaded { address: Address },
    /// A resident cold account was accessed; revert marks it cold again.
    AccountWarmed { address: Address },
    AccountTouched { address: Address },
    /// Revert clears the flag. Storage zeroed by the creation is restored by
    /// the `StorageChanged` entries that follow it.
    AccountCreated { address: Address },
    /// Revert restores the flag and moves `had_balance` back from `target`.
    AccountDestroyed {
        address: Address,
        target: Address,
        was_destroyed: bool,
        had_balance: U256,
    },
    BalanceTransfer {
        from: Address,
        to: Address,
        balance: U256,
    },
    NonceChange { address: Address },
    CodeChange {
        address: Address,
        had_code: Option<Bytecode>,
        had_hash: B256,
    },
    /// Revert marks the slot cold unless the access list warmed it.
    StorageWarmed { address: Address, key: U256 },
    StorageChanged {
        address: Address,
        key: U256,
        had_value: U256,
    },
    TransientStorageChange {
        address: Address,
        key: U256,
        had_value: U256,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JournalCheckpoint {
    log_i: usize,
    journal_i: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SStoreResult {
    pub original_value: U256,
    pub present_value: U256,
    pub new_value: U256,
}

impl SStoreResult {
    pub fn is_new_eq_present(&self) -> bool {
        self.new_value == self.present_value
    }

    pub fn is_original_eq_present(&self) -> bool {
        self.original_value == self.present_value
    }

    pub fn is_original_eq_new(&self) -> bool {
        self.original_value == self.new_value
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelfDestructResult {
    pub had_value: bool,
    pub target_exists: bool,
    pub previously_destroyed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JournalOutput {
    pub state: EvmState,
    pub logs: Vec<Log>,
}

/// Transaction-scoped state with frame-level undo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournaledState {
    pub state: EvmState,
    pub transient_storage: TransientStorage,
    pub logs: Vec<Log>,
    pub depth: usize,
    pub journal: Vec<JournalEntry>,
    pub spec: SpecId,
    pub access_list: AccessList,
}

impl JournaledState {
    /// `warm_addresses` stay warm for the whole transaction, like access
    /// list entries.
    pub fn new(spec: SpecId, warm_addresses: HashSet<Address>) -> Self {
        Self {
            state: HashMap::new(),
            transient_storage: HashMap::new(),
            logs: Vec::new(),
            depth: 0,
            journal: Vec::new(),
            spec,
            access_list: warm_addresses
                .into_iter()
                .map(|address| (address, HashSet::new()))
                .collect(),
        }
    }

    pub fn set_spec_id(&mut self, spec: SpecId) {
        self.spec = spec;
    }

    pub fn account(&self, address: &Address) -> Option<&Account> {
        self.state.get(address)
    }

    pub fn checkpoint(&mut self) -> JournalCheckpoint {
        let checkpoint = JournalCheckpoint {
            log_i: self.logs.len(),
            journal_i: self.journal.len(),
        };
        self.depth += 1;
        checkpoint
    }

    pub fn checkpoint_commit(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        debug!(target: "selene::journal", depth = self.depth, "committed checkpoint");
    }

    pub fn checkpoint_revert(&mut self, checkpoint: JournalCheckpoint) {
        self.depth = self.depth.saturating_sub(1);
        let reverted = self.revert_to(checkpoint);
        debug!(target: "selene::journal", depth = self.depth, reverted, "reverted checkpoint");
    }

    /// Undoes everything the transaction did so far.
    pub fn revert_all(&mut self) {
        let reverted = self.revert_to(JournalCheckpoint {
            log_i: 0,
            journal_i: 0,
        });
        self.depth = 0;
        debug!(target: "selene::journal", reverted, "reverted transaction");
    }

    fn revert_to(&mut self, checkpoint: JournalCheckpoint) -> usize {
        let entries = self
            .journal
            .split_off(checkpoint.journal_i.min(self.journal.len()));
        let reverted = entries.len();
        for entry in entries.into_iter().rev() {
            self.revert_entry(entry);
        }
        self.logs.truncate(checkpoint.log_i);
        reverted
    }

    fn revert_entry(&mut self, entry: JournalEntry) {
        match entry {
            JournalEntry::AccountLoaded { address } => {
                self.state.remove(&address);
            }
            JournalEntry::AccountWarmed { address } => {
                let listed = self.access_list.contains_key(&address);
                if let Some(account) = self.state.get_mut(&address) {
                    if !listed {
                        account.mark_cold();
                    }
                }
            }
            JournalEntry::AccountTouched { address } => {
                if let Some(account) = self.state.get_mut(&address) {
                    account.unmark_touch();
                }
            }
            JournalEntry::AccountCreated { address } => {
                if let Some(account) = self.state.get_mut(&address) {
                    account.unmark_created();
                }
            }
            JournalEntry::AccountDestroyed {
                address,
                target,
                was_destroyed,
                had_balance,
            } => {
                if let Some(account) = self.state.get_mut(&address) {
                    if !was_destroyed {
                        account.unmark_selfdestruct();
                    }
                    account.info.balance = account.info.balance.wrapping_add(had_balance);
                }
                if address != target {
                    if let Some(target) = self.state.get_mut(&target) {
                        target.info.balance = target.info.balance.wrapping_sub(had_balance);
                    }
                }
            }
            JournalEntry::BalanceTransfer { from, to, balance } => {
                if let Some(from) = self.state.get_mut(&from) {
                    from.info.balance = from.info.balance.wrapping_add(balance);
                }
                if let Some(to) = self.state.get_mut(&to) {
                    to.info.balance = to.info.balance.wrapping_sub(balance);
                }
            }
            JournalEntry::NonceChange { address } => {
                if let Some(account) = self.state.get_mut(&address) {
                    account.info.nonce = account.info.nonce.saturating_sub(1);
                }
            }
            JournalEntry::CodeChange {
                address,
                had_code,
                had_hash,
            } => {
                if let Some(account) = self.state.get_mut(&address) {
                    account.info.code = had_code;
                    account.info.code_hash = had_hash;
                }
            }
            JournalEntry::StorageWarmed { address, key } => {
                let listed = is_listed(&self.access_list, &address, &key);
                if let Some(slot) = self
                    .state
                    .get_mut(&address)
                    .and_then(|account| account.storage.get_mut(&key))
                {
                    if !listed {
                        slot.mark_cold();
                    }
                }
            }
            JournalEntry::StorageChanged {
                address,
                key,
                had_value,
            } => {
                if let Some(slot) = self
                    .state
                    .get_mut(&address)
                    .and_then(|account| account.storage.get_mut(&key))
                {
                    slot.present_value = had_value;
                }
            }
            JournalEntry::TransientStorageChange {
                address,
                key,
                had_value,
            } => {
                if had_value.is_zero() {
                    self.transient_storage.remove(&(address, key));
                } else {
                    self.transient_storage.insert((address, key), had_value);
                }
            }
        }
    }

    /// Adds `address` to the access list. Not journaled.
    pub fn warm_account(&mut self, address: Address) {
        self.access_list.entry(address).or_default();
        if let Some(account) = self.state.get_mut(&address) {
            account.mark_warm();
        }
    }

    /// Adds `key` of `address` to the access list. Not journaled.
    pub fn warm_storage(&mut self, address: Address, key: U256) {
        self.access_list.entry(address).or_default().insert(key);
        if let Some(account) = self.state.get_mut(&address) {
            account.mark_warm();
            if let Some(slot) = account.storage.get_mut(&key) {
                slot.mark_warm();
            }
        }
    }

    pub fn load_account<DB: Database>(
        &mut self,
        address: Address,
        db: &mut DB,
    ) -> Result<StateLoad<&mut Account>, DB::Error> {
        load_account_into(
            &mut self.state,
            &mut self.journal,
            &self.access_list,
            address,
            db,
        )
    }

    /// Loads the account and reports whether it exists in the database.
    pub fn load_account_existence<DB: Database>(
        &mut self,
        address: Address,
        db: &mut DB,
    ) -> Result<StateLoad<bool>, DB::Error> {
        let load = self.load_account(address, db)?;
        Ok(load.map(|account| !account.is_loaded_as_not_existing()))
    }

    /// Code of the account, pulled from the database on first use.
    pub fn code<DB: Database>(
        &mut self,
        address: Address,
        db: &mut DB,
    ) -> Result<StateLoad<Bytecode>, DB::Error> {
        let load = load_account_into(
            &mut self.state,
            &mut self.journal,
            &self.access_list,
            address,
            db,
        )?;
        let account = load.data;

        let code = match &account.info.code {
            Some(code) => code.clone(),
            None => {
                let code = if account.info.is_empty_code_hash() {
                    Bytecode::default()
                } else {
                    trace!(
                        target: "selene::journal",
                        "fetch code for address={:?}, hash={:?}",
                        address,
                        account.info.code_hash
                    );
                    db.load_code(account.info.code_hash)?
                };
                account.info.code = Some(code.clone());
                code
            }
        };

        Ok(StateLoad::new(code, load.is_cold))
    }

    pub fn sload<DB: Database>(
        &mut self,
        address: Address,
        key: U256,
        db: &mut DB,
    ) -> Result<StateLoad<U256>, DB::Error> {
        let load = storage_slot(
            &mut self.state,
            &mut self.journal,
            &self.access_list,
            address,
            key,
            db,
        )?;
        Ok(load.map(|slot| slot.present_value))
    }

    /// Writes the present value of a slot. The original value never changes.
    pub fn sstore<DB: Database>(
        &mut self,
        address: Address,
        key: U256,
        new: U256,
        db: &mut DB,
    ) -> Result<StateLoad<SStoreResult>, DB::Error> {
        let load = storage_slot(
            &mut self.state,
            &mut self.journal,
            &self.access_list,
            address,
            key,
            db,
        )?;
        let slot = load.data;

        let result = SStoreResult {
            original_value: slot.original_value,
            present_value: slot.present_value,
            new_value: new,
        };

        if slot.present_value != new {
            self.journal.push(JournalEntry::StorageChanged {
                address,
                key,
                had_value: slot.present_value,
            });
            slot.present_value = new;
        }

        Ok(StateLoad::new(result, load.is_cold))
    }

    pub fn tload(&self, address: Address, key: U256) -> U256 {
        self.transient_storage
            .get(&(address, key))
            .copied()
            .unwrap_or_default()
    }

    /// Zero values are removed rather than stored.
    pub fn tstore(&mut self, address: Address, key: U256, new: U256) {
        let had_value = if new.is_zero() {
            self.transient_storage.remove(&(address, key))
        } else {
            let previous = self
                .transient_storage
                .insert((address, key), new)
                .unwrap_or_default();
            (previous != new).then_some(previous)
        };

        if let Some(had_value) = had_value {
            self.journal.push(JournalEntry::TransientStorageChange {
                address,
                key,
                had_value,
            });
        }
    }

    pub fn log(&mut self, log: Log) {
        self.logs.push(log);
    }

    /// Marks a resident account touched. Returns false if it is not loaded.
    pub fn touch(&mut self, address: &Address) -> bool {
        match self.state.get_mut(address) {
            Some(account) => {
                touch_account(&mut self.journal, *address, account);
                true
            }
            None => false,
        }
    }

    /// Marks a resident account as created in this transaction. Slots
    /// already resident read as zero from here on, like the ones loaded
    /// afterwards.
    pub fn mark_created(&mut self, address: &Address) -> bool {
        let Some(account) = self.state.get_mut(address) else {
            return false;
        };
        if !account.is_created() {
            account.mark_created();
            self.journal
                .push(JournalEntry::AccountCreated { address: *address });

            for (key, slot) in account.storage.iter_mut() {
                if !slot.present_value.is_zero() {
                    self.journal.push(JournalEntry::StorageChanged {
                        address: *address,
                        key: *key,
                        had_value: slot.present_value,
                    });
                    slot.present_value = U256::ZERO;
                }
            }
        }
        touch_account(&mut self.journal, *address, account);
        true
    }

    /// Marks a resident account destroyed without moving its balance.
    pub fn mark_selfdestructed(&mut self, address: &Address) -> bool {
        let Some(account) = self.state.get_mut(address) else {
            return false;
        };
        if !account.is_selfdestructed() {
            account.mark_selfdestruct();
            self.journal.push(JournalEntry::AccountDestroyed {
                address: *address,
                target: *address,
                was_destroyed: false,
                had_balance: U256::ZERO,
            });
        }
        touch_account(&mut self.journal, *address, account);
        true
    }

    /// SELFDESTRUCT: moves the balance to `target` and, unless EIP-6780
    /// applies to a pre-existing account, marks `address` destroyed.
    pub fn selfdestruct<DB: Database>(
        &mut self,
        address: Address,
        target: Address,
        db: &mut DB,
    ) -> Result<StateLoad<SelfDestructResult>, DB::Error> {
        let target_load = load_account_into(
            &mut self.state,
            &mut self.journal,
            &self.access_list,
            target,
            db,
        )?;
        let is_cold = target_load.is_cold;
        let target_exists = !target_load.data.is_empty();

        let account = load_account_into(
            &mut self.state,
            &mut self.journal,
            &self.access_list,
            address,
            db,
        )?
        .data;

        let had_balance = account.info.balance;
        let previously_destroyed = account.is_selfdestructed();
        let destroys = !self.spec.is_enabled_in(SpecId::CANCUN) || account.is_created();

        // Sending to itself burns the balance only when the account goes away.
        let moved = if address != target || destroys {
            had_balance
        } else {
            U256::ZERO
        };
        account.info.balance -= moved;
        if destroys {
            account.mark_selfdestruct();
        }
        touch_account(&mut self.journal, address, account);

        if address != target {
            if let Some(target_account) = self.state.get_mut(&target) {
                target_account.info.balance = target_account.info.balance.wrapping_add(had_balance);
                touch_account(&mut self.journal, target, target_account);
            }
        }

        self.journal.push(JournalEntry::AccountDestroyed {
            address,
            target,
            was_destroyed: previously_destroyed || !destroys,
            had_balance: moved,
        });

        Ok(StateLoad::new(
            SelfDestructResult {
                had_value: !had_balance.is_zero(),
                target_exists,
                previously_destroyed,
            },
            is_cold,
        ))
    }

    /// Moves `balance` between two accounts, loading both.
    ///
    /// A zero transfer only touches the recipient. Balance errors are
    /// reported in the inner `Option`; database errors in the outer result.
    pub fn transfer<DB: Database>(
        &mut self,
        from: Address,
        to: Address,
        balance: U256,
        db: &mut DB,
    ) -> Result<Option<TransferError>, DB::Error> {
        let to_account = load_account_into(
            &mut self.state,
            &mut self.journal,
            &self.access_list,
            to,
            db,
        )?
        .data;
        touch_account(&mut self.journal, to, to_account);

        if balance.is_zero() {
            return Ok(None);
        }

        let Some(to_balance) = to_account.info.balance.checked_add(balance) else {
            return Ok(Some(TransferError::OverflowPayment));
        };

        let from_account = load_account_into(
            &mut self.state,
            &mut self.journal,
            &self.access_list,
            from,
            db,
        )?
        .data;
        touch_account(&mut self.journal, from, from_account);

        let Some(from_balance) = from_account.info.balance.checked_sub(balance) else {
            return Ok(Some(TransferError::OutOfFunds));
        };
        if from == to {
            return Ok(None);
        }
        from_account.info.balance = from_balance;

        if let Some(to_account) = self.state.get_mut(&to) {
            to_account.info.balance = to_balance;
        }

        self.journal
            .push(JournalEntry::BalanceTransfer { from, to, balance });

        Ok(None)
    }

    /// Increments the nonce of a resident account; `None` on overflow or if
    /// the account is not loaded.
    pub fn inc_nonce(&mut self, address: Address) -> Option<u64> {
        let account = self.state.get_mut(&address)?;
        let nonce = account.info.nonce.checked_add(1)?;

        touch_account(&mut self.journal, address, account);
        account.info.nonce = nonce;
        self.journal.push(JournalEntry::NonceChange { address });

        Some(nonce)
    }

    pub fn set_code_with_hash(&mut self, address: Address, code: Bytecode, hash: B256) -> bool {
        let Some(account) = self.state.get_mut(&address) else {
            return false;
        };
        touch_account(&mut self.journal, address, account);

        let had_code = account.info.code.replace(code);
        let had_hash = mem::replace(&mut account.info.code_hash, hash);
        self.journal.push(JournalEntry::CodeChange {
            address,
            had_code,
            had_hash,
        });
        true
    }

    pub fn set_code(&mut self, address: Address, code: Bytecode) -> bool {
        let hash = code.hash_slow();
        self.set_code_with_hash(address, code, hash)
    }

    /// Hands out the transaction's final state and logs, and resets every
    /// per-transaction structure.
    pub fn finalize(&mut self) -> JournalOutput {
        let state = mem::take(&mut self.state);
        let logs = mem::take(&mut self.logs);
        self.clear();

        let pruned = if self.spec.clears_empty_accounts() {
            state.values().filter(|a| a.is_empty_touched()).count()
        } else {
            0
        };
        debug!(
            target: "selene::journal",
            accounts = state.len(),
            pruned,
            logs = logs.len(),
            "finalized transaction"
        );

        JournalOutput { state, logs }
    }

    /// Drops all transaction state without producing output.
    pub fn clear(&mut self) {
        self.state.clear();
        self.transient_storage.clear();
        self.logs.clear();
        self.journal.clear();
        self.access_list.clear();
        self.depth = 0;
    }
}

fn is_listed(access_list: &AccessList, address: &Address, key: &U256) -> bool {
    access_list
        .get(address)
        .is_some_and(|keys| keys.contains(key))
}

fn touch_account(journal: &mut Vec<JournalEntry>, address: Address, account: &mut Account) {
    if !account.is_touched() {
        journal.push(JournalEntry::AccountTouched { address });
        account.mark_touch();
    }
}

fn load_account_into<'a, DB: Database>(
    state: &'a mut EvmState,
    journal: &mut Vec<JournalEntry>,
    access_list: &AccessList,
    address: Address,
    db: &mut DB,
) -> Result<StateLoad<&'a mut Account>, DB::Error> {
    match state.entry(address) {
        Entry::Occupied(entry) => {
            let account = entry.into_mut();
            let is_cold = account.mark_warm();
            if is_cold {
                journal.push(JournalEntry::AccountWarmed { address });
            }
            Ok(StateLoad::new(account, is_cold))
        }
        Entry::Vacant(entry) => {
            trace!(target: "selene::journal", "fetch account for address={:?}", address);
            let mut account = match db.load_account(address)? {
                Some(info) => Account::from(info),
                None => Account::new_not_existing(),
            };
            let is_cold = !access_list.contains_key(&address);
            account.mark_warm();
            journal.push(JournalEntry::AccountLoaded { address });
            Ok(StateLoad::new(entry.insert(account), is_cold))
        }
    }
}

fn storage_slot<'a, DB: Database>(
    state: &'a mut EvmState,
    journal: &mut Vec<JournalEntry>,
    access_list: &AccessList,
    address: Address,
    key: U256,
    db: &mut DB,
) -> Result<StateLoad<&'a mut EvmStorageSlot>, DB::Error> {
    let account = load_account_into(state, journal, access_list, address, db)?.data;
    let is_created = account.is_created();

    let (slot, is_cold) = match account.storage.entry(key) {
        Entry::Occupied(entry) => {
            let slot = entry.into_mut();
            let is_cold = slot.mark_warm();
            (slot, is_cold)
        }
        Entry::Vacant(entry) => {
            trace!(
                target: "selene::journal",
                "fetch storage for address={:?}, slot={}",
                address,
                key
            );
            let value = db.load_storage(address, key)?;
            let mut slot = EvmStorageSlot::new(value);
            if is_created && !value.is_zero() {
                journal.push(JournalEntry::StorageChanged {
                    address,
                    key,
                    had_value: value,
                });
                slot.present_value = U256::ZERO;
            }
            let is_cold = !is_listed(access_list, &address, &key);
            slot.mark_warm();
            (entry.insert(slot), is_cold)
        }
    };

    if is_cold {
        journal.push(JournalEntry::StorageWarmed { address, key });
    }

    Ok(StateLoad::new(slot, is_cold))
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{address, bytes, Bytes};

    use super::*;
    use crate::db::{EmptyDB, InMemoryDB};
    use crate::state::AccountInfo;

    const ALICE: Address = address!("00000000000000000000000000000000000a11ce");
    const BOB: Address = address!("0000000000000000000000000000000000000b0b");

    fn journal() -> JournaledState {
        JournaledState::new(SpecId::LATEST, HashSet::new())
    }

    fn funded_db() -> InMemoryDB {
        InMemoryDB::new()
            .with_account(ALICE, AccountInfo::from_balance(U256::from(100)))
            .with_storage(ALICE, U256::from(1), U256::from(10))
    }

    fn log(data: &'static [u8]) -> Log {
        Log::new_unchecked(ALICE, Vec::new(), Bytes::from_static(data))
    }

    #[test]
    fn test_account_cold_then_warm() {
        let mut journal = journal();
        let mut db = funded_db();

        let load = journal.load_account(ALICE, &mut db).unwrap();
        assert!(load.is_cold);
        assert_eq!(load.data.info.balance, U256::from(100));

        let load = journal.load_account(ALICE, &mut db).unwrap();
        assert!(!load.is_cold);

        let existence = journal.load_account_existence(BOB, &mut db).unwrap();
        assert!(existence.is_cold);
        assert!(!existence.data);
    }

    #[test]
    fn test_access_list_warming() {
        let mut journal = journal();
        let mut db = funded_db();

        journal.warm_storage(ALICE, U256::from(1));
        journal.warm_account(BOB);
        journal.warm_account(BOB);

        assert!(!journal.load_account(ALICE, &mut db).unwrap().is_cold);
        assert!(!journal.load_account(BOB, &mut db).unwrap().is_cold);

        let checkpoint = journal.checkpoint();
        let load = journal.sload(ALICE, U256::from(1), &mut db).unwrap();
        assert!(!load.is_cold);
        assert_eq!(load.data, U256::from(10));
        assert!(journal.sload(ALICE, U256::from(2), &mut db).unwrap().is_cold);
        journal.checkpoint_revert(checkpoint);

        // access list entries stay warm after a revert, other slots do not
        assert!(!journal.sload(ALICE, U256::from(1), &mut db).unwrap().is_cold);
        assert!(journal.sload(ALICE, U256::from(2), &mut db).unwrap().is_cold);
    }

    #[test]
    fn test_warm_addresses_from_constructor() {
        let mut journal = JournaledState::new(SpecId::LATEST, HashSet::from([ALICE]));
        assert!(!journal.load_account(ALICE, &mut EmptyDB).unwrap().is_cold);
    }

    #[test]
    fn test_storage_revert_keeps_original_value() {
        let mut journal = journal();
        let mut db = funded_db();
        let key = U256::from(1);

        let first = journal.sstore(ALICE, key, U256::from(20), &mut db).unwrap();
        assert!(first.is_cold);
        assert_eq!(
            first.data,
            SStoreResult {
                original_value: U256::from(10),
                present_value: U256::from(10),
                new_value: U256::from(20),
            }
        );

        let checkpoint = journal.checkpoint();
        let second = journal.sstore(ALICE, key, U256::from(30), &mut db).unwrap();
        assert!(!second.is_cold);
        assert_eq!(second.data.present_value, U256::from(20));
        assert_eq!(second.data.original_value, U256::from(10));
        journal.checkpoint_revert(checkpoint);

        let slot = journal.account(&ALICE).unwrap().storage[&key];
        assert_eq!(slot.present_value, U256::from(20));
        assert_eq!(slot.original_value, U256::from(10));
        assert!(!slot.is_cold);
    }

    #[test]
    fn test_unchanged_sstore_is_not_journaled() {
        let mut journal = journal();
        let mut db = funded_db();

        journal.sload(ALICE, U256::from(1), &mut db).unwrap();
        let len = journal.journal.len();
        let result = journal
            .sstore(ALICE, U256::from(1), U256::from(10), &mut db)
            .unwrap();

        assert!(result.data.is_new_eq_present());
        assert_eq!(journal.journal.len(), len);
    }

    #[test]
    fn test_revert_removes_accounts_loaded_in_frame() {
        let mut journal = journal();
        let mut db = funded_db();

        let checkpoint = journal.checkpoint();
        journal.sload(ALICE, U256::from(1), &mut db).unwrap();
        journal.checkpoint_revert(checkpoint);

        assert!(journal.account(&ALICE).is_none());
        assert!(journal.load_account(ALICE, &mut db).unwrap().is_cold);
        assert_eq!(journal.depth, 0);
    }

    #[test]
    fn test_transient_storage_scoping() {
        let mut journal = journal();
        let key = U256::from(7);

        journal.tstore(ALICE, key, U256::from(1));
        let checkpoint = journal.checkpoint();
        journal.tstore(ALICE, key, U256::from(2));
        journal.tstore(BOB, key, U256::from(3));
        assert_eq!(journal.tload(ALICE, key), U256::from(2));
        journal.checkpoint_revert(checkpoint);

        assert_eq!(journal.tload(ALICE, key), U256::from(1));
        assert_eq!(journal.tload(BOB, key), U256::ZERO);
        assert!(!journal.transient_storage.contains_key(&(BOB, key)));

        journal.tstore(ALICE, key, U256::ZERO);
        assert!(journal.transient_storage.is_empty());
    }

    #[test]
    fn test_logs_truncated_on_revert() {
        let mut journal = journal();

        journal.log(log(b"a"));
        let outer = journal.checkpoint();
        journal.log(log(b"b"));
        let _inner = journal.checkpoint();
        journal.log(log(b"c"));
        journal.checkpoint_commit();
        assert_eq!(journal.logs.len(), 3);

        journal.checkpoint_revert(outer);
        assert_eq!(journal.logs, vec![log(b"a")]);
        assert_eq!(journal.depth, 0);
    }

    #[test]
    fn test_outer_revert_undoes_committed_inner_frame() {
        let mut journal = journal();
        let mut db = funded_db();
        journal.load_account(ALICE, &mut db).unwrap();

        let outer = journal.checkpoint();
        journal.sstore(ALICE, U256::from(1), U256::from(11), &mut db).unwrap();
        let _inner = journal.checkpoint();
        journal.sstore(ALICE, U256::from(1), U256::from(12), &mut db).unwrap();
        journal.checkpoint_commit();
        assert_eq!(journal.depth, 1);

        journal.checkpoint_revert(outer);
        let slot = journal.account(&ALICE).unwrap().storage[&U256::from(1)];
        assert_eq!(slot.present_value, U256::from(10));
        assert!(slot.is_cold);
    }

    #[test]
    fn test_transfer() {
        let mut journal = journal();
        let mut db = funded_db();
        journal.load_account(ALICE, &mut db).unwrap();

        let checkpoint = journal.checkpoint();
        let err = journal
            .transfer(ALICE, BOB, U256::from(40), &mut db)
            .unwrap();
        assert_eq!(err, None);
        assert_eq!(journal.account(&ALICE).unwrap().info.balance, U256::from(60));
        assert_eq!(journal.account(&BOB).unwrap().info.balance, U256::from(40));
        assert!(journal.account(&BOB).unwrap().is_touched());

        let err = journal
            .transfer(ALICE, BOB, U256::from(61), &mut db)
            .unwrap();
        assert_eq!(err, Some(TransferError::OutOfFunds));
        assert_eq!(journal.account(&ALICE).unwrap().info.balance, U256::from(60));

        journal.checkpoint_revert(checkpoint);
        let alice = journal.account(&ALICE).unwrap();
        assert_eq!(alice.info.balance, U256::from(100));
        assert!(!alice.is_touched());
        assert!(journal.account(&BOB).is_none());
    }

    #[test]
    fn test_transfer_overflow() {
        let mut journal = journal();
        let mut db = funded_db().with_account(BOB, AccountInfo::from_balance(U256::MAX));

        let err = journal.transfer(ALICE, BOB, U256::from(1), &mut db).unwrap();
        assert_eq!(err, Some(TransferError::OverflowPayment));
        assert_eq!(journal.account(&BOB).unwrap().info.balance, U256::MAX);
    }

    #[test]
    fn test_created_account_storage_reads_zero() {
        let mut journal = journal();
        let mut db = funded_db();

        journal.load_account(ALICE, &mut db).unwrap();
        assert!(journal.mark_created(&ALICE));
        assert!(journal.account(&ALICE).unwrap().is_created());

        let load = journal.sload(ALICE, U256::from(1), &mut db).unwrap();
        assert_eq!(load.data, U256::ZERO);
        assert!(load.is_cold);
    }

    #[test]
    fn test_created_account_zeroes_resident_storage() {
        let mut journal = journal();
        let mut db = funded_db().with_storage(ALICE, U256::from(2), U256::from(10));

        assert_eq!(journal.sload(ALICE, U256::from(1), &mut db).unwrap().data, U256::from(10));

        let checkpoint = journal.checkpoint();
        journal.mark_created(&ALICE);

        // loaded before and after the creation, both read zero
        let before = journal.sload(ALICE, U256::from(1), &mut db).unwrap();
        assert!(!before.is_cold);
        assert_eq!(before.data, U256::ZERO);
        assert_eq!(journal.sload(ALICE, U256::from(2), &mut db).unwrap().data, U256::ZERO);

        journal.checkpoint_revert(checkpoint);
        assert!(!journal.account(&ALICE).unwrap().is_created());
        assert_eq!(journal.sload(ALICE, U256::from(1), &mut db).unwrap().data, U256::from(10));
        assert_eq!(journal.sload(ALICE, U256::from(2), &mut db).unwrap().data, U256::from(10));
    }

    #[test]
    fn test_created_revert_keeps_nonce() {
        let mut journal = journal();
        let mut db = InMemoryDB::new()
            .with_account(ALICE, AccountInfo::from_balance(U256::from(1)).with_nonce(5));
        journal.load_account(ALICE, &mut db).unwrap();

        let checkpoint = journal.checkpoint();
        journal.mark_created(&ALICE);
        assert_eq!(journal.inc_nonce(ALICE), Some(6));
        journal.checkpoint_revert(checkpoint);

        let alice = journal.account(&ALICE).unwrap();
        assert!(!alice.is_created());
        assert_eq!(alice.info.nonce, 5);
    }

    #[test]
    fn test_access_listed_account_stays_warm_after_revert() {
        let mut journal = journal();
        let mut db = funded_db();
        let mut alice = Account::from(AccountInfo::from_balance(U256::from(100)));
        alice.mark_cold();
        journal.state.insert(ALICE, alice);

        let checkpoint = journal.checkpoint();
        assert!(journal.load_account(ALICE, &mut db).unwrap().is_cold);
        journal.warm_account(ALICE);
        journal.checkpoint_revert(checkpoint);
        assert!(!journal.account(&ALICE).unwrap().is_cold());

        // without the access list the revert makes it cold again
        let mut bob = Account::from(AccountInfo::default());
        bob.mark_cold();
        journal.state.insert(BOB, bob);
        let checkpoint = journal.checkpoint();
        assert!(journal.load_account(BOB, &mut db).unwrap().is_cold);
        journal.checkpoint_revert(checkpoint);
        assert!(journal.account(&BOB).unwrap().is_cold());
    }

    #[test]
    fn test_status_marks_are_idempotent_and_revertible() {
        let mut journal = journal();
        let mut db = funded_db();
        journal.load_account(ALICE, &mut db).unwrap();
        assert!(!journal.touch(&BOB));

        let checkpoint = journal.checkpoint();
        assert!(journal.mark_selfdestructed(&ALICE));
        let len = journal.journal.len();
        assert!(journal.mark_selfdestructed(&ALICE));
        assert_eq!(journal.journal.len(), len);

        // later accesses do not clear the flag
        journal.load_account(ALICE, &mut db).unwrap();
        journal.sstore(ALICE, U256::from(1), U256::from(2), &mut db).unwrap();
        assert!(journal.account(&ALICE).unwrap().is_selfdestructed());

        journal.checkpoint_revert(checkpoint);
        let alice = journal.account(&ALICE).unwrap();
        assert!(!alice.is_selfdestructed());
        assert!(!alice.is_touched());
    }

    #[test]
    fn test_selfdestruct_moves_balance() {
        let mut journal = JournaledState::new(SpecId::SHANGHAI, HashSet::new());
        let mut db = funded_db();

        let checkpoint = journal.checkpoint();
        let result = journal.selfdestruct(ALICE, BOB, &mut db).unwrap();
        assert!(result.is_cold);
        assert!(result.data.had_value);
        assert!(!result.data.target_exists);
        assert!(!result.data.previously_destroyed);

        let alice = journal.account(&ALICE).unwrap();
        assert!(alice.is_selfdestructed());
        assert_eq!(alice.info.balance, U256::ZERO);
        assert_eq!(journal.account(&BOB).unwrap().info.balance, U256::from(100));

        journal.checkpoint_revert(checkpoint);
        assert!(journal.account(&ALICE).is_none());
        assert!(journal.account(&BOB).is_none());
    }

    #[test]
    fn test_selfdestruct_after_cancun_keeps_existing_account() {
        let mut journal = JournaledState::new(SpecId::CANCUN, HashSet::new());
        let mut db = funded_db();
        journal.load_account(ALICE, &mut db).unwrap();
        journal.load_account(BOB, &mut db).unwrap();

        let checkpoint = journal.checkpoint();
        journal.selfdestruct(ALICE, BOB, &mut db).unwrap();
        assert!(!journal.account(&ALICE).unwrap().is_selfdestructed());
        assert_eq!(journal.account(&BOB).unwrap().info.balance, U256::from(100));

        journal.checkpoint_revert(checkpoint);
        assert_eq!(journal.account(&ALICE).unwrap().info.balance, U256::from(100));
        assert_eq!(journal.account(&BOB).unwrap().info.balance, U256::ZERO);
    }

    #[test]
    fn test_nonce_and_code_changes_revert() {
        let mut journal = journal();
        let mut db = funded_db();
        journal.load_account(ALICE, &mut db).unwrap();

        let checkpoint = journal.checkpoint();
        assert_eq!(journal.inc_nonce(ALICE), Some(1));
        assert_eq!(journal.inc_nonce(BOB), None);

        let code = Bytecode::new_raw(bytes!("6000"));
        assert!(journal.set_code(ALICE, code.clone()));
        assert_eq!(journal.code(ALICE, &mut db).unwrap().data, code);
        assert_eq!(journal.account(&ALICE).unwrap().info.code_hash, code.hash_slow());

        journal.checkpoint_revert(checkpoint);
        let alice = journal.account(&ALICE).unwrap();
        assert_eq!(alice.info.nonce, 0);
        assert!(alice.info.is_empty_code_hash());
    }

    #[test]
    fn test_code_is_pulled_by_hash() {
        let code = Bytecode::new_raw(bytes!("60016002"));
        let mut db = InMemoryDB::new().with_account(BOB, AccountInfo::from_bytecode(code.clone()));

        let mut journal = journal();
        journal.load_account(BOB, &mut db).unwrap().data.info.code = None;

        let load = journal.code(BOB, &mut db).unwrap();
        assert!(!load.is_cold);
        assert_eq!(load.data, code);
        assert_eq!(journal.account(&BOB).unwrap().info.code, Some(code));
    }

    #[test]
    fn test_finalize_resets_transaction_state() {
        let mut journal = journal();
        let mut db = funded_db();

        journal.warm_account(BOB);
        journal.transfer(ALICE, BOB, U256::from(1), &mut db).unwrap();
        journal.tstore(ALICE, U256::from(1), U256::from(1));
        journal.log(log(b"done"));
        let _ = journal.checkpoint();

        let output = journal.finalize();
        assert_eq!(output.state.len(), 2);
        assert_eq!(output.logs.len(), 1);

        assert!(journal.state.is_empty());
        assert!(journal.journal.is_empty());
        assert!(journal.transient_storage.is_empty());
        assert!(journal.access_list.is_empty());
        assert_eq!(journal.depth, 0);
    }
}
