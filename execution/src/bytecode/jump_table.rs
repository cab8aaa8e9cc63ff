use std::fmt;
use std::sync::{Arc, OnceLock};

use bitvec::prelude::*;

use super::opcode;

/// Valid jump destinations of a legacy bytecode, one bit per byte offset.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct JumpTable(Arc<BitVec<u8>>);

impl JumpTable {
    /// Scans `code` once, skipping PUSH immediates, and marks every JUMPDEST.
    pub fn analyze(code: &[u8]) -> Self {
        let mut jumps: BitVec<u8> = bitvec![u8, Lsb0; 0; code.len()];

        let mut i = 0;
        while i < code.len() {
            let op = code[i];
            if op == opcode::JUMPDEST {
                jumps.set(i, true);
                i += 1;
            } else if (opcode::PUSH1..=opcode::PUSH32).contains(&op) {
                i += 2 + (op - opcode::PUSH1) as usize;
            } else {
                i += 1;
            }
        }

        Self(Arc::new(jumps))
    }

    pub fn is_valid(&self, pc: usize) -> bool {
        pc < self.0.len() && self.0[pc]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bitslice(&self) -> &BitSlice<u8> {
        &self.0
    }

    pub fn as_slice(&self) -> &[u8] {
        self.0.as_raw_slice()
    }
}

impl fmt::Debug for JumpTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("JumpTable")
            .field(&hex::encode(self.as_slice()))
            .finish()
    }
}

/// A jump table computed on first use and shared by every clone.
///
/// Concurrent first callers block on the cell until the single computation
/// has been published, so all of them observe the same table.
#[derive(Clone, Default)]
pub struct LazyJumpTable {
    cell: Arc<OnceLock<JumpTable>>,
}

impl LazyJumpTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cell that already holds `table`.
    pub fn ready(table: JumpTable) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(table);
        Self {
            cell: Arc::new(cell),
        }
    }

    pub fn get(&self) -> Option<&JumpTable> {
        self.cell.get()
    }

    pub fn is_ready(&self) -> bool {
        self.cell.get().is_some()
    }

    pub fn get_or_init_with<F>(&self, f: F) -> &JumpTable
    where
        F: FnOnce() -> JumpTable,
    {
        self.cell.get_or_init(f)
    }

    pub fn get_or_analyze(&self, code: &[u8]) -> &JumpTable {
        self.get_or_init_with(|| JumpTable::analyze(code))
    }
}

impl fmt::Debug for LazyJumpTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(table) => f.debug_tuple("LazyJumpTable").field(table).finish(),
            None => f.write_str("LazyJumpTable(<pending>)"),
        }
    }
}
