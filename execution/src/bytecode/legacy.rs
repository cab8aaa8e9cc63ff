use alloy::primitives::Bytes;

use super::{JumpTable, LazyJumpTable};

/// Zero bytes appended to legacy code: the widest PUSH immediate plus a STOP.
pub const LEGACY_PADDING: usize = 33;

/// Legacy bytecode padded for execution, with a jump table computed on first use.
#[derive(Clone, Debug)]
pub struct LegacyAnalyzedBytecode {
    bytecode: Bytes,
    original_len: usize,
    jump_table: LazyJumpTable,
}

impl Default for LegacyAnalyzedBytecode {
    fn default() -> Self {
        Self::from_raw(Bytes::new())
    }
}

impl LegacyAnalyzedBytecode {
    /// Wraps already padded code and its precomputed jump table.
    /// `original_len` is clamped to the length of `bytecode`.
    pub fn new(bytecode: Bytes, original_len: usize, jump_table: JumpTable) -> Self {
        Self {
            original_len: original_len.min(bytecode.len()),
            bytecode,
            jump_table: LazyJumpTable::ready(jump_table),
        }
    }

    pub fn from_raw(raw: Bytes) -> Self {
        let original_len = raw.len();
        let mut padded = Vec::with_capacity(original_len + LEGACY_PADDING);
        padded.extend_from_slice(&raw);
        padded.resize(original_len + LEGACY_PADDING, 0);

        Self {
            bytecode: padded.into(),
            original_len,
            jump_table: LazyJumpTable::new(),
        }
    }

    pub fn bytecode(&self) -> &Bytes {
        &self.bytecode
    }

    pub fn original_len(&self) -> usize {
        self.original_len
    }

    pub fn original_bytes(&self) -> Bytes {
        self.bytecode.slice(..self.original_len)
    }

    pub fn original_byte_slice(&self) -> &[u8] {
        &self.bytecode[..self.original_len]
    }

    pub fn jump_table(&self) -> &JumpTable {
        self.jump_table.get_or_analyze(&self.bytecode[..self.original_len])
    }

    pub fn is_analyzed(&self) -> bool {
        self.jump_table.is_ready()
    }
}

impl PartialEq for LegacyAnalyzedBytecode {
    fn eq(&self, other: &Self) -> bool {
        self.original_len == other.original_len && self.bytecode == other.bytecode
    }
}

impl Eq for LegacyAnalyzedBytecode {}
