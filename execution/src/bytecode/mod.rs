use std::sync::Arc;

use alloy::primitives::{b256, keccak256, Bytes, B256};

use crate::errors::BytecodeDecodeError;

mod eof;
mod jump_table;
mod legacy;

pub use eof::*;
pub use jump_table::{JumpTable, LazyJumpTable};
pub use legacy::{LegacyAnalyzedBytecode, LEGACY_PADDING};

/// keccak256 of the empty byte string.
pub const KECCAK_EMPTY: B256 =
    b256!("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470");

pub mod opcode {
    pub const STOP: u8 = 0x00;
    pub const JUMPDEST: u8 = 0x5b;
    pub const PUSH1: u8 = 0x60;
    pub const PUSH32: u8 = 0x7f;
}

/// Contract code as stored in an account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Bytecode {
    /// Legacy code that has not been padded or analyzed.
    LegacyRaw(Bytes),
    LegacyAnalyzed(LegacyAnalyzedBytecode),
    Eof(Arc<Eof>),
}

impl Default for Bytecode {
    fn default() -> Self {
        Self::LegacyRaw(Bytes::new())
    }
}

impl Bytecode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_raw(bytes: Bytes) -> Self {
        Self::LegacyRaw(bytes)
    }

    pub fn new_analyzed(bytecode: Bytes, original_len: usize, jump_table: JumpTable) -> Self {
        Self::LegacyAnalyzed(LegacyAnalyzedBytecode::new(
            bytecode,
            original_len,
            jump_table,
        ))
    }

    /// Classifies `raw` by its prefix: EOF magic selects the container
    /// parser, anything else is kept as raw legacy code.
    pub fn decode(raw: Bytes) -> Result<Self, BytecodeDecodeError> {
        if raw.starts_with(&EOF_MAGIC_BYTES) {
            let eof = Eof::decode(raw)?;
            Ok(Self::Eof(Arc::new(eof)))
        } else {
            Ok(Self::LegacyRaw(raw))
        }
    }

    /// Pads raw legacy code. EOF and already analyzed code are returned as is.
    pub fn into_analyzed(self) -> Self {
        match self {
            Self::LegacyRaw(raw) => Self::LegacyAnalyzed(LegacyAnalyzedBytecode::from_raw(raw)),
            other => other,
        }
    }

    pub fn legacy_jump_table(&self) -> Option<&JumpTable> {
        match self {
            Self::LegacyAnalyzed(analyzed) => Some(analyzed.jump_table()),
            _ => None,
        }
    }

    /// Raw code has no jump table yet, so nothing in it is a valid target.
    pub fn is_valid_jump(&self, pc: usize) -> bool {
        self.legacy_jump_table()
            .is_some_and(|table| table.is_valid(pc))
    }

    pub fn eof(&self) -> Option<&Arc<Eof>> {
        match self {
            Self::Eof(eof) => Some(eof),
            _ => None,
        }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self, Self::Eof(_))
    }

    /// Bytes handed to the interpreter: padded for analyzed legacy code, the
    /// full container for EOF.
    pub fn bytecode(&self) -> &Bytes {
        match self {
            Self::LegacyRaw(raw) => raw,
            Self::LegacyAnalyzed(analyzed) => analyzed.bytecode(),
            Self::Eof(eof) => eof.raw(),
        }
    }

    pub fn original_bytes(&self) -> Bytes {
        match self {
            Self::LegacyRaw(raw) => raw.clone(),
            Self::LegacyAnalyzed(analyzed) => analyzed.original_bytes(),
            Self::Eof(eof) => eof.raw().clone(),
        }
    }

    pub fn original_byte_slice(&self) -> &[u8] {
        match self {
            Self::LegacyRaw(raw) => raw,
            Self::LegacyAnalyzed(analyzed) => analyzed.original_byte_slice(),
            Self::Eof(eof) => eof.raw(),
        }
    }

    pub fn len(&self) -> usize {
        self.original_byte_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hash_slow(&self) -> B256 {
        if self.is_empty() {
            KECCAK_EMPTY
        } else {
            keccak256(self.original_byte_slice())
        }
    }
}
