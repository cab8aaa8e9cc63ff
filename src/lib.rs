#![warn(missing_debug_implementations, rust_2018_idioms, unreachable_pub)]
#![deny(rustdoc::broken_intra_doc_links)]
#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_variables))
))]

//! # Ethereum execution state with light client checkpoints.
//!
//! > selene keeps the state of a single Ethereum transaction in a journal that
//! > can be rolled back frame by frame, and persists the checkpoint a light
//! > client syncs from.
//!
//! ## Quickstart: `prelude`
//!
//! The prelude imports the data types and traits needed to run state changes
//! against a database.
//!
//! ```no_run
//! # #[allow(unused)]
//! use selene::prelude::*;
//! ```
//!
//! Usage examples live in the `tests/` directories of each crate.
//!
//! ## Breakdown of exported selene modules
//!
//! ### `execution`
//!
//! `EvmContext` binds a `JournaledState` to a `Database`. Every access
//! reports whether it was cold (EIP-2929), every mutation is journaled, and
//! `commit_transaction` writes the result back through `DatabaseCommit`.
//!
//! ### `bytecode`
//!
//! Legacy bytecode with lazily computed jump tables, and the EOF container
//! codec.
//!
//! ### `consensus`
//!
//! Checkpoint storage (`FileDB`, `ConfigDB`) and the light client update types.
//!
//! ### `config`
//!
//! `Config`, loaded from defaults, a TOML file and `SELENE_*` variables.
//!
//! ### `errors`
//!
//! Errors used across selene.

pub mod consensus {
    pub use consensus::*;
}

pub mod config {
    pub use config::{Config, ENV_PREFIX};
}

pub mod execution {
    pub use execution::context::EvmContext;
    pub use execution::db::{Database, DatabaseCommit, DbAccount, EmptyDB, InMemoryDB};
    pub use execution::inputs::*;
    pub use execution::journal::*;
    pub use execution::state::*;
}

pub mod bytecode {
    pub use execution::bytecode::*;
}

pub mod types {
    pub use common::spec::SpecId;
    pub use consensus::types::*;
    pub use execution::types::*;
}

pub mod errors {
    pub use common::errors::*;
    pub use execution::errors::*;
}

pub mod prelude {
    pub use crate::bytecode::{Bytecode, Eof, KECCAK_EMPTY};
    pub use crate::config::*;
    pub use crate::errors::*;
    pub use crate::execution::*;
    pub use crate::types::*;
    pub use consensus::{ConfigDB, FileDB};
}

pub mod common {
    pub use common::*;
}
