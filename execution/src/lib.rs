pub mod bytecode;
pub mod context;
pub mod db;
pub mod errors;
pub mod inputs;
pub mod journal;
pub mod state;
pub mod types;

pub use crate::context::EvmContext;
pub use crate::journal::JournaledState;
pub use common::spec::SpecId;
