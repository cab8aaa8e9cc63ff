pub mod database;
pub mod types;

pub use crate::database::{ConfigDB, Database, FileDB};
