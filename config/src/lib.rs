/// Core Config
pub mod config;
pub use crate::config::*;
