pub mod errors;
pub mod spec;
pub mod utils;
