//! CLI command implementations

pub mod run;
pub mod shas;
