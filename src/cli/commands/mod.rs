//! CLI command implementations.

pub mod regions;
pub mod run;
