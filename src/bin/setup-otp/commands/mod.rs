//! Command implementations

pub mod completions;
pub mod install;
pub mod release;
pub mod versions;
