//! Core domain types.

pub mod error;
pub mod triple;
pub mod version;

pub use error::{SetupError, SetupResult};
pub use triple::TargetTriple;
pub use version::{ResolvedVersion, VersionCatalog};
