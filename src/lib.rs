//! setup-otp - Install Erlang/OTP in CI, building from source when needed
//!
//! This crate provides the library behind the `setup-otp` binary: version
//! resolution against the upstream catalog, source download, the autotools
//! build, packaging, the artifact cache, installation and release publishing.

pub mod builder;
pub mod core;
pub mod ops;
pub mod sources;
pub mod util;

/// Test utilities and mocks for setup-otp unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides mock implementations for process execution,
/// HTTP access and the release API.
#[cfg(test)]
pub mod test_support;

pub use core::{ResolvedVersion, SetupError, SetupResult, TargetTriple, VersionCatalog};
pub use util::context::GlobalContext;
