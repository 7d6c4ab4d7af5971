//! Building OTP from source.
//!
//! The autotools toolchain is driven as a black box; this module owns the
//! step sequencing, SSL discovery and packaging of the resulting release.

pub mod otp;
pub mod package;
pub mod ssl;

pub use otp::{BuildOptions, OtpBuilder};
pub use package::{archive, locate_release_subdirectory, make_release_asset, RELEASE_ARCHIVE};
pub use ssl::resolve_ssl_flag;
