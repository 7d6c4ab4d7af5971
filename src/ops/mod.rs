//! High-level operations.
//!
//! This module contains the pipelines behind the `setup-otp` commands.

pub mod cache;
pub mod install;
pub mod publish;
pub mod setup_otp;

pub use cache::{ArtifactCache, CacheEntry, ToolCache};
pub use install::{add_to_github_path, Installation, Installer};
pub use publish::{asset_name, publish_release, release_tag, PublishOutcome};
pub use setup_otp::{install_otp, InstallReport, Services};
