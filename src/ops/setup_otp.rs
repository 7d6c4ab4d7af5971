//! The install pipeline.
//!
//! Resolve the requested version against the upstream catalog, reuse a
//! cached artifact when one exists, otherwise fetch, build and package from
//! source, then install.

use std::path::PathBuf;

use crate::builder::otp::{BuildOptions, OtpBuilder};
use crate::builder::package::{archive, RELEASE_ARCHIVE};
use crate::core::{ResolvedVersion, SetupResult};
use crate::ops::cache::ArtifactCache;
use crate::ops::install::{Installation, Installer};
use crate::sources::catalog::load_catalog;
use crate::sources::http::HttpClient;
use crate::sources::tarball::SourceFetcher;
use crate::util::context::GlobalContext;
use crate::util::process::CommandRunner;
use crate::util::shell::{Shell, Status};

/// The collaborators a pipeline runs against.
pub struct Services<'a> {
    pub http: &'a dyn HttpClient,
    pub runner: &'a dyn CommandRunner,
    pub cache: &'a dyn ArtifactCache,
    pub shell: &'a Shell,
}

/// Result of [`install_otp`].
#[derive(Debug, Clone)]
pub struct InstallReport {
    pub version: ResolvedVersion,
    pub installation: Installation,
    /// The artifact came from the cache and nothing was built.
    pub cache_hit: bool,
}

/// Install the OTP release matching `specifier`.
pub fn install_otp(ctx: &GlobalContext, services: &Services<'_>, specifier: &str) -> SetupResult<InstallReport> {
    let shell = services.shell;
    let config = ctx.config();

    shell.status(Status::Resolving, format!("OTP {}", specifier));
    let catalog = load_catalog(services.http, config.catalog_url())?;
    let version = catalog.resolve(specifier)?;

    let cache_key = config.cache_key();
    let (artifact, cache_hit) = match services.cache.lookup(cache_key, version.as_str())? {
        Some(dir) => {
            shell.status(Status::Cached, format!("OTP {} ({})", version, dir.display()));
            (dir.join(RELEASE_ARCHIVE), true)
        }
        None => (build_artifact(ctx, services, &version)?, false),
    };

    let installation = Installer::new(services.runner, shell, ctx.install_root()).install(&artifact)?;
    shell.status(
        Status::Installed,
        format!("OTP {} to {}", version, installation.root().display()),
    );

    Ok(InstallReport {
        version,
        installation,
        cache_hit,
    })
}

/// Fetch, build and package `version`, then store it in the cache.
///
/// Returns the path of the cached artifact.
fn build_artifact(ctx: &GlobalContext, services: &Services<'_>, version: &ResolvedVersion) -> SetupResult<PathBuf> {
    let shell = services.shell;
    let config = ctx.config();

    shell.status(Status::Fetching, format!("OTP {} source", version));
    let fetcher = SourceFetcher::new(services.http, config.archive_base_url(), ctx.work_dir());
    let source = fetcher.fetch(version)?;

    shell.status(Status::Compiling, format!("OTP {}", version));
    let builder = OtpBuilder::new(services.runner, shell, BuildOptions::from_context(ctx));
    let release = builder.make(source.root())?;

    shell.status(Status::Packaging, RELEASE_ARCHIVE);
    let packaged = archive(&release, RELEASE_ARCHIVE)?;

    let entry = services
        .cache
        .store(&packaged, RELEASE_ARCHIVE, config.cache_key(), version.as_str())?;
    Ok(entry.artifact())
}
