//! Publishing prebuilt releases.
//!
//! The publisher makes sure the release `OTP-<version>` carries the asset
//! `OTP-<version>-<triple>.tar.gz`, building it only when it is missing.
//! Re-running against a repository that already has the asset is a no-op,
//! as is losing the race to create the release against a concurrent job.

use std::path::Path;

use crate::builder::otp::{BuildOptions, OtpBuilder};
use crate::builder::package::make_release_asset;
use crate::core::{SetupError, SetupResult, TargetTriple};
use crate::ops::setup_otp::Services;
use crate::sources::catalog::load_catalog;
use crate::sources::github::{Asset, CreateRelease, Release, ReleaseApi};
use crate::sources::tarball::SourceFetcher;
use crate::util::context::GlobalContext;
use crate::util::shell::Status;

/// What [`publish_release`] ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The asset was already present; nothing was built.
    AlreadyPublished { release: Release, asset: Asset },
    /// The asset was built and its upload confirmed.
    Uploaded { release: Release, asset: Asset },
}

impl PublishOutcome {
    pub fn asset(&self) -> &Asset {
        match self {
            PublishOutcome::AlreadyPublished { asset, .. } | PublishOutcome::Uploaded { asset, .. } => asset,
        }
    }
}

/// `OTP-<version>`
pub fn release_tag(version: &str) -> String {
    format!("OTP-{}", version)
}

/// `OTP-<version>-<triple>.tar.gz`
pub fn asset_name(version: &str, target: &TargetTriple) -> String {
    format!("OTP-{}-{}.tar.gz", version, target)
}

/// Ensure the release for `specifier` has an asset for `target`.
///
/// `target` only names the asset; the build itself always runs for the host.
/// The version is resolved before a missing release is created, so an unknown
/// specifier never leaves an empty release behind.
pub fn publish_release(
    ctx: &GlobalContext,
    services: &Services<'_>,
    api: &dyn ReleaseApi,
    specifier: &str,
    target: &TargetTriple,
) -> SetupResult<PublishOutcome> {
    let shell = services.shell;
    let tag = release_tag(specifier);
    let name = asset_name(specifier, target);

    shell.status(Status::Resolving, format!("release {}", tag));
    let (release, version) = match api.get_release_by_tag(&tag)? {
        Some(release) => {
            tracing::debug!("found release {} (id {})", tag, release.id);
            if let Some(asset) = find_asset(api, &release, &name)? {
                shell.status(Status::Skipped, format!("{} already published on {}", name, tag));
                return Ok(PublishOutcome::AlreadyPublished { release, asset });
            }
            let version = load_catalog(services.http, ctx.config().catalog_url())?.resolve(specifier)?;
            (release, version)
        }
        None => {
            let version = load_catalog(services.http, ctx.config().catalog_url())?.resolve(specifier)?;
            let (release, created) = create_release(api, &tag)?;
            if !created {
                if let Some(asset) = find_asset(api, &release, &name)? {
                    shell.status(Status::Skipped, format!("{} already published on {}", name, tag));
                    return Ok(PublishOutcome::AlreadyPublished { release, asset });
                }
            }
            (release, version)
        }
    };

    shell.status(Status::Fetching, format!("OTP {} source", version));
    let fetcher = SourceFetcher::new(services.http, ctx.config().archive_base_url(), ctx.work_dir());
    let source = fetcher.fetch(&version)?;

    let builder = OtpBuilder::new(services.runner, shell, BuildOptions::from_context(ctx));

    shell.status(Status::Compiling, format!("OTP {} for {}", version, target));
    let artifact = make_release_asset(&builder, source.root(), &name)?;

    shell.status(Status::Uploading, &name);
    let asset = upload_confirmed(api, &release, &name, &artifact)?;
    shell.status(Status::Published, format!("{} on {}", asset.name, tag));

    Ok(PublishOutcome::Uploaded { release, asset })
}

fn find_asset(api: &dyn ReleaseApi, release: &Release, name: &str) -> SetupResult<Option<Asset>> {
    Ok(api.list_assets(release)?.into_iter().find(|a| a.name == name))
}

/// Returns the release and whether it was created by this call.
fn create_release(api: &dyn ReleaseApi, tag: &str) -> SetupResult<(Release, bool)> {
    match api.create_release(tag)? {
        CreateRelease::Created(release) => {
            tracing::info!("Created release {}", tag);
            Ok((release, true))
        }
        CreateRelease::AlreadyExists => {
            tracing::info!("Release {} was created concurrently", tag);
            api.list_releases()?
                .into_iter()
                .find(|r| r.tag_name == tag)
                .map(|release| (release, false))
                .ok_or_else(|| SetupError::Publish {
                    reason: format!("release {} already exists but is not listed", tag),
                })
        }
    }
}

fn upload_confirmed(api: &dyn ReleaseApi, release: &Release, name: &str, artifact: &Path) -> SetupResult<Asset> {
    let size = std::fs::metadata(artifact)
        .map_err(|e| SetupError::io(artifact, e))?
        .len();

    let asset = api.upload_asset(release, name, artifact)?;
    if asset.name != name || asset.size != size {
        return Err(SetupError::Publish {
            reason: format!(
                "upload of {} ({} bytes) not confirmed: server recorded {} ({} bytes)",
                name, size, asset.name, asset.size
            ),
        });
    }

    Ok(asset)
}
