//! `setup-otp release` command

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cli::ReleaseArgs;
use crate::GlobalOptions;
use setup_otp::core::TargetTriple;
use setup_otp::ops::{publish_release, PublishOutcome, Services, ToolCache};
use setup_otp::sources::{build_client, GitHubReleases, ReqwestClient};
use setup_otp::util::{GlobalContext, SystemRunner};

pub fn execute(args: ReleaseArgs, global_opts: &GlobalOptions) -> Result<()> {
    let shell = &global_opts.shell;

    let token = args
        .token
        .filter(|token| !token.is_empty())
        .or_else(|| std::env::var("GITHUB_TOKEN").ok().filter(|token| !token.is_empty()))
        .context("no API token: pass --token or set GITHUB_TOKEN")?;

    let target = match args.target {
        Some(ref triple) => TargetTriple::parse(triple)
            .with_context(|| format!("invalid target triple '{}'", triple))?,
        None => TargetTriple::host(),
    };

    let ctx = GlobalContext::new()?;
    let client = build_client(ctx.config()).context("failed to create HTTP client")?;
    let http = ReqwestClient::new(client.clone(), Arc::clone(shell));
    let api = GitHubReleases::new(client, ctx.config().api_url(), args.repository, token)?;
    let cache = ToolCache::new(ctx.cache_dir());
    let services = Services {
        http: &http,
        runner: &SystemRunner,
        cache: &cache,
        shell,
    };

    let outcome = publish_release(&ctx, &services, &api, &args.otp_version, &target)
        .with_context(|| format!("failed to publish OTP {} to {}", args.otp_version, api.repo()))?;

    if let PublishOutcome::Uploaded { ref release, ref asset } = outcome {
        if let Some(ref url) = asset.browser_download_url {
            shell.note(format!("{} available at {}", asset.name, url));
        } else {
            tracing::debug!("uploaded asset {} to release {}", asset.id, release.id);
        }
    }

    Ok(())
}
