//! `setup-otp install` command

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cli::InstallArgs;
use crate::GlobalOptions;
use setup_otp::ops::{add_to_github_path, install_otp, Services, ToolCache};
use setup_otp::sources::{build_client, ReqwestClient};
use setup_otp::util::{GlobalContext, SystemRunner};

pub fn execute(args: InstallArgs, global_opts: &GlobalOptions) -> Result<()> {
    let shell = &global_opts.shell;
    let ctx = GlobalContext::new()?;

    let client = build_client(ctx.config()).context("failed to create HTTP client")?;
    let http = ReqwestClient::new(client, Arc::clone(shell));
    let cache = ToolCache::new(ctx.cache_dir());
    let services = Services {
        http: &http,
        runner: &SystemRunner,
        cache: &cache,
        shell,
    };

    let report = install_otp(&ctx, &services, &args.otp_version)
        .with_context(|| format!("failed to install OTP {}", args.otp_version))?;

    let bin_dir = report.installation.bin_dir();
    match std::env::var_os("GITHUB_PATH").filter(|path| !path.is_empty()) {
        Some(path_file) => {
            add_to_github_path(Path::new(&path_file), &bin_dir)
                .context("failed to update GITHUB_PATH")?;
            shell.note(format!("added {} to PATH", bin_dir.display()));
        }
        None => {
            shell.note(format!(
                "add OTP to your PATH with: export PATH=\"{}:$PATH\"",
                bin_dir.display()
            ));
        }
    }

    if report.cache_hit {
        tracing::debug!("OTP {} installed from cache", report.version);
    }

    Ok(())
}
