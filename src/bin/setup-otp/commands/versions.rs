//! `setup-otp versions` command

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cli::VersionsArgs;
use crate::GlobalOptions;
use setup_otp::sources::{build_client, load_catalog, read_catalog, ReqwestClient};
use setup_otp::util::GlobalContext;

pub fn execute(args: VersionsArgs, global_opts: &GlobalOptions) -> Result<()> {
    let catalog = match args.catalog_file {
        Some(ref path) => {
            read_catalog(path).with_context(|| format!("failed to read {}", path.display()))?
        }
        None => {
            let ctx = GlobalContext::new()?;
            let client = build_client(ctx.config()).context("failed to create HTTP client")?;
            let http = ReqwestClient::new(client, Arc::clone(&global_opts.shell));
            load_catalog(&http, ctx.config().catalog_url())?
        }
    };

    for version in catalog.versions() {
        println!("{}", version);
    }

    Ok(())
}
