//! setup-otp CLI - Install Erlang/OTP in CI

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use miette::Diagnostic;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use setup_otp::util::shell::escape_data;
use setup_otp::util::Shell;
use setup_otp::SetupError;

/// Options shared by every command.
pub struct GlobalOptions {
    pub shell: Arc<Shell>,
}

/// True when running as a GitHub Actions step.
fn in_actions() -> bool {
    std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true")
}

fn main() {
    if let Err(e) = run() {
        report(&e);
        std::process::exit(1);
    }
}

/// Print a failure once, as a workflow command under Actions.
fn report(e: &anyhow::Error) {
    let setup_error = e
        .chain()
        .find_map(|cause| cause.downcast_ref::<SetupError>());
    if let Some(err) = setup_error {
        tracing::debug!("failed stage: {}", err.kind());
    }

    if in_actions() {
        println!("::error::{}", escape_data(&format!("{:#}", e)));
        return;
    }

    eprintln!("error: {:#}", e);
    if let Some(help) = setup_error.and_then(|err| err.help()) {
        eprintln!("help: {}", help);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("setup_otp=debug")
    } else if cli.quiet {
        EnvFilter::new("setup_otp=warn")
    } else {
        EnvFilter::new("setup_otp=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let global_opts = GlobalOptions {
        shell: Arc::new(Shell::from_flags(cli.quiet, cli.verbose, cli.color, in_actions())),
    };

    // Execute command
    match cli.command {
        Commands::Install(args) => commands::install::execute(args, &global_opts),
        Commands::Release(args) => commands::release::execute(args, &global_opts),
        Commands::Versions(args) => commands::versions::execute(args, &global_opts),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
