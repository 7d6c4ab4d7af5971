//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell as CompletionShell;

use setup_otp::sources::RepoRef;
use setup_otp::util::shell::ColorChoice;

/// setup-otp - Install Erlang/OTP in CI, building from source when needed
#[derive(Parser)]
#[command(name = "setup-otp")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install an OTP version, building it unless it is cached
    Install(InstallArgs),

    /// Build an OTP version and publish it as a release asset
    Release(ReleaseArgs),

    /// List the versions in the upstream catalog
    Versions(VersionsArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct InstallArgs {
    /// Exact OTP version, e.g. 23.1
    #[arg(long = "otp-version", env = "INPUT_OTP-VERSION")]
    pub otp_version: String,
}

#[derive(Args)]
pub struct ReleaseArgs {
    /// Exact OTP version, e.g. 23.1
    #[arg(long = "otp-version", env = "INPUT_OTP-VERSION")]
    pub otp_version: String,

    /// API token (falls back to GITHUB_TOKEN)
    #[arg(long, env = "INPUT_GITHUB-TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Repository receiving the release, as owner/repo
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repository: RepoRef,

    /// Platform triple for the asset name (defaults to the host)
    #[arg(long)]
    pub target: Option<String>,
}

#[derive(Args)]
pub struct VersionsArgs {
    /// Read the catalog from a file instead of downloading it
    #[arg(long)]
    pub catalog_file: Option<PathBuf>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: CompletionShell,
}
