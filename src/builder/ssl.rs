//! OpenSSL location for `configure`.

use crate::core::{SetupError, SetupResult, TargetTriple};
use crate::util::process::{CommandRunner, ProcessBuilder};

/// Flag used when the system OpenSSL is on the default search path.
pub const DEFAULT_SSL_FLAG: &str = "--with-ssl";

/// Determine the `--with-ssl` flag for `target`.
///
/// macOS runners ship OpenSSL through Homebrew outside the default search
/// path, so its prefix is passed explicitly.
pub fn resolve_ssl_flag(runner: &dyn CommandRunner, target: &TargetTriple) -> SetupResult<String> {
    if !target.is_darwin() {
        return Ok(DEFAULT_SSL_FLAG.to_string());
    }

    let cmd = ProcessBuilder::new("brew").args(["--prefix", "openssl"]);
    let output = runner.run(&cmd).map_err(|e| SetupError::Build {
        step: "configure".to_string(),
        command: cmd.display_command(),
        status: None,
        output: e.to_string(),
    })?;

    if !output.success() {
        return Err(SetupError::Build {
            step: "configure".to_string(),
            command: cmd.display_command(),
            status: output.status,
            output: output.combined_lossy(),
        });
    }

    let prefix = output.stdout_lossy();
    tracing::debug!("openssl prefix: {}", prefix.trim());
    Ok(format!("{}={}", DEFAULT_SSL_FLAG, prefix.trim()))
}
