//! Error taxonomy for the setup pipeline.
//!
//! Every stage reports failures through [`SetupError`]. The variants mirror the
//! stage that failed so callers (and the CLI) can classify a failure without
//! parsing messages.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Result alias used by every pipeline stage.
pub type SetupResult<T> = std::result::Result<T, SetupError>;

/// Error raised by a pipeline stage.
#[derive(Debug, Error, Diagnostic)]
pub enum SetupError {
    #[error("failed to fetch {url}: {reason}")]
    #[diagnostic(
        code(setup_otp::fetch),
        help("Check your network connection and that the URL is reachable")
    )]
    Fetch { url: String, reason: String },

    #[error("Specified version \"{specifier}\" is not matched in {}.", quote_list(.candidates))]
    #[diagnostic(
        code(setup_otp::version_not_found),
        help("Use an exact release version such as \"23.1\"; run `setup-otp versions` to list them")
    )]
    VersionNotFound {
        specifier: String,
        candidates: Vec<String>,
    },

    #[error("failed to extract {}: {reason}", .archive.display())]
    #[diagnostic(code(setup_otp::extract))]
    Extract { archive: PathBuf, reason: String },

    #[error("expected {expected} in {}, found {}", .dir.display(), describe_found(.found))]
    #[diagnostic(
        code(setup_otp::structure),
        help("The upstream archive or build layout changed; this is not recoverable by retrying")
    )]
    Structure {
        dir: PathBuf,
        expected: String,
        found: Vec<String>,
    },

    #[error("`{command}` failed during {step} ({})\n{output}", describe_status(.status))]
    #[diagnostic(
        code(setup_otp::build),
        help("Run with --verbose to see the full toolchain output")
    )]
    Build {
        step: String,
        command: String,
        status: Option<i32>,
        output: String,
    },

    #[error("`{command}` failed ({})\n{output}", describe_status(.status))]
    #[diagnostic(code(setup_otp::install))]
    Install {
        command: String,
        status: Option<i32>,
        output: String,
    },

    #[error("failed to archive {}: {reason}", .path.display())]
    #[diagnostic(code(setup_otp::archive))]
    Archive { path: PathBuf, reason: String },

    #[error("tool cache error: {reason}")]
    #[diagnostic(code(setup_otp::cache))]
    Cache { reason: String },

    #[error("release publishing failed: {reason}")]
    #[diagnostic(code(setup_otp::publish))]
    Publish { reason: String },

    #[error("I/O error at {}: {source}", .path.display())]
    #[diagnostic(code(setup_otp::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SetupError {
    /// Build an [`SetupError::Io`] for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SetupError::Io {
            path: path.into(),
            source,
        }
    }

    /// Short machine-friendly name of the failing stage.
    pub fn kind(&self) -> &'static str {
        match self {
            SetupError::Fetch { .. } => "fetch",
            SetupError::VersionNotFound { .. } => "version-not-found",
            SetupError::Extract { .. } => "extract",
            SetupError::Structure { .. } => "structure",
            SetupError::Build { .. } => "build",
            SetupError::Install { .. } => "install",
            SetupError::Archive { .. } => "archive",
            SetupError::Cache { .. } => "cache",
            SetupError::Publish { .. } => "publish",
            SetupError::Io { .. } => "io",
        }
    }
}

fn quote_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("\"{}\"", item))
        .collect::<Vec<_>>()
        .join(",")
}

fn describe_found(found: &[String]) -> String {
    if found.is_empty() {
        "nothing".to_string()
    } else {
        found.join(", ")
    }
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_not_found_message_lists_candidates() {
        let err = SetupError::VersionNotFound {
            specifier: "99.0".to_string(),
            candidates: vec!["22.3".to_string(), "23.0".to_string()],
        };

        assert_eq!(
            err.to_string(),
            "Specified version \"99.0\" is not matched in \"22.3\",\"23.0\"."
        );
        assert_eq!(err.kind(), "version-not-found");
    }

    #[test]
    fn test_structure_message_names_offenders() {
        let err = SetupError::Structure {
            dir: PathBuf::from("/tmp/release"),
            expected: "exactly one directory".to_string(),
            found: vec!["a".to_string(), "b".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("exactly one directory"));
        assert!(msg.contains("a, b"));

        let empty = SetupError::Structure {
            dir: PathBuf::from("/tmp/release"),
            expected: "exactly one directory".to_string(),
            found: vec![],
        };
        assert!(empty.to_string().ends_with("found nothing"));
    }

    #[test]
    fn test_build_message_includes_output() {
        let err = SetupError::Build {
            step: "configure".to_string(),
            command: "./configure --with-ssl".to_string(),
            status: Some(2),
            output: "checking for gcc... no".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("exit code 2"));
        assert!(msg.contains("checking for gcc... no"));
    }
}
