//! Centralized console output.
//!
//! Two output modes are supported:
//! - Human: right-aligned status lines on stderr, optionally colored
//! - Actions: GitHub Actions workflow commands (`::group::`, `::error::`) on
//!   stdout, so long toolchain steps fold into collapsible log groups
//!
//! Step groups are RAII guards: the group is closed (and its duration
//! reported) when the guard drops, including on early `?` returns.

use std::fmt::Display;
use std::io::{self, IsTerminal};
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

/// Shell output mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellMode {
    /// Human-readable output with optional colors and progress bars.
    Human {
        verbosity: Verbosity,
        color: ColorChoice,
    },
    /// GitHub Actions workflow commands.
    Actions,
}

impl Default for ShellMode {
    fn default() -> Self {
        ShellMode::Human {
            verbosity: Verbosity::Normal,
            color: ColorChoice::Auto,
        }
    }
}

/// Output verbosity level (Human mode only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// --quiet: errors only, no progress
    Quiet,
    /// Default: status messages + progress bars
    #[default]
    Normal,
    /// --verbose: status lines, no progress bars
    Verbose,
}

/// Color output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Detect TTY and use colors if available.
    #[default]
    Auto,
    /// Always use ANSI colors.
    Always,
    /// Never use ANSI colors.
    Never,
}

impl std::str::FromStr for ColorChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ColorChoice::Auto),
            "always" => Ok(ColorChoice::Always),
            "never" => Ok(ColorChoice::Never),
            _ => Err(format!(
                "invalid color choice '{}'; expected 'auto', 'always', or 'never'",
                s
            )),
        }
    }
}

/// Status types for output messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    // Success statuses (green)
    Cached,
    Finished,
    Installed,
    Published,

    // In-progress statuses (cyan)
    Resolving,
    Fetching,
    Extracting,
    Compiling,
    Packaging,
    Installing,
    Uploading,

    // Info statuses (blue/default)
    Info,

    // Warning statuses (yellow)
    Skipped,
}

impl Status {
    /// Get the display text for this status.
    fn as_str(&self) -> &'static str {
        match self {
            Status::Cached => "Cached",
            Status::Finished => "Finished",
            Status::Installed => "Installed",
            Status::Published => "Published",
            Status::Resolving => "Resolving",
            Status::Fetching => "Fetching",
            Status::Extracting => "Extracting",
            Status::Compiling => "Compiling",
            Status::Packaging => "Packaging",
            Status::Installing => "Installing",
            Status::Uploading => "Uploading",
            Status::Info => "Info",
            Status::Skipped => "Skipped",
        }
    }

    /// Get the ANSI color code for this status.
    fn color_code(&self) -> &'static str {
        match self {
            Status::Cached | Status::Finished | Status::Installed | Status::Published => {
                "\x1b[1;32m"
            }
            Status::Resolving
            | Status::Fetching
            | Status::Extracting
            | Status::Compiling
            | Status::Packaging
            | Status::Installing
            | Status::Uploading => "\x1b[1;36m",
            Status::Info => "\x1b[1;34m",
            Status::Skipped => "\x1b[1;33m",
        }
    }
}

const STATUS_WIDTH: usize = 12;

/// Central shell for all CLI output.
#[derive(Debug)]
pub struct Shell {
    mode: ShellMode,
    use_color: bool,
}

impl Shell {
    /// Create a new shell with the given mode.
    pub fn new(mode: ShellMode) -> Self {
        let use_color = match &mode {
            ShellMode::Actions => false,
            ShellMode::Human { color, .. } => match color {
                ColorChoice::Auto => io::stderr().is_terminal(),
                ColorChoice::Always => true,
                ColorChoice::Never => false,
            },
        };

        Shell { mode, use_color }
    }

    /// Create a shell from CLI flags.
    ///
    /// Actions mode takes precedence over quiet/verbose.
    pub fn from_flags(quiet: bool, verbose: bool, color: ColorChoice, actions: bool) -> Self {
        if actions {
            return Shell::new(ShellMode::Actions);
        }

        let verbosity = if quiet {
            Verbosity::Quiet
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };

        Shell::new(ShellMode::Human { verbosity, color })
    }

    /// A shell that prints nothing.
    pub fn quiet() -> Self {
        Shell::new(ShellMode::Human {
            verbosity: Verbosity::Quiet,
            color: ColorChoice::Never,
        })
    }

    /// Check if shell is in quiet mode.
    pub fn is_quiet(&self) -> bool {
        matches!(
            self.mode,
            ShellMode::Human {
                verbosity: Verbosity::Quiet,
                ..
            }
        )
    }

    /// Check if shell is in verbose mode.
    pub fn is_verbose(&self) -> bool {
        matches!(
            self.mode,
            ShellMode::Human {
                verbosity: Verbosity::Verbose,
                ..
            }
        )
    }

    /// Check if shell emits workflow commands.
    pub fn is_actions(&self) -> bool {
        matches!(self.mode, ShellMode::Actions)
    }

    /// Print a status message.
    ///
    /// Format: `{status:>12} {message}`. Nothing prints in quiet mode.
    pub fn status(&self, status: Status, msg: impl Display) {
        if self.is_quiet() {
            return;
        }

        if self.is_actions() {
            println!("{} {}", status.as_str(), msg);
        } else {
            eprintln!("{} {}", self.format_status(status), msg);
        }
    }

    /// Print an info message.
    pub fn note(&self, msg: impl Display) {
        self.status(Status::Info, msg);
    }


    /// Format a status prefix with optional color.
    fn format_status(&self, status: Status) -> String {
        let text = status.as_str();

        if self.use_color {
            let color = status.color_code();
            format!("{}{:>width$}\x1b[0m", color, text, width = STATUS_WIDTH)
        } else {
            format!("{:>width$}", text, width = STATUS_WIDTH)
        }
    }

    /// Open a named log group for a long-running step.
    pub fn group(&self, status: Status, name: impl Display) -> Group<'_> {
        let name = name.to_string();

        if self.is_actions() {
            println!("::group::{}", escape_data(&name));
        } else {
            self.status(status, &name);
        }

        Group {
            shell: self,
            name,
            start: Instant::now(),
        }
    }

    /// Create a byte-based progress bar for downloads.
    ///
    /// Hidden in quiet, verbose and Actions modes, and when stderr is not a
    /// terminal.
    pub fn bytes_progress(&self, msg: impl Display, total_bytes: Option<u64>) -> ProgressBar {
        if self.is_quiet() || self.is_verbose() || self.is_actions() {
            return ProgressBar::hidden();
        }

        let pb = match total_bytes {
            Some(total) => {
                let pb = ProgressBar::new(total);
                if let Ok(style) = ProgressStyle::default_bar()
                    .template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes}")
                {
                    pb.set_style(style.progress_chars("#>-"));
                }
                pb
            }
            None => {
                let pb = ProgressBar::new_spinner();
                if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} {bytes}") {
                    pb.set_style(style);
                }
                pb
            }
        };
        pb.set_message(msg.to_string());
        pb
    }
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new(ShellMode::default())
    }
}

/// A log group that closes when dropped.
pub struct Group<'a> {
    shell: &'a Shell,
    name: String,
    start: Instant,
}

impl Drop for Group<'_> {
    fn drop(&mut self) {
        if self.shell.is_actions() {
            println!("::endgroup::");
        } else if self.shell.is_verbose() {
            self.shell.status(
                Status::Finished,
                format!("{} in {}", self.name, format_duration(self.start.elapsed())),
            );
        }
    }
}

/// Escape a message for use as workflow command data.
pub fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Format a duration in a human-readable way.
fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 60.0 {
        format!("{:.2}s", secs)
    } else {
        let mins = secs / 60.0;
        format!("{:.1}m", mins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_modes() {
        let shell = Shell::new(ShellMode::Human {
            verbosity: Verbosity::Normal,
            color: ColorChoice::Never,
        });
        assert!(!shell.is_quiet());
        assert!(!shell.is_verbose());
        assert!(!shell.is_actions());

        assert!(Shell::quiet().is_quiet());
        assert!(Shell::new(ShellMode::Actions).is_actions());
    }

    #[test]
    fn test_color_choice_parse() {
        assert_eq!("auto".parse::<ColorChoice>().unwrap(), ColorChoice::Auto);
        assert_eq!("always".parse::<ColorChoice>().unwrap(), ColorChoice::Always);
        assert_eq!("never".parse::<ColorChoice>().unwrap(), ColorChoice::Never);
        assert!("invalid".parse::<ColorChoice>().is_err());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(500)), "0.50s");
        assert_eq!(format_duration(Duration::from_secs(2)), "2.00s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1.5m");
    }

    #[test]
    fn test_status_formatting() {
        let shell = Shell::new(ShellMode::Human {
            verbosity: Verbosity::Normal,
            color: ColorChoice::Never,
        });

        let formatted = shell.format_status(Status::Compiling);
        assert_eq!(formatted.trim(), "Compiling");
        assert_eq!(formatted.len(), 12);
    }

    #[test]
    fn test_escape_data() {
        assert_eq!(escape_data("100% done\nnext"), "100%25 done%0Anext");
    }

    #[test]
    fn test_from_flags() {
        assert!(Shell::from_flags(true, false, ColorChoice::Auto, false).is_quiet());
        assert!(Shell::from_flags(false, true, ColorChoice::Auto, false).is_verbose());

        let shell = Shell::from_flags(true, true, ColorChoice::Auto, true);
        assert!(shell.is_actions());
        assert!(!shell.is_quiet());
    }
}
