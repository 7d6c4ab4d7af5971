//! Driver for the OTP autotools build.
//!
//! The toolchain itself is a black box: this module sequences
//! `otp_build autoconf`, `configure`, `make` and `make release` inside the
//! source tree and turns non-zero exits into [`SetupError::Build`].

use std::path::{Path, PathBuf};

use crate::builder::ssl::resolve_ssl_flag;
use crate::core::{SetupError, SetupResult, TargetTriple};
use crate::util::context::GlobalContext;
use crate::util::process::{CommandOutput, CommandRunner, ProcessBuilder};
use crate::util::shell::{Shell, Status};

/// Options controlling a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Platform being built for.
    pub target: TargetTriple,
    /// Parallel make jobs.
    pub jobs: usize,
    /// Extra arguments appended to `configure`.
    pub configure_args: Vec<String>,
}

impl BuildOptions {
    /// Options for the host, taking jobs and extra flags from the config.
    pub fn from_context(ctx: &GlobalContext) -> Self {
        BuildOptions {
            target: TargetTriple::host(),
            jobs: ctx.jobs(),
            configure_args: ctx.config().build.configure_args.clone(),
        }
    }
}

/// Builds an OTP source tree into its release layout.
pub struct OtpBuilder<'a> {
    runner: &'a dyn CommandRunner,
    shell: &'a Shell,
    options: BuildOptions,
}

impl<'a> OtpBuilder<'a> {
    pub fn new(runner: &'a dyn CommandRunner, shell: &'a Shell, options: BuildOptions) -> Self {
        OtpBuilder {
            runner,
            shell,
            options,
        }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Configure and compile, returning `<source>/release`.
    pub fn make(&self, source: &Path) -> SetupResult<PathBuf> {
        let ssl_flag = resolve_ssl_flag(self.runner, &self.options.target)?;
        self.configure(source, &ssl_flag)?;
        self.compile(source)?;
        Ok(source.join("release"))
    }

    /// Regenerate the build scripts and run `configure`.
    pub fn configure(&self, source: &Path, ssl_flag: &str) -> SetupResult<()> {
        tracing::info!("Configuring {}", source.display());

        self.step(
            "otp_build",
            ProcessBuilder::new(source.join("otp_build"))
                .arg("autoconf")
                .cwd(source),
        )?;

        let configure = ProcessBuilder::new(source.join("configure"))
            .arg(ssl_flag)
            .arg("--enable-dirty-schedulers")
            .args(&self.options.configure_args)
            .cwd(source);
        self.step("configure", configure)?;

        Ok(())
    }

    /// Run `make -j<N>` followed by `make release`.
    pub fn compile(&self, source: &Path) -> SetupResult<()> {
        tracing::info!("Compiling with {} jobs", self.options.jobs);

        self.step(
            "make",
            ProcessBuilder::new("make")
                .arg(format!("-j{}", self.options.jobs))
                .cwd(source),
        )?;
        self.step("make release", ProcessBuilder::new("make").arg("release").cwd(source))?;

        Ok(())
    }

    /// Run one toolchain step inside its own log group.
    fn step(&self, name: &str, cmd: ProcessBuilder) -> SetupResult<CommandOutput> {
        let _group = self.shell.group(Status::Compiling, name);

        let output = self.runner.run(&cmd).map_err(|e| SetupError::Build {
            step: name.to_string(),
            command: cmd.display_command(),
            status: None,
            output: e.to_string(),
        })?;

        if self.shell.is_verbose() || self.shell.is_actions() {
            print!("{}", output.combined_lossy());
        }

        if !output.success() {
            return Err(SetupError::Build {
                step: name.to_string(),
                command: cmd.display_command(),
                status: output.status,
                output: output.combined_lossy(),
            });
        }

        Ok(output)
    }
}
