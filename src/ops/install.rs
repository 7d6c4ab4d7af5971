//! Installing a packaged artifact.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::core::{SetupError, SetupResult};
use crate::sources::tarball::unpack_archive;
use crate::util::fs::ensure_dir;
use crate::util::process::{CommandRunner, ProcessBuilder};
use crate::util::shell::{Shell, Status};

/// A completed installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installation {
    root: PathBuf,
}

impl Installation {
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding `erl`, `erlc` and friends.
    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }
}

/// Unpacks artifacts and runs OTP's `Install` script.
pub struct Installer<'a> {
    runner: &'a dyn CommandRunner,
    shell: &'a Shell,
    root: PathBuf,
}

impl<'a> Installer<'a> {
    pub fn new(runner: &'a dyn CommandRunner, shell: &'a Shell, root: impl Into<PathBuf>) -> Self {
        Installer {
            runner,
            shell,
            root: root.into(),
        }
    }

    /// Install `artifact` into the root.
    ///
    /// The root is reused if it already exists; files from the artifact
    /// overwrite whatever is there.
    pub fn install(&self, artifact: &Path) -> SetupResult<Installation> {
        ensure_dir(&self.root)?;

        self.shell
            .status(Status::Extracting, format!("{} into {}", artifact.display(), self.root.display()));
        unpack_archive(artifact, &self.root, 1)?;

        let cmd = ProcessBuilder::new(self.root.join("Install"))
            .arg("-minimal")
            .arg(&self.root)
            .cwd(&self.root);

        let output = {
            let _group = self.shell.group(Status::Installing, "Install");
            self.runner.run(&cmd).map_err(|e| SetupError::Install {
                command: cmd.display_command(),
                status: None,
                output: e.to_string(),
            })?
        };

        if !output.success() {
            return Err(SetupError::Install {
                command: cmd.display_command(),
                status: output.status,
                output: output.combined_lossy(),
            });
        }

        tracing::info!("Installed into {}", self.root.display());
        Ok(Installation {
            root: self.root.clone(),
        })
    }
}

/// Append `dir` to the Actions path file so later steps find it.
pub fn add_to_github_path(path_file: &Path, dir: &Path) -> SetupResult<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path_file)
        .map_err(|e| SetupError::io(path_file, e))?;

    writeln!(file, "{}", dir.display()).map_err(|e| SetupError::io(path_file, e))
}
