//! Driving CFR as an external process.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::config::Config;
use crate::error::{Error, Result};

/// A decompiler whose jar and Java runtime have been located.
#[derive(Debug, Clone)]
pub struct Decompiler {
    jar: PathBuf,
    java: PathBuf,
    silent: bool,
}

impl Decompiler {
    /// Resolve the tool up front so a bad setup fails before any archive is touched.
    pub fn new(config: &Config) -> Result<Self> {
        if !config.decompiler_jar.is_file() {
            return Err(Error::ToolNotFound {
                path: config.decompiler_jar.clone(),
            });
        }

        let java = which::which(&config.java).map_err(|source| Error::RuntimeNotFound {
            program: config.java.display().to_string(),
            source,
        })?;
        log::debug!(
            "using {} with {}",
            config.decompiler_jar.display(),
            java.display()
        );

        Ok(Self {
            jar: config.decompiler_jar.clone(),
            java,
            silent: config.silent,
        })
    }

    /// The full command line for decompiling `archive` into `out_dir`.
    pub fn command(&self, archive: &Path, out_dir: &Path) -> Command {
        let mut cmd = Command::new(&self.java);
        cmd.arg("-jar")
            .arg(&self.jar)
            .arg(archive)
            .arg("--outputdir")
            .arg(out_dir);
        if self.silent {
            cmd.args(["--silent", "true"]);
        }
        cmd
    }

    /// Run the decompiler and wait for it.
    ///
    /// Stdout is discarded when running silent and passed through otherwise.
    /// Stderr is always captured so it can be reported on failure. The child
    /// is killed if this future is dropped.
    pub async fn decompile(&self, archive: &Path, out_dir: &Path) -> Result<()> {
        let name = archive
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| archive.display().to_string());
        log::info!("running CFR for {name}...");

        let stdout = if self.silent {
            Stdio::null()
        } else {
            Stdio::inherit()
        };
        let output = self
            .command(archive, out_dir)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| Error::Spawn {
                program: self.java.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            log::error!("decompilation error: {stderr}");
            return Err(Error::Decompile {
                archive: archive.to_path_buf(),
                status: output.status,
                stderr,
            });
        }

        Ok(())
    }
}
