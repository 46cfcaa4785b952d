//! The three delivery shapes.
//!
//! Each pipeline combines the same steps in its own order:
//! [`unpack`](crate::zip::unpack), [`Decompiler::decompile`] and
//! [`prune_class_files`](crate::cleaner::prune_class_files), followed by a
//! final assembly step. Unpacking and pruning only ever add warnings to the
//! returned [`PipelineReport`]; a failing decompiler or an unwritable output
//! aborts with an [`Error`]. Output already on disk at that point is left as is.

mod export;
mod inplace;
mod project;

pub use export::export;
pub use inplace::inplace;
pub use project::{BUILD_FILE_NAME, BUILD_GRADLE, project};

use std::path::{Path, PathBuf};

use crate::decompiler::Decompiler;
use crate::error::{Error, Result};
use crate::report::PipelineReport;

/// Which pipeline to run, with its destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Replace the archive's classes with sources, in place
    Inplace,
    /// Sources and resources into a plain folder
    Export { output: PathBuf },
    /// A Gradle project with sources and resources split apart
    Project { root: PathBuf },
}

impl Mode {
    pub async fn run(&self, decompiler: &Decompiler, archive: &Path) -> Result<PipelineReport> {
        match self {
            Mode::Inplace => inplace(decompiler, archive).await,
            Mode::Export { output } => export(decompiler, archive, output).await,
            Mode::Project { root } => project(decompiler, archive, root).await,
        }
    }
}

/// `<archive-stem><suffix>` in the current directory.
pub fn default_destination(archive: &Path, suffix: &str) -> PathBuf {
    let stem = archive
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archive".to_string());
    PathBuf::from(format!("{stem}{suffix}"))
}

fn ensure_archive(archive: &Path) -> Result<()> {
    if archive.is_file() {
        Ok(())
    } else {
        Err(Error::TargetNotFound {
            path: archive.to_path_buf(),
        })
    }
}

fn working_dir() -> Result<tempfile::TempDir> {
    tempfile::Builder::new()
        .prefix("jardecomp-")
        .tempdir()
        .map_err(Error::io(std::env::temp_dir()))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_destination_uses_stem() {
        assert_eq!(
            default_destination(Path::new("libs/App.jar"), "_extracted"),
            PathBuf::from("App_extracted")
        );
        assert_eq!(
            default_destination(Path::new("App.jar"), "_project"),
            PathBuf::from("App_project")
        );
    }

    #[test]
    fn missing_archive_is_target_not_found() {
        let err = ensure_archive(Path::new("does/not/exist.jar")).unwrap_err();
        assert!(matches!(err, Error::TargetNotFound { .. }));
    }
}
