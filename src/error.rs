use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

/// Conditions that abort a pipeline.
///
/// Problems a pipeline can work around are not errors; see
/// [`Warning`](crate::report::Warning).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("decompiler not found at '{}'", path.display())]
    ToolNotFound { path: PathBuf },

    #[error("java runtime '{program}' not found: {source}")]
    RuntimeNotFound {
        program: String,
        source: which::Error,
    },

    #[error("target archive not found: '{}'", path.display())]
    TargetNotFound { path: PathBuf },

    #[error("failed to start '{}': {source}", program.display())]
    Spawn { program: PathBuf, source: io::Error },

    #[error("decompiling '{}' failed ({status}): {stderr}", archive.display())]
    Decompile {
        archive: PathBuf,
        status: ExitStatus,
        stderr: String,
    },

    #[error("'{}': {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("could not repackage '{}': {reason}", path.display())]
    Repackage { path: PathBuf, reason: String },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Error::Io { path, source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
