//! Outcome types for the best-effort steps.
//!
//! Extraction and class pruning never abort a pipeline. Whatever went wrong
//! along the way is collected here as [`Warning`]s so callers can decide how
//! loud to be about it.

use std::fmt;
use std::path::PathBuf;

/// A recoverable problem met while unpacking or cleaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Part or all of the archive could not be extracted. `entry` is `None`
    /// when the archive as a whole was unreadable.
    Extraction {
        entry: Option<String>,
        message: String,
    },
    /// A compiled class survived cleanup even after clearing its read-only bit.
    ArtifactRemoval { path: PathBuf, message: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::Extraction {
                entry: Some(entry),
                message,
            } => write!(f, "extraction warning: {entry}: {message}"),
            Warning::Extraction {
                entry: None,
                message,
            } => write!(f, "extraction warning: {message}"),
            Warning::ArtifactRemoval { path, message } => {
                write!(f, "could not remove {}: {message}", path.display())
            }
        }
    }
}

/// Result of expanding an archive into a directory.
#[derive(Debug, Default)]
pub struct UnpackReport {
    /// Regular files written
    pub extracted: usize,
    pub warnings: Vec<Warning>,
}

impl UnpackReport {
    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Result of pruning compiled classes from a tree.
#[derive(Debug, Default)]
pub struct PruneReport {
    pub removed: usize,
    pub warnings: Vec<Warning>,
}

/// What a finished pipeline produced.
#[derive(Debug)]
pub struct PipelineReport {
    /// The rewritten archive, export folder or project root
    pub output: PathBuf,
    pub extracted: usize,
    pub pruned: usize,
    pub warnings: Vec<Warning>,
}

impl PipelineReport {
    pub(crate) fn new(output: PathBuf) -> Self {
        Self {
            output,
            extracted: 0,
            pruned: 0,
            warnings: Vec::new(),
        }
    }

    pub(crate) fn absorb_unpack(&mut self, report: UnpackReport) {
        self.extracted += report.extracted;
        self.warnings.extend(report.warnings);
    }

    pub(crate) fn absorb_prune(&mut self, report: PruneReport) {
        self.pruned += report.removed;
        self.warnings.extend(report.warnings);
    }
}
