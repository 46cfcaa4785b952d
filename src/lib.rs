//! # jardecomp
//!
//! Bulk decompilation of Java archives with [CFR](https://www.benf.org/other/cfr/).
//!
//! The crate does no decompiling of its own. It unpacks a jar, runs CFR over
//! it as an external process, strips the compiled classes and reassembles the
//! result in one of three shapes:
//!
//! - **inplace**: the jar is rewritten with sources in place of classes
//! - **export**: sources and resources side by side in a folder
//! - **project**: a Gradle layout with `src/main/java`, `src/main/resources`
//!   and a `build.gradle`
//!
//! Unpacking and cleanup are best effort. Corrupt entries or undeletable
//! classes show up as [`Warning`]s in the returned [`PipelineReport`] rather
//! than as errors. A missing tool, a missing archive or a failing CFR run
//! abort with an [`Error`].
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use jardecomp::{Config, Decompiler, pipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let decompiler = Decompiler::new(&Config::new("tools/cfr-0.152.jar"))?;
//!
//!     let report = pipeline::export(&decompiler, Path::new("App.jar"), Path::new("out")).await?;
//!     for warning in &report.warnings {
//!         eprintln!("{warning}");
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cleaner;
pub mod cli;
pub mod config;
pub mod decompiler;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod report;
pub mod zip;

pub use cli::Cli;
pub use config::Config;
pub use decompiler::Decompiler;
pub use error::{Error, Result};
pub use io::{LocalFileReader, MemoryReader, ReadAt};
pub use pipeline::Mode;
pub use report::{PipelineReport, PruneReport, UnpackReport, Warning};
pub use zip::{ZipExtractor, ZipFileEntry, ZipWriter};
