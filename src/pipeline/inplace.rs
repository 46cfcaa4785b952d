use std::io::BufWriter;
use std::path::Path;

use super::{display_name, ensure_archive, working_dir};
use crate::cleaner::prune_class_files;
use crate::decompiler::Decompiler;
use crate::error::{Error, Result};
use crate::report::PipelineReport;
use crate::zip;

/// Swap the classes inside `archive` for their decompiled sources.
///
/// The archive is unpacked into a working directory and CFR then writes into
/// that same tree, so a source file sharing a path with an extracted resource
/// replaces it. The archive itself is only replaced once the new one has been
/// written completely; any earlier failure leaves it untouched.
pub async fn inplace(decompiler: &Decompiler, archive: &Path) -> Result<PipelineReport> {
    ensure_archive(archive)?;
    let name = display_name(archive);
    log::info!("mode 1: updating {name}...");

    let work = working_dir()?;
    let mut report = PipelineReport::new(archive.to_path_buf());

    report.absorb_unpack(zip::unpack(archive, work.path()).await);
    decompiler.decompile(archive, work.path()).await?;
    report.absorb_prune(prune_class_files(work.path()).await);

    let entries = repackage(work.path(), archive)?;
    log::info!("done! {name} updated with sources ({entries} entries)");

    Ok(report)
}

/// Write `tree` as a new archive beside `archive`, then rename it over the original.
fn repackage(tree: &Path, archive: &Path) -> Result<usize> {
    let parent = match archive.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let permissions = std::fs::metadata(archive)
        .map_err(Error::io(archive))?
        .permissions();

    let mut staged = tempfile::Builder::new()
        .prefix(".jardecomp-")
        .suffix(".jar")
        .tempfile_in(parent)
        .map_err(Error::io(parent))?;

    let entries = zip::write_tree(tree, BufWriter::new(staged.as_file_mut())).map_err(|e| {
        Error::Repackage {
            path: archive.to_path_buf(),
            reason: format!("{e:#}"),
        }
    })?;

    std::fs::set_permissions(staged.path(), permissions).map_err(Error::io(staged.path()))?;
    staged
        .persist(archive)
        .map_err(|e| Error::io(archive)(e.error))?;

    Ok(entries)
}
