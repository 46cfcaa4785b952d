use std::path::Path;
use tokio::fs;

use super::{display_name, ensure_archive};
use crate::cleaner::prune_class_files;
use crate::decompiler::Decompiler;
use crate::error::{Error, Result};
use crate::report::PipelineReport;
use crate::zip;

/// Unpack and decompile `archive` straight into `output_dir`.
///
/// The folder is created if needed and reused if it exists; running the
/// export again refreshes its content.
pub async fn export(
    decompiler: &Decompiler,
    archive: &Path,
    output_dir: &Path,
) -> Result<PipelineReport> {
    ensure_archive(archive)?;
    fs::create_dir_all(output_dir)
        .await
        .map_err(Error::io(output_dir))?;
    log::info!(
        "mode 2: exporting {} to {}...",
        display_name(archive),
        output_dir.display()
    );

    let mut report = PipelineReport::new(output_dir.to_path_buf());
    report.absorb_unpack(zip::unpack(archive, output_dir).await);
    decompiler.decompile(archive, output_dir).await?;
    report.absorb_prune(prune_class_files(output_dir).await);

    log::info!("done! files saved to '{}'", output_dir.display());
    Ok(report)
}
