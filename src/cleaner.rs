//! Removal of compiled classes from a decompiled tree.

use std::io;
use std::path::Path;
use tokio::fs;
use walkdir::WalkDir;

use crate::report::{PruneReport, Warning};

/// Whether `path` names compiled bytecode.
pub fn is_class_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("class"))
}

/// Delete every `.class` file below `dir`.
///
/// When a removal is refused, the file and its directory are made writable
/// and the removal is tried once more. Anything that still fails is logged
/// and recorded; the walk always runs to the end.
pub async fn prune_class_files(dir: &Path) -> PruneReport {
    let mut report = PruneReport::default();

    let mut targets = Vec::new();
    for item in WalkDir::new(dir).follow_links(false) {
        match item {
            Ok(item) if item.file_type().is_file() && is_class_file(item.path()) => {
                targets.push(item.into_path());
            }
            Ok(_) => {}
            Err(e) => {
                let path = e.path().unwrap_or(dir).to_path_buf();
                log::warn!("could not scan {}: {e}", path.display());
                report.warnings.push(Warning::ArtifactRemoval {
                    path,
                    message: e.to_string(),
                });
            }
        }
    }

    for path in targets {
        match remove_class_file(&path).await {
            Ok(()) => report.removed += 1,
            Err(e) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                log::warn!("could not remove file: {name}. error: {e}");
                report.warnings.push(Warning::ArtifactRemoval {
                    path,
                    message: e.to_string(),
                });
            }
        }
    }

    log::debug!("pruned {} class files from {}", report.removed, dir.display());
    report
}

async fn remove_class_file(path: &Path) -> io::Result<()> {
    match fs::remove_file(path).await {
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            make_writable(path).await?;
            if let Some(parent) = path.parent() {
                make_writable(parent).await?;
            }
            fs::remove_file(path).await
        }
        other => other,
    }
}

#[cfg(unix)]
async fn make_writable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path).await?.permissions();
    perms.set_mode(perms.mode() | 0o200);
    fs::set_permissions(path, perms).await
}

#[cfg(not(unix))]
async fn make_writable(path: &Path) -> io::Result<()> {
    let mut perms = fs::metadata(path).await?.permissions();
    #[allow(clippy::permissions_set_readonly_false)]
    perms.set_readonly(false);
    fs::set_permissions(path, perms).await
}
