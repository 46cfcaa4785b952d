use filetime::FileTime;
use std::path::Path;
use tokio::fs;
use walkdir::WalkDir;

use super::{display_name, ensure_archive, working_dir};
use crate::cleaner::prune_class_files;
use crate::decompiler::Decompiler;
use crate::error::{Error, Result};
use crate::report::PipelineReport;
use crate::zip;

pub const BUILD_FILE_NAME: &str = "build.gradle";

/// Written verbatim; nothing in it depends on the archive.
pub const BUILD_GRADLE: &str = "plugins {
    id 'java'
}
group = 'com.decompiled'
version = '1.0-SNAPSHOT'
repositories {
    mavenCentral()
}
";

/// Lay `archive` out as a Gradle project under `root`.
///
/// Sources go to `src/main/java` straight from CFR. Everything else in the
/// archive, minus compiled classes, is copied to `src/main/resources` with its
/// timestamps kept.
pub async fn project(
    decompiler: &Decompiler,
    archive: &Path,
    root: &Path,
) -> Result<PipelineReport> {
    ensure_archive(archive)?;
    let main = root.join("src").join("main");
    let java_dir = main.join("java");
    let resources_dir = main.join("resources");
    for dir in [&java_dir, &resources_dir] {
        fs::create_dir_all(dir).await.map_err(Error::io(dir))?;
    }
    log::info!(
        "mode 3: creating Gradle project for {} in {}...",
        display_name(archive),
        root.display()
    );

    decompiler.decompile(archive, &java_dir).await?;

    let mut report = PipelineReport::new(root.to_path_buf());
    let work = working_dir()?;
    report.absorb_unpack(zip::unpack(archive, work.path()).await);
    report.absorb_prune(prune_class_files(work.path()).await);
    let copied = copy_tree(work.path(), &resources_dir).await?;
    log::debug!("copied {copied} resources into {}", resources_dir.display());

    let build_file = root.join(BUILD_FILE_NAME);
    fs::write(&build_file, BUILD_GRADLE)
        .await
        .map_err(Error::io(&build_file))?;

    log::info!("done! project ready at '{}'", root.display());
    Ok(report)
}

/// Copy every file under `from` to the same relative path under `to`,
/// keeping access and modification times.
async fn copy_tree(from: &Path, to: &Path) -> Result<usize> {
    let mut copied = 0;
    for item in WalkDir::new(from).follow_links(false) {
        let item = item.map_err(|e| {
            let path = e.path().unwrap_or(from).to_path_buf();
            Error::Io {
                path,
                source: e.into(),
            }
        })?;
        if !item.file_type().is_file() {
            continue;
        }

        let Ok(relative) = item.path().strip_prefix(from) else {
            continue;
        };
        let target = to.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await.map_err(Error::io(parent))?;
        }
        fs::copy(item.path(), &target)
            .await
            .map_err(Error::io(&target))?;

        let meta = item.metadata().map_err(|e| Error::Io {
            path: item.path().to_path_buf(),
            source: e.into(),
        })?;
        filetime::set_file_times(
            &target,
            FileTime::from_last_access_time(&meta),
            FileTime::from_last_modification_time(&meta),
        )
        .map_err(Error::io(&target))?;

        copied += 1;
    }
    Ok(copied)
}
