use flate2::Crc;
use flate2::read::DeflateDecoder;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

use crate::io::ReadAt;
use crate::report::{UnpackReport, Warning};
use anyhow::{Context, Result, bail};

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// ZIP file extractor
pub struct ZipExtractor<R: ReadAt> {
    parser: ZipParser<R>,
}

impl<R: ReadAt> ZipExtractor<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// List all files in the archive
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        self.parser.list_files().await
    }

    /// Decode an entry's data, checking its size and CRC-32
    pub async fn extract_to_memory(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        let archive_size = self.parser.reader().size();
        if entry.compressed_size > archive_size {
            bail!(
                "compressed size {} exceeds archive size {}",
                entry.compressed_size,
                archive_size
            );
        }

        let data_offset = self.parser.get_data_offset(entry).await?;
        let mut raw = vec![0u8; entry.compressed_size as usize];
        self.parser
            .reader()
            .read_exact_at(data_offset, &mut raw)
            .await?;

        let data = match entry.compression_method {
            CompressionMethod::Stored => raw,
            CompressionMethod::Deflate => {
                let capacity = entry.uncompressed_size.min(archive_size.saturating_mul(4));
                let mut out = Vec::with_capacity(capacity as usize);
                // one byte past the declared size is enough to detect a lie
                DeflateDecoder::new(raw.as_slice())
                    .take(entry.uncompressed_size.saturating_add(1))
                    .read_to_end(&mut out)
                    .context("corrupt deflate stream")?;
                out
            }
            CompressionMethod::Unknown(method) => {
                bail!("unsupported compression method {method}")
            }
        };

        if data.len() as u64 != entry.uncompressed_size {
            bail!(
                "size mismatch: expected {} bytes, decoded {}",
                entry.uncompressed_size,
                data.len()
            );
        }
        let mut crc = Crc::new();
        crc.update(&data);
        if crc.sum() != entry.crc32 {
            bail!(
                "CRC mismatch: expected {:08x}, got {:08x}",
                entry.crc32,
                crc.sum()
            );
        }

        Ok(data)
    }

    /// Extract file to disk
    pub async fn extract_to_file(&self, entry: &ZipFileEntry, output_path: &Path) -> Result<()> {
        let data = self.extract_to_memory(entry).await?;

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        fs::write(output_path, &data)
            .await
            .with_context(|| format!("cannot write {}", output_path.display()))?;

        Ok(())
    }

    /// Expand every entry under `dest`.
    ///
    /// Nothing here fails the caller: an unreadable archive or a bad entry is
    /// logged and recorded in the report, and the remaining entries are still
    /// written.
    pub async fn unpack_into(&self, dest: &Path) -> UnpackReport {
        let mut report = UnpackReport::default();

        let entries = match self.list_files().await {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("extraction warning: {e:#}");
                report.warnings.push(Warning::Extraction {
                    entry: None,
                    message: format!("{e:#}"),
                });
                return report;
            }
        };

        for entry in &entries {
            match self.unpack_entry(entry, dest).await {
                Ok(true) => report.extracted += 1,
                Ok(false) => {}
                Err(e) => {
                    log::warn!("extraction warning: {}: {e:#}", entry.file_name);
                    report.warnings.push(Warning::Extraction {
                        entry: Some(entry.file_name.clone()),
                        message: format!("{e:#}"),
                    });
                }
            }
        }

        log::debug!(
            "unpacked {} of {} entries into {}",
            report.extracted,
            entries.len(),
            dest.display()
        );
        report
    }

    /// Returns whether a regular file was written.
    async fn unpack_entry(&self, entry: &ZipFileEntry, dest: &Path) -> Result<bool> {
        let Some(relative) = sanitize_entry_name(&entry.file_name) else {
            bail!("unsafe entry path");
        };
        let target = dest.join(relative);

        if entry.is_directory {
            fs::create_dir_all(&target)
                .await
                .with_context(|| format!("cannot create {}", target.display()))?;
            return Ok(false);
        }

        self.extract_to_file(entry, &target).await?;
        Ok(true)
    }
}

/// Map an entry name to a relative path that stays inside the destination.
///
/// Absolute names, drive prefixes, `..` components and NUL bytes are refused.
/// Backslashes are treated as separators since some Windows tools emit them.
pub fn sanitize_entry_name(name: &str) -> Option<PathBuf> {
    if name.contains('\0') || name.starts_with('/') || name.starts_with('\\') {
        return None;
    }

    let mut path = PathBuf::new();
    for part in name.split(['/', '\\']) {
        match part {
            "" | "." => continue,
            ".." => return None,
            _ => {}
        }
        let mut components = Path::new(part).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(normal)), None) => path.push(normal),
            _ => return None,
        }
    }

    if path.as_os_str().is_empty() {
        None
    } else {
        Some(path)
    }
}
