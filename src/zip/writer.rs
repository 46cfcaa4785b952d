use chrono::{DateTime, Local};
use flate2::Compression;
use flate2::Crc;
use flate2::write::DeflateEncoder;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use anyhow::{Context, Result, bail};

use super::structures::{CompressionMethod, EndOfCentralDirectory, ZipFileEntry, dos_datetime};

/// Jar readers that stream the archive expect the manifest up front
pub const MANIFEST_NAME: &str = "META-INF/MANIFEST.MF";

// all-ones counts and offsets in the end record mean "look in ZIP64"
const MAX_ENTRIES: usize = 0xFFFE;
const MAX_SIZE: u64 = 0xFFFF_FFFE;

/// Streaming writer for classic (non-ZIP64) archives.
///
/// Local headers and data are written as entries are added; the central
/// directory is emitted by [`ZipWriter::finish`].
pub struct ZipWriter<W: Write> {
    inner: W,
    offset: u64,
    entries: Vec<ZipFileEntry>,
}

impl<W: Write> ZipWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            offset: 0,
            entries: Vec::new(),
        }
    }

    /// Append one file entry.
    ///
    /// The data is deflated unless that fails to make it smaller, in which
    /// case it is stored as is.
    pub fn add_file(&mut self, name: &str, data: &[u8], modified: DateTime<Local>) -> Result<()> {
        if self.entries.len() >= MAX_ENTRIES {
            bail!("more than {MAX_ENTRIES} entries would need ZIP64");
        }
        if data.len() as u64 > MAX_SIZE {
            bail!("{name} is larger than 4 GiB and would need ZIP64");
        }
        if name.len() > u16::MAX as usize {
            bail!("entry name is too long: {name}");
        }

        let mut crc = Crc::new();
        crc.update(data);

        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data)?;
        let deflated = encoder.finish()?;
        let (method, payload) = if deflated.len() < data.len() {
            (CompressionMethod::Deflate, deflated.as_slice())
        } else {
            (CompressionMethod::Stored, data)
        };

        let (last_mod_time, last_mod_date) = dos_datetime(modified);
        let entry = ZipFileEntry {
            file_name: name.to_string(),
            compression_method: method,
            compressed_size: payload.len() as u64,
            uncompressed_size: data.len() as u64,
            crc32: crc.sum(),
            lfh_offset: self.offset,
            last_mod_time,
            last_mod_date,
            is_directory: false,
        };

        let mut header = Vec::with_capacity(super::structures::LFH_SIZE + name.len());
        entry.write_local_header(&mut header)?;
        self.inner.write_all(&header)?;
        self.inner.write_all(payload)?;
        self.offset += (header.len() + payload.len()) as u64;
        if self.offset > MAX_SIZE {
            bail!("archive grew past 4 GiB and would need ZIP64");
        }

        self.entries.push(entry);
        Ok(())
    }

    /// Write the central directory and end record, returning the sink.
    pub fn finish(mut self) -> Result<W> {
        let mut directory = Vec::new();
        for entry in &self.entries {
            entry.write_central_header(&mut directory)?;
        }
        if self.offset + directory.len() as u64 > MAX_SIZE {
            bail!("central directory would end past 4 GiB");
        }

        EndOfCentralDirectory::new(
            self.entries.len() as u16,
            directory.len() as u32,
            self.offset as u32,
        )
        .write_to(&mut directory)?;

        self.inner.write_all(&directory)?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Archive every regular file under `root`, named relative to it.
///
/// Entries are ordered by name, with the jar manifest first when present.
/// Returns the number of entries written.
pub fn write_tree<W: Write>(root: &Path, out: W) -> Result<usize> {
    let mut files: Vec<(String, PathBuf)> = Vec::new();
    for item in WalkDir::new(root).follow_links(false) {
        let item = item.with_context(|| format!("cannot walk {}", root.display()))?;
        if !item.file_type().is_file() {
            continue;
        }
        let relative = item.path().strip_prefix(root)?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.push((name, item.into_path()));
    }
    files.sort_by(|(a, _), (b, _)| (a != MANIFEST_NAME, a).cmp(&(b != MANIFEST_NAME, b)));

    let mut writer = ZipWriter::new(out);
    for (name, path) in &files {
        let data = std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
        let modified = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .map(DateTime::<Local>::from)
            .unwrap_or_else(|_| Local::now());
        writer.add_file(name, &data, modified)?;
    }

    writer.finish()?;
    Ok(files.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryReader;
    use crate::zip::ZipExtractor;
    use std::sync::Arc;

    #[tokio::test]
    async fn written_archive_reads_back() {
        let mut writer = ZipWriter::new(Vec::new());
        let text = "hello hello hello hello hello hello".repeat(20);
        writer
            .add_file("res/a.txt", text.as_bytes(), Local::now())
            .unwrap();
        writer.add_file("tiny", b"x", Local::now()).unwrap();
        let bytes = writer.finish().unwrap();

        let extractor = ZipExtractor::new(Arc::new(MemoryReader::new(bytes)));
        let entries = extractor.list_files().await.unwrap();
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].file_name, "res/a.txt");
        assert_eq!(entries[0].compression_method, CompressionMethod::Deflate);
        assert!(entries[0].compressed_size < entries[0].uncompressed_size);
        assert_eq!(
            extractor.extract_to_memory(&entries[0]).await.unwrap(),
            text.as_bytes()
        );

        // deflate would only grow a single byte
        assert_eq!(entries[1].compression_method, CompressionMethod::Stored);
        assert_eq!(extractor.extract_to_memory(&entries[1]).await.unwrap(), b"x");
    }

    #[tokio::test]
    async fn tree_puts_manifest_first() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("META-INF")).unwrap();
        std::fs::create_dir_all(dir.path().join("com/x")).unwrap();
        std::fs::write(dir.path().join("META-INF/MANIFEST.MF"), "Manifest-Version: 1.0\n").unwrap();
        std::fs::write(dir.path().join("com/x/A.java"), "class A {}").unwrap();
        std::fs::write(dir.path().join("A-first.txt"), "a").unwrap();
        std::fs::create_dir_all(dir.path().join("empty")).unwrap();

        let mut bytes = Vec::new();
        let count = write_tree(dir.path(), &mut bytes).unwrap();
        assert_eq!(count, 3);

        let extractor = ZipExtractor::new(Arc::new(MemoryReader::new(bytes)));
        let names: Vec<_> = extractor
            .list_files()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.file_name)
            .collect();
        assert_eq!(names, ["META-INF/MANIFEST.MF", "A-first.txt", "com/x/A.java"]);
    }

    #[test]
    fn entry_count_stops_short_of_zip64() {
        let mut writer = ZipWriter::new(std::io::sink());
        let now = Local::now();
        for i in 0..MAX_ENTRIES {
            writer.add_file(&format!("e{i}"), b"", now).unwrap();
        }

        let err = writer.add_file("one-too-many", b"", now).unwrap_err();
        assert_eq!(err.to_string(), "more than 65534 entries would need ZIP64");
        // the entries already added still make a valid archive
        writer.finish().unwrap();
    }

    #[tokio::test]
    async fn largest_classic_archive_is_not_mistaken_for_zip64() {
        let mut writer = ZipWriter::new(Vec::new());
        let now = Local::now();
        for i in 0..MAX_ENTRIES {
            writer.add_file(&format!("e{i}"), b"", now).unwrap();
        }
        let bytes = writer.finish().unwrap();

        let extractor = ZipExtractor::new(Arc::new(MemoryReader::new(bytes)));
        assert_eq!(extractor.list_files().await.unwrap().len(), MAX_ENTRIES);
    }

    #[test]
    fn empty_archive_is_just_an_end_record() {
        let bytes = ZipWriter::new(Vec::new()).finish().unwrap();
        assert_eq!(bytes.len(), EndOfCentralDirectory::SIZE);
    }
}
