//! Reading and writing Java archives.
//!
//! Jars are plain ZIP files, so this module carries a small ZIP
//! implementation covering what jar tooling produces:
//!
//! - [`parser`]: central directory parsing, including ZIP64 end records
//! - [`extractor`]: entry decoding (STORED and DEFLATE) with CRC checks, and
//!   best-effort expansion of a whole archive into a directory
//! - [`writer`]: building a fresh archive from a directory tree
//!
//! Encryption, multi-disk archives and other compression methods are not
//! supported. Entries using them are reported as extraction warnings.

mod extractor;
mod parser;
mod structures;
mod writer;

pub use extractor::{ZipExtractor, sanitize_entry_name};
pub use parser::ZipParser;
pub use structures::*;
pub use writer::{MANIFEST_NAME, ZipWriter, write_tree};

use std::path::Path;
use std::sync::Arc;

use crate::io::LocalFileReader;
use crate::report::{UnpackReport, Warning};

/// Expand `archive` under `dest`, creating directories as needed.
///
/// Never fails: if the archive cannot even be opened the report carries a
/// single whole-archive warning and nothing is written.
pub async fn unpack(archive: &Path, dest: &Path) -> UnpackReport {
    let reader = match LocalFileReader::new(archive) {
        Ok(reader) => Arc::new(reader),
        Err(e) => {
            log::warn!("extraction warning: {e:#}");
            return UnpackReport {
                extracted: 0,
                warnings: vec![Warning::Extraction {
                    entry: None,
                    message: format!("{e:#}"),
                }],
            };
        }
    };

    log::debug!("unpacking {} into {}", archive.display(), dest.display());
    ZipExtractor::new(reader).unpack_into(dest).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    fn build(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Vec::new());
        for (name, data) in entries {
            writer.add_file(name, data, Local::now()).unwrap();
        }
        writer.finish().unwrap()
    }

    #[tokio::test]
    async fn unpack_writes_nested_entries() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("App.jar");
        std::fs::write(
            &jar,
            build(&[
                ("com/x/A.class", b"\xCA\xFE\xBA\xBE".as_slice()),
                ("res/a.txt", b"resource".as_slice()),
            ]),
        )
        .unwrap();

        let out = dir.path().join("out");
        let report = unpack(&jar, &out).await;

        assert!(report.is_complete(), "{:?}", report.warnings);
        assert_eq!(report.extracted, 2);
        assert_eq!(
            std::fs::read(out.join("com/x/A.class")).unwrap(),
            b"\xCA\xFE\xBA\xBE"
        );
        assert_eq!(std::fs::read(out.join("res/a.txt")).unwrap(), b"resource");
    }

    #[tokio::test]
    async fn unpack_skips_a_launcher_stub() {
        let mut bytes = b"#!/bin/sh\nexec java -jar \"$0\" \"$@\"\n".to_vec();
        bytes.extend_from_slice(&build(&[
            (MANIFEST_NAME, b"Manifest-Version: 1.0\n".as_slice()),
            ("res/a.txt", b"resource".as_slice()),
        ]));
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("app.run");
        std::fs::write(&jar, bytes).unwrap();

        let out = dir.path().join("out");
        let report = unpack(&jar, &out).await;

        assert!(report.is_complete(), "{:?}", report.warnings);
        assert_eq!(report.extracted, 2);
        assert_eq!(std::fs::read(out.join("res/a.txt")).unwrap(), b"resource");
        assert!(out.join("META-INF/MANIFEST.MF").is_file());
    }

    #[tokio::test]
    async fn unpack_of_garbage_is_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("broken.jar");
        std::fs::write(&jar, vec![0x42u8; 300]).unwrap();

        let report = unpack(&jar, &dir.path().join("out")).await;

        assert_eq!(report.extracted, 0);
        assert_eq!(report.warnings.len(), 1);
        assert!(matches!(
            &report.warnings[0],
            Warning::Extraction { entry: None, .. }
        ));
    }

    #[tokio::test]
    async fn unpack_of_missing_file_is_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let report = unpack(&dir.path().join("nope.jar"), dir.path()).await;
        assert_eq!(report.warnings.len(), 1);
    }

    #[tokio::test]
    async fn corrupt_entry_does_not_stop_the_rest() {
        let mut bytes = build(&[
            ("first.txt", b"AAAA".as_slice()),
            ("second.txt", b"BBBB".as_slice()),
        ]);
        // both are stored, so the payload sits right after each local header
        let payload = bytes.windows(4).position(|w| w == b"AAAA").unwrap();
        bytes[payload] = b'Z';

        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("partial.jar");
        std::fs::write(&jar, bytes).unwrap();

        let out = dir.path().join("out");
        let report = unpack(&jar, &out).await;

        assert_eq!(report.extracted, 1);
        assert_eq!(
            report.warnings,
            vec![Warning::Extraction {
                entry: Some("first.txt".into()),
                message: format!(
                    "CRC mismatch: expected {:08x}, got {:08x}",
                    crc_of(b"AAAA"),
                    crc_of(b"ZAAA")
                ),
            }]
        );
        assert!(!out.join("first.txt").exists());
        assert_eq!(std::fs::read(out.join("second.txt")).unwrap(), b"BBBB");
    }

    #[tokio::test]
    async fn unsafe_names_are_skipped() {
        let bytes = build(&[
            ("../escape.txt", b"bad".as_slice()),
            ("ok.txt", b"good".as_slice()),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("slip.jar");
        std::fs::write(&jar, bytes).unwrap();

        let out = dir.path().join("nested").join("out");
        let report = unpack(&jar, &out).await;

        assert_eq!(report.extracted, 1);
        assert_eq!(report.warnings.len(), 1);
        assert!(!dir.path().join("nested").join("escape.txt").exists());
        assert!(out.join("ok.txt").exists());
    }

    fn crc_of(data: &[u8]) -> u32 {
        let mut crc = flate2::Crc::new();
        crc.update(data);
        crc.sum()
    }
}
