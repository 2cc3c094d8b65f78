// ============================================================
// Layer 6 — Corpus Downloader
// ============================================================
// Fetches the sentiment treebank archive over HTTP and unpacks
// it next to the configured corpus directory. The archive's top
// level folder is renamed to the configured directory name.
//
// A failed download or extraction is returned to the caller;
// there are no retries.
//
// Why blocking reqwest?
//   Seeding runs once, from a CLI, one dataset after another.
//   Nothing else would run while the archive downloads, so an
//   async runtime would add weight and no concurrency.
//
// Reference: reqwest documentation (blocking client)
//            zip crate documentation

use anyhow::{bail, Context, Result};
use std::io::Cursor;
use std::{fs, path::Path};

use crate::domain::traits::SourceFetcher;

/// Public location of the treebank archive
pub const SST_URL: &str = "http://nlp.stanford.edu/~socherr/stanfordSentimentTreebank.zip";

/// Folder the archive unpacks into
pub const SST_ARCHIVE_ROOT: &str = "stanfordSentimentTreebank";

/// Downloads and unpacks a zip archive containing one top-level folder.
pub struct ZipDownloader {
    url:          String,
    archive_root: String,
}

impl ZipDownloader {
    pub fn new(url: impl Into<String>, archive_root: impl Into<String>) -> Self {
        Self { url: url.into(), archive_root: archive_root.into() }
    }

    /// Downloader for the sentiment treebank
    pub fn sst() -> Self {
        Self::new(SST_URL, SST_ARCHIVE_ROOT)
    }

    /// Unpack `bytes` into the parent of `target_dir`, then move the
    /// archive root into place.
    fn unpack(&self, bytes: &[u8], target_dir: &Path) -> Result<()> {
        let parent = target_dir.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create '{}'", parent.display()))?;

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .context("Downloaded file is not a valid zip archive")?;
        archive
            .extract(parent)
            .with_context(|| format!("Cannot extract archive into '{}'", parent.display()))?;

        let unpacked = parent.join(&self.archive_root);
        if unpacked != target_dir {
            if !unpacked.exists() {
                bail!("archive did not contain '{}'", self.archive_root);
            }
            fs::rename(&unpacked, target_dir).with_context(|| {
                format!("Cannot move '{}' to '{}'", unpacked.display(), target_dir.display())
            })?;
        }
        Ok(())
    }
}

impl SourceFetcher for ZipDownloader {
    fn fetch(&self, target_dir: &Path) -> Result<()> {
        tracing::info!("Downloading '{}'", self.url);

        let response = reqwest::blocking::get(&self.url)
            .with_context(|| format!("Cannot reach '{}'", self.url))?
            .error_for_status()
            .with_context(|| format!("Download of '{}' failed", self.url))?;
        let bytes = response.bytes().context("Cannot read download body")?;
        tracing::info!("Downloaded {} bytes", bytes.len());

        self.unpack(&bytes, target_dir)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn archive_with(root: &str) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buf);
            let options = zip::write::FileOptions::default();
            zip.add_directory(format!("{root}/"), options).unwrap();
            zip.start_file(format!("{root}/dictionary.txt"), options).unwrap();
            zip.write_all(b"good|0\n").unwrap();
            zip.finish().unwrap();
        }
        buf.into_inner()
    }

    #[test]
    fn test_unpack_renames_archive_root() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("sst");
        let downloader = ZipDownloader::new("unused", SST_ARCHIVE_ROOT);

        downloader.unpack(&archive_with(SST_ARCHIVE_ROOT), &target).unwrap();
        assert!(target.join("dictionary.txt").exists());
        assert!(!tmp.path().join(SST_ARCHIVE_ROOT).exists());
    }

    #[test]
    fn test_unpack_rejects_unexpected_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let downloader = ZipDownloader::new("unused", SST_ARCHIVE_ROOT);
        let err = downloader
            .unpack(&archive_with("something_else"), &tmp.path().join("sst"))
            .unwrap_err();
        assert!(err.to_string().contains(SST_ARCHIVE_ROOT));
    }

    #[test]
    fn test_garbage_is_not_an_archive() {
        let tmp = tempfile::tempdir().unwrap();
        let downloader = ZipDownloader::sst();
        assert!(downloader.unpack(b"not a zip", &tmp.path().join("sst")).is_err());
    }
}
