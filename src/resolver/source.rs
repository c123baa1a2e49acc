//! Content source abstraction for reading model files from the filesystem or
//! from an existing COMBINE archive (ZIP).

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::io::Read;

/// Trait for abstracting file I/O (filesystem vs. ZIP source).
pub trait ContentSource {
    /// Read a file at the given logical path and return its content as a string.
    fn read_to_string(&mut self, path: &Utf8Path) -> Result<String>;
    /// Whether a file exists at the given logical path.
    fn exists(&mut self, path: &Utf8Path) -> bool;
    /// Search for a file by bare name under `base`, returning its path
    /// relative to `base`. Used as a last-resort lookup for include targets
    /// that do not resolve relative to the including file.
    fn find_by_name(&mut self, base: &Utf8Path, name: &str) -> Option<Utf8PathBuf> {
        let _ = (base, name);
        None
    }
}

/// Reads files directly from the local filesystem.
pub struct FsSource;

impl ContentSource for FsSource {
    fn read_to_string(&mut self, path: &Utf8Path) -> Result<String> {
        Ok(std::fs::read_to_string(path.as_str())
            .with_context(|| format!("Failed to read {}", path))?)
    }
    fn exists(&mut self, path: &Utf8Path) -> bool {
        path.exists()
    }
    fn find_by_name(&mut self, base: &Utf8Path, name: &str) -> Option<Utf8PathBuf> {
        for entry in walkdir::WalkDir::new(base.as_std_path())
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if entry.file_type().is_file() && entry.file_name().to_str() == Some(name) {
                let p = Utf8PathBuf::from_path_buf(entry.into_path()).ok()?;
                return p.strip_prefix(base).map(|r| r.to_path_buf()).ok();
            }
        }
        None
    }
}

/// Reads files from a ZIP archive (used for `.neux`/`.omex` COMBINE archives).
pub struct ZipSource<R: Read + std::io::Seek> {
    zip: zip::ZipArchive<R>,
}

impl<R: Read + std::io::Seek> ZipSource<R> {
    pub fn new(reader: R) -> Result<Self> {
        let zip = zip::ZipArchive::new(reader).context("Failed to open zip archive")?;
        Ok(Self { zip })
    }
}

fn zip_path(path: &Utf8Path) -> String {
    path.as_str()
        .trim_start_matches("./")
        .trim_start_matches('/')
        .to_string()
}

impl<R: Read + std::io::Seek> ContentSource for ZipSource<R> {
    fn read_to_string(&mut self, path: &Utf8Path) -> Result<String> {
        let p = zip_path(path);
        let mut f = self
            .zip
            .by_name(&p)
            .with_context(|| format!("File {} not found in zip", p))?;
        let mut s = String::new();
        f.read_to_string(&mut s)
            .with_context(|| format!("Failed to read {} from zip", p))?;
        Ok(s)
    }

    fn exists(&mut self, path: &Utf8Path) -> bool {
        let p = zip_path(path);
        self.zip.by_name(&p).is_ok()
    }

    fn find_by_name(&mut self, base: &Utf8Path, name: &str) -> Option<Utf8PathBuf> {
        let prefix = zip_path(base);
        for i in 0..self.zip.len() {
            let entry_name = self.zip.by_index(i).ok()?.name().to_string();
            // The prefix must end on a path-component boundary, so that
            // e.g. base "mod" does not match entries under "models/".
            let rel = if prefix.is_empty() {
                Some(entry_name.as_str())
            } else {
                entry_name
                    .strip_prefix(&prefix)
                    .and_then(|rest| rest.strip_prefix('/'))
            };
            if let Some(rel) = rel.map(Utf8Path::new) {
                if rel.file_name() == Some(name) {
                    return Some(rel.to_path_buf());
                }
            }
        }
        None
    }
}
