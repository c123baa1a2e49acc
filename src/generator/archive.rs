//! COMBINE/OMEX archive reading and writing.
//!
//! A COMBINE archive is a ZIP container holding a `manifest.xml` plus the
//! model files it describes. Building an archive resolves the dependency
//! closure of the root model (unless an explicit file list is supplied),
//! loads every member and writes the container with deterministic entry
//! metadata, so re-running with the same inputs produces an identical file.

use crate::generator::manifest_xml::{generate_manifest_xml, parse_manifest_xml};
use crate::model::Manifest;
use crate::resolver::ModelResolver;
use anyhow::{Context, Result, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::io::{Read, Seek, Write};

/// Default file extension for generated archives.
pub const DEFAULT_ARCHIVE_EXTENSION: &str = "neux";

/// One member of a COMBINE archive: its path inside the container and its
/// raw bytes.
#[derive(Debug, Clone)]
pub struct CombineArchiveEntry {
    pub path: String,
    pub data: Vec<u8>,
}

/// An in-memory COMBINE archive: parsed manifest plus member files.
#[derive(Debug, Clone)]
pub struct CombineArchive {
    pub manifest: Manifest,
    entries: Vec<CombineArchiveEntry>,
}

impl CombineArchive {
    /// Build an archive for `root_model`, reading members from `base_dir`.
    ///
    /// If `file_list` is empty the dependency closure is resolved first;
    /// otherwise the given paths (relative to `base_dir`) are used as-is.
    /// Every member must exist on disk at build time.
    pub fn build(
        root_model: &Utf8Path,
        base_dir: &Utf8Path,
        file_list: &[Utf8PathBuf],
    ) -> Result<Self> {
        let files: Vec<Utf8PathBuf> = if file_list.is_empty() {
            ModelResolver::from_dir(base_dir).resolve(root_model)?
        } else {
            file_list.to_vec()
        };
        let rel_root = if root_model.is_absolute() {
            root_model
                .strip_prefix(base_dir)
                .with_context(|| {
                    format!("Root model {} is not under {}", root_model, base_dir)
                })?
                .to_path_buf()
        } else {
            root_model.to_path_buf()
        };
        let manifest = Manifest::from_file_list(&rel_root, &files);

        let mut entries = Vec::with_capacity(files.len());
        for f in &files {
            let full = base_dir.join(f);
            let data = std::fs::read(full.as_std_path())
                .with_context(|| format!("Archive member {} not found", full))?;
            debug!("Adding {} ({} bytes)", f, data.len());
            entries.push(CombineArchiveEntry {
                path: f.as_str().to_string(),
                data,
            });
        }
        Ok(CombineArchive { manifest, entries })
    }

    /// Write the archive to a writer in ZIP format, `manifest.xml` first.
    ///
    /// Entries use deflate compression and a fixed timestamp so identical
    /// inputs yield byte-identical output.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut zip = zip::ZipWriter::new(writer);
        let options = zip::write::FileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());

        zip.start_file("manifest.xml", options)?;
        zip.write_all(generate_manifest_xml(&self.manifest).as_bytes())?;
        for entry in &self.entries {
            zip.start_file(&entry.path, options)?;
            zip.write_all(&entry.data)?;
        }
        zip.finish()?;
        Ok(())
    }

    /// Write the archive to a file on disk.
    pub fn write_to_file(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let file = std::fs::File::create(path.as_ref()).with_context(|| {
            format!("Failed to create {}", path.as_ref().display())
        })?;
        let writer = std::io::BufWriter::new(file);
        self.write_to(writer)
    }

    /// Read an archive from a reader (ZIP format), parsing its manifest.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut zip = zip::ZipArchive::new(reader).context("Failed to open COMBINE archive")?;
        let mut manifest: Option<Manifest> = None;
        let mut entries = Vec::with_capacity(zip.len());

        for i in 0..zip.len() {
            let mut file = zip.by_index(i)?;
            let path = file.name().to_string();
            let mut raw = Vec::new();
            file.read_to_end(&mut raw)?;
            if path == "manifest.xml" {
                let text = String::from_utf8(raw)
                    .context("Non-UTF8 content in manifest.xml")?;
                manifest = Some(parse_manifest_xml(&text)?);
            } else {
                entries.push(CombineArchiveEntry { path, data: raw });
            }
        }

        let manifest =
            manifest.ok_or_else(|| anyhow!("Archive contains no manifest.xml"))?;
        Ok(CombineArchive { manifest, entries })
    }

    /// Read an archive from disk.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())
            .with_context(|| format!("Failed to open {}", path.as_ref().display()))?;
        let reader = std::io::BufReader::new(file);
        Self::from_reader(reader)
    }

    /// List all member paths (excluding `manifest.xml`).
    pub fn entry_paths(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.path.as_str()).collect()
    }

    /// Raw bytes of a member, if present.
    pub fn entry(&self, path: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| e.path == path)
            .map(|e| e.data.as_slice())
    }
}

/// Create a COMBINE archive for a root model file and return the archive
/// path. The model's parent directory doubles as the base search directory;
/// the archive is written next to the model, named after `name` (or the
/// model's file stem) with the given extension.
pub fn create_combine_archive(
    root_model: &Utf8Path,
    name: Option<&str>,
    extension: &str,
) -> Result<Utf8PathBuf> {
    let base_dir = match root_model.parent() {
        Some(p) if !p.as_str().is_empty() => p.to_path_buf(),
        _ => Utf8PathBuf::from("."),
    };
    let rel_root = Utf8PathBuf::from(
        root_model
            .file_name()
            .ok_or_else(|| anyhow!("No file name in {}", root_model))?,
    );
    create_combine_archive_in(&base_dir, &rel_root, name, extension)
}

/// Like [`create_combine_archive`], but with an explicit base search
/// directory for models whose references span a wider tree. `root_model` is
/// relative to `base_dir`; the archive is written into `base_dir`.
pub fn create_combine_archive_in(
    base_dir: &Utf8Path,
    root_model: &Utf8Path,
    name: Option<&str>,
    extension: &str,
) -> Result<Utf8PathBuf> {
    let stem = root_model
        .file_stem()
        .ok_or_else(|| anyhow!("No file stem in {}", root_model))?;
    let archive_name = format!("{}.{}", name.unwrap_or(stem), extension.trim_start_matches('.'));

    let archive = CombineArchive::build(root_model, base_dir, &[])?;
    let out_path = base_dir.join(archive_name);
    archive.write_to_file(out_path.as_std_path())?;
    Ok(out_path)
}
