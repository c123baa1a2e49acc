use camino::Utf8Path;
use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Model file kinds
// ────────────────────────────────────────────────────────────────────────────

/// Kind of a model description file, classified from its extension.
///
/// LEMS simulation files conventionally carry a plain `.xml` extension
/// (`LEMS_*.xml`), so any `.xml` file is treated as LEMS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    NeuroMl,
    Lems,
    Sedml,
}

impl ModelKind {
    /// Classify a file path by extension. Returns `None` for extensions that
    /// are not model description files (data files, hoc scripts, ...).
    pub fn classify(path: &Utf8Path) -> Option<ModelKind> {
        match path.extension() {
            Some("nml") => Some(ModelKind::NeuroMl),
            Some("xml") => Some(ModelKind::Lems),
            Some("sedml") => Some(ModelKind::Sedml),
            _ => None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// COMBINE content formats
// ────────────────────────────────────────────────────────────────────────────

/// COMBINE specification URI for the OMEX archive itself (the `.` entry).
pub const FORMAT_OMEX: &str = "http://identifiers.org/combine.specifications/omex";
/// COMBINE specification URI for the manifest file.
pub const FORMAT_OMEX_MANIFEST: &str =
    "http://identifiers.org/combine.specifications/omex-manifest";
pub const FORMAT_NEUROML: &str = "http://identifiers.org/combine.specifications/neuroml";
pub const FORMAT_LEMS: &str = "http://identifiers.org/combine.specifications/lems";
pub const FORMAT_SEDML: &str = "http://identifiers.org/combine.specifications/sed-ml";
/// Fallback mediatype URI for archive members that are not model files.
pub const FORMAT_OCTET_STREAM: &str =
    "http://purl.org/NET/mediatypes/application/octet-stream";

/// Return the COMBINE content format URI for an archive member path.
pub fn content_format(path: &Utf8Path) -> &'static str {
    match ModelKind::classify(path) {
        Some(ModelKind::NeuroMl) => FORMAT_NEUROML,
        Some(ModelKind::Lems) => FORMAT_LEMS,
        Some(ModelKind::Sedml) => FORMAT_SEDML,
        None => FORMAT_OCTET_STREAM,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Manifest
// ────────────────────────────────────────────────────────────────────────────

/// One `<content>` entry of a COMBINE manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Location relative to the archive root (`.` for the archive itself).
    pub location: String,
    /// Content format URI.
    pub format: String,
    /// Whether this entry is the master file of the archive.
    pub master: bool,
}

/// A COMBINE manifest: the ordered list of `<content>` entries written to
/// `manifest.xml`. Derived entirely from a resolved file list; carries no
/// independent state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Build a manifest for an archive rooted at `root_file` containing
    /// `files`. The first two entries describe the archive itself and the
    /// manifest; each file then appears exactly once, with the root file
    /// flagged as master.
    pub fn from_file_list(root_file: &Utf8Path, files: &[impl AsRef<Utf8Path>]) -> Manifest {
        let mut entries = vec![
            ManifestEntry {
                location: ".".to_string(),
                format: FORMAT_OMEX.to_string(),
                master: false,
            },
            ManifestEntry {
                location: "manifest.xml".to_string(),
                format: FORMAT_OMEX_MANIFEST.to_string(),
                master: false,
            },
        ];
        for f in files {
            let f = f.as_ref();
            entries.push(ManifestEntry {
                location: f.as_str().to_string(),
                format: content_format(f).to_string(),
                master: f == root_file,
            });
        }
        Manifest { entries }
    }

    /// Entries describing archive member files (excludes the `.` archive
    /// entry and the manifest self-entry).
    pub fn member_entries(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.entries
            .iter()
            .filter(|e| e.location != "." && e.location != "manifest.xml")
    }

    /// The master entry, if any.
    pub fn master(&self) -> Option<&ManifestEntry> {
        self.entries.iter().find(|e| e.master)
    }
}
