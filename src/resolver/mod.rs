//! Model file dependency resolution.
//!
//! Provides [`ModelResolver`] to compute the dependency closure of a NeuroML
//! or LEMS model: the ordered list of every file (root plus direct and
//! transitively referenced files) needed to reproduce the model. Sub-modules:
//!
//! - [`source`] – File I/O abstraction (filesystem vs. ZIP)
//! - [`includes`] – Include-reference extraction from model XML

pub mod includes;
pub mod source;

pub use includes::{LEMS_CORE_TYPES, is_core_type_include, model_includes};
pub use source::*;

use crate::model::ModelKind;
use anyhow::{Context, Result, bail};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexSet;
use log::debug;

/// Resolves the dependency closure of a model file. Generic over
/// [`ContentSource`] so it can read from the filesystem ([`FsSource`]) or
/// from an existing COMBINE archive ([`ZipSource`]).
pub struct ModelResolver<S: ContentSource> {
    base_dir: Utf8PathBuf,
    source: S,
}

impl ModelResolver<FsSource> {
    /// Resolver reading from the filesystem with the given base search
    /// directory. Discovered paths are reported relative to it.
    pub fn from_dir(base_dir: impl AsRef<Utf8Path>) -> Self {
        Self::new(base_dir, FsSource)
    }
}

impl<S: ContentSource> ModelResolver<S> {
    pub fn new(base_dir: impl AsRef<Utf8Path>, source: S) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn base_dir(&self) -> &Utf8Path {
        &self.base_dir
    }

    /// Compute the ordered, duplicate-free list of files needed by `root`.
    ///
    /// The returned paths are relative to the base directory, root first,
    /// then referenced files in depth-first document order. For a model with
    /// N transitively referenced (non-skipped) files this returns exactly
    /// N+1 paths.
    pub fn resolve(&mut self, root: impl AsRef<Utf8Path>) -> Result<Vec<Utf8PathBuf>> {
        let root = root.as_ref();
        let rel_root = if root.is_absolute() {
            root.strip_prefix(&self.base_dir)
                .map(|p| p.to_path_buf())
                .with_context(|| {
                    format!("Root file {} is not under base directory {}", root, self.base_dir)
                })?
        } else {
            root.to_path_buf()
        };
        if ModelKind::classify(&rel_root).is_none() {
            bail!(
                "Unsupported model file {}: expected a NeuroML (.nml), LEMS (.xml) or SED-ML (.sedml) file",
                rel_root
            );
        }
        let full = self.base_dir.join(&rel_root);
        if !self.source.exists(&full) {
            bail!("Model file {} not found", full);
        }
        let mut seen: IndexSet<Utf8PathBuf> = IndexSet::new();
        self.visit(rel_root, &mut seen)?;
        Ok(seen.into_iter().collect())
    }

    fn visit(&mut self, rel: Utf8PathBuf, seen: &mut IndexSet<Utf8PathBuf>) -> Result<()> {
        if !seen.insert(rel.clone()) {
            return Ok(());
        }
        debug!("Processing {}", rel);
        // Non-model members (morphology data, mod files, ...) are leaves.
        let Some(kind) = ModelKind::classify(&rel) else {
            return Ok(());
        };
        let full = self.base_dir.join(&rel);
        let text = self.source.read_to_string(&full)?;
        for target in model_includes(&text, kind, &rel)? {
            if kind == ModelKind::Lems && is_core_type_include(&target) {
                debug!("Skipping standard LEMS definition file {}", target);
                continue;
            }
            let resolved = self.locate(&rel, &target)?;
            self.visit(resolved, seen)?;
        }
        Ok(())
    }

    /// Resolve an include target declared in `from` to a path relative to the
    /// base directory. Tries the including file's directory first, then the
    /// base directory, then a recursive search by file name.
    fn locate(&mut self, from: &Utf8Path, target: &str) -> Result<Utf8PathBuf> {
        let target_path = Utf8Path::new(target);
        if target_path.is_absolute() {
            return target_path
                .strip_prefix(&self.base_dir)
                .map(|p| p.to_path_buf())
                .with_context(|| {
                    format!(
                        "File {} referenced from {} is outside base directory {}",
                        target, from, self.base_dir
                    )
                });
        }

        let sibling = match from.parent() {
            Some(parent) if !parent.as_str().is_empty() => {
                normalize_rel(&parent.join(target_path))
            }
            _ => normalize_rel(target_path),
        };
        // Paths with a leading ".." would not be valid archive entries, so
        // candidates escaping the base directory are never eligible.
        if !escapes_base(&sibling) && self.source.exists(&self.base_dir.join(&sibling)) {
            return Ok(sibling);
        }

        let from_base = normalize_rel(target_path);
        if !escapes_base(&from_base) && self.source.exists(&self.base_dir.join(&from_base)) {
            return Ok(from_base);
        }

        if let Some(name) = target_path.file_name() {
            if let Some(found) = self.source.find_by_name(&self.base_dir, name) {
                debug!("Resolved {} (from {}) by search: {}", target, from, found);
                return Ok(found);
            }
        }

        if escapes_base(&sibling) {
            bail!(
                "File {} referenced from {} escapes base directory {}",
                target,
                from,
                self.base_dir
            );
        }
        bail!(
            "File {} referenced from {} not found under {}",
            target,
            from,
            self.base_dir
        )
    }
}

/// Whether a normalized relative path points above the base directory.
fn escapes_base(path: &Utf8Path) -> bool {
    path.as_str() == ".." || path.as_str().starts_with("../")
}

/// Lexically normalize a relative path: drop `.` components and fold `..`
/// into the preceding component where possible.
fn normalize_rel(path: &Utf8Path) -> Utf8PathBuf {
    let mut parts: Vec<&str> = Vec::new();
    for comp in path.components() {
        match comp.as_str() {
            "." => {}
            ".." => {
                if matches!(parts.last(), Some(&"..") | None) {
                    parts.push("..");
                } else {
                    parts.pop();
                }
            }
            other => parts.push(other),
        }
    }
    parts.into_iter().collect()
}
