//! Extraction of file references from model XML.
//!
//! NeuroML documents reference other files through lowercase
//! `<include href="..."/>` elements; LEMS documents use capitalized
//! `<Include file="..."/>` elements. Both are extracted in document order.

use crate::model::ModelKind;
use anyhow::{Context, Result};
use camino::Utf8Path;
use roxmltree::Document;

/// Standard NeuroML2/LEMS core-type definition files. These ship with every
/// simulator that understands LEMS, so includes pointing at them are not
/// archive members.
pub const LEMS_CORE_TYPES: &[&str] = &[
    "Cells.xml",
    "Channels.xml",
    "Inputs.xml",
    "Networks.xml",
    "NeuroML2CoreTypes.xml",
    "NeuroMLCoreCompTypes.xml",
    "NeuroMLCoreDimensions.xml",
    "PyNN.xml",
    "Simulation.xml",
    "Synapses.xml",
];

/// Whether an include target names a standard core-type definition file.
pub fn is_core_type_include(target: &str) -> bool {
    let name = Utf8Path::new(target).file_name().unwrap_or(target);
    LEMS_CORE_TYPES.contains(&name)
}

/// Extract the include targets declared in a model document.
///
/// `origin` is only used for error messages.
pub fn model_includes(text: &str, kind: ModelKind, origin: &Utf8Path) -> Result<Vec<String>> {
    let doc =
        Document::parse(text).with_context(|| format!("Failed to parse XML {}", origin))?;
    let mut targets = Vec::new();
    for node in doc.descendants().filter(|n| n.is_element()) {
        match kind {
            ModelKind::NeuroMl => {
                if node.tag_name().name() == "include" {
                    if let Some(href) = node.attribute("href") {
                        targets.push(href.trim().to_string());
                    }
                }
            }
            ModelKind::Lems => {
                if node.tag_name().name() == "Include" {
                    if let Some(file) = node.attribute("file") {
                        targets.push(file.trim().to_string());
                    }
                }
            }
            // SED-ML documents reference models through <model source="..."/>
            ModelKind::Sedml => {
                if node.tag_name().name() == "model" {
                    if let Some(source) = node.attribute("source") {
                        targets.push(source.trim().to_string());
                    }
                }
            }
        }
    }
    targets.retain(|t| !t.is_empty());
    Ok(targets)
}
