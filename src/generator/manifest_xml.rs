//! Generate and parse COMBINE `manifest.xml` text.
//!
//! The generated XML uses the omex-manifest namespace, 2-space indentation
//! and a trailing newline, matching the layout produced by common COMBINE
//! tooling.

use crate::model::{Manifest, ManifestEntry};
use anyhow::{Context, Result, anyhow};
use camino::Utf8Path;
use roxmltree::Document;

const OMEX_MANIFEST_NS: &str = "http://identifiers.org/combine.specifications/omex-manifest";

/// Generate the `manifest.xml` text for a [`Manifest`].
pub fn generate_manifest_xml(manifest: &Manifest) -> String {
    let mut out = String::with_capacity(1024);
    out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    out.push_str(&format!("<omexManifest xmlns=\"{}\">\n", OMEX_MANIFEST_NS));
    for entry in &manifest.entries {
        out.push_str("  <content location=\"");
        out.push_str(&xml_escape_attr(&entry.location));
        out.push_str("\" format=\"");
        out.push_str(&xml_escape_attr(&entry.format));
        out.push('"');
        if entry.master {
            out.push_str(" master=\"true\"");
        }
        out.push_str("/>\n");
    }
    out.push_str("</omexManifest>\n");
    out
}

/// Write `manifest.xml` for a [`Manifest`] into the given directory,
/// returning the path of the written file.
pub fn write_manifest(manifest: &Manifest, dir: &Utf8Path) -> Result<camino::Utf8PathBuf> {
    let path = dir.join("manifest.xml");
    std::fs::write(path.as_std_path(), generate_manifest_xml(manifest))
        .with_context(|| format!("Failed to write {}", path))?;
    Ok(path)
}

/// Parse `manifest.xml` text back into a [`Manifest`].
pub fn parse_manifest_xml(text: &str) -> Result<Manifest> {
    let doc = Document::parse(text).context("Failed to parse manifest.xml")?;
    let root = doc.root_element();
    if root.tag_name().name() != "omexManifest" {
        return Err(anyhow!(
            "Not a COMBINE manifest: root element is <{}>",
            root.tag_name().name()
        ));
    }
    let mut entries = Vec::new();
    for node in root
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "content")
    {
        let location = node
            .attribute("location")
            .ok_or_else(|| anyhow!("<content> without location attribute"))?
            .to_string();
        let format = node
            .attribute("format")
            .ok_or_else(|| anyhow!("<content location=\"{}\"> without format", location))?
            .to_string();
        let master = node.attribute("master") == Some("true");
        entries.push(ManifestEntry {
            location,
            format,
            master,
        });
    }
    Ok(Manifest { entries })
}

/// Escape an attribute value for XML, encoding newlines as `&#xA;` and
/// carriage returns as `&#xD;`.
fn xml_escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FORMAT_LEMS, FORMAT_NEUROML, FORMAT_OMEX_MANIFEST};
    use camino::{Utf8Path, Utf8PathBuf};

    #[test]
    fn test_manifest_roundtrip() {
        let files = vec![
            Utf8PathBuf::from("LEMS_sim.xml"),
            Utf8PathBuf::from("cells/hh.nml"),
        ];
        let manifest = Manifest::from_file_list(Utf8Path::new("LEMS_sim.xml"), &files);
        let xml = generate_manifest_xml(&manifest);

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(xml.contains(&format!(
            "<content location=\"LEMS_sim.xml\" format=\"{}\" master=\"true\"/>",
            FORMAT_LEMS
        )));
        assert!(xml.contains(&format!(
            "<content location=\"cells/hh.nml\" format=\"{}\"/>",
            FORMAT_NEUROML
        )));
        assert!(xml.contains(&format!(
            "<content location=\"manifest.xml\" format=\"{}\"/>",
            FORMAT_OMEX_MANIFEST
        )));

        let parsed = parse_manifest_xml(&xml).unwrap();
        assert_eq!(parsed, manifest);
    }

    #[test]
    fn test_attribute_escaping() {
        let manifest = Manifest {
            entries: vec![ManifestEntry {
                location: "a&b\"c.nml".to_string(),
                format: FORMAT_NEUROML.to_string(),
                master: false,
            }],
        };
        let xml = generate_manifest_xml(&manifest);
        assert!(xml.contains("location=\"a&amp;b&quot;c.nml\""));
        let parsed = parse_manifest_xml(&xml).unwrap();
        assert_eq!(parsed.entries[0].location, "a&b\"c.nml");
    }

    #[test]
    fn test_parse_rejects_non_manifest() {
        assert!(parse_manifest_xml("<neuroml/>").is_err());
    }
}
