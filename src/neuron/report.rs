//! Typed reports for NEURON morphology and mechanism introspection.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Segment-position key meaning "uniform across all segments of the section".
pub const ALL_SEGMENTS: &str = "*";

/// A 3D morphology point of a section, as reported by NEURON's `x3d`/`y3d`/
/// `z3d`/`diam3d`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3d {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub diam: f64,
}

/// Morphology of a single section: segment count, 3D point count and the
/// points themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionMorphology {
    pub section: String,
    pub nsegs: u32,
    pub n3d: u32,
    pub points: Vec<Point3d>,
}

impl SectionMorphology {
    /// Human-readable rendering, one point per line.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Section: {}", self.section);
        let _ = writeln!(out, "  nsegs: {}", self.nsegs);
        let _ = writeln!(out, "  n3d:   {}", self.n3d);
        let _ = writeln!(
            out,
            "  {:>10} {:>10} {:>10} {:>10}",
            "x", "y", "z", "diam"
        );
        for p in &self.points {
            let _ = writeln!(
                out,
                "  {:>10} {:>10} {:>10} {:>10}",
                p.x, p.y, p.z, p.diam
            );
        }
        out
    }
}

/// Values of one parameter within one section, keyed by normalized segment
/// position (`"*"` when uniform).
pub type SegmentValues = IndexMap<String, f64>;

/// Per-section values of one mechanism parameter.
pub type ParameterValues = IndexMap<String, SegmentValues>;

/// One distributed mechanism and its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MechanismInfo {
    pub parameters: IndexMap<String, ParameterValues>,
}

/// Mechanism state over all instantiated sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MechanismReport {
    pub mechanisms: IndexMap<String, MechanismInfo>,
}

impl MechanismReport {
    /// Look up a single value: mechanism → parameter → section → segment.
    pub fn value(
        &self,
        mechanism: &str,
        parameter: &str,
        section: &str,
        segment: &str,
    ) -> Option<f64> {
        self.mechanisms
            .get(mechanism)?
            .parameters
            .get(parameter)?
            .get(section)?
            .get(segment)
            .copied()
    }

    /// Human-readable rendering, indented by nesting level.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for (mech, info) in &self.mechanisms {
            let _ = writeln!(out, "{}:", mech);
            for (param, sections) in &info.parameters {
                let _ = writeln!(out, "  {}:", param);
                for (section, values) in sections {
                    if let (Some(v), 1) = (values.get(ALL_SEGMENTS), values.len()) {
                        let _ = writeln!(out, "    {}: {} (all segments)", section, v);
                    } else {
                        let _ = writeln!(out, "    {}:", section);
                        for (seg, v) in values {
                            let _ = writeln!(out, "      at {}: {}", seg, v);
                        }
                    }
                }
            }
        }
        out
    }
}
