//! COMBINE manifest and archive generation.

pub mod archive;
pub mod manifest_xml;

pub use archive::*;
pub use manifest_xml::*;
