//! Writers for finished geometry documents.

pub mod gdml;

use std::path::Path;

use gdmlkit_ir::Document;

use crate::error::Result;

pub use gdml::{to_gdml_string, write_gdml};

/// Write the IR document as pretty-printed JSON.
pub fn write_json(doc: &Document, path: impl AsRef<Path>) -> Result<()> {
    let json = doc.to_json()?;
    std::fs::write(path.as_ref(), json)?;
    tracing::info!(path = %path.as_ref().display(), "wrote JSON document");
    Ok(())
}

/// Read an IR document written by [`write_json`].
pub fn read_json(path: impl AsRef<Path>) -> Result<Document> {
    let json = std::fs::read_to_string(path)?;
    Ok(Document::from_json(&json)?)
}
