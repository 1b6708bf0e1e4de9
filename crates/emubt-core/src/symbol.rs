//! Symbol table extraction
//!
//! Finds every `<symbol width=".." height=".." data="..">` element in a
//! document and indexes it by sanitized name.

use crate::document::{read_attribute, Document, ElementHandle};
use crate::error::{Error, Result};
use crate::sanitize::{sanitize, UNNAMED};
use crate::token::decode_packed;
use serde::Serialize;
use std::collections::BTreeMap;

/// Tag name of symbol-bearing elements
pub const SYMBOL_TAG: &str = "symbol";

/// Attribute holding the packed token string
pub const DATA_ATTR: &str = "data";

/// Index from sanitized name to symbol, for one document
pub type SymbolIndex = BTreeMap<String, SymbolEntry>;

/// A symbol element bound to its position in the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolEntry {
    /// Element this entry was read from
    pub handle: ElementHandle,
    /// Display name as stored in the document
    pub name: String,
    /// Filesystem-safe matching key
    pub sanitized_name: String,
    /// Declared number of columns
    pub width: usize,
    /// Declared number of rows
    pub height: usize,
    /// Packed token string
    pub data: String,
}

impl SymbolEntry {
    /// Number of cells the declared size requires
    pub fn cell_count(&self) -> usize {
        self.width.saturating_mul(self.height)
    }

    /// Decode the packed data, checking it fills the declared size
    pub fn decode(&self) -> Result<Vec<i64>> {
        let values = decode_packed(&self.data)?;
        if values.len() != self.cell_count() {
            return Err(Error::DimensionMismatch {
                found: values.len(),
                width: self.width,
                height: self.height,
            });
        }
        Ok(values)
    }
}

/// All well-formed symbol elements, in document order
///
/// Elements without a usable width, height or data attribute are skipped.
pub fn symbols(doc: &Document) -> Vec<SymbolEntry> {
    doc.elements()
        .filter(|(_, start)| start.name().as_ref() == SYMBOL_TAG.as_bytes())
        .filter_map(|(handle, start)| {
            let width = parse_dimension(read_attribute(start, "width")?)?;
            let height = parse_dimension(read_attribute(start, "height")?)?;
            let data = read_attribute(start, DATA_ATTR)?;
            let name = read_attribute(start, "name")
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| UNNAMED.to_string());

            Some(SymbolEntry {
                handle,
                sanitized_name: sanitize(&name),
                name,
                width,
                height,
                data,
            })
        })
        .collect()
}

/// Build the name index for a document; a later duplicate name wins
pub fn extract(doc: &Document) -> SymbolIndex {
    let mut index = SymbolIndex::new();
    for entry in symbols(doc) {
        index.insert(entry.sanitized_name.clone(), entry);
    }
    index
}

fn parse_dimension(text: String) -> Option<usize> {
    text.trim().parse::<usize>().ok().filter(|&n| n > 0)
}
