//! Simplified-to-Traditional Chinese character mapping.
//!
//! Wraps the bundled character table in a pure `convert` function. The
//! mapper is loaded once at process start and shared by reference across
//! all conversions; it is never mutated after load.

use crate::error::{Error, Result};
use std::collections::HashMap;

/// The bundled Simplified -> Traditional character table.
const TABLE_DATA: &str = include_str!("../data/s2t.tsv");

/// Maps Simplified Chinese characters to their Traditional equivalents.
///
/// Conversion is strictly per character: characters without an entry in
/// the table (digits, Latin text, punctuation, already-Traditional text)
/// pass through unchanged, which also makes `convert` idempotent after a
/// single pass.
#[derive(Debug, Clone)]
pub struct CharacterMapper {
    table: HashMap<char, char>,
}

impl CharacterMapper {
    /// Load the bundled mapping table.
    ///
    /// Fails with [`Error::MappingTable`] if the table data is malformed.
    /// This is the only fatal startup error: without the table no file can
    /// be converted, so callers should abort before processing any file.
    pub fn load() -> Result<Self> {
        Self::from_table_str(TABLE_DATA)
    }

    /// Parse a mapping table from tab-separated `simplified<TAB>traditional`
    /// lines. Blank lines and lines starting with `#` are ignored.
    fn from_table_str(data: &str) -> Result<Self> {
        let mut table = HashMap::new();

        for (lineno, line) in data.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (from, to) = line.split_once('\t').ok_or_else(|| {
                Error::MappingTable(format!("line {}: expected two tab-separated fields", lineno + 1))
            })?;

            let from = single_char(from).ok_or_else(|| {
                Error::MappingTable(format!("line {}: source is not a single character", lineno + 1))
            })?;
            let to = single_char(to).ok_or_else(|| {
                Error::MappingTable(format!("line {}: target is not a single character", lineno + 1))
            })?;

            if table.insert(from, to).is_some() {
                log::warn!("duplicate mapping for '{}' in conversion table", from);
            }
        }

        if table.is_empty() {
            return Err(Error::MappingTable("table contains no mappings".to_string()));
        }

        Ok(Self { table })
    }

    /// Convert Simplified Chinese characters in `text` to Traditional.
    ///
    /// Pure and infallible on any input; unmapped characters are copied
    /// through unchanged.
    pub fn convert(&self, text: &str) -> String {
        text.chars()
            .map(|c| self.table.get(&c).copied().unwrap_or(c))
            .collect()
    }

    /// Number of character mappings in the loaded table.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the table is empty (never true for a loaded mapper).
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Return the only character of `s`, or None if `s` is not exactly one.
fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}
