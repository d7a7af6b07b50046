//! Single-file conversion: open, rewrite every text location, save.

use cn2tw_core::{CharacterMapper, Error, Result};
use std::fs;
use std::path::Path;

use crate::package::Document;
use crate::slide::{PartKind, SlidePart, TextLocation};

/// Counters for one converted file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertOutcome {
    /// Text locations visited across all slide and notes parts.
    pub locations: usize,
    /// Locations whose text actually changed.
    pub rewritten: usize,
}

/// Convert one presentation from `input` to `output`.
///
/// Every text location (shape runs, table cells, notes) is run through
/// the mapper and overwritten only when the converted string differs, so
/// parts without Simplified text keep their original bytes. The input
/// file is never modified; the output is written atomically after the
/// whole document has been converted.
pub fn convert_file(
    input: &Path,
    output: &Path,
    mapper: &CharacterMapper,
) -> Result<ConvertOutcome> {
    let mut document = Document::open(input)?;
    let mut outcome = ConvertOutcome::default();

    let slides = document.slides().to_vec();
    for slide in &slides {
        rewrite_part(&mut document, &slide.path, PartKind::Slide, mapper, &mut outcome)?;
        if let Some(notes_path) = &slide.notes_path {
            rewrite_part(&mut document, notes_path, PartKind::Notes, mapper, &mut outcome)?;
        }
    }

    log::debug!(
        "{}: visited {} text location(s), rewrote {}",
        input.display(),
        outcome.locations,
        outcome.rewritten
    );

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Write(format!("{}: {}", parent.display(), e)))?;
        }
    }

    document.save(output)?;
    Ok(outcome)
}

/// Rewrite one slide or notes part in place inside the package.
fn rewrite_part(
    document: &mut Document,
    part_path: &str,
    kind: PartKind,
    mapper: &CharacterMapper,
    outcome: &mut ConvertOutcome,
) -> Result<()> {
    let xml = document.part_xml(part_path)?;
    let mut part = SlidePart::parse(&xml, kind)?;

    let locations: Vec<TextLocation> = part.text_locations().collect();
    let mut changed = false;

    for location in locations {
        let text = part.text(location)?;
        let converted = mapper.convert(&text);
        outcome.locations += 1;
        if converted != text {
            part.set_text(location, &converted);
            outcome.rewritten += 1;
            changed = true;
        }
    }

    if changed {
        document.set_part(part_path, part.to_xml()?);
    }
    Ok(())
}
