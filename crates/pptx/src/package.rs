//! PPTX package (ZIP container) handling.
//!
//! The whole archive is read into an ordered entry list so that untouched
//! parts (media, layouts, themes, masters) are written back byte for byte.
//! Slide order comes from the presentation relationships, and each
//! slide's notes part is resolved through the slide's own relationships.

use cn2tw_core::{Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::ZipArchive;

const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];
const OLE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";

/// One slide of the presentation with its optional notes part.
#[derive(Debug, Clone)]
pub struct SlideRef {
    /// Archive path of the slide part.
    pub path: String,
    /// Archive path of the slide's notes part, if it has notes.
    pub notes_path: Option<String>,
}

/// An in-memory presentation package.
///
/// Owned exclusively by one conversion; opened, mutated through
/// [`Document::set_part`], serialized with [`Document::save`] and dropped.
pub struct Document {
    /// All archive entries in original order.
    entries: Vec<(String, Vec<u8>)>,
    /// Slides in presentation order.
    slides: Vec<SlideRef>,
}

impl Document {
    /// Open a .pptx file.
    ///
    /// Fails with [`Error::Open`] when the file is missing or not a valid
    /// OOXML presentation, and with [`Error::Encrypted`] when the bytes
    /// are an OLE/CFB container, which for a .pptx means the document is
    /// password-protected.
    pub fn open(path: &Path) -> Result<Self> {
        let data = fs::read(path)
            .map_err(|e| Error::Open(format!("{}: {}", path.display(), e)))?;

        if data.starts_with(&OLE_MAGIC) {
            return Err(Error::Encrypted(path.display().to_string()));
        }
        if !data.starts_with(&ZIP_MAGIC) {
            return Err(Error::Open(format!(
                "{}: not an OOXML presentation container",
                path.display()
            )));
        }

        let mut archive = ZipArchive::new(Cursor::new(&data))
            .map_err(|e| Error::Open(format!("{}: {}", path.display(), e)))?;

        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .map_err(|e| Error::Open(format!("{}: {}", path.display(), e)))?;
            let name = entry.name().to_string();
            let mut bytes = Vec::new();
            entry
                .read_to_end(&mut bytes)
                .map_err(|e| Error::Open(format!("{}: entry '{}': {}", path.display(), name, e)))?;
            entries.push((name, bytes));
        }

        let document = Self {
            entries,
            slides: Vec::new(),
        };
        let slides = document.resolve_slides()?;

        Ok(Self { slides, ..document })
    }

    /// Slides in presentation order.
    pub fn slides(&self) -> &[SlideRef] {
        &self.slides
    }

    /// Read a part as UTF-8 XML.
    pub fn part_xml(&self, part_path: &str) -> Result<String> {
        let (_, bytes) = self
            .entries
            .iter()
            .find(|(name, _)| name == part_path)
            .ok_or_else(|| Error::Open(format!("missing part '{}'", part_path)))?;
        String::from_utf8(bytes.clone())
            .map_err(|e| Error::Xml(format!("part '{}' is not UTF-8: {}", part_path, e)))
    }

    /// Replace a part's bytes. The entry must already exist.
    pub fn set_part(&mut self, part_path: &str, bytes: Vec<u8>) {
        if let Some(entry) = self.entries.iter_mut().find(|(name, _)| name == part_path) {
            entry.1 = bytes;
        }
    }

    /// Write the package to `path` atomically: the archive is assembled
    /// in a sibling temp file and renamed into place, so a failed write
    /// never leaves a half-written presentation behind.
    pub fn save(&self, path: &Path) -> Result<()> {
        let tmp = temp_sibling(path);

        if let Err(e) = self.write_archive(&tmp) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }

        fs::rename(&tmp, path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            Error::Write(format!("{}: {}", path.display(), e))
        })
    }

    fn write_archive(&self, path: &Path) -> Result<()> {
        let file = fs::File::create(path)
            .map_err(|e| Error::Write(format!("{}: {}", path.display(), e)))?;
        let mut writer = zip::ZipWriter::new(file);

        let deflated = zip::write::FileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        // Media is typically already compressed; store it as-is.
        let stored = zip::write::FileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);

        for (name, bytes) in &self.entries {
            let options = if name.starts_with("ppt/media/") {
                stored
            } else {
                deflated
            };
            writer
                .start_file(name.clone(), options)
                .map_err(|e| Error::Write(format!("entry '{}': {}", name, e)))?;
            writer
                .write_all(bytes)
                .map_err(|e| Error::Write(format!("entry '{}': {}", name, e)))?;
        }

        writer
            .finish()
            .map_err(|e| Error::Write(format!("{}: {}", path.display(), e)))?;
        Ok(())
    }

    /// Determine slide order from the presentation relationships and pair
    /// each slide with its notes part.
    fn resolve_slides(&self) -> Result<Vec<SlideRef>> {
        let rels = self.part_xml(PRESENTATION_RELS).map_err(|_| {
            Error::Open(format!("missing '{}': not a presentation", PRESENTATION_RELS))
        })?;

        let mut slides: Vec<(String, Option<usize>)> = Vec::new();
        for rel in parse_relationships(&rels)? {
            if rel.rel_type.ends_with("/slide") {
                let order = extract_part_number(&rel.id).or_else(|| extract_part_number(&rel.target));
                slides.push((resolve_target("ppt", &rel.target), order));
            }
        }

        // Sort by relationship/part number, falling back to the path.
        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        slides
            .into_iter()
            .map(|(path, _)| {
                let notes_path = self.resolve_notes(&path)?;
                Ok(SlideRef { path, notes_path })
            })
            .collect()
    }

    /// Find the notes part referenced by a slide's relationships, if any.
    fn resolve_notes(&self, slide_path: &str) -> Result<Option<String>> {
        let (dir, file) = match slide_path.rsplit_once('/') {
            Some(split) => split,
            None => return Ok(None),
        };
        let rels_path = format!("{}/_rels/{}.rels", dir, file);

        let rels = match self.part_xml(&rels_path) {
            Ok(rels) => rels,
            // A slide without relationships has no notes.
            Err(_) => return Ok(None),
        };

        for rel in parse_relationships(&rels)? {
            if rel.rel_type.ends_with("/notesSlide") {
                return Ok(Some(resolve_target(dir, &rel.target)));
            }
        }
        Ok(None)
    }
}

/// One `<Relationship>` element from a .rels part.
struct Relationship {
    id: String,
    rel_type: String,
    target: String,
}

/// Parse the `<Relationship>` elements of a relationships part.
fn parse_relationships(xml: &str) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut relationships = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.name().as_ref() == b"Relationship" =>
            {
                let mut id = String::new();
                let mut rel_type = String::new();
                let mut target = String::new();

                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"Id" => id = String::from_utf8_lossy(&attr.value).to_string(),
                        b"Type" => rel_type = String::from_utf8_lossy(&attr.value).to_string(),
                        b"Target" => target = String::from_utf8_lossy(&attr.value).to_string(),
                        _ => {}
                    }
                }

                relationships.push(Relationship { id, rel_type, target });
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::Xml(format!("error parsing relationships: {}", e)));
            }
            _ => {}
        }
    }

    Ok(relationships)
}

/// Resolve a relationship target against the directory of its source part.
///
/// Targets are either package-absolute (leading `/`) or relative to the
/// source part's directory, possibly climbing with `../`.
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut components: Vec<&str> = base_dir.split('/').filter(|c| !c.is_empty()).collect();
    for component in target.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            other => components.push(other),
        }
    }
    components.join("/")
}

/// Extract a part number from a string like "rId2" or "slides/slide3.xml".
fn extract_part_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}

/// Temp file path next to the final output, on the same filesystem so the
/// final rename is atomic.
fn temp_sibling(path: &Path) -> std::path::PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    name.push_str(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_part_number() {
        assert_eq!(extract_part_number("rId1"), Some(1));
        assert_eq!(extract_part_number("rId12"), Some(12));
        assert_eq!(extract_part_number("slides/slide3.xml"), Some(3));
        assert_eq!(extract_part_number("nodigits"), None);
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("ppt", "slides/slide1.xml"), "ppt/slides/slide1.xml");
        assert_eq!(
            resolve_target("ppt/slides", "../notesSlides/notesSlide1.xml"),
            "ppt/notesSlides/notesSlide1.xml"
        );
        assert_eq!(resolve_target("ppt", "/docProps/app.xml"), "docProps/app.xml");
        assert_eq!(resolve_target("ppt/slides", "./slide2.xml"), "ppt/slides/slide2.xml");
    }

    #[test]
    fn test_parse_relationships_filters_attributes() {
        let xml = r#"<?xml version="1.0"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="slideMasters/slideMaster1.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide1.xml"/>
</Relationships>"#;
        let rels = parse_relationships(xml).unwrap();
        assert_eq!(rels.len(), 2);
        assert!(rels[0].rel_type.ends_with("/slideMaster"));
        assert!(!rels[0].rel_type.ends_with("/slide"));
        assert!(rels[1].rel_type.ends_with("/slide"));
        assert_eq!(rels[1].id, "rId2");
        assert_eq!(rels[1].target, "slides/slide1.xml");
    }

    #[test]
    fn test_open_rejects_non_zip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.pptx");
        fs::write(&path, b"this is not a presentation").unwrap();
        assert!(matches!(Document::open(&path), Err(Error::Open(_))));
    }

    #[test]
    fn test_open_rejects_ole_container_as_encrypted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locked.pptx");
        let mut bytes = OLE_MAGIC.to_vec();
        bytes.extend_from_slice(&[0u8; 64]);
        fs::write(&path, bytes).unwrap();
        assert!(matches!(Document::open(&path), Err(Error::Encrypted(_))));
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.pptx");
        assert!(matches!(Document::open(&path), Err(Error::Open(_))));
    }
}
