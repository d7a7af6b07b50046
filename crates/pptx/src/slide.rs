//! Slide and notes part model.
//!
//! Each slide (or notes) part is parsed into two views of the same XML:
//! an owned event list that can be written back losslessly, and a shape
//! tree whose text runs index into that event list. Rewriting a run swaps
//! a single text event; everything else reserializes from the original
//! bytes, so formatting, positions and attributes are never touched.

use cn2tw_core::{Error, Result};
use quick_xml::events::{BytesText, Event};
use quick_xml::Reader;

use crate::walker::TextLocations;

/// Which kind of package part a [`SlidePart`] was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
    /// A slide part (`ppt/slides/slideN.xml`).
    Slide,
    /// A notes slide part (`ppt/notesSlides/notesSlideN.xml`).
    Notes,
}

/// Where in the document a text location lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextLocationKind {
    /// A run inside a shape's text frame.
    ShapeRun,
    /// A run inside a table cell.
    TableCell,
    /// A run inside the notes body of a slide.
    Notes,
}

/// One editable string inside a parsed part.
///
/// Only valid for the [`SlidePart`] that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextLocation {
    /// Classification of the surrounding element.
    pub kind: TextLocationKind,
    /// Index of the text event inside the part's event list.
    pub(crate) event: usize,
}

/// A shape on a slide. Only the text-bearing variants yield locations.
#[derive(Debug)]
pub enum Shape {
    /// A shape with a text frame (`p:sp` with `p:txBody`).
    TextBox(TextBody),
    /// A table inside a graphic frame (`a:tbl`).
    Table(Table),
    /// A group shape (`p:grpSp`); recurses into its children.
    Group(Vec<Shape>),
    /// Pictures, connectors, embedded objects: nothing to rewrite.
    Other,
}

/// Paragraphs of one text frame or table cell.
#[derive(Debug, Default)]
pub struct TextBody {
    /// Paragraphs in document order.
    pub paragraphs: Vec<Paragraph>,
}

/// One paragraph; runs index text events in the owning part.
#[derive(Debug, Default)]
pub struct Paragraph {
    pub(crate) runs: Vec<usize>,
}

/// A table shape: rows of cells, row-major.
#[derive(Debug, Default)]
pub struct Table {
    /// Rows in document order.
    pub rows: Vec<TableRow>,
}

/// One table row.
#[derive(Debug, Default)]
pub struct TableRow {
    /// Cells in left-to-right order.
    pub cells: Vec<TextBody>,
}

/// A parsed slide or notes part.
pub struct SlidePart {
    kind: PartKind,
    events: Vec<Event<'static>>,
    shapes: Vec<Shape>,
}

impl SlidePart {
    /// Parse one part's XML.
    pub fn parse(xml: &str, kind: PartKind) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut events: Vec<Event<'static>> = Vec::new();
        let mut builder = TreeBuilder::default();

        loop {
            let event = reader
                .read_event()
                .map_err(|e| Error::Xml(format!("at byte {}: {}", reader.buffer_position(), e)))?;

            match &event {
                Event::Eof => break,
                Event::Start(e) => builder.open(classify(local_name(e.name().as_ref()))),
                Event::End(e) => builder.close(classify(local_name(e.name().as_ref()))),
                // The index this event will occupy once pushed.
                Event::Text(_) => builder.text(events.len()),
                _ => {}
            }

            events.push(event.into_owned());
        }

        Ok(Self {
            kind,
            events,
            shapes: builder.finish(),
        })
    }

    /// The part kind this was parsed as.
    pub fn kind(&self) -> PartKind {
        self.kind
    }

    /// Top-level shapes of this part, in document order.
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Walk every text location of this part in document order: shape
    /// order, table cells row-major, then paragraph and run order. Lazy
    /// and restartable; repeated walks visit the same locations.
    pub fn text_locations(&self) -> TextLocations<'_> {
        TextLocations::new(&self.shapes, self.kind)
    }

    /// Read the current string at a location.
    pub fn text(&self, location: TextLocation) -> Result<String> {
        match self.events.get(location.event) {
            Some(Event::Text(t)) => t
                .unescape()
                .map(|s| s.into_owned())
                .map_err(|e| Error::Xml(format!("bad text escape: {}", e))),
            _ => Err(Error::Xml("location does not reference a text run".to_string())),
        }
    }

    /// Overwrite the string at a location. The new text is re-escaped on
    /// serialization; no other event is affected.
    pub fn set_text(&mut self, location: TextLocation, text: &str) {
        debug_assert!(matches!(self.events.get(location.event), Some(Event::Text(_))));
        if let Some(slot) = self.events.get_mut(location.event) {
            *slot = Event::Text(BytesText::new(text).into_owned());
        }
    }

    /// Serialize the part back to XML bytes.
    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let mut writer = quick_xml::Writer::new(Vec::new());
        for event in &self.events {
            writer
                .write_event(event.clone())
                .map_err(|e| Error::Xml(format!("serialization failed: {}", e)))?;
        }
        Ok(writer.into_inner())
    }
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    match name.iter().position(|&b| b == b':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

/// Element names the tree builder cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Sp,
    Pic,
    GraphicFrame,
    GroupSp,
    Tbl,
    Tr,
    Tc,
    TxBody,
    Paragraph,
    Text,
    Other,
}

fn classify(local: &[u8]) -> Tag {
    match local {
        b"sp" => Tag::Sp,
        b"pic" => Tag::Pic,
        b"graphicFrame" => Tag::GraphicFrame,
        b"grpSp" => Tag::GroupSp,
        b"tbl" => Tag::Tbl,
        b"tr" => Tag::Tr,
        b"tc" => Tag::Tc,
        b"txBody" => Tag::TxBody,
        b"p" => Tag::Paragraph,
        b"t" => Tag::Text,
        _ => Tag::Other,
    }
}

/// Accumulator for the shape currently being parsed.
enum ShapeAcc {
    TextBox { body: TextBody, saw_text_body: bool },
    Frame { table: Option<Table> },
    Other,
}

/// Builds the shape tree while the event stream is read.
#[derive(Default)]
struct TreeBuilder {
    roots: Vec<Shape>,
    /// Open group shapes, innermost last.
    groups: Vec<Vec<Shape>>,
    acc: Option<ShapeAcc>,
    in_tx_body: bool,
    in_paragraph: bool,
    in_text: bool,
}

impl TreeBuilder {
    fn open(&mut self, tag: Tag) {
        match tag {
            Tag::Sp if self.acc.is_none() => {
                self.acc = Some(ShapeAcc::TextBox {
                    body: TextBody::default(),
                    saw_text_body: false,
                });
            }
            Tag::Pic if self.acc.is_none() => {
                self.acc = Some(ShapeAcc::Other);
            }
            Tag::GraphicFrame if self.acc.is_none() => {
                self.acc = Some(ShapeAcc::Frame { table: None });
            }
            Tag::GroupSp if self.acc.is_none() => {
                self.groups.push(Vec::new());
            }
            Tag::Tbl => {
                if let Some(ShapeAcc::Frame { table }) = &mut self.acc {
                    *table = Some(Table::default());
                }
            }
            Tag::Tr => {
                if let Some(ShapeAcc::Frame { table: Some(table) }) = &mut self.acc {
                    table.rows.push(TableRow::default());
                }
            }
            Tag::Tc => {
                if let Some(ShapeAcc::Frame { table: Some(table) }) = &mut self.acc {
                    if let Some(row) = table.rows.last_mut() {
                        row.cells.push(TextBody::default());
                    }
                }
            }
            Tag::TxBody => {
                if let Some(ShapeAcc::TextBox { saw_text_body, .. }) = &mut self.acc {
                    *saw_text_body = true;
                }
                if self.current_body().is_some() {
                    self.in_tx_body = true;
                }
            }
            Tag::Paragraph if self.in_tx_body => {
                if let Some(body) = self.current_body() {
                    body.paragraphs.push(Paragraph::default());
                    self.in_paragraph = true;
                }
            }
            Tag::Text if self.in_paragraph => {
                self.in_text = true;
            }
            _ => {}
        }
    }

    fn text(&mut self, event_index: usize) {
        if !self.in_text {
            return;
        }
        if let Some(body) = self.current_body() {
            if let Some(paragraph) = body.paragraphs.last_mut() {
                paragraph.runs.push(event_index);
            }
        }
    }

    fn close(&mut self, tag: Tag) {
        match tag {
            Tag::Sp | Tag::Pic | Tag::GraphicFrame => {
                if let Some(acc) = self.acc.take() {
                    let shape = match acc {
                        ShapeAcc::TextBox { body, saw_text_body: true } => Shape::TextBox(body),
                        ShapeAcc::TextBox { saw_text_body: false, .. } => Shape::Other,
                        ShapeAcc::Frame { table: Some(table) } => Shape::Table(table),
                        ShapeAcc::Frame { table: None } | ShapeAcc::Other => Shape::Other,
                    };
                    self.push_shape(shape);
                }
                self.in_tx_body = false;
                self.in_paragraph = false;
                self.in_text = false;
            }
            Tag::GroupSp => {
                if let Some(children) = self.groups.pop() {
                    self.push_shape(Shape::Group(children));
                }
            }
            Tag::TxBody => self.in_tx_body = false,
            Tag::Paragraph => self.in_paragraph = false,
            Tag::Text => self.in_text = false,
            _ => {}
        }
    }

    fn push_shape(&mut self, shape: Shape) {
        match self.groups.last_mut() {
            Some(group) => group.push(shape),
            None => self.roots.push(shape),
        }
    }

    /// The text body runs are currently being collected into: the open
    /// table cell if a table is being parsed, else the shape's own body.
    fn current_body(&mut self) -> Option<&mut TextBody> {
        match self.acc.as_mut()? {
            ShapeAcc::TextBox { body, .. } => Some(body),
            ShapeAcc::Frame { table: Some(table) } => table.rows.last_mut()?.cells.last_mut(),
            _ => None,
        }
    }

    fn finish(mut self) -> Vec<Shape> {
        // Unclosed groups only happen on malformed XML; keep their shapes.
        while let Some(children) = self.groups.pop() {
            self.push_shape(Shape::Group(children));
        }
        self.roots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLIDE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:p><a:r><a:rPr lang="zh-CN" b="1"/><a:t>简体字</a:t></a:r><a:r><a:t> and latin</a:t></a:r></a:p></p:txBody></p:sp><p:pic><p:nvPicPr><p:cNvPr id="3" name="Picture 2"/></p:nvPicPr></p:pic><p:graphicFrame><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/table"><a:tbl><a:tr><a:tc><a:txBody><a:bodyPr/><a:p><a:r><a:t>测试</a:t></a:r></a:p></a:txBody></a:tc><a:tc><a:txBody><a:bodyPr/><a:p><a:r><a:t>cell2</a:t></a:r></a:p></a:txBody></a:tc></a:tr></a:tbl></a:graphicData></a:graphic></p:graphicFrame></p:spTree></p:cSld></p:sld>"#;

    const GROUPED_XML: &str = r#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:grpSp><p:sp><p:txBody><a:p><a:r><a:t>inner</a:t></a:r></a:p></p:txBody></p:sp><p:grpSp><p:sp><p:txBody><a:p><a:r><a:t>nested</a:t></a:r></a:p></p:txBody></p:sp></p:grpSp></p:grpSp><p:sp><p:txBody><a:p><a:r><a:t>after</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#;

    #[test]
    fn test_shape_tree_variants() {
        let part = SlidePart::parse(SLIDE_XML, PartKind::Slide).unwrap();
        let shapes = part.shapes();
        assert_eq!(shapes.len(), 3);
        assert!(matches!(shapes[0], Shape::TextBox(_)));
        assert!(matches!(shapes[1], Shape::Other));
        assert!(matches!(shapes[2], Shape::Table(_)));

        if let Shape::Table(table) = &shapes[2] {
            assert_eq!(table.rows.len(), 1);
            assert_eq!(table.rows[0].cells.len(), 2);
        }
    }

    #[test]
    fn test_walk_order_and_text() {
        let part = SlidePart::parse(SLIDE_XML, PartKind::Slide).unwrap();
        let locations: Vec<TextLocation> = part.text_locations().collect();
        assert_eq!(locations.len(), 4);

        let texts: Vec<String> = locations.iter().map(|&l| part.text(l).unwrap()).collect();
        assert_eq!(texts, vec!["简体字", " and latin", "测试", "cell2"]);

        let kinds: Vec<TextLocationKind> = locations.iter().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TextLocationKind::ShapeRun,
                TextLocationKind::ShapeRun,
                TextLocationKind::TableCell,
                TextLocationKind::TableCell,
            ]
        );
    }

    #[test]
    fn test_walker_is_restartable() {
        let part = SlidePart::parse(SLIDE_XML, PartKind::Slide).unwrap();
        let first: Vec<TextLocation> = part.text_locations().collect();
        let second: Vec<TextLocation> = part.text_locations().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_group_shapes_recurse_in_order() {
        let part = SlidePart::parse(GROUPED_XML, PartKind::Slide).unwrap();
        let texts: Vec<String> = part
            .text_locations()
            .map(|l| part.text(l).unwrap())
            .collect();
        assert_eq!(texts, vec!["inner", "nested", "after"]);
    }

    #[test]
    fn test_notes_part_location_kind() {
        let xml = r#"<p:notes xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:sp><p:txBody><a:p><a:r><a:t>备注</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:notes>"#;
        let part = SlidePart::parse(xml, PartKind::Notes).unwrap();
        let locations: Vec<TextLocation> = part.text_locations().collect();
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].kind, TextLocationKind::Notes);
        assert_eq!(part.text(locations[0]).unwrap(), "备注");
    }

    #[test]
    fn test_set_text_rewrites_only_the_run() {
        let mut part = SlidePart::parse(SLIDE_XML, PartKind::Slide).unwrap();
        let location = part.text_locations().next().unwrap();
        part.set_text(location, "簡體字");

        let xml = String::from_utf8(part.to_xml().unwrap()).unwrap();
        assert!(xml.contains("<a:t>簡體字</a:t>"));
        assert!(!xml.contains("简体字"));
        // Formatting attributes survive untouched.
        assert!(xml.contains(r#"<a:rPr lang="zh-CN" b="1"/>"#));
        assert!(xml.contains("测试"));
    }

    #[test]
    fn test_roundtrip_without_changes_is_lossless() {
        let part = SlidePart::parse(SLIDE_XML, PartKind::Slide).unwrap();
        let xml = String::from_utf8(part.to_xml().unwrap()).unwrap();
        assert_eq!(xml, SLIDE_XML);
    }

    #[test]
    fn test_escaped_text_roundtrip() {
        let xml = r#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:sp><p:txBody><a:p><a:r><a:t>A &amp; B 简</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#;
        let mut part = SlidePart::parse(xml, PartKind::Slide).unwrap();
        let location = part.text_locations().next().unwrap();
        assert_eq!(part.text(location).unwrap(), "A & B 简");

        part.set_text(location, "A & B 簡");
        let out = String::from_utf8(part.to_xml().unwrap()).unwrap();
        assert!(out.contains("<a:t>A &amp; B 簡</a:t>"));
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        let result = SlidePart::parse("<p:sld><unclosed", PartKind::Slide);
        assert!(matches!(result, Err(Error::Xml(_))));
    }

    #[test]
    fn test_empty_runs_yield_no_locations() {
        let xml = r#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:sp><p:txBody><a:p><a:r><a:t></a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#;
        let part = SlidePart::parse(xml, PartKind::Slide).unwrap();
        assert_eq!(part.text_locations().count(), 0);
    }
}
