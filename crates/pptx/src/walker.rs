//! Document text walker.
//!
//! Produces every text location of a parsed part lazily and in document
//! order: shapes as they appear, groups recursed depth-first, table cells
//! row-major, then paragraph and run order within each text body.

use std::collections::VecDeque;

use crate::slide::{PartKind, Shape, TextBody, TextLocation, TextLocationKind};

/// Iterator over the text locations of one part.
///
/// Returned by [`crate::SlidePart::text_locations`]. Finite and
/// restartable: walking the same part twice yields the same sequence.
pub struct TextLocations<'a> {
    /// Stack of shape lists still to visit, innermost group last.
    stack: Vec<std::slice::Iter<'a, Shape>>,
    /// Locations of the shape currently being drained.
    pending: VecDeque<TextLocation>,
    part_kind: PartKind,
}

impl<'a> TextLocations<'a> {
    pub(crate) fn new(shapes: &'a [Shape], part_kind: PartKind) -> Self {
        Self {
            stack: vec![shapes.iter()],
            pending: VecDeque::new(),
            part_kind,
        }
    }

    /// Kind to report for a run in a plain text frame.
    fn run_kind(&self) -> TextLocationKind {
        match self.part_kind {
            PartKind::Slide => TextLocationKind::ShapeRun,
            PartKind::Notes => TextLocationKind::Notes,
        }
    }

    /// Kind to report for a run in a table cell.
    fn cell_kind(&self) -> TextLocationKind {
        match self.part_kind {
            PartKind::Slide => TextLocationKind::TableCell,
            PartKind::Notes => TextLocationKind::Notes,
        }
    }

    fn enqueue_body(&mut self, body: &TextBody, kind: TextLocationKind) {
        for paragraph in &body.paragraphs {
            for &event in &paragraph.runs {
                self.pending.push_back(TextLocation { kind, event });
            }
        }
    }
}

impl<'a> Iterator for TextLocations<'a> {
    type Item = TextLocation;

    fn next(&mut self) -> Option<TextLocation> {
        loop {
            if let Some(location) = self.pending.pop_front() {
                return Some(location);
            }

            let shape = loop {
                let top = self.stack.last_mut()?;
                match top.next() {
                    Some(shape) => break shape,
                    None => {
                        self.stack.pop();
                    }
                }
            };

            match shape {
                Shape::TextBox(body) => {
                    let kind = self.run_kind();
                    self.enqueue_body(body, kind);
                }
                Shape::Table(table) => {
                    let kind = self.cell_kind();
                    for row in &table.rows {
                        for cell in &row.cells {
                            self.enqueue_body(cell, kind);
                        }
                    }
                }
                Shape::Group(children) => self.stack.push(children.iter()),
                Shape::Other => {}
            }
        }
    }
}
