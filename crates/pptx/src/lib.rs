//! PPTX (Office Open XML) package model for text rewriting.
//!
//! A .pptx file is a ZIP archive of XML parts. This crate loads the whole
//! archive, rewrites text runs inside slide and notes parts while keeping
//! every other byte untouched, and writes the result back atomically.

pub mod convert;
pub mod package;
pub mod slide;
pub mod walker;

pub use convert::{convert_file, ConvertOutcome};
pub use package::Document;
pub use slide::{PartKind, Shape, SlidePart, TextLocation, TextLocationKind};
