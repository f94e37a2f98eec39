//! Document model types.
//!
//! This module defines the section tree produced by the parser: page-relative
//! geometry, positioned text lines, extracted tables, hierarchical sections and
//! the document aggregate. The types are plain data; every `to_dict()` yields
//! the exported JSON shape.

mod document;
mod geometry;
mod section;
mod table;
mod text;

pub use document::{Document, DocumentMetadata};
pub use geometry::BoundingBox;
pub use section::Section;
pub use table::{Flavor, TableData, TableFrame, TableMetadata};
pub use text::{font_style_flags, TextBlock};
