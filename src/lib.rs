//! # lhpdf
//!
//! Section and table structure reconstruction for Korean rental-housing
//! announcement PDFs.
//!
//! Announcements mix numbered Korean headings, bullet paragraphs and ruled or
//! borderless tables without any markup. This library rebuilds the document
//! as a tree of titled sections, each carrying its prose lines and the tables
//! that belong to it. Tables continuing on the next page are merged.
//!
//! ## Quick Start
//!
//! ```no_run
//! use lhpdf::{parse_file, render};
//!
//! fn main() -> lhpdf::Result<()> {
//!     let doc = parse_file("announcement.pdf")?;
//!
//!     for table in doc.get_all_tables() {
//!         println!("page {}: {:?}", table.page, table.frame.shape());
//!     }
//!
//!     let json = render::to_json(&doc, render::JsonFormat::Pretty)?;
//!     println!("{}", json);
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! - **Layout analysis**: advisory table regions from column alignment
//! - **Table extraction**: ruling-line (lattice) and alignment (stream)
//!   detectors, confidence filtering and de-duplication
//! - **Hierarchy parsing**: heading classification by pattern, font and
//!   indentation, stack-based tree assembly, bullet consolidation
//! - **Integration**: table-to-section scoring and cross-page table merging

pub mod detect;
pub mod error;
pub mod model;
pub mod parser;
pub mod render;

// Re-export commonly used types
pub use detect::{
    detect_format_from_bytes, detect_format_from_path, is_pdf, validate_path, PdfFormat,
};
pub use error::{Error, Result};
pub use model::{
    BoundingBox, Document, DocumentMetadata, Flavor, Section, TableData, TableFrame, TableMetadata,
    TextBlock,
};
pub use parser::{AnnouncementParser, ErrorMode, FlavorSelection, PageSelection, ParseOptions};
pub use render::JsonFormat;

use std::path::Path;

/// Parse an announcement PDF into its section tree.
///
/// # Example
///
/// ```no_run
/// use lhpdf::parse_file;
///
/// let doc = parse_file("announcement.pdf").unwrap();
/// if let Some(section) = doc.find_section("신청자격") {
///     println!("{}", section);
/// }
/// ```
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    let parser = AnnouncementParser::open(path)?;
    parser.parse()
}

/// Parse an announcement PDF with custom options.
///
/// # Example
///
/// ```no_run
/// use lhpdf::{parse_file_with_options, FlavorSelection, ParseOptions};
///
/// let options = ParseOptions::new()
///     .with_flavor(FlavorSelection::Lattice)
///     .with_page_range(1..=5);
/// let doc = parse_file_with_options("announcement.pdf", options).unwrap();
/// ```
pub fn parse_file_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Document> {
    let parser = AnnouncementParser::open_with_options(path, options)?;
    parser.parse()
}

/// Whether a path is a readable PDF with at least one page.
pub fn validate_file<P: AsRef<Path>>(path: P) -> bool {
    AnnouncementParser::validate_pdf(path)
}

/// Parse an announcement PDF and serialize it to JSON.
///
/// # Example
///
/// ```no_run
/// use lhpdf::{to_json, JsonFormat};
///
/// let json = to_json("announcement.pdf", JsonFormat::Pretty).unwrap();
/// std::fs::write("announcement.json", json).unwrap();
/// ```
pub fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    let doc = parse_file(path)?;
    render::to_json(&doc, format)
}
