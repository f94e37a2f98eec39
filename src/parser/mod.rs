//! PDF parsing module.
//!
//! Pages are read through a [`PdfBackend`], interpreted into positioned text
//! spans and ruling segments, and then analyzed for layout, tables and
//! section hierarchy by the [`AnnouncementParser`] pipeline.

mod announcement;
mod backend;
mod content;
mod hierarchy;
mod layout;
mod merge;
mod options;
mod table;

pub use announcement::AnnouncementParser;
pub use backend::{
    decode_text_simple, parse_pdf_date, ContentOp, LopdfBackend, MediaBox, PageId, PdfBackend,
    PdfValue, SourceInfo,
};
pub use content::{extract_pages, ContentInterpreter, Orientation, PageContent, Segment, TextSpan};
pub use hierarchy::{
    base_x_position, consolidate_bullets, consolidate_lines, indentation_level, HeadingClassifier,
    HierarchyParser, SectionTreeBuilder,
};
pub use layout::{LayoutAnalyzer, PageLayout};
pub use merge::{find_best_section_for_table, merge_tables_into_sections, TableMerger};
pub use options::{ErrorMode, PageSelection, ParseOptions};
pub use table::{
    clean_cells, is_numeric, quality_score, FlavorSelection, LatticeConfig, LatticeDetector,
    StreamConfig, StreamDetector, TableCandidate, TableDetector, TableExtractor,
};
