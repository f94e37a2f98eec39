//! Announcement parser: the full reconstruction pipeline.

use std::path::{Path, PathBuf};

use super::backend::{LopdfBackend, PdfBackend};
use super::content::extract_pages;
use super::hierarchy::HierarchyParser;
use super::layout::LayoutAnalyzer;
use super::merge::{merge_tables_into_sections, TableMerger};
use super::options::ParseOptions;
use super::table::TableExtractor;
use crate::detect::validate_path;
use crate::error::{Error, Result};
use crate::model::{BoundingBox, Document, DocumentMetadata};

/// Parser for rental-housing announcement PDFs.
///
/// Combines layout analysis, table extraction and hierarchy parsing into one
/// section tree with each table attached to the section it belongs to.
pub struct AnnouncementParser {
    backend: Box<dyn PdfBackend>,
    source_path: PathBuf,
    options: ParseOptions,
}

impl AnnouncementParser {
    /// Open a PDF file with default options.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, ParseOptions::default())
    }

    /// Open a PDF file with custom options.
    ///
    /// Fails if the file is missing, is not named `.pdf`, lacks a PDF
    /// header, cannot be loaded or has no pages.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Self> {
        let path = path.as_ref();
        let format = validate_path(path)?;
        log::debug!("Opening {} ({})", path.display(), format);

        let backend = LopdfBackend::load_file(path)?;
        if backend.is_encrypted() {
            log::warn!("{} is encrypted; text may be unreadable", path.display());
        }

        Self::from_backend(Box::new(backend), path, options)
    }

    /// Wrap an already loaded document.
    pub fn from_backend(
        backend: Box<dyn PdfBackend>,
        source_path: impl Into<PathBuf>,
        options: ParseOptions,
    ) -> Result<Self> {
        if backend.pages().is_empty() {
            return Err(Error::EmptyDocument);
        }

        Ok(Self {
            backend,
            source_path: source_path.into(),
            options,
        })
    }

    /// Whether a path is a readable announcement PDF.
    pub fn validate_pdf<P: AsRef<Path>>(path: P) -> bool {
        let path = path.as_ref();
        match Self::open(path) {
            Ok(_) => true,
            Err(e) => {
                log::error!("Invalid PDF {}: {}", path.display(), e);
                false
            }
        }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.backend.pages().len() as u32
    }

    /// Reconstruct the document.
    pub fn parse(&self) -> Result<Document> {
        log::info!("Parsing announcement {}", self.source_path.display());

        let options = &self.options;
        let pages = extract_pages(self.backend.as_ref(), &options.pages, options.error_mode)?;

        let layouts = LayoutAnalyzer::from_options(options).analyze(&pages);
        let regions: usize = layouts.values().map(|layout| layout.table_regions.len()).sum();
        log::info!("Layout: {} pages, {} candidate table regions", layouts.len(), regions);

        let tables = TableExtractor::from_options(options).extract_tables(&pages, options.flavor);

        let table_boxes: Vec<BoundingBox> = tables.iter().filter_map(|t| t.bbox).collect();
        let mut sections = HierarchyParser::from_options(options)?.parse(&pages, &table_boxes);
        log::info!("Parsed {} top-level sections", sections.len());

        merge_tables_into_sections(&mut sections, &tables);

        let tables = if options.merge_cross_page {
            let merged = TableMerger::from_options(options).merge_cross_page_tables(tables);
            for section in &mut sections {
                section.clear_tables();
            }
            merge_tables_into_sections(&mut sections, &merged);
            merged
        } else {
            tables
        };

        let mut document = Document::new(&self.source_path);
        document.sections = sections;

        let info = self.backend.info();
        document.metadata = DocumentMetadata {
            total_sections: document.count_sections(),
            total_tables: tables.len(),
            page_count: Some(self.page_count()),
            pdf_version: Some(info.version).filter(|v| !v.is_empty()),
            title: info.title,
            author: info.author,
            created: info.created,
            modified: info.modified,
        };

        log::info!(
            "Parsed document with {} sections and {} tables",
            document.metadata.total_sections,
            document.metadata.total_tables
        );
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::parser::backend::{
        decode_text_simple, ContentOp, MediaBox, PageId, PdfValue, SourceInfo,
    };

    /// Serves one pre-decoded operation list per page.
    struct PagesBackend {
        pages: Vec<Vec<ContentOp>>,
    }

    impl PdfBackend for PagesBackend {
        fn pages(&self) -> BTreeMap<u32, PageId> {
            (0..self.pages.len())
                .map(|i| (i as u32 + 1, (i as u32 + 10, 0)))
                .collect()
        }

        fn media_box(&self, _page: PageId) -> MediaBox {
            MediaBox {
                x0: 0.0,
                y0: 0.0,
                x1: 595.0,
                y1: 842.0,
            }
        }

        fn page_content(&self, page: PageId) -> Result<Vec<u8>> {
            Ok(vec![(page.0 - 10) as u8])
        }

        fn base_font(&self, _page: PageId, _font_name: &[u8]) -> Option<String> {
            Some("Malgun".to_string())
        }

        fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>> {
            Ok(self.pages[data[0] as usize].clone())
        }

        fn decode_text(&self, _page: PageId, _font_name: &[u8], bytes: &[u8]) -> String {
            decode_text_simple(bytes)
        }

        fn info(&self) -> SourceInfo {
            SourceInfo {
                version: "1.7".to_string(),
                title: Some("공고문".to_string()),
                ..SourceInfo::default()
            }
        }
    }

    fn text(ops: &mut Vec<ContentOp>, content: &str, x: f32, top: f32, size: f32) {
        let baseline = 842.0 - top - 0.8 * size;
        ops.push(ContentOp::new("BT", vec![]));
        ops.push(ContentOp::new("Tf", vec![PdfValue::Name(b"F1".to_vec()), PdfValue::Real(size)]));
        ops.push(ContentOp::new("Td", vec![PdfValue::Real(x), PdfValue::Real(baseline)]));
        ops.push(ContentOp::new("Tj", vec![PdfValue::Str(content.as_bytes().to_vec())]));
        ops.push(ContentOp::new("ET", vec![]));
    }

    fn rect(ops: &mut Vec<ContentOp>, x0: f32, top: f32, x1: f32, bottom: f32) {
        let y = 842.0 - bottom;
        ops.push(ContentOp::new(
            "re",
            vec![
                PdfValue::Real(x0),
                PdfValue::Real(y),
                PdfValue::Real(x1 - x0),
                PdfValue::Real(bottom - top),
            ],
        ));
        ops.push(ContentOp::new("S", vec![]));
    }

    /// A ruled two-column grid starting at `top`, 20pt per row, with its text.
    fn ruled_table(ops: &mut Vec<ContentOp>, top: f32, rows: &[[&str; 2]]) {
        let height = 20.0 * rows.len() as f32;
        rect(ops, 100.0, top, 400.0, top + height);
        rect(ops, 250.0, top, 400.0, top + height);
        for r in 1..rows.len() {
            let y = top + 20.0 * r as f32;
            rect(ops, 100.0, y, 400.0, y);
        }
        for (r, row) in rows.iter().enumerate() {
            let y = top + 20.0 * r as f32 + 5.0;
            text(ops, row[0], 110.0, y, 10.0);
            text(ops, row[1], 260.0, y, 10.0);
        }
    }

    fn parser(pages: Vec<Vec<ContentOp>>, options: ParseOptions) -> AnnouncementParser {
        let backend = Box::new(PagesBackend { pages });
        AnnouncementParser::from_backend(backend, "memory.pdf", options).unwrap()
    }

    #[test]
    fn test_empty_document_rejected() {
        let result = AnnouncementParser::from_backend(
            Box::new(PagesBackend { pages: vec![] }),
            "empty.pdf",
            ParseOptions::default(),
        );
        assert!(matches!(result, Err(Error::EmptyDocument)));
    }

    #[test]
    fn test_validate_missing_file() {
        assert!(!AnnouncementParser::validate_pdf("/nonexistent/announcement.pdf"));
    }

    #[test]
    fn test_parse_attaches_tables_and_merges_pages() {
        let mut first = Vec::new();
        text(&mut first, "1. 공급개요", 72.0, 60.0, 13.0);
        text(&mut first, "공급위치는 아래와 같습니다", 72.0, 90.0, 10.0);
        ruled_table(&mut first, 600.0, &[["Type", "Area"], ["A", "59"], ["B", "84"]]);

        let mut second = Vec::new();
        ruled_table(&mut second, 50.0, &[["Type", "Area"], ["C", "74"]]);
        text(&mut second, "2. 신청자격", 72.0, 200.0, 13.0);
        text(&mut second, "무주택세대구성원", 72.0, 230.0, 10.0);

        let document = parser(vec![first, second], ParseOptions::default()).parse().unwrap();

        assert_eq!(document.sections.len(), 2);
        assert_eq!(document.metadata.page_count, Some(2));
        assert_eq!(document.metadata.pdf_version.as_deref(), Some("1.7"));
        assert_eq!(document.metadata.title.as_deref(), Some("공고문"));
        assert_eq!(document.metadata.total_sections, 2);
        assert_eq!(document.metadata.total_tables, 1);

        let overview = &document.sections[0];
        assert_eq!(overview.content, vec!["공급위치는 아래와 같습니다"]);
        assert_eq!(overview.tables.len(), 1);
        let table = &overview.tables[0];
        assert_eq!(table.frame.columns, vec!["Type", "Area"]);
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.metadata.merged_from_pages, Some(vec![0, 1]));

        let eligibility = &document.sections[1];
        assert!(eligibility.tables.is_empty());
        assert_eq!(eligibility.content, vec!["무주택세대구성원"]);
        assert_eq!(document.get_all_tables().len(), 1);
    }

    #[test]
    fn test_cross_page_merge_can_be_disabled() {
        let mut first = Vec::new();
        text(&mut first, "1. 공급개요", 72.0, 60.0, 13.0);
        ruled_table(&mut first, 600.0, &[["Type", "Area"], ["A", "59"], ["B", "84"]]);
        let mut second = Vec::new();
        ruled_table(&mut second, 50.0, &[["Type", "Area"], ["C", "74"]]);

        let options = ParseOptions::default().with_cross_page_merge(false);
        let document = parser(vec![first, second], options).parse().unwrap();

        assert_eq!(document.metadata.total_tables, 2);
        assert_eq!(document.sections[0].tables.len(), 2);
    }
}
