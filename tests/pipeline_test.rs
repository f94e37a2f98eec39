//! End-to-end tests over PDFs generated in-process.

use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document as PdfDocument, Object, Stream};
use tempfile::TempDir;

use lhpdf::{
    parse_file, parse_file_with_options, render, validate_file, AnnouncementParser, Error,
    JsonFormat, ParseOptions,
};

const PAGE_HEIGHT: f32 = 842.0;

/// Builds page content in top-left coordinates.
#[derive(Default)]
struct PageBuilder {
    ops: Vec<Operation>,
}

impl PageBuilder {
    fn text(mut self, content: &str, x: f32, top: f32, size: f32) -> Self {
        let baseline = PAGE_HEIGHT - top - 0.8 * size;
        self.ops.push(Operation::new("BT", vec![]));
        self.ops
            .push(Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Real(size)]));
        self.ops
            .push(Operation::new("Td", vec![Object::Real(x), Object::Real(baseline)]));
        self.ops
            .push(Operation::new("Tj", vec![Object::string_literal(content)]));
        self.ops.push(Operation::new("ET", vec![]));
        self
    }

    fn stroke_rect(mut self, x0: f32, top: f32, x1: f32, bottom: f32) -> Self {
        self.ops.push(Operation::new(
            "re",
            vec![
                Object::Real(x0),
                Object::Real(PAGE_HEIGHT - bottom),
                Object::Real(x1 - x0),
                Object::Real(bottom - top),
            ],
        ));
        self.ops.push(Operation::new("S", vec![]));
        self
    }

    fn rule(mut self, x0: f32, x1: f32, y: f32) -> Self {
        self.ops.push(Operation::new(
            "m",
            vec![Object::Real(x0), Object::Real(PAGE_HEIGHT - y)],
        ));
        self.ops.push(Operation::new(
            "l",
            vec![Object::Real(x1), Object::Real(PAGE_HEIGHT - y)],
        ));
        self.ops.push(Operation::new("S", vec![]));
        self
    }

    /// Ruled two-column table at x 100..400, 20pt per row.
    fn table(mut self, top: f32, rows: &[[&str; 2]]) -> Self {
        let bottom = top + 20.0 * rows.len() as f32;
        self = self
            .stroke_rect(100.0, top, 400.0, bottom)
            .stroke_rect(250.0, top, 400.0, bottom);
        for r in 1..rows.len() {
            self = self.rule(100.0, 400.0, top + 20.0 * r as f32);
        }
        for (r, row) in rows.iter().enumerate() {
            let y = top + 20.0 * r as f32 + 5.0;
            self = self.text(row[0], 110.0, y, 10.0).text(row[1], 260.0, y, 10.0);
        }
        self
    }
}

/// Write a PDF with one page per builder and return its path.
fn write_pdf(dir: &TempDir, name: &str, pages: Vec<PageBuilder>, title: Option<&str>) -> PathBuf {
    let mut doc = PdfDocument::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    for page in pages {
        let content = Content { operations: page.ops };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(count),
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(595),
                Object::Integer(842),
            ],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    if let Some(title) = title {
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(title),
        });
        doc.trailer.set("Info", info_id);
    }

    let path = dir.path().join(name);
    doc.save(&path).unwrap();
    path
}

/// Two pages: an overview section with a table that continues on the next
/// page, followed by an eligibility section.
fn announcement(dir: &TempDir) -> PathBuf {
    let first = PageBuilder::default()
        .text("1. Overview", 72.0, 60.0, 13.0)
        .text("Location: Seoul", 72.0, 90.0, 10.0)
        .table(120.0, &[["Type", "Area"], ["A", "59"], ["B", "84"]]);
    let second = PageBuilder::default()
        .table(50.0, &[["Type", "Area"], ["C", "74"]])
        .text("2. Eligibility", 72.0, 200.0, 13.0)
        .text("Homeless households only", 72.0, 230.0, 10.0);

    write_pdf(dir, "announcement.pdf", vec![first, second], Some("Rental Notice"))
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_pipeline_attaches_merged_table() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let doc = parse_file(announcement(&dir)).unwrap();

    assert_eq!(doc.sections.len(), 2);
    assert_eq!(doc.metadata.total_sections, 2);
    assert_eq!(doc.metadata.total_tables, 1);
    assert_eq!(doc.metadata.page_count, Some(2));
    assert_eq!(doc.metadata.title.as_deref(), Some("Rental Notice"));

    let overview = &doc.sections[0];
    assert_eq!(overview.title, "1. Overview");
    assert_eq!(overview.level, 1);
    assert_eq!(overview.content, vec!["Location: Seoul"]);
    assert_eq!(overview.tables.len(), 1);

    let table = &overview.tables[0];
    assert_eq!(table.frame.columns, vec!["Type", "Area"]);
    assert_eq!(table.frame.rows, vec![vec!["A", "59"], vec!["B", "84"], vec!["C", "74"]]);
    assert_eq!(table.metadata.merged_from_pages, Some(vec![0, 1]));
    let bbox = table.bbox.unwrap();
    assert_eq!(bbox.page, 0);
    assert!((bbox.y0 - 120.0).abs() < 0.5);
    assert!((bbox.y1 - 90.0).abs() < 0.5);

    let eligibility = &doc.sections[1];
    assert_eq!(eligibility.content, vec!["Homeless households only"]);
    assert!(eligibility.tables.is_empty());
}

#[test]
fn test_pipeline_without_cross_page_merge() {
    let dir = TempDir::new().unwrap();
    let options = ParseOptions::new().with_cross_page_merge(false);
    let doc = parse_file_with_options(announcement(&dir), options).unwrap();

    assert_eq!(doc.metadata.total_tables, 2);
    assert_eq!(doc.get_all_tables().len(), 2);
    assert_eq!(doc.sections[0].tables.len(), 1);
    assert_eq!(doc.sections[1].tables.len(), 1);
}

#[test]
fn test_page_selection() {
    let dir = TempDir::new().unwrap();
    let options = ParseOptions::new().with_page_range(2..=2);
    let doc = parse_file_with_options(announcement(&dir), options).unwrap();

    assert_eq!(doc.sections.len(), 1);
    assert_eq!(doc.sections[0].title, "2. Eligibility");
    assert_eq!(doc.metadata.total_tables, 1);
    assert_eq!(doc.sections[0].tables[0].page, 1);
}

#[test]
fn test_page_selection_past_end() {
    let dir = TempDir::new().unwrap();
    let options = ParseOptions::new().with_page_range(2..=5);
    let result = parse_file_with_options(announcement(&dir), options);
    assert!(matches!(result, Err(Error::PageOutOfRange(5, 2))));
}

#[test]
fn test_title_and_subtitle() {
    let dir = TempDir::new().unwrap();
    let page = PageBuilder::default()
        .text("Happy Housing Tenant Notice", 72.0, 40.0, 18.0)
        .text("(2025 first round)", 72.0, 65.0, 11.0)
        .text("Applicants must read this notice.", 72.0, 90.0, 10.0)
        .text("1. Overview", 72.0, 120.0, 13.0)
        .text("3-1. Income limits", 72.0, 140.0, 10.0)
        .text("Below 100 percent of average income", 72.0, 160.0, 10.0);
    let path = write_pdf(&dir, "notice.pdf", vec![page], None);

    let doc = parse_file(&path).unwrap();
    assert_eq!(doc.sections.len(), 2);
    assert_eq!(doc.metadata.total_sections, 4);

    let title = &doc.sections[0];
    assert_eq!(title.level, 0);
    assert_eq!(title.title, "Happy Housing Tenant Notice");
    assert_eq!(title.children.len(), 1);
    assert_eq!(title.children[0].title, "(2025 first round)");
    assert_eq!(title.content, vec!["Applicants must read this notice."]);

    let income = doc.find_section("INCOME").unwrap();
    assert_eq!(income.level, 2);
    assert_eq!(income.content, vec!["Below 100 percent of average income"]);
}

#[test]
fn test_indented_prose_stays_section_content() {
    let dir = TempDir::new().unwrap();
    let page = PageBuilder::default()
        .text("1. Overview", 72.0, 60.0, 13.0)
        .text("Supply is limited to this district", 92.0, 85.0, 10.0)
        .text("Units are allocated by lottery", 92.0, 105.0, 10.0)
        .text("2. Eligibility", 72.0, 135.0, 13.0)
        .text("Homeless households only", 92.0, 160.0, 10.0)
        .text("Income below the published limit", 92.0, 180.0, 10.0);
    let path = write_pdf(&dir, "prose.pdf", vec![page], None);

    let doc = parse_file(&path).unwrap();
    assert_eq!(doc.metadata.total_tables, 0);
    assert_eq!(doc.sections.len(), 2);
    assert_eq!(
        doc.sections[0].content,
        vec!["Supply is limited to this district", "Units are allocated by lottery"]
    );
    assert_eq!(
        doc.sections[1].content,
        vec!["Homeless households only", "Income below the published limit"]
    );
}

#[test]
fn test_json_output_shape() {
    let dir = TempDir::new().unwrap();
    let doc = parse_file(announcement(&dir)).unwrap();
    let json = render::to_json(&doc, JsonFormat::Compact).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert!(value["source"].as_str().unwrap().ends_with("announcement.pdf"));
    assert_eq!(value["metadata"]["total_sections"], 2);
    assert_eq!(value["metadata"]["total_tables"], 1);

    let section = &value["sections"][0];
    assert_eq!(section["level"], 1);
    assert_eq!(section["title"], "1. Overview");
    let table = &section["tables"][0];
    assert_eq!(table["columns"], serde_json::json!(["Type", "Area"]));
    assert_eq!(table["shape"], serde_json::json!([3, 2]));
    assert_eq!(table["data"][2]["Type"], "C");
    assert_eq!(table["metadata"]["flavor"], "lattice");
    assert_eq!(table["metadata"]["merged_from_pages"], serde_json::json!([0, 1]));
}

#[test]
fn test_validation_failures() {
    let dir = TempDir::new().unwrap();

    let missing = dir.path().join("missing.pdf");
    assert!(matches!(AnnouncementParser::open(&missing), Err(Error::FileNotFound(_))));
    assert!(!validate_file(&missing));

    let text = dir.path().join("notice.txt");
    std::fs::write(&text, b"%PDF-1.4\n").unwrap();
    assert!(matches!(AnnouncementParser::open(&text), Err(Error::NotPdfExtension(_))));

    let fake = dir.path().join("fake.pdf");
    std::fs::write(&fake, b"<html>not a pdf</html>").unwrap();
    assert!(matches!(AnnouncementParser::open(&fake), Err(Error::UnknownFormat)));
    assert!(!validate_file(&fake));
}

#[test]
fn test_document_without_pages() {
    let dir = TempDir::new().unwrap();
    let path = write_pdf(&dir, "empty.pdf", Vec::new(), None);

    let result = AnnouncementParser::open(&path);
    assert!(matches!(result, Err(Error::EmptyDocument)));
    assert!(!validate_file(&path));
}

#[test]
fn test_valid_file() {
    let dir = TempDir::new().unwrap();
    let path = announcement(&dir);
    assert!(validate_file(&path));
    assert!(lhpdf::is_pdf(&path));

    let parser = AnnouncementParser::open(&path).unwrap();
    assert_eq!(parser.page_count(), 2);
    assert_eq!(parser.source_path(), Path::new(&path));
}
