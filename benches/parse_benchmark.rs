//! Benchmarks for lhpdf structure reconstruction.
//!
//! Run with: cargo bench
//!
//! These benchmarks run the analysis stages over synthetic page content, so
//! they measure the algorithms without PDF decoding.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use lhpdf::model::{BoundingBox, Flavor, Section, TableData, TableFrame, TableMetadata};
use lhpdf::parser::{
    merge_tables_into_sections, FlavorSelection, HierarchyParser, LayoutAnalyzer, PageContent,
    Segment, TableExtractor, TableMerger, TextSpan,
};

/// A page with a heading, prose lines and a ruled table of `rows` rows.
fn synthetic_page(index: usize, rows: usize) -> PageContent {
    let mut page = PageContent::new(index, 595.0, 842.0);
    let heading = format!("{}. 공급개요", index + 1);
    page.spans.push(TextSpan::new(heading, 72.0, 140.0, 60.0, 13.0, "Malgun"));
    for i in 0..10 {
        let top = 90.0 + i as f32 * 15.0;
        let line = "공급위치 및 공급대상 안내";
        page.spans.push(TextSpan::new(line, 72.0, 250.0, top, 10.0, "Malgun"));
    }

    let top = 260.0;
    let bottom = top + rows as f32 * 20.0;
    for x in [100.0, 200.0, 300.0, 400.0] {
        page.segments.push(Segment::vertical(x, top, bottom));
    }
    for r in 0..=rows {
        page.segments.push(Segment::horizontal(top + r as f32 * 20.0, 100.0, 400.0));
    }
    for r in 0..rows {
        let y = top + r as f32 * 20.0 + 5.0;
        page.spans.push(TextSpan::new(format!("A{r}"), 110.0, 125.0, y, 10.0, "Malgun"));
        page.spans.push(TextSpan::new(format!("{}", 59 + r), 210.0, 220.0, y, 10.0, "Malgun"));
        page.spans.push(TextSpan::new(format!("{}", 100 * r), 310.0, 330.0, y, 10.0, "Malgun"));
    }
    page
}

fn synthetic_document(pages: usize) -> Vec<PageContent> {
    (0..pages).map(|i| synthetic_page(i, 12)).collect()
}

fn bench_layout(c: &mut Criterion) {
    let pages = synthetic_document(10);
    let analyzer = LayoutAnalyzer::new();
    c.bench_function("layout_analyze_10_pages", |b| {
        b.iter(|| analyzer.analyze(black_box(&pages)));
    });
}

fn bench_table_extraction(c: &mut Criterion) {
    let extractor = TableExtractor::new();
    let mut group = c.benchmark_group("table_extraction");

    for page_count in [1, 10, 50] {
        let pages = synthetic_document(page_count);
        group.bench_with_input(BenchmarkId::from_parameter(page_count), &pages, |b, pages| {
            b.iter(|| extractor.extract_tables(black_box(pages), FlavorSelection::Both));
        });
    }

    group.finish();
}

fn bench_hierarchy(c: &mut Criterion) {
    let pages = synthetic_document(10);
    let parser = HierarchyParser::new().unwrap();
    let regions: Vec<BoundingBox> = (0..10)
        .map(|i| BoundingBox::new(100.0, 260.0, 400.0, 500.0, i))
        .collect();

    c.bench_function("hierarchy_parse_10_pages", |b| {
        b.iter(|| parser.parse(black_box(&pages), black_box(&regions)));
    });
}

fn bench_merging(c: &mut Criterion) {
    let tables: Vec<TableData> = (0..50)
        .map(|page| {
            let frame = TableFrame::from_rows(vec![vec!["A".to_string(), "59".to_string()]; 10]);
            let top = if page % 2 == 0 { 400.0 } else { 50.0 };
            TableData::new(
                frame,
                Some(BoundingBox::new(100.0, top, 400.0, top + 200.0, page)),
                page,
                TableMetadata::new(Flavor::Lattice, 95.0),
            )
        })
        .collect();
    let sections: Vec<Section> = (0..50)
        .map(|page| {
            Section::new(1, format!("{}. 항목", page + 1))
                .with_bbox(BoundingBox::new(72.0, 60.0, 300.0, 73.0, page))
        })
        .collect();

    let merger = TableMerger::new();
    c.bench_function("merge_cross_page_50_tables", |b| {
        b.iter(|| merger.merge_cross_page_tables(black_box(tables.clone())));
    });

    c.bench_function("assign_50_tables", |b| {
        b.iter(|| {
            let mut sections = sections.clone();
            merge_tables_into_sections(&mut sections, black_box(&tables))
        });
    });
}

criterion_group!(
    benches,
    bench_layout,
    bench_table_extraction,
    bench_hierarchy,
    bench_merging
);
criterion_main!(benches);
