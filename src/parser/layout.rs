//! Layout analysis for announcement pages.
//!
//! Turns every text span into a [`TextBlock`] and flags likely table regions
//! from column alignment alone. The result is advisory: authoritative tables
//! come from the table extractor.

use std::collections::BTreeMap;

use super::content::PageContent;
use super::options::ParseOptions;
use crate::model::{BoundingBox, TextBlock};

/// Layout information for one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    /// 0-indexed page number
    pub page: usize,
    /// One block per text span, in content-stream order
    pub text_blocks: Vec<TextBlock>,
    /// Candidate table regions
    pub table_regions: Vec<BoundingBox>,
    /// `(width, height)` in points
    pub page_size: (f32, f32),
}

/// Alignment-based layout analyzer.
#[derive(Debug, Clone)]
pub struct LayoutAnalyzer {
    /// Vertical tolerance for grouping blocks into rows
    pub row_tolerance: f32,
    /// Horizontal tolerance for two blocks to share a column
    pub column_tolerance: f32,
    /// Minimum number of consecutive table-like rows
    pub min_table_rows: usize,
}

impl Default for LayoutAnalyzer {
    fn default() -> Self {
        Self {
            row_tolerance: 3.0,
            column_tolerance: 5.0,
            min_table_rows: 3,
        }
    }
}

impl LayoutAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_options(options: &ParseOptions) -> Self {
        Self {
            row_tolerance: options.row_tolerance,
            column_tolerance: options.column_tolerance,
            min_table_rows: options.min_table_rows,
        }
    }

    /// Analyze every page.
    pub fn analyze(&self, pages: &[PageContent]) -> BTreeMap<usize, PageLayout> {
        pages
            .iter()
            .map(|page| (page.index, self.analyze_page(page)))
            .collect()
    }

    /// Text blocks of every page, keyed by page index.
    pub fn extract_text_blocks(&self, pages: &[PageContent]) -> BTreeMap<usize, Vec<TextBlock>> {
        pages
            .iter()
            .map(|page| (page.index, Self::text_blocks(page)))
            .collect()
    }

    /// Analyze a single page.
    pub fn analyze_page(&self, page: &PageContent) -> PageLayout {
        let text_blocks = Self::text_blocks(page);
        let table_regions = self.detect_table_regions(&text_blocks);

        if !table_regions.is_empty() {
            log::debug!(
                "Page {}: {} blocks, {} candidate table regions",
                page.index,
                text_blocks.len(),
                table_regions.len()
            );
        }

        PageLayout {
            page: page.index,
            text_blocks,
            table_regions,
            page_size: (page.width, page.height),
        }
    }

    fn text_blocks(page: &PageContent) -> Vec<TextBlock> {
        page.spans
            .iter()
            .filter(|s| !s.text.trim().is_empty())
            .map(|s| {
                TextBlock::new(
                    s.text.trim(),
                    s.bbox(page.index),
                    Some(s.font_size),
                    Some(s.font_name.clone()),
                )
            })
            .collect()
    }

    /// Find runs of consecutive aligned rows.
    pub fn detect_table_regions(&self, blocks: &[TextBlock]) -> Vec<BoundingBox> {
        let rows = self.group_into_rows(blocks);
        let mut regions = Vec::new();
        let mut run: Vec<&[&TextBlock]> = Vec::new();

        for (i, row) in rows.iter().enumerate() {
            if self.is_table_row(i, &rows) {
                run.push(row);
            } else {
                self.close_run(&mut run, &mut regions);
            }
        }
        self.close_run(&mut run, &mut regions);

        regions
    }

    fn close_run(&self, run: &mut Vec<&[&TextBlock]>, regions: &mut Vec<BoundingBox>) {
        if run.len() >= self.min_table_rows {
            if let Some(bbox) = enclosing_box(run.iter().flat_map(|row| row.iter().copied())) {
                regions.push(bbox);
            }
        }
        run.clear();
    }

    /// Group blocks into rows by top edge; each row is sorted by x.
    ///
    /// A row is anchored at its first block: later blocks join while their
    /// top is within `row_tolerance` of the anchor.
    pub fn group_into_rows<'b>(&self, blocks: &'b [TextBlock]) -> Vec<Vec<&'b TextBlock>> {
        let mut sorted: Vec<&TextBlock> = blocks.iter().collect();
        sorted.sort_by(|a, b| a.y_position().total_cmp(&b.y_position()));

        let mut rows: Vec<Vec<&TextBlock>> = Vec::new();
        let mut anchor = f32::NAN;

        for block in sorted {
            match rows.last_mut() {
                Some(row) if (block.y_position() - anchor).abs() <= self.row_tolerance => {
                    row.push(block);
                }
                _ => {
                    anchor = block.y_position();
                    rows.push(vec![block]);
                }
            }
        }

        for row in &mut rows {
            row.sort_by(|a, b| a.x_position().total_cmp(&b.x_position()));
        }
        rows
    }

    /// A row is table-like if it has two or more blocks and is aligned with
    /// at least two other rows.
    fn is_table_row(&self, index: usize, rows: &[Vec<&TextBlock>]) -> bool {
        let row = &rows[index];
        if row.len() < 2 {
            return false;
        }

        let aligned_rows = rows
            .iter()
            .enumerate()
            .filter(|(j, other)| *j != index && self.rows_aligned(row, other))
            .count();

        aligned_rows >= 2
    }

    /// At least two blocks of `row` start in a column used by `other`.
    fn rows_aligned(&self, row: &[&TextBlock], other: &[&TextBlock]) -> bool {
        let matched = row
            .iter()
            .filter(|a| {
                other
                    .iter()
                    .any(|b| (a.x_position() - b.x_position()).abs() < self.column_tolerance)
            })
            .count();
        matched >= 2
    }
}

/// Smallest box containing every block, on the first block's page.
fn enclosing_box<'b>(blocks: impl Iterator<Item = &'b TextBlock>) -> Option<BoundingBox> {
    blocks
        .map(|b| b.bbox)
        .reduce(|acc, bbox| acc.union(&bbox))
}
