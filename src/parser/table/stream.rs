//! Table detection using text position analysis (Stream mode).
//!
//! Detects tables by analyzing text alignment patterns without relying on
//! graphical lines: spans are grouped into rows, recurring left edges become
//! column boundaries, and runs of well-aligned rows become tables.

use std::collections::{HashMap, HashSet};

use super::{accuracy, TableCandidate, TableDetector};
use crate::error::Result;
use crate::model::{BoundingBox, Flavor};
use crate::parser::content::{PageContent, TextSpan};

/// Width of the buckets left edges are counted in (points).
const BUCKET_SIZE: f32 = 5.0;

/// Tolerance for a span edge to sit on a column boundary.
const ALIGN_TOLERANCE: f32 = 5.0;

/// How far a span may run into the next column and still be unambiguous.
const OVERRUN_TOLERANCE: f32 = 2.0;

/// Leading symbols of bulleted list items.
const BULLET_MARKERS: &[&str] = &[
    "-", "–", "—", "•", "·", "*", "○", "▪", "◦", "▸", "▹", "►", "■", "●", "※", "□", "◆", "◇", "▶",
    "▷", "☞", "➤", "➜",
];

/// A row of text spans.
#[derive(Debug, Clone)]
struct Row<'a> {
    spans: Vec<&'a TextSpan>,
}

impl Row<'_> {
    fn top(&self) -> f32 {
        self.spans.iter().map(|s| s.top).fold(f32::INFINITY, f32::min)
    }

    fn bottom(&self) -> f32 {
        self.spans.iter().map(|s| s.bottom).fold(f32::NEG_INFINITY, f32::max)
    }
}

/// Stream detector configuration.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Minimum number of rows to consider as table
    pub min_rows: usize,
    /// Minimum number of columns to consider as table
    pub min_columns: usize,
    /// Maximum number of columns (above this, likely word-level splitting)
    pub max_columns: usize,
    /// Y tolerance for grouping spans into rows (fraction of font size)
    pub y_tolerance_factor: f32,
    /// Minimum column alignment ratio (0.0-1.0)
    pub min_alignment_ratio: f32,
    /// Minimum gap between columns (points)
    pub min_column_gap: f32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            max_columns: 6,
            y_tolerance_factor: 0.4,
            min_alignment_ratio: 0.3,
            min_column_gap: 15.0,
        }
    }
}

/// Detects borderless tables from text alignment.
#[derive(Debug, Clone, Default)]
pub struct StreamDetector {
    config: StreamConfig,
}

impl StreamDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: StreamConfig) -> Self {
        Self { config }
    }

    /// Detect tables on a single page.
    pub fn detect_page(&self, page: &PageContent) -> Vec<TableCandidate> {
        let spans: Vec<&TextSpan> =
            page.spans.iter().filter(|s| !s.text.trim().is_empty()).collect();

        if spans.len() < self.config.min_rows * self.config.min_columns {
            return Vec::new();
        }

        let rows = self.group_into_rows(spans);
        if rows.len() < self.config.min_rows {
            return Vec::new();
        }

        let columns = self.detect_columns(&rows);
        log::debug!(
            "Stream: page {} has {} rows, column edges {:?}",
            page.index,
            rows.len(),
            columns
        );
        if columns.len() < self.config.min_columns {
            return Vec::new();
        }

        let mut candidates = Vec::new();
        for (start, end) in self.find_table_regions(&rows, &columns) {
            let table_rows = &rows[start..=end];

            // Re-detect columns for this specific region
            let table_columns = self.detect_columns(table_rows);

            if table_columns.len() < self.config.min_columns {
                continue;
            }
            if table_columns.len() > self.config.max_columns {
                log::debug!(
                    "Stream: skipping region, too many columns ({} > {})",
                    table_columns.len(),
                    self.config.max_columns
                );
                continue;
            }
            if self.is_list_pattern(table_rows, &table_columns) {
                log::debug!("Stream: skipping region, detected as list pattern");
                continue;
            }

            candidates.push(self.build_table(page.index, table_rows, &table_columns));
        }

        candidates
    }

    /// Group spans into rows by top edge, top to bottom.
    fn group_into_rows<'a>(&self, mut spans: Vec<&'a TextSpan>) -> Vec<Row<'a>> {
        spans.sort_by(|a, b| a.top.total_cmp(&b.top).then(a.x0.total_cmp(&b.x0)));

        let mut rows: Vec<Row<'a>> = Vec::new();
        let mut current_top: Option<f32> = None;

        for span in spans {
            let tolerance = span.font_size * self.config.y_tolerance_factor;
            match (current_top, rows.last_mut()) {
                (Some(top), Some(row)) if (span.top - top).abs() <= tolerance => {
                    row.spans.push(span)
                }
                _ => {
                    current_top = Some(span.top);
                    rows.push(Row { spans: vec![span] });
                }
            }
        }

        for row in &mut rows {
            row.spans.sort_by(|a, b| a.x0.total_cmp(&b.x0));
        }
        rows
    }

    /// Detect column boundaries from recurring left edges.
    ///
    /// Only rows with several spans count as evidence. Single-span rows are
    /// prose or headings whose indentation says nothing about columns.
    fn detect_columns(&self, rows: &[Row]) -> Vec<f32> {
        let evidence: Vec<&Row> = rows.iter().filter(|r| is_multi_span(r)).collect();
        if evidence.len() < self.config.min_rows {
            return Vec::new();
        }

        let mut edge_counts: HashMap<i32, usize> = HashMap::new();
        for row in &evidence {
            // Each bucket counts once per row
            let buckets: HashSet<i32> = row
                .spans
                .iter()
                .map(|s| (s.x0 / BUCKET_SIZE).round() as i32)
                .collect();
            for bucket in buckets {
                *edge_counts.entry(bucket).or_insert(0) += 1;
            }
        }

        let min_occurrences =
            ((evidence.len() as f32 * self.config.min_alignment_ratio) as usize).max(2);

        let mut column_edges: Vec<f32> = edge_counts
            .iter()
            .filter(|(_, count)| **count >= min_occurrences)
            .map(|(bucket, _)| *bucket as f32 * BUCKET_SIZE)
            .collect();
        column_edges.sort_by(f32::total_cmp);

        let mut merged: Vec<f32> = Vec::new();
        for edge in column_edges {
            match merged.last() {
                Some(&last) if edge - last < self.config.min_column_gap => {}
                _ => merged.push(edge),
            }
        }
        merged
    }

    /// Find contiguous row regions that form tables.
    fn find_table_regions(&self, rows: &[Row], columns: &[f32]) -> Vec<(usize, usize)> {
        let mut regions = Vec::new();
        let mut start: Option<usize> = None;

        for (i, row) in rows.iter().enumerate() {
            let aligned = self.alignment_score(row, columns) >= self.config.min_alignment_ratio;
            if is_multi_span(row) && aligned {
                start.get_or_insert(i);
            } else if let Some(s) = start.take() {
                if i - s >= self.config.min_rows {
                    regions.push((s, i - 1));
                }
            }
        }

        if let Some(s) = start {
            if rows.len() - s >= self.config.min_rows {
                regions.push((s, rows.len() - 1));
            }
        }

        regions
    }

    /// Share of a row's spans starting on a column boundary.
    fn alignment_score(&self, row: &Row, columns: &[f32]) -> f32 {
        if row.spans.is_empty() || columns.is_empty() {
            return 0.0;
        }

        let aligned = row
            .spans
            .iter()
            .filter(|span| columns.iter().any(|col| (span.x0 - col).abs() <= ALIGN_TOLERANCE))
            .count();

        aligned as f32 / row.spans.len() as f32
    }

    /// Place spans into cells and measure how cleanly they fit.
    fn build_table(&self, page: usize, rows: &[Row], columns: &[f32]) -> TableCandidate {
        let left = rows
            .iter()
            .flat_map(|r| r.spans.iter())
            .map(|s| s.x0)
            .fold(f32::INFINITY, f32::min);
        let right = rows
            .iter()
            .flat_map(|r| r.spans.iter())
            .map(|s| s.x1)
            .fold(f32::NEG_INFINITY, f32::max);
        let top = rows.first().map(Row::top).unwrap_or(0.0);
        let bottom = rows.last().map(Row::bottom).unwrap_or(0.0);

        let mut total_chars = 0;
        let mut placed_chars = 0;

        let cells = rows
            .iter()
            .map(|row| {
                let mut contents: Vec<Vec<&str>> = vec![Vec::new(); columns.len()];
                for span in &row.spans {
                    let col = find_column_for_span(span.x0, columns, right);
                    let chars = span.char_count();
                    total_chars += chars;

                    let next_edge = columns.get(col + 1).copied().unwrap_or(f32::INFINITY);
                    if span.x1 <= next_edge + OVERRUN_TOLERANCE {
                        placed_chars += chars;
                    }

                    contents[col].push(span.text.trim());
                }
                contents.into_iter().map(|c| c.join(" ")).collect()
            })
            .collect();

        TableCandidate::new(
            page,
            BoundingBox::new(left, top, right, bottom, page),
            cells,
            accuracy(placed_chars, total_chars),
        )
    }

    /// Check if detected table rows actually represent a numbered or bulleted list.
    ///
    /// When a PDF has a numbered list like "1. Item", the number and text often
    /// become separate spans at different X positions, which looks like a
    /// multi-column table to the detector.
    fn is_list_pattern(&self, rows: &[Row], columns: &[f32]) -> bool {
        if columns.len() < 2 || rows.is_empty() {
            return false;
        }

        let mut bullet_count = 0;
        let mut number_count = 0;

        for row in rows {
            // Rows are sorted by x, so the first span is the leftmost.
            if let Some(span) = row.spans.first() {
                let text = span.text.trim();
                if is_bullet_marker(text) {
                    bullet_count += 1;
                } else if is_number_marker(text) {
                    number_count += 1;
                }
            }
        }

        let bullet_ratio = bullet_count as f32 / rows.len() as f32;
        let total_ratio = (bullet_count + number_count) as f32 / rows.len() as f32;

        // Bullet markers are almost never real table data
        if bullet_ratio >= 0.5 {
            return true;
        }

        // Numbered markers only disqualify 2-column regions; real tables
        // often have a numbered first column.
        columns.len() == 2 && total_ratio >= 0.5
    }
}

impl TableDetector for StreamDetector {
    fn flavor(&self) -> Flavor {
        Flavor::Stream
    }

    fn detect(&self, pages: &[PageContent]) -> Result<Vec<TableCandidate>> {
        Ok(pages.iter().flat_map(|page| self.detect_page(page)).collect())
    }
}

fn is_multi_span(row: &Row) -> bool {
    row.spans.len() >= 2
}

/// Find which column a span belongs to based on its left edge.
fn find_column_for_span(span_x: f32, columns: &[f32], right_x: f32) -> usize {
    if columns.is_empty() {
        return 0;
    }

    // Spans may start slightly (10pt) before their column edge
    for (i, &col_start) in columns.iter().enumerate() {
        let col_end = columns.get(i + 1).copied().unwrap_or(right_x + 100.0);
        if span_x >= col_start - 10.0 && span_x < col_end - 10.0 {
            return i;
        }
    }

    columns
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (span_x - **a).abs().total_cmp(&(span_x - **b).abs()))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Check if text is a bullet marker (•, -, etc.).
fn is_bullet_marker(text: &str) -> bool {
    BULLET_MARKERS.contains(&text.trim())
}

/// Check if text is a number-style list marker (1., 2), a., 가., etc.).
fn is_number_marker(text: &str) -> bool {
    // Remove internal whitespace for pattern matching (handles "1 .")
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return false;
    }

    if let Some(pos) = cleaned.find(|c: char| !c.is_ascii_digit()) {
        let (prefix, suffix) = cleaned.split_at(pos);
        if !prefix.is_empty() && (suffix == "." || suffix == ")") {
            return true;
        }
    }

    if cleaned.parse::<u32>().is_ok() {
        return true;
    }

    // Letter marker: "a.", "B)", "가."
    let chars: Vec<char> = cleaned.chars().collect();
    chars.len() == 2 && chars[0].is_alphabetic() && (chars[1] == '.' || chars[1] == ')')
}
