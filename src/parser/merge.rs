//! Table placement in the section tree and cross-page table merging.

use super::options::ParseOptions;
use crate::error::{Error, Result};
use crate::model::{BoundingBox, Section, TableData};

/// Attach every located table to its best-scoring section.
///
/// Tables without a bounding box, or with no section to go to, stay
/// unattached. Returns the number of tables attached.
pub fn merge_tables_into_sections(sections: &mut [Section], tables: &[TableData]) -> usize {
    let mut attached = 0;

    for table in tables {
        let Some(path) = best_section_path(sections, table) else {
            continue;
        };
        if let Some(section) = section_at_mut(sections, &path) {
            log::debug!(
                "Assigned table on page {} to section '{}'",
                table.page,
                section.title
            );
            section.add_table(table.clone());
            attached += 1;
        }
    }

    attached
}

/// The section a table belongs to.
///
/// Every section with a box is scored against the table:
/// 100 for the same page, 50 for overlapping the table, up to 50 more the
/// closer the table starts below the heading, and 10 per nesting level.
/// The first section reaching the highest score wins.
pub fn find_best_section_for_table<'a>(
    sections: &'a [Section],
    table: &TableData,
) -> Option<&'a Section> {
    let path = best_section_path(sections, table)?;
    let (&first, rest) = path.split_first()?;
    let mut section = sections.get(first)?;
    for &index in rest {
        section = section.children.get(index)?;
    }
    Some(section)
}

fn best_section_path(sections: &[Section], table: &TableData) -> Option<Vec<usize>> {
    let bbox = table.bbox?;
    let mut best: Option<(f32, Vec<usize>)> = None;
    let mut path = Vec::new();

    for (index, section) in sections.iter().enumerate() {
        path.push(index);
        score_subtree(section, &bbox, 0, &mut path, &mut best);
        path.pop();
    }

    best.map(|(_, path)| path)
}

fn score_subtree(
    section: &Section,
    table: &BoundingBox,
    depth: usize,
    path: &mut Vec<usize>,
    best: &mut Option<(f32, Vec<usize>)>,
) {
    if let Some(bbox) = section.bbox {
        let score = section_score(&bbox, table, depth);
        if best.as_ref().map_or(true, |(top, _)| score > *top) {
            *best = Some((score, path.clone()));
        }
    }

    for (index, child) in section.children.iter().enumerate() {
        path.push(index);
        score_subtree(child, table, depth + 1, path, best);
        path.pop();
    }
}

fn section_score(section: &BoundingBox, table: &BoundingBox, depth: usize) -> f32 {
    let mut score = 0.0;

    if section.page == table.page {
        score += 100.0;
        if table.y0 >= section.y1 {
            score += (50.0 - (table.y0 - section.y1) / 10.0).max(0.0);
        }
    }

    if section.overlaps(table) {
        score += 50.0;
    }

    score + 10.0 * depth as f32
}

fn section_at_mut<'a>(sections: &'a mut [Section], path: &[usize]) -> Option<&'a mut Section> {
    let (&first, rest) = path.split_first()?;
    let mut section = sections.get_mut(first)?;
    for &index in rest {
        section = section.children.get_mut(index)?;
    }
    Some(section)
}

/// Merges tables that continue on the next page.
#[derive(Debug, Clone)]
pub struct TableMerger {
    /// A continuation fragment must start above this y
    pub page_top_threshold: f32,
    /// Maximum left-edge drift between fragments
    pub column_x_tolerance: f32,
}

impl Default for TableMerger {
    fn default() -> Self {
        Self {
            page_top_threshold: 100.0,
            column_x_tolerance: 10.0,
        }
    }
}

impl TableMerger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_options(options: &ParseOptions) -> Self {
        Self {
            page_top_threshold: options.page_top_threshold,
            column_x_tolerance: options.column_x_tolerance,
        }
    }

    /// Greedily merge runs of continuation tables, left to right.
    pub fn merge_cross_page_tables(&self, tables: Vec<TableData>) -> Vec<TableData> {
        let total = tables.len();
        let mut merged = Vec::with_capacity(total);
        let mut tables = tables.into_iter().peekable();

        while let Some(mut current) = tables.next() {
            while let Some(next) = tables.peek() {
                if !self.can_merge_tables(&current, next) {
                    break;
                }
                match self.merge_two_tables(&current, next) {
                    Ok(table) => {
                        log::info!(
                            "Merged table from page {} with page {}",
                            current.page,
                            next.page
                        );
                        current = table;
                        tables.next();
                    }
                    Err(e) => {
                        log::warn!("Keeping table on page {} unmerged: {}", current.page, e);
                        break;
                    }
                }
            }
            merged.push(current);
        }

        log::info!("Merged {} cross-page tables", total - merged.len());
        merged
    }

    /// Whether `next` continues `table` on the following page.
    ///
    /// For an already merged table the following page is the one after its
    /// last fragment.
    pub fn can_merge_tables(&self, table: &TableData, next: &TableData) -> bool {
        let (Some(a), Some(b)) = (table.bbox, next.bbox) else {
            return false;
        };

        b.page == last_page(table, &a) + 1
            && table.column_count() == next.column_count()
            && (a.x0 - b.x0).abs() <= self.column_x_tolerance
            && b.y0 <= self.page_top_threshold
    }

    /// Stack `next` below `table`.
    ///
    /// The merged box spans both fragments horizontally, starts at the first
    /// fragment's top and ends at the last fragment's bottom, and stays on
    /// the first page.
    pub fn merge_two_tables(&self, table: &TableData, next: &TableData) -> Result<TableData> {
        let (Some(a), Some(b)) = (table.bbox, next.bbox) else {
            return Err(Error::TableMerge("both tables need a bounding box".to_string()));
        };

        let frame = table.frame.concat(&next.frame)?;
        let bbox = BoundingBox {
            x0: a.x0.min(b.x0),
            y0: a.y0,
            x1: a.x1.max(b.x1),
            y1: b.y1,
            page: a.page,
        };

        let mut metadata = table.metadata.clone();
        let mut pages = metadata.merged_from_pages.take().unwrap_or_else(|| vec![a.page]);
        pages.push(b.page);
        metadata.merged_from_pages = Some(pages);

        let mut merged = TableData::new(frame, Some(bbox), table.page, metadata);
        merged.caption = table.caption.clone();
        Ok(merged)
    }
}

fn last_page(table: &TableData, bbox: &BoundingBox) -> usize {
    table
        .metadata
        .merged_from_pages
        .as_ref()
        .and_then(|pages| pages.last().copied())
        .unwrap_or(bbox.page)
}
