//! Cell-grid cleaning and quality scoring.

use std::collections::HashSet;

use crate::model::TableFrame;

/// Non-empty ratio above which the first row is taken as the header.
const HEADER_RATIO: f32 = 0.5;

/// Clean a raw cell grid into a named frame.
///
/// Fully empty rows and columns are dropped. When more than half of the
/// first row is filled it becomes the header; otherwise columns are named by
/// position. Every cell is trimmed.
pub fn clean_cells(cells: Vec<Vec<String>>) -> TableFrame {
    let width = cells.iter().map(Vec::len).max().unwrap_or(0);
    let mut rows: Vec<Vec<String>> = cells
        .into_iter()
        .map(|row| {
            let mut row: Vec<String> = row.into_iter().map(|c| c.trim().to_string()).collect();
            row.resize(width, String::new());
            row
        })
        .filter(|row| row.iter().any(|c| !c.is_empty()))
        .collect();

    let keep: Vec<usize> = (0..width)
        .filter(|&col| rows.iter().any(|row| !row[col].is_empty()))
        .collect();
    if keep.len() < width {
        rows = rows
            .into_iter()
            .map(|row| keep.iter().map(|&col| row[col].clone()).collect())
            .collect();
    }

    if rows.is_empty() {
        return TableFrame::default();
    }

    let first = &rows[0];
    let filled = first.iter().filter(|c| !c.is_empty()).count();
    if filled as f32 / first.len() as f32 > HEADER_RATIO {
        let header = rows.remove(0);
        let columns = header
            .into_iter()
            .enumerate()
            .map(|(i, name)| if name.is_empty() { i.to_string() } else { name })
            .collect();
        TableFrame::new(columns, rows)
    } else {
        TableFrame::from_rows(rows)
    }
}

/// Composite 0-1 confidence of a cleaned table.
///
/// `0.4·accuracy/100 + structure + 0.2·distinct_ratio + 0.1·numeric_ratio`,
/// with ratios taken over all body cells.
pub fn quality_score(frame: &TableFrame, accuracy: f32) -> f32 {
    let (rows, cols) = frame.shape();

    let structure = if rows >= 2 && cols >= 2 {
        0.3 + 0.05 * ((rows * cols) as f32 / 25.0).min(1.0)
    } else if rows >= 1 && cols >= 1 {
        0.1
    } else {
        0.0
    };

    let total = rows * cols;
    let (distinct_ratio, numeric_ratio) = if total == 0 {
        (0.0, 0.0)
    } else {
        let distinct: HashSet<&str> = frame.cells().collect();
        let numeric = frame.cells().filter(|c| is_numeric(c)).count();
        (
            distinct.len() as f32 / total as f32,
            numeric as f32 / total as f32,
        )
    };

    0.4 * (accuracy / 100.0) + structure + 0.2 * distinct_ratio + 0.1 * numeric_ratio
}

/// Whether a cell reads as a number ("1,200", "59.9", "30%").
pub fn is_numeric(cell: &str) -> bool {
    let cleaned: String = cell.trim().trim_end_matches('%').chars().filter(|&c| c != ',').collect();
    !cleaned.is_empty() && cleaned.parse::<f64>().is_ok()
}
