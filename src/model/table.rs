//! Table types.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use super::BoundingBox;
use crate::error::{Error, Result};

/// Which detection strategy produced a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Flavor {
    /// Ruled-line based detection
    Lattice,
    /// Whitespace/alignment based detection
    Stream,
}

impl Flavor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Flavor::Lattice => "lattice",
            Flavor::Stream => "stream",
        }
    }
}

impl std::fmt::Display for Flavor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A 2-D grid of string cells with named columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableFrame {
    /// Column names, in order
    pub columns: Vec<String>,
    /// Body rows; every row has `columns.len()` cells
    pub rows: Vec<Vec<String>>,
}

impl TableFrame {
    /// Create a frame, padding or truncating rows to the column count.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Create a frame whose columns are named by position ("0", "1", ...).
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        let columns = (0..width).map(|i| i.to_string()).collect();
        Self::new(columns, rows)
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.row_count(), self.column_count())
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of the first column with the given name.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|r| r[idx].as_str()).collect())
    }

    /// Iterate over every body cell.
    pub fn cells(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().flat_map(|r| r.iter().map(|c| c.as_str()))
    }

    /// Rows as ordered `column -> value` records.
    pub fn records(&self) -> Vec<serde_json::Map<String, serde_json::Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row)
                    .map(|(name, value)| (name.clone(), serde_json::Value::String(value.clone())))
                    .collect()
            })
            .collect()
    }

    /// The header as a data row, unless it repeats `columns` or is purely
    /// positional.
    fn promoted_header(&self, columns: &[String]) -> Option<Vec<String>> {
        if self.columns == columns {
            return None;
        }

        let row: Vec<String> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| if *name == i.to_string() { String::new() } else { name.clone() })
            .collect();
        row.iter().any(|cell| !cell.is_empty()).then_some(row)
    }

    fn has_duplicate_columns(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        self.columns.iter().any(|c| !seen.insert(c))
    }

    /// Append `other`'s rows below this frame's rows.
    ///
    /// Frames of equal width are stacked by position under this frame's
    /// column names. If `other` carries a different header, that header was
    /// a data row of a continuation fragment and is restored as its first
    /// row; positional names ("0", "1", ...) mark cells that were empty.
    /// Otherwise columns are realigned by name: unmatched
    /// columns of `other` are appended and missing cells are left empty.
    /// Name realignment is impossible when either frame repeats a column
    /// name, which is reported as [`Error::TableMerge`].
    pub fn concat(&self, other: &TableFrame) -> Result<TableFrame> {
        if self.column_count() == other.column_count() {
            let mut rows = self.rows.clone();
            if let Some(row) = other.promoted_header(&self.columns) {
                rows.push(row);
            }
            rows.extend(other.rows.iter().cloned());
            return Ok(TableFrame {
                columns: self.columns.clone(),
                rows,
            });
        }

        if self.has_duplicate_columns() || other.has_duplicate_columns() {
            return Err(Error::TableMerge(format!(
                "cannot align {} columns with {} columns: duplicated column names",
                self.column_count(),
                other.column_count()
            )));
        }

        let mut columns = self.columns.clone();
        for name in &other.columns {
            if !columns.contains(name) {
                columns.push(name.clone());
            }
        }

        let width = columns.len();
        let mut rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| {
                let mut row = row.clone();
                row.resize(width, String::new());
                row
            })
            .collect();

        for row in &other.rows {
            let mut aligned = vec![String::new(); width];
            for (name, value) in other.columns.iter().zip(row) {
                if let Some(idx) = columns.iter().position(|c| c == name) {
                    aligned[idx] = value.clone();
                }
            }
            rows.push(aligned);
        }

        Ok(TableFrame { columns, rows })
    }
}

/// Extraction metadata attached to a table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableMetadata {
    /// Backend-native confidence (0-100)
    pub accuracy: f32,
    /// Percentage of empty cells in the raw detection
    pub whitespace: f32,
    pub flavor: Flavor,
    /// Position of the table among its flavor's detections
    pub table_index: usize,
    /// Composite 0-1 confidence (lattice tables only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f32>,
    /// Pages of the fragments a cross-page table was merged from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merged_from_pages: Option<Vec<usize>>,
}

impl TableMetadata {
    pub fn new(flavor: Flavor, accuracy: f32) -> Self {
        Self {
            accuracy,
            whitespace: 0.0,
            flavor,
            table_index: 0,
            quality_score: None,
            merged_from_pages: None,
        }
    }
}

/// One extracted table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableData {
    /// Cell grid
    pub frame: TableFrame,
    /// Location, when the backend could localize the table
    pub bbox: Option<BoundingBox>,
    /// 0-indexed page
    pub page: usize,
    pub caption: Option<String>,
    pub metadata: TableMetadata,
}

impl TableData {
    pub fn new(
        frame: TableFrame,
        bbox: Option<BoundingBox>,
        page: usize,
        metadata: TableMetadata,
    ) -> Self {
        Self {
            frame,
            bbox,
            page,
            caption: None,
            metadata,
        }
    }

    pub fn row_count(&self) -> usize {
        self.frame.row_count()
    }

    pub fn column_count(&self) -> usize {
        self.frame.column_count()
    }

    /// Serialize into the exported table shape.
    pub fn to_dict(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl Serialize for TableData {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let (rows, cols) = self.frame.shape();
        let mut state = serializer.serialize_struct("TableData", 7)?;
        state.serialize_field("data", &self.frame.records())?;
        state.serialize_field("columns", &self.frame.columns)?;
        state.serialize_field("shape", &[rows, cols])?;
        state.serialize_field("page", &self.page)?;
        state.serialize_field("caption", &self.caption)?;
        state.serialize_field("bbox", &self.bbox)?;
        state.serialize_field("metadata", &self.metadata)?;
        state.end()
    }
}
