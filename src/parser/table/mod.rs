//! Table extraction.
//!
//! Two independent detectors find tables on extracted pages: [`LatticeDetector`]
//! follows ruling lines and [`StreamDetector`] follows text alignment. The
//! [`TableExtractor`] runs them, drops low-confidence candidates, cleans the
//! cell grids and removes stream tables that duplicate an accepted table.

mod clean;
mod lattice;
mod stream;

use std::str::FromStr;

pub use clean::{clean_cells, is_numeric, quality_score};
pub use lattice::{LatticeConfig, LatticeDetector};
pub use stream::{StreamConfig, StreamDetector};

use super::content::PageContent;
use super::options::ParseOptions;
use crate::error::{Error, Result};
use crate::model::{BoundingBox, Flavor, TableData, TableMetadata};

/// Which detectors to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlavorSelection {
    Lattice,
    Stream,
    /// Lattice first, then non-duplicate stream tables
    #[default]
    Both,
}

impl FlavorSelection {
    pub fn includes(&self, flavor: Flavor) -> bool {
        matches!(
            (self, flavor),
            (FlavorSelection::Both, _)
                | (FlavorSelection::Lattice, Flavor::Lattice)
                | (FlavorSelection::Stream, Flavor::Stream)
        )
    }
}

impl FromStr for FlavorSelection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "lattice" => Ok(FlavorSelection::Lattice),
            "stream" => Ok(FlavorSelection::Stream),
            "both" => Ok(FlavorSelection::Both),
            other => Err(Error::Other(format!("Unknown table flavor: {other}"))),
        }
    }
}

/// A raw table found by a detector, before cleaning.
#[derive(Debug, Clone, PartialEq)]
pub struct TableCandidate {
    /// 0-indexed page
    pub page: usize,
    pub bbox: BoundingBox,
    /// Raw cell grid, row-major
    pub cells: Vec<Vec<String>>,
    /// Share of region text placed in exactly one cell (0-100)
    pub accuracy: f32,
    /// Share of empty cells (0-100)
    pub whitespace: f32,
}

impl TableCandidate {
    /// Create a candidate, deriving `whitespace` from the grid.
    pub fn new(page: usize, bbox: BoundingBox, cells: Vec<Vec<String>>, accuracy: f32) -> Self {
        let total: usize = cells.iter().map(Vec::len).sum();
        let empty = cells.iter().flatten().filter(|c| c.trim().is_empty()).count();
        let whitespace = if total == 0 {
            0.0
        } else {
            100.0 * empty as f32 / total as f32
        };

        Self {
            page,
            bbox,
            cells,
            accuracy,
            whitespace,
        }
    }
}

/// Accuracy as a percentage of characters placed unambiguously.
pub(crate) fn accuracy(placed: usize, total: usize) -> f32 {
    if total == 0 {
        0.0
    } else {
        100.0 * placed as f32 / total as f32
    }
}

/// A table detection strategy.
pub trait TableDetector {
    fn flavor(&self) -> Flavor;

    /// Detect tables on every page, in page order.
    fn detect(&self, pages: &[PageContent]) -> Result<Vec<TableCandidate>>;
}

/// Runs the detectors and filters their output.
pub struct TableExtractor {
    /// Minimum detector accuracy (0-100)
    pub min_accuracy: f32,
    /// Minimum quality score for lattice tables
    pub min_quality: f32,
    /// Maximum share of a stream table's area covered by an accepted table
    pub overlap_threshold: f32,
    lattice: LatticeDetector,
    stream: StreamDetector,
}

impl Default for TableExtractor {
    fn default() -> Self {
        Self {
            min_accuracy: 50.0,
            min_quality: 0.5,
            overlap_threshold: 0.5,
            lattice: LatticeDetector::default(),
            stream: StreamDetector::default(),
        }
    }
}

impl TableExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_options(options: &ParseOptions) -> Self {
        Self {
            min_accuracy: options.min_accuracy,
            min_quality: options.min_quality,
            overlap_threshold: options.table_overlap_threshold,
            ..Self::default()
        }
    }

    /// Replace the detectors.
    pub fn with_detectors(mut self, lattice: LatticeDetector, stream: StreamDetector) -> Self {
        self.lattice = lattice;
        self.stream = stream;
        self
    }

    fn detector(&self, flavor: Flavor) -> &dyn TableDetector {
        match flavor {
            Flavor::Lattice => &self.lattice,
            Flavor::Stream => &self.stream,
        }
    }

    /// Extract all tables with the selected detectors.
    pub fn extract_tables(&self, pages: &[PageContent], flavor: FlavorSelection) -> Vec<TableData> {
        let mut tables = Vec::new();

        if flavor.includes(Flavor::Lattice) {
            tables.extend(self.extract_with(self.detector(Flavor::Lattice), pages));
        }

        if flavor.includes(Flavor::Stream) {
            for table in self.extract_with(self.detector(Flavor::Stream), pages) {
                if self.overlaps_with_existing(&table, &tables) {
                    log::debug!(
                        "Dropping stream table on page {}: duplicates an accepted table",
                        table.page
                    );
                } else {
                    tables.push(table);
                }
            }
        }

        log::info!("Extracted {} tables", tables.len());
        tables
    }

    /// Run one detector, never failing: errors yield no tables.
    fn extract_with(&self, detector: &dyn TableDetector, pages: &[PageContent]) -> Vec<TableData> {
        let flavor = detector.flavor();
        let candidates = match detector.detect(pages) {
            Ok(candidates) => candidates,
            Err(e) => {
                log::warn!("{} table extraction failed: {}", flavor, e);
                return Vec::new();
            }
        };

        let mut tables = Vec::new();
        for (index, candidate) in candidates.into_iter().enumerate() {
            if candidate.accuracy < self.min_accuracy {
                log::debug!(
                    "Skipping low-accuracy {} table on page {} (accuracy: {:.1}%)",
                    flavor,
                    candidate.page,
                    candidate.accuracy
                );
                continue;
            }

            let mut table = to_table_data(candidate, index, flavor);

            if flavor == Flavor::Lattice {
                let score = quality_score(&table.frame, table.metadata.accuracy);
                table.metadata.quality_score = Some(score);
                if score < self.min_quality {
                    log::debug!(
                        "Skipping low-quality table on page {} (score: {:.2})",
                        table.page,
                        score
                    );
                    continue;
                }
            }

            tables.push(table);
        }

        log::debug!("{} detector kept {} tables", flavor, tables.len());
        tables
    }

    /// Whether more than `overlap_threshold` of the table's own area is
    /// covered by any existing table.
    pub fn overlaps_with_existing(&self, table: &TableData, existing: &[TableData]) -> bool {
        let Some(bbox) = table.bbox else {
            return false;
        };
        if bbox.area() <= 0.0 {
            return false;
        }

        existing
            .iter()
            .filter_map(|t| t.bbox)
            .any(|other| {
                bbox.overlaps(&other) && bbox.overlap_ratio(&other) > self.overlap_threshold
            })
    }

    /// Extract the first table inside a region of one page.
    ///
    /// The region is searched with a single detector and no confidence
    /// filtering; failures are logged and yield `None`.
    pub fn extract_table_at_region(
        &self,
        pages: &[PageContent],
        page: usize,
        bbox: &BoundingBox,
        flavor: Flavor,
    ) -> Option<TableData> {
        let content = pages.iter().find(|p| p.index == page)?;
        let cropped = content.crop(bbox);

        match self.detector(flavor).detect(std::slice::from_ref(&cropped)) {
            Ok(candidates) => candidates
                .into_iter()
                .next()
                .map(|candidate| to_table_data(candidate, 0, flavor)),
            Err(e) => {
                log::warn!("Failed to extract table at region: {}", e);
                None
            }
        }
    }
}

/// Clean a candidate into a table record.
fn to_table_data(candidate: TableCandidate, index: usize, flavor: Flavor) -> TableData {
    let frame = clean_cells(candidate.cells);
    let mut metadata = TableMetadata::new(flavor, candidate.accuracy);
    metadata.whitespace = candidate.whitespace;
    metadata.table_index = index;

    TableData::new(frame, Some(candidate.bbox), candidate.page, metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TableFrame;
    use crate::parser::content::{Segment, TextSpan};

    /// Detector returning fixed candidates.
    struct Fixed(Flavor, Vec<TableCandidate>);

    impl TableDetector for Fixed {
        fn flavor(&self) -> Flavor {
            self.0
        }

        fn detect(&self, _pages: &[PageContent]) -> Result<Vec<TableCandidate>> {
            Ok(self.1.clone())
        }
    }

    struct Failing;

    impl TableDetector for Failing {
        fn flavor(&self) -> Flavor {
            Flavor::Stream
        }

        fn detect(&self, _pages: &[PageContent]) -> Result<Vec<TableCandidate>> {
            Err(Error::TableExtract {
                flavor: "stream".to_string(),
                message: "boom".to_string(),
            })
        }
    }

    fn cells(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    fn table(bbox: BoundingBox, flavor: Flavor) -> TableData {
        TableData::new(
            TableFrame::from_rows(cells(&[&["a", "b"]])),
            Some(bbox),
            bbox.page,
            TableMetadata::new(flavor, 90.0),
        )
    }

    #[test]
    fn test_flavor_selection() {
        assert!(FlavorSelection::Both.includes(Flavor::Lattice));
        assert!(FlavorSelection::Both.includes(Flavor::Stream));
        assert!(!FlavorSelection::Lattice.includes(Flavor::Stream));
        assert_eq!("Stream".parse::<FlavorSelection>().unwrap(), FlavorSelection::Stream);
        assert!("camelot".parse::<FlavorSelection>().is_err());
    }

    #[test]
    fn test_candidate_whitespace() {
        let c = TableCandidate::new(
            0,
            BoundingBox::new(0.0, 0.0, 1.0, 1.0, 0),
            cells(&[&["a", ""], &["", " "]]),
            100.0,
        );
        assert_eq!(c.whitespace, 75.0);
    }

    #[test]
    fn test_stream_duplicate_excluded() {
        let extractor = TableExtractor::new();
        let lattice = table(BoundingBox::new(100.0, 100.0, 400.0, 300.0, 0), Flavor::Lattice);

        // 60% of the candidate's own area lies inside the lattice table.
        let duplicate = table(BoundingBox::new(100.0, 180.0, 400.0, 380.0, 0), Flavor::Stream);
        assert!(extractor.overlaps_with_existing(&duplicate, std::slice::from_ref(&lattice)));

        // Same geometry on another page never duplicates.
        let elsewhere = table(BoundingBox::new(100.0, 180.0, 400.0, 380.0, 1), Flavor::Stream);
        assert!(!extractor.overlaps_with_existing(&elsewhere, std::slice::from_ref(&lattice)));
    }

    #[test]
    fn test_overlap_ratio_direction() {
        let extractor = TableExtractor::new();
        // A small stream table fully inside a big lattice table is a duplicate...
        let big = table(BoundingBox::new(0.0, 0.0, 500.0, 500.0, 0), Flavor::Lattice);
        let small = table(BoundingBox::new(10.0, 10.0, 60.0, 60.0, 0), Flavor::Stream);
        assert!(extractor.overlaps_with_existing(&small, std::slice::from_ref(&big)));
        // ...but a big stream table covering a small accepted one is not.
        assert!(!extractor.overlaps_with_existing(&big, std::slice::from_ref(&small)));
    }

    #[test]
    fn test_extract_with_filters_accuracy_and_quality() {
        let extractor = TableExtractor::new();
        let bbox = BoundingBox::new(50.0, 50.0, 300.0, 200.0, 0);
        let detector = Fixed(
            Flavor::Lattice,
            vec![
                TableCandidate::new(
                    0,
                    bbox,
                    cells(&[&["구분", "면적"], &["A", "59"], &["B", "84"]]),
                    95.0,
                ),
                TableCandidate::new(0, bbox, cells(&[&["x", "y"], &["1", "2"]]), 40.0),
                // bordered text box
                TableCandidate::new(0, bbox, cells(&[&["안내문"]]), 90.0),
            ],
        );

        let tables = extractor.extract_with(&detector, &[]);
        assert_eq!(tables.len(), 1);
        let t = &tables[0];
        assert_eq!(t.frame.columns, vec!["구분", "면적"]);
        assert_eq!(t.metadata.table_index, 0);
        assert!(t.metadata.quality_score.unwrap() >= 0.5);
    }

    #[test]
    fn test_stream_tables_have_no_quality_gate() {
        let extractor = TableExtractor::new();
        let bbox = BoundingBox::new(50.0, 50.0, 300.0, 200.0, 0);
        let candidate = TableCandidate::new(0, bbox, cells(&[&["a"]]), 90.0);
        let detector = Fixed(Flavor::Stream, vec![candidate]);
        let tables = extractor.extract_with(&detector, &[]);
        assert_eq!(tables.len(), 1);
        assert!(tables[0].metadata.quality_score.is_none());
        assert_eq!(tables[0].metadata.flavor, Flavor::Stream);
    }

    #[test]
    fn test_detector_failure_yields_no_tables() {
        let extractor = TableExtractor::new();
        assert!(extractor.extract_with(&Failing, &[]).is_empty());
    }

    fn ruled_page() -> PageContent {
        let mut page = PageContent::new(0, 595.0, 842.0);
        for y in [100.0, 120.0, 140.0, 160.0] {
            page.segments.push(Segment::horizontal(y, 100.0, 300.0));
        }
        for x in [100.0, 200.0, 300.0] {
            page.segments.push(Segment::vertical(x, 100.0, 160.0));
        }
        let rows = [["구분", "세대수"], ["A형", "120"], ["B형", "80"]];
        for (r, row) in rows.iter().enumerate() {
            let top = 104.0 + r as f32 * 20.0;
            for (c, text) in row.iter().enumerate() {
                let x0 = 110.0 + c as f32 * 100.0;
                page.spans.push(TextSpan::new(*text, x0, x0 + 30.0, top, 10.0, "Gothic"));
            }
        }
        page
    }

    #[test]
    fn test_extract_tables_both_dedups_stream() {
        let extractor = TableExtractor::new();
        let tables = extractor.extract_tables(&[ruled_page()], FlavorSelection::Both);

        assert_eq!(tables.len(), 1);
        let t = &tables[0];
        assert_eq!(t.metadata.flavor, Flavor::Lattice);
        assert_eq!(t.frame.columns, vec!["구분", "세대수"]);
        assert_eq!(t.frame.column("세대수").unwrap(), vec!["120", "80"]);
        assert_eq!(t.metadata.accuracy, 100.0);
    }

    #[test]
    fn test_extract_table_at_region() {
        let extractor = TableExtractor::new();
        let region = BoundingBox::new(90.0, 90.0, 310.0, 170.0, 0);
        let table = extractor
            .extract_table_at_region(&[ruled_page()], 0, &region, Flavor::Lattice)
            .unwrap();
        assert_eq!(table.row_count(), 2);

        let empty = BoundingBox::new(400.0, 400.0, 500.0, 500.0, 0);
        assert!(extractor
            .extract_table_at_region(&[ruled_page()], 0, &empty, Flavor::Lattice)
            .is_none());
        assert!(extractor
            .extract_table_at_region(&[ruled_page()], 5, &region, Flavor::Lattice)
            .is_none());
    }
}
