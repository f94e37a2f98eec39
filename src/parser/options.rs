//! Parsing options and configuration.

use std::ops::RangeInclusive;

use crate::error::{Error, Result};

use super::table::FlavorSelection;

/// Options for parsing announcement PDFs.
///
/// Every threshold has the default the pipeline was tuned with; the builder
/// methods exist for experimentation on unusual documents.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Error handling mode for per-page content extraction
    pub error_mode: ErrorMode,

    /// Which table detection strategies to run
    pub flavor: FlavorSelection,

    /// Minimum detector accuracy (0-100) for a table to be kept
    pub min_accuracy: f32,

    /// Minimum quality score (0-1) for lattice tables
    pub min_quality: f32,

    /// Vertical tolerance for grouping spans into lines
    pub line_tolerance: f32,

    /// Vertical tolerance for grouping blocks into rows (layout analysis)
    pub row_tolerance: f32,

    /// Horizontal tolerance for column alignment (layout analysis)
    pub column_tolerance: f32,

    /// Minimum run of aligned rows forming a table region (layout analysis)
    pub min_table_rows: usize,

    /// Maximum overlap of a stream table with an accepted table
    pub table_overlap_threshold: f32,

    /// Overlap above which a non-heading line inside a table is dropped
    pub exclusion_overlap_threshold: f32,

    /// Whether to merge tables continuing on the next page
    pub merge_cross_page: bool,

    /// A continuation table must start above this y on its page
    pub page_top_threshold: f32,

    /// Maximum left-edge drift between continuation fragments
    pub column_x_tolerance: f32,

    /// Page selection (which pages to parse)
    pub pages: PageSelection,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Fail on the first page whose content cannot be read.
    pub fn strict(mut self) -> Self {
        self.error_mode = ErrorMode::Strict;
        self
    }

    /// Set the table detection strategies.
    pub fn with_flavor(mut self, flavor: FlavorSelection) -> Self {
        self.flavor = flavor;
        self
    }

    /// Set the minimum table accuracy.
    pub fn with_min_accuracy(mut self, accuracy: f32) -> Self {
        self.min_accuracy = accuracy;
        self
    }

    /// Set the minimum lattice quality score.
    pub fn with_min_quality(mut self, quality: f32) -> Self {
        self.min_quality = quality;
        self
    }

    /// Set the line grouping tolerance.
    pub fn with_line_tolerance(mut self, tolerance: f32) -> Self {
        self.line_tolerance = tolerance;
        self
    }

    /// Enable or disable cross-page table merging.
    pub fn with_cross_page_merge(mut self, merge: bool) -> Self {
        self.merge_cross_page = merge;
        self
    }

    /// Set the continuation thresholds for cross-page merging.
    pub fn with_continuation(mut self, page_top: f32, x_tolerance: f32) -> Self {
        self.page_top_threshold = page_top;
        self.column_x_tolerance = x_tolerance;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.pages = pages;
        self
    }

    /// Set specific page range (1-indexed, inclusive).
    pub fn with_page_range(mut self, range: RangeInclusive<u32>) -> Self {
        self.pages = PageSelection::Range(range);
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Lenient,
            flavor: FlavorSelection::Both,
            min_accuracy: 50.0,
            min_quality: 0.5,
            line_tolerance: 3.0,
            row_tolerance: 3.0,
            column_tolerance: 5.0,
            min_table_rows: 3,
            table_overlap_threshold: 0.5,
            exclusion_overlap_threshold: 0.5,
            merge_cross_page: true,
            page_top_threshold: 100.0,
            column_x_tolerance: 10.0,
            pages: PageSelection::All,
        }
    }
}

/// Error handling mode during parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on any error
    Strict,
    /// Log and skip unreadable pages
    #[default]
    Lenient,
}

/// Page selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PageSelection {
    /// All pages
    #[default]
    All,
    /// A range of pages (inclusive, 1-indexed)
    Range(RangeInclusive<u32>),
    /// Sorted, non-overlapping page ranges (inclusive, 1-indexed)
    List(Vec<RangeInclusive<u32>>),
}

impl PageSelection {
    /// Check if a page number should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::List(ranges) => ranges.iter().any(|r| r.contains(&page)),
        }
    }

    /// Highest page number the selection names, if it is bounded.
    pub fn last_page(&self) -> Option<u32> {
        match self {
            PageSelection::All => None,
            PageSelection::Range(range) => Some(*range.end()),
            PageSelection::List(ranges) => ranges.iter().map(|r| *r.end()).max(),
        }
    }

    /// Fail if the selection names a page past the end of the document.
    pub fn check_bounds(&self, page_count: u32) -> Result<()> {
        match self.last_page() {
            Some(page) if page > page_count => Err(Error::PageOutOfRange(page, page_count)),
            _ => Ok(()),
        }
    }

    /// Parse a page selection string (e.g., "1-10", "1,3,5,7-10").
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.is_empty() || s == "all" {
            return Ok(PageSelection::All);
        }

        let number = |part: &str| -> Result<u32> {
            part.trim()
                .parse()
                .map_err(|_| Error::Other(format!("Invalid page number: {part:?}")))
        };
        let range = |start: &str, end: &str| -> Result<RangeInclusive<u32>> {
            let (start, end) = (number(start)?, number(end)?);
            if start > end {
                return Err(Error::Other(format!("Invalid page range: {start}-{end}")));
            }
            Ok(start..=end)
        };

        if let Some((start, end)) = s.split_once('-') {
            if !start.contains(',') && !end.contains(',') {
                return Ok(PageSelection::Range(range(start, end)?));
            }
        }

        let mut ranges = Vec::new();
        for part in s.split(',') {
            match part.split_once('-') {
                Some((start, end)) => ranges.push(range(start, end)?),
                None => {
                    let page = number(part)?;
                    ranges.push(page..=page);
                }
            }
        }

        ranges.sort_by_key(|r| *r.start());
        let mut merged: Vec<RangeInclusive<u32>> = Vec::with_capacity(ranges.len());
        for r in ranges {
            match merged.last_mut() {
                Some(last) if *r.start() <= last.end().saturating_add(1) => {
                    let end = (*last.end()).max(*r.end());
                    *last = *last.start()..=end;
                }
                _ => merged.push(r),
            }
        }
        Ok(PageSelection::List(merged))
    }
}
