//! Ruling-line table detection (Lattice mode).
//!
//! Tables are found as connected groups of horizontal and vertical segments.
//! Each group's distinct line positions define a cell grid; text is placed by
//! span center.

use super::{accuracy, TableCandidate, TableDetector};
use crate::error::Result;
use crate::model::{BoundingBox, Flavor};
use crate::parser::content::{Orientation, PageContent, Segment, TextSpan};

/// Lattice detector configuration.
#[derive(Debug, Clone)]
pub struct LatticeConfig {
    /// Segments shorter than this are ignored (points)
    pub min_line_length: f32,
    /// Distance within which line ends join and positions coincide
    pub snap_tolerance: f32,
}

impl Default for LatticeConfig {
    fn default() -> Self {
        Self {
            min_line_length: 10.0,
            snap_tolerance: 2.0,
        }
    }
}

/// Detects tables drawn with ruling lines.
#[derive(Debug, Clone, Default)]
pub struct LatticeDetector {
    config: LatticeConfig,
}

/// A horizontal (`pos` = y) or vertical (`pos` = x) line spanning
/// `start..end` along its axis.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Line {
    pos: f32,
    start: f32,
    end: f32,
}

impl LatticeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LatticeConfig) -> Self {
        Self { config }
    }

    /// Detect tables on a single page.
    pub fn detect_page(&self, page: &PageContent) -> Vec<TableCandidate> {
        let (horizontal, vertical) = self.collect_lines(&page.segments);
        if horizontal.len() < 2 || vertical.len() < 2 {
            return Vec::new();
        }

        let mut candidates: Vec<TableCandidate> = self
            .connected_groups(&horizontal, &vertical)
            .into_iter()
            .filter_map(|(h, v)| self.build_table(page, &h, &v))
            .collect();

        // Reading order: top to bottom, then left to right.
        candidates.sort_by(|a, b| {
            a.bbox
                .y0
                .total_cmp(&b.bbox.y0)
                .then(a.bbox.x0.total_cmp(&b.bbox.x0))
        });

        log::debug!("Lattice: page {} has {} ruled tables", page.index, candidates.len());
        candidates
    }

    /// Split segments by orientation, drop short ones and join collinear
    /// pieces.
    fn collect_lines(&self, segments: &[Segment]) -> (Vec<Line>, Vec<Line>) {
        let mut horizontal = Vec::new();
        let mut vertical = Vec::new();

        for s in segments.iter().filter(|s| s.length() >= self.config.min_line_length) {
            match s.orientation() {
                Some(Orientation::Horizontal) => horizontal.push(Line {
                    pos: (s.y0 + s.y1) / 2.0,
                    start: s.x0,
                    end: s.x1,
                }),
                Some(Orientation::Vertical) => vertical.push(Line {
                    pos: (s.x0 + s.x1) / 2.0,
                    start: s.y0,
                    end: s.y1,
                }),
                None => {}
            }
        }

        (self.join_lines(horizontal), self.join_lines(vertical))
    }

    fn join_lines(&self, mut lines: Vec<Line>) -> Vec<Line> {
        let tol = self.config.snap_tolerance;
        lines.sort_by(|a, b| a.pos.total_cmp(&b.pos).then(a.start.total_cmp(&b.start)));

        let mut joined: Vec<Line> = Vec::new();
        for line in lines {
            match joined.last_mut() {
                Some(last)
                    if (line.pos - last.pos).abs() <= tol && line.start <= last.end + tol =>
                {
                    last.end = last.end.max(line.end);
                }
                _ => joined.push(line),
            }
        }
        joined
    }

    fn crosses(&self, h: &Line, v: &Line) -> bool {
        let tol = self.config.snap_tolerance;
        v.pos >= h.start - tol
            && v.pos <= h.end + tol
            && h.pos >= v.start - tol
            && h.pos <= v.end + tol
    }

    /// Group lines into connected components through their intersections.
    fn connected_groups(
        &self,
        horizontal: &[Line],
        vertical: &[Line],
    ) -> Vec<(Vec<Line>, Vec<Line>)> {
        let n = horizontal.len();
        let mut parent: Vec<usize> = (0..n + vertical.len()).collect();

        fn find(parent: &mut [usize], mut i: usize) -> usize {
            while parent[i] != i {
                parent[i] = parent[parent[i]];
                i = parent[i];
            }
            i
        }

        for (i, h) in horizontal.iter().enumerate() {
            for (j, v) in vertical.iter().enumerate() {
                if self.crosses(h, v) {
                    let a = find(&mut parent, i);
                    let b = find(&mut parent, n + j);
                    if a != b {
                        parent[a] = b;
                    }
                }
            }
        }

        let mut groups: Vec<(usize, Vec<Line>, Vec<Line>)> = Vec::new();
        for i in 0..parent.len() {
            let root = find(&mut parent, i);
            let idx = match groups.iter().position(|(r, _, _)| *r == root) {
                Some(idx) => idx,
                None => {
                    groups.push((root, Vec::new(), Vec::new()));
                    groups.len() - 1
                }
            };
            if i < n {
                groups[idx].1.push(horizontal[i]);
            } else {
                groups[idx].2.push(vertical[i - n]);
            }
        }

        groups.into_iter().map(|(_, h, v)| (h, v)).collect()
    }

    /// Build a table from one connected group of lines.
    fn build_table(
        &self,
        page: &PageContent,
        horizontal: &[Line],
        vertical: &[Line],
    ) -> Option<TableCandidate> {
        let tol = self.config.snap_tolerance;
        let ys = cluster_values(horizontal.iter().map(|l| l.pos), tol);
        let xs = cluster_values(vertical.iter().map(|l| l.pos), tol);

        if ys.len() < 2 || xs.len() < 2 {
            return None;
        }

        let bbox = BoundingBox::new(xs[0], ys[0], xs[xs.len() - 1], ys[ys.len() - 1], page.index);
        let n_rows = ys.len() - 1;
        let n_cols = xs.len() - 1;
        let mut cell_spans: Vec<Vec<Vec<&TextSpan>>> = vec![vec![Vec::new(); n_cols]; n_rows];

        let mut total_chars = 0;
        let mut placed_chars = 0;

        for span in page.spans_in(&bbox) {
            let (cx, cy) = span.center();
            let (Some(row), Some(col)) = (interval_index(&ys, cy), interval_index(&xs, cx)) else {
                continue;
            };

            let chars = span.char_count();
            total_chars += chars;
            let inside = span.x0 >= xs[col] - tol
                && span.x1 <= xs[col + 1] + tol
                && span.top >= ys[row] - tol
                && span.bottom <= ys[row + 1] + tol;
            if inside {
                placed_chars += chars;
            }

            cell_spans[row][col].push(span);
        }

        let cells = cell_spans
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect();

        Some(TableCandidate::new(
            page.index,
            bbox,
            cells,
            accuracy(placed_chars, total_chars),
        ))
    }
}

impl TableDetector for LatticeDetector {
    fn flavor(&self) -> Flavor {
        Flavor::Lattice
    }

    fn detect(&self, pages: &[PageContent]) -> Result<Vec<TableCandidate>> {
        Ok(pages.iter().flat_map(|page| self.detect_page(page)).collect())
    }
}

/// Sorted cluster means of values lying within `tolerance` of their
/// neighbour.
fn cluster_values(values: impl Iterator<Item = f32>, tolerance: f32) -> Vec<f32> {
    let mut sorted: Vec<f32> = values.collect();
    sorted.sort_by(f32::total_cmp);

    let mut clusters: Vec<Vec<f32>> = Vec::new();
    for v in sorted {
        match clusters.last_mut() {
            Some(cluster) if cluster.last().is_some_and(|&last| v - last <= tolerance) => {
                cluster.push(v)
            }
            _ => clusters.push(vec![v]),
        }
    }

    clusters
        .iter()
        .map(|c| c.iter().sum::<f32>() / c.len() as f32)
        .collect()
}

/// Index `i` such that `edges[i] <= v < edges[i + 1]` (last interval closed).
fn interval_index(edges: &[f32], v: f32) -> Option<usize> {
    let last = edges.len().checked_sub(2)?;
    edges
        .windows(2)
        .position(|w| v >= w[0] && v < w[1])
        .or_else(|| (v == edges[last + 1]).then_some(last))
}

/// Join a cell's spans: same-line spans with a space, lines with a newline.
fn cell_text(mut spans: Vec<&TextSpan>) -> String {
    spans.sort_by(|a, b| a.top.total_cmp(&b.top).then(a.x0.total_cmp(&b.x0)));

    let mut text = String::new();
    let mut line_top: Option<f32> = None;
    for span in spans {
        match line_top {
            Some(top) if (span.top - top).abs() <= span.font_size * 0.5 => text.push(' '),
            Some(_) => {
                text.push('\n');
                line_top = Some(span.top);
            }
            None => line_top = Some(span.top),
        }
        text.push_str(span.text.trim());
    }
    text
}
