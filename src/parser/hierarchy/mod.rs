//! Hierarchical section parsing.
//!
//! Spans are regrouped into lines, lines inside table regions are dropped
//! unless they read as headings, and the remaining lines are classified and
//! assembled into a section forest.

mod builder;
mod bullets;
mod classify;

pub use builder::SectionTreeBuilder;
pub use bullets::{consolidate_bullets, consolidate_lines};
pub use classify::{base_x_position, indentation_level, HeadingClassifier};

use super::content::{PageContent, TextSpan};
use super::options::ParseOptions;
use crate::error::Result;
use crate::model::{BoundingBox, Section, TextBlock};

/// Rebuilds the section tree of a document from its page text.
#[derive(Debug, Clone)]
pub struct HierarchyParser {
    /// Vertical tolerance for grouping spans into lines
    pub line_tolerance: f32,
    /// Spans closer than this horizontally are one word
    pub word_gap: f32,
    /// Overlap above which a non-heading line inside a table is dropped
    pub exclusion_overlap_threshold: f32,
    classifier: HeadingClassifier,
}

impl HierarchyParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            line_tolerance: 3.0,
            word_gap: 3.0,
            exclusion_overlap_threshold: 0.5,
            classifier: HeadingClassifier::new()?,
        })
    }

    pub fn from_options(options: &ParseOptions) -> Result<Self> {
        Ok(Self {
            line_tolerance: options.line_tolerance,
            exclusion_overlap_threshold: options.exclusion_overlap_threshold,
            ..Self::new()?
        })
    }

    pub fn classifier(&self) -> &HeadingClassifier {
        &self.classifier
    }

    /// Parse the section forest, keeping prose out of `exclude_regions`.
    pub fn parse(&self, pages: &[PageContent], exclude_regions: &[BoundingBox]) -> Vec<Section> {
        let blocks: Vec<TextBlock> =
            pages.iter().flat_map(|page| self.extract_lines(page)).collect();

        let total = blocks.len();
        let kept = self.filter_excluded_regions(blocks, exclude_regions);
        log::debug!("Kept {} of {} lines outside table regions", kept.len(), total);

        let mut sections = self.build_hierarchy(&kept);
        consolidate_bullets(&mut sections);
        sections
    }

    /// Lines of one page, top to bottom.
    pub fn extract_lines(&self, page: &PageContent) -> Vec<TextBlock> {
        let mut spans: Vec<&TextSpan> =
            page.spans.iter().filter(|s| !s.text.trim().is_empty()).collect();
        spans.sort_by(|a, b| a.top.total_cmp(&b.top).then(a.x0.total_cmp(&b.x0)));

        let mut lines: Vec<Vec<&TextSpan>> = Vec::new();
        let mut anchor = f32::NAN;
        for span in spans {
            match lines.last_mut() {
                Some(line) if (span.top - anchor).abs() <= self.line_tolerance => line.push(span),
                _ => {
                    anchor = span.top;
                    lines.push(vec![span]);
                }
            }
        }

        lines
            .into_iter()
            .filter_map(|mut line| {
                line.sort_by(|a, b| a.x0.total_cmp(&b.x0));
                self.line_block(&line, page.index)
            })
            .collect()
    }

    fn line_block(&self, spans: &[&TextSpan], page: usize) -> Option<TextBlock> {
        let first = spans.first()?;

        let mut words: Vec<String> = Vec::new();
        let mut word = String::new();
        let mut right = first.x0;
        for span in spans {
            if !word.is_empty() && span.x0 - right >= self.word_gap {
                words.push(std::mem::take(&mut word));
            }
            word.push_str(&span.text);
            right = span.x1;
        }
        words.push(word);

        let text = words
            .iter()
            .map(|w| w.trim())
            .filter(|w| !w.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if text.is_empty() {
            return None;
        }

        let bbox = spans
            .iter()
            .map(|s| s.bbox(page))
            .reduce(|acc, b| acc.union(&b))?;
        let font_size = spans.iter().map(|s| s.height()).sum::<f32>() / spans.len() as f32;

        Some(TextBlock::new(text, bbox, Some(font_size), Some(first.font_name.clone())))
    }

    /// Drop prose lines that mostly sit inside an excluded region.
    ///
    /// Lines that classify as headings on their own are always kept, since
    /// table boxes often swallow captions and section titles.
    pub fn filter_excluded_regions(
        &self,
        blocks: Vec<TextBlock>,
        exclude_regions: &[BoundingBox],
    ) -> Vec<TextBlock> {
        if exclude_regions.is_empty() {
            return blocks;
        }

        let base_x = base_x_position(&blocks);
        blocks
            .into_iter()
            .filter(|block| {
                if self.classifier.classify(block, indentation(block, base_x)).is_some() {
                    return true;
                }
                let threshold = self.exclusion_overlap_threshold;
                !exclude_regions.iter().any(|region| block.bbox.overlap_ratio(region) > threshold)
            })
            .collect()
    }

    /// Classify lines and assemble them into a section forest.
    pub fn build_hierarchy(&self, blocks: &[TextBlock]) -> Vec<Section> {
        let base_x = base_x_position(blocks);
        let mut builder = SectionTreeBuilder::new();

        for block in blocks {
            let text = block.text.trim();

            if builder.awaiting_subtitle() && self.classifier.is_subtitle(text) {
                builder.add_subtitle(Section::new(1, text).with_bbox(block.bbox));
                continue;
            }

            match self.classifier.classify(block, indentation(block, base_x)) {
                Some(level) => builder.add_section(Section::new(level, text).with_bbox(block.bbox)),
                None => {
                    if !builder.add_content(text) {
                        log::debug!("Dropping line before first heading: {}", text);
                    }
                }
            }
        }

        builder.finish()
    }
}

fn indentation(block: &TextBlock, base_x: Option<f32>) -> u8 {
    base_x.map_or(0, |base| indentation_level(block.x_position(), base))
}
