//! Heading classification.
//!
//! A line becomes a heading through its numbering pattern, its leading
//! marker, or its font. Indentation is measured against the most common left
//! edge of the page body.

use std::collections::HashMap;

use regex::Regex;

use crate::error::{Error, Result};
use crate::model::TextBlock;

/// Width of an indentation step (points).
const INDENT_STEP: f32 = 20.0;

/// Left edges are rounded to multiples of this before taking the mode.
const BASE_X_BUCKET: f32 = 5.0;

/// Section levels by leading marker. `"• "` is deliberately absent.
const MARKER_LEVELS: [(&str, u8); 4] = [("■ ", 2), ("▪ ", 3), ("○ ", 3), ("▶ ", 3)];

/// Pattern and font based heading classifier.
#[derive(Debug, Clone)]
pub struct HeadingClassifier {
    numbered: Regex,
    sub_numbered: Regex,
    lettered: Regex,
    subtitle: Regex,
    /// Numbered headings below this size are demoted
    pub small_font: f32,
    /// Lines above this size are document titles
    pub title_font: f32,
    /// Lines above this size (or bold) are headings by indentation
    pub heading_font: f32,
}

impl HeadingClassifier {
    pub fn new() -> Result<Self> {
        Ok(Self {
            numbered: compile(r"^\d+\.\s+.+")?,
            sub_numbered: compile(r"^\d+-\d+\.\s+.+")?,
            lettered: compile(r"^[가-힣]\.\s+.+")?,
            subtitle: compile(r"^\(.*\)$")?,
            small_font: 10.0,
            title_font: 14.0,
            heading_font: 12.0,
        })
    }

    /// Heading level of a line, or `None` for prose.
    ///
    /// `indentation` is the line's indentation level, 0 when no base
    /// position is known. Only the stateless rules apply here; subtitles
    /// depend on the tree built so far and are checked by [`is_subtitle`].
    ///
    /// [`is_subtitle`]: Self::is_subtitle
    pub fn classify(&self, block: &TextBlock, indentation: u8) -> Option<u8> {
        let text = block.text.trim();
        let font_size = block.font_size;

        if self.numbered.is_match(text) {
            let small = font_size.is_some_and(|size| size < self.small_font);
            if indentation > 1 || small {
                return Some(indentation.max(3));
            }
            return Some(1);
        }

        if self.sub_numbered.is_match(text) {
            return Some(2);
        }

        if self.lettered.is_match(text) {
            return Some(3);
        }

        let marker = MARKER_LEVELS.iter().find(|(marker, _)| text.starts_with(marker));
        if let Some(&(_, level)) = marker {
            return Some(level);
        }

        if font_size.is_some_and(|size| size > self.title_font) {
            return Some(0);
        }

        let large = font_size.is_some_and(|size| size > self.heading_font);
        if (block.is_bold || large) && indentation > 0 {
            return Some(indentation);
        }

        None
    }

    /// Whole-line parenthesized text of 5 to 80 characters.
    pub fn is_subtitle(&self, text: &str) -> bool {
        let text = text.trim();
        let len = text.chars().count();
        (5..=80).contains(&len) && self.subtitle.is_match(text)
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::Other(format!("invalid heading pattern: {e}")))
}

/// Most common left edge, rounded to 5 points. Ties go to the smallest edge.
pub fn base_x_position(blocks: &[TextBlock]) -> Option<f32> {
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for block in blocks {
        let bucket = (block.x_position() / BASE_X_BUCKET).round() as i64;
        *counts.entry(bucket).or_default() += 1;
    }

    counts
        .into_iter()
        .max_by(|(a_bucket, a_count), (b_bucket, b_count)| {
            a_count.cmp(b_count).then(b_bucket.cmp(a_bucket))
        })
        .map(|(bucket, _)| bucket as f32 * BASE_X_BUCKET)
}

/// Indentation level 1-4 of a left edge relative to the base position.
pub fn indentation_level(x: f32, base_x: f32) -> u8 {
    let indent = x - base_x;
    if indent < INDENT_STEP {
        1
    } else if indent < INDENT_STEP * 2.0 {
        2
    } else if indent < INDENT_STEP * 3.0 {
        3
    } else {
        4
    }
}
