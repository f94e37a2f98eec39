//! Bullet paragraph consolidation.

use crate::model::Section;

const BULLET: &str = "• ";

/// Rejoin bullet paragraphs that were split across lines, in every section
/// of the forest.
pub fn consolidate_bullets(sections: &mut [Section]) {
    for section in sections {
        let content = std::mem::take(&mut section.content);
        section.content = consolidate_lines(content);
        consolidate_bullets(&mut section.children);
    }
}

/// Merge each `"• "` line with the plain lines that follow it.
///
/// Lines before the first bullet pass through untouched.
pub fn consolidate_lines(lines: Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(lines.len());
    let mut paragraph: Option<String> = None;

    for line in lines {
        if line.starts_with(BULLET) {
            out.extend(paragraph.replace(line));
        } else if let Some(buffer) = paragraph.as_mut() {
            buffer.push(' ');
            buffer.push_str(&line);
        } else {
            out.push(line);
        }
    }
    out.extend(paragraph);

    out
}
