//! Indented outline of a section tree, for inspection.

use std::fmt::Write;

use crate::model::{Document, Section};

/// Characters of section content shown per node.
const CONTENT_PREVIEW: usize = 100;

/// Render the section tree as an indented outline.
///
/// Each node shows its level and title, a preview of its content and its
/// table count. Nodes at `max_depth` or deeper are omitted; a depth of 0
/// means no limit.
pub fn to_outline(doc: &Document, max_depth: Option<usize>) -> String {
    let max_depth = max_depth.filter(|&depth| depth > 0);
    let name = doc
        .source_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let rule = "=".repeat(80);

    let mut out = String::new();
    let _ = writeln!(out, "Document: {}", name);
    let _ = writeln!(out, "{}", rule);
    for section in &doc.sections {
        write_section(&mut out, section, 0, max_depth);
    }
    let _ = writeln!(out, "{}", rule);
    out
}

fn write_section(out: &mut String, section: &Section, depth: usize, max_depth: Option<usize>) {
    if max_depth.is_some_and(|max| depth >= max) {
        return;
    }

    let indent = "  ".repeat(depth);
    let _ = writeln!(out, "{}{}. {}", indent, section.level, section.title);

    if !section.content.is_empty() {
        let preview: String = section.content.join(" ").chars().take(CONTENT_PREVIEW).collect();
        let _ = writeln!(out, "{}   Content: {}...", indent, preview);
    }
    if !section.tables.is_empty() {
        let _ = writeln!(out, "{}   Tables: {}", indent, section.tables.len());
    }

    for child in &section.children {
        write_section(out, child, depth + 1, max_depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Document {
        let mut child = Section::new(2, "1-1. 공급위치");
        child.content.push("서울특별시 강남구".to_string());
        let mut parent = Section::new(1, "1. 공급개요");
        parent.add_child(child);

        let mut doc = Document::new("/tmp/공고.pdf");
        doc.add_section(parent);
        doc
    }

    #[test]
    fn test_outline() {
        let outline = to_outline(&doc(), None);
        let lines: Vec<&str> = outline.lines().collect();
        assert_eq!(lines[0], "Document: 공고.pdf");
        assert_eq!(lines[2], "1. 1. 공급개요");
        assert_eq!(lines[3], "  2. 1-1. 공급위치");
        assert_eq!(lines[4], "     Content: 서울특별시 강남구...");
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn test_outline_max_depth() {
        let outline = to_outline(&doc(), Some(1));
        assert!(outline.contains("1. 1. 공급개요"));
        assert!(!outline.contains("공급위치"));
    }

    #[test]
    fn test_outline_zero_depth_is_unlimited() {
        assert_eq!(to_outline(&doc(), Some(0)), to_outline(&doc(), None));
        assert!(to_outline(&doc(), Some(0)).contains("1-1. 공급위치"));
    }
}
