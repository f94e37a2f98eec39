//! Document-level types.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Section, TableData};

/// A reconstructed announcement document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    /// Path the document was parsed from
    #[serde(rename = "source")]
    pub source_path: PathBuf,

    /// Top-level sections, in reading order
    pub sections: Vec<Section>,

    /// Counts and source metadata
    pub metadata: DocumentMetadata,
}

impl Document {
    /// Create an empty document for a source path.
    pub fn new(source_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            sections: Vec::new(),
            metadata: DocumentMetadata::default(),
        }
    }

    /// Add a top-level section.
    pub fn add_section(&mut self, section: Section) {
        self.sections.push(section);
    }

    /// All tables attached anywhere in the tree, depth-first.
    ///
    /// This walks the tree on every call; the result is not cached.
    pub fn get_all_tables(&self) -> Vec<&TableData> {
        self.sections
            .iter()
            .flat_map(|s| s.walk())
            .flat_map(|s| s.tables.iter())
            .collect()
    }

    /// First section (depth-first) whose title contains `pattern`,
    /// ignoring case.
    pub fn find_section(&self, pattern: &str) -> Option<&Section> {
        let pattern = pattern.to_lowercase();
        self.sections
            .iter()
            .flat_map(|s| s.walk())
            .find(|s| s.title.to_lowercase().contains(&pattern))
    }

    /// Total number of sections, nested ones included.
    pub fn count_sections(&self) -> usize {
        self.sections.iter().map(Section::count_sections).sum()
    }

    /// Serialize into the exported document shape.
    pub fn to_dict(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Document metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentMetadata {
    /// Number of sections in the final tree
    pub total_sections: usize,

    /// Number of tables after cross-page merging, attached or not
    pub total_tables: usize,

    /// Number of pages in the source
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,

    /// PDF version (e.g., "1.7")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_version: Option<String>,

    /// Title from the PDF Info dictionary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Author from the PDF Info dictionary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundingBox, Flavor, TableFrame, TableMetadata};

    fn table(page: usize) -> TableData {
        TableData::new(
            TableFrame::from_rows(vec![vec!["a".to_string()]]),
            Some(BoundingBox::new(0.0, 0.0, 10.0, 10.0, page)),
            page,
            TableMetadata::new(Flavor::Lattice, 90.0),
        )
    }

    fn sample_document() -> Document {
        let mut child = Section::new(2, "3-1. 신청자격");
        child.add_table(table(1));
        let mut top = Section::new(1, "3. 신청자격 및 일정");
        top.add_table(table(0));
        top.add_child(child);

        let mut doc = Document::new("notice.pdf");
        doc.add_section(Section::new(0, "행복주택 입주자 모집공고"));
        doc.add_section(top);
        doc
    }

    #[test]
    fn test_get_all_tables_recurses() {
        let doc = sample_document();
        let pages: Vec<usize> = doc.get_all_tables().iter().map(|t| t.page).collect();
        assert_eq!(pages, vec![0, 1]);
    }

    #[test]
    fn test_find_section_case_insensitive() {
        let mut doc = sample_document();
        doc.add_section(Section::new(1, "Appendix A"));

        assert_eq!(doc.find_section("신청자격").unwrap().title, "3. 신청자격 및 일정");
        assert_eq!(doc.find_section("appendix").unwrap().title, "Appendix A");
        assert!(doc.find_section("missing").is_none());
    }

    #[test]
    fn test_count_sections() {
        assert_eq!(sample_document().count_sections(), 3);
    }

    #[test]
    fn test_to_dict_shape() {
        let mut doc = sample_document();
        doc.metadata.total_sections = 3;
        doc.metadata.total_tables = 2;

        let dict = doc.to_dict();
        assert_eq!(dict["source"], "notice.pdf");
        assert_eq!(dict["metadata"]["total_sections"], 3);
        assert_eq!(dict["metadata"]["total_tables"], 2);
        assert!(dict["metadata"].get("title").is_none());
        assert_eq!(dict["sections"].as_array().unwrap().len(), 2);
        assert_eq!(dict["sections"][1]["children"][0]["tables"][0]["page"], 1);
    }
}
