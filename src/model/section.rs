//! Section tree nodes.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{BoundingBox, TableData};

/// One node of the document hierarchy.
///
/// `level` is the classified heading depth (0 = document title, 1 = top
/// section, ...). Children are not required to be exactly one level deeper
/// than their parent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub level: u8,
    pub title: String,
    #[serde(skip)]
    pub bbox: Option<BoundingBox>,
    /// Prose lines that belong directly to this node
    pub content: Vec<String>,
    pub children: Vec<Section>,
    pub tables: Vec<TableData>,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Section {
    pub fn new(level: u8, title: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            bbox: None,
            content: Vec::new(),
            children: Vec::new(),
            tables: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Set the heading box and return self.
    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    pub fn add_child(&mut self, child: Section) {
        self.children.push(child);
    }

    pub fn add_table(&mut self, table: TableData) {
        self.tables.push(table);
    }

    /// This section plus all of its descendants.
    pub fn count_sections(&self) -> usize {
        1 + self.children.iter().map(Section::count_sections).sum::<usize>()
    }

    /// Depth-first, pre-order traversal of this subtree.
    pub fn walk(&self) -> Vec<&Section> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(section) = stack.pop() {
            out.push(section);
            stack.extend(section.children.iter().rev());
        }
        out
    }

    /// Remove every attached table from this subtree.
    pub fn clear_tables(&mut self) {
        self.tables.clear();
        for child in &mut self.children {
            child.clear_tables();
        }
    }

    /// Serialize into the exported section shape.
    pub fn to_dict(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let indent = "  ".repeat(self.level.saturating_sub(1) as usize);
        write!(
            f,
            "{}{}. {} ({} subsections, {} tables)",
            indent,
            self.level,
            self.title,
            self.children.len(),
            self.tables.len()
        )
    }
}
