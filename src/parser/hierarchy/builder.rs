//! Stack-driven section tree assembly.

use crate::model::Section;

/// Builds a section forest from a stream of headings and prose lines.
///
/// The builder keeps a stack of open sections as a path of child indices
/// into the forest. A heading at level `L > 0` closes every open section of
/// level `>= L`, becomes a child of the remaining innermost section (or a new
/// top-level section) and is opened itself. Level-0 titles go straight to the
/// forest and leave the stack alone.
#[derive(Debug, Default)]
pub struct SectionTreeBuilder {
    forest: Vec<Section>,
    /// Index path of open sections, outermost first
    open: Vec<usize>,
    /// The last event was a level-0 title
    after_title: bool,
}

impl SectionTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a heading section.
    pub fn add_section(&mut self, section: Section) {
        let level = section.level;
        self.after_title = level == 0;

        if level == 0 {
            self.forest.push(section);
            return;
        }

        while self.innermost().is_some_and(|open| open.level >= level) {
            self.open.pop();
        }

        let index = match self.innermost_mut() {
            Some(parent) => {
                parent.add_child(section);
                parent.children.len() - 1
            }
            None => {
                self.forest.push(section);
                self.forest.len() - 1
            }
        };
        self.open.push(index);
    }

    /// Append a prose line to the innermost open section, falling back to the
    /// most recent top-level section. Returns `false` if there is neither.
    pub fn add_content(&mut self, text: impl Into<String>) -> bool {
        self.after_title = false;

        let target = if self.open.is_empty() {
            self.forest.last_mut()
        } else {
            self.innermost_mut()
        };

        match target {
            Some(section) => {
                section.content.push(text.into());
                true
            }
            None => false,
        }
    }

    /// Whether the previous event was a level-0 title that is still empty.
    pub fn awaiting_subtitle(&self) -> bool {
        self.after_title
            && self.forest.last().is_some_and(|title| {
                title.level == 0 && title.children.is_empty() && title.content.is_empty()
            })
    }

    /// Attach a subtitle to the latest title without opening it.
    ///
    /// Falls back to [`add_section`](Self::add_section) when no title is
    /// waiting for one.
    pub fn add_subtitle(&mut self, subtitle: Section) {
        if !self.awaiting_subtitle() {
            self.add_section(subtitle);
            return;
        }

        self.after_title = false;
        if let Some(title) = self.forest.last_mut() {
            title.add_child(subtitle);
        }
    }

    /// Number of currently open sections.
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Consume the builder and return the forest.
    pub fn finish(self) -> Vec<Section> {
        self.forest
    }

    fn innermost(&self) -> Option<&Section> {
        let (&first, rest) = self.open.split_first()?;
        let mut section = self.forest.get(first)?;
        for &index in rest {
            section = section.children.get(index)?;
        }
        Some(section)
    }

    fn innermost_mut(&mut self) -> Option<&mut Section> {
        let (&first, rest) = self.open.split_first()?;
        let mut section = self.forest.get_mut(first)?;
        for &index in rest {
            section = section.children.get_mut(index)?;
        }
        Some(section)
    }
}
