/*!
 * In-place editing of a parsed document.
 *
 * Edits are applied as events that mark blocks dirty. `render` only
 * re-serializes when something changed since the last render.
 */

use std::collections::BTreeSet;

use log::debug;

use super::{serialize, DocumentSections, ParsedDocument, SubtitleBlock, SubtitleFormat};

/// A single change to the document
#[derive(Debug, Clone, PartialEq)]
pub enum EditEvent {
    /// Replace the text of the block at `position`
    UpdateText { position: usize, text: String },
    /// Replace the timing of the block at `position`
    UpdateTiming { position: usize, start: String, end: String },
    /// Change the style name of the block at `position`
    UpdateStyle { position: usize, style: String },
    /// Append an empty block that starts where the last one ends
    Append,
    /// Remove the block at `position` and renumber the rest
    Remove { position: usize },
    /// Replace every occurrence of `search` in block texts
    ReplaceAll { search: String, replace: String },
}

/// Editable subtitle document bound to an output format
#[derive(Debug, Clone)]
pub struct SubtitleEditor {
    blocks: Vec<SubtitleBlock>,
    sections: DocumentSections,
    format: SubtitleFormat,
    dirty: BTreeSet<usize>,
    structure_changed: bool,
    rendered: Option<String>,
}

impl SubtitleEditor {
    pub fn new(document: ParsedDocument, format: SubtitleFormat) -> Self {
        let (blocks, sections) = document.into_parts();
        Self {
            blocks,
            sections,
            format,
            dirty: BTreeSet::new(),
            structure_changed: false,
            rendered: None,
        }
    }

    pub fn blocks(&self) -> &[SubtitleBlock] {
        &self.blocks
    }

    pub fn format(&self) -> SubtitleFormat {
        self.format
    }

    /// Positions edited since the last render
    pub fn dirty_blocks(&self) -> Vec<usize> {
        self.dirty.iter().copied().collect()
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty() || self.structure_changed || self.rendered.is_none()
    }

    /// Replace all blocks at once, e.g. with a translation result
    pub fn replace_blocks(&mut self, blocks: Vec<SubtitleBlock>) {
        self.blocks = blocks;
        self.structure_changed = true;
    }

    /// Apply one edit; returns how many blocks it touched
    pub fn apply(&mut self, event: EditEvent) -> usize {
        match event {
            EditEvent::UpdateText { position, text } => self.update(position, |b| b.text = text),
            EditEvent::UpdateTiming { position, start, end } => self.update(position, |b| {
                b.start = start;
                b.end = end;
            }),
            EditEvent::UpdateStyle { position, style } => self.update(position, |b| b.style = style),
            EditEvent::Append => {
                let (index, at) = self
                    .blocks
                    .last()
                    .map(|b| (b.index + 1, b.end.clone()))
                    .unwrap_or((1, "00:00:00,000".to_string()));
                self.blocks.push(SubtitleBlock::new(index, at.clone(), at, String::new()));
                self.structure_changed = true;
                self.dirty.insert(self.blocks.len() - 1);
                1
            }
            EditEvent::Remove { position } => {
                if position >= self.blocks.len() {
                    debug!("Ignoring removal of missing block {}", position);
                    return 0;
                }
                self.blocks.remove(position);
                for (i, block) in self.blocks.iter_mut().enumerate() {
                    block.index = i + 1;
                }
                self.dirty = self.dirty.iter().filter(|&&d| d < position).copied().collect();
                self.structure_changed = true;
                1
            }
            EditEvent::ReplaceAll { search, replace } => {
                if search.is_empty() {
                    return 0;
                }
                let mut touched = 0;
                for (i, block) in self.blocks.iter_mut().enumerate() {
                    if block.text.contains(&search) {
                        block.text = block.text.replace(&search, &replace);
                        self.dirty.insert(i);
                        touched += 1;
                    }
                }
                touched
            }
        }
    }

    fn update(&mut self, position: usize, change: impl FnOnce(&mut SubtitleBlock)) -> usize {
        match self.blocks.get_mut(position) {
            Some(block) => {
                change(block);
                self.dirty.insert(position);
                1
            }
            None => {
                debug!("Ignoring edit of missing block {}", position);
                0
            }
        }
    }

    /// Current serialized text, rebuilt only when dirty
    pub fn render(&mut self) -> &str {
        if self.is_dirty() {
            self.rendered = Some(serialize(&self.blocks, self.format, &self.sections));
            self.dirty.clear();
            self.structure_changed = false;
        }
        self.rendered.as_deref().unwrap_or_default()
    }
}
