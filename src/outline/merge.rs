//! Incremental outline merging.
//!
//! Each chunk of a document yields a fragment of the heading tree. Fragments
//! are folded into one accumulated outline:
//! 1. A title already present among its siblings keeps its position and has
//!    the incoming children merged into its own, one level down.
//! 2. A new title is appended after the existing siblings.
//! 3. The first non-empty table-of-contents text wins.

use indexmap::map::Entry;

use super::types::{DetectedToc, Outline, OutlineDocument, OutlineFragment};

/// Merge `incoming` into `base` in place and return `base`.
///
/// New subtrees are deep-copied, so later changes to `incoming` never reach
/// `base`.
pub fn merge_children<'a>(base: &'a mut Outline, incoming: &Outline) -> &'a mut Outline {
    for (title, node) in incoming {
        match base.get_mut(title) {
            Some(existing) => {
                merge_children(&mut existing.children, &node.children);
            }
            None => {
                base.insert(title.clone(), node.clone());
            }
        }
    }
    base
}

/// Owning variant of [`merge_children`] that moves new subtrees instead of
/// copying them.
pub fn merge_outline(base: &mut Outline, incoming: Outline) {
    for (title, node) in incoming {
        match base.entry(title) {
            Entry::Occupied(entry) => merge_outline(&mut entry.into_mut().children, node.children),
            Entry::Vacant(entry) => {
                entry.insert(node);
            }
        }
    }
}

/// Keep the first non-empty TOC text; later ones are ignored.
pub fn merge_toc(base: &mut DetectedToc, incoming: &DetectedToc) {
    if base.text().is_some() {
        return;
    }
    if let Some(text) = incoming.text() {
        base.raw_text = Some(text.to_string());
    }
}

/// Accumulates per-chunk fragments into a single [`OutlineDocument`].
#[derive(Debug, Clone, Default)]
pub struct OutlineMerger {
    document: OutlineDocument,
    fragments_merged: usize,
}

impl OutlineMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue from a previously saved document.
    pub fn from_document(document: OutlineDocument) -> Self {
        Self {
            document,
            fragments_merged: 0,
        }
    }

    pub fn absorb(&mut self, fragment: OutlineFragment) -> &OutlineDocument {
        merge_toc(&mut self.document.detected_toc, &fragment.detected_toc);
        merge_outline(&mut self.document.merged_structure, fragment.new_structure);
        self.fragments_merged += 1;
        &self.document
    }

    pub fn document(&self) -> &OutlineDocument {
        &self.document
    }

    pub fn into_document(self) -> OutlineDocument {
        self.document
    }

    pub fn fragments_merged(&self) -> usize {
        self.fragments_merged
    }

    pub fn is_empty(&self) -> bool {
        self.document.merged_structure.is_empty()
    }
}

pub fn merge_fragments<I>(fragments: I) -> OutlineDocument
where
    I: IntoIterator<Item = OutlineFragment>,
{
    let mut merger = OutlineMerger::new();
    for fragment in fragments {
        merger.absorb(fragment);
    }
    merger.into_document()
}
