use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::models::{Block, BlockId, Document};

/// Result of applying a command.
///
/// Describes the persistence work a mutation implies: blocks to write
/// (insert-or-replace by id), blocks to delete, and blocks whose position
/// alone changed. An empty patch means nothing needs writing.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub version: u64,
    pub focused: Option<BlockId>,
    pub upserted: Vec<BlockId>,
    pub deleted: Vec<BlockId>,
    pub reordered: Vec<(BlockId, usize)>,
    pub modified_at: DateTime<Utc>,
}

impl Patch {
    /// A patch for a call that changed nothing persistent
    pub(crate) fn unchanged(doc: &Document, version: u64, focused: Option<BlockId>) -> Self {
        Self {
            version,
            focused,
            upserted: Vec::new(),
            deleted: Vec::new(),
            reordered: Vec::new(),
            modified_at: doc.modified_at(),
        }
    }

    /// Diff the block list from before a mutation against the document now
    pub(crate) fn between(
        before: &[Block],
        after: &Document,
        version: u64,
        focused: Option<BlockId>,
    ) -> Self {
        let previous: HashMap<BlockId, &Block> = before.iter().map(|b| (b.id, b)).collect();
        let mut upserted = Vec::new();
        let mut reordered = Vec::new();

        for block in after.blocks() {
            match previous.get(&block.id) {
                None => upserted.push(block.id),
                Some(old) if !same_payload(old, block) => upserted.push(block.id),
                Some(old) if old.order != block.order => reordered.push((block.id, block.order)),
                Some(_) => {}
            }
        }

        let deleted = before
            .iter()
            .filter(|b| !after.contains(b.id))
            .map(|b| b.id)
            .collect();

        Self {
            version,
            focused,
            upserted,
            deleted,
            reordered,
            modified_at: after.modified_at(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.upserted.is_empty() && self.deleted.is_empty() && self.reordered.is_empty()
    }
}

/// Everything persisted about a block except its position
fn same_payload(a: &Block, b: &Block) -> bool {
    a.kind == b.kind
        && a.content == b.content
        && a.indent_level == b.indent_level
        && a.meta == b.meta
        && a.created_at == b.created_at
        && a.modified_at == b.modified_at
}
