use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Block, BlockId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One note: an arena of blocks keyed by id plus their linear sequence.
///
/// The sequence is authoritative for position; `Block::order` mirrors it and
/// is rewritten to `0..n-1` after every structural change.
#[derive(Debug, Clone)]
pub struct Document {
    id: DocumentId,
    blocks: HashMap<BlockId, Block>,
    sequence: Vec<BlockId>,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

impl Document {
    /// A new note holding a single empty text block
    pub fn new() -> Self {
        Self::from_blocks(vec![Block::text("")])
    }

    /// A note with no blocks at all
    pub fn empty() -> Self {
        Self::from_blocks(Vec::new())
    }

    /// Build a document from blocks, ordering them by their `order` field.
    ///
    /// Ties keep their input position; the result is reindexed.
    pub fn from_blocks(mut blocks: Vec<Block>) -> Self {
        blocks.sort_by_key(|b| b.order);
        let now = Utc::now();
        let mut doc = Self {
            id: DocumentId::new(),
            blocks: HashMap::with_capacity(blocks.len()),
            sequence: Vec::with_capacity(blocks.len()),
            created_at: now,
            modified_at: now,
        };
        doc.replace_all(blocks);
        doc
    }

    /// Parse markdown into a new document
    pub fn from_markdown(text: &str) -> Self {
        Self::from_blocks(crate::markdown::from_markdown(text))
    }

    pub fn to_markdown(&self) -> String {
        crate::markdown::to_markdown(self.blocks())
    }

    pub fn with_id(mut self, id: DocumentId) -> Self {
        self.id = id;
        self
    }

    /// Carry over a stored modification time
    pub fn with_modified_at(mut self, at: DateTime<Utc>) -> Self {
        self.modified_at = at;
        self
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.blocks.contains_key(&id)
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.blocks.get_mut(&id)
    }

    /// Position of a block in the linear order
    pub fn index_of(&self, id: BlockId) -> Option<usize> {
        self.blocks.get(&id).map(|b| b.order)
    }

    pub fn id_at(&self, index: usize) -> Option<BlockId> {
        self.sequence.get(index).copied()
    }

    /// Ids in linear order
    pub fn ids(&self) -> &[BlockId] {
        &self.sequence
    }

    /// Blocks in linear order
    pub fn blocks(&self) -> impl Iterator<Item = &Block> + '_ {
        self.sequence.iter().filter_map(|id| self.blocks.get(id))
    }

    pub(crate) fn insert_at(&mut self, index: usize, block: Block) {
        let index = index.min(self.sequence.len());
        self.sequence.insert(index, block.id);
        self.blocks.insert(block.id, block);
        self.reindex_from(index);
    }

    pub(crate) fn remove(&mut self, id: BlockId) -> Option<Block> {
        let block = self.blocks.remove(&id)?;
        let index = block.order.min(self.sequence.len());
        self.sequence.retain(|other| *other != id);
        self.reindex_from(index);
        Some(block)
    }

    /// Move `id` so it sits immediately before `before`
    pub(crate) fn move_before(&mut self, id: BlockId, before: BlockId) {
        self.sequence.retain(|other| *other != id);
        let target = self
            .sequence
            .iter()
            .position(|other| *other == before)
            .unwrap_or(self.sequence.len());
        self.sequence.insert(target, id);
        self.reindex_from(0);
    }

    /// Swap in a whole new block list, used when restoring history
    pub(crate) fn replace_all(&mut self, blocks: Vec<Block>) {
        self.blocks.clear();
        self.sequence.clear();
        for block in blocks {
            self.sequence.push(block.id);
            self.blocks.insert(block.id, block);
        }
        self.reindex_from(0);
    }

    pub(crate) fn touch(&mut self) {
        self.modified_at = Utc::now();
    }

    fn reindex_from(&mut self, start: usize) {
        for (order, id) in self.sequence.iter().enumerate().skip(start) {
            if let Some(block) = self.blocks.get_mut(id) {
                block.order = order;
            }
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.blocks().eq(other.blocks())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BlockType;
    use pretty_assertions::assert_eq;

    fn orders(doc: &Document) -> Vec<usize> {
        doc.blocks().map(|b| b.order).collect()
    }

    fn contents(doc: &Document) -> Vec<&str> {
        doc.blocks().map(|b| b.content.as_str()).collect()
    }

    #[test]
    fn test_new_document_is_seeded() {
        let doc = Document::new();
        assert_eq!(doc.len(), 1);
        let seed = doc.blocks().next().unwrap();
        assert_eq!(seed.kind, BlockType::Text);
        assert_eq!(seed.content, "");
        assert_eq!(seed.order, 0);
    }

    #[test]
    fn test_from_blocks_sorts_and_reindexes() {
        let mut a = Block::text("a");
        a.order = 10;
        let mut b = Block::text("b");
        b.order = 3;
        let mut c = Block::text("c");
        c.order = 3;

        let doc = Document::from_blocks(vec![a, b, c]);
        assert_eq!(contents(&doc), vec!["b", "c", "a"]);
        assert_eq!(orders(&doc), vec![0, 1, 2]);
    }

    #[test]
    fn test_insert_and_remove_keep_orders_contiguous() {
        let mut doc = Document::from_blocks(vec![Block::text("a"), Block::text("c")]);
        let b = Block::text("b");
        let b_id = b.id;
        doc.insert_at(1, b);
        assert_eq!(contents(&doc), vec!["a", "b", "c"]);
        assert_eq!(orders(&doc), vec![0, 1, 2]);

        let first = doc.id_at(0).unwrap();
        doc.remove(first);
        assert_eq!(contents(&doc), vec!["b", "c"]);
        assert_eq!(orders(&doc), vec![0, 1]);
        assert_eq!(doc.index_of(b_id), Some(0));
    }

    #[test]
    fn test_move_before_reindexes_whole_list() {
        let mut doc = Document::from_blocks(vec![
            Block::text("a"),
            Block::text("b"),
            Block::text("c"),
        ]);
        let a = doc.id_at(0).unwrap();
        let c = doc.id_at(2).unwrap();
        doc.move_before(c, a);
        assert_eq!(contents(&doc), vec!["c", "a", "b"]);
        assert_eq!(orders(&doc), vec![0, 1, 2]);
    }

    #[test]
    fn test_remove_unknown_is_none() {
        let mut doc = Document::new();
        assert!(doc.remove(BlockId::new()).is_none());
        assert_eq!(doc.len(), 1);
    }
}
