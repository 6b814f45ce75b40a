//! Persistence boundary.
//!
//! The editor never writes anything itself. Front ends hand each [`Patch`]
//! to a [`WriteBack`], which batches changes and flushes them to a
//! [`BlockStore`] once edits have paused for the debounce interval.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use relative_path::{RelativePath, RelativePathBuf};

use crate::editing::Patch;
use crate::io::{self, IoError};
use crate::models::{Block, BlockId, Document, DocumentId};

/// Default pause after the last edit before pending changes are written
pub const DEFAULT_PERSIST_DEBOUNCE_MS: u64 = 500;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] IoError),
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Row-level storage for blocks.
///
/// Every operation is idempotent: upserting the same block twice or deleting
/// a missing id is not an error.
pub trait BlockStore {
    /// Insert or replace a block by id
    fn upsert(&mut self, document: DocumentId, block: &Block) -> Result<(), StoreError>;

    fn delete(&mut self, document: DocumentId, id: BlockId) -> Result<(), StoreError>;

    /// Bulk position update as (id, order) pairs
    fn reorder(
        &mut self,
        document: DocumentId,
        orders: &[(BlockId, usize)],
    ) -> Result<(), StoreError>;

    /// Record the document's modification time
    fn touch_document(
        &mut self,
        document: DocumentId,
        modified_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Default)]
struct StoredDocument {
    blocks: HashMap<BlockId, Block>,
    modified_at: Option<DateTime<Utc>>,
}

/// In-memory block table, keyed by document
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: HashMap<DocumentId, StoredDocument>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with every block of a document
    pub fn from_document(document: &Document) -> Self {
        let mut store = Self::new();
        let stored = store.documents.entry(document.id()).or_default();
        stored.blocks = document.blocks().map(|b| (b.id, b.clone())).collect();
        stored.modified_at = Some(document.modified_at());
        store
    }

    /// Stored blocks sorted by their order field
    pub fn ordered_blocks(&self, document: DocumentId) -> Vec<Block> {
        let mut blocks: Vec<Block> = self
            .documents
            .get(&document)
            .map(|d| d.blocks.values().cloned().collect())
            .unwrap_or_default();
        blocks.sort_by_key(|b| b.order);
        blocks
    }

    pub fn get(&self, document: DocumentId, id: BlockId) -> Option<&Block> {
        self.documents.get(&document)?.blocks.get(&id)
    }

    pub fn modified_at(&self, document: DocumentId) -> Option<DateTime<Utc>> {
        self.documents.get(&document)?.modified_at
    }
}

impl BlockStore for MemoryStore {
    fn upsert(&mut self, document: DocumentId, block: &Block) -> Result<(), StoreError> {
        self.documents
            .entry(document)
            .or_default()
            .blocks
            .insert(block.id, block.clone());
        Ok(())
    }

    fn delete(&mut self, document: DocumentId, id: BlockId) -> Result<(), StoreError> {
        if let Some(stored) = self.documents.get_mut(&document) {
            stored.blocks.remove(&id);
        }
        Ok(())
    }

    fn reorder(
        &mut self,
        document: DocumentId,
        orders: &[(BlockId, usize)],
    ) -> Result<(), StoreError> {
        let stored = self.documents.entry(document).or_default();
        for (id, order) in orders {
            if let Some(block) = stored.blocks.get_mut(id) {
                block.order = *order;
            }
        }
        Ok(())
    }

    fn touch_document(
        &mut self,
        document: DocumentId,
        modified_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.documents.entry(document).or_default().modified_at = Some(modified_at);
        Ok(())
    }
}

/// Stores one document as a markdown file under a notes root.
///
/// Row operations update an in-memory mirror; the file is rewritten from the
/// mirror when the document is touched, which [`WriteBack`] does last.
#[derive(Debug, Clone)]
pub struct MarkdownFileStore {
    notes_root: PathBuf,
    path: RelativePathBuf,
    mirror: MemoryStore,
}

impl MarkdownFileStore {
    pub fn open(notes_root: &Path, path: &RelativePath, document: &Document) -> Self {
        Self {
            notes_root: notes_root.to_path_buf(),
            path: path.to_relative_path_buf(),
            mirror: MemoryStore::from_document(document),
        }
    }

    pub fn path(&self) -> &RelativePath {
        &self.path
    }
}

impl BlockStore for MarkdownFileStore {
    fn upsert(&mut self, document: DocumentId, block: &Block) -> Result<(), StoreError> {
        self.mirror.upsert(document, block)
    }

    fn delete(&mut self, document: DocumentId, id: BlockId) -> Result<(), StoreError> {
        self.mirror.delete(document, id)
    }

    fn reorder(
        &mut self,
        document: DocumentId,
        orders: &[(BlockId, usize)],
    ) -> Result<(), StoreError> {
        self.mirror.reorder(document, orders)
    }

    fn touch_document(
        &mut self,
        document: DocumentId,
        modified_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.mirror.touch_document(document, modified_at)?;
        let stored = Document::from_blocks(self.mirror.ordered_blocks(document));
        io::save_document(&self.path, &self.notes_root, &stored)?;
        log::debug!("wrote {} blocks to {}", stored.len(), self.path);
        Ok(())
    }
}

/// Debounced write-behind for editor patches.
///
/// Patches accumulate as sets of dirty and deleted ids; a later change to a
/// block supersedes an earlier one because upserts always write the block as
/// it is at flush time. A failed flush keeps everything pending.
#[derive(Debug, Clone)]
pub struct WriteBack {
    debounce: Duration,
    dirty: HashSet<BlockId>,
    deleted: HashSet<BlockId>,
    reordered: bool,
    last_change: Option<DateTime<Utc>>,
}

impl WriteBack {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            debounce: Duration::milliseconds(i64::try_from(debounce_ms).unwrap_or(i64::MAX)),
            dirty: HashSet::new(),
            deleted: HashSet::new(),
            reordered: false,
            last_change: None,
        }
    }

    /// Queue the work a patch describes
    pub fn schedule(&mut self, patch: &Patch, now: DateTime<Utc>) {
        if patch.is_empty() {
            return;
        }
        for id in &patch.upserted {
            self.deleted.remove(id);
            self.dirty.insert(*id);
        }
        for id in &patch.deleted {
            self.dirty.remove(id);
            self.deleted.insert(*id);
        }
        self.reordered |= !patch.reordered.is_empty();
        self.last_change = Some(now);
    }

    pub fn is_pending(&self) -> bool {
        self.last_change.is_some()
    }

    /// Whether edits have paused long enough to write
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.last_change
            .is_some_and(|last| now - last >= self.debounce)
    }

    /// Write pending changes if the debounce has elapsed.
    ///
    /// Returns true when something was written. Failures are logged and the
    /// changes stay queued for the next attempt.
    pub fn flush(
        &mut self,
        store: &mut impl BlockStore,
        document: &Document,
        now: DateTime<Utc>,
    ) -> bool {
        if !self.is_due(now) {
            return false;
        }
        match self.flush_now(store, document) {
            Ok(written) => written,
            Err(e) => {
                log::warn!("Failed to persist document {}: {e}", document.id());
                false
            }
        }
    }

    /// Write pending changes immediately, ignoring the debounce
    pub fn flush_now(
        &mut self,
        store: &mut impl BlockStore,
        document: &Document,
    ) -> Result<bool, StoreError> {
        if !self.is_pending() {
            return Ok(false);
        }
        let doc_id = document.id();

        for id in &self.deleted {
            store.delete(doc_id, *id)?;
        }
        for id in &self.dirty {
            match document.get(*id) {
                Some(block) => store.upsert(doc_id, block)?,
                None => store.delete(doc_id, *id)?,
            }
        }
        if self.reordered {
            let orders: Vec<(BlockId, usize)> =
                document.blocks().map(|b| (b.id, b.order)).collect();
            store.reorder(doc_id, &orders)?;
        }
        store.touch_document(doc_id, document.modified_at())?;

        log::debug!(
            "persisted {} upserts, {} deletes for document {doc_id}",
            self.dirty.len(),
            self.deleted.len()
        );
        self.dirty.clear();
        self.deleted.clear();
        self.reordered = false;
        self.last_change = None;
        Ok(true)
    }
}

impl Default for WriteBack {
    fn default() -> Self {
        Self::new(DEFAULT_PERSIST_DEBOUNCE_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::Editor;
    use crate::models::BlockType;
    use crate::tests::create_test_notes_dir;
    use pretty_assertions::assert_eq;

    /// Store that can be switched into a failing state
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        failing: bool,
    }

    impl FlakyStore {
        fn check(&self) -> Result<(), StoreError> {
            if self.failing {
                return Err(StoreError::Unavailable("disk on fire".to_string()));
            }
            Ok(())
        }
    }

    impl BlockStore for FlakyStore {
        fn upsert(&mut self, document: DocumentId, block: &Block) -> Result<(), StoreError> {
            self.check()?;
            self.inner.upsert(document, block)
        }

        fn delete(&mut self, document: DocumentId, id: BlockId) -> Result<(), StoreError> {
            self.check()?;
            self.inner.delete(document, id)
        }

        fn reorder(
            &mut self,
            document: DocumentId,
            orders: &[(BlockId, usize)],
        ) -> Result<(), StoreError> {
            self.check()?;
            self.inner.reorder(document, orders)
        }

        fn touch_document(
            &mut self,
            document: DocumentId,
            modified_at: DateTime<Utc>,
        ) -> Result<(), StoreError> {
            self.check()?;
            self.inner.touch_document(document, modified_at)
        }
    }

    fn contents(blocks: &[Block]) -> Vec<&str> {
        blocks.iter().map(|b| b.content.as_str()).collect()
    }

    fn later(now: DateTime<Utc>, ms: i64) -> DateTime<Utc> {
        now + Duration::milliseconds(ms)
    }

    #[test]
    fn test_flush_waits_for_debounce() {
        let mut editor = Editor::new(Document::from_markdown("- a\n- b"));
        let mut store = MemoryStore::from_document(editor.document());
        let mut writeback = WriteBack::new(500);
        let ids = editor.document().ids().to_vec();
        let now = Utc::now();

        let patch = editor.update_content(ids[0], "alpha").unwrap();
        writeback.schedule(&patch, now);

        assert!(!writeback.flush(&mut store, editor.document(), later(now, 100)));
        assert_eq!(store.get(editor.document().id(), ids[0]).unwrap().content, "a");

        assert!(writeback.flush(&mut store, editor.document(), later(now, 500)));
        assert_eq!(
            store.get(editor.document().id(), ids[0]).unwrap().content,
            "alpha"
        );
        assert!(!writeback.is_pending());
    }

    #[test]
    fn test_store_mirrors_editor_after_mixed_edits() {
        let mut editor = Editor::new(Document::from_markdown("- a\n- b\n- c"));
        let doc_id = editor.document().id();
        let mut store = MemoryStore::from_document(editor.document());
        let mut writeback = WriteBack::new(0);
        let ids = editor.document().ids().to_vec();
        let now = Utc::now();

        let patches = [
            editor.delete(ids[1]).unwrap(),
            editor.insert_after(ids[2], BlockType::Text).unwrap(),
            editor.move_before(ids[2], ids[0]).unwrap(),
            editor.convert(ids[0], BlockType::Quote).unwrap(),
        ];
        for patch in &patches {
            writeback.schedule(patch, now);
        }
        writeback.flush_now(&mut store, editor.document()).unwrap();

        let stored = store.ordered_blocks(doc_id);
        let live: Vec<Block> = editor.blocks().cloned().collect();
        assert_eq!(stored, live);
        assert_eq!(store.modified_at(doc_id), Some(editor.document().modified_at()));
    }

    #[test]
    fn test_insert_then_delete_before_flush_writes_nothing_for_block() {
        let mut editor = Editor::new(Document::from_markdown("- a"));
        let doc_id = editor.document().id();
        let mut store = MemoryStore::from_document(editor.document());
        let mut writeback = WriteBack::new(0);
        let first = editor.focused().unwrap();
        let now = Utc::now();

        let inserted = editor.insert_after(first, BlockType::Text).unwrap();
        writeback.schedule(&inserted, now);
        let new_id = inserted.focused.unwrap();
        writeback.schedule(&editor.delete(new_id).unwrap(), now);

        writeback.flush_now(&mut store, editor.document()).unwrap();
        assert!(store.get(doc_id, new_id).is_none());
        assert_eq!(contents(&store.ordered_blocks(doc_id)), vec!["a"]);
    }

    #[test]
    fn test_failed_flush_keeps_changes_pending() {
        let mut editor = Editor::new(Document::from_markdown("- a"));
        let doc_id = editor.document().id();
        let mut store = FlakyStore {
            inner: MemoryStore::from_document(editor.document()),
            failing: true,
        };
        let mut writeback = WriteBack::new(0);
        let id = editor.focused().unwrap();
        let now = Utc::now();

        writeback.schedule(&editor.update_content(id, "edited").unwrap(), now);
        let before = editor.snapshot();

        assert!(!writeback.flush(&mut store, editor.document(), now));
        assert!(writeback.is_pending());
        assert_eq!(editor.snapshot(), before, "in-memory state is untouched");

        store.failing = false;
        assert!(writeback.flush(&mut store, editor.document(), now));
        assert_eq!(store.inner.get(doc_id, id).unwrap().content, "edited");
    }

    #[test]
    fn test_empty_patch_schedules_nothing() {
        let mut editor = Editor::new(Document::new());
        let mut writeback = WriteBack::default();
        writeback.schedule(&editor.focus_next(), Utc::now());
        assert!(!writeback.is_pending());
    }

    #[test]
    fn test_markdown_file_store_writes_on_flush() {
        let notes_dir = create_test_notes_dir();
        let path = RelativePath::new("journal/today.md");

        let mut editor = Editor::new(Document::from_markdown("# Today"));
        let mut store = MarkdownFileStore::open(notes_dir.path(), path, editor.document());
        let mut writeback = WriteBack::new(0);
        let heading = editor.focused().unwrap();

        let patch = editor.insert_after(heading, BlockType::CheckList).unwrap();
        writeback.schedule(&patch, Utc::now());
        let todo = patch.focused.unwrap();
        writeback.schedule(&editor.update_content(todo, "water plants").unwrap(), Utc::now());

        writeback.flush_now(&mut store, editor.document()).unwrap();
        let written = io::read_file(path, notes_dir.path()).unwrap();
        assert_eq!(written, "# Today\n- [ ] water plants\n");
        assert_eq!(store.path(), path);
    }
}
