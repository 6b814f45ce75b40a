pub mod editing;
pub mod io;
pub mod markdown;
pub mod models;
pub mod persist;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use editing::{Cmd, EditError, Editor, EditorSettings, Patch};
pub use io::*;
pub use models::{Block, BlockId, BlockMeta, BlockType, Document, DocumentId, MetaDefaults};
pub use persist::{BlockStore, MarkdownFileStore, MemoryStore, StoreError, WriteBack};
