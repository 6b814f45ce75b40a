pub mod block;
pub mod block_type;
pub mod document;

pub use block::{Block, BlockId, BlockMeta, MAX_INDENT, MetaDefaults};
pub use block_type::{BlockType, Category, MAX_HEADING_LEVEL};
pub use document::{Document, DocumentId};
