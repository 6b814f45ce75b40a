use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::BlockType;

/// Deepest outline nesting a block can sit at
pub const MAX_INDENT: u8 = 6;

/// Stable identity of a block; survives conversion, reorder and undo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub Uuid);

impl BlockId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Type-specific metadata.
///
/// Fields stay in place across conversions so that converting away from a
/// type and back restores its settings. Read them through the accessors on
/// [`Block`], which only report values relevant to the current type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded: Option<bool>,
    /// Placeholder reference for image/file blocks (URL or relative path)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Defaults applied to metadata when a block is converted into a type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaDefaults {
    pub code_language: String,
    pub callout_icon: String,
}

impl Default for MetaDefaults {
    fn default() -> Self {
        Self {
            code_language: "plaintext".to_string(),
            callout_icon: "💡".to_string(),
        }
    }
}

/// One addressable unit of document content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    #[serde(rename = "type")]
    pub kind: BlockType,
    pub content: String,
    /// Linear position; the owning document keeps this contiguous
    pub order: usize,
    pub indent_level: u8,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    #[serde(default)]
    pub meta: BlockMeta,
}

impl Block {
    /// Create a block with fresh identity and type defaults initialized
    pub fn new(kind: BlockType, content: impl Into<String>) -> Self {
        Self::with_defaults(kind, content, &MetaDefaults::default())
    }

    pub fn with_defaults(
        kind: BlockType,
        content: impl Into<String>,
        defaults: &MetaDefaults,
    ) -> Self {
        let now = Utc::now();
        let mut block = Self {
            id: BlockId::new(),
            kind,
            content: content.into(),
            order: 0,
            indent_level: 0,
            created_at: now,
            modified_at: now,
            meta: BlockMeta::default(),
        };
        block.meta.init_for(kind, defaults);
        block
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::new(BlockType::Text, content)
    }

    pub fn with_indent(mut self, level: u8) -> Self {
        self.indent_level = level.min(MAX_INDENT);
        self
    }

    pub fn with_checked(mut self, checked: bool) -> Self {
        self.meta.checked = Some(checked);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.meta.language = Some(language.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.meta.icon = Some(icon.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.meta.source = Some(source.into());
        self
    }

    /// Checkbox state; always false for anything but a check list item
    pub fn checked(&self) -> bool {
        self.kind == BlockType::CheckList && self.meta.checked.unwrap_or(false)
    }

    pub fn language(&self) -> Option<&str> {
        self.meta
            .language
            .as_deref()
            .filter(|_| self.kind == BlockType::Code)
    }

    pub fn icon(&self) -> Option<&str> {
        self.meta
            .icon
            .as_deref()
            .filter(|_| self.kind == BlockType::Callout)
    }

    /// Toggle state; toggles open by default
    pub fn expanded(&self) -> bool {
        self.kind == BlockType::Toggle && self.meta.expanded.unwrap_or(true)
    }

    pub fn source(&self) -> Option<&str> {
        self.meta
            .source
            .as_deref()
            .filter(|_| matches!(self.kind, BlockType::Image | BlockType::File))
    }

    /// Markdown form of this block on its own (numbered items render as `1.`)
    pub fn to_markdown(&self) -> String {
        crate::markdown::render_block(self, 1)
    }

    /// Change type in place, keeping content and initializing type defaults
    pub(crate) fn convert(&mut self, kind: BlockType, defaults: &MetaDefaults) {
        self.kind = kind;
        self.meta.init_for(kind, defaults);
        self.touch();
    }

    pub(crate) fn set_content(&mut self, content: String) {
        self.content = content;
        self.touch();
    }

    pub(crate) fn touch(&mut self) {
        self.modified_at = Utc::now();
    }
}

impl BlockMeta {
    /// Fill in defaults for `kind` where nothing is set yet
    pub fn init_for(&mut self, kind: BlockType, defaults: &MetaDefaults) {
        match kind {
            BlockType::Code => {
                self.language
                    .get_or_insert_with(|| defaults.code_language.clone());
            }
            BlockType::Callout => {
                self.icon.get_or_insert_with(|| defaults.callout_icon.clone());
            }
            BlockType::CheckList => {
                self.checked.get_or_insert(false);
            }
            BlockType::Toggle => {
                self.expanded.get_or_insert(true);
            }
            BlockType::Text
            | BlockType::Heading { .. }
            | BlockType::BulletList
            | BlockType::NumberedList
            | BlockType::Quote
            | BlockType::Divider
            | BlockType::Image
            | BlockType::File
            | BlockType::Table => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_new_block_initializes_type_defaults() {
        let code = Block::new(BlockType::Code, "fn main() {}");
        assert_eq!(code.language(), Some("plaintext"));

        let callout = Block::new(BlockType::Callout, "Note");
        assert_eq!(callout.icon(), Some("💡"));

        let todo = Block::new(BlockType::CheckList, "Buy milk");
        assert_eq!(todo.meta.checked, Some(false));
        assert!(!todo.checked());
    }

    #[test]
    fn test_irrelevant_metadata_reads_as_absent() {
        let block = Block::text("plain").with_checked(true).with_language("rust");
        assert!(!block.checked());
        assert_eq!(block.language(), None);
        assert_eq!(block.icon(), None);
        assert!(!block.expanded());
        assert_eq!(block.source(), None);
    }

    #[test]
    fn test_convert_keeps_content_and_existing_meta() {
        let mut block = Block::new(BlockType::Code, "let x = 1;").with_language("rust");
        let defaults = MetaDefaults::default();

        block.convert(BlockType::Text, &defaults);
        assert_eq!(block.content, "let x = 1;");
        assert_eq!(block.language(), None);

        block.convert(BlockType::Code, &defaults);
        assert_eq!(block.language(), Some("rust"));
    }

    #[test]
    fn test_convert_refreshes_modified_at() {
        let mut block = Block::text("hello");
        let created = block.created_at;
        let stale = Utc::now() - Duration::hours(1);
        block.modified_at = stale;

        block.convert(BlockType::Quote, &MetaDefaults::default());
        assert!(block.modified_at > stale);
        assert_eq!(block.created_at, created);
    }

    #[test]
    fn test_set_content_refreshes_modified_at() {
        let mut block = Block::text("hello");
        let stale = Utc::now() - Duration::hours(1);
        block.modified_at = stale;

        block.set_content("hello there".to_string());
        assert!(block.modified_at > stale);
    }

    #[test]
    fn test_with_indent_clamps() {
        assert_eq!(Block::text("x").with_indent(42).indent_level, MAX_INDENT);
    }

    #[test]
    fn test_block_serializes_type_field() {
        let block = Block::new(BlockType::heading(2), "Title");
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["type"], "heading2");
        assert_eq!(value["content"], "Title");

        let decoded: Block = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, block);
    }
}
