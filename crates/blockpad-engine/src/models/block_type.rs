use serde::{Deserialize, Serialize};

/// Deepest heading level a block can carry
pub const MAX_HEADING_LEVEL: u8 = 6;

/// Grouping used by the slash-command picker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Basic,
    Lists,
    Media,
    Advanced,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::Basic => "Basic blocks",
            Category::Lists => "Lists",
            Category::Media => "Media",
            Category::Advanced => "Advanced",
        }
    }
}

/// The closed set of block variants.
///
/// Every behavior that depends on the variant matches on it exhaustively, so
/// adding a variant fails to compile until each site handles it.
///
/// Serializes as its string tag (`"heading2"`, `"bulletList"`, ...). Decoding
/// an unrecognised tag yields [`BlockType::Text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum BlockType {
    #[default]
    Text,
    Heading {
        level: u8,
    },
    BulletList,
    NumberedList,
    CheckList,
    Code,
    Quote,
    Divider,
    Callout,
    Toggle,
    Image,
    File,
    Table,
}

impl BlockType {
    /// Heading with the level clamped into `1..=6`.
    ///
    /// Prefer this over building `Heading { level }` directly; rendering
    /// clamps out-of-range levels the same way.
    pub const fn heading(level: u8) -> Self {
        let level = if level < 1 {
            1
        } else if level > MAX_HEADING_LEVEL {
            MAX_HEADING_LEVEL
        } else {
            level
        };
        BlockType::Heading { level }
    }

    /// Stable tag used for serialization and persistence rows
    pub fn tag(&self) -> String {
        match self {
            BlockType::Text => "text".to_string(),
            BlockType::Heading { level } => {
                format!("heading{}", (*level).clamp(1, MAX_HEADING_LEVEL))
            }
            BlockType::BulletList => "bulletList".to_string(),
            BlockType::NumberedList => "numberedList".to_string(),
            BlockType::CheckList => "checkList".to_string(),
            BlockType::Code => "code".to_string(),
            BlockType::Quote => "quote".to_string(),
            BlockType::Divider => "divider".to_string(),
            BlockType::Callout => "callout".to_string(),
            BlockType::Toggle => "toggle".to_string(),
            BlockType::Image => "image".to_string(),
            BlockType::File => "file".to_string(),
            BlockType::Table => "table".to_string(),
        }
    }

    /// Decode a tag, falling back to `Text` for anything unrecognised
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "text" => BlockType::Text,
            "bulletList" => BlockType::BulletList,
            "numberedList" => BlockType::NumberedList,
            "checkList" => BlockType::CheckList,
            "code" => BlockType::Code,
            "quote" => BlockType::Quote,
            "divider" => BlockType::Divider,
            "callout" => BlockType::Callout,
            "toggle" => BlockType::Toggle,
            "image" => BlockType::Image,
            "file" => BlockType::File,
            "table" => BlockType::Table,
            other => match other.strip_prefix("heading").map(str::parse::<u8>) {
                Some(Ok(level)) if (1..=MAX_HEADING_LEVEL).contains(&level) => {
                    BlockType::Heading { level }
                }
                _ => BlockType::Text,
            },
        }
    }

    /// Whether blocks of this type may be indented under a previous block
    pub fn supports_nesting(&self) -> bool {
        match self {
            BlockType::Text
            | BlockType::BulletList
            | BlockType::NumberedList
            | BlockType::CheckList
            | BlockType::Quote
            | BlockType::Toggle => true,
            BlockType::Heading { .. }
            | BlockType::Code
            | BlockType::Divider
            | BlockType::Callout
            | BlockType::Image
            | BlockType::File
            | BlockType::Table => false,
        }
    }

    pub fn supports_inline_formatting(&self) -> bool {
        match self {
            BlockType::Text
            | BlockType::Heading { .. }
            | BlockType::BulletList
            | BlockType::NumberedList
            | BlockType::CheckList
            | BlockType::Quote
            | BlockType::Callout
            | BlockType::Toggle => true,
            BlockType::Code
            | BlockType::Divider
            | BlockType::Image
            | BlockType::File
            | BlockType::Table => false,
        }
    }

    /// Whether the rendered form carries a running ordinal
    pub fn is_numbered(&self) -> bool {
        match self {
            BlockType::NumberedList => true,
            BlockType::Text
            | BlockType::Heading { .. }
            | BlockType::BulletList
            | BlockType::CheckList
            | BlockType::Code
            | BlockType::Quote
            | BlockType::Divider
            | BlockType::Callout
            | BlockType::Toggle
            | BlockType::Image
            | BlockType::File
            | BlockType::Table => false,
        }
    }

    /// Whether the block carries user-editable text at all
    pub fn has_content(&self) -> bool {
        match self {
            BlockType::Divider => false,
            BlockType::Text
            | BlockType::Heading { .. }
            | BlockType::BulletList
            | BlockType::NumberedList
            | BlockType::CheckList
            | BlockType::Code
            | BlockType::Quote
            | BlockType::Callout
            | BlockType::Toggle
            | BlockType::Image
            | BlockType::File
            | BlockType::Table => true,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            BlockType::Text | BlockType::Heading { .. } => Category::Basic,
            BlockType::BulletList
            | BlockType::NumberedList
            | BlockType::CheckList
            | BlockType::Toggle => Category::Lists,
            BlockType::Image | BlockType::File => Category::Media,
            BlockType::Code
            | BlockType::Quote
            | BlockType::Divider
            | BlockType::Callout
            | BlockType::Table => Category::Advanced,
        }
    }
}

impl From<BlockType> for String {
    fn from(kind: BlockType) -> Self {
        kind.tag()
    }
}

impl From<String> for BlockType {
    fn from(tag: String) -> Self {
        BlockType::from_tag(&tag)
    }
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.tag())
    }
}
