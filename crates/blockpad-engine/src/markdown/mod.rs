//! Conversion between block lists and flat markdown.
//!
//! Export renders one line per block (a fence for code), indented two
//! spaces per indent level. Import is line-oriented and best effort: it
//! recognizes the forms export produces plus the auto-format triggers, and
//! anything else becomes a text block.

pub mod autoformat;
mod import;

pub use autoformat::{Conversion, recognize};
pub use import::from_markdown;

use crate::models::{Block, BlockType, MAX_HEADING_LEVEL, MAX_INDENT};

/// Spaces per indent level in exported markdown
pub const INDENT_WIDTH: usize = 2;

pub(crate) const FENCE: &str = "```";

/// Render blocks in the given order as markdown, joined by newlines
pub fn to_markdown<'a>(blocks: impl IntoIterator<Item = &'a Block>) -> String {
    let mut lines = Vec::new();
    let mut numbering = ListNumbering::default();

    for block in blocks {
        let number = numbering.next(block);
        let prefix = " ".repeat(INDENT_WIDTH * usize::from(block.indent_level.min(MAX_INDENT)));
        for line in render_block(block, number).split('\n') {
            if line.is_empty() {
                lines.push(String::new());
            } else {
                lines.push(format!("{prefix}{line}"));
            }
        }
    }

    lines.join("\n")
}

/// Render a single block without indentation.
///
/// `number` is the ordinal shown for numbered list items.
pub fn render_block(block: &Block, number: usize) -> String {
    let content = block.content.as_str();
    match block.kind {
        BlockType::Text => content.to_string(),
        BlockType::Heading { level } => {
            let level = level.clamp(1, MAX_HEADING_LEVEL);
            format!("{} {}", "#".repeat(usize::from(level)), content)
        }
        BlockType::BulletList => format!("- {content}"),
        BlockType::NumberedList => format!("{number}. {content}"),
        BlockType::CheckList => {
            let mark = if block.checked() { 'x' } else { ' ' };
            format!("- [{mark}] {content}")
        }
        BlockType::Code => {
            let language = block.language().unwrap_or_default();
            if content.is_empty() {
                format!("{FENCE}{language}\n{FENCE}")
            } else {
                format!("{FENCE}{language}\n{content}\n{FENCE}")
            }
        }
        BlockType::Quote => format!("> {content}"),
        BlockType::Divider => "---".to_string(),
        BlockType::Callout => {
            format!("> [!{}] {content}", block.icon().unwrap_or_default())
        }
        BlockType::Toggle => format!("<details><summary>{content}</summary></details>"),
        BlockType::Image => format!("![{content}]({})", block.source().unwrap_or_default()),
        BlockType::File => format!("[{content}]({})", block.source().unwrap_or_default()),
        BlockType::Table => content.to_string(),
    }
}

/// Running numbers for numbered list items, one counter per indent level.
///
/// Feed every block in document order. A block that is not a numbered item
/// resets the counter at its own level; returning to a shallower level
/// resets everything deeper.
#[derive(Debug, Default)]
pub struct ListNumbering {
    counters: [usize; MAX_INDENT as usize + 1],
}

impl ListNumbering {
    /// Number to show for `block` (1 for anything not numbered)
    pub fn next(&mut self, block: &Block) -> usize {
        let level = usize::from(block.indent_level.min(MAX_INDENT));
        for deeper in &mut self.counters[level + 1..] {
            *deeper = 0;
        }
        if block.kind.is_numbered() {
            self.counters[level] += 1;
        } else {
            self.counters[level] = 0;
        }
        self.counters[level].max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MetaDefaults;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_headings_and_bullets() {
        let blocks = vec![
            Block::new(BlockType::heading(1), "Title"),
            Block::new(BlockType::BulletList, "A"),
            Block::new(BlockType::BulletList, "B"),
        ];
        assert_eq!(to_markdown(&blocks), "# Title\n- A\n- B");
    }

    #[test]
    fn test_empty_list_renders_empty_string() {
        assert_eq!(to_markdown(&Vec::<Block>::new()), "");
    }

    #[test]
    fn test_indentation_prefixes_every_line() {
        let blocks = vec![
            Block::new(BlockType::BulletList, "parent"),
            Block::new(BlockType::BulletList, "child").with_indent(1),
            Block::new(BlockType::Code, "let x = 1;\nlet y = 2;")
                .with_language("rust")
                .with_indent(2),
        ];
        insta::assert_snapshot!(to_markdown(&blocks), @r"
        - parent
          - child
            ```rust
            let x = 1;
            let y = 2;
            ```
        ");
    }

    #[test]
    fn test_numbering_restarts_after_interruption() {
        let blocks = vec![
            Block::new(BlockType::NumberedList, "one"),
            Block::new(BlockType::NumberedList, "two"),
            Block::new(BlockType::NumberedList, "nested").with_indent(1),
            Block::new(BlockType::NumberedList, "three"),
            Block::text("break"),
            Block::new(BlockType::NumberedList, "again"),
        ];
        insta::assert_snapshot!(to_markdown(&blocks), @r"
        1. one
        2. two
          1. nested
        3. three
        break
        1. again
        ");
    }

    #[test]
    fn test_every_block_type_renders() {
        let blocks = vec![
            Block::text("Plain"),
            Block::new(BlockType::heading(4), "Deep"),
            Block::new(BlockType::CheckList, "todo"),
            Block::new(BlockType::CheckList, "done").with_checked(true),
            Block::new(BlockType::Quote, "wise words"),
            Block::new(BlockType::Divider, ""),
            Block::new(BlockType::Callout, "heads up").with_icon("⚠️"),
            Block::new(BlockType::Toggle, "more"),
            Block::new(BlockType::Image, "diagram").with_source("img/diagram.png"),
            Block::new(BlockType::File, "report").with_source("files/report.pdf"),
            Block::new(BlockType::Table, "| a | b |\n| - | - |"),
            Block::new(BlockType::Code, ""),
        ];
        insta::assert_snapshot!(to_markdown(&blocks), @r"
        Plain
        #### Deep
        - [ ] todo
        - [x] done
        > wise words
        ---
        > [!⚠️] heads up
        <details><summary>more</summary></details>
        ![diagram](img/diagram.png)
        [report](files/report.pdf)
        | a | b |
        | - | - |
        ```plaintext
        ```
        ");
    }

    #[test]
    fn test_callout_uses_its_own_icon() {
        let defaults = MetaDefaults {
            callout_icon: "📌".to_string(),
            ..MetaDefaults::default()
        };
        let pinned = Block::with_defaults(BlockType::Callout, "pinned", &defaults);
        assert_eq!(pinned.to_markdown(), "> [!📌] pinned");

        let mut bare = Block::new(BlockType::Callout, "bare");
        bare.meta.icon = None;
        assert_eq!(bare.to_markdown(), "> [!] bare");
    }

    #[test]
    fn test_raw_heading_levels_render_clamped() {
        let shallow = Block::new(BlockType::Heading { level: 0 }, "zero");
        let deep = Block::new(BlockType::Heading { level: 9 }, "nine");
        assert_eq!(shallow.to_markdown(), "# zero");
        assert_eq!(deep.to_markdown(), "###### nine");
    }

    #[test]
    fn test_single_block_markdown() {
        assert_eq!(
            Block::new(BlockType::NumberedList, "solo").to_markdown(),
            "1. solo"
        );
        assert_eq!(Block::new(BlockType::heading(2), "Sub").to_markdown(), "## Sub");
    }
}
