use std::sync::OnceLock;

use regex::Regex;

use super::{FENCE, INDENT_WIDTH, autoformat};
use crate::models::{Block, BlockType, MAX_INDENT};

struct LinePatterns {
    task: Regex,
    heading: Regex,
    callout: Regex,
    toggle: Regex,
    image: Regex,
    bare_ordinal: Regex,
}

fn patterns() -> &'static LinePatterns {
    static PATTERNS: OnceLock<LinePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| LinePatterns {
        task: Regex::new(r"^[-*+] \[([ xX])\](?: (.*))?$").expect("Invalid task regex"),
        heading: Regex::new(r"^(#{1,6})(?: (.*))?$").expect("Invalid heading regex"),
        callout: Regex::new(r"^> \[!([^\]]*)\](?: (.*))?$").expect("Invalid callout regex"),
        toggle: Regex::new(r"^<details><summary>(.*)</summary></details>$")
            .expect("Invalid toggle regex"),
        image: Regex::new(r"^!\[([^\]]*)\]\(([^)]*)\)$").expect("Invalid image regex"),
        bare_ordinal: Regex::new(r"^\d+\.$").expect("Invalid ordinal regex"),
    })
}

/// Parse markdown into blocks, one per non-blank line.
///
/// Fenced code and runs of `|` table rows become single blocks. Indentation
/// maps to indent level at two spaces (or one tab) per level. Constructs
/// outside the block catalog degrade to text.
pub fn from_markdown(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut lines = text.lines().peekable();

    while let Some(raw) = lines.next() {
        let (level, width) = measure_indent(raw);
        let line = raw[width..].trim_end();
        if line.is_empty() {
            continue;
        }

        let block = if let Some(info) = line.strip_prefix(FENCE) {
            let mut body = Vec::new();
            for inner in lines.by_ref() {
                if inner.trim_start().starts_with(FENCE) {
                    break;
                }
                body.push(strip_indent(inner, width));
            }
            let block = Block::new(BlockType::Code, body.join("\n"));
            match info.trim() {
                "" => block,
                language => block.with_language(language),
            }
        } else if line.starts_with('|') {
            let mut rows = vec![line.to_string()];
            while let Some(next) = lines.next_if(|next| next.trim_start().starts_with('|')) {
                rows.push(next.trim().to_string());
            }
            Block::new(BlockType::Table, rows.join("\n"))
        } else {
            parse_line(line)
        };

        blocks.push(block.with_indent(level));
    }

    for (order, block) in blocks.iter_mut().enumerate() {
        block.order = order;
    }
    blocks
}

fn parse_line(line: &str) -> Block {
    let patterns = patterns();

    if let Some(caps) = patterns.task.captures(line) {
        let checked = !caps[1].trim().is_empty();
        return Block::new(BlockType::CheckList, capture_or_empty(&caps, 2)).with_checked(checked);
    }
    if let Some(caps) = patterns.heading.captures(line) {
        let level = u8::try_from(caps[1].len()).unwrap_or(1);
        return Block::new(BlockType::heading(level), capture_or_empty(&caps, 2));
    }
    if let Some(caps) = patterns.callout.captures(line) {
        let block = Block::new(BlockType::Callout, capture_or_empty(&caps, 2));
        return match &caps[1] {
            "" => block,
            icon => block.with_icon(icon),
        };
    }
    if let Some(caps) = patterns.toggle.captures(line) {
        return Block::new(BlockType::Toggle, &caps[1]);
    }
    if let Some(caps) = patterns.image.captures(line) {
        let block = Block::new(BlockType::Image, &caps[1]);
        return match &caps[2] {
            "" => block,
            source => block.with_source(source),
        };
    }

    // empty list items and quotes lose their trailing space to the trim
    match line {
        "-" | "*" => return Block::new(BlockType::BulletList, ""),
        ">" => return Block::new(BlockType::Quote, ""),
        _ if patterns.bare_ordinal.is_match(line) => {
            return Block::new(BlockType::NumberedList, "");
        }
        _ => {}
    }

    match autoformat::recognize(BlockType::Text, line) {
        Some(conversion) => {
            let block = Block::new(conversion.kind, conversion.content);
            match conversion.checked {
                Some(checked) => block.with_checked(checked),
                None => block,
            }
        }
        None => Block::text(line),
    }
}

fn capture_or_empty(caps: &regex::Captures<'_>, index: usize) -> String {
    caps.get(index)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Indent level and byte width of the leading whitespace
fn measure_indent(line: &str) -> (u8, usize) {
    let mut spaces = 0;
    let mut tabs = 0;
    let mut width = 0;
    for c in line.chars() {
        match c {
            ' ' => spaces += 1,
            '\t' => tabs += 1,
            _ => break,
        }
        width += 1;
    }
    let level = (spaces / INDENT_WIDTH + tabs).min(usize::from(MAX_INDENT));
    (level as u8, width)
}

fn strip_indent(line: &str, width: usize) -> &str {
    let strip = line
        .char_indices()
        .take(width)
        .take_while(|(_, c)| *c == ' ' || *c == '\t')
        .count();
    &line[strip..]
}
