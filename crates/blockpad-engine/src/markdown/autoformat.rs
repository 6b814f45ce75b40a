//! Live auto-formatting: promotes a block to a typed block when its content
//! starts with a markdown-like trigger.
//!
//! The rule table is evaluated in priority order against the whole content
//! after every content update. The first matching rule decides; it only
//! fires when its target differs from the block's current type, so running
//! the recognizer on its own output never converts again.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::BlockType;

/// A conversion decided by the recognizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub kind: BlockType,
    /// Content with the trigger removed
    pub content: String,
    /// Checkbox state for check list triggers
    pub checked: Option<bool>,
}

#[derive(Debug, Clone, Copy)]
enum Trigger {
    /// Content starts with this text; the text is dropped
    Prefix(&'static str),
    /// `^\d+\. `; everything through the first space is dropped
    Ordinal,
    /// Content equals this text exactly; content is cleared
    Whole(&'static str),
}

#[derive(Debug, Clone, Copy)]
struct Rule {
    trigger: Trigger,
    target: BlockType,
    checked: Option<bool>,
}

const fn rule(trigger: Trigger, target: BlockType) -> Rule {
    Rule {
        trigger,
        target,
        checked: None,
    }
}

const RULES: &[Rule] = &[
    rule(Trigger::Prefix("# "), BlockType::heading(1)),
    rule(Trigger::Prefix("## "), BlockType::heading(2)),
    rule(Trigger::Prefix("### "), BlockType::heading(3)),
    rule(Trigger::Prefix("- "), BlockType::BulletList),
    rule(Trigger::Prefix("* "), BlockType::BulletList),
    rule(Trigger::Ordinal, BlockType::NumberedList),
    rule(Trigger::Prefix("> "), BlockType::Quote),
    rule(Trigger::Prefix("```"), BlockType::Code),
    Rule {
        trigger: Trigger::Prefix("[ ] "),
        target: BlockType::CheckList,
        checked: Some(false),
    },
    Rule {
        trigger: Trigger::Prefix("[x] "),
        target: BlockType::CheckList,
        checked: Some(true),
    },
    rule(Trigger::Whole("---"), BlockType::Divider),
    rule(Trigger::Whole("***"), BlockType::Divider),
];

fn ordinal_regex() -> &'static Regex {
    static ORDINAL: OnceLock<Regex> = OnceLock::new();
    ORDINAL.get_or_init(|| Regex::new(r"^\d+\. ").expect("Invalid ordinal regex"))
}

impl Trigger {
    /// Content left after the trigger, or None if it does not match
    fn strip<'a>(&self, content: &'a str) -> Option<&'a str> {
        match self {
            Trigger::Prefix(prefix) => content.strip_prefix(prefix),
            Trigger::Ordinal => ordinal_regex()
                .find(content)
                .map(|m| &content[m.end()..]),
            Trigger::Whole(text) => (content == *text).then_some(""),
        }
    }
}

/// Decide whether `content` typed into a block of type `current` converts it
pub fn recognize(current: BlockType, content: &str) -> Option<Conversion> {
    let (rule, rest) = RULES
        .iter()
        .find_map(|rule| rule.trigger.strip(content).map(|rest| (rule, rest)))?;

    if rule.target == current {
        return None;
    }

    Some(Conversion {
        kind: rule.target,
        content: rest.to_string(),
        checked: rule.checked,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("# Hello", BlockType::heading(1), "Hello")]
    #[case("## Hello", BlockType::heading(2), "Hello")]
    #[case("### Hello", BlockType::heading(3), "Hello")]
    #[case("- item", BlockType::BulletList, "item")]
    #[case("* item", BlockType::BulletList, "item")]
    #[case("1. first", BlockType::NumberedList, "first")]
    #[case("42. answer", BlockType::NumberedList, "answer")]
    #[case("> quoted", BlockType::Quote, "quoted")]
    #[case("```rust", BlockType::Code, "rust")]
    #[case("```", BlockType::Code, "")]
    #[case("[ ] todo", BlockType::CheckList, "todo")]
    #[case("[x] done", BlockType::CheckList, "done")]
    #[case("---", BlockType::Divider, "")]
    #[case("***", BlockType::Divider, "")]
    fn test_rule_fires_from_text(
        #[case] content: &str,
        #[case] kind: BlockType,
        #[case] remaining: &str,
    ) {
        let conversion = recognize(BlockType::Text, content).expect("rule should fire");
        assert_eq!(conversion.kind, kind);
        assert_eq!(conversion.content, remaining);
    }

    #[rstest]
    #[case("plain text")]
    #[case("#hashtag")]
    #[case("-dash")]
    #[case("1.no space")]
    #[case("a. lettered")]
    #[case("---trailing")]
    #[case("[] not a box")]
    #[case("")]
    fn test_no_rule_matches(#[case] content: &str) {
        assert_eq!(recognize(BlockType::Text, content), None);
    }

    #[test]
    fn test_checkbox_state_follows_trigger() {
        let unchecked = recognize(BlockType::Text, "[ ] a").unwrap();
        assert_eq!(unchecked.checked, Some(false));
        let checked = recognize(BlockType::Text, "[x] a").unwrap();
        assert_eq!(checked.checked, Some(true));
    }

    #[test]
    fn test_does_not_fire_for_same_type() {
        assert_eq!(recognize(BlockType::heading(1), "# Again"), None);
        assert_eq!(recognize(BlockType::BulletList, "- nested dash"), None);
        assert_eq!(recognize(BlockType::CheckList, "[x] already a box"), None);
    }

    #[test]
    fn test_recognizing_own_output_is_stable() {
        let first = recognize(BlockType::Text, "# Hello").unwrap();
        assert_eq!(first.kind, BlockType::heading(1));
        assert_eq!(first.content, "Hello");
        assert_eq!(recognize(first.kind, &first.content), None);
    }

    #[test]
    fn test_priority_prefers_earlier_rule() {
        // "- " is checked before the whole-content divider rule
        let conversion = recognize(BlockType::Text, "- --").unwrap();
        assert_eq!(conversion.kind, BlockType::BulletList);
        assert_eq!(conversion.content, "--");
    }

    #[test]
    fn test_fires_from_other_typed_blocks() {
        let conversion = recognize(BlockType::heading(2), "> now a quote").unwrap();
        assert_eq!(conversion.kind, BlockType::Quote);
        assert_eq!(conversion.content, "now a quote");
    }
}
