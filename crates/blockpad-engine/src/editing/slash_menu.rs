use crate::models::{BlockId, BlockType, Category};

/// One entry in the slash-command catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlashCommand {
    pub kind: BlockType,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub keywords: &'static [&'static str],
}

impl SlashCommand {
    /// Case-insensitive substring match on name, description or any keyword.
    ///
    /// `needle` must already be lowercase.
    fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self.keywords.iter().any(|k| k.to_lowercase().contains(needle))
    }
}

const fn entry(
    kind: BlockType,
    name: &'static str,
    description: &'static str,
    icon: &'static str,
    keywords: &'static [&'static str],
) -> SlashCommand {
    SlashCommand {
        kind,
        name,
        description,
        icon,
        keywords,
    }
}

static CATALOG: [SlashCommand; 15] = [
    entry(
        BlockType::Text,
        "Text",
        "Start writing with plain text",
        "¶",
        &["paragraph", "plain", "body"],
    ),
    entry(
        BlockType::heading(1),
        "Heading 1",
        "Big section heading",
        "H1",
        &["h1", "title"],
    ),
    entry(
        BlockType::heading(2),
        "Heading 2",
        "Medium section heading",
        "H2",
        &["h2", "subtitle"],
    ),
    entry(
        BlockType::heading(3),
        "Heading 3",
        "Small section heading",
        "H3",
        &["h3"],
    ),
    entry(
        BlockType::BulletList,
        "Bulleted list",
        "Create a simple bulleted list",
        "•",
        &["bullet", "unordered", "ul"],
    ),
    entry(
        BlockType::NumberedList,
        "Numbered list",
        "Create a list with numbering",
        "1.",
        &["ordered", "ol", "number"],
    ),
    entry(
        BlockType::CheckList,
        "To-do list",
        "Track tasks with a checkbox",
        "☐",
        &["todo", "task", "checkbox", "check"],
    ),
    entry(
        BlockType::Toggle,
        "Toggle list",
        "Collapsible content",
        "▸",
        &["collapse", "expand", "details"],
    ),
    entry(
        BlockType::Quote,
        "Quote",
        "Capture a quotation",
        "❝",
        &["blockquote", "cite"],
    ),
    entry(
        BlockType::Callout,
        "Callout",
        "Make writing stand out",
        "💡",
        &["note", "tip", "warning", "info"],
    ),
    entry(
        BlockType::Code,
        "Code",
        "Capture a code snippet",
        "</>",
        &["snippet", "program", "fence"],
    ),
    entry(
        BlockType::Divider,
        "Divider",
        "Visually divide blocks",
        "—",
        &["separator", "line", "hr", "rule"],
    ),
    entry(
        BlockType::Image,
        "Image",
        "Embed a picture",
        "🖼",
        &["picture", "photo", "media"],
    ),
    entry(
        BlockType::File,
        "File",
        "Attach a file",
        "📎",
        &["attachment", "upload", "document"],
    ),
    entry(
        BlockType::Table,
        "Table",
        "Rows and columns",
        "▦",
        &["grid", "spreadsheet"],
    ),
];

/// The full catalog in canonical order
pub fn catalog() -> &'static [SlashCommand] {
    &CATALOG
}

/// Filter the catalog; an empty query returns everything
pub fn filter(query: &str) -> Vec<&'static SlashCommand> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return CATALOG.iter().collect();
    }
    CATALOG.iter().filter(|cmd| cmd.matches(&needle)).collect()
}

/// Group results by category, keeping first-appearance order of categories
pub fn grouped<'a>(
    results: &[&'a SlashCommand],
) -> Vec<(Category, Vec<&'a SlashCommand>)> {
    let mut groups: Vec<(Category, Vec<&'a SlashCommand>)> = Vec::new();
    for &cmd in results {
        let category = cmd.kind.category();
        match groups.iter_mut().find(|(c, _)| *c == category) {
            Some((_, members)) => members.push(cmd),
            None => groups.push((category, vec![cmd])),
        }
    }
    groups
}

/// Picker state while the menu is open for one block
#[derive(Debug, Clone, PartialEq)]
pub struct SlashMenu {
    target: BlockId,
    query: String,
    selected: usize,
    results: Vec<&'static SlashCommand>,
}

impl SlashMenu {
    pub fn open(target: BlockId) -> Self {
        Self {
            target,
            query: String::new(),
            selected: 0,
            results: filter(""),
        }
    }

    pub fn target(&self) -> BlockId {
        self.target
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &[&'static SlashCommand] {
        &self.results
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// Currently highlighted entry, None when nothing matches
    pub fn selected(&self) -> Option<&'static SlashCommand> {
        self.results.get(self.selected).copied()
    }

    /// Replace the query; selection resets to the top when it changed
    pub fn set_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        if query == self.query {
            return;
        }
        self.results = filter(&query);
        self.query = query;
        self.selected = 0;
    }

    pub fn select(&mut self, index: usize) {
        self.selected = index.min(self.results.len().saturating_sub(1));
    }

    pub fn select_next(&mut self) {
        self.select(self.selected.saturating_add(1));
    }

    pub fn select_previous(&mut self) {
        self.select(self.selected.saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn kinds(results: &[&SlashCommand]) -> Vec<BlockType> {
        results.iter().map(|c| c.kind).collect()
    }

    #[test]
    fn test_empty_query_returns_full_catalog_in_order() {
        let results = filter("");
        assert_eq!(results.len(), catalog().len());
        assert_eq!(kinds(&results), kinds(&catalog().iter().collect::<Vec<_>>()));
        assert_eq!(filter("   ").len(), catalog().len());
    }

    #[test]
    fn test_head_matches_only_headings() {
        assert_eq!(
            kinds(&filter("head")),
            vec![
                BlockType::heading(1),
                BlockType::heading(2),
                BlockType::heading(3)
            ]
        );
    }

    #[rstest]
    #[case("HEAD", 3)]
    #[case("todo", 1)]
    #[case("checkbox", 1)]
    #[case("divide", 1)]
    #[case("zzz", 0)]
    fn test_filter_is_case_insensitive_over_all_fields(#[case] query: &str, #[case] count: usize) {
        assert_eq!(filter(query).len(), count);
    }

    #[test]
    fn test_keyword_match() {
        assert_eq!(kinds(&filter("hr")), vec![BlockType::Divider]);
        assert_eq!(kinds(&filter("snippet")), vec![BlockType::Code]);
    }

    #[test]
    fn test_catalog_headings_are_unique_to_head_query() {
        for cmd in catalog() {
            let is_heading = matches!(cmd.kind, BlockType::Heading { .. });
            assert_eq!(cmd.matches("head"), is_heading, "{}", cmd.name);
        }
    }

    #[test]
    fn test_selection_clamps() {
        let mut menu = SlashMenu::open(BlockId::new());
        menu.set_query("head");
        menu.select(10);
        assert_eq!(menu.selected_index(), 2);
        menu.select_next();
        assert_eq!(menu.selected_index(), 2);
        menu.select(0);
        menu.select_previous();
        assert_eq!(menu.selected_index(), 0);
    }

    #[test]
    fn test_query_change_resets_selection() {
        let mut menu = SlashMenu::open(BlockId::new());
        menu.select(4);
        assert_eq!(menu.selected_index(), 4);

        menu.set_query("list");
        assert_eq!(menu.selected_index(), 0);
        menu.select(1);

        menu.set_query("list");
        assert_eq!(menu.selected_index(), 1, "same query keeps selection");
    }

    #[test]
    fn test_no_results_has_no_selection() {
        let mut menu = SlashMenu::open(BlockId::new());
        menu.set_query("nothing matches this");
        menu.select_next();
        assert_eq!(menu.selected_index(), 0);
        assert_eq!(menu.selected(), None);
    }

    #[test]
    fn test_grouping_keeps_order() {
        let results = filter("");
        let groups = grouped(&results);
        let categories: Vec<Category> = groups.iter().map(|(c, _)| *c).collect();
        assert_eq!(
            categories,
            vec![
                Category::Basic,
                Category::Lists,
                Category::Advanced,
                Category::Media
            ]
        );
        let total: usize = groups.iter().map(|(_, members)| members.len()).sum();
        assert_eq!(total, catalog().len());
    }
}
