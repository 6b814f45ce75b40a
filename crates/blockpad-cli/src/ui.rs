use blockpad_engine::editing::{SlashMenu, slash_menu};
use blockpad_engine::markdown::ListNumbering;
use blockpad_engine::models::{Block, BlockType, MAX_HEADING_LEVEL};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block as Panel, Borders, Clear, List, ListItem, ListState, Paragraph},
};

use crate::app::App;

pub fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(0), Constraint::Length(1), Constraint::Length(1)].as_ref())
        .split(f.area());

    render_blocks(f, app, chunks[0]);

    let dirty = if app.is_dirty() { " [+]" } else { "" };
    let status = Paragraph::new(Line::from(vec![
        Span::styled(format!("{}{dirty}", app.page()), Style::default().fg(Color::Yellow)),
        Span::raw(" | "),
        Span::raw(app.status.as_str()),
    ]));
    f.render_widget(status, chunks[1]);

    let help_text = Line::from(vec![
        Span::raw("Esc/^Q: Quit | "),
        Span::raw("^S: Save | "),
        Span::raw("^Z/^Y: Undo/Redo | "),
        Span::raw("/: Block type | "),
        Span::raw("Tab/⇧Tab: Indent | "),
        Span::raw("Alt+↑/↓: Move | "),
        Span::raw("^X: Check/Fold"),
    ]);
    f.render_widget(Paragraph::new(help_text), chunks[2]);

    if let Some(menu) = app.editor.slash_menu() {
        render_slash_menu(f, menu, chunks[0]);
    }
}

fn render_blocks(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.editor.focused();
    let mut numbering = ListNumbering::default();
    let mut lines = Vec::new();

    for block in app.editor.blocks() {
        let number = numbering.next(block);
        let is_focused = Some(block.id) == focused;
        let gutter = if is_focused { "▌ " } else { "  " };
        let indent = "  ".repeat(usize::from(block.indent_level));
        let (marker, style) = decoration(block, number);

        let mut content_lines = block.content.split('\n');
        let first = content_lines.next().unwrap_or_default();
        let mut spans = vec![
            Span::styled(gutter, Style::default().fg(Color::Cyan)),
            Span::raw(indent.clone()),
            Span::styled(marker, Style::default().fg(Color::DarkGray)),
            Span::styled(first.to_string(), style),
        ];
        if is_focused && block.kind.has_content() {
            spans.push(Span::styled("█", Style::default().fg(Color::Gray)));
        }
        lines.push(Line::from(spans));

        for rest in content_lines {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::raw(indent.clone()),
                Span::styled(rest.to_string(), style),
            ]));
        }
    }

    if lines.is_empty() {
        lines.push(Line::from("Empty page, start typing"));
    }

    let title = format!("blockpad: {}", app.page());
    let paragraph = Paragraph::new(lines).block(Panel::default().borders(Borders::ALL).title(title));
    f.render_widget(paragraph, area);
}

/// Leading glyph and text style for a block
fn decoration(block: &Block, number: usize) -> (String, Style) {
    let plain = Style::default();
    match block.kind {
        BlockType::Text => (String::new(), plain),
        BlockType::Heading { level } => (
            format!("{} ", "#".repeat(usize::from(level.clamp(1, MAX_HEADING_LEVEL)))),
            plain.add_modifier(Modifier::BOLD),
        ),
        BlockType::BulletList => ("• ".to_string(), plain),
        BlockType::NumberedList => (format!("{number}. "), plain),
        BlockType::CheckList => {
            if block.checked() {
                ("☑ ".to_string(), plain.add_modifier(Modifier::CROSSED_OUT))
            } else {
                ("☐ ".to_string(), plain)
            }
        }
        BlockType::Code => (
            format!("[{}] ", block.language().unwrap_or_default()),
            plain.fg(Color::Green),
        ),
        BlockType::Quote => ("│ ".to_string(), plain.add_modifier(Modifier::ITALIC)),
        BlockType::Divider => ("────────".to_string(), plain),
        BlockType::Callout => (
            format!("{} ", block.icon().unwrap_or_default()),
            plain.fg(Color::Magenta),
        ),
        BlockType::Toggle => {
            let arrow = if block.expanded() { "▾ " } else { "▸ " };
            (arrow.to_string(), plain)
        }
        BlockType::Image => ("🖼 ".to_string(), plain.fg(Color::Blue)),
        BlockType::File => ("📎 ".to_string(), plain.fg(Color::Blue)),
        BlockType::Table => (String::new(), plain.fg(Color::Yellow)),
    }
}

fn render_slash_menu(f: &mut Frame, menu: &SlashMenu, area: Rect) {
    let mut items = Vec::new();
    let mut selected_row = None;

    for (category, commands) in slash_menu::grouped(menu.results()) {
        items.push(ListItem::new(Line::from(Span::styled(
            category.label(),
            Style::default().add_modifier(Modifier::BOLD),
        ))));
        for command in commands {
            if menu.selected().is_some_and(|s| s.kind == command.kind) {
                selected_row = Some(items.len());
            }
            items.push(ListItem::new(Line::from(vec![
                Span::raw(format!("  {:<3} ", command.icon)),
                Span::raw(command.name),
                Span::styled(
                    format!("  {}", command.description),
                    Style::default().fg(Color::DarkGray),
                ),
            ])));
        }
    }
    if items.is_empty() {
        items.push(ListItem::new("No matching block types"));
    }

    let width = area.width.min(56);
    let height = area.height.min(u16::try_from(items.len() + 2).unwrap_or(u16::MAX));
    let popup = Rect::new(area.x + 2, area.y + 1, width.saturating_sub(2), height.saturating_sub(1));

    let list = List::new(items)
        .block(
            Panel::default()
                .borders(Borders::ALL)
                .title(format!("/{}", menu.query())),
        )
        .highlight_style(Style::default().bg(Color::Yellow).fg(Color::Black));
    let mut state = ListState::default();
    state.select(selected_row);

    f.render_widget(Clear, popup);
    f.render_stateful_widget(list, popup, &mut state);
}
