use chrono::{DateTime, Duration, Utc};

use crate::editing::{
    Cmd, EditError, EditorSettings, Patch,
    history::{EditorState, History},
    slash_menu::SlashMenu,
};
use crate::markdown::autoformat;
use crate::models::{Block, BlockId, BlockType, Document, MAX_INDENT};

/// Consecutive text edits to one block that share a single undo entry
#[derive(Debug, Clone, Copy)]
struct TypingRun {
    block: BlockId,
    at: DateTime<Utc>,
}

/// Stateful controller for one open document.
///
/// Owns the document's block arena, the focused block, the undo/redo
/// history and the slash menu. Every mutating operation validates its ids
/// before touching anything, records the pre-mutation state for undo, and
/// returns a [`Patch`] describing what changed.
///
/// One editor serves one document and is driven from one task; calls take
/// `&mut self` and are never interleaved.
///
/// ```rust
/// # use blockpad_engine::editing::Editor;
/// # use blockpad_engine::models::{BlockType, Document};
/// let mut editor = Editor::new(Document::new());
/// let first = editor.focused().unwrap();
///
/// editor.update_content(first, "# Groceries").unwrap();
/// let patch = editor.insert_after(first, BlockType::CheckList).unwrap();
/// editor.update_content(patch.focused.unwrap(), "eggs").unwrap();
///
/// assert_eq!(editor.to_markdown(), "# Groceries\n- [ ] eggs");
/// editor.undo();
/// assert_eq!(editor.to_markdown(), "# Groceries\n- [ ] ");
/// ```
#[derive(Debug, Clone)]
pub struct Editor {
    document: Document,
    focused: Option<BlockId>,
    history: History,
    slash_menu: Option<SlashMenu>,
    settings: EditorSettings,
    version: u64,
    typing: Option<TypingRun>,
}

impl Editor {
    pub fn new(document: Document) -> Self {
        Self::with_settings(document, EditorSettings::default())
    }

    pub fn with_settings(document: Document, settings: EditorSettings) -> Self {
        let focused = document.id_at(0);
        Self {
            history: History::new(settings.history_limit),
            document,
            focused,
            slash_menu: None,
            settings,
            version: 0,
            typing: None,
        }
    }

    // ============ Read API ============

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    /// Blocks in linear order
    pub fn blocks(&self) -> impl Iterator<Item = &Block> + '_ {
        self.document.blocks()
    }

    pub fn block(&self, id: BlockId) -> Result<&Block, EditError> {
        self.document.get(id).ok_or(EditError::UnknownBlock(id))
    }

    pub fn focused(&self) -> Option<BlockId> {
        self.focused
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn slash_menu(&self) -> Option<&SlashMenu> {
        self.slash_menu.as_ref()
    }

    /// Deep copy of the current block list and focus
    pub fn snapshot(&self) -> EditorState {
        EditorState {
            blocks: self.document.blocks().cloned().collect(),
            focused: self.focused,
        }
    }

    pub fn to_markdown(&self) -> String {
        self.document.to_markdown()
    }

    // ============ Command dispatch ============

    /// Apply an inbound intent
    pub fn apply(&mut self, cmd: Cmd) -> Result<Patch, EditError> {
        match cmd {
            Cmd::InsertAfter { after, kind } => self.insert_after(after, kind),
            Cmd::InsertFirst { kind } => Ok(self.insert_first(kind)),
            Cmd::Delete { id } => self.delete(id),
            Cmd::DeleteSelection { ids } => self.delete_selection(&ids),
            Cmd::Convert { id, to } => self.convert(id, to),
            Cmd::UpdateContent { id, text } => self.update_content(id, text),
            Cmd::Indent { id } => self.indent(id),
            Cmd::Outdent { id } => self.outdent(id),
            Cmd::MoveBefore { id, before } => self.move_before(id, before),
            Cmd::ToggleChecked { id } => self.toggle_checked(id),
            Cmd::ToggleExpanded { id } => self.toggle_expanded(id),
            Cmd::SetLanguage { id, language } => self.set_language(id, language),
            Cmd::SetIcon { id, icon } => self.set_icon(id, icon),
            Cmd::Focus { id } => self.focus(id),
            Cmd::FocusNext => Ok(self.focus_next()),
            Cmd::FocusPrevious => Ok(self.focus_previous()),
            Cmd::Undo => Ok(self.undo()),
            Cmd::Redo => Ok(self.redo()),
            Cmd::OpenSlashMenu { id } => self.open_slash_menu(id),
            Cmd::FilterSlashMenu { query } => self.filter_slash_menu(query),
            Cmd::SlashMenuNext => self.slash_menu_next(),
            Cmd::SlashMenuPrevious => self.slash_menu_previous(),
            Cmd::SelectSlashMenuEntry => self.select_slash_menu_entry(),
            Cmd::CloseSlashMenu => Ok(self.close_slash_menu()),
        }
    }

    // ============ Structural edits ============

    /// Insert a new empty block right after `after` and focus it
    pub fn insert_after(&mut self, after: BlockId, kind: BlockType) -> Result<Patch, EditError> {
        let anchor = self.block(after)?;
        let index = anchor.order + 1;
        let indent = if kind.supports_nesting() {
            anchor.indent_level
        } else {
            0
        };

        let before = self.snapshot();
        let block =
            Block::with_defaults(kind, "", &self.settings.meta_defaults).with_indent(indent);
        let id = block.id;
        self.document.insert_at(index, block);
        self.focused = Some(id);
        log::debug!("inserted {kind} block {id} at {index}");
        Ok(self.commit(before))
    }

    /// Insert a new empty block at the top; works on an empty document
    pub fn insert_first(&mut self, kind: BlockType) -> Patch {
        let before = self.snapshot();
        let block = Block::with_defaults(kind, "", &self.settings.meta_defaults);
        let id = block.id;
        self.document.insert_at(0, block);
        self.focused = Some(id);
        log::debug!("inserted {kind} block {id} at top");
        self.commit(before)
    }

    /// Remove a block; focus moves to the previous block, else the next.
    ///
    /// Removing the last block leaves the document empty.
    pub fn delete(&mut self, id: BlockId) -> Result<Patch, EditError> {
        self.delete_selection(&[id])
    }

    /// Remove a set of blocks as one undoable step
    pub fn delete_selection(&mut self, ids: &[BlockId]) -> Result<Patch, EditError> {
        if let Some(missing) = ids.iter().find(|id| !self.document.contains(**id)) {
            return Err(EditError::UnknownBlock(*missing));
        }
        let Some(first_index) = ids.iter().filter_map(|id| self.document.index_of(*id)).min()
        else {
            return Ok(self.unchanged());
        };

        let before = self.snapshot();
        for id in ids {
            self.document.remove(*id);
        }
        self.focused = match first_index {
            0 => self.document.id_at(0),
            index => self.document.id_at(index - 1),
        };
        if self
            .slash_menu
            .as_ref()
            .is_some_and(|menu| !self.document.contains(menu.target()))
        {
            self.slash_menu = None;
        }
        log::debug!("deleted {} block(s)", before.blocks.len() - self.document.len());
        Ok(self.commit(before))
    }

    /// Change a block's type in place; content is untouched
    pub fn convert(&mut self, id: BlockId, to: BlockType) -> Result<Patch, EditError> {
        if self.block(id)?.kind == to {
            return Ok(self.unchanged());
        }

        let before = self.snapshot();
        let defaults = self.settings.meta_defaults.clone();
        if let Some(block) = self.document.get_mut(id) {
            block.convert(to, &defaults);
        }
        log::debug!("converted block {id} to {to}");
        Ok(self.commit(before))
    }

    /// Replace a block's text, running auto-format when eligible
    pub fn update_content(
        &mut self,
        id: BlockId,
        text: impl Into<String>,
    ) -> Result<Patch, EditError> {
        let text = text.into();
        let block = self.block(id)?;
        if block.content == text {
            return Ok(self.unchanged());
        }

        let conversion = if self.autoformat_eligible(block) {
            autoformat::recognize(block.kind, &text)
        } else {
            None
        };

        let now = Utc::now();
        let coalesce = conversion.is_none() && self.continues_typing(id, now);
        let before = self.snapshot();
        let defaults = self.settings.meta_defaults.clone();
        let converted = conversion.is_some();

        if let Some(block) = self.document.get_mut(id) {
            match conversion {
                Some(conversion) => {
                    log::trace!("auto-format converted block {id} to {}", conversion.kind);
                    block.convert(conversion.kind, &defaults);
                    if let Some(checked) = conversion.checked {
                        block.meta.checked = Some(checked);
                    }
                    block.set_content(conversion.content);
                }
                None => block.set_content(text),
            }
        }

        let patch = if coalesce {
            self.finish(&before)
        } else {
            self.commit(before)
        };
        // a conversion always stands as its own undo step
        self.typing = (!converted).then_some(TypingRun { block: id, at: now });
        Ok(patch)
    }

    pub fn indent(&mut self, id: BlockId) -> Result<Patch, EditError> {
        let level = self.block(id)?.indent_level;
        if level >= MAX_INDENT {
            return Ok(self.unchanged());
        }
        self.set_indent(id, level + 1)
    }

    pub fn outdent(&mut self, id: BlockId) -> Result<Patch, EditError> {
        let level = self.block(id)?.indent_level;
        if level == 0 {
            return Ok(self.unchanged());
        }
        self.set_indent(id, level - 1)
    }

    fn set_indent(&mut self, id: BlockId, level: u8) -> Result<Patch, EditError> {
        let before = self.snapshot();
        if let Some(block) = self.document.get_mut(id) {
            block.indent_level = level;
        }
        Ok(self.commit(before))
    }

    /// Move `id` to sit immediately before `before`.
    ///
    /// Dropping a block onto itself, or onto the block it already precedes,
    /// changes nothing and records nothing.
    pub fn move_before(&mut self, id: BlockId, before: BlockId) -> Result<Patch, EditError> {
        let from = self.block(id)?.order;
        let target = self.block(before)?.order;
        if id == before || from + 1 == target {
            return Ok(self.unchanged());
        }

        let snapshot = self.snapshot();
        self.document.move_before(id, before);
        log::debug!("moved block {id} from {from} to before {before}");
        Ok(self.commit(snapshot))
    }

    // ============ Metadata edits ============

    /// Flip a check list item's checkbox; other types are left alone
    pub fn toggle_checked(&mut self, id: BlockId) -> Result<Patch, EditError> {
        if self.block(id)?.kind != BlockType::CheckList {
            return Ok(self.unchanged());
        }
        self.edit_meta(id, |block| {
            block.meta.checked = Some(!block.checked());
        })
    }

    pub fn toggle_expanded(&mut self, id: BlockId) -> Result<Patch, EditError> {
        if self.block(id)?.kind != BlockType::Toggle {
            return Ok(self.unchanged());
        }
        self.edit_meta(id, |block| {
            block.meta.expanded = Some(!block.expanded());
        })
    }

    pub fn set_language(
        &mut self,
        id: BlockId,
        language: impl Into<String>,
    ) -> Result<Patch, EditError> {
        let language = language.into();
        let block = self.block(id)?;
        if block.kind != BlockType::Code || block.language() == Some(language.as_str()) {
            return Ok(self.unchanged());
        }
        self.edit_meta(id, |block| block.meta.language = Some(language))
    }

    pub fn set_icon(&mut self, id: BlockId, icon: impl Into<String>) -> Result<Patch, EditError> {
        let icon = icon.into();
        let block = self.block(id)?;
        if block.kind != BlockType::Callout || block.icon() == Some(icon.as_str()) {
            return Ok(self.unchanged());
        }
        self.edit_meta(id, |block| block.meta.icon = Some(icon))
    }

    fn edit_meta(
        &mut self,
        id: BlockId,
        edit: impl FnOnce(&mut Block),
    ) -> Result<Patch, EditError> {
        let before = self.snapshot();
        let block = self
            .document
            .get_mut(id)
            .ok_or(EditError::UnknownBlock(id))?;
        edit(block);
        block.touch();
        Ok(self.commit(before))
    }

    // ============ Focus ============

    pub fn focus(&mut self, id: BlockId) -> Result<Patch, EditError> {
        self.block(id)?;
        self.set_focus(Some(id));
        Ok(self.unchanged())
    }

    pub fn focus_next(&mut self) -> Patch {
        self.shift_focus(1)
    }

    pub fn focus_previous(&mut self) -> Patch {
        self.shift_focus(-1)
    }

    fn shift_focus(&mut self, step: isize) -> Patch {
        let next = self
            .focused
            .and_then(|id| self.document.index_of(id))
            .and_then(|index| index.checked_add_signed(step))
            .and_then(|index| self.document.id_at(index));
        if next.is_some() {
            self.set_focus(next);
        }
        self.unchanged()
    }

    fn set_focus(&mut self, id: Option<BlockId>) {
        if self.focused != id {
            self.typing = None;
        }
        self.focused = id;
    }

    // ============ History ============

    /// Restore the state before the last recorded mutation
    pub fn undo(&mut self) -> Patch {
        let current = self.snapshot();
        match self.history.undo(current.clone()) {
            Some(previous) => self.restore(current, previous),
            None => self.unchanged(),
        }
    }

    /// Re-apply the last undone mutation
    pub fn redo(&mut self) -> Patch {
        let current = self.snapshot();
        match self.history.redo(current.clone()) {
            Some(next) => self.restore(current, next),
            None => self.unchanged(),
        }
    }

    fn restore(&mut self, current: EditorState, target: EditorState) -> Patch {
        self.document.replace_all(target.blocks);
        self.focused = target
            .focused
            .filter(|id| self.document.contains(*id))
            .or_else(|| self.document.id_at(0));
        if self
            .slash_menu
            .as_ref()
            .is_some_and(|menu| !self.document.contains(menu.target()))
        {
            self.slash_menu = None;
        }
        self.typing = None;
        self.version += 1;
        self.document.touch();
        Patch::between(&current.blocks, &self.document, self.version, self.focused)
    }

    // ============ Slash menu ============

    /// Open the block-type picker for a block
    pub fn open_slash_menu(&mut self, id: BlockId) -> Result<Patch, EditError> {
        self.block(id)?;
        self.slash_menu = Some(SlashMenu::open(id));
        self.set_focus(Some(id));
        Ok(self.unchanged())
    }

    pub fn filter_slash_menu(&mut self, query: impl Into<String>) -> Result<Patch, EditError> {
        self.slash_menu_mut()?.set_query(query);
        Ok(self.unchanged())
    }

    pub fn slash_menu_next(&mut self) -> Result<Patch, EditError> {
        self.slash_menu_mut()?.select_next();
        Ok(self.unchanged())
    }

    pub fn slash_menu_previous(&mut self) -> Result<Patch, EditError> {
        self.slash_menu_mut()?.select_previous();
        Ok(self.unchanged())
    }

    /// Convert the target block to the highlighted entry and close the menu.
    ///
    /// With no matching entry the menu stays open and nothing changes.
    pub fn select_slash_menu_entry(&mut self) -> Result<Patch, EditError> {
        let menu = self.slash_menu.take().ok_or(EditError::SlashMenuClosed)?;
        match menu.selected() {
            Some(entry) => self.convert(menu.target(), entry.kind),
            None => {
                self.slash_menu = Some(menu);
                Ok(self.unchanged())
            }
        }
    }

    pub fn close_slash_menu(&mut self) -> Patch {
        self.slash_menu = None;
        self.unchanged()
    }

    fn slash_menu_mut(&mut self) -> Result<&mut SlashMenu, EditError> {
        self.slash_menu.as_mut().ok_or(EditError::SlashMenuClosed)
    }

    // ============ Internals ============

    /// Auto-format is off while the picker is open for the block, and code
    /// content is always literal
    fn autoformat_eligible(&self, block: &Block) -> bool {
        let menu_open = self
            .slash_menu
            .as_ref()
            .is_some_and(|menu| menu.target() == block.id);
        !menu_open && block.kind != BlockType::Code
    }

    fn continues_typing(&self, id: BlockId, now: DateTime<Utc>) -> bool {
        let window = self.settings.coalesce_window_ms;
        if window == 0 || !self.history.can_undo() {
            return false;
        }
        self.typing.is_some_and(|run| {
            run.block == id && now - run.at <= Duration::milliseconds(window as i64)
        })
    }

    fn unchanged(&self) -> Patch {
        Patch::unchanged(&self.document, self.version, self.focused)
    }

    /// Finish a mutation: record `before` for undo and describe the change
    fn commit(&mut self, before: EditorState) -> Patch {
        let patch = self.finish(&before);
        self.history.record(before);
        self.typing = None;
        patch
    }

    /// Bump the version and diff, without touching history
    fn finish(&mut self, before: &EditorState) -> Patch {
        self.version += 1;
        self.document.touch();
        Patch::between(&before.blocks, &self.document, self.version, self.focused)
    }
}
