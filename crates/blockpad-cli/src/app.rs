use anyhow::Result;
use blockpad_config::EditorConfig;
use blockpad_engine::editing::{Cmd, EditError, Editor, EditorSettings, Patch};
use blockpad_engine::io;
use blockpad_engine::models::{BlockId, BlockType, MetaDefaults};
use blockpad_engine::persist::{MarkdownFileStore, WriteBack};
use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use relative_path::{RelativePath, RelativePathBuf};
use std::path::Path;

pub fn editor_settings(config: &EditorConfig) -> EditorSettings {
    EditorSettings {
        history_limit: config.history_limit,
        coalesce_window_ms: config.coalesce_window_ms,
        meta_defaults: MetaDefaults {
            code_language: config.default_code_language.clone(),
            callout_icon: config.default_callout_icon.clone(),
        },
    }
}

/// Type of the block Enter creates below a block of `kind`
fn continuation(kind: BlockType) -> BlockType {
    match kind {
        BlockType::BulletList | BlockType::NumberedList | BlockType::CheckList => kind,
        BlockType::Text
        | BlockType::Heading { .. }
        | BlockType::Code
        | BlockType::Quote
        | BlockType::Divider
        | BlockType::Callout
        | BlockType::Toggle
        | BlockType::Image
        | BlockType::File
        | BlockType::Table => BlockType::Text,
    }
}

/// One open page: the editor plus its write-back to disk
pub struct App {
    pub editor: Editor,
    page: RelativePathBuf,
    store: MarkdownFileStore,
    writeback: WriteBack,
    pub status: String,
}

impl App {
    pub fn open(notes_path: &Path, page: &RelativePath, config: &EditorConfig) -> Result<Self> {
        let document = io::load_document(page, notes_path)?;
        let store = MarkdownFileStore::open(notes_path, page, &document);
        log::info!("opened {page} with {} blocks", document.len());

        Ok(Self {
            editor: Editor::with_settings(document, editor_settings(config)),
            page: page.to_relative_path_buf(),
            store,
            writeback: WriteBack::new(config.persist_debounce_ms),
            status: format!("Editing {page}"),
        })
    }

    pub fn page(&self) -> &RelativePath {
        &self.page
    }

    pub fn is_dirty(&self) -> bool {
        self.writeback.is_pending()
    }

    /// Handle one key press; returns false once the user asked to quit
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('q') {
            return false;
        }
        if ctrl && key.code == KeyCode::Char('s') {
            self.save();
            return true;
        }
        if self.editor.slash_menu().is_none() && key.code == KeyCode::Esc {
            return false;
        }

        let result = if self.editor.slash_menu().is_some() {
            self.handle_menu_key(key)
        } else {
            self.handle_edit_key(key)
        };

        match result {
            Ok(Some(patch)) => self.writeback.schedule(&patch, Utc::now()),
            Ok(None) => {}
            Err(e) => {
                log::warn!("edit rejected: {e}");
                self.status = e.to_string();
            }
        }
        true
    }

    /// Write pending changes once edits have paused
    pub fn tick(&mut self) {
        if self
            .writeback
            .flush(&mut self.store, self.editor.document(), Utc::now())
        {
            self.status = format!("Saved {}", self.page);
        }
    }

    /// Write pending changes now
    pub fn save(&mut self) {
        match self.writeback.flush_now(&mut self.store, self.editor.document()) {
            Ok(true) => self.status = format!("Saved {}", self.page),
            Ok(false) => self.status = "Nothing to save".to_string(),
            Err(e) => {
                log::warn!("Failed to save {}: {e}", self.page);
                self.status = format!("Save failed: {e}");
            }
        }
    }

    fn handle_menu_key(&mut self, key: KeyEvent) -> Result<Option<Patch>, EditError> {
        let patch = match key.code {
            KeyCode::Esc => self.editor.apply(Cmd::CloseSlashMenu)?,
            KeyCode::Up => self.editor.apply(Cmd::SlashMenuPrevious)?,
            KeyCode::Down => self.editor.apply(Cmd::SlashMenuNext)?,
            KeyCode::Enter => self.editor.apply(Cmd::SelectSlashMenuEntry)?,
            KeyCode::Backspace => {
                let mut query = self
                    .editor
                    .slash_menu()
                    .map(|menu| menu.query().to_string())
                    .unwrap_or_default();
                if query.pop().is_none() {
                    self.editor.apply(Cmd::CloseSlashMenu)?
                } else {
                    self.editor.apply(Cmd::FilterSlashMenu { query })?
                }
            }
            KeyCode::Char(c) => {
                let mut query = self
                    .editor
                    .slash_menu()
                    .map(|menu| menu.query().to_string())
                    .unwrap_or_default();
                query.push(c);
                self.editor.apply(Cmd::FilterSlashMenu { query })?
            }
            _ => return Ok(None),
        };
        Ok(Some(patch))
    }

    fn handle_edit_key(&mut self, key: KeyEvent) -> Result<Option<Patch>, EditError> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        let Some(id) = self.editor.focused() else {
            // empty page: any typing starts a fresh text block
            return match key.code {
                KeyCode::Char(_) | KeyCode::Enter => {
                    let patch = self.editor.apply(Cmd::InsertFirst {
                        kind: BlockType::Text,
                    })?;
                    match key.code {
                        KeyCode::Char(_) => {
                            self.writeback.schedule(&patch, Utc::now());
                            self.handle_edit_key(key)
                        }
                        _ => Ok(Some(patch)),
                    }
                }
                _ => Ok(None),
            };
        };

        let patch = match key.code {
            KeyCode::Char('z') if ctrl => self.editor.apply(Cmd::Undo)?,
            KeyCode::Char('y') if ctrl => self.editor.apply(Cmd::Redo)?,
            KeyCode::Char('x') if ctrl => self.toggle(id)?,
            KeyCode::Up if alt => match self.neighbour(id, -1) {
                Some(previous) => self.editor.apply(Cmd::MoveBefore {
                    id,
                    before: previous,
                })?,
                None => return Ok(None),
            },
            KeyCode::Down if alt => match self.neighbour(id, 1) {
                Some(next) => self.editor.apply(Cmd::MoveBefore {
                    id: next,
                    before: id,
                })?,
                None => return Ok(None),
            },
            KeyCode::Up => self.editor.apply(Cmd::FocusPrevious)?,
            KeyCode::Down => self.editor.apply(Cmd::FocusNext)?,
            KeyCode::Tab => self.editor.apply(Cmd::Indent { id })?,
            KeyCode::BackTab => self.editor.apply(Cmd::Outdent { id })?,
            KeyCode::Enter => self.enter(id)?,
            KeyCode::Backspace => self.backspace(id)?,
            KeyCode::Char('/') if self.editor.block(id)?.content.is_empty() => {
                self.editor.apply(Cmd::OpenSlashMenu { id })?
            }
            KeyCode::Char(c) if !ctrl => {
                let mut text = self.editor.block(id)?.content.clone();
                text.push(c);
                self.editor.apply(Cmd::UpdateContent { id, text })?
            }
            _ => return Ok(None),
        };
        Ok(Some(patch))
    }

    fn neighbour(&self, id: BlockId, step: isize) -> Option<BlockId> {
        let document = self.editor.document();
        let index = document.index_of(id)?.checked_add_signed(step)?;
        document.id_at(index)
    }

    fn toggle(&mut self, id: BlockId) -> Result<Patch, EditError> {
        if self.editor.block(id)?.kind == BlockType::Toggle {
            self.editor.apply(Cmd::ToggleExpanded { id })
        } else {
            self.editor.apply(Cmd::ToggleChecked { id })
        }
    }

    /// New block below; inside code a single Enter is a newline and a
    /// second one on a blank last line leaves the block
    fn enter(&mut self, id: BlockId) -> Result<Patch, EditError> {
        let block = self.editor.block(id)?;
        let kind = block.kind;
        if kind == BlockType::Code {
            let content = block.content.clone();
            match content.strip_suffix('\n') {
                Some(trimmed) => {
                    let trimmed = trimmed.to_string();
                    self.editor.apply(Cmd::UpdateContent { id, text: trimmed })?;
                }
                None => {
                    return self.editor.apply(Cmd::UpdateContent {
                        id,
                        text: content + "\n",
                    });
                }
            }
        }
        self.editor.apply(Cmd::InsertAfter {
            after: id,
            kind: continuation(kind),
        })
    }

    /// Delete a character; on an empty block first drop its type, then the
    /// block itself
    fn backspace(&mut self, id: BlockId) -> Result<Patch, EditError> {
        let block = self.editor.block(id)?;
        if !block.content.is_empty() {
            let mut text = block.content.clone();
            text.pop();
            return self.editor.apply(Cmd::UpdateContent { id, text });
        }
        if block.kind != BlockType::Text {
            return self.editor.apply(Cmd::Convert {
                id,
                to: BlockType::Text,
            });
        }
        self.editor.apply(Cmd::Delete { id })
    }
}
