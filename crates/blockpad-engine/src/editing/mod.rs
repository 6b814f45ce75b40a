/*!
 * # Editing Core Module
 *
 * The editor owns one document and is the only place blocks change.
 *
 * ## Architecture Overview
 *
 * ### 1. Single Source of Truth: the block arena
 * - A [`Document`](crate::models::Document) stores blocks by id plus an
 *   ordered id sequence; the sequence decides order and `Block::order`
 *   mirrors it
 * - The editor holds ids only (focus, slash menu target, typing run), never
 *   references into the arena
 *
 * ### 2. Command-Based Editing
 * - Every edit is a method on [`Editor`], and each method has a matching
 *   [`Cmd`] variant so a frontend can queue intents and dispatch them
 *   through [`Editor::apply`]
 * - Ids are validated before any state is touched; an unknown id is an
 *   [`EditError`] and leaves the editor exactly as it was
 * - Calls that would change nothing (indent at the limit, converting to the
 *   current type, dropping a block onto itself) return an empty [`Patch`]
 *   and record no history
 *
 * ### 3. Snapshot Undo
 * - Before each mutation the full ordered block list and focus are copied
 *   into [`History`]; undo and redo swap whole snapshots
 * - Both stacks are bounded (50 by default) and drop their oldest entry
 * - Optionally, consecutive typing in one block within a short window
 *   shares one undo entry
 *
 * ### 4. Patches
 * - Each call returns a [`Patch`] listing blocks to upsert, delete and
 *   reorder, which persistence layers consume directly
 *
 * ## Usage Pattern
 *
 * ```rust
 * use blockpad_engine::editing::*;
 * use blockpad_engine::models::{BlockType, Document};
 *
 * let mut editor = Editor::new(Document::from_markdown("- milk"));
 * let milk = editor.focused().unwrap();
 *
 * let patch = editor.apply(Cmd::InsertAfter { after: milk, kind: BlockType::BulletList }).unwrap();
 * let eggs = patch.focused.unwrap();
 * editor.apply(Cmd::UpdateContent { id: eggs, text: "eggs".to_string() }).unwrap();
 *
 * editor.apply(Cmd::OpenSlashMenu { id: eggs }).unwrap();
 * editor.apply(Cmd::FilterSlashMenu { query: "todo".to_string() }).unwrap();
 * editor.apply(Cmd::SelectSlashMenuEntry).unwrap();
 *
 * assert_eq!(editor.to_markdown(), "- milk\n- [ ] eggs");
 * ```
 */

pub mod commands;
pub mod editor;
pub mod history;
pub mod patch;
pub mod slash_menu;

pub use commands::Cmd;
pub use editor::Editor;
pub use history::{DEFAULT_HISTORY_LIMIT, EditorState, History};
pub use patch::Patch;
pub use slash_menu::{SlashCommand, SlashMenu};

use crate::models::{BlockId, MetaDefaults};

/// Errors returned by editor operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("Block not found: {0}")]
    UnknownBlock(BlockId),
    #[error("Slash menu is not open")]
    SlashMenuClosed,
}

/// Tunables for an [`Editor`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorSettings {
    /// Snapshots kept on each of the undo and redo stacks
    pub history_limit: usize,
    /// Consecutive typing in one block within this window shares an undo
    /// entry; 0 records every keystroke
    pub coalesce_window_ms: u64,
    pub meta_defaults: MetaDefaults,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            coalesce_window_ms: 0,
            meta_defaults: MetaDefaults::default(),
        }
    }
}
