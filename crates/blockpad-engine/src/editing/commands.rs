use crate::models::{BlockId, BlockType};

/// Intents the presentation layer sends to the editor
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    InsertAfter {
        after: BlockId,
        kind: BlockType,
    },
    InsertFirst {
        kind: BlockType,
    },
    Delete {
        id: BlockId,
    },
    DeleteSelection {
        ids: Vec<BlockId>,
    },
    Convert {
        id: BlockId,
        to: BlockType,
    },
    UpdateContent {
        id: BlockId,
        text: String,
    },
    Indent {
        id: BlockId,
    },
    Outdent {
        id: BlockId,
    },
    MoveBefore {
        id: BlockId,
        before: BlockId,
    },
    ToggleChecked {
        id: BlockId,
    },
    ToggleExpanded {
        id: BlockId,
    },
    SetLanguage {
        id: BlockId,
        language: String,
    },
    SetIcon {
        id: BlockId,
        icon: String,
    },
    Focus {
        id: BlockId,
    },
    FocusNext,
    FocusPrevious,
    Undo,
    Redo,
    OpenSlashMenu {
        id: BlockId,
    },
    FilterSlashMenu {
        query: String,
    },
    SlashMenuNext,
    SlashMenuPrevious,
    SelectSlashMenuEntry,
    CloseSlashMenu,
}

impl Cmd {
    /// Whether the command can change the block list (and so be undone)
    pub fn is_mutation(&self) -> bool {
        match self {
            Cmd::InsertAfter { .. }
            | Cmd::InsertFirst { .. }
            | Cmd::Delete { .. }
            | Cmd::DeleteSelection { .. }
            | Cmd::Convert { .. }
            | Cmd::UpdateContent { .. }
            | Cmd::Indent { .. }
            | Cmd::Outdent { .. }
            | Cmd::MoveBefore { .. }
            | Cmd::ToggleChecked { .. }
            | Cmd::ToggleExpanded { .. }
            | Cmd::SetLanguage { .. }
            | Cmd::SetIcon { .. }
            | Cmd::Undo
            | Cmd::Redo
            | Cmd::SelectSlashMenuEntry => true,
            Cmd::Focus { .. }
            | Cmd::FocusNext
            | Cmd::FocusPrevious
            | Cmd::OpenSlashMenu { .. }
            | Cmd::FilterSlashMenu { .. }
            | Cmd::SlashMenuNext
            | Cmd::SlashMenuPrevious
            | Cmd::CloseSlashMenu => false,
        }
    }
}
