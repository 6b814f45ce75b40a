use std::collections::VecDeque;

use crate::models::{Block, BlockId};

/// Default number of snapshots kept on each stack
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Deep copy of a document's ordered blocks and focus at one instant
#[derive(Debug, Clone, PartialEq)]
pub struct EditorState {
    pub blocks: Vec<Block>,
    pub focused: Option<BlockId>,
}

/// Linear undo/redo over whole-document snapshots.
///
/// Recording a new state clears the redo stack. Both stacks are bounded and
/// evict their oldest entry on overflow.
#[derive(Debug, Clone)]
pub struct History {
    undo: VecDeque<EditorState>,
    redo: VecDeque<EditorState>,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    /// Record the state from before a mutation
    pub fn record(&mut self, before: EditorState) {
        push_bounded(&mut self.undo, before, self.limit);
        self.redo.clear();
    }

    /// Step back: returns the state to restore, stashing `current` for redo
    pub fn undo(&mut self, current: EditorState) -> Option<EditorState> {
        let previous = self.undo.pop_back()?;
        push_bounded(&mut self.redo, current, self.limit);
        Some(previous)
    }

    /// Step forward: returns the state to restore, stashing `current` for undo
    pub fn redo(&mut self, current: EditorState) -> Option<EditorState> {
        let next = self.redo.pop_back()?;
        push_bounded(&mut self.undo, current, self.limit);
        Some(next)
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

fn push_bounded(stack: &mut VecDeque<EditorState>, state: EditorState, limit: usize) {
    if stack.len() == limit {
        stack.pop_front();
    }
    stack.push_back(state);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(content: &str) -> EditorState {
        EditorState {
            blocks: vec![Block::text(content)],
            focused: None,
        }
    }

    fn content(state: &EditorState) -> &str {
        &state.blocks[0].content
    }

    #[test]
    fn test_empty_history_is_noop() {
        let mut history = History::default();
        assert!(history.undo(state("now")).is_none());
        assert!(history.redo(state("now")).is_none());
        assert!(!history.can_undo());
        assert!(!history.can_redo(), "failed undo must not stash current");
    }

    #[test]
    fn test_undo_then_redo() {
        let mut history = History::default();
        history.record(state("a"));

        let restored = history.undo(state("b")).unwrap();
        assert_eq!(content(&restored), "a");
        assert!(history.can_redo());

        let forward = history.redo(restored).unwrap();
        assert_eq!(content(&forward), "b");
        assert_eq!(history.undo_depth(), 1);
        assert_eq!(history.redo_depth(), 0);
    }

    #[test]
    fn test_record_clears_redo() {
        let mut history = History::default();
        history.record(state("a"));
        history.undo(state("b"));
        assert!(history.can_redo());

        history.record(state("a"));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_oldest_entry_is_evicted() {
        let mut history = History::new(3);
        for name in ["1", "2", "3", "4"] {
            history.record(state(name));
        }
        assert_eq!(history.undo_depth(), 3);

        let mut restored = Vec::new();
        while let Some(previous) = history.undo(state("current")) {
            restored.push(content(&previous).to_string());
        }
        assert_eq!(restored, vec!["4", "3", "2"]);
        assert_eq!(history.redo_depth(), 3);
    }

    #[test]
    fn test_limit_is_at_least_one() {
        assert_eq!(History::new(0).limit(), 1);
    }
}
