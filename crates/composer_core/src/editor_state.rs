// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! The editor state aggregate and its undo / redo stacks.
//!
//! An [`EditorState`] is never changed in place.  [`push`](EditorState::push),
//! [`force_selection`](EditorState::force_selection) and friends return the
//! next state; the caller replaces its copy wholesale.  Contents are shared
//! through [`Arc`], so keeping old states around (on the undo stack or
//! elsewhere) costs one pointer per content.  The undo and redo stacks are
//! persistent lists shared between states.

use std::fmt;
use std::iter;
use std::sync::Arc;

use tracing::trace;

use crate::content::{ContentModel, StyleSet};
use crate::pipeline::{current_inline_style, EditType};
use crate::selection::SelectionModel;

/// What the editor is doing with respect to native host events.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EditorMode {
    #[default]
    Normal,
    /// A native cut is in flight; the surface and the model disagree.
    Cut,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditorConfig {
    /// When false, pushes never record undo entries and undo / redo do
    /// nothing.
    pub allow_undo: bool,
    /// Oldest entries are dropped beyond this many undo steps.
    pub max_undo_depth: Option<usize>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            allow_undo: true,
            max_undo_depth: None,
        }
    }
}

/// A content on the undo or redo stack, tagged with the edit that moved the
/// editor away from it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UndoEntry {
    content: Arc<ContentModel>,
    edit_type: EditType,
}

impl UndoEntry {
    pub fn content(&self) -> &Arc<ContentModel> {
        &self.content
    }

    pub fn edit_type(&self) -> EditType {
        self.edit_type
    }
}

/// A persistent stack of [`UndoEntry`]s.
///
/// Clones share their entries.  Pushing and popping never copy the entries
/// below the top.
#[derive(Clone, Default)]
pub struct UndoStack {
    top: Option<Arc<UndoNode>>,
    len: usize,
    /// Nodes linked below `top`.  Entries past `len` were cut by a depth cap
    /// and are unlinked once they outnumber the visible ones.
    depth: usize,
}

struct UndoNode {
    entry: UndoEntry,
    below: Option<Arc<UndoNode>>,
}

impl UndoStack {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The most recent entry.
    pub fn top(&self) -> Option<&UndoEntry> {
        self.iter().next()
    }

    /// Entries from the most recent down.
    pub fn iter(&self) -> impl Iterator<Item = &UndoEntry> + '_ {
        iter::successors(self.top.as_deref(), |node| node.below.as_deref())
            .take(self.len)
            .map(|node| &node.entry)
    }

    fn push(&self, entry: UndoEntry) -> Self {
        Self {
            top: Some(Arc::new(UndoNode {
                entry,
                below: self.top.clone(),
            })),
            len: self.len + 1,
            depth: self.depth + 1,
        }
    }

    fn pop(&self) -> Option<(UndoEntry, Self)> {
        if self.len == 0 {
            return None;
        }
        let node = self.top.as_deref()?;
        let rest = Self {
            top: node.below.clone(),
            len: self.len - 1,
            depth: self.depth - 1,
        };
        Some((node.entry.clone(), rest))
    }

    /// Keep the `max` most recent entries.
    fn truncate(&self, max: usize) -> Self {
        let len = self.len.min(max);
        if self.depth - len <= len {
            return Self {
                top: self.top.clone(),
                len,
                depth: self.depth,
            };
        }
        let kept: Vec<UndoEntry> = self.iter().take(len).cloned().collect();
        kept.into_iter()
            .rev()
            .fold(Self::default(), |stack, entry| stack.push(entry))
    }
}

impl Drop for UndoStack {
    // Unlink iteratively; dropping a long history recursively would overflow
    // the stack.
    fn drop(&mut self) {
        let mut next = self.top.take();
        while let Some(node) = next {
            next = match Arc::try_unwrap(node) {
                Ok(node) => node.below,
                Err(_) => None,
            };
        }
    }
}

impl fmt::Debug for UndoStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[derive(Clone, Debug)]
pub struct EditorState {
    content: Arc<ContentModel>,
    selection: SelectionModel,
    undo_stack: UndoStack,
    redo_stack: UndoStack,
    force_selection: bool,
    mode: EditorMode,
    last_change_type: Option<EditType>,
    config: EditorConfig,
}

impl EditorState {
    pub fn create(content: ContentModel) -> Self {
        Self::create_with_config(content, EditorConfig::default())
    }

    pub fn create_with_config(content: ContentModel, config: EditorConfig) -> Self {
        let selection = content.selection_after().clone();
        Self {
            content: Arc::new(content),
            selection,
            undo_stack: UndoStack::default(),
            redo_stack: UndoStack::default(),
            force_selection: false,
            mode: EditorMode::Normal,
            last_change_type: None,
            config,
        }
    }

    /// A state holding a single empty block.
    pub fn create_empty() -> Self {
        Self::create(ContentModel::from_text(""))
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn current_content(&self) -> &Arc<ContentModel> {
        &self.content
    }

    pub fn selection(&self) -> &SelectionModel {
        &self.selection
    }

    pub fn undo_stack(&self) -> &UndoStack {
        &self.undo_stack
    }

    pub fn redo_stack(&self) -> &UndoStack {
        &self.redo_stack
    }

    /// Whether the renderer must push the selection to the host surface on
    /// the next update instead of trusting the surface's own.
    pub fn must_force_selection(&self) -> bool {
        self.force_selection
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn last_change_type(&self) -> Option<EditType> {
        self.last_change_type
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn can_undo(&self) -> bool {
        self.config.allow_undo && !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        self.config.allow_undo && !self.redo_stack.is_empty()
    }

    /// The style typed text would take at the current selection.
    pub fn current_inline_style(&self) -> StyleSet {
        current_inline_style(&self.content, &self.selection)
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Make `content` current.
    ///
    /// The previous content goes onto the undo stack, tagged `edit_type`,
    /// unless this push continues a run of character edits of the same type
    /// that started where the previous one left the caret.  The redo stack
    /// is cleared and the selection becomes the new content's selection
    /// after.  Pushing the current content again changes nothing.
    pub fn push(
        &self,
        content: impl Into<Arc<ContentModel>>,
        edit_type: EditType,
    ) -> Self {
        let content: Arc<ContentModel> = content.into();
        if Arc::ptr_eq(&content, &self.content) {
            return self.clone();
        }
        let selection = content.selection_after().clone();
        let force_selection = content.select_can_not_undo();

        if !self.config.allow_undo {
            return Self {
                content,
                selection,
                undo_stack: UndoStack::default(),
                redo_stack: UndoStack::default(),
                force_selection,
                last_change_type: Some(edit_type),
                ..self.clone()
            };
        }

        let coalesce = !self.must_become_boundary(edit_type);
        let (content, undo_stack) = if coalesce {
            let content = content.with_selection_before(
                self.content.selection_before().clone(),
            );
            (Arc::new(content), self.undo_stack.clone())
        } else {
            let mut undo_stack = self.undo_stack.push(UndoEntry {
                content: Arc::clone(&self.content),
                edit_type,
            });
            if let Some(max) = self.config.max_undo_depth {
                undo_stack = undo_stack.truncate(max);
            }
            let content = content.with_selection_before(self.selection.clone());
            (Arc::new(content), undo_stack)
        };
        trace!(
            %edit_type,
            coalesce,
            undo_depth = undo_stack.len(),
            force_selection,
            "pushed content"
        );

        Self {
            content,
            selection,
            undo_stack,
            redo_stack: UndoStack::default(),
            force_selection,
            last_change_type: Some(edit_type),
            ..self.clone()
        }
    }

    fn must_become_boundary(&self, edit_type: EditType) -> bool {
        !edit_type.coalesces()
            || self.last_change_type != Some(edit_type)
            || &self.selection != self.content.selection_after()
            || self.content.select_can_not_undo()
    }

    /// Replace the selection and have the renderer push it to the host.
    /// The selection is given focus.
    pub fn force_selection(&self, selection: SelectionModel) -> Self {
        Self {
            selection: selection.with_focus(true),
            force_selection: true,
            ..self.clone()
        }
    }

    /// Record a selection reported by the host.  Nothing is forced.
    pub fn accept_selection(&self, selection: SelectionModel) -> Self {
        Self {
            selection,
            force_selection: false,
            ..self.clone()
        }
    }

    pub fn with_mode(&self, mode: EditorMode) -> Self {
        Self {
            mode,
            ..self.clone()
        }
    }

    /// Step back to the content on top of the undo stack.  The selection is
    /// forced to where it was before the undone edit.
    pub fn undo(&self) -> Self {
        if !self.config.allow_undo {
            return self.clone();
        }
        let Some((entry, undo_stack)) = self.undo_stack.pop() else {
            return self.clone();
        };
        let redo_stack = self.redo_stack.push(UndoEntry {
            content: Arc::clone(&self.content),
            edit_type: entry.edit_type,
        });
        trace!(edit_type = %entry.edit_type, "undo");
        Self {
            selection: self.content.selection_before().clone().with_focus(true),
            content: entry.content,
            undo_stack,
            redo_stack,
            force_selection: true,
            last_change_type: Some(EditType::Undo),
            ..self.clone()
        }
    }

    /// Re-apply the content on top of the redo stack.  The selection is
    /// forced to where that edit left it.
    pub fn redo(&self) -> Self {
        if !self.config.allow_undo {
            return self.clone();
        }
        let Some((entry, redo_stack)) = self.redo_stack.pop() else {
            return self.clone();
        };
        let undo_stack = self.undo_stack.push(UndoEntry {
            content: Arc::clone(&self.content),
            edit_type: entry.edit_type,
        });
        trace!(edit_type = %entry.edit_type, "redo");
        Self {
            selection: entry.content.selection_after().clone().with_focus(true),
            content: entry.content,
            undo_stack,
            redo_stack,
            force_selection: true,
            last_change_type: Some(EditType::Redo),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{EditorConfig, EditorMode, EditorState, UndoEntry, UndoStack};
    use crate::content::{Block, BlockKey, BlockType, ContentModel, StyleSet};
    use crate::pipeline::{
        insert_text, remove_adjacent, remove_range, EditType, RemovalDirection,
    };
    use crate::selection::SelectionModel;

    fn key(k: &str) -> BlockKey {
        BlockKey::new(k)
    }

    fn state_with(text: &str) -> EditorState {
        EditorState::create(
            ContentModel::from_blocks([Block::unstyled("a", text)]).unwrap(),
        )
    }

    fn type_text(state: &EditorState, text: &str) -> EditorState {
        let content = insert_text(
            state.current_content(),
            state.selection(),
            text,
            &StyleSet::new(),
            None,
        );
        state.push(content, EditType::InsertCharacters)
    }

    fn plain(state: &EditorState) -> String {
        state.current_content().plain_text()
    }

    #[test]
    fn new_state_takes_content_selection() {
        let state = state_with("abc");
        assert_eq!(state.selection(), &SelectionModel::collapsed(key("a"), 0));
        assert!(!state.can_undo());
        assert_eq!(state.mode(), EditorMode::Normal);
    }

    #[test]
    fn push_records_undo_entry() {
        let state = state_with("abc");
        let sel = SelectionModel::within_block(key("a"), 1, 3);
        let removed = remove_range(state.current_content(), &sel, RemovalDirection::Forward);
        let next = state.accept_selection(sel).push(removed, EditType::RemoveRange);
        assert_eq!(plain(&next), "a");
        assert_eq!(next.undo_stack().len(), 1);
        assert_eq!(next.undo_stack().top().map(UndoEntry::edit_type), Some(EditType::RemoveRange));
        assert_eq!(next.selection(), &SelectionModel::collapsed(key("a"), 1));
        assert!(!next.must_force_selection());
    }

    #[test]
    fn typing_coalesces_into_one_step() {
        let state = state_with("");
        let state = type_text(&state, "a");
        let state = type_text(&state, "b");
        let state = type_text(&state, "c");
        assert_eq!(plain(&state), "abc");
        assert_eq!(state.undo_stack().len(), 1);
        let undone = state.undo();
        assert_eq!(plain(&undone), "");
        assert_eq!(undone.selection().start_offset(), 0);
    }

    #[test]
    fn moving_the_caret_breaks_coalescing() {
        let state = type_text(&state_with("xyz"), "a");
        let moved = state.accept_selection(SelectionModel::collapsed(key("a"), 4));
        let state = type_text(&moved, "b");
        assert_eq!(plain(&state), "axyzb");
        assert_eq!(state.undo_stack().len(), 2);
    }

    #[test]
    fn changing_edit_type_breaks_coalescing() {
        let state = type_text(&state_with(""), "ab");
        let backspaced = remove_adjacent(
            state.current_content(),
            state.selection(),
            RemovalDirection::Backward,
        )
        .unwrap();
        let state = state.push(backspaced, EditType::BackspaceCharacter);
        assert_eq!(plain(&state), "a");
        assert_eq!(state.undo_stack().len(), 2);
    }

    #[test]
    fn pushing_current_content_is_a_noop() {
        let state = state_with("abc");
        let same = state.push(Arc::clone(state.current_content()), EditType::InsertFragment);
        assert!(same.undo_stack().is_empty());
        assert!(Arc::ptr_eq(state.current_content(), same.current_content()));
    }

    #[test]
    fn undo_then_redo_restores_content_and_forces_selection() {
        let state = state_with("hello");
        let sel = SelectionModel::within_block(key("a"), 0, 2).with_focus(true);
        let removed = remove_range(state.current_content(), &sel, RemovalDirection::Forward);
        let edited = state.accept_selection(sel.clone()).push(removed, EditType::RemoveRange);

        let undone = edited.undo();
        assert_eq!(plain(&undone), "hello");
        assert!(undone.must_force_selection());
        assert_eq!(undone.selection(), &sel);
        assert_eq!(undone.redo_stack().len(), 1);
        assert!(!undone.can_undo());

        let redone = undone.redo();
        assert_eq!(plain(&redone), "llo");
        assert_eq!(redone.selection().start_offset(), 0);
        assert!(redone.selection().is_collapsed());
        assert_eq!(redone.last_change_type(), Some(EditType::Redo));
        assert_eq!(redone.undo_stack().top().map(UndoEntry::edit_type), Some(EditType::RemoveRange));
    }

    #[test]
    fn push_clears_redo_stack() {
        let state = type_text(&state_with(""), "a").undo();
        assert!(state.can_redo());
        let state = type_text(&state, "b");
        assert!(!state.can_redo());
    }

    #[test]
    fn atomic_removal_forces_selection_and_stands_alone() {
        let content = ContentModel::from_blocks([
            Block::unstyled("a", "x"),
            Block::new("m", BlockType::Atomic, " "),
        ])
        .unwrap();
        let state = EditorState::create(content);
        let sel = SelectionModel::within_block(key("m"), 0, 1);
        let removed = remove_range(state.current_content(), &sel, RemovalDirection::Forward);
        let state = state.accept_selection(sel).push(removed, EditType::RemoveRange);
        assert!(state.must_force_selection());
        assert!(state.current_content().select_can_not_undo());
    }

    #[test]
    fn force_selection_gives_focus() {
        let state = state_with("abc").force_selection(SelectionModel::collapsed(key("a"), 2));
        assert!(state.must_force_selection());
        assert!(state.selection().has_focus());
        let state = state.accept_selection(SelectionModel::collapsed(key("a"), 1));
        assert!(!state.must_force_selection());
    }

    #[test]
    fn disallowed_undo_records_nothing() {
        let state = EditorState::create_with_config(
            ContentModel::from_text(""),
            EditorConfig {
                allow_undo: false,
                ..EditorConfig::default()
            },
        );
        let state = type_text(&state, "a");
        assert!(state.undo_stack().is_empty());
        assert_eq!(plain(&state.undo()), "a");
    }

    #[test]
    fn undo_depth_is_capped() {
        let mut state = EditorState::create_with_config(
            ContentModel::from_text(""),
            EditorConfig {
                max_undo_depth: Some(2),
                ..EditorConfig::default()
            },
        );
        for _ in 0..4 {
            let all = state.current_content().select_all();
            let content = crate::pipeline::replace_text(
                state.current_content(),
                &all,
                "z",
                &StyleSet::new(),
                None,
            );
            state = state.accept_selection(all).push(content, EditType::InsertFragment);
        }
        assert_eq!(state.undo_stack().len(), 2);
        assert!(state.undo_stack().depth <= 4);
        let undone = state.undo().undo();
        assert!(!undone.can_undo());
        assert_eq!(plain(&undone), "z");
    }

    fn entry(content: &Arc<ContentModel>, edit_type: EditType) -> UndoEntry {
        UndoEntry {
            content: Arc::clone(content),
            edit_type,
        }
    }

    #[test]
    fn undo_stack_is_shared_between_versions() {
        let content = Arc::new(ContentModel::from_text("x"));
        let base = UndoStack::default()
            .push(entry(&content, EditType::InsertCharacters))
            .push(entry(&content, EditType::RemoveRange));
        let longer = base.push(entry(&content, EditType::ChangeBlockType));
        assert_eq!(base.len(), 2);
        assert_eq!(longer.len(), 3);
        assert!(Arc::ptr_eq(
            longer.top.as_ref().unwrap().below.as_ref().unwrap(),
            base.top.as_ref().unwrap()
        ));

        let (top, rest) = longer.pop().unwrap();
        assert_eq!(top.edit_type(), EditType::ChangeBlockType);
        let kinds: Vec<EditType> = rest.iter().map(UndoEntry::edit_type).collect();
        assert_eq!(kinds, vec![EditType::RemoveRange, EditType::InsertCharacters]);
        assert!(UndoStack::default().pop().is_none());
    }

    #[test]
    fn capped_stack_unlinks_dropped_entries() {
        let content = Arc::new(ContentModel::from_text("x"));
        let mut stack = UndoStack::default();
        for _ in 0..10 {
            stack = stack.push(entry(&content, EditType::InsertFragment)).truncate(3);
            assert!(stack.len() <= 3);
            assert!(stack.depth <= 6);
        }
        assert_eq!(stack.iter().count(), 3);
        let (_, rest) = stack.truncate(0).push(entry(&content, EditType::RemoveRange)).pop().unwrap();
        assert!(rest.is_empty());
        assert!(rest.top().is_none());
    }

    #[test]
    fn long_history_drops_without_recursion() {
        let content = Arc::new(ContentModel::from_text("x"));
        let mut stack = UndoStack::default();
        for _ in 0..200_000 {
            stack = stack.push(entry(&content, EditType::InsertCharacters));
        }
        assert_eq!(stack.len(), 200_000);
        drop(stack);
        assert_eq!(Arc::strong_count(&content), 1);
    }
}
