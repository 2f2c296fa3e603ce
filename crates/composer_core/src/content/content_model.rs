// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use super::block::{Block, BlockKey};
use super::entity::{Entity, EntityKey, EntityMap};
use crate::error::ContentError;
use crate::selection::SelectionModel;

static LINE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\r\n?|\n").expect("valid line break regex"));

/// An immutable document: an ordered map of blocks plus the entities they
/// reference.
///
/// Every content produced by the mutation pipeline also records the selection
/// before and after the edit, so the editor state can derive the caret and an
/// undo can restore the selection that preceded the change.
///
/// Blocks are held behind [`Arc`] so an edit shares every block it did not
/// touch with the content it was derived from.  Renderers rely on that:
/// `Arc::ptr_eq` on a block means "unchanged".
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContentModel {
    blocks: IndexMap<BlockKey, Arc<Block>>,
    entities: EntityMap,
    selection_before: SelectionModel,
    selection_after: SelectionModel,
    select_can_not_undo: bool,
}

impl ContentModel {
    /// Build content from externally supplied blocks, validating them.
    pub fn from_blocks(
        blocks: impl IntoIterator<Item = Block>,
    ) -> Result<Self, ContentError> {
        Self::from_parts(blocks, EntityMap::new())
    }

    /// Build content from blocks and the entities they reference.
    pub fn from_parts(
        blocks: impl IntoIterator<Item = Block>,
        entities: EntityMap,
    ) -> Result<Self, ContentError> {
        let mut map = IndexMap::new();
        for block in blocks {
            let key = block.key().clone();
            if map.insert(key.clone(), Arc::new(block)).is_some() {
                return Err(ContentError::DuplicateKey(key));
            }
        }
        let first = map.keys().next().cloned().ok_or(ContentError::Empty)?;
        let caret = SelectionModel::collapsed(first, 0);
        let content = Self {
            blocks: map,
            entities,
            selection_before: caret.clone(),
            selection_after: caret,
            select_can_not_undo: false,
        };
        content.validate()?;
        Ok(content)
    }

    /// One unstyled block per line of `text`.
    pub fn from_text(text: &str) -> Self {
        let blocks = LINE_BREAK
            .split(text)
            .map(|line| Arc::new(Block::unstyled(BlockKey::generate(), line)))
            .map(|b| (b.key().clone(), b))
            .collect::<IndexMap<_, _>>();
        // `split` always yields at least one item, even for "".
        let first = blocks
            .keys()
            .next()
            .cloned()
            .unwrap_or_else(BlockKey::generate);
        let caret = SelectionModel::collapsed(first, 0);
        Self {
            blocks,
            entities: EntityMap::new(),
            selection_before: caret.clone(),
            selection_after: caret,
            select_can_not_undo: false,
        }
    }

    // ------------------------------------------------------------------
    // Block access
    // ------------------------------------------------------------------

    pub fn block(&self, key: &BlockKey) -> Option<&Arc<Block>> {
        self.blocks.get(key)
    }

    /// The block for `key`.  A missing key is a programming error.
    pub fn block_for_key(&self, key: &BlockKey) -> &Arc<Block> {
        self.blocks
            .get(key)
            .unwrap_or_else(|| panic!("dangling block key {key}"))
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Arc<Block>> {
        self.blocks.values()
    }

    pub fn block_keys(&self) -> impl Iterator<Item = &BlockKey> {
        self.blocks.keys()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn first_block(&self) -> &Arc<Block> {
        self.blocks
            .first()
            .map(|(_, b)| b)
            .expect("content always holds a block")
    }

    pub fn last_block(&self) -> &Arc<Block> {
        self.blocks
            .last()
            .map(|(_, b)| b)
            .expect("content always holds a block")
    }

    pub fn index_of(&self, key: &BlockKey) -> Option<usize> {
        self.blocks.get_index_of(key)
    }

    pub fn key_before(&self, key: &BlockKey) -> Option<&BlockKey> {
        let idx = self.index_of(key)?;
        idx.checked_sub(1)
            .and_then(|i| self.blocks.get_index(i))
            .map(|(k, _)| k)
    }

    pub fn key_after(&self, key: &BlockKey) -> Option<&BlockKey> {
        let idx = self.index_of(key)?;
        self.blocks.get_index(idx + 1).map(|(k, _)| k)
    }

    /// The blocks from `start` to `end`, both inclusive, in document order.
    pub fn blocks_between(
        &self,
        start: &BlockKey,
        end: &BlockKey,
    ) -> impl Iterator<Item = &Arc<Block>> {
        let from = self.expect_index(start);
        let to = self.expect_index(end);
        assert!(from <= to, "block {start} comes after block {end}");
        self.blocks.values().skip(from).take(to - from + 1)
    }

    pub fn plain_text(&self) -> String {
        self.blocks
            .values()
            .map(|b| b.text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn has_text(&self) -> bool {
        self.blocks.len() > 1 || !self.first_block().is_empty()
    }

    // ------------------------------------------------------------------
    // Entities
    // ------------------------------------------------------------------

    pub fn entities(&self) -> &EntityMap {
        &self.entities
    }

    pub fn entity(&self, key: EntityKey) -> Option<&Entity> {
        self.entities.get(key)
    }

    /// Register `entity` and return the new content with its key.
    pub fn create_entity(&self, entity: Entity) -> (Self, EntityKey) {
        let (entities, key) = self.entities.add(entity);
        (
            Self {
                entities,
                ..self.clone()
            },
            key,
        )
    }

    // ------------------------------------------------------------------
    // Selection bookkeeping
    // ------------------------------------------------------------------

    pub fn selection_before(&self) -> &SelectionModel {
        &self.selection_before
    }

    pub fn selection_after(&self) -> &SelectionModel {
        &self.selection_after
    }

    /// Whether the edit that produced this content must stay a separate undo
    /// step and have its selection forced.
    pub fn select_can_not_undo(&self) -> bool {
        self.select_can_not_undo
    }

    /// A selection from the anchor to the focus, with its direction derived
    /// from block order.
    pub fn select(
        &self,
        anchor_key: &BlockKey,
        anchor_offset: usize,
        focus_key: &BlockKey,
        focus_offset: usize,
    ) -> SelectionModel {
        let anchor_idx = self.expect_index(anchor_key);
        let focus_idx = self.expect_index(focus_key);
        let is_backward = focus_idx < anchor_idx
            || (focus_idx == anchor_idx && focus_offset < anchor_offset);
        SelectionModel::new(
            anchor_key.clone(),
            anchor_offset,
            focus_key.clone(),
            focus_offset,
            is_backward,
        )
    }

    /// Everything from the start of the first block to the end of the last.
    pub fn select_all(&self) -> SelectionModel {
        let last = self.last_block();
        SelectionModel::new(
            self.first_block().key().clone(),
            0,
            last.key().clone(),
            last.len(),
            false,
        )
    }

    // ------------------------------------------------------------------
    // Derivation (pipeline only)
    // ------------------------------------------------------------------

    pub(crate) fn block_map(&self) -> &IndexMap<BlockKey, Arc<Block>> {
        &self.blocks
    }

    pub(crate) fn with_block_map(
        &self,
        blocks: IndexMap<BlockKey, Arc<Block>>,
    ) -> Self {
        assert!(!blocks.is_empty(), "content must keep at least one block");
        Self {
            blocks,
            ..self.clone()
        }
    }

    pub(crate) fn with_entities(&self, entities: EntityMap) -> Self {
        Self {
            entities,
            ..self.clone()
        }
    }

    /// Stamp the selection around an edit.  Clears `select_can_not_undo`.
    pub(crate) fn with_selections(
        &self,
        before: SelectionModel,
        after: SelectionModel,
    ) -> Self {
        Self {
            selection_before: before,
            selection_after: after,
            select_can_not_undo: false,
            ..self.clone()
        }
    }

    pub(crate) fn with_selection_before(&self, before: SelectionModel) -> Self {
        Self {
            selection_before: before,
            ..self.clone()
        }
    }

    pub(crate) fn with_select_can_not_undo(&self, flag: bool) -> Self {
        Self {
            select_can_not_undo: flag,
            ..self.clone()
        }
    }

    fn expect_index(&self, key: &BlockKey) -> usize {
        self.index_of(key)
            .unwrap_or_else(|| panic!("dangling block key {key}"))
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    /// Check every structural invariant of the content.
    pub fn validate(&self) -> Result<(), ContentError> {
        if self.blocks.is_empty() {
            return Err(ContentError::Empty);
        }
        for (key, block) in &self.blocks {
            if key != block.key() {
                return Err(ContentError::DuplicateKey(block.key().clone()));
            }
            let len = block.len();
            block.style_runs().check(len).map_err(|defect| {
                ContentError::MalformedStyles {
                    key: key.clone(),
                    defect,
                }
            })?;
            if let Some(run) = block.style_runs().iter().find(|r| r.value.is_empty()) {
                return Err(ContentError::EmptyStyleRun {
                    key: key.clone(),
                    start: run.start,
                });
            }
            block.entity_runs().check(len).map_err(|defect| {
                ContentError::MalformedEntities {
                    key: key.clone(),
                    defect,
                }
            })?;
            if let Some(run) = block
                .entity_runs()
                .iter()
                .find(|r| !self.entities.contains(r.value))
            {
                return Err(ContentError::DanglingEntity {
                    key: key.clone(),
                    entity: run.value,
                });
            }
        }
        // `selection_before` resolves against the content this one was
        // derived from, not against this one.
        self.check_selection(&self.selection_after)
    }

    /// Check that `selection` resolves against this content.
    pub fn check_selection(
        &self,
        selection: &SelectionModel,
    ) -> Result<(), ContentError> {
        for (key, offset) in [
            (selection.anchor_key(), selection.anchor_offset()),
            (selection.focus_key(), selection.focus_offset()),
        ] {
            let block = self
                .blocks
                .get(key)
                .ok_or_else(|| ContentError::DanglingSelection(key.clone()))?;
            let len = block.len();
            if offset > len {
                return Err(ContentError::SelectionOutOfBounds {
                    key: key.clone(),
                    offset,
                    len,
                });
            }
        }
        let anchor_idx = self.expect_index(selection.anchor_key());
        let focus_idx = self.expect_index(selection.focus_key());
        let is_backward = focus_idx < anchor_idx
            || (focus_idx == anchor_idx
                && selection.focus_offset() < selection.anchor_offset());
        if selection.is_backward() != is_backward {
            return Err(ContentError::SelectionDirection {
                anchor_key: selection.anchor_key().clone(),
                anchor_offset: selection.anchor_offset(),
                focus_key: selection.focus_key().clone(),
                focus_offset: selection.focus_offset(),
                is_backward: selection.is_backward(),
            });
        }
        Ok(())
    }
}
