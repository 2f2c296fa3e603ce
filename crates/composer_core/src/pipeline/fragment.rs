// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Clipboard fragments: extracting a selection as standalone blocks and
//! inserting such blocks back at a selection.

use std::collections::BTreeMap;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use super::entity_edges::strip_entities_at_edges;
use super::remove_range::remove_range;
use super::{assert_forward, assert_selection, RemovalDirection};
use crate::content::{Block, BlockKey, ContentModel, EntityKey, EntityMap};
use crate::error::ContentError;
use crate::invariants::assert_content;
use crate::run_list::{Run, RunList};
use crate::selection::SelectionModel;

/// A self-contained slice of content: one or more blocks plus the entities
/// they reference.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClipboardFragment {
    blocks: Vec<Arc<Block>>,
    entities: EntityMap,
}

impl ClipboardFragment {
    /// Build a fragment from external blocks, checking the same invariants
    /// as a content model.
    pub fn new(
        blocks: impl IntoIterator<Item = Block>,
        entities: EntityMap,
    ) -> Result<Self, ContentError> {
        let content = ContentModel::from_parts(blocks, entities)?;
        Ok(Self::from_content(&content))
    }

    /// One unstyled block per line of `text`.
    pub fn from_plain_text(text: &str) -> Self {
        Self::from_content(&ContentModel::from_text(text))
    }

    fn from_content(content: &ContentModel) -> Self {
        Self {
            blocks: content.blocks().cloned().collect(),
            entities: content.entities().clone(),
        }
    }

    pub fn blocks(&self) -> &[Arc<Block>] {
        &self.blocks
    }

    pub fn entities(&self) -> &EntityMap {
        &self.entities
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(|b| b.text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// This fragment as a standalone content model.
    pub fn to_content(&self) -> Result<ContentModel, ContentError> {
        ContentModel::from_parts(
            self.blocks.iter().map(|b| Block::clone(b)),
            self.entities.clone(),
        )
    }
}

/// Copy the content covered by `selection` into a fragment.
///
/// Blocks get fresh keys.  Immutable and segmented entities cut through by
/// an edge of the selection are dropped from the copied characters.  A
/// collapsed selection yields one empty block.
pub fn extract_fragment(
    content: &ContentModel,
    selection: &SelectionModel,
) -> ClipboardFragment {
    assert_selection(content, selection);
    let range = selection.forward();
    assert_forward(content, &range);
    let source = strip_entities_at_edges(content, &range);
    let start_key = range.start_key();
    let end_key = range.end_key();

    let blocks: Vec<Arc<Block>> = source
        .blocks_between(start_key, end_key)
        .map(|block| {
            let from = if block.key() == start_key {
                range.start_offset()
            } else {
                0
            };
            let to = if block.key() == end_key {
                range.end_offset()
            } else {
                block.len()
            };
            Arc::new(block.slice(from..to).with_key(BlockKey::generate()))
        })
        .collect();

    let keys = blocks
        .iter()
        .flat_map(|b| b.entity_runs().iter().map(|r| r.value))
        .collect::<Vec<_>>();
    ClipboardFragment {
        entities: source.entities().subset(keys),
        blocks,
    }
}

/// Insert `fragment` at `selection`, replacing whatever it covers.
///
/// A single-block fragment is spliced into the block at the caret.  With
/// several blocks, the first merges into the text before the caret, the last
/// takes the text after it, and the ones in between are inserted whole.
/// Every inserted block gets a fresh key, so the same fragment can be pasted
/// repeatedly.  The caret ends after the inserted content.
pub fn insert_fragment(
    content: &ContentModel,
    selection: &SelectionModel,
    fragment: &ClipboardFragment,
) -> ContentModel {
    assert_selection(content, selection);
    let (target, caret) = if selection.is_collapsed() {
        (content.clone(), selection.clone())
    } else {
        let removed = remove_range(content, selection, RemovalDirection::Forward);
        let caret = removed.selection_after().clone();
        (removed, caret)
    };

    let (entities, remap) = adopt_entities(target.entities(), fragment.entities());
    let inserted: Vec<Block> = fragment
        .blocks()
        .iter()
        .map(|b| remap_entities(b, &remap))
        .collect();

    let key = caret.start_key();
    let offset = caret.start_offset();
    let target_block = target.block_for_key(key);

    let mut replacement: Vec<Arc<Block>> = Vec::with_capacity(inserted.len());
    let after = match inserted.as_slice() {
        [] => unreachable!("fragments always hold a block"),
        [only] => {
            let mut block = target_block.splice(offset..offset, only);
            if target_block.is_empty() {
                block = block.with_type(only.block_type());
            }
            replacement.push(Arc::new(block));
            caret.caret_at(key.clone(), offset + only.len())
        }
        [first, middle @ .., last] => {
            let mut head = target_block.slice(0..offset).concat(first);
            if offset == 0 {
                head = head.with_type(first.block_type());
            }
            replacement.push(Arc::new(head));
            replacement.extend(
                middle
                    .iter()
                    .map(|b| Arc::new(b.with_key(BlockKey::generate()))),
            );
            let tail = last
                .with_key(BlockKey::generate())
                .concat(&target_block.slice(offset..target_block.len()));
            let after = caret.caret_at(tail.key().clone(), last.len());
            replacement.push(Arc::new(tail));
            after
        }
    };

    let mut blocks = IndexMap::with_capacity(target.block_count() + replacement.len());
    let mut replacement = Some(replacement);
    for (k, block) in target.block_map() {
        if k == key {
            for b in replacement.take().into_iter().flatten() {
                blocks.insert(b.key().clone(), b);
            }
        } else {
            blocks.insert(k.clone(), Arc::clone(block));
        }
    }

    let result = target
        .with_block_map(blocks)
        .with_entities(entities)
        .with_selections(selection.clone(), after);
    debug!(
        blocks = fragment.block_count(),
        at = %key,
        offset,
        "inserted fragment"
    );
    assert_content(&result);
    result
}

/// Merge the entities of a fragment into `target`.  An entity already
/// present under the same key keeps it; any other gets a fresh key.
fn adopt_entities(
    target: &EntityMap,
    incoming: &EntityMap,
) -> (EntityMap, BTreeMap<EntityKey, EntityKey>) {
    let mut entities = target.clone();
    let mut remap = BTreeMap::new();
    for (key, entity) in incoming.iter() {
        if target.get(key) == Some(entity) {
            remap.insert(key, key);
        } else {
            let (next, fresh) = entities.add(entity.clone());
            entities = next;
            remap.insert(key, fresh);
        }
    }
    (entities, remap)
}

fn remap_entities(block: &Block, remap: &BTreeMap<EntityKey, EntityKey>) -> Block {
    if block.entity_runs().is_empty() {
        return block.clone();
    }
    let runs: RunList<EntityKey> = block
        .entity_runs()
        .iter()
        .map(|r| Run::new(r.start, r.end, remap.get(&r.value).copied().unwrap_or(r.value)))
        .collect();
    block.with_entity_runs(runs)
}
