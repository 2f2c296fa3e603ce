// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use super::entity_edges::{entity_removal_range, strip_entities_at_edges};
use super::{assert_forward, assert_selection, RemovalDirection};
use crate::content::{BlockType, ContentModel};
use crate::invariants::assert_content;
use crate::selection::SelectionModel;

/// Remove the text covered by `selection`.
///
/// The blocks spanned by the selection are joined: the first keeps its key
/// and type and receives the text after the end of the range; the others are
/// dropped.  Style and entity runs are trimmed with the text.  The returned
/// content records `selection` as the selection before the edit and a caret
/// at the start of the removed range as the selection after it.
///
/// Entities shape the range first (see [`entity_edges`](super::entity_edges)),
/// so the caret may land before the selection start when an immutable or
/// segmented entity is removed whole.
///
/// A non-collapsed removal inside a single atomic block is flagged
/// [`select_can_not_undo`](ContentModel::select_can_not_undo).
pub fn remove_range(
    content: &ContentModel,
    selection: &SelectionModel,
    direction: RemovalDirection,
) -> ContentModel {
    assert_selection(content, selection);
    let range = selection.forward();
    if range.is_collapsed() {
        return content.with_selections(selection.clone(), range);
    }

    let start_key = range.start_key().clone();
    let same_block = &start_key == range.end_key();
    let start_block = content.block_for_key(&start_key);
    let atomic = same_block && start_block.block_type() == BlockType::Atomic;

    let expanded = if same_block {
        entity_removal_range(
            content.entities(),
            start_block,
            range.start_offset(),
            range.end_offset(),
            direction,
        )
    } else {
        None
    };
    let (source, range) = match expanded {
        Some(r) => (
            content.clone(),
            SelectionModel::within_block(start_key, r.start, r.end)
                .with_focus(range.has_focus()),
        ),
        None => (strip_entities_at_edges(content, &range), range),
    };

    let removed = remove_forward_range(&source, &range)
        .with_selections(selection.clone(), range.collapse_to_start())
        .with_select_can_not_undo(atomic);

    debug!(
        start_key = %range.start_key(),
        start = range.start_offset(),
        end_key = %range.end_key(),
        end = range.end_offset(),
        atomic,
        "removed range"
    );
    assert_content(&removed);
    removed
}

/// Splice out a forward, non-collapsed range with no entity adjustment.
fn remove_forward_range(
    content: &ContentModel,
    range: &SelectionModel,
) -> ContentModel {
    assert_forward(content, range);
    let start_key = range.start_key();
    let end_key = range.end_key();
    let start_block = content.block_for_key(start_key);
    let end_block = content.block_for_key(end_key);

    let head = start_block.slice(0..range.start_offset());
    let tail = end_block.slice(range.end_offset()..end_block.len());
    let mut joined = Some(Arc::new(head.concat(&tail)));

    let mut removing = false;
    let mut blocks = IndexMap::with_capacity(content.block_count());
    for (key, block) in content.block_map() {
        if key == start_key {
            if let Some(j) = joined.take() {
                blocks.insert(key.clone(), j);
            }
            removing = key != end_key;
            continue;
        }
        if removing {
            if key == end_key {
                removing = false;
            }
            continue;
        }
        blocks.insert(key.clone(), Arc::clone(block));
    }
    content.with_block_map(blocks)
}
