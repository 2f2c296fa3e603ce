// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Text editing operations: typing, replacing the selection, backspace and
//! delete.

use std::sync::Arc;

use tracing::trace;
use unicode_segmentation::UnicodeSegmentation;

use super::remove_range::remove_range;
use super::{assert_selection, RemovalDirection};
use crate::content::{
    byte_offset, char_offset, Block, ContentModel, EntityKey, Mutability,
    StyleSet,
};
use crate::invariants::assert_content;
use crate::run_list::{Run, RunList};
use crate::selection::SelectionModel;

/// Replace the selection with `text`, styled with `style` and carrying
/// `entity`.  A collapsed selection simply inserts.
pub fn replace_text(
    content: &ContentModel,
    selection: &SelectionModel,
    text: &str,
    style: &StyleSet,
    entity: Option<EntityKey>,
) -> ContentModel {
    assert_selection(content, selection);
    if selection.is_collapsed() {
        return insert_text(content, selection, text, style, entity);
    }
    let removed = remove_range(content, selection, RemovalDirection::Forward);
    let caret = removed.selection_after().clone();
    insert_text(&removed, &caret, text, style, entity)
        .with_selection_before(selection.clone())
}

/// Insert `text` at a collapsed selection.
///
/// Panics if the selection is not collapsed or `text` holds a line break;
/// splitting blocks goes through [`insert_fragment`](super::insert_fragment).
pub fn insert_text(
    content: &ContentModel,
    selection: &SelectionModel,
    text: &str,
    style: &StyleSet,
    entity: Option<EntityKey>,
) -> ContentModel {
    assert_selection(content, selection);
    assert!(selection.is_collapsed(), "insert_text needs a collapsed selection");
    assert!(
        !text.contains(['\n', '\r']),
        "insert_text cannot insert line breaks"
    );
    if let Some(key) = entity {
        assert!(content.entities().contains(key), "unknown entity {key}");
    }
    if text.is_empty() {
        return content.with_selections(selection.clone(), selection.clone());
    }

    let key = selection.start_key();
    let offset = selection.start_offset();
    let block = content.block_for_key(key);

    let len = text.chars().count();
    let mut inserted = Block::unstyled(key.clone(), text);
    if !style.is_empty() {
        inserted = inserted
            .with_style_runs(RunList::from_runs([Run::new(0, len, style.clone())]));
    }
    if let Some(e) = entity {
        inserted =
            inserted.with_entity_runs(RunList::from_runs([Run::new(0, len, e)]));
    }

    let mut blocks = content.block_map().clone();
    blocks.insert(key.clone(), Arc::new(block.splice(offset..offset, &inserted)));
    let result = content
        .with_block_map(blocks)
        .with_selections(selection.clone(), selection.caret_at(key.clone(), offset + len));
    trace!(%key, offset, len, "inserted text");
    assert_content(&result);
    result
}

/// Remove the grapheme next to a collapsed caret, or the selection when it
/// is not collapsed.
///
/// At a block boundary the caret's block is joined with its neighbour.
/// Returns `None` when there is nothing to remove (backspace at the very
/// start, delete at the very end).
pub fn remove_adjacent(
    content: &ContentModel,
    selection: &SelectionModel,
    direction: RemovalDirection,
) -> Option<ContentModel> {
    assert_selection(content, selection);
    if !selection.is_collapsed() {
        return Some(remove_range(content, selection, direction));
    }

    let key = selection.start_key();
    let offset = selection.start_offset();
    let block = content.block_for_key(key);
    let text = block.text();

    let range = match direction {
        RemovalDirection::Backward if offset > 0 => {
            let end = byte_offset(text, offset);
            let start = text[..end]
                .grapheme_indices(true)
                .next_back()
                .map_or(0, |(i, _)| i);
            SelectionModel::within_block(key.clone(), char_offset(text, start), offset)
        }
        RemovalDirection::Backward => {
            let prev = content.key_before(key)?;
            let prev_len = content.block_for_key(prev).len();
            SelectionModel::new(prev.clone(), prev_len, key.clone(), 0, false)
        }
        RemovalDirection::Forward if offset < block.len() => {
            let start = byte_offset(text, offset);
            let end = text[start..]
                .graphemes(true)
                .next()
                .map_or(text.len(), |g| start + g.len());
            SelectionModel::within_block(key.clone(), offset, char_offset(text, end))
        }
        RemovalDirection::Forward => {
            let next = content.key_after(key)?;
            SelectionModel::new(key.clone(), offset, next.clone(), 0, false)
        }
    };
    let range = range.with_focus(selection.has_focus());
    Some(remove_range(content, &range, direction).with_selection_before(selection.clone()))
}

/// The style that typed text should take at `selection`.
///
/// A caret inherits from the character before it, or the first character of
/// its block, or failing both the last character of the nearest non-empty
/// block above.  A range uses its first character.
pub fn current_inline_style(
    content: &ContentModel,
    selection: &SelectionModel,
) -> StyleSet {
    assert_selection(content, selection);
    let key = selection.start_key();
    let offset = selection.start_offset();
    let block = content.block_for_key(key);

    if selection.is_collapsed() {
        if offset > 0 {
            return block.styles_at(offset - 1);
        }
        if !block.is_empty() {
            return block.styles_at(0);
        }
    } else {
        if offset < block.len() {
            return block.styles_at(offset);
        }
        if offset > 0 {
            return block.styles_at(offset - 1);
        }
    }
    look_upward_for_style(content, block)
}

fn look_upward_for_style(content: &ContentModel, block: &Block) -> StyleSet {
    let mut key = block.key();
    while let Some(prev) = content.key_before(key) {
        let b = content.block_for_key(prev);
        if !b.is_empty() {
            return b.styles_at(b.len() - 1);
        }
        key = prev;
    }
    StyleSet::new()
}

/// The entity that typed text should carry at `selection`.
///
/// Only a mutable entity continues: a caret must sit strictly inside its
/// run, a range must start on it.
pub fn entity_for_typing(
    content: &ContentModel,
    selection: &SelectionModel,
) -> Option<EntityKey> {
    assert_selection(content, selection);
    let key = selection.start_key();
    let offset = selection.start_offset();
    let block = content.block_for_key(key);

    let entity = if selection.is_collapsed() {
        let before = block.entity_at(offset.checked_sub(1)?)?;
        (block.entity_at(offset) == Some(before)).then_some(before)?
    } else if offset == block.len() {
        return None;
    } else {
        block.entity_at(offset)?
    };
    (content.entities().get(entity)?.mutability == Mutability::Mutable).then_some(entity)
}
