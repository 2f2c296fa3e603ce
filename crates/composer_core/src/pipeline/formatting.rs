// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Inline styles, entities and block types over a selection.
//!
//! A selection may span several blocks; each block is rewritten over the
//! part of it the selection covers.  Blocks whose runs come out identical
//! keep their shared identity.

use std::ops::Range;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use super::assert_selection;
use crate::content::{Block, BlockKey, BlockType, ContentModel, EntityKey, InlineStyle};
use crate::invariants::assert_content;
use crate::selection::SelectionModel;

/// Add `style` to every character of the selection.
pub fn apply_inline_style(
    content: &ContentModel,
    selection: &SelectionModel,
    style: InlineStyle,
) -> ContentModel {
    debug!(%style, "applying inline style");
    map_selected(content, selection, |block, range| {
        block.with_style_runs(block.style_runs().map_range(range, |current| {
            Some(current.cloned().unwrap_or_default().with(style))
        }))
    })
}

/// Remove `style` from every character of the selection.
pub fn remove_inline_style(
    content: &ContentModel,
    selection: &SelectionModel,
    style: InlineStyle,
) -> ContentModel {
    debug!(%style, "removing inline style");
    map_selected(content, selection, |block, range| {
        block.with_style_runs(block.style_runs().map_range(range, |current| {
            current.map(|s| s.without(style)).filter(|s| !s.is_empty())
        }))
    })
}

/// Attach `entity` to the selection, or clear entities from it with `None`.
pub fn apply_entity(
    content: &ContentModel,
    selection: &SelectionModel,
    entity: Option<EntityKey>,
) -> ContentModel {
    if let Some(key) = entity {
        assert!(content.entities().contains(key), "unknown entity {key}");
    }
    debug!(entity = ?entity, "applying entity");
    map_selected(content, selection, |block, range| {
        block.with_entity_runs(block.entity_runs().set(range, entity))
    })
}

/// Give every block touched by the selection the type `block_type`.  A
/// collapsed selection changes the block holding the caret.
pub fn set_block_type(
    content: &ContentModel,
    selection: &SelectionModel,
    block_type: BlockType,
) -> ContentModel {
    assert_selection(content, selection);
    let range = selection.forward();
    let mut blocks = content.block_map().clone();
    for block in content.blocks_between(range.start_key(), range.end_key()) {
        if block.block_type() != block_type {
            blocks.insert(block.key().clone(), Arc::new(block.with_type(block_type)));
        }
    }
    debug!(%block_type, "set block type");
    finish(content, blocks, selection)
}

/// Rewrite the covered part of each selected block through `f`.
fn map_selected<F>(
    content: &ContentModel,
    selection: &SelectionModel,
    mut f: F,
) -> ContentModel
where
    F: FnMut(&Block, Range<usize>) -> Block,
{
    assert_selection(content, selection);
    let range = selection.forward();
    let start_key = range.start_key();
    let end_key = range.end_key();
    let mut blocks = content.block_map().clone();
    for block in content.blocks_between(start_key, end_key) {
        let from = if block.key() == start_key { range.start_offset() } else { 0 };
        let to = if block.key() == end_key { range.end_offset() } else { block.len() };
        if from == to {
            continue;
        }
        let updated = f(block, from..to);
        if &updated != block.as_ref() {
            blocks.insert(block.key().clone(), Arc::new(updated));
        }
    }
    finish(content, blocks, selection)
}

fn finish(
    content: &ContentModel,
    blocks: IndexMap<BlockKey, Arc<Block>>,
    selection: &SelectionModel,
) -> ContentModel {
    let result = content
        .with_block_map(blocks)
        .with_selections(selection.clone(), selection.clone());
    assert_content(&result);
    result
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{apply_entity, apply_inline_style, remove_inline_style, set_block_type};
    use crate::content::{
        Block, BlockKey, BlockType, ContentModel, Entity, InlineStyle, Mutability,
        StyleSet,
    };
    use crate::selection::SelectionModel;

    fn key(k: &str) -> BlockKey {
        BlockKey::new(k)
    }

    fn content() -> ContentModel {
        ContentModel::from_blocks([
            Block::unstyled("a", "first"),
            Block::unstyled("b", "second"),
            Block::unstyled("c", "third"),
        ])
        .unwrap()
    }

    #[test]
    fn style_spans_blocks() {
        let content = content();
        let sel = content.select(&key("a"), 3, &key("b"), 2);
        let out = apply_inline_style(&content, &sel, InlineStyle::Bold);
        let a = out.block_for_key(&key("a"));
        let b = out.block_for_key(&key("b"));
        assert!(a.styles_at(2).is_empty());
        assert!(a.styles_at(3).contains(InlineStyle::Bold));
        assert!(b.styles_at(1).contains(InlineStyle::Bold));
        assert!(b.styles_at(2).is_empty());
        assert!(Arc::ptr_eq(
            content.block_for_key(&key("c")),
            out.block_for_key(&key("c"))
        ));
        assert_eq!(out.selection_after(), &sel);
    }

    #[test]
    fn removing_style_drops_empty_runs() {
        let content = content();
        let sel = SelectionModel::within_block(key("b"), 0, 6);
        let styled = apply_inline_style(&content, &sel, InlineStyle::Italic);
        let plain = remove_inline_style(&styled, &sel, InlineStyle::Italic);
        assert!(plain.block_for_key(&key("b")).style_runs().is_empty());
    }

    #[test]
    fn removing_one_style_keeps_others() {
        let content = content();
        let sel = SelectionModel::within_block(key("a"), 0, 5);
        let out = apply_inline_style(&content, &sel, InlineStyle::Bold);
        let out = apply_inline_style(&out, &sel, InlineStyle::Code);
        let out = remove_inline_style(&out, &sel, InlineStyle::Bold);
        assert_eq!(
            out.block_for_key(&key("a")).styles_at(4),
            StyleSet::from([InlineStyle::Code])
        );
    }

    #[test]
    fn unchanged_blocks_keep_identity() {
        let content = content();
        let sel = SelectionModel::within_block(key("a"), 0, 5);
        let out = remove_inline_style(&content, &sel, InlineStyle::Bold);
        assert!(Arc::ptr_eq(
            content.block_for_key(&key("a")),
            out.block_for_key(&key("a"))
        ));
    }

    #[test]
    fn entity_is_applied_and_cleared() {
        let (content, link) =
            content().create_entity(Entity::new("LINK", Mutability::Mutable));
        let sel = SelectionModel::within_block(key("c"), 1, 4);
        let linked = apply_entity(&content, &sel, Some(link));
        assert_eq!(linked.block_for_key(&key("c")).entity_range_at(2), Some(1..4));
        let cleared = apply_entity(&linked, &sel, None);
        assert!(cleared.block_for_key(&key("c")).entity_runs().is_empty());
    }

    #[test]
    #[should_panic(expected = "unknown entity")]
    fn applying_unknown_entity_panics() {
        let content = content();
        let sel = SelectionModel::within_block(key("c"), 1, 4);
        apply_entity(&content, &sel, Some(crate::content::EntityKey::new(9)));
    }

    #[test]
    fn block_type_covers_every_touched_block() {
        let content = content();
        let sel = content.select(&key("a"), 1, &key("b"), 0);
        let out = set_block_type(&content, &sel, BlockType::UnorderedListItem);
        assert_eq!(out.block_for_key(&key("a")).block_type(), BlockType::UnorderedListItem);
        assert_eq!(out.block_for_key(&key("b")).block_type(), BlockType::UnorderedListItem);
        assert_eq!(out.block_for_key(&key("c")).block_type(), BlockType::Unstyled);
    }

    #[test]
    fn block_type_for_caret() {
        let content = content();
        let out = set_block_type(
            &content,
            &SelectionModel::collapsed(key("c"), 2),
            BlockType::CodeBlock,
        );
        assert_eq!(out.block_for_key(&key("c")).block_type(), BlockType::CodeBlock);
    }
}
