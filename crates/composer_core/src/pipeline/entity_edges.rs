// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! How entities constrain the range an edit may touch.
//!
//! Mutable entities behave like plain text.  An immutable entity is one
//! unit: removing part of it removes all of it, and cutting through it from
//! outside strips the entity from the part left behind.  A segmented entity
//! (e.g. a mention "Jane Doe") loses whole words.

use std::ops::Range;
use std::sync::Arc;

use super::RemovalDirection;
use crate::content::{Block, ContentModel, EntityMap, Mutability};
use crate::selection::SelectionModel;

/// Remove non-mutable entities from any run that straddles an edge of
/// `range` (which must be forward).  Blocks that need no change stay shared.
pub(crate) fn strip_entities_at_edges(
    content: &ContentModel,
    range: &SelectionModel,
) -> ContentModel {
    let mut blocks = content.block_map().clone();
    let mut changed = false;
    for (key, offset) in [
        (range.start_key(), range.start_offset()),
        (range.end_key(), range.end_offset()),
    ] {
        let block = Arc::clone(content.block_for_key(key));
        let current = blocks.get(key).map_or(block, Arc::clone);
        if let Some(stripped) = strip_at(content.entities(), &current, offset) {
            blocks.insert(key.clone(), Arc::new(stripped));
            changed = true;
        }
    }
    if changed {
        content.with_block_map(blocks)
    } else {
        content.clone()
    }
}

fn strip_at(entities: &EntityMap, block: &Block, offset: usize) -> Option<Block> {
    let before = block.entity_at(offset.checked_sub(1)?)?;
    let after = block.entity_at(offset)?;
    if before != after {
        return None;
    }
    if entities.get(after)?.mutability == Mutability::Mutable {
        return None;
    }
    let range = block.entity_range_at(offset)?;
    Some(block.with_entity_runs(block.entity_runs().set(range, None)))
}

/// For a forward, non-collapsed range inside one block whose first and last
/// characters carry the same entity run, the range that must really go.
///
/// Returns `None` when the range does not start and end in one entity run.
pub(crate) fn entity_removal_range(
    entities: &EntityMap,
    block: &Block,
    start: usize,
    end: usize,
    direction: RemovalDirection,
) -> Option<Range<usize>> {
    if start >= end {
        return None;
    }
    let key = block.entity_at(start)?;
    if block.entity_at(end - 1) != Some(key) {
        return None;
    }
    let run = block.entity_range_at(start)?;
    if run.end < end {
        return None;
    }
    let range = match entities.get(key)?.mutability {
        Mutability::Mutable => start..end,
        Mutability::Immutable => run,
        Mutability::Segmented => segmented_removal_range(
            start,
            end,
            block.text_slice(run.clone()),
            run.start,
            direction,
        ),
    };
    Some(range)
}

/// Widen `[start, end)` to whole space-separated segments of an entity whose
/// text is `text` and which begins at `entity_start`.
///
/// Each segment owns one neighbouring space: the preceding one when removing
/// forward, the following one when removing backward.  When the removal
/// touches exactly one end of the entity, one more separator goes with it so
/// no dangling space is left behind.
fn segmented_removal_range(
    start: usize,
    end: usize,
    text: &str,
    entity_start: usize,
    direction: RemovalDirection,
) -> Range<usize> {
    let pieces: Vec<&str> = text.split(' ').collect();
    let last = pieces.len() - 1;
    let mut segment_start = entity_start;
    let mut removal: Option<(usize, usize)> = None;
    for (i, piece) in pieces.iter().enumerate() {
        let owns_space = match direction {
            RemovalDirection::Forward => i > 0,
            RemovalDirection::Backward => i < last,
        };
        let segment_end = segment_start + piece.chars().count() + usize::from(owns_space);
        if start < segment_end && segment_start < end {
            removal = Some(match removal {
                Some((s, _)) => (s, segment_end),
                None => (segment_start, segment_end),
            });
        } else if removal.is_some() {
            break;
        }
        segment_start = segment_end;
    }

    let entity_end = entity_start + text.chars().count();
    let (mut from, mut to) = removal.unwrap_or((start, end));
    if (from == entity_start) != (to == entity_end) {
        match direction {
            RemovalDirection::Forward if to != entity_end => to += 1,
            RemovalDirection::Backward if from != entity_start => from -= 1,
            _ => {}
        }
    }
    from..to
}

#[cfg(test)]
mod tests {
    use super::{entity_removal_range, segmented_removal_range, strip_entities_at_edges};
    use crate::content::{Block, BlockKey, ContentModel, Entity, EntityMap, Mutability};
    use crate::pipeline::RemovalDirection::{Backward, Forward};
    use crate::selection::SelectionModel;

    fn content_with(mutability: Mutability) -> ContentModel {
        let (entities, key) =
            EntityMap::new().add(Entity::new("MENTION", mutability));
        ContentModel::from_parts(
            [Block::unstyled("a", "hi Jane Doe!").with_entity(3..11, key)],
            entities,
        )
        .unwrap()
    }

    fn block(content: &ContentModel) -> &Block {
        content.block_for_key(&BlockKey::new("a"))
    }

    #[test]
    fn forward_segments_take_preceding_space() {
        // "Jane Doe" at 3..11, removing inside "Doe".
        assert_eq!(segmented_removal_range(8, 9, "Jane Doe", 3, Forward), 7..11);
    }

    #[test]
    fn forward_first_segment_takes_following_space() {
        assert_eq!(segmented_removal_range(4, 5, "Jane Doe", 3, Forward), 3..8);
    }

    #[test]
    fn backward_last_segment_takes_preceding_space() {
        assert_eq!(segmented_removal_range(9, 10, "Jane Doe", 3, Backward), 7..11);
    }

    #[test]
    fn spanning_every_segment_removes_whole_entity() {
        assert_eq!(segmented_removal_range(3, 11, "Jane Doe", 3, Forward), 3..11);
    }

    #[test]
    fn immutable_entity_is_removed_whole() {
        let content = content_with(Mutability::Immutable);
        let range = entity_removal_range(
            content.entities(),
            block(&content),
            5,
            6,
            Forward,
        );
        assert_eq!(range, Some(3..11));
    }

    #[test]
    fn mutable_entity_keeps_range() {
        let content = content_with(Mutability::Mutable);
        let range =
            entity_removal_range(content.entities(), block(&content), 5, 6, Forward);
        assert_eq!(range, Some(5..6));
    }

    #[test]
    fn range_leaving_entity_is_not_expanded() {
        let content = content_with(Mutability::Immutable);
        let range =
            entity_removal_range(content.entities(), block(&content), 5, 12, Forward);
        assert_eq!(range, None);
    }

    #[test]
    fn stripping_removes_straddled_immutable_entity() {
        let content = content_with(Mutability::Immutable);
        let sel = SelectionModel::within_block(BlockKey::new("a"), 5, 12);
        let stripped = strip_entities_at_edges(&content, &sel);
        assert!(block(&stripped).entity_runs().is_empty());
        assert!(!block(&content).entity_runs().is_empty());
    }

    #[test]
    fn stripping_keeps_mutable_entity() {
        let content = content_with(Mutability::Mutable);
        let sel = SelectionModel::within_block(BlockKey::new("a"), 5, 12);
        let stripped = strip_entities_at_edges(&content, &sel);
        assert_eq!(block(&stripped).entity_range_at(3), Some(3..11));
    }

    #[test]
    fn stripping_ignores_edges_on_entity_boundaries() {
        let content = content_with(Mutability::Immutable);
        let sel = SelectionModel::within_block(BlockKey::new("a"), 3, 11);
        let stripped = strip_entities_at_edges(&content, &sel);
        assert!(std::sync::Arc::ptr_eq(
            content.first_block(),
            stripped.first_block()
        ));
    }
}
