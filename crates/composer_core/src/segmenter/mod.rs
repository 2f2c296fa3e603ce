// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Leaf segmentation.
//!
//! Splits one block into the runs a presentation layer renders: a new
//! [`Leaf`] starts wherever the inline style set changes, an entity starts or
//! ends, or a decorator match starts or ends.  Leaves under the same
//! decorator match are grouped into one [`LeafSetDescriptor`]; leaves outside
//! any match are grouped per gap between matches.
//!
//! All offsets are `char` offsets into the block text.  Segmenting caches
//! nothing; [`ContentsRenderer`] decides when a block must be segmented
//! again and refreshes the [`LeafFlags`] of the blocks it does not segment.

mod render;

use tracing::trace;

pub use render::{
    should_update, BlockRenderProps, ContentsRenderer, RenderOptions,
    RenderPass, RenderedBlock, TextAlignment, TextDirection,
};

use crate::content::{Block, EntityKey, StyleSet};
use crate::decorator::{DecoratorKey, DecoratorLookup, DecoratorMatches};
use crate::selection::SelectionModel;

// ─── Public types ────────────────────────────────────────────────────────────

/// Selection-dependent rendering hints for one leaf.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LeafFlags {
    /// The caret sits, focused, in this leaf's block.
    pub is_editing: bool,
    /// The block has no text; its single leaf is zero-length.
    pub is_empty: bool,
    /// An edge of the selection falls inside (or on a bound of) this leaf.
    pub has_selection_edge: bool,
    /// The last leaf of the block.
    pub is_last: bool,
}

impl LeafFlags {
    fn for_leaf(block: &Block, selection: &SelectionModel, start: usize, end: usize) -> Self {
        let len = block.len();
        Self {
            is_editing: selection.has_focus()
                && selection.is_collapsed()
                && selection.start_key() == block.key(),
            is_empty: len == 0,
            has_selection_edge: selection.has_edge_within(block.key(), start, end),
            is_last: end == len,
        }
    }
}

/// A minimal run of text with one style set and one entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Leaf {
    pub start: usize,
    pub end: usize,
    pub styles: StyleSet,
    pub entity: Option<EntityKey>,
    pub flags: LeafFlags,
}

/// Consecutive leaves rendered as one unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeafSetDescriptor {
    pub start: usize,
    pub end: usize,
    /// The decorator match these leaves belong to, if any.
    pub decorator_key: Option<DecoratorKey>,
    pub leaves: Vec<Leaf>,
}

// ─── Segmentation ────────────────────────────────────────────────────────────

/// `leaf_sets`, previously segmented from `block`, with their flags
/// recomputed for `selection`.  Boundaries are kept as they are.
pub(crate) fn reflag(
    block: &Block,
    leaf_sets: &[LeafSetDescriptor],
    selection: &SelectionModel,
) -> Vec<LeafSetDescriptor> {
    leaf_sets
        .iter()
        .map(|set| LeafSetDescriptor {
            start: set.start,
            end: set.end,
            decorator_key: set.decorator_key.clone(),
            leaves: set
                .leaves
                .iter()
                .map(|leaf| Leaf {
                    flags: LeafFlags::for_leaf(block, selection, leaf.start, leaf.end),
                    ..leaf.clone()
                })
                .collect(),
        })
        .collect()
}

/// Segment `block`, grouping leaves by every match in `decorations`.
pub fn segment(
    block: &Block,
    decorations: &DecoratorMatches,
    selection: &SelectionModel,
) -> Vec<LeafSetDescriptor> {
    Segmenter::new().segment(block, decorations, selection)
}

/// Segments blocks, optionally consulting a [`DecoratorLookup`]: a match whose
/// key resolves to no component is rendered as plain, ungrouped leaves.
#[derive(Clone, Copy, Default)]
pub struct Segmenter<'a> {
    lookup: Option<&'a dyn DecoratorLookup>,
}

impl<'a> Segmenter<'a> {
    pub fn new() -> Self {
        Self { lookup: None }
    }

    pub fn with_lookup(lookup: &'a dyn DecoratorLookup) -> Self {
        Self {
            lookup: Some(lookup),
        }
    }

    pub fn segment(
        &self,
        block: &Block,
        decorations: &DecoratorMatches,
        selection: &SelectionModel,
    ) -> Vec<LeafSetDescriptor> {
        let len = block.len();
        assert!(
            decorations.extent() <= len,
            "decorations reach offset {} in block {} of length {len}",
            decorations.extent(),
            block.key()
        );

        let flags_for =
            |start: usize, end: usize| LeafFlags::for_leaf(block, selection, start, end);

        if len == 0 {
            return vec![LeafSetDescriptor {
                start: 0,
                end: 0,
                decorator_key: None,
                leaves: vec![Leaf {
                    start: 0,
                    end: 0,
                    styles: StyleSet::new(),
                    entity: None,
                    flags: flags_for(0, 0),
                }],
            }];
        }

        let mut boundaries: Vec<usize> = block
            .style_runs()
            .boundaries()
            .chain(block.entity_runs().boundaries())
            .filter(|&b| b > 0 && b < len)
            .collect();
        boundaries.sort_unstable();
        boundaries.dedup();

        let leaf_sets: Vec<LeafSetDescriptor> = self
            .decorator_ranges(decorations, len)
            .into_iter()
            .map(|(start, end, decorator_key)| {
                let mut cuts = vec![start];
                cuts.extend(boundaries.iter().copied().filter(|&b| b > start && b < end));
                cuts.push(end);
                let leaves = cuts
                    .windows(2)
                    .map(|w| Leaf {
                        start: w[0],
                        end: w[1],
                        styles: block.styles_at(w[0]),
                        entity: block.entity_at(w[0]),
                        flags: flags_for(w[0], w[1]),
                    })
                    .collect();
                LeafSetDescriptor {
                    start,
                    end,
                    decorator_key,
                    leaves,
                }
            })
            .collect();
        trace!(block = %block.key(), leaf_sets = leaf_sets.len(), "segmented block");
        leaf_sets
    }

    /// Cover `[0, len)` with decorated and undecorated ranges, in order.
    fn decorator_ranges(
        &self,
        decorations: &DecoratorMatches,
        len: usize,
    ) -> Vec<(usize, usize, Option<DecoratorKey>)> {
        let mut ranges = Vec::new();
        let mut plain_from = 0;
        for m in decorations.iter() {
            let renderable = self
                .lookup
                .map_or(true, |l| l.component_for_key(&m.key).is_some());
            if !renderable {
                continue;
            }
            if plain_from < m.start {
                ranges.push((plain_from, m.start, None));
            }
            ranges.push((m.start, m.end, Some(m.key.clone())));
            plain_from = m.end;
        }
        if plain_from < len {
            ranges.push((plain_from, len, None));
        }
        ranges
    }
}

#[cfg(test)]
mod tests {
    use super::{reflag, segment, Segmenter};
    use crate::content::{Block, BlockKey, EntityKey, InlineStyle, StyleSet};
    use crate::decorator::{
        ComponentDescriptor, DecoratorKey, DecoratorLookup, DecoratorMatch,
        DecoratorMatches, DecoratorProps,
    };
    use crate::selection::SelectionModel;

    fn key(k: &str) -> BlockKey {
        BlockKey::new(k)
    }

    fn matches(ranges: &[(usize, usize, &str)]) -> DecoratorMatches {
        DecoratorMatches::from_matches(ranges.iter().map(|&(start, end, k)| {
            DecoratorMatch {
                start,
                end,
                key: DecoratorKey::new(k),
            }
        }))
    }

    fn leaf_ranges(sets: &[super::LeafSetDescriptor]) -> Vec<Vec<(usize, usize)>> {
        sets.iter()
            .map(|s| s.leaves.iter().map(|l| (l.start, l.end)).collect())
            .collect()
    }

    fn away() -> SelectionModel {
        SelectionModel::collapsed(key("elsewhere"), 0)
    }

    #[test]
    fn unstyled_block_is_one_leaf() {
        let block = Block::unstyled("a", "hello");
        let sets = segment(&block, &DecoratorMatches::new(), &away());
        assert_eq!(leaf_ranges(&sets), vec![vec![(0, 5)]]);
        assert_eq!(sets[0].decorator_key, None);
        assert!(sets[0].leaves[0].flags.is_last);
    }

    #[test]
    fn style_and_entity_boundaries_split_leaves() {
        let block = Block::unstyled("a", "abcdefgh")
            .with_style(2..5, InlineStyle::Bold)
            .with_entity(4..6, EntityKey::new(0));
        let sets = segment(&block, &DecoratorMatches::new(), &away());
        assert_eq!(
            leaf_ranges(&sets),
            vec![vec![(0, 2), (2, 4), (4, 5), (5, 6), (6, 8)]]
        );
        let leaves = &sets[0].leaves;
        assert_eq!(leaves[1].styles, StyleSet::from([InlineStyle::Bold]));
        assert_eq!(leaves[2].entity, Some(EntityKey::new(0)));
        assert!(leaves[3].styles.is_empty());
    }

    #[test]
    fn decorator_matches_group_leaves() {
        let block =
            Block::unstyled("a", "say #hello now").with_style(6..8, InlineStyle::Italic);
        let sets = segment(&block, &matches(&[(4, 10, "0.0")]), &away());
        assert_eq!(
            leaf_ranges(&sets),
            vec![vec![(0, 4)], vec![(4, 6), (6, 8), (8, 10)], vec![(10, 14)]]
        );
        assert_eq!(sets[1].decorator_key, Some(DecoratorKey::new("0.0")));
        assert_eq!((sets[1].start, sets[1].end), (4, 10));
        assert_eq!(sets[2].decorator_key, None);
    }

    #[test]
    fn style_run_crossing_a_match_edge_is_cut() {
        let block = Block::unstyled("a", "abcdef").with_style(1..5, InlineStyle::Bold);
        let sets = segment(&block, &matches(&[(3, 6, "0.0")]), &away());
        assert_eq!(
            leaf_ranges(&sets),
            vec![vec![(0, 1), (1, 3)], vec![(3, 5), (5, 6)]]
        );
    }

    #[test]
    fn empty_block_has_one_zero_length_leaf() {
        let block = Block::unstyled("a", "");
        let sel = SelectionModel::collapsed(key("a"), 0).with_focus(true);
        let sets = segment(&block, &DecoratorMatches::new(), &sel);
        assert_eq!(leaf_ranges(&sets), vec![vec![(0, 0)]]);
        let flags = sets[0].leaves[0].flags;
        assert!(flags.is_empty);
        assert!(flags.is_editing);
        assert!(flags.has_selection_edge);
    }

    #[test]
    fn is_editing_needs_focus_collapse_and_key() {
        let block = Block::unstyled("a", "abc");
        let editing = |sel: SelectionModel| {
            segment(&block, &DecoratorMatches::new(), &sel)[0].leaves[0]
                .flags
                .is_editing
        };
        assert!(editing(SelectionModel::collapsed(key("a"), 1).with_focus(true)));
        assert!(!editing(SelectionModel::collapsed(key("a"), 1)));
        assert!(!editing(SelectionModel::within_block(key("a"), 0, 2).with_focus(true)));
        assert!(!editing(SelectionModel::collapsed(key("b"), 0).with_focus(true)));
    }

    #[test]
    fn selection_edges_mark_leaves() {
        let block = Block::unstyled("a", "abcdef").with_style(3..6, InlineStyle::Code);
        let sel = SelectionModel::within_block(key("a"), 1, 2);
        let sets = segment(&block, &DecoratorMatches::new(), &sel);
        let edges: Vec<bool> = sets[0]
            .leaves
            .iter()
            .map(|l| l.flags.has_selection_edge)
            .collect();
        assert_eq!(edges, vec![true, false]);
    }

    struct OnlyFirst;

    impl DecoratorLookup for OnlyFirst {
        fn component_for_key(&self, key: &DecoratorKey) -> Option<ComponentDescriptor> {
            (key.as_str() == "0.0").then(|| ComponentDescriptor::new("Tag"))
        }

        fn props_for_key(&self, _key: &DecoratorKey) -> DecoratorProps {
            DecoratorProps::new()
        }
    }

    #[test]
    fn unresolved_decorators_fall_back_to_plain_leaves() {
        let block = Block::unstyled("a", "#a #b");
        let decorations = matches(&[(0, 2, "0.0"), (3, 5, "0.1")]);
        let lookup = OnlyFirst;
        let sets = Segmenter::with_lookup(&lookup).segment(&block, &decorations, &away());
        assert_eq!(leaf_ranges(&sets), vec![vec![(0, 2)], vec![(2, 5)]]);
        assert_eq!(sets[0].decorator_key, Some(DecoratorKey::new("0.0")));
        assert_eq!(sets[1].decorator_key, None);
    }

    #[test]
    #[should_panic(expected = "decorations reach offset")]
    fn decorations_past_the_end_panic() {
        let block = Block::unstyled("a", "ab");
        segment(&block, &matches(&[(1, 4, "0.0")]), &away());
    }

    #[test]
    fn reflag_keeps_boundaries_and_follows_the_selection() {
        let block = Block::unstyled("a", "abcdef").with_style(3..6, InlineStyle::Code);
        let sets = segment(&block, &DecoratorMatches::new(), &away());
        let sel = SelectionModel::within_block(key("a"), 4, 5);
        let refreshed = reflag(&block, &sets, &sel);
        assert_eq!(leaf_ranges(&refreshed), leaf_ranges(&sets));
        assert_eq!(refreshed, segment(&block, &DecoratorMatches::new(), &sel));
        let edges: Vec<bool> = refreshed[0]
            .leaves
            .iter()
            .map(|l| l.flags.has_selection_edge)
            .collect();
        assert_eq!(edges, vec![false, true]);
    }
}
