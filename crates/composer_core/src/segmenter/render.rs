// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Incremental rendering: deciding which blocks need re-segmenting.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::{reflag, LeafSetDescriptor, Segmenter};
use crate::content::{Block, BlockKey};
use crate::decorator::{Decorator, DecoratorLookup, DecoratorMatches};
use crate::editor_state::EditorState;
use crate::selection::SelectionModel;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextDirection {
    #[default]
    Ltr,
    Rtl,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextAlignment {
    #[default]
    Start,
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderOptions {
    pub direction: TextDirection,
    pub alignment: TextAlignment,
    pub read_only: bool,
}

/// Everything a block's rendering depends on.
#[derive(Clone, Debug)]
pub struct BlockRenderProps {
    pub block: Arc<Block>,
    pub decorations: Arc<DecoratorMatches>,
    pub direction: TextDirection,
    pub alignment: TextAlignment,
    pub read_only: bool,
    pub selection: SelectionModel,
    pub force_selection: bool,
}

impl BlockRenderProps {
    fn is_editing(&self) -> bool {
        self.selection.has_focus()
            && self.selection.is_collapsed()
            && self.selection.start_key() == self.block.key()
    }
}

/// Whether a block rendered with `prev` must be rendered again for `next`.
///
/// Block and decorations compare by identity.  A forced selection re-renders
/// the blocks holding an edge of the selection, before or after the move, so
/// the host caret can be put back in place.
pub fn should_update(prev: &BlockRenderProps, next: &BlockRenderProps) -> bool {
    if !Arc::ptr_eq(&prev.block, &next.block)
        || !Arc::ptr_eq(&prev.decorations, &next.decorations)
        || prev.direction != next.direction
        || prev.alignment != next.alignment
        || prev.read_only != next.read_only
        || prev.is_editing() != next.is_editing()
    {
        return true;
    }
    let key = next.block.key();
    next.force_selection
        && (next.selection.is_on_edge(key) || prev.selection.is_on_edge(key))
}

/// One block of a render pass.
#[derive(Clone, Debug)]
pub struct RenderedBlock {
    pub key: BlockKey,
    pub leaf_sets: Arc<Vec<LeafSetDescriptor>>,
    /// Whether the block was segmented again in this pass.  Leaf flags are
    /// brought up to date with the selection on every pass.
    pub updated: bool,
}

#[derive(Clone, Debug, Default)]
pub struct RenderPass {
    pub blocks: Vec<RenderedBlock>,
    /// The block the host should scroll to after applying a forced
    /// selection.
    pub scroll_into_view: Option<BlockKey>,
}

impl RenderPass {
    pub fn updated_keys(&self) -> impl Iterator<Item = &BlockKey> {
        self.blocks.iter().filter(|b| b.updated).map(|b| &b.key)
    }
}

struct CachedBlock {
    props: BlockRenderProps,
    leaf_sets: Arc<Vec<LeafSetDescriptor>>,
}

/// Turns editor states into leaf sets, re-segmenting only the blocks whose
/// [`should_update`] says so.
///
/// Decorations are cached by block identity: a block that did not change is
/// not decorated again.
pub struct ContentsRenderer {
    decorator: Option<Arc<dyn Decorator>>,
    options: RenderOptions,
    cache: HashMap<BlockKey, CachedBlock>,
}

impl ContentsRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            decorator: None,
            options,
            cache: HashMap::new(),
        }
    }

    pub fn with_decorator(mut self, decorator: Arc<dyn Decorator>) -> Self {
        self.decorator = Some(decorator);
        self
    }

    pub fn options(&self) -> RenderOptions {
        self.options
    }

    pub fn set_options(&mut self, options: RenderOptions) {
        self.options = options;
    }

    pub fn render(
        &mut self,
        state: &EditorState,
        lookup: Option<&dyn DecoratorLookup>,
    ) -> RenderPass {
        let content = state.current_content();
        let selection = state.selection();
        let segmenter = lookup.map_or_else(Segmenter::new, Segmenter::with_lookup);

        let mut cache = HashMap::with_capacity(content.block_count());
        let mut blocks = Vec::with_capacity(content.block_count());
        for block in content.blocks() {
            let previous = self.cache.remove(block.key());
            let decorations = match &previous {
                Some(p) if Arc::ptr_eq(&p.props.block, block) => Arc::clone(&p.props.decorations),
                _ => Arc::new(
                    self.decorator
                        .as_ref()
                        .map(|d| d.decorations(block, content))
                        .unwrap_or_default(),
                ),
            };
            let props = BlockRenderProps {
                block: Arc::clone(block),
                decorations,
                direction: self.options.direction,
                alignment: self.options.alignment,
                read_only: self.options.read_only,
                selection: selection.clone(),
                force_selection: state.must_force_selection(),
            };

            let (leaf_sets, updated) = match previous {
                Some(p) if !should_update(&p.props, &props) => {
                    let leaf_sets = if p.props.selection == props.selection {
                        p.leaf_sets
                    } else {
                        refresh_flags(block, p.leaf_sets, selection)
                    };
                    (leaf_sets, false)
                }
                _ => (
                    Arc::new(segmenter.segment(block, &props.decorations, selection)),
                    true,
                ),
            };
            blocks.push(RenderedBlock {
                key: block.key().clone(),
                leaf_sets: Arc::clone(&leaf_sets),
                updated,
            });
            cache.insert(block.key().clone(), CachedBlock { props, leaf_sets });
        }
        self.cache = cache;

        let scroll_into_view = (state.must_force_selection() && selection.has_focus())
            .then(|| selection.end_key().clone());
        let pass = RenderPass {
            blocks,
            scroll_into_view,
        };
        debug!(
            blocks = pass.blocks.len(),
            updated = pass.updated_keys().count(),
            "render pass"
        );
        pass
    }
}

/// Leaf sets carry selection flags; a cached block keeps its boundaries but
/// not the flags of an older selection.
fn refresh_flags(
    block: &Block,
    cached: Arc<Vec<LeafSetDescriptor>>,
    selection: &SelectionModel,
) -> Arc<Vec<LeafSetDescriptor>> {
    let fresh = reflag(block, &cached, selection);
    if *cached == fresh {
        cached
    } else {
        Arc::new(fresh)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{
        should_update, BlockRenderProps, ContentsRenderer, RenderOptions, RenderPass,
        TextDirection,
    };
    use crate::content::{Block, BlockKey, ContentModel, StyleSet};
    use crate::decorator::{ComponentDescriptor, CompositeDecorator, DecoratorMatches, Strategy};
    use crate::editor_state::EditorState;
    use crate::pipeline::{insert_text, EditType};
    use crate::selection::SelectionModel;

    fn key(k: &str) -> BlockKey {
        BlockKey::new(k)
    }

    fn props(block: &Arc<Block>, selection: SelectionModel, force: bool) -> BlockRenderProps {
        BlockRenderProps {
            block: Arc::clone(block),
            decorations: Arc::new(DecoratorMatches::new()),
            direction: TextDirection::Ltr,
            alignment: Default::default(),
            read_only: false,
            selection,
            force_selection: force,
        }
    }

    fn with_decorations_of(next: BlockRenderProps, prev: &BlockRenderProps) -> BlockRenderProps {
        BlockRenderProps {
            decorations: Arc::clone(&prev.decorations),
            ..next
        }
    }

    #[test]
    fn identical_inputs_do_not_update() {
        let block = Arc::new(Block::unstyled("a", "abc"));
        let prev = props(&block, SelectionModel::collapsed(key("b"), 0), false);
        let next = with_decorations_of(
            props(&block, SelectionModel::collapsed(key("b"), 1), false),
            &prev,
        );
        assert!(!should_update(&prev, &next));
    }

    #[test]
    fn new_block_identity_updates() {
        let block = Arc::new(Block::unstyled("a", "abc"));
        let copy = Arc::new(Block::unstyled("a", "abc"));
        let prev = props(&block, SelectionModel::collapsed(key("b"), 0), false);
        let next = with_decorations_of(
            props(&copy, SelectionModel::collapsed(key("b"), 0), false),
            &prev,
        );
        assert!(should_update(&prev, &next));
    }

    #[test]
    fn forced_selection_moving_onto_or_off_block_updates() {
        let block = Arc::new(Block::unstyled("a", "abc"));
        let off = props(&block, SelectionModel::collapsed(key("b"), 0), true);
        let on = with_decorations_of(
            props(&block, SelectionModel::collapsed(key("a"), 1), true),
            &off,
        );
        assert!(should_update(&off, &on));
        let off_again = with_decorations_of(
            props(&block, SelectionModel::collapsed(key("b"), 0), true),
            &off,
        );
        assert!(should_update(&on, &off_again));
        let unforced = BlockRenderProps {
            force_selection: false,
            ..on.clone()
        };
        assert!(!should_update(&off, &unforced));
    }

    #[test]
    fn editing_flip_updates() {
        let block = Arc::new(Block::unstyled("a", "abc"));
        let prev = props(&block, SelectionModel::collapsed(key("a"), 1), false);
        let next = with_decorations_of(
            props(&block, SelectionModel::collapsed(key("a"), 1).with_focus(true), false),
            &prev,
        );
        assert!(should_update(&prev, &next));
    }

    #[test]
    fn renderer_resegments_only_changed_blocks() {
        let content = ContentModel::from_blocks([
            Block::unstyled("a", "one #tag"),
            Block::unstyled("b", "two"),
        ])
        .unwrap();
        let decorator = CompositeDecorator::new()
            .with(Strategy::Hashtag, ComponentDescriptor::new("Hashtag"));
        let mut renderer =
            ContentsRenderer::new(RenderOptions::default()).with_decorator(Arc::new(decorator));

        let state = EditorState::create(content)
            .accept_selection(SelectionModel::collapsed(key("b"), 3));
        let first = renderer.render(&state, None);
        assert_eq!(first.updated_keys().count(), 2);
        assert_eq!(first.blocks[0].leaf_sets.len(), 2);

        let typed = insert_text(
            state.current_content(),
            &SelectionModel::collapsed(key("b"), 3),
            "!",
            &StyleSet::new(),
            None,
        );
        let state = state.push(typed, EditType::InsertCharacters);
        let second = renderer.render(&state, None);
        let updated: Vec<_> = second.updated_keys().cloned().collect();
        assert_eq!(updated, vec![key("b")]);
        assert!(Arc::ptr_eq(&first.blocks[0].leaf_sets, &second.blocks[0].leaf_sets));
    }

    #[test]
    fn forced_focused_selection_requests_scroll() {
        let content = ContentModel::from_blocks([
            Block::unstyled("a", "one"),
            Block::unstyled("b", "two"),
        ])
        .unwrap();
        let mut renderer = ContentsRenderer::new(RenderOptions::default());
        let state = EditorState::create(content)
            .force_selection(SelectionModel::within_block(key("b"), 0, 2));
        let pass = renderer.render(&state, None);
        assert_eq!(pass.scroll_into_view, Some(key("b")));

        let state = state.accept_selection(SelectionModel::collapsed(key("a"), 0));
        assert_eq!(renderer.render(&state, None).scroll_into_view, None);
    }

    #[test]
    fn changing_options_updates_every_block() {
        let content = ContentModel::from_text("x\ny");
        let state = EditorState::create(content);
        let mut renderer = ContentsRenderer::new(RenderOptions::default());
        renderer.render(&state, None);
        renderer.set_options(RenderOptions {
            read_only: true,
            ..renderer.options()
        });
        assert_eq!(renderer.render(&state, None).updated_keys().count(), 2);
        assert_eq!(renderer.render(&state, None).updated_keys().count(), 0);
    }

    #[test]
    fn moving_the_selection_refreshes_leaf_flags() {
        let content = ContentModel::from_blocks([
            Block::unstyled("a", "one"),
            Block::unstyled("b", "two"),
        ])
        .unwrap();
        let mut renderer = ContentsRenderer::new(RenderOptions::default());
        let edge = |pass: &RenderPass, i: usize| {
            pass.blocks[i].leaf_sets[0].leaves[0].flags.has_selection_edge
        };

        let state = EditorState::create(content)
            .accept_selection(SelectionModel::within_block(key("a"), 0, 1));
        let first = renderer.render(&state, None);
        assert!(edge(&first, 0));
        assert!(!edge(&first, 1));

        let state = state.accept_selection(SelectionModel::within_block(key("b"), 0, 1));
        let second = renderer.render(&state, None);
        assert_eq!(second.updated_keys().count(), 0);
        assert!(!edge(&second, 0));
        assert!(edge(&second, 1));

        let third = renderer.render(&state, None);
        assert!(Arc::ptr_eq(&second.blocks[1].leaf_sets, &third.blocks[1].leaf_sets));
    }
}
