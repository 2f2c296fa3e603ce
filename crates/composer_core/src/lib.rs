// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! The editing core of a rich text composer.
//!
//! * [`ContentModel`] and [`SelectionModel`] are immutable values.
//! * The [`pipeline`] functions turn one content into the next.
//! * [`EditorState`] stacks contents up for undo and redo.
//! * The [`segmenter`] splits blocks into leaves for rendering.
//! * [`NativeEventCoordinator`] routes host events into all of the above,
//!   including the native cut that briefly runs outside the model.

mod content;
mod coordinator;
pub mod decorator;
mod editor_state;
mod error;
mod invariants;
pub mod pipeline;
mod run_list;
pub mod segmenter;
mod selection;

pub use crate::content::{
    Block, BlockKey, BlockType, ContentModel, Entity, EntityKey, EntityMap,
    InlineStyle, Mutability, StyleSet,
};
pub use crate::coordinator::{
    CoordinatorConfig, CoordinatorPhase, DeferredTask, EditorEvent,
    EditorHost, EventDisposition, NativeEventCoordinator, NodeRef,
    ScrollOffset, TurnQueue,
};
pub use crate::decorator::{
    ComponentDescriptor, CompositeDecorator, Decorator, DecoratorKey,
    DecoratorLookup, DecoratorMatch, DecoratorMatches, DecoratorProps,
    Strategy,
};
pub use crate::editor_state::{
    EditorConfig, EditorMode, EditorState, UndoEntry, UndoStack,
};
pub use crate::error::{ContentError, HostError};
pub use crate::pipeline::{
    ClipboardFragment, EditType, RemovalDirection,
};
pub use crate::run_list::{Run, RunDefect, RunList};
pub use crate::segmenter::{
    segment, should_update, BlockRenderProps, ContentsRenderer, Leaf,
    LeafFlags, LeafSetDescriptor, RenderOptions, RenderPass, RenderedBlock,
    Segmenter, TextAlignment, TextDirection,
};
pub use crate::selection::SelectionModel;
