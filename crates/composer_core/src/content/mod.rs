// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! The immutable document model: blocks, inline styles, entities.

mod block;
mod content_model;
mod entity;
mod style;

pub(crate) use block::{byte_offset, char_offset};
pub use block::{Block, BlockKey, BlockType};
pub use content_model::ContentModel;
pub use entity::{Entity, EntityKey, EntityMap, Mutability};
pub use style::{InlineStyle, StyleSet};
