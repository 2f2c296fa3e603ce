// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Selection management.
//!
//! A [`SelectionModel`] records the gesture (anchor then focus) together with
//! whether that gesture runs against document order.  "Start" and "end" are
//! always in document order.

use crate::content::BlockKey;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SelectionModel {
    anchor_key: BlockKey,
    anchor_offset: usize,
    focus_key: BlockKey,
    focus_offset: usize,
    is_backward: bool,
    has_focus: bool,
}

impl SelectionModel {
    /// A caret at `offset` in block `key`, without focus.
    pub fn collapsed(key: BlockKey, offset: usize) -> Self {
        Self {
            anchor_key: key.clone(),
            anchor_offset: offset,
            focus_key: key,
            focus_offset: offset,
            is_backward: false,
            has_focus: false,
        }
    }

    /// A selection inside one block.  Direction follows the offsets.
    pub fn within_block(key: BlockKey, anchor: usize, focus: usize) -> Self {
        Self {
            anchor_key: key.clone(),
            anchor_offset: anchor,
            focus_key: key,
            focus_offset: focus,
            is_backward: focus < anchor,
            has_focus: false,
        }
    }

    /// A selection between two blocks.  `is_backward` must say whether the
    /// focus precedes the anchor in document order; use
    /// [`ContentModel::select`](crate::ContentModel::select) to have it
    /// derived from the content.
    pub fn new(
        anchor_key: BlockKey,
        anchor_offset: usize,
        focus_key: BlockKey,
        focus_offset: usize,
        is_backward: bool,
    ) -> Self {
        Self {
            anchor_key,
            anchor_offset,
            focus_key,
            focus_offset,
            is_backward,
            has_focus: false,
        }
    }

    pub fn with_focus(&self, has_focus: bool) -> Self {
        Self {
            has_focus,
            ..self.clone()
        }
    }

    pub fn anchor_key(&self) -> &BlockKey {
        &self.anchor_key
    }

    pub fn anchor_offset(&self) -> usize {
        self.anchor_offset
    }

    pub fn focus_key(&self) -> &BlockKey {
        &self.focus_key
    }

    pub fn focus_offset(&self) -> usize {
        self.focus_offset
    }

    pub fn is_backward(&self) -> bool {
        self.is_backward
    }

    pub fn has_focus(&self) -> bool {
        self.has_focus
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor_key == self.focus_key
            && self.anchor_offset == self.focus_offset
    }

    pub fn start_key(&self) -> &BlockKey {
        if self.is_backward {
            &self.focus_key
        } else {
            &self.anchor_key
        }
    }

    pub fn start_offset(&self) -> usize {
        if self.is_backward {
            self.focus_offset
        } else {
            self.anchor_offset
        }
    }

    pub fn end_key(&self) -> &BlockKey {
        if self.is_backward {
            &self.anchor_key
        } else {
            &self.focus_key
        }
    }

    pub fn end_offset(&self) -> usize {
        if self.is_backward {
            self.anchor_offset
        } else {
            self.focus_offset
        }
    }

    /// Whether the anchor or the focus sits in block `key`.
    pub fn is_on_edge(&self, key: &BlockKey) -> bool {
        &self.anchor_key == key || &self.focus_key == key
    }

    /// Whether an edge of the selection falls inside `[start, end]` of block
    /// `key` (both ends inclusive).
    pub fn has_edge_within(&self, key: &BlockKey, start: usize, end: usize) -> bool {
        if &self.anchor_key == key && &self.focus_key == key {
            let s = self.start_offset();
            let e = self.end_offset();
            return (start <= s && s <= end) || (start <= e && e <= end);
        }
        if !self.is_on_edge(key) {
            return false;
        }
        let offset = if &self.anchor_key == key {
            self.anchor_offset
        } else {
            self.focus_offset
        };
        start <= offset && offset <= end
    }

    /// The same range expressed anchor-first in document order.
    pub fn forward(&self) -> Self {
        Self {
            anchor_key: self.start_key().clone(),
            anchor_offset: self.start_offset(),
            focus_key: self.end_key().clone(),
            focus_offset: self.end_offset(),
            is_backward: false,
            has_focus: self.has_focus,
        }
    }

    /// A caret at the start of this selection, keeping focus.
    pub fn collapse_to_start(&self) -> Self {
        Self::collapsed(self.start_key().clone(), self.start_offset())
            .with_focus(self.has_focus)
    }

    /// A caret at `offset` in `key`, keeping focus.
    pub fn caret_at(&self, key: BlockKey, offset: usize) -> Self {
        Self::collapsed(key, offset).with_focus(self.has_focus)
    }
}
