// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! The mutation pipeline: pure functions from a content (plus a selection)
//! to a new content.
//!
//! Every step leaves its input untouched, shares the blocks it did not
//! change, and stamps the result with the selection before and after the
//! edit.  Feeding the result to [`EditorState::push`](crate::EditorState::push)
//! with the matching [`EditType`] is what makes it undoable.

mod edit_type;
mod entity_edges;
mod formatting;
mod fragment;
mod remove_range;
mod text_ops;

pub use edit_type::EditType;
pub use formatting::{apply_entity, apply_inline_style, remove_inline_style, set_block_type};
pub use fragment::{extract_fragment, insert_fragment, ClipboardFragment};
pub use remove_range::remove_range;
pub use text_ops::{
    current_inline_style, entity_for_typing, insert_text, remove_adjacent,
    replace_text,
};

use crate::content::ContentModel;
use crate::selection::SelectionModel;

/// Which way a removal runs: forward for delete and cut, backward for
/// backspace.  Decides which neighbouring space a segmented entity gives up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RemovalDirection {
    Forward,
    Backward,
}

/// A selection that does not resolve against the content it is applied to is
/// a caller bug.
pub(crate) fn assert_selection(content: &ContentModel, selection: &SelectionModel) {
    if let Err(e) = content.check_selection(selection) {
        panic!("invalid selection: {e}");
    }
}

/// The splicing steps walk blocks from the start key to the end key; a range
/// running against block order would carry them past the end.
pub(crate) fn assert_forward(content: &ContentModel, range: &SelectionModel) {
    let start = content.index_of(range.start_key());
    let end = content.index_of(range.end_key());
    let in_order = match (start, end) {
        (Some(s), Some(e)) => s < e || (s == e && range.start_offset() <= range.end_offset()),
        _ => false,
    };
    assert!(
        in_order,
        "range {}:{} to {}:{} runs against block order",
        range.start_key(),
        range.start_offset(),
        range.end_key(),
        range.end_offset()
    );
}
