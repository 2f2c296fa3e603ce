// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use thiserror::Error;

use crate::content::{BlockKey, EntityKey};
use crate::run_list::RunDefect;

/// Content handed to the core from outside (a deserialised document, a
/// fragment from another editor) that breaks a model invariant.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ContentError {
    #[error("content must contain at least one block")]
    Empty,
    #[error("duplicate block key {0}")]
    DuplicateKey(BlockKey),
    #[error("style runs of block {key} are malformed: {defect:?}")]
    MalformedStyles { key: BlockKey, defect: RunDefect },
    #[error("block {key} has a style run with no styles at offset {start}")]
    EmptyStyleRun { key: BlockKey, start: usize },
    #[error("entity runs of block {key} are malformed: {defect:?}")]
    MalformedEntities { key: BlockKey, defect: RunDefect },
    #[error("block {key} references unknown entity {entity}")]
    DanglingEntity { key: BlockKey, entity: EntityKey },
    #[error("selection references unknown block {0}")]
    DanglingSelection(BlockKey),
    #[error(
        "selection from {anchor_key}:{anchor_offset} to {focus_key}:{focus_offset} \
         has is_backward = {is_backward}, which contradicts block order"
    )]
    SelectionDirection {
        anchor_key: BlockKey,
        anchor_offset: usize,
        focus_key: BlockKey,
        focus_offset: usize,
        is_backward: bool,
    },
    #[error("selection offset {offset} is past the end of block {key} (length {len})")]
    SelectionOutOfBounds {
        key: BlockKey,
        offset: usize,
        len: usize,
    },
}

/// Failure reported by a host collaborator.  The core logs and absorbs these.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum HostError {
    #[error("clipboard is unavailable: {0}")]
    ClipboardUnavailable(String),
    #[error("editor surface is detached")]
    SurfaceDetached,
    #[error("{0}")]
    Other(String),
}
