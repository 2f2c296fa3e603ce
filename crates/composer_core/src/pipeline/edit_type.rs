// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// What kind of edit produced a content, for undo bookkeeping.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
)]
#[strum(serialize_all = "kebab-case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum EditType {
    ApplyEntity,
    BackspaceCharacter,
    ChangeBlockType,
    ChangeInlineStyle,
    DeleteCharacter,
    InsertCharacters,
    InsertFragment,
    Redo,
    RemoveRange,
    Undo,
}

impl EditType {
    /// Whether consecutive edits of this type may share one undo step.
    pub fn coalesces(self) -> bool {
        matches!(
            self,
            Self::InsertCharacters
                | Self::BackspaceCharacter
                | Self::DeleteCharacter
        )
    }
}
