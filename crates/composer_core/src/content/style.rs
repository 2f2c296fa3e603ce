// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use std::collections::BTreeSet;
use std::fmt;

use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// An inline style that can be applied to a character range.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum InlineStyle {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Code,
}

/// The set of inline styles carried by one run of characters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct StyleSet(BTreeSet<InlineStyle>);

impl StyleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, style: InlineStyle) -> bool {
        self.0.contains(&style)
    }

    pub fn iter(&self) -> impl Iterator<Item = InlineStyle> + '_ {
        self.0.iter().copied()
    }

    pub fn with(&self, style: InlineStyle) -> Self {
        let mut set = self.0.clone();
        set.insert(style);
        Self(set)
    }

    pub fn without(&self, style: InlineStyle) -> Self {
        let mut set = self.0.clone();
        set.remove(&style);
        Self(set)
    }
}

impl FromIterator<InlineStyle> for StyleSet {
    fn from_iter<I: IntoIterator<Item = InlineStyle>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[InlineStyle; N]> for StyleSet {
    fn from(styles: [InlineStyle; N]) -> Self {
        styles.into_iter().collect()
    }
}

impl fmt::Display for StyleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(|s| s.as_ref()).collect();
        write!(f, "[{}]", names.join(","))
    }
}
