// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use strum_macros::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use super::entity::EntityKey;
use super::style::{InlineStyle, StyleSet};
use crate::run_list::{Run, RunList};

/// Opaque, cheap-to-clone identifier of a block.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct BlockKey(Arc<str>);

impl BlockKey {
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(Arc::from(key.as_ref()))
    }

    /// A fresh random key: a full v4 UUID in simple form.
    pub fn generate() -> Self {
        Self(Arc::from(Uuid::new_v4().simple().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BlockKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl fmt::Display for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The semantic kind of a block.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    AsRefStr,
    Display,
    EnumString,
)]
#[strum(serialize_all = "kebab-case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum BlockType {
    #[default]
    Unstyled,
    Paragraph,
    HeaderOne,
    HeaderTwo,
    HeaderThree,
    HeaderFour,
    HeaderFive,
    HeaderSix,
    UnorderedListItem,
    OrderedListItem,
    Blockquote,
    CodeBlock,
    /// A block rendered as one opaque unit (media, embeds).
    Atomic,
}

/// One paragraph-equivalent unit of content.
///
/// Offsets are counted in `char`s.  Style runs never carry an empty style set
/// and, like entity runs, never reach past the end of the text.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "BlockFields"))]
pub struct Block {
    key: BlockKey,
    block_type: BlockType,
    text: String,
    /// `text` length in `char`s.
    #[cfg_attr(feature = "serde", serde(skip))]
    len: usize,
    styles: RunList<StyleSet>,
    entities: RunList<EntityKey>,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct BlockFields {
    key: BlockKey,
    block_type: BlockType,
    text: String,
    styles: RunList<StyleSet>,
    entities: RunList<EntityKey>,
}

#[cfg(feature = "serde")]
impl From<BlockFields> for Block {
    fn from(fields: BlockFields) -> Self {
        Self {
            len: fields.text.chars().count(),
            key: fields.key,
            block_type: fields.block_type,
            text: fields.text,
            styles: fields.styles,
            entities: fields.entities,
        }
    }
}

impl Block {
    pub fn new(
        key: impl Into<BlockKey>,
        block_type: BlockType,
        text: impl Into<String>,
    ) -> Self {
        let text: String = text.into();
        Self {
            key: key.into(),
            block_type,
            len: text.chars().count(),
            text,
            styles: RunList::new(),
            entities: RunList::new(),
        }
    }

    pub fn unstyled(key: impl Into<BlockKey>, text: impl Into<String>) -> Self {
        Self::new(key, BlockType::Unstyled, text)
    }

    /// Add `style` to every character in `range`.
    pub fn with_style(self, range: Range<usize>, style: InlineStyle) -> Self {
        self.assert_range(&range);
        let styles = self.styles.map_range(range, |current| {
            Some(current.cloned().unwrap_or_default().with(style))
        });
        Self { styles, ..self }
    }

    /// Attach `entity` to every character in `range`.
    pub fn with_entity(self, range: Range<usize>, entity: EntityKey) -> Self {
        self.assert_range(&range);
        let entities = self.entities.set(range, Some(entity));
        Self { entities, ..self }
    }

    pub fn with_key(&self, key: BlockKey) -> Self {
        Self {
            key,
            ..self.clone()
        }
    }

    pub fn with_type(&self, block_type: BlockType) -> Self {
        Self {
            block_type,
            ..self.clone()
        }
    }

    pub(crate) fn with_style_runs(&self, styles: RunList<StyleSet>) -> Self {
        Self {
            styles,
            ..self.clone()
        }
    }

    pub(crate) fn with_entity_runs(&self, entities: RunList<EntityKey>) -> Self {
        Self {
            entities,
            ..self.clone()
        }
    }

    pub fn key(&self) -> &BlockKey {
        &self.key
    }

    pub fn block_type(&self) -> BlockType {
        self.block_type
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length of the text in `char`s.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn style_runs(&self) -> &RunList<StyleSet> {
        &self.styles
    }

    pub fn entity_runs(&self) -> &RunList<EntityKey> {
        &self.entities
    }

    /// The styles of the character at `offset` (empty when unstyled).
    pub fn styles_at(&self, offset: usize) -> StyleSet {
        self.styles.value_at(offset).cloned().unwrap_or_default()
    }

    pub fn entity_at(&self, offset: usize) -> Option<EntityKey> {
        self.entities.value_at(offset).copied()
    }

    /// The full range of the entity run covering `offset`.
    pub fn entity_range_at(&self, offset: usize) -> Option<Range<usize>> {
        self.entities.run_at(offset).map(Run::range)
    }

    /// The text of `range`.
    pub fn text_slice(&self, range: Range<usize>) -> &str {
        self.assert_range(&range);
        let start = byte_offset(&self.text, range.start);
        let end = byte_offset(&self.text, range.end);
        &self.text[start..end]
    }

    /// The characters of `range` as a new block with the same key and type.
    pub(crate) fn slice(&self, range: Range<usize>) -> Self {
        Self {
            key: self.key.clone(),
            block_type: self.block_type,
            text: self.text_slice(range.clone()).to_owned(),
            len: range.len(),
            styles: self.styles.slice(range.clone()),
            entities: self.entities.slice(range),
        }
    }

    /// Replace the characters of `range` with the content of `inserted`,
    /// keeping this block's key and type.
    pub(crate) fn splice(&self, range: Range<usize>, inserted: &Block) -> Self {
        self.assert_range(&range);
        let start = byte_offset(&self.text, range.start);
        let end = byte_offset(&self.text, range.end);
        let mut text = String::with_capacity(
            self.text.len() - (end - start) + inserted.text.len(),
        );
        text.push_str(&self.text[..start]);
        text.push_str(&inserted.text);
        text.push_str(&self.text[end..]);

        let inserted_len = inserted.len();
        Self {
            key: self.key.clone(),
            block_type: self.block_type,
            text,
            len: self.len - range.len() + inserted_len,
            styles: self.styles.remove(range.clone()).insert(
                range.start,
                &inserted.styles,
                inserted_len,
            ),
            entities: self.entities.remove(range.clone()).insert(
                range.start,
                &inserted.entities,
                inserted_len,
            ),
        }
    }

    /// This block followed by the content of `tail`.
    pub(crate) fn concat(&self, tail: &Block) -> Self {
        let len = self.len();
        Self {
            key: self.key.clone(),
            block_type: self.block_type,
            text: format!("{}{}", self.text, tail.text),
            len: len + tail.len,
            styles: self.styles.concat(len, &tail.styles),
            entities: self.entities.concat(len, &tail.entities),
        }
    }

    fn assert_range(&self, range: &Range<usize>) {
        let len = self.len();
        assert!(
            range.start <= range.end && range.end <= len,
            "range {range:?} out of bounds for block {} of length {len}",
            self.key
        );
    }
}

/// Byte index of the `char_offset`-th character (or the text length).
pub(crate) fn byte_offset(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map_or(text.len(), |(b, _)| b)
}

/// Char offset of byte index `byte`.
pub(crate) fn char_offset(text: &str, byte: usize) -> usize {
    text[..byte].chars().count()
}
