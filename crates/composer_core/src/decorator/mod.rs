// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Decorators: recognised substrings (links, hashtags, mentions) that render
//! as one unit.
//!
//! A [`Decorator`] scans a block and reports non-overlapping
//! [`DecoratorMatch`]es.  The segmenter groups leaves by match; a
//! [`DecoratorLookup`] tells the presentation layer what to render for each
//! match key.

mod composite;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub use composite::{CompositeDecorator, Strategy};

use crate::content::{Block, ContentModel};

/// Identifies one decorator occurrence within a block.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DecoratorKey(Arc<str>);

impl DecoratorKey {
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(Arc::from(key.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DecoratorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A decorated range `[start, end)` of a block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecoratorMatch {
    pub start: usize,
    pub end: usize,
    pub key: DecoratorKey,
}

/// The decorator matches of one block, sorted and non-overlapping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecoratorMatches {
    matches: Vec<DecoratorMatch>,
}

impl DecoratorMatches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Panics if a match is empty or two matches overlap.
    pub fn from_matches(matches: impl IntoIterator<Item = DecoratorMatch>) -> Self {
        let mut matches: Vec<DecoratorMatch> = matches.into_iter().collect();
        matches.sort_by_key(|m| m.start);
        for m in &matches {
            assert!(m.start < m.end, "empty decorator match {}", m.key);
        }
        for pair in matches.windows(2) {
            assert!(
                pair[0].end <= pair[1].start,
                "decorator matches {} and {} overlap",
                pair[0].key,
                pair[1].key
            );
        }
        Self { matches }
    }

    /// Collapse a per-character slot vector into matches.
    pub(crate) fn from_slots(slots: &[Option<DecoratorKey>]) -> Self {
        let mut matches: Vec<DecoratorMatch> = Vec::new();
        for (i, slot) in slots.iter().enumerate() {
            let Some(key) = slot else { continue };
            match matches.last_mut() {
                Some(last) if last.end == i && &last.key == key => last.end = i + 1,
                _ => matches.push(DecoratorMatch {
                    start: i,
                    end: i + 1,
                    key: key.clone(),
                }),
            }
        }
        Self { matches }
    }

    pub fn iter(&self) -> impl Iterator<Item = &DecoratorMatch> {
        self.matches.iter()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// The match covering `offset`, if any.
    pub fn match_at(&self, offset: usize) -> Option<&DecoratorMatch> {
        let idx = self.matches.partition_point(|m| m.end <= offset);
        self.matches.get(idx).filter(|m| m.start <= offset)
    }

    /// The end of the last match, or 0.
    pub fn extent(&self) -> usize {
        self.matches.last().map_or(0, |m| m.end)
    }
}

/// Something that recognises decorated ranges in a block.
pub trait Decorator: Send + Sync {
    fn decorations(&self, block: &Block, content: &ContentModel) -> DecoratorMatches;
}

/// What the presentation layer renders for a decorator match.  Opaque to
/// the core.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ComponentDescriptor(Arc<str>);

impl ComponentDescriptor {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

pub type DecoratorProps = BTreeMap<String, String>;

/// Resolves decorator match keys to renderable units.
pub trait DecoratorLookup {
    fn component_for_key(&self, key: &DecoratorKey) -> Option<ComponentDescriptor>;

    fn props_for_key(&self, key: &DecoratorKey) -> DecoratorProps;
}
