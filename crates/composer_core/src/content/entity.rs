// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Entities: metadata (links, mentions, media) attached to character ranges.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use strum_macros::{AsRefStr, Display, EnumString};

/// Identifier of an entity inside one [`EntityMap`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct EntityKey(u64);

impl EntityKey {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the text covered by an entity reacts to edits.
///
/// | Mutability  | Removal of part of the range                         |
/// |-------------|------------------------------------------------------|
/// | `Mutable`   | text is removed, the rest keeps the entity           |
/// | `Immutable` | the whole range goes (or loses the entity at edges)  |
/// | `Segmented` | whole space-separated segments go                    |
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, AsRefStr, Display, EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum Mutability {
    Mutable,
    Immutable,
    Segmented,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Entity {
    /// Free-form kind, e.g. `"LINK"` or `"MENTION"`.
    pub kind: String,
    pub mutability: Mutability,
    pub data: BTreeMap<String, String>,
}

impl Entity {
    pub fn new(kind: impl Into<String>, mutability: Mutability) -> Self {
        Self {
            kind: kind.into(),
            mutability,
            data: BTreeMap::new(),
        }
    }

    pub fn with_data(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

/// Entities referenced by the blocks of one content model.
///
/// Keys are handed out monotonically and entities are never dropped by text
/// removal, so an undo can always resolve the keys it restores.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityMap {
    entries: IndexMap<EntityKey, Arc<Entity>>,
    next_key: u64,
}

impl EntityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: EntityKey) -> Option<&Entity> {
        self.entries.get(&key).map(|e| e.as_ref())
    }

    pub fn contains(&self, key: EntityKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityKey, &Entity)> {
        self.entries.iter().map(|(k, e)| (*k, e.as_ref()))
    }

    /// Add `entity` under a fresh key.
    pub fn add(&self, entity: Entity) -> (Self, EntityKey) {
        let key = EntityKey(self.next_key);
        let mut entries = self.entries.clone();
        entries.insert(key, Arc::new(entity));
        (
            Self {
                entries,
                next_key: self.next_key + 1,
            },
            key,
        )
    }

    /// Add `entity` under an explicit key, keeping later allocations above it.
    pub fn insert(&self, key: EntityKey, entity: Entity) -> Self {
        let mut entries = self.entries.clone();
        entries.insert(key, Arc::new(entity));
        Self {
            entries,
            next_key: self.next_key.max(key.0 + 1),
        }
    }

    /// The entities named by `keys`, keeping their keys.
    pub fn subset(&self, keys: impl IntoIterator<Item = EntityKey>) -> Self {
        let mut entries = IndexMap::new();
        for key in keys {
            if let Some(e) = self.entries.get(&key) {
                entries.insert(key, Arc::clone(e));
            }
        }
        let next_key = entries.keys().map(|k| k.0 + 1).max().unwrap_or(0);
        Self { entries, next_key }
    }
}
