// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use super::{
    ComponentDescriptor, Decorator, DecoratorKey, DecoratorLookup,
    DecoratorMatches, DecoratorProps,
};
use crate::content::{char_offset, Block, ContentModel};

static HASHTAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"#[\w\x{0590}-\x{05ff}]+").expect("valid hashtag regex")
});

static LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"https?://[^\s<>"]*[^\s<>".,;:!?)\]'"]"#)
        .expect("valid link regex")
});

type FindFn = dyn Fn(&Block, &ContentModel) -> Vec<Range<usize>> + Send + Sync;

/// How one decorator finds its ranges.  Ranges are in `char`s.
#[derive(Clone)]
pub enum Strategy {
    Regex(Regex),
    /// `#word`, including Hebrew letters.
    Hashtag,
    /// `http` and `https` URLs that parse.
    Link,
    /// Every entity run whose entity has this kind.
    EntityKind(String),
    Custom(Arc<FindFn>),
}

impl Strategy {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Block, &ContentModel) -> Vec<Range<usize>> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    fn find(&self, block: &Block, content: &ContentModel) -> Vec<Range<usize>> {
        match self {
            Self::Regex(re) => regex_ranges(re, block.text()),
            Self::Hashtag => regex_ranges(&HASHTAG, block.text()),
            Self::Link => LINK
                .find_iter(block.text())
                .filter(|m| Url::parse(m.as_str()).is_ok())
                .map(|m| {
                    char_offset(block.text(), m.start())..char_offset(block.text(), m.end())
                })
                .collect(),
            Self::EntityKind(kind) => block
                .entity_runs()
                .iter()
                .filter(|r| content.entity(r.value).is_some_and(|e| &e.kind == kind))
                .map(|r| r.range())
                .collect(),
            Self::Custom(f) => f(block, content),
        }
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regex(re) => f.debug_tuple("Regex").field(&re.as_str()).finish(),
            Self::Hashtag => f.write_str("Hashtag"),
            Self::Link => f.write_str("Link"),
            Self::EntityKind(kind) => f.debug_tuple("EntityKind").field(kind).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

fn regex_ranges(re: &Regex, text: &str) -> Vec<Range<usize>> {
    re.find_iter(text)
        .map(|m| char_offset(text, m.start())..char_offset(text, m.end()))
        .collect()
}

#[derive(Clone, Debug)]
struct Entry {
    strategy: Strategy,
    component: ComponentDescriptor,
    props: DecoratorProps,
}

/// An ordered list of strategies.  Earlier strategies win: a range is only
/// decorated if none of its characters has been claimed already.
///
/// Keys have the form `"{strategy index}.{occurrence}"`, so the same text
/// decorated the same way always gets the same keys.
#[derive(Clone, Debug, Default)]
pub struct CompositeDecorator {
    entries: Vec<Entry>,
}

impl CompositeDecorator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, strategy: Strategy, component: ComponentDescriptor) -> Self {
        self.with_props(strategy, component, DecoratorProps::new())
    }

    pub fn with_props(
        mut self,
        strategy: Strategy,
        component: ComponentDescriptor,
        props: DecoratorProps,
    ) -> Self {
        self.entries.push(Entry {
            strategy,
            component,
            props,
        });
        self
    }

    fn entry_for_key(&self, key: &DecoratorKey) -> Option<&Entry> {
        let (index, _) = key.as_str().split_once('.')?;
        self.entries.get(index.parse::<usize>().ok()?)
    }
}

impl Decorator for CompositeDecorator {
    fn decorations(&self, block: &Block, content: &ContentModel) -> DecoratorMatches {
        let len = block.len();
        let mut slots: Vec<Option<DecoratorKey>> = vec![None; len];
        for (index, entry) in self.entries.iter().enumerate() {
            let mut occurrence = 0;
            for range in entry.strategy.find(block, content) {
                assert!(
                    range.end <= len,
                    "decorator range {range:?} out of bounds for block {} of length {len}",
                    block.key()
                );
                if range.is_empty() || slots[range.clone()].iter().any(Option::is_some) {
                    continue;
                }
                let key = DecoratorKey::new(format!("{index}.{occurrence}"));
                slots[range].fill(Some(key));
                occurrence += 1;
            }
        }
        DecoratorMatches::from_slots(&slots)
    }
}

impl DecoratorLookup for CompositeDecorator {
    fn component_for_key(&self, key: &DecoratorKey) -> Option<ComponentDescriptor> {
        self.entry_for_key(key).map(|e| e.component.clone())
    }

    fn props_for_key(&self, key: &DecoratorKey) -> DecoratorProps {
        self.entry_for_key(key)
            .map(|e| e.props.clone())
            .unwrap_or_default()
    }
}
