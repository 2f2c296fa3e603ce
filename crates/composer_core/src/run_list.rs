// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Ordered, non-overlapping range maps.
//!
//! A [`RunList`] is the storage for both inline-style runs and entity runs of
//! a block.  It is always kept normalised:
//!
//! 1. every run is non-empty (`start < end`),
//! 2. runs are sorted by `start` and never overlap,
//! 3. two touching runs never carry an equal value (they are merged).
//!
//! Offsets not covered by any run have "no value".  Every editing operation
//! returns a new list; lists are never mutated in place once built.

use std::ops::Range;

/// One contiguous range `[start, end)` carrying a value.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Run<T> {
    pub start: usize,
    pub end: usize,
    pub value: T,
}

impl<T> Run<T> {
    pub fn new(start: usize, end: usize, value: T) -> Self {
        Self { start, end, value }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Why a run list is not well formed against a given text length.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunDefect {
    Empty { start: usize },
    Overlap { at: usize },
    Unmerged { at: usize },
    OutOfBounds { end: usize, len: usize },
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct RunList<T> {
    runs: Vec<Run<T>>,
}

impl<T> Default for RunList<T> {
    fn default() -> Self {
        Self { runs: Vec::new() }
    }
}

impl<T: Clone + PartialEq> RunList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list from arbitrary runs.  Runs may arrive unsorted; empty
    /// runs are dropped and touching equal runs merged.
    ///
    /// Panics if two runs overlap.
    pub fn from_runs(runs: impl IntoIterator<Item = Run<T>>) -> Self {
        let mut runs: Vec<Run<T>> = runs.into_iter().collect();
        runs.sort_by_key(|r| r.start);
        let runs = normalize(runs);
        for pair in runs.windows(2) {
            assert!(
                pair[0].end <= pair[1].start,
                "overlapping runs at offset {}",
                pair[1].start
            );
        }
        Self { runs }
    }

    pub fn runs(&self) -> &[Run<T>] {
        &self.runs
    }

    pub fn iter(&self) -> impl Iterator<Item = &Run<T>> {
        self.runs.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// The end of the last run, or 0 for an empty list.
    pub fn extent(&self) -> usize {
        self.runs.last().map_or(0, |r| r.end)
    }

    /// The value covering `offset`, if any.
    pub fn value_at(&self, offset: usize) -> Option<&T> {
        let idx = self.runs.partition_point(|r| r.end <= offset);
        self.runs
            .get(idx)
            .filter(|r| r.start <= offset)
            .map(|r| &r.value)
    }

    /// The run covering `offset`, if any.
    pub fn run_at(&self, offset: usize) -> Option<&Run<T>> {
        let idx = self.runs.partition_point(|r| r.end <= offset);
        self.runs.get(idx).filter(|r| r.start <= offset)
    }

    /// Every start and end offset in the list, in ascending order.
    pub fn boundaries(&self) -> impl Iterator<Item = usize> + '_ {
        self.runs.iter().flat_map(|r| [r.start, r.end])
    }

    /// The part of the list inside `range`, re-based so that `range.start`
    /// becomes offset 0.
    pub fn slice(&self, range: Range<usize>) -> Self {
        let runs = self
            .runs
            .iter()
            .filter(|r| r.end > range.start && r.start < range.end)
            .map(|r| {
                Run::new(
                    r.start.max(range.start) - range.start,
                    r.end.min(range.end) - range.start,
                    r.value.clone(),
                )
            })
            .collect();
        Self {
            runs: normalize(runs),
        }
    }

    /// Delete `range`, shifting everything after it to the left.
    pub fn remove(&self, range: Range<usize>) -> Self {
        let len = range.end - range.start;
        if len == 0 {
            return self.clone();
        }
        let mut out = Vec::with_capacity(self.runs.len());
        for run in &self.runs {
            if run.end <= range.start {
                out.push(run.clone());
            } else if run.start >= range.end {
                out.push(Run::new(
                    run.start - len,
                    run.end - len,
                    run.value.clone(),
                ));
            } else {
                let start = run.start.min(range.start);
                let end = if run.end > range.end {
                    run.end - len
                } else {
                    range.start
                };
                out.push(Run::new(start, end, run.value.clone()));
            }
        }
        Self {
            runs: normalize(out),
        }
    }

    /// Open a gap of `len` at `at` and fill it with `other` (whose offsets
    /// are relative to the gap).  A run spanning `at` is split around the gap.
    pub fn insert(&self, at: usize, other: &RunList<T>, len: usize) -> Self {
        assert!(
            other.extent() <= len,
            "inserted runs extend past the inserted length"
        );
        let mut out = Vec::with_capacity(self.runs.len() + other.runs.len() + 1);
        for run in &self.runs {
            if run.end <= at {
                out.push(run.clone());
            } else if run.start >= at {
                out.push(Run::new(
                    run.start + len,
                    run.end + len,
                    run.value.clone(),
                ));
            } else {
                out.push(Run::new(run.start, at, run.value.clone()));
                out.push(Run::new(at + len, run.end + len, run.value.clone()));
            }
        }
        out.extend(
            other
                .runs
                .iter()
                .map(|r| Run::new(r.start + at, r.end + at, r.value.clone())),
        );
        out.sort_by_key(|r| r.start);
        Self {
            runs: normalize(out),
        }
    }

    /// Append `other` after a prefix of length `len`.
    pub fn concat(&self, len: usize, other: &RunList<T>) -> Self {
        let mut out = self.runs.clone();
        out.extend(
            other
                .runs
                .iter()
                .map(|r| Run::new(r.start + len, r.end + len, r.value.clone())),
        );
        Self {
            runs: normalize(out),
        }
    }

    /// Rewrite every sub-range of `range` (covered or not) through `f`.
    /// `f` receives the current value and returns the new one.
    pub fn map_range<F>(&self, range: Range<usize>, mut f: F) -> Self
    where
        F: FnMut(Option<&T>) -> Option<T>,
    {
        let mut out = Vec::with_capacity(self.runs.len() + 2);
        let mut cursor = range.start;
        let gap = |out: &mut Vec<Run<T>>, from: usize, to: usize, f: &mut F| {
            if from < to {
                if let Some(v) = f(None) {
                    out.push(Run::new(from, to, v));
                }
            }
        };
        for run in &self.runs {
            if run.end <= range.start {
                out.push(run.clone());
                continue;
            }
            if run.start >= range.end {
                gap(&mut out, cursor, range.end, &mut f);
                cursor = range.end;
                out.push(run.clone());
                continue;
            }
            if run.start < range.start {
                out.push(Run::new(run.start, range.start, run.value.clone()));
            }
            let lo = run.start.max(range.start);
            let hi = run.end.min(range.end);
            gap(&mut out, cursor, lo, &mut f);
            if let Some(v) = f(Some(&run.value)) {
                out.push(Run::new(lo, hi, v));
            }
            cursor = hi;
            if run.end > range.end {
                out.push(Run::new(range.end, run.end, run.value.clone()));
            }
        }
        gap(&mut out, cursor, range.end, &mut f);
        Self {
            runs: normalize(out),
        }
    }

    /// Cover `range` with `value`, or clear it when `value` is `None`.
    pub fn set(&self, range: Range<usize>, value: Option<T>) -> Self {
        self.map_range(range, |_| value.clone())
    }

    /// Check the normalisation rules against a text of length `len`.
    pub fn check(&self, len: usize) -> Result<(), RunDefect> {
        let mut prev: Option<&Run<T>> = None;
        for run in &self.runs {
            if run.start >= run.end {
                return Err(RunDefect::Empty { start: run.start });
            }
            if run.end > len {
                return Err(RunDefect::OutOfBounds { end: run.end, len });
            }
            if let Some(p) = prev {
                if p.end > run.start {
                    return Err(RunDefect::Overlap { at: run.start });
                }
                if p.end == run.start && p.value == run.value {
                    return Err(RunDefect::Unmerged { at: run.start });
                }
            }
            prev = Some(run);
        }
        Ok(())
    }
}

impl<T: Clone + PartialEq> FromIterator<Run<T>> for RunList<T> {
    fn from_iter<I: IntoIterator<Item = Run<T>>>(iter: I) -> Self {
        Self::from_runs(iter)
    }
}

fn normalize<T: PartialEq>(mut runs: Vec<Run<T>>) -> Vec<Run<T>> {
    runs.retain(|r| r.start < r.end);
    let mut out: Vec<Run<T>> = Vec::with_capacity(runs.len());
    for run in runs {
        if let Some(last) = out.last_mut() {
            if last.end == run.start && last.value == run.value {
                last.end = run.end;
                continue;
            }
        }
        out.push(run);
    }
    out
}
