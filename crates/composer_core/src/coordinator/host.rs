// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use std::collections::VecDeque;
use std::time::Instant;

use crate::editor_state::EditorState;
use crate::error::HostError;
use crate::pipeline::ClipboardFragment;

/// An opaque handle to a host node, usually the nearest scrollable ancestor
/// of the editor surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeRef(pub u64);

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollOffset {
    pub x: f64,
    pub y: f64,
}

impl ScrollOffset {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Work the coordinator asks the host to run on its next turn.  The host
/// hands it back through
/// [`NativeEventCoordinator::run_deferred`](super::NativeEventCoordinator::run_deferred).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeferredTask {
    RecoverCut { ticket: u64 },
}

/// The services a platform provides to the core.
///
/// Calls are made synchronously from inside event handling.  None of them
/// may call back into the coordinator.
pub trait EditorHost {
    fn scroll_offset_of(&self, node: NodeRef) -> ScrollOffset;

    fn set_scroll_offset(&mut self, node: NodeRef, offset: ScrollOffset);

    /// Make the visible surface show `state` again after a native mutation.
    fn restore_surface(&mut self, state: &EditorState) -> Result<(), HostError>;

    fn write_clipboard(&mut self, fragment: &ClipboardFragment) -> Result<(), HostError>;

    /// Run `task` after the current event dispatch has finished and the
    /// host's own native handling has taken effect.
    fn defer_one_turn(&mut self, task: DeferredTask);

    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A FIFO of deferred tasks for hosts without a scheduler of their own.
///
/// Tasks queued while a turn is being run land in the next turn.
#[derive(Clone, Debug, Default)]
pub struct TurnQueue {
    pending: VecDeque<DeferredTask>,
}

impl TurnQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, task: DeferredTask) {
        self.pending.push_back(task);
    }

    /// Everything queued so far, oldest first.
    pub fn take_turn(&mut self) -> Vec<DeferredTask> {
        self.pending.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{DeferredTask, TurnQueue};

    #[test]
    fn take_turn_drains_in_order() {
        let mut queue = TurnQueue::new();
        queue.push(DeferredTask::RecoverCut { ticket: 1 });
        queue.push(DeferredTask::RecoverCut { ticket: 2 });
        assert_eq!(
            queue.take_turn(),
            vec![
                DeferredTask::RecoverCut { ticket: 1 },
                DeferredTask::RecoverCut { ticket: 2 }
            ]
        );
        assert!(queue.is_empty());
    }
}
