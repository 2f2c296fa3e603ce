// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Keeping the model authoritative around edits the host performs natively.
//!
//! Most events are applied to the model directly and the native action is
//! prevented.  Cut is the exception: the host's own cut fills the system
//! clipboard with formats the core knows nothing about, so it is let through.
//! The coordinator captures the fragment and scroll position beforehand,
//! ignores every event while the host mutates its surface, and on the next
//! turn restores the surface and applies the removal to the model:
//!
//! ```text
//! Idle --cut--> Guarded --next turn / watchdog--> Recovering --> Idle
//! ```

mod host;

use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

pub use host::{DeferredTask, EditorHost, NodeRef, ScrollOffset, TurnQueue};

use crate::editor_state::{EditorMode, EditorState};
use crate::pipeline::{
    entity_for_typing, extract_fragment, insert_fragment, remove_adjacent,
    remove_range, replace_text, ClipboardFragment, EditType, RemovalDirection,
};
use crate::selection::SelectionModel;

/// A host input event, already classified.
#[derive(Clone, Debug, PartialEq)]
pub enum EditorEvent {
    /// `target` is the nearest scrollable ancestor of the surface, if any.
    Cut { target: Option<NodeRef> },
    Copy,
    /// Plain text from the system clipboard.
    Paste { text: String },
    /// Text about to be typed.
    BeforeInput(String),
    Backspace,
    Delete,
    /// The host's selection moved.
    Select(SelectionModel),
    Undo,
    Redo,
}

/// What the host should do with the native action behind an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventDisposition {
    /// The model applied the event; prevent the native action.
    Handled,
    /// Nothing to do; prevent the native action.
    Suppressed,
    /// Let the native action run.
    Native,
    /// Ignored because a native mutation is in flight; prevent the native
    /// action.
    Dropped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoordinatorPhase {
    Idle,
    Guarded,
    Recovering,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// How long a guard may wait for its deferred recovery before
    /// [`NativeEventCoordinator::check_guard`] recovers on its own.
    pub guard_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            guard_timeout: Duration::from_secs(1),
        }
    }
}

#[derive(Clone, Debug)]
struct Guard {
    ticket: u64,
    started_at: Instant,
    target: Option<NodeRef>,
    scroll: Option<ScrollOffset>,
}

#[derive(Clone, Debug)]
enum Phase {
    Idle,
    Guarded(Guard),
    Recovering,
}

/// Owns the editor state and routes host events into the mutation pipeline.
pub struct NativeEventCoordinator {
    state: EditorState,
    phase: Phase,
    clipboard: Option<ClipboardFragment>,
    config: CoordinatorConfig,
    next_ticket: u64,
}

impl NativeEventCoordinator {
    pub fn new(state: EditorState) -> Self {
        Self::with_config(state, CoordinatorConfig::default())
    }

    pub fn with_config(state: EditorState, config: CoordinatorConfig) -> Self {
        Self {
            state,
            phase: Phase::Idle,
            clipboard: None,
            config,
            next_ticket: 0,
        }
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// The fragment most recently copied or cut from this editor.
    pub fn clipboard(&self) -> Option<&ClipboardFragment> {
        self.clipboard.as_ref()
    }

    pub fn phase(&self) -> CoordinatorPhase {
        match self.phase {
            Phase::Idle => CoordinatorPhase::Idle,
            Phase::Guarded(_) => CoordinatorPhase::Guarded,
            Phase::Recovering => CoordinatorPhase::Recovering,
        }
    }

    pub fn handle_event<H: EditorHost + ?Sized>(
        &mut self,
        host: &mut H,
        event: EditorEvent,
    ) -> EventDisposition {
        if !matches!(self.phase, Phase::Idle) {
            trace!(?event, "dropped event during native mutation");
            return EventDisposition::Dropped;
        }
        match event {
            EditorEvent::Cut { target } => self.on_cut(host, target),
            EditorEvent::Copy => self.on_copy(host),
            EditorEvent::Paste { text } => self.on_paste(&text),
            EditorEvent::BeforeInput(text) => self.on_before_input(&text),
            EditorEvent::Backspace => {
                self.on_remove_adjacent(RemovalDirection::Backward)
            }
            EditorEvent::Delete => self.on_remove_adjacent(RemovalDirection::Forward),
            EditorEvent::Select(selection) => self.on_select(selection),
            EditorEvent::Undo if self.state.can_undo() => {
                self.state = self.state.undo();
                EventDisposition::Handled
            }
            EditorEvent::Redo if self.state.can_redo() => {
                self.state = self.state.redo();
                EventDisposition::Handled
            }
            EditorEvent::Undo | EditorEvent::Redo => {
                debug!("nothing to undo or redo");
                EventDisposition::Suppressed
            }
        }
    }

    /// Run a task the host deferred on the coordinator's behalf.  Tasks
    /// from a guard that has already ended are ignored.
    pub fn run_deferred<H: EditorHost + ?Sized>(
        &mut self,
        host: &mut H,
        task: DeferredTask,
    ) {
        match task {
            DeferredTask::RecoverCut { ticket } => match &self.phase {
                Phase::Guarded(guard) if guard.ticket == ticket => {
                    let guard = guard.clone();
                    self.recover_cut(host, guard);
                }
                _ => trace!(ticket, "ignoring stale cut recovery"),
            },
        }
    }

    /// Recover a cut whose deferred task has not run within the guard
    /// timeout.  Returns whether recovery ran.
    pub fn check_guard<H: EditorHost + ?Sized>(&mut self, host: &mut H) -> bool {
        let Phase::Guarded(guard) = &self.phase else {
            return false;
        };
        let waited = host.now().saturating_duration_since(guard.started_at);
        if waited < self.config.guard_timeout {
            return false;
        }
        warn!(
            ticket = guard.ticket,
            waited_ms = waited.as_millis() as u64,
            "cut recovery never ran; recovering from watchdog"
        );
        let guard = guard.clone();
        self.recover_cut(host, guard);
        true
    }

    // ------------------------------------------------------------------
    // Cut
    // ------------------------------------------------------------------

    fn on_cut<H: EditorHost + ?Sized>(
        &mut self,
        host: &mut H,
        target: Option<NodeRef>,
    ) -> EventDisposition {
        let selection = self.state.selection();
        if selection.is_collapsed() {
            debug!("nothing to cut");
            return EventDisposition::Suppressed;
        }
        let scroll = target.map(|node| host.scroll_offset_of(node));
        let fragment = extract_fragment(self.state.current_content(), selection);
        if let Err(e) = host.write_clipboard(&fragment) {
            warn!(error = %e, "failed to write cut fragment to clipboard");
        }
        self.clipboard = Some(fragment);

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.state = self.state.with_mode(EditorMode::Cut);
        self.phase = Phase::Guarded(Guard {
            ticket,
            started_at: host.now(),
            target,
            scroll,
        });
        host.defer_one_turn(DeferredTask::RecoverCut { ticket });
        debug!(ticket, ?scroll, "cut guarded");
        EventDisposition::Native
    }

    fn recover_cut<H: EditorHost + ?Sized>(&mut self, host: &mut H, guard: Guard) {
        self.phase = Phase::Recovering;
        let restored = self.state.with_mode(EditorMode::Normal);
        if let Err(e) = host.restore_surface(&restored) {
            warn!(error = %e, "failed to restore surface after cut");
        }
        if let (Some(node), Some(offset)) = (guard.target, guard.scroll) {
            host.set_scroll_offset(node, offset);
        }

        let removed = remove_range(
            restored.current_content(),
            restored.selection(),
            RemovalDirection::Forward,
        );
        let pushed = restored.push(removed, EditType::RemoveRange);
        let caret = pushed.current_content().selection_after().clone();
        self.state = pushed.force_selection(caret);
        self.phase = Phase::Idle;
        debug!(
            ticket = guard.ticket,
            select_can_not_undo = self.state.current_content().select_can_not_undo(),
            "cut recovered"
        );
    }

    // ------------------------------------------------------------------
    // Everything else
    // ------------------------------------------------------------------

    fn on_copy<H: EditorHost + ?Sized>(&mut self, host: &mut H) -> EventDisposition {
        let selection = self.state.selection();
        if selection.is_collapsed() {
            return EventDisposition::Suppressed;
        }
        let fragment = extract_fragment(self.state.current_content(), selection);
        if let Err(e) = host.write_clipboard(&fragment) {
            warn!(error = %e, "failed to write copied fragment to clipboard");
        }
        self.clipboard = Some(fragment);
        EventDisposition::Native
    }

    fn on_paste(&mut self, text: &str) -> EventDisposition {
        if text.is_empty() {
            return EventDisposition::Suppressed;
        }
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        let fragment = match &self.clipboard {
            Some(f) if f.plain_text() == normalized => f.clone(),
            _ => ClipboardFragment::from_plain_text(&normalized),
        };
        let content = insert_fragment(
            self.state.current_content(),
            self.state.selection(),
            &fragment,
        );
        self.state = self.state.push(content, EditType::InsertFragment);
        EventDisposition::Handled
    }

    fn on_before_input(&mut self, text: &str) -> EventDisposition {
        if text.is_empty() {
            return EventDisposition::Suppressed;
        }
        if text.contains(['\n', '\r']) {
            return self.on_paste(text);
        }
        let content = self.state.current_content();
        let selection = self.state.selection();
        let style = self.state.current_inline_style();
        let entity = entity_for_typing(content, selection);
        let typed = replace_text(content, selection, text, &style, entity);
        self.state = self.state.push(typed, EditType::InsertCharacters);
        EventDisposition::Handled
    }

    fn on_remove_adjacent(&mut self, direction: RemovalDirection) -> EventDisposition {
        let selection = self.state.selection();
        let edit_type = match (selection.is_collapsed(), direction) {
            (false, _) => EditType::RemoveRange,
            (true, RemovalDirection::Backward) => EditType::BackspaceCharacter,
            (true, RemovalDirection::Forward) => EditType::DeleteCharacter,
        };
        match remove_adjacent(self.state.current_content(), selection, direction) {
            Some(content) => {
                self.state = self.state.push(content, edit_type);
                EventDisposition::Handled
            }
            None => EventDisposition::Suppressed,
        }
    }

    fn on_select(&mut self, selection: SelectionModel) -> EventDisposition {
        if let Err(e) = self.state.current_content().check_selection(&selection) {
            warn!(error = %e, "ignoring host selection");
            return EventDisposition::Suppressed;
        }
        self.state = self.state.accept_selection(selection);
        EventDisposition::Handled
    }
}
