//! Interactive search session state, independent of the terminal.
//!
//! The controller owns the input buffer, the search mode and the current
//! results. Buffer edits go through the debouncer; a mode toggle searches
//! immediately. Every dispatched search carries a sequence number, and only
//! the completion of the latest one is applied.

use crate::config::SessionConfig;
use crate::index::types::SearchResult;
use crate::tui::debouncer::Debouncer;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    #[default]
    Normal,
    Ai,
}

impl SearchMode {
    pub fn toggled(self) -> Self {
        match self {
            SearchMode::Normal => SearchMode::Ai,
            SearchMode::Ai => SearchMode::Normal,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SearchMode::Normal => "Normal",
            SearchMode::Ai => "AI",
        }
    }
}

/// Input the controller reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Insert(char),
    DeleteBack,
    ToggleMode,
    Cancel,
}

/// A search to run on behalf of the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub seq: u64,
    pub query: String,
    pub mode: SearchMode,
}

/// What the caller has to do after an event or a poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    Idle,
    /// Run the search and report back through [`SessionController::complete`]
    Dispatch(SearchTicket),
    /// The buffer is empty; results were cleared without searching
    Cleared,
    Exit,
}

pub struct SessionController {
    input: String,
    mode: SearchMode,
    results: Vec<SearchResult>,
    loading: bool,
    seq: u64,
    debouncer: Debouncer<String>,
    normal_delay: Duration,
    ai_delay: Duration,
}

impl SessionController {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            input: String::new(),
            mode: SearchMode::Normal,
            results: Vec::new(),
            loading: false,
            seq: 0,
            debouncer: Debouncer::new(),
            normal_delay: config.normal_debounce(),
            ai_delay: config.ai_debounce(),
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    /// Sequence number of the latest dispatched search
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn has_pending(&self) -> bool {
        self.debouncer.has_pending()
    }

    /// Time until the pending debounced search is due
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.debouncer.time_until_ready(now)
    }

    fn delay(&self) -> Duration {
        match self.mode {
            SearchMode::Normal => self.normal_delay,
            SearchMode::Ai => self.ai_delay,
        }
    }

    pub fn handle(&mut self, event: SessionEvent, now: Instant) -> SessionAction {
        let prev_input = self.input.clone();
        let prev_mode = self.mode;

        match event {
            SessionEvent::Insert(c) if !c.is_control() => self.input.push(c),
            SessionEvent::Insert(_) => {}
            SessionEvent::DeleteBack => {
                self.input.pop();
            }
            SessionEvent::ToggleMode => self.mode = self.mode.toggled(),
            SessionEvent::Cancel => return SessionAction::Exit,
        }

        self.reconcile(&prev_input, prev_mode, now)
    }

    /// Compare against the snapshot taken before the event
    fn reconcile(&mut self, prev_input: &str, prev_mode: SearchMode, now: Instant) -> SessionAction {
        let input_changed = self.input != prev_input;
        let mode_changed = self.mode != prev_mode;

        if mode_changed && !input_changed {
            self.debouncer.cancel();
            return self.dispatch(self.input.clone());
        }
        if input_changed {
            self.debouncer.schedule(self.input.clone(), self.delay(), now);
        }
        SessionAction::Idle
    }

    /// Fire the debounced search once its idle window has elapsed
    pub fn poll(&mut self, now: Instant) -> SessionAction {
        match self.debouncer.fire(now) {
            Some(query) => self.dispatch(query),
            None => SessionAction::Idle,
        }
    }

    fn dispatch(&mut self, query: String) -> SessionAction {
        self.seq += 1;

        if query.trim().is_empty() {
            self.results.clear();
            self.loading = false;
            return SessionAction::Cleared;
        }

        self.loading = true;
        SessionAction::Dispatch(SearchTicket {
            seq: self.seq,
            query,
            mode: self.mode,
        })
    }

    /// Apply the results of ticket `seq`; returns false for stale tickets
    pub fn complete(&mut self, seq: u64, results: Vec<SearchResult>) -> bool {
        if seq != self.seq {
            return false;
        }
        self.results = results;
        self.loading = false;
        true
    }
}
