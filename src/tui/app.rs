use crate::config::AppConfig;
use crate::index::types::SearchResult;
use crate::output::context_window;
use crate::tui::editor::EditorCommand;
use crate::tui::session::{SearchMode, SearchTicket, SessionAction, SessionController, SessionEvent};
use crate::workspace::Workspace;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tracing::{debug, warn};

/// Lines shown on each side of the match in the detail panel
pub const PREVIEW_RADIUS: u32 = 3;

/// Result of a background AI search
struct SearchCompletion {
    seq: u64,
    query: String,
    outcome: Result<Vec<SearchResult>, String>,
    elapsed: Duration,
}

/// Application state
pub struct App<'w> {
    workspace: &'w Workspace,
    runtime: Handle,
    pub session: SessionController,
    pub selected: usize,
    pub status_message: String,
    max_results: usize,
    editor: Result<EditorCommand, String>,
    completion_tx: Sender<SearchCompletion>,
    completion_rx: Receiver<SearchCompletion>,
}

impl<'w> App<'w> {
    pub fn new(workspace: &'w Workspace, config: &AppConfig, runtime: Handle) -> Self {
        let (completion_tx, completion_rx) = mpsc::channel();
        let editor = EditorCommand::parse(&config.editor.command).map_err(|e| e.to_string());

        let mut app = Self {
            workspace,
            runtime,
            session: SessionController::new(&config.session),
            selected: 0,
            status_message: String::new(),
            max_results: config.session.max_results,
            editor,
            completion_tx,
            completion_rx,
        };
        app.status_message = app.idle_status();
        app
    }

    pub fn element_count(&self) -> usize {
        self.workspace.elements().len()
    }

    pub fn results(&self) -> &[SearchResult] {
        self.session.results()
    }

    pub fn mode(&self) -> SearchMode {
        self.session.mode()
    }

    pub fn is_loading(&self) -> bool {
        self.session.loading()
    }

    fn idle_status(&self) -> String {
        match self.workspace.ai_unavailable() {
            Some(reason) => format!("{} elements indexed (AI off: {})", self.element_count(), reason),
            None => format!("{} elements indexed", self.element_count()),
        }
    }

    /// Feed an input event to the session; returns false when the session ends
    pub fn handle_event(&mut self, event: SessionEvent) -> bool {
        let action = self.session.handle(event, Instant::now());
        self.apply(action)
    }

    /// Fire due debounced searches and collect background completions
    /// (call this in the event loop)
    pub fn tick(&mut self) {
        let action = self.session.poll(Instant::now());
        self.apply(action);
        self.poll_completions();
    }

    /// How long the event loop may block before the next debounce deadline
    pub fn poll_timeout(&self, max: Duration) -> Duration {
        self.session
            .time_until_due(Instant::now())
            .map_or(max, |due| due.min(max))
    }

    fn apply(&mut self, action: SessionAction) -> bool {
        match action {
            SessionAction::Idle => {}
            SessionAction::Exit => return false,
            SessionAction::Cleared => {
                self.selected = 0;
                self.status_message = self.idle_status();
            }
            SessionAction::Dispatch(ticket) => self.run_search(ticket),
        }
        true
    }

    fn run_search(&mut self, ticket: SearchTicket) {
        debug!(seq = ticket.seq, query = %ticket.query, mode = ticket.mode.label(), "dispatch");

        let workspace = self.workspace;
        match (ticket.mode, workspace.reranker()) {
            (SearchMode::Ai, Some(reranker)) => {
                let reranker = Arc::clone(reranker);
                let tx = self.completion_tx.clone();
                let limit = self.max_results;
                self.status_message = "Ranking with AI...".to_string();

                self.runtime.spawn(async move {
                    let start = Instant::now();
                    let outcome = reranker
                        .rerank(&ticket.query, limit)
                        .await
                        .map_err(|e| e.to_string());
                    let _ = tx.send(SearchCompletion {
                        seq: ticket.seq,
                        query: ticket.query,
                        outcome,
                        elapsed: start.elapsed(),
                    });
                });
            }
            (SearchMode::Ai, None) => {
                let reason = workspace
                    .ai_unavailable()
                    .unwrap_or("no ranking service")
                    .to_string();
                let count = self.complete_with_fuzzy(ticket.seq, &ticket.query);
                self.status_message = format!("AI unavailable ({}); {} fuzzy matches", reason, count);
            }
            (SearchMode::Normal, _) => {
                let start = Instant::now();
                let count = self.complete_with_fuzzy(ticket.seq, &ticket.query);
                self.status_message = format!(
                    "{} matches ({:.1}ms)",
                    count,
                    start.elapsed().as_secs_f64() * 1000.0
                );
            }
        }
    }

    /// Complete `seq` with unranked results, returning how many were found
    fn complete_with_fuzzy(&mut self, seq: u64, query: &str) -> usize {
        let results = self.workspace.engine().search(query, self.max_results);
        let count = results.len();
        if self.session.complete(seq, results) {
            self.selected = 0;
        }
        count
    }

    /// Apply finished AI searches (non-blocking)
    pub fn poll_completions(&mut self) {
        loop {
            let completion = match self.completion_rx.try_recv() {
                Ok(completion) => completion,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return,
            };

            if completion.seq != self.session.seq() {
                debug!(seq = completion.seq, "discarding stale completion");
                continue;
            }

            match completion.outcome {
                Ok(results) => {
                    let count = results.len();
                    if self.session.complete(completion.seq, results) {
                        self.selected = 0;
                        self.status_message = format!(
                            "{} AI-ranked matches ({:.1}s)",
                            count,
                            completion.elapsed.as_secs_f64()
                        );
                    }
                }
                Err(err) => {
                    warn!(query = %completion.query, error = %err, "AI search failed");
                    let count = self.complete_with_fuzzy(completion.seq, &completion.query);
                    self.status_message =
                        format!("AI search failed ({}); {} fuzzy matches", err, count);
                }
            }
        }
    }

    pub fn select_next(&mut self) {
        let len = self.results().len();
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn selected_result(&self) -> Option<&SearchResult> {
        self.results().get(self.selected)
    }

    /// Numbered preview lines around the selected element
    pub fn preview_lines(&self) -> Vec<(u32, &str)> {
        match self.selected_result() {
            Some(result) => context_window(
                result.element.file_content(),
                result.element.line_number,
                PREVIEW_RADIUS,
            ),
            None => Vec::new(),
        }
    }

    pub fn open_selected(&mut self) {
        let Some(result) = self.selected_result() else {
            return;
        };
        let path = result.element.file_path.clone();
        let line = result.element.line_number;

        self.status_message = match &self.editor {
            Ok(editor) => match editor.spawn(&path, line) {
                Ok(()) => format!("Opened {}:{}", path.display(), line.max(1)),
                Err(err) => {
                    warn!(error = %err, "editor launch failed");
                    format!("Could not open editor: {:#}", err)
                }
            },
            Err(err) => format!("Editor not configured: {}", err),
        };
    }
}
