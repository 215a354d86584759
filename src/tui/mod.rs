//! Interactive search session.
//!
//! [`session`], [`debouncer`] and [`editor`] hold the terminal-independent
//! logic; the ratatui front end is built with the `interactive` feature.

pub mod debouncer;
pub mod editor;
pub mod session;

#[cfg(feature = "interactive")]
mod app;
#[cfg(feature = "interactive")]
mod ui;

#[cfg(feature = "interactive")]
pub use self::terminal::run;

#[cfg(feature = "interactive")]
mod terminal {
    use super::app::App;
    use super::session::SessionEvent;
    use super::ui;
    use crate::config::AppConfig;
    use crate::workspace::Workspace;
    use anyhow::Result;
    use crossterm::{
        event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
        execute,
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    };
    use ratatui::{backend::CrosstermBackend, Terminal};
    use std::io;
    use std::time::Duration;
    use tokio::runtime::Handle;

    /// Longest the loop blocks waiting for input
    const MAX_POLL: Duration = Duration::from_millis(100);

    /// What a key press means to the front end
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(super) enum KeyAction {
        Session(SessionEvent),
        SelectNext,
        SelectPrev,
        Open,
    }

    pub(super) fn map_key(key: KeyEvent) -> Option<KeyAction> {
        let action = match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c')) | (_, KeyCode::Esc) => {
                KeyAction::Session(SessionEvent::Cancel)
            }
            (_, KeyCode::Tab) => KeyAction::Session(SessionEvent::ToggleMode),
            (_, KeyCode::Backspace) | (_, KeyCode::Delete) => {
                KeyAction::Session(SessionEvent::DeleteBack)
            }
            (_, KeyCode::Down) => KeyAction::SelectNext,
            (_, KeyCode::Up) => KeyAction::SelectPrev,
            (_, KeyCode::Enter) => KeyAction::Open,
            (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(c)) => {
                KeyAction::Session(SessionEvent::Insert(c))
            }
            _ => return None,
        };
        Some(action)
    }

    pub fn run(workspace: &Workspace, config: &AppConfig, runtime: Handle) -> Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let mut app = App::new(workspace, config, runtime);
        let result = run_app(&mut terminal, &mut app);

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn run_app<B: ratatui::backend::Backend>(
        terminal: &mut Terminal<B>,
        app: &mut App,
    ) -> Result<()>
    where
        B::Error: Send + Sync + 'static,
    {
        loop {
            // Debounce deadlines and background AI completions
            app.tick();

            terminal.draw(|f| ui::draw(f, app))?;

            if !event::poll(app.poll_timeout(MAX_POLL))? {
                continue;
            }

            // Only key presses; Windows also reports releases
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }

            match map_key(key) {
                Some(KeyAction::Session(event)) => {
                    if !app.handle_event(event) {
                        return Ok(());
                    }
                }
                Some(KeyAction::SelectNext) => app.select_next(),
                Some(KeyAction::SelectPrev) => app.select_prev(),
                Some(KeyAction::Open) => app.open_selected(),
                None => {}
            }
        }
    }

}
