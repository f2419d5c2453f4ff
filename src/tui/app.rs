//! Main TUI application state machine.
//!
//! Handles:
//! - Tab navigation
//! - Input event handling
//! - Background assessment via worker thread

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};

use crate::adapters::{ForestLoader, SignaturePolicy};
use crate::application::AssessmentService;
use crate::config::Settings;

use super::ui::{
    form::{render_assessment_form, AssessmentFormState},
    info::{render_disclaimer_tab, render_system_info, SystemInfoState},
    render_disclaimer, render_tabs,
    result::{render_result, ResultState},
};
use super::worker::{AssessmentProgress, AssessmentWorker, AssessmentWorkerHandle};

/// Top-level tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Assessment,
    SystemInfo,
    Disclaimer,
}

impl Tab {
    fn index(self) -> usize {
        match self {
            Self::Assessment => 0,
            Self::SystemInfo => 1,
            Self::Disclaimer => 2,
        }
    }
}

/// Main application state
pub struct App {
    tab: Tab,
    should_quit: bool,
    service: Arc<AssessmentService<ForestLoader>>,
    policy: SignaturePolicy,
    form_state: AssessmentFormState,
    result_state: ResultState,
    pending_worker: Option<AssessmentWorkerHandle>,
}

impl App {
    /// Build the application from settings.
    ///
    /// # Errors
    /// Returns error if the configured verifying key is malformed.
    pub fn new(settings: &Settings) -> Result<Self> {
        let loader = settings.forest_loader()?;
        Ok(Self::with_service(
            Arc::new(AssessmentService::new(loader)),
            settings.signature_policy(),
        ))
    }

    /// Create the application around an existing service.
    #[must_use]
    pub fn with_service(
        service: Arc<AssessmentService<ForestLoader>>,
        policy: SignaturePolicy,
    ) -> Self {
        Self {
            tab: Tab::Assessment,
            should_quit: false,
            service,
            policy,
            form_state: AssessmentFormState::default(),
            result_state: ResultState::default(),
            pending_worker: None,
        }
    }

    /// Load the classifier and run the main loop.
    ///
    /// # Errors
    /// Returns error if the classifier cannot be loaded or terminal
    /// operations fail.
    pub fn run(&mut self) -> Result<()> {
        // Refuse to start without a usable model.
        self.service
            .initialize()
            .map_err(|e| anyhow!("Failed to load classifier: {e}"))?;

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            self.poll_worker();

            let info = SystemInfoState {
                model: self.service.model_info(),
                policy: self.policy,
            };

            terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(2),
                        Constraint::Min(0),
                        Constraint::Length(2),
                    ])
                    .split(f.area());

                render_tabs(f, chunks[0], self.tab.index());

                match self.tab {
                    Tab::Assessment => {
                        let panes = Layout::default()
                            .direction(Direction::Horizontal)
                            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
                            .split(chunks[1]);
                        render_assessment_form(f, panes[0], &self.form_state);
                        render_result(f, panes[1], &self.result_state);
                    }
                    Tab::SystemInfo => render_system_info(f, chunks[1], &info),
                    Tab::Disclaimer => render_disclaimer_tab(f, chunks[1]),
                }

                render_disclaimer(f, chunks[2]);
            })?;

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Drain progress from the background worker.
    fn poll_worker(&mut self) {
        while let Some(progress) = self.pending_worker.as_ref().and_then(|w| w.try_recv()) {
            match progress {
                AssessmentProgress::Stage(stage) => {
                    self.result_state = ResultState::Running { stage };
                }
                AssessmentProgress::Complete(assessment) => {
                    self.result_state = ResultState::Complete { assessment };
                    self.pending_worker = None;
                }
                AssessmentProgress::Error(message) => {
                    self.result_state = ResultState::Error { message };
                    self.pending_worker = None;
                }
            }
        }
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        if key == KeyCode::Char('q') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match key {
            KeyCode::F(1) => self.tab = Tab::Assessment,
            KeyCode::F(2) => self.tab = Tab::SystemInfo,
            KeyCode::F(3) => self.tab = Tab::Disclaimer,
            _ => match self.tab {
                Tab::Assessment => self.handle_form_key(key),
                Tab::SystemInfo | Tab::Disclaimer => {
                    if matches!(key, KeyCode::Char('q' | 'Q')) {
                        self.should_quit = true;
                    } else if key == KeyCode::Esc {
                        self.tab = Tab::Assessment;
                    }
                }
            },
        }
    }

    fn handle_form_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Up | KeyCode::BackTab => self.form_state.prev_field(),
            KeyCode::Down | KeyCode::Tab => self.form_state.next_field(),
            KeyCode::Char('s' | 'S') => self.form_state.load_defaults(),
            KeyCode::Char('q' | 'Q') => self.should_quit = true,
            KeyCode::Char(c) => self.form_state.input_char(c),
            KeyCode::Backspace => self.form_state.delete_char(),
            KeyCode::Delete => self.form_state.clear_field(),
            KeyCode::Esc => {
                if !self.result_state.is_running() {
                    self.result_state = ResultState::Idle;
                }
            }
            KeyCode::Enter => self.submit(),
            _ => {}
        }
    }

    fn submit(&mut self) {
        if self.pending_worker.is_some() {
            return;
        }

        match self.form_state.to_input() {
            Ok(input) => {
                self.result_state = ResultState::Running {
                    stage: crate::application::AssessmentStage::Validating,
                };
                self.pending_worker = Some(AssessmentWorker::spawn(
                    Arc::clone(&self.service),
                    input,
                ));
                self.form_state.clear_sensitive();
            }
            Err(e) => {
                self.form_state.error_message = Some(e);
            }
        }
    }
}
