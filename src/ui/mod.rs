//! Progress reporting for dataset fetch and load.
//!
//! The loader only talks to the [`Ui`] trait. Three implementations exist:
//! - [`SilentUi`] for tests and library callers
//! - [`LogUi`], which forwards to `tracing` (the CLI default)
//! - [`TerminalUi`], a ratatui screen with status, progress and activity panels

mod components;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::time::Duration;

use components::{ActivityPanel, ProgressPanel, StatusPanel};

/// Stages of turning a dataset into a database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Fetching,
    Extracting,
    CreatingTables,
    Loading,
    Validating,
    Complete,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Fetching => write!(f, "Fetching dataset"),
            Phase::Extracting => write!(f, "Extracting dataset"),
            Phase::CreatingTables => write!(f, "Creating tables"),
            Phase::Loading => write!(f, "Loading rows"),
            Phase::Validating => write!(f, "Validating invariants"),
            Phase::Complete => write!(f, "Complete"),
        }
    }
}

/// Progress information for the current operation
#[derive(Debug, Clone, Default)]
pub struct Progress {
    pub current: u64,
    pub total: u64,
    pub label: String,
}

impl Progress {
    pub fn new(current: u64, total: u64, label: impl Into<String>) -> Self {
        Self {
            current,
            total,
            label: label.into(),
        }
    }

    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.current as f64 / self.total as f64).min(1.0)
        }
    }
}

/// Trait for UI implementations
pub trait Ui {
    fn set_phase(&mut self, phase: Phase);
    fn set_info(&mut self, info: impl Into<String>);
    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>);
    fn clear_progress(&mut self);
    fn log(&mut self, message: impl Into<String>);
}

/// Full-screen terminal UI
pub struct TerminalUi {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    status: StatusPanel,
    progress: ProgressPanel,
    activity: ActivityPanel,
}

impl TerminalUi {
    /// Enter the alternate screen
    pub fn new() -> Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        stdout.execute(EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;

        Ok(Self {
            terminal,
            status: StatusPanel::new(),
            progress: ProgressPanel::default(),
            activity: ActivityPanel::new(200),
        })
    }

    fn draw(&mut self) -> Result<()> {
        let Self {
            terminal,
            status,
            progress,
            activity,
        } = self;

        terminal.draw(|frame| {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(4),
                    Constraint::Length(3),
                    Constraint::Min(4),
                ])
                .split(frame.area());

            status.render(frame, rows[0]);
            progress.render(frame, rows[1]);
            activity.render(frame, rows[2]);
        })?;

        Ok(())
    }

    /// Show the summary, wait for 'q' or Enter, and restore the terminal
    pub fn finish(mut self, summary: &str) -> Result<()> {
        self.set_phase(Phase::Complete);
        self.clear_progress();
        self.log(summary);
        self.log("Press q or Enter to exit");

        loop {
            if event::poll(Duration::from_millis(100))? {
                if let CrosstermEvent::Key(KeyEvent { code, .. }) = event::read()? {
                    if matches!(code, KeyCode::Char('q') | KeyCode::Enter | KeyCode::Esc) {
                        break;
                    }
                }
            }
        }

        self.restore()
    }

    /// Restore the terminal without waiting
    pub fn restore(mut self) -> Result<()> {
        restore_terminal(&mut self.terminal)
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal::disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

impl Ui for TerminalUi {
    fn set_phase(&mut self, phase: Phase) {
        self.status.phase = phase;
        self.draw().ok();
    }

    fn set_info(&mut self, info: impl Into<String>) {
        self.status.info = info.into();
        self.draw().ok();
    }

    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>) {
        self.progress.current = Some(Progress::new(current, total, label));
        self.draw().ok();
    }

    fn clear_progress(&mut self) {
        self.progress.current = None;
        self.draw().ok();
    }

    fn log(&mut self, message: impl Into<String>) {
        self.activity.push(message);
        self.draw().ok();
    }
}

impl Drop for TerminalUi {
    fn drop(&mut self) {
        restore_terminal(&mut self.terminal).ok();
    }
}

/// Forwards everything to `tracing`; progress ticks are logged at debug level
#[derive(Debug, Default)]
pub struct LogUi {
    phase: Option<Phase>,
}

impl LogUi {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Ui for LogUi {
    fn set_phase(&mut self, phase: Phase) {
        if self.phase != Some(phase) {
            tracing::info!(%phase, "phase");
            self.phase = Some(phase);
        }
    }

    fn set_info(&mut self, info: impl Into<String>) {
        tracing::info!("{}", info.into());
    }

    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>) {
        tracing::debug!(current, total, "{}", label.into());
    }

    fn clear_progress(&mut self) {}

    fn log(&mut self, message: impl Into<String>) {
        tracing::info!("{}", message.into());
    }
}

/// Silent UI implementation for testing and library use
#[derive(Debug, Default)]
pub struct SilentUi;

impl SilentUi {
    pub fn new() -> Self {
        Self
    }
}

impl Ui for SilentUi {
    fn set_phase(&mut self, _phase: Phase) {}
    fn set_info(&mut self, _info: impl Into<String>) {}
    fn set_progress(&mut self, _current: u64, _total: u64, _label: impl Into<String>) {}
    fn clear_progress(&mut self) {}
    fn log(&mut self, _message: impl Into<String>) {}
}
