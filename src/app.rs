//! Terminal session state: wires key presses and ticks into the phase
//! controller and hands finished levels to a result sink.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::config::Config;
use crate::controller::{Notification, PhaseController, Settings};
use crate::generator::corridor::CITIES;
use crate::level::{GameKind, LevelSelector};
use crate::round::{Control, Phase};
use crate::store::{LevelResult, ResultSink};

/// Rows in the city grid; cities run down each column alphabetically.
pub const GRID_ROWS: usize = CITIES.len() / crate::generator::corridor::GRID_COLUMNS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Playing,
    Results,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    Saved,
    Disabled,
    Failed(String),
}

/// Abstract input after key mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Digit(u8),
    Backspace,
    Submit,
    Press(Control),
    MoveCursor(Control),
    ToggleItem,
    Retry,
    NextLevel,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App {
    pub config: Config,
    pub controller: PhaseController,
    pub state: AppState,
    /// Index into `CITIES` of the highlighted grid cell.
    pub cursor: usize,
    pub save_status: Option<SaveStatus>,
    /// Last session time seen, used when rendering countdowns.
    pub now_ms: u64,
}

impl App {
    pub fn new(config: Config, game: GameKind, level: LevelSelector, seed: Option<u64>) -> Self {
        let settings = Settings {
            playfield: config.playfield,
            seed,
        };
        Self {
            controller: PhaseController::new(game, level, settings),
            config,
            state: AppState::Playing,
            cursor: 0,
            save_status: None,
            now_ms: 0,
        }
    }

    pub fn game(&self) -> GameKind {
        self.controller.game()
    }

    pub fn start(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
        self.reset_view();
        self.controller.start(now_ms);
    }

    fn reset_view(&mut self) {
        self.state = AppState::Playing;
        self.cursor = 0;
        self.save_status = None;
    }

    /// Translate a key into a command for the current game and screen.
    pub fn map_key(&self, key: KeyEvent) -> Option<Command> {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return Some(Command::Quit);
        }

        if self.state == AppState::Results {
            return match key.code {
                KeyCode::Char('r') => Some(Command::Retry),
                KeyCode::Char('n') => Some(Command::NextLevel),
                KeyCode::Char('q') => Some(Command::Quit),
                _ => None,
            };
        }

        let arrow = match key.code {
            KeyCode::Up => Some(Control::Up),
            KeyCode::Down => Some(Control::Down),
            KeyCode::Left => Some(Control::Left),
            KeyCode::Right => Some(Control::Right),
            _ => None,
        };

        match self.game() {
            GameKind::VerbalMemory => match key.code {
                KeyCode::Char(c) => c.to_digit(10).map(|d| Command::Digit(d as u8)),
                KeyCode::Backspace => Some(Command::Backspace),
                KeyCode::Enter => Some(Command::Submit),
                _ => None,
            },
            GameKind::SustainedAttention => match key.code {
                KeyCode::Char('r') | KeyCode::Char('1') => Some(Command::Press(Control::Red)),
                KeyCode::Char('b') | KeyCode::Char('2') => Some(Command::Press(Control::Black)),
                KeyCode::Char('y') | KeyCode::Char('3') => Some(Command::Press(Control::Yellow)),
                _ => None,
            },
            GameKind::CognitionFlexibility => arrow.map(Command::Press),
            GameKind::CorridorMemory => match key.code {
                KeyCode::Char(' ') => Some(Command::ToggleItem),
                KeyCode::Enter => Some(Command::Submit),
                _ => arrow.map(Command::MoveCursor),
            },
        }
    }

    pub fn apply(&mut self, command: Command, now_ms: u64, sink: &mut dyn ResultSink) -> Flow {
        self.now_ms = now_ms;
        match command {
            Command::Quit => {
                self.controller.abandon();
                return Flow::Quit;
            }
            Command::Digit(d) => {
                self.controller.push_digit(d);
            }
            Command::Backspace => {
                self.controller.pop_digit();
            }
            Command::Submit => {
                self.controller.submit(now_ms);
            }
            Command::Press(control) => {
                self.controller.press(control, now_ms);
            }
            Command::MoveCursor(direction) => self.move_cursor(direction),
            Command::ToggleItem => {
                if let Some(city) = CITIES.get(self.cursor) {
                    self.controller.toggle_item(city);
                }
            }
            Command::Retry => {
                self.reset_view();
                self.controller.retry(now_ms);
            }
            Command::NextLevel => {
                if self.controller.next_level(now_ms) {
                    self.reset_view();
                }
            }
        }
        self.on_tick(now_ms, sink);
        Flow::Continue
    }

    pub fn handle_key(&mut self, key: KeyEvent, now_ms: u64, sink: &mut dyn ResultSink) -> Flow {
        match self.map_key(key) {
            Some(command) => self.apply(command, now_ms, sink),
            None => Flow::Continue,
        }
    }

    /// Fire due timers and react to what the controller reports.
    pub fn on_tick(&mut self, now_ms: u64, sink: &mut dyn ResultSink) {
        self.now_ms = now_ms;
        self.controller.advance(now_ms);
        for notification in self.controller.drain_notifications() {
            if let Notification::LevelComplete(summary) = notification {
                self.state = AppState::Results;
                let result = LevelResult::new(
                    self.game(),
                    self.controller.level_state().level,
                    &summary,
                );
                self.save_status = Some(self.persist(&result, sink));
            }
        }
    }

    fn persist(&self, result: &LevelResult, sink: &mut dyn ResultSink) -> SaveStatus {
        if !self.config.save_results {
            return SaveStatus::Disabled;
        }
        match sink.save(result) {
            Ok(()) => SaveStatus::Saved,
            Err(err) => {
                tracing::warn!(%err, game = %result.game_name, "could not save result");
                SaveStatus::Failed(err.to_string())
            }
        }
    }

    fn move_cursor(&mut self, direction: Control) {
        let (row, col) = (self.cursor % GRID_ROWS, self.cursor / GRID_ROWS);
        let columns = CITIES.len() / GRID_ROWS;
        let (row, col) = match direction {
            Control::Up => (row.saturating_sub(1), col),
            Control::Down => ((row + 1).min(GRID_ROWS - 1), col),
            Control::Left => (row, col.saturating_sub(1)),
            Control::Right => (row, (col + 1).min(columns - 1)),
            _ => (row, col),
        };
        self.cursor = col * GRID_ROWS + row;
    }

    /// Whether the controller is waiting on the player right now.
    pub fn awaiting_input(&self) -> bool {
        self.controller.phase() == Phase::AwaitingInput
    }
}
