use ratatui::Frame;

use crate::app::{App, AppState};

/// A UI Screen boundary: responsible for rendering one app state.
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

/// Live round: stimulus, answer entry and per-round feedback.
pub struct PlayingScreen;

impl Screen for PlayingScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(app, f.area());
    }
}

/// Level summary shown once every round has been scored.
pub struct ResultsScreen;

impl Screen for ResultsScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(app, f.area());
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Playing => Box::new(PlayingScreen),
        AppState::Results => Box::new(ResultsScreen),
    }
}
