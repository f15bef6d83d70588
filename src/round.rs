use std::collections::BTreeSet;

use crate::generator::{corridor::CorridorTrial, crossing::CrossingTrial, flexibility::ShapeTrial};

/// Abstract response controls. Which subset is live depends on the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum Control {
    Up,
    Down,
    Left,
    Right,
    Red,
    Black,
    Yellow,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stimulus {
    Digits(Vec<u8>),
    Crossing(CrossingTrial),
    Shape(ShapeTrial),
    Corridors(CorridorTrial),
}

/// The precomputed answer for a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expected {
    Sequence(Vec<u8>),
    Control(Control),
    /// Distractor: the right move is to not respond at all.
    Withhold,
    /// Sorted item names.
    Items(Vec<String>),
}

/// Whatever the player handed in when the round was scored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Captured {
    Nothing,
    Sequence(Vec<u8>),
    Control { control: Control, at_ms: u64 },
    Items(Vec<String>),
}

impl Captured {
    pub fn is_nothing(&self) -> bool {
        match self {
            Captured::Nothing => true,
            Captured::Sequence(s) => s.is_empty(),
            Captured::Items(i) => i.is_empty(),
            Captured::Control { .. } => false,
        }
    }
}

/// A timed cue inside a reveal timeline, relative to round start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    pub at_ms: u64,
    pub duration_ms: u64,
    pub text: String,
}

/// When the reaction-time epoch of a motion round starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Epoch is the moment the stimulus starts moving.
    OnSpawn,
    /// Epoch is the first frame the stimulus is inside the reaction area.
    ZoneEntry,
    /// No epoch; responding is never right.
    Never,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayPlan {
    /// Discrete cues shown one after another; the answer window opens at
    /// `input_opens_ms` and auto-submits after `answer_window_ms`.
    Reveal {
        cues: Vec<Cue>,
        input_opens_ms: u64,
        answer_window_ms: u64,
    },
    /// Continuous motion starting after `lead_in_ms` and lasting
    /// `duration_ms`. Input is live for the whole path; completion
    /// auto-submits an empty response.
    Motion {
        lead_in_ms: u64,
        duration_ms: u64,
        activation: Activation,
    },
}

/// Immutable description of one round.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundSpec {
    /// 1-based round number within the level.
    pub number: usize,
    pub stimulus: Stimulus,
    pub expected: Expected,
    pub plan: DisplayPlan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    /// Rule card / countdown shown before play (cognitive flexibility).
    Briefing,
    Displaying,
    AwaitingInput,
    Scoring,
    LevelComplete,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Briefing => "briefing",
            Phase::Displaying => "display",
            Phase::AwaitingInput => "answer",
            Phase::Scoring => "comparison",
            Phase::LevelComplete => "complete",
        }
    }
}

/// Mutable per-round bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct RoundState {
    pub phase: Phase,
    pub started_ms: u64,
    pub digits: Vec<u8>,
    pub selected: BTreeSet<String>,
    pub control: Option<(Control, u64)>,
    pub has_responded: bool,
    epoch_ms: Option<u64>,
    /// Index of the cue currently visible, if any.
    pub visible_cue: Option<usize>,
    /// Latest motion progress in `0.0..=1.0`.
    pub progress: f64,
}

impl RoundState {
    pub fn new(started_ms: u64) -> Self {
        Self {
            started_ms,
            ..Self::default()
        }
    }

    pub fn epoch_ms(&self) -> Option<u64> {
        self.epoch_ms
    }

    /// Set the reaction-time epoch. Only the first call has any effect.
    pub fn mark_epoch(&mut self, at_ms: u64) -> bool {
        if self.epoch_ms.is_some() || self.has_responded {
            return false;
        }
        self.epoch_ms = Some(at_ms);
        true
    }

    pub fn push_digit(&mut self, digit: u8) -> bool {
        if self.has_responded || digit > 9 {
            return false;
        }
        self.digits.push(digit);
        true
    }

    pub fn pop_digit(&mut self) -> Option<u8> {
        if self.has_responded {
            return None;
        }
        self.digits.pop()
    }

    pub fn toggle_item(&mut self, item: &str) -> bool {
        if self.has_responded {
            return false;
        }
        if !self.selected.remove(item) {
            self.selected.insert(item.to_string());
        }
        true
    }

    /// Record the single scored control press. Later presses are ignored.
    pub fn capture_control(&mut self, control: Control, at_ms: u64) -> bool {
        if self.has_responded || self.control.is_some() {
            return false;
        }
        self.control = Some((control, at_ms));
        true
    }

    /// Freeze the state and hand back what the player entered.
    pub fn take_response(&mut self, expected: &Expected) -> Captured {
        self.has_responded = true;
        match expected {
            Expected::Sequence(_) => Captured::Sequence(self.digits.clone()),
            Expected::Items(_) => Captured::Items(self.selected.iter().cloned().collect()),
            Expected::Control(_) | Expected::Withhold => match self.control {
                Some((control, at_ms)) => Captured::Control { control, at_ms },
                None => Captured::Nothing,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_is_set_once() {
        let mut state = RoundState::new(0);
        assert!(state.mark_epoch(120));
        assert!(!state.mark_epoch(300));
        assert_eq!(state.epoch_ms(), Some(120));
    }

    #[test]
    fn input_frozen_after_response() {
        let mut state = RoundState::new(0);
        state.push_digit(3);
        state.push_digit(5);
        assert_eq!(state.pop_digit(), Some(5));

        let captured = state.take_response(&Expected::Sequence(vec![3]));
        assert_eq!(captured, Captured::Sequence(vec![3]));

        assert!(!state.push_digit(7));
        assert_eq!(state.pop_digit(), None);
        assert!(!state.toggle_item("Paris"));
        assert!(!state.capture_control(Control::Up, 10));
        assert!(!state.mark_epoch(10));
        assert_eq!(state.digits, vec![3]);
    }

    #[test]
    fn only_first_control_counts() {
        let mut state = RoundState::new(0);
        assert!(state.capture_control(Control::Left, 50));
        assert!(!state.capture_control(Control::Right, 60));
        assert_eq!(
            state.take_response(&Expected::Control(Control::Left)),
            Captured::Control {
                control: Control::Left,
                at_ms: 50
            }
        );
    }

    #[test]
    fn toggling_items_builds_sorted_selection() {
        let mut state = RoundState::new(0);
        state.toggle_item("Tokyo");
        state.toggle_item("Berlin");
        state.toggle_item("Paris");
        state.toggle_item("Tokyo");
        assert_eq!(
            state.take_response(&Expected::Items(vec![])),
            Captured::Items(vec!["Berlin".into(), "Paris".into()])
        );
    }

    #[test]
    fn digits_outside_range_rejected() {
        let mut state = RoundState::new(0);
        assert!(!state.push_digit(10));
        assert!(state.digits.is_empty());
    }

    #[test]
    fn missing_control_is_nothing() {
        let mut state = RoundState::new(0);
        assert_eq!(state.take_response(&Expected::Withhold), Captured::Nothing);
        assert!(Captured::Nothing.is_nothing());
        assert!(Captured::Sequence(vec![]).is_nothing());
    }
}
