//! Response validation.
//!
//! Pure functions from a round's precomputed answer and the captured input
//! to a verdict. Nothing here touches timers or level state.

use itertools::Itertools;

use crate::round::{Captured, Expected, RoundSpec, Stimulus};

/// Presses within this many milliseconds of the ideal moment are on time.
pub const ON_TIME_WINDOW_MS: i64 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum TimingBucket {
    #[strum(serialize = "too early")]
    TooEarly,
    #[strum(serialize = "on time")]
    OnTime,
    #[strum(serialize = "too late")]
    TooLate,
}

impl TimingBucket {
    pub fn from_error(error_ms: i64) -> Self {
        if error_ms < -ON_TIME_WINDOW_MS {
            TimingBucket::TooEarly
        } else if error_ms > ON_TIME_WINDOW_MS {
            TimingBucket::TooLate
        } else {
            TimingBucket::OnTime
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Outcome {
    pub correct: bool,
    /// Milliseconds from the reaction epoch to the press.
    pub reaction_ms: Option<u64>,
    /// Press time minus ideal arrival time; feedback only.
    pub timing_error_ms: Option<i64>,
    /// A distractor left alone. Counts toward neither tally.
    pub withheld: bool,
}

impl Outcome {
    pub fn timing(&self) -> Option<TimingBucket> {
        self.timing_error_ms.map(TimingBucket::from_error)
    }
}

/// Sort and deduplicate a set answer so selection order never matters.
pub fn normalize_items<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| s.as_ref().trim().to_string())
        .filter(|s| !s.is_empty())
        .sorted()
        .dedup()
        .collect()
}

/// Judge a captured response against the round's expected answer.
///
/// `epoch_ms` is the reaction-time epoch on the session clock, if the round
/// has one. Timing only feeds the reaction sample and the feedback bucket;
/// it never changes the verdict.
pub fn validate(spec: &RoundSpec, captured: &Captured, epoch_ms: Option<u64>) -> Outcome {
    match (&spec.expected, captured) {
        (Expected::Sequence(expected), Captured::Sequence(entered)) => Outcome {
            correct: expected == entered,
            ..Outcome::default()
        },
        (Expected::Items(expected), Captured::Items(selected)) => Outcome {
            correct: normalize_items(expected) == normalize_items(selected),
            ..Outcome::default()
        },
        (Expected::Control(expected), Captured::Control { control, at_ms }) => {
            let reaction_ms = epoch_ms.map(|epoch| at_ms.saturating_sub(epoch));
            let timing_error_ms = match (&spec.stimulus, reaction_ms) {
                (Stimulus::Crossing(trial), Some(reaction)) => {
                    Some((reaction as f64 - trial.expected_arrival_ms).round() as i64)
                }
                _ => None,
            };
            let correct = control == expected;
            Outcome {
                correct,
                reaction_ms: if correct { reaction_ms } else { None },
                timing_error_ms,
                withheld: false,
            }
        }
        (Expected::Withhold, Captured::Nothing) => Outcome {
            withheld: true,
            ..Outcome::default()
        },
        _ => Outcome::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::crossing::{Ball, BallColor, CrossingTrial, LineColor, Orientation};
    use crate::round::{Activation, Control, DisplayPlan};

    fn spec(expected: Expected, stimulus: Stimulus) -> RoundSpec {
        RoundSpec {
            number: 1,
            stimulus,
            expected,
            plan: DisplayPlan::Motion {
                lead_in_ms: 0,
                duration_ms: 1000,
                activation: Activation::OnSpawn,
            },
        }
    }

    fn sequence(expected: &[u8]) -> RoundSpec {
        spec(
            Expected::Sequence(expected.to_vec()),
            Stimulus::Digits(expected.to_vec()),
        )
    }

    #[test]
    fn sequences_must_match_exactly() {
        let round = sequence(&[3, 5, 7]);
        let check = |entered: &[u8]| {
            validate(&round, &Captured::Sequence(entered.to_vec()), None).correct
        };
        assert!(check(&[3, 5, 7]));
        assert!(!check(&[3, 7, 5]));
        assert!(!check(&[3, 5]));
        assert!(!check(&[3, 5, 7, 9]));
        assert!(!check(&[]));
    }

    #[test]
    fn timeout_without_input_is_incorrect() {
        let round = sequence(&[1, 2]);
        assert!(!validate(&round, &Captured::Nothing, None).correct);

        let control = spec(
            Expected::Control(Control::Up),
            Stimulus::Digits(vec![]),
        );
        assert!(!validate(&control, &Captured::Nothing, Some(0)).correct);
    }

    #[test]
    fn withheld_distractor_is_left_unscored() {
        let round = spec(Expected::Withhold, Stimulus::Digits(vec![]));
        let withheld = validate(&round, &Captured::Nothing, None);
        assert!(withheld.withheld);
        assert!(!withheld.correct);
        assert_eq!(withheld.reaction_ms, None);

        let pressed = Captured::Control {
            control: Control::Left,
            at_ms: 400,
        };
        let out = validate(&round, &pressed, Some(100));
        assert!(!out.correct);
        assert!(!out.withheld);
    }

    #[test]
    fn reaction_time_only_for_correct_press() {
        let round = spec(Expected::Control(Control::Right), Stimulus::Digits(vec![]));
        let right = Captured::Control {
            control: Control::Right,
            at_ms: 1450,
        };
        let out = validate(&round, &right, Some(1000));
        assert!(out.correct);
        assert_eq!(out.reaction_ms, Some(450));

        let wrong = Captured::Control {
            control: Control::Down,
            at_ms: 1450,
        };
        let out = validate(&round, &wrong, Some(1000));
        assert!(!out.correct);
        assert_eq!(out.reaction_ms, None);
    }

    #[test]
    fn timing_error_is_bucketed_but_never_changes_verdict() {
        let ball = Ball {
            color: BallColor::Red,
            x: -40.0,
            y: 300.0,
            vx: 100.0,
            vy: 0.0,
        };
        let trial = CrossingTrial {
            line_color: LineColor::Red,
            orientation: Orientation::Vertical,
            balls: [ball, ball],
            speed: 100.0,
            expected_arrival_ms: 4400.0,
        };
        let round = spec(Expected::Control(Control::Red), Stimulus::Crossing(trial));

        let press = |at_ms| Captured::Control {
            control: Control::Red,
            at_ms,
        };
        let early = validate(&round, &press(3000), Some(0));
        assert!(early.correct);
        assert_eq!(early.timing_error_ms, Some(-1400));
        assert_eq!(early.timing(), Some(TimingBucket::TooEarly));

        let on_time = validate(&round, &press(4550), Some(0));
        assert_eq!(on_time.timing(), Some(TimingBucket::OnTime));

        let late = validate(&round, &press(4601), Some(0));
        assert!(late.correct);
        assert_eq!(late.timing(), Some(TimingBucket::TooLate));

        let wrong_button = Captured::Control {
            control: Control::Yellow,
            at_ms: 4400,
        };
        let out = validate(&round, &wrong_button, Some(0));
        assert!(!out.correct);
        assert_eq!(out.timing(), Some(TimingBucket::OnTime));
    }

    #[test]
    fn item_sets_ignore_order_and_duplicates() {
        let round = spec(
            Expected::Items(vec!["Berlin".into(), "Tokyo".into()]),
            Stimulus::Digits(vec![]),
        );
        let pick = |items: &[&str]| {
            validate(
                &round,
                &Captured::Items(items.iter().map(|s| s.to_string()).collect()),
                None,
            )
            .correct
        };
        assert!(pick(&["Tokyo", "Berlin"]));
        assert!(pick(&["Tokyo", "Berlin", "Tokyo"]));
        assert!(!pick(&["Tokyo"]));
        assert!(!pick(&["Tokyo", "Berlin", "Paris"]));
    }

    #[test]
    fn empty_item_set_matches_empty_expectation() {
        let round = spec(Expected::Items(vec![]), Stimulus::Digits(vec![]));
        assert!(validate(&round, &Captured::Items(vec![]), None).correct);
    }

    #[test]
    fn bucket_boundaries() {
        assert_eq!(TimingBucket::from_error(-200), TimingBucket::OnTime);
        assert_eq!(TimingBucket::from_error(200), TimingBucket::OnTime);
        assert_eq!(TimingBucket::from_error(-201), TimingBucket::TooEarly);
        assert_eq!(TimingBucket::from_error(201), TimingBucket::TooLate);
    }
}
