//! The round/phase state machine.
//!
//! A [`PhaseController`] owns one game session: the level state, the active
//! round and every pending timer. It never reads a clock itself; the
//! frontend passes the session time into [`PhaseController::advance`] and
//! the input methods, and timers fire at their own due time so a late tick
//! still produces the exact same timeline.
//!
//! Every round starts by cancelling the whole timer set, so a timer can only
//! ever act on the round it was scheduled for.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::generator::corridor::CITIES;
use crate::generator::crossing::{AFTER_MISS_MS, AFTER_PRESS_MS};
use crate::generator::flexibility::{Playfield, Rule};
use crate::generator::{generator_for, RoundContext, RoundGenerator};
use crate::level::{self, GameKind, LevelSelector};
use crate::round::{
    Activation, Captured, Control, DisplayPlan, Expected, Phase, RoundSpec, RoundState, Stimulus,
};
use crate::score::{LevelState, Summary};
use crate::timer::TimerSet;
use crate::validator::{validate, Outcome};

/// Animation frame period.
pub const FRAME_MS: u64 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    ShowCue(usize),
    HideCue(usize),
    OpenInput,
    InputTimeout,
    StartMotion,
    Frame,
    MotionComplete,
    NextRound,
    EndBriefing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    pub round: usize,
    pub expected: Expected,
    pub captured: Captured,
    pub outcome: Outcome,
}

/// Events for the presentation surface. Drained with
/// [`PhaseController::drain_notifications`].
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    PhaseChanged(Phase),
    RoundStarted(usize),
    CueShown { index: usize, text: String },
    CueHidden(usize),
    ZoneEntered { at_ms: u64 },
    Feedback(Feedback),
    RuleChanged(Rule),
    LevelComplete(Summary),
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Settings {
    pub playfield: Playfield,
    /// Fixed seed for a reproducible session.
    pub seed: Option<u64>,
}

pub struct PhaseController {
    game: GameKind,
    settings: Settings,
    generator: Box<dyn RoundGenerator>,
    rng: StdRng,
    level: LevelState,
    spec: Option<RoundSpec>,
    round: RoundState,
    timers: TimerSet<TimerAction>,
    notifications: Vec<Notification>,
    motion_started_ms: Option<u64>,
    input_deadline_ms: Option<u64>,
    briefing_until_ms: Option<u64>,
    feedback: Option<Feedback>,
    summary: Option<Summary>,
}

impl PhaseController {
    pub fn new(game: GameKind, level: LevelSelector, settings: Settings) -> Self {
        let level = match level {
            LevelSelector::Exam if !game.supports_exam() => LevelSelector::default(),
            other => other,
        };
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            game,
            settings,
            generator: generator_for(game),
            rng,
            level: LevelState::new(game, level),
            spec: None,
            round: RoundState::default(),
            timers: TimerSet::new(),
            notifications: Vec::new(),
            motion_started_ms: None,
            input_deadline_ms: None,
            briefing_until_ms: None,
            feedback: None,
            summary: None,
        }
    }

    pub fn game(&self) -> GameKind {
        self.game
    }

    pub fn phase(&self) -> Phase {
        self.round.phase
    }

    pub fn spec(&self) -> Option<&RoundSpec> {
        self.spec.as_ref()
    }

    pub fn round_state(&self) -> &RoundState {
        &self.round
    }

    pub fn level_state(&self) -> &LevelState {
        &self.level
    }

    pub fn rule(&self) -> Rule {
        self.level.rule
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    pub fn summary(&self) -> Option<&Summary> {
        self.summary.as_ref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Milliseconds since the current motion stimulus spawned.
    pub fn motion_elapsed(&self, now_ms: u64) -> Option<u64> {
        self.motion_started_ms.map(|t| now_ms.saturating_sub(t))
    }

    pub fn input_remaining(&self, now_ms: u64) -> Option<u64> {
        self.input_deadline_ms.map(|t| t.saturating_sub(now_ms))
    }

    pub fn briefing_remaining(&self, now_ms: u64) -> Option<u64> {
        self.briefing_until_ms.map(|t| t.saturating_sub(now_ms))
    }

    /// Earliest pending deadline, for sleeping until something happens.
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_due()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Round tags of all pending timers.
    pub fn pending_timer_rounds(&self) -> Vec<usize> {
        self.timers.rounds().collect()
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Begin the configured level from its first round.
    pub fn start(&mut self, now_ms: u64) {
        self.timers.cancel_all();
        self.level.reset(self.level.level);
        self.spec = None;
        self.feedback = None;
        self.summary = None;
        tracing::info!(
            game = %self.game,
            level = %self.level.level.label(),
            rounds = self.level.total_rounds(),
            "level started"
        );

        if self.game == GameKind::CognitionFlexibility {
            self.brief(now_ms);
        } else {
            self.start_round(now_ms);
        }
    }

    pub fn retry(&mut self, now_ms: u64) {
        tracing::info!(game = %self.game, "retrying level");
        self.start(now_ms);
    }

    /// Move on to the following level. Returns false on the last level or
    /// in exam mode.
    pub fn next_level(&mut self, now_ms: u64) -> bool {
        match self.level.level.next() {
            Some(next) => {
                self.level.reset(next);
                self.start(now_ms);
                true
            }
            None => false,
        }
    }

    /// Leave the session. Nothing scheduled survives.
    pub fn abandon(&mut self) {
        let cancelled = self.timers.cancel_all();
        tracing::info!(game = %self.game, cancelled, "session abandoned");
        self.spec = None;
        self.motion_started_ms = None;
        self.input_deadline_ms = None;
        self.briefing_until_ms = None;
        self.round = RoundState::default();
        self.notifications.push(Notification::PhaseChanged(Phase::Idle));
    }

    /// Fire every timer due at or before `now_ms`, in deadline order.
    pub fn advance(&mut self, now_ms: u64) {
        while let Some(fired) = self.timers.pop_due(now_ms) {
            tracing::trace!(action = ?fired.action, due = fired.due_ms, round = fired.round, "timer");
            self.fire(fired.action, fired.due_ms);
        }
    }

    pub fn push_digit(&mut self, digit: u8) -> bool {
        self.accepts(|e| matches!(e, Expected::Sequence(_))) && self.round.push_digit(digit)
    }

    pub fn pop_digit(&mut self) -> Option<u8> {
        if self.accepts(|e| matches!(e, Expected::Sequence(_))) {
            self.round.pop_digit()
        } else {
            None
        }
    }

    pub fn toggle_item(&mut self, item: &str) -> bool {
        self.accepts(|e| matches!(e, Expected::Items(_)))
            && CITIES.contains(&item)
            && self.round.toggle_item(item)
    }

    /// Hand in the entered sequence or selection before the window closes.
    pub fn submit(&mut self, now_ms: u64) -> bool {
        self.advance(now_ms);
        let reveal = matches!(
            self.spec.as_ref().map(|s| &s.plan),
            Some(DisplayPlan::Reveal { .. })
        );
        if !reveal || self.round.phase != Phase::AwaitingInput || self.round.has_responded {
            return false;
        }
        self.resolve(now_ms);
        true
    }

    /// A control press on a moving stimulus. Only the first press of a
    /// round counts and it resolves the round immediately.
    pub fn press(&mut self, control: Control, now_ms: u64) -> bool {
        self.advance(now_ms);
        let motion = matches!(
            self.spec.as_ref().map(|s| &s.plan),
            Some(DisplayPlan::Motion { .. })
        );
        let live = matches!(self.round.phase, Phase::Displaying | Phase::AwaitingInput);
        if !motion || !live || self.motion_started_ms.is_none() || self.round.has_responded {
            return false;
        }

        self.check_zone(now_ms);
        if !self.round.capture_control(control, now_ms) {
            return false;
        }
        self.resolve(now_ms);
        true
    }

    fn accepts(&self, kind: impl Fn(&Expected) -> bool) -> bool {
        self.round.phase == Phase::AwaitingInput
            && self.spec.as_ref().is_some_and(|s| kind(&s.expected))
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.round.phase != phase {
            tracing::debug!(from = self.round.phase.label(), to = phase.label(), "phase");
            self.round.phase = phase;
            self.notifications.push(Notification::PhaseChanged(phase));
        }
    }

    fn brief(&mut self, now_ms: u64) {
        self.timers.cancel_all();
        self.spec = None;
        self.motion_started_ms = None;
        self.round = RoundState::new(now_ms);
        let until = now_ms + level::FLEXIBILITY_BRIEFING_MS;
        self.briefing_until_ms = Some(until);
        self.timers
            .schedule(until, self.level.round_index + 1, TimerAction::EndBriefing);
        self.set_phase(Phase::Briefing);
    }

    fn start_round(&mut self, now_ms: u64) {
        let cancelled = self.timers.cancel_all();
        if cancelled > 0 {
            tracing::debug!(cancelled, "dropped timers of the previous round");
        }

        let number = self.level.round_index + 1;
        let ctx = RoundContext {
            level: self.level.level,
            number,
            rule: self.level.rule,
            playfield: self.settings.playfield,
        };
        let spec = self.generator.generate(&ctx, &mut self.rng);

        self.round = RoundState::new(now_ms);
        self.motion_started_ms = None;
        self.input_deadline_ms = None;
        self.briefing_until_ms = None;
        self.feedback = None;

        match &spec.plan {
            DisplayPlan::Reveal {
                cues,
                input_opens_ms,
                ..
            } => {
                for (i, cue) in cues.iter().enumerate() {
                    self.timers
                        .schedule(now_ms + cue.at_ms, number, TimerAction::ShowCue(i));
                    self.timers.schedule(
                        now_ms + cue.at_ms + cue.duration_ms,
                        number,
                        TimerAction::HideCue(i),
                    );
                }
                self.timers
                    .schedule(now_ms + input_opens_ms, number, TimerAction::OpenInput);
            }
            DisplayPlan::Motion { lead_in_ms, .. } => {
                self.timers
                    .schedule(now_ms + lead_in_ms, number, TimerAction::StartMotion);
            }
        }

        self.spec = Some(spec);
        self.notifications.push(Notification::RoundStarted(number));
        self.set_phase(Phase::Displaying);
    }

    fn fire(&mut self, action: TimerAction, at_ms: u64) {
        let Some(spec) = self.spec.clone() else {
            match action {
                TimerAction::EndBriefing => self.start_round(at_ms),
                TimerAction::NextRound => self.next_round(at_ms),
                _ => {}
            }
            return;
        };
        let number = spec.number;

        match (action, &spec.plan) {
            (TimerAction::ShowCue(i), DisplayPlan::Reveal { cues, .. }) => {
                if let Some(cue) = cues.get(i) {
                    self.round.visible_cue = Some(i);
                    self.notifications.push(Notification::CueShown {
                        index: i,
                        text: cue.text.clone(),
                    });
                }
            }
            (TimerAction::HideCue(i), _) => {
                if self.round.visible_cue == Some(i) {
                    self.round.visible_cue = None;
                }
                self.notifications.push(Notification::CueHidden(i));
            }
            (
                TimerAction::OpenInput,
                DisplayPlan::Reveal {
                    answer_window_ms, ..
                },
            ) => {
                let deadline = at_ms + answer_window_ms;
                self.input_deadline_ms = Some(deadline);
                self.timers
                    .schedule(deadline, number, TimerAction::InputTimeout);
                self.set_phase(Phase::AwaitingInput);
            }
            (TimerAction::InputTimeout, _) => {
                tracing::debug!(round = number, "answer window closed");
                self.resolve(at_ms);
            }
            (
                TimerAction::StartMotion,
                DisplayPlan::Motion {
                    duration_ms,
                    activation,
                    ..
                },
            ) => {
                self.motion_started_ms = Some(at_ms);
                if *activation == Activation::OnSpawn {
                    self.round.mark_epoch(at_ms);
                    self.set_phase(Phase::AwaitingInput);
                }
                if FRAME_MS < *duration_ms {
                    self.timers
                        .schedule(at_ms + FRAME_MS, number, TimerAction::Frame);
                }
                self.timers
                    .schedule(at_ms + duration_ms, number, TimerAction::MotionComplete);
            }
            (TimerAction::Frame, DisplayPlan::Motion { duration_ms, .. }) => {
                let Some(started) = self.motion_started_ms else {
                    return;
                };
                let elapsed = at_ms.saturating_sub(started);
                self.round.progress = (elapsed as f64 / *duration_ms as f64).min(1.0);
                self.check_zone(at_ms);
                if elapsed + FRAME_MS < *duration_ms {
                    self.timers
                        .schedule(at_ms + FRAME_MS, number, TimerAction::Frame);
                }
            }
            (TimerAction::MotionComplete, _) => {
                self.round.progress = 1.0;
                self.resolve(at_ms);
            }
            (TimerAction::NextRound, _) => self.next_round(at_ms),
            (TimerAction::EndBriefing, _) => self.start_round(at_ms),
            (action, _) => {
                tracing::warn!(?action, round = number, "timer does not apply to this round");
            }
        }
    }

    /// Mark the reaction epoch on the first moment a zone-activated stimulus
    /// is inside the reaction area.
    fn check_zone(&mut self, at_ms: u64) {
        let Some(spec) = self.spec.as_ref() else {
            return;
        };
        let Some(started) = self.motion_started_ms else {
            return;
        };
        let entered = match (&spec.stimulus, &spec.plan) {
            (
                Stimulus::Shape(trial),
                DisplayPlan::Motion {
                    activation: Activation::ZoneEntry,
                    ..
                },
            ) => {
                self.round.epoch_ms().is_none()
                    && trial.in_zone(trial.position_at(at_ms.saturating_sub(started)))
            }
            _ => false,
        };
        if entered && self.round.mark_epoch(at_ms) {
            self.notifications.push(Notification::ZoneEntered { at_ms });
            self.set_phase(Phase::AwaitingInput);
        }
    }

    fn resolve(&mut self, at_ms: u64) {
        let Some(spec) = self.spec.clone() else {
            return;
        };
        if self.round.has_responded {
            return;
        }
        self.timers.cancel_all();
        self.input_deadline_ms = None;

        let captured = self.round.take_response(&spec.expected);
        // A press before the shape reaches the area is timed from its spawn.
        let epoch = match spec.plan {
            DisplayPlan::Motion {
                activation: Activation::ZoneEntry,
                ..
            } => self.round.epoch_ms().or(self.motion_started_ms),
            _ => self.round.epoch_ms(),
        };
        let outcome = validate(&spec, &captured, epoch);
        tracing::debug!(
            round = spec.number,
            correct = outcome.correct,
            reaction_ms = ?outcome.reaction_ms,
            timing_error_ms = ?outcome.timing_error_ms,
            "round scored"
        );

        let pause = self.pause_after(&captured);
        self.level
            .record(spec.number, spec.expected.clone(), captured.clone(), outcome);

        let feedback = Feedback {
            round: spec.number,
            expected: spec.expected.clone(),
            captured,
            outcome,
        };
        self.notifications
            .push(Notification::Feedback(feedback.clone()));
        self.feedback = Some(feedback);
        self.set_phase(Phase::Scoring);
        self.timers
            .schedule(at_ms + pause, spec.number, TimerAction::NextRound);
    }

    fn pause_after(&self, captured: &Captured) -> u64 {
        match self.game {
            GameKind::VerbalMemory => match self.level.level {
                LevelSelector::Exam => level::EXAM_PAUSE_MS,
                LevelSelector::Level(n) => level::memory_comparison_ms(n),
            },
            GameKind::SustainedAttention => {
                if captured.is_nothing() {
                    AFTER_MISS_MS
                } else {
                    AFTER_PRESS_MS
                }
            }
            GameKind::CognitionFlexibility => level::FLEXIBILITY_FEEDBACK_MS,
            GameKind::CorridorMemory => level::CORRIDOR_COMPARISON_MS,
        }
    }

    fn next_round(&mut self, at_ms: u64) {
        if self.level.is_level_complete() {
            self.finish_level();
            return;
        }
        let upcoming = self.level.round_index + 1;
        if self.game == GameKind::CognitionFlexibility
            && upcoming == level::FLEXIBILITY_RULE_SWITCH_ROUND
        {
            self.level.rule = self.level.rule.flipped();
            tracing::info!(rule = self.level.rule.number(), "rule changed");
            self.notifications
                .push(Notification::RuleChanged(self.level.rule));
            self.brief(at_ms);
        } else {
            self.start_round(at_ms);
        }
    }

    fn finish_level(&mut self) {
        self.timers.cancel_all();
        self.spec = None;
        self.motion_started_ms = None;
        let summary = self.level.summarize();
        tracing::info!(
            game = %self.game,
            level = %self.level.level.label(),
            correct = summary.correct,
            incorrect = summary.incorrect,
            score = %summary.format_score(self.game),
            "level complete"
        );
        self.summary = Some(summary);
        self.notifications.push(Notification::LevelComplete(summary));
        self.set_phase(Phase::LevelComplete);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn controller(game: GameKind, level: u32) -> PhaseController {
        PhaseController::new(
            game,
            LevelSelector::Level(level),
            Settings {
                seed: Some(42),
                ..Settings::default()
            },
        )
    }

    fn expected_digits(c: &PhaseController) -> Vec<u8> {
        match c.spec().map(|s| &s.expected) {
            Some(Expected::Sequence(d)) => d.clone(),
            other => panic!("no sequence: {other:?}"),
        }
    }

    fn input_opens(c: &PhaseController) -> u64 {
        match c.spec().map(|s| &s.plan) {
            Some(DisplayPlan::Reveal { input_opens_ms, .. }) => *input_opens_ms,
            other => panic!("no reveal plan: {other:?}"),
        }
    }

    #[test]
    fn sequence_round_runs_display_input_scoring() {
        let mut c = controller(GameKind::VerbalMemory, 1);
        c.start(0);
        assert_eq!(c.phase(), Phase::Displaying);
        assert!(!c.push_digit(1), "input is closed while digits are shown");

        c.advance(500);
        assert_eq!(c.round_state().visible_cue, Some(0));
        c.advance(2500);
        assert_eq!(c.round_state().visible_cue, None);

        let opens = input_opens(&c);
        c.advance(opens);
        assert_eq!(c.phase(), Phase::AwaitingInput);
        assert_eq!(c.input_remaining(opens), Some(10_000));

        for d in expected_digits(&c) {
            assert!(c.push_digit(d));
        }
        assert!(c.submit(opens + 1000));
        assert_eq!(c.phase(), Phase::Scoring);
        assert_eq!(c.level_state().correct, 1);
        assert!(!c.push_digit(3));

        c.advance(opens + 1000 + 10_000);
        assert_eq!(c.phase(), Phase::Displaying);
        assert_eq!(c.spec().map(|s| s.number), Some(2));
    }

    #[test]
    fn answer_window_auto_submits_partial_input() {
        let mut c = controller(GameKind::VerbalMemory, 12);
        c.start(0);
        let opens = input_opens(&c);
        c.advance(opens);
        c.push_digit(1);
        c.advance(opens + 8000);
        assert_eq!(c.phase(), Phase::Scoring);
        assert_eq!(c.level_state().incorrect, 1);
        assert_matches!(
            c.feedback().map(|f| &f.captured),
            Some(Captured::Sequence(d)) if d == &vec![1]
        );
    }

    #[test]
    fn new_round_holds_only_its_own_timers() {
        let mut c = controller(GameKind::CorridorMemory, 3);
        c.start(0);
        assert!(c.pending_timers() > 0);
        assert!(c.pending_timer_rounds().iter().all(|r| *r == 1));

        c.advance(100_000);
        c.advance(200_000);
        let current = c.spec().map(|s| s.number).unwrap_or(0);
        assert!(current > 1);
        assert!(c.pending_timer_rounds().iter().all(|r| *r == current));
    }

    #[test]
    fn retry_mid_round_leaves_no_stale_timers() {
        let mut c = controller(GameKind::VerbalMemory, 1);
        c.start(0);
        c.advance(3000);
        c.retry(3001);
        assert_eq!(c.level_state().round_index, 0);
        assert!(c.pending_timer_rounds().iter().all(|r| *r == 1));
        // The abandoned reveal would have shown cue 1 at 3000 ms on the old clock.
        assert_eq!(c.round_state().visible_cue, None);
        assert_eq!(c.next_deadline(), Some(3001 + level::MEMORY_LEAD_IN_MS));
    }

    #[test]
    fn abandon_cancels_everything() {
        let mut c = controller(GameKind::SustainedAttention, 1);
        c.start(0);
        c.abandon();
        assert_eq!(c.pending_timers(), 0);
        assert_eq!(c.phase(), Phase::Idle);
        c.advance(u64::MAX);
        assert_eq!(c.level_state().round_index, 0);
    }

    #[test]
    fn attention_press_resolves_round() {
        let mut c = controller(GameKind::SustainedAttention, 1);
        c.start(0);
        assert_eq!(c.phase(), Phase::Displaying);
        c.advance(0);
        assert_eq!(c.phase(), Phase::AwaitingInput);
        let expected = match c.spec().map(|s| &s.expected) {
            Some(Expected::Control(ctrl)) => *ctrl,
            other => panic!("{other:?}"),
        };
        assert!(c.press(expected, 1234));
        assert!(!c.press(expected, 1300), "only the first press counts");
        assert_eq!(c.level_state().correct, 1);
        assert_eq!(c.level_state().reaction_times, vec![1234]);
        assert_eq!(c.next_deadline(), Some(1234 + AFTER_PRESS_MS));
    }

    #[test]
    fn attention_miss_is_incorrect_with_short_pause() {
        let mut c = controller(GameKind::SustainedAttention, 1);
        c.start(0);
        let duration = match c.spec().map(|s| &s.plan) {
            Some(DisplayPlan::Motion { duration_ms, .. }) => *duration_ms,
            other => panic!("{other:?}"),
        };
        c.advance(duration);
        assert_eq!(c.phase(), Phase::Scoring);
        assert_eq!(c.level_state().incorrect, 1);
        assert_eq!(c.next_deadline(), Some(duration + AFTER_MISS_MS));
    }

    #[test]
    fn level_completes_after_configured_rounds() {
        let mut c = controller(GameKind::SustainedAttention, 5);
        c.start(0);
        let mut now = 0;
        while c.phase() != Phase::LevelComplete {
            now += 500;
            c.advance(now);
            assert!(now < 10_000_000, "level never completed");
        }
        assert_eq!(c.level_state().round_index, level::ATTENTION_TRIALS);
        assert_eq!(c.pending_timers(), 0);
        let summary = c.summary().copied().expect("summary");
        assert_eq!(summary.correct + summary.incorrect, level::ATTENTION_TRIALS);
        assert!(c
            .drain_notifications()
            .iter()
            .any(|n| matches!(n, Notification::LevelComplete(_))));
    }

    #[test]
    fn untouched_distractors_count_toward_neither_tally() {
        let mut c = PhaseController::new(
            GameKind::CognitionFlexibility,
            LevelSelector::Level(15),
            Settings {
                seed: Some(3),
                ..Settings::default()
            },
        );
        c.start(0);
        let mut now = 0;
        while c.phase() != Phase::LevelComplete {
            now += 100;
            c.advance(now);
            assert!(now < 10_000_000, "level never completed");
        }

        let state = c.level_state();
        let withheld: Vec<_> = state.records.iter().filter(|r| r.outcome.withheld).collect();
        assert!(!withheld.is_empty());
        assert!(withheld.iter().all(|r| r.expected == Expected::Withhold));
        assert_eq!(state.records.len(), level::FLEXIBILITY_TRIALS);
        assert_eq!(state.correct, 0);
        assert_eq!(state.incorrect, level::FLEXIBILITY_TRIALS - withheld.len());
        let summary = c.summary().copied().expect("summary");
        assert_eq!(summary.success_rate, 0.0);
        assert_eq!(summary.format_score(GameKind::CognitionFlexibility), "0% / 0ms");
    }

    #[test]
    fn flexibility_briefs_then_flips_rule_before_round_eight() {
        let mut c = controller(GameKind::CognitionFlexibility, 1);
        c.start(0);
        assert_eq!(c.phase(), Phase::Briefing);
        assert_eq!(c.rule(), Rule::One);
        assert_eq!(c.briefing_remaining(0), Some(level::FLEXIBILITY_BRIEFING_MS));

        let mut now = 0;
        let mut flipped_before = None;
        while c.phase() != Phase::LevelComplete {
            now += 100;
            c.advance(now);
            for n in c.drain_notifications() {
                if let Notification::RuleChanged(rule) = n {
                    flipped_before = Some((c.level_state().round_index, rule));
                }
            }
            assert!(now < 10_000_000);
        }
        assert_eq!(flipped_before, Some((7, Rule::Two)));
        assert_eq!(c.level_state().round_index, level::FLEXIBILITY_TRIALS);
    }

    #[test]
    fn flexibility_press_before_spawn_is_ignored() {
        let mut c = controller(GameKind::CognitionFlexibility, 2);
        c.start(0);
        c.advance(level::FLEXIBILITY_BRIEFING_MS);
        assert_eq!(c.phase(), Phase::Displaying);
        assert!(!c.press(Control::Up, level::FLEXIBILITY_BRIEFING_MS + 100));
        assert!(c.press(
            Control::Up,
            level::FLEXIBILITY_BRIEFING_MS + level::FLEXIBILITY_INTER_TRIAL_MS + 10
        ));
        assert_eq!(c.level_state().round_index, 1);
    }

    #[test]
    fn corridor_toggles_only_known_cities() {
        let mut c = controller(GameKind::CorridorMemory, 1);
        c.start(0);
        let opens = input_opens(&c);
        assert!(!c.toggle_item("Paris"));
        c.advance(opens);
        assert!(c.toggle_item("Paris"));
        assert!(!c.toggle_item("Atlantis"));
        assert!(c.submit(opens + 10));
        assert_eq!(c.level_state().round_index, 1);
    }

    #[test]
    fn next_level_stops_at_the_top() {
        let mut c = controller(GameKind::CorridorMemory, 15);
        assert!(!c.next_level(0));
        let mut c = controller(GameKind::CorridorMemory, 14);
        assert!(c.next_level(0));
        assert_eq!(c.level_state().level, LevelSelector::Level(15));
        assert_eq!(c.phase(), Phase::Displaying);
    }

    #[test]
    fn exam_runs_twenty_one_questions() {
        let mut c = PhaseController::new(
            GameKind::VerbalMemory,
            LevelSelector::Exam,
            Settings {
                seed: Some(7),
                ..Settings::default()
            },
        );
        c.start(0);
        let mut now = 0;
        while c.phase() != Phase::LevelComplete {
            now += 1000;
            c.advance(now);
        }
        assert_eq!(c.level_state().records.len(), level::EXAM_QUESTIONS);
        assert!(!c.next_level(now));
    }

    #[test]
    fn exam_request_for_other_games_falls_back_to_level_one() {
        let c = PhaseController::new(
            GameKind::CorridorMemory,
            LevelSelector::Exam,
            Settings::default(),
        );
        assert_eq!(c.level_state().level, LevelSelector::Level(1));
    }
}
