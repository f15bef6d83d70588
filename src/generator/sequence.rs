//! Digit sequences whose answer is their ascending run.

use rand::Rng;

use super::{RoundContext, RoundGenerator};
use crate::level::{self, LevelSelector, MEMORY_GAP_MS, MEMORY_LEAD_IN_MS};
use crate::round::{Cue, DisplayPlan, Expected, RoundSpec, Stimulus};

pub const MAX_ATTEMPTS: usize = 1000;
/// Extra digits added on top of the target, inclusive range.
pub const NOISE_RANGE: (usize, usize) = (4, 8);
/// Accept a candidate whose run is at most this much longer than the target.
pub const RUN_SLACK: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigitRound {
    pub sequence: Vec<u8>,
    pub answer: Vec<u8>,
    /// Set when the randomized search gave up and the fixed sequence was used.
    pub fallback: bool,
    pub attempts: usize,
}

/// First digit plus every digit strictly greater than the one before it.
pub fn ascending_run(sequence: &[u8]) -> Vec<u8> {
    let Some(&first) = sequence.first() else {
        return Vec::new();
    };
    let mut run = vec![first];
    run.extend(
        sequence
            .windows(2)
            .filter(|w| w[1] > w[0])
            .map(|w| w[1]),
    );
    run
}

/// Incrementing digits wrapping 9 -> 0, padded with zeros to `total`.
///
/// Starts at 1, or at 0 for a ten-digit target so that every digit of the
/// run stays strictly ascending.
pub fn fallback_sequence(target: usize, total: usize) -> (Vec<u8>, Vec<u8>) {
    let mut digit: u8 = if target >= 10 { 0 } else { 1 };
    let mut answer = Vec::with_capacity(target);
    for _ in 0..target {
        answer.push(digit);
        digit = if digit == 9 { 0 } else { digit + 1 };
    }
    let mut sequence = answer.clone();
    sequence.resize(total.max(target), 0);
    (sequence, answer)
}

pub fn generate_digits<R: Rng + ?Sized>(target: usize, rng: &mut R) -> DigitRound {
    let total = target + rng.gen_range(NOISE_RANGE.0..=NOISE_RANGE.1);

    for attempt in 1..=MAX_ATTEMPTS {
        let sequence: Vec<u8> = (0..total).map(|_| rng.gen_range(0..10u8)).collect();
        let mut answer = ascending_run(&sequence);
        if (target..=target + RUN_SLACK).contains(&answer.len()) {
            answer.truncate(target);
            return DigitRound {
                sequence,
                answer,
                fallback: false,
                attempts: attempt,
            };
        }
    }

    tracing::warn!(
        target,
        total,
        attempts = MAX_ATTEMPTS,
        "ascending-run search exhausted, using fallback sequence"
    );
    let (sequence, answer) = fallback_sequence(target, total);
    DigitRound {
        sequence,
        answer,
        fallback: true,
        attempts: MAX_ATTEMPTS,
    }
}

/// Cue timeline for a digit sequence: a short lead-in, then each digit shown
/// for `display_ms` followed by a blank gap.
pub fn reveal_plan(sequence: &[u8], display_ms: u64, answer_ms: u64) -> DisplayPlan {
    let step = display_ms + MEMORY_GAP_MS;
    let cues = sequence
        .iter()
        .enumerate()
        .map(|(i, d)| Cue {
            at_ms: MEMORY_LEAD_IN_MS + i as u64 * step,
            duration_ms: display_ms,
            text: d.to_string(),
        })
        .collect();
    DisplayPlan::Reveal {
        cues,
        input_opens_ms: MEMORY_LEAD_IN_MS + sequence.len() as u64 * step,
        answer_window_ms: answer_ms,
    }
}

pub struct SequenceGenerator;

impl RoundGenerator for SequenceGenerator {
    fn generate(&self, ctx: &RoundContext, rng: &mut dyn rand::RngCore) -> RoundSpec {
        let (target, display_ms, answer_ms) = match ctx.level {
            LevelSelector::Exam => {
                let stage = level::exam_stage(ctx.number);
                (stage.target, stage.display_ms, level::EXAM_ANSWER_MS)
            }
            LevelSelector::Level(n) => {
                let row = level::memory_level(n);
                (row.target, row.display_ms, row.answer_ms)
            }
        };

        let digits = generate_digits(target, rng);
        tracing::debug!(
            round = ctx.number,
            attempts = digits.attempts,
            len = digits.sequence.len(),
            "generated digit sequence"
        );

        RoundSpec {
            number: ctx.number,
            plan: reveal_plan(&digits.sequence, display_ms, answer_ms),
            stimulus: Stimulus::Digits(digits.sequence),
            expected: Expected::Sequence(digits.answer),
        }
    }
}
