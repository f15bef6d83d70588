//! Per-level score aggregation.

use crate::generator::flexibility::Rule;
use crate::level::{self, GameKind, LevelSelector};
use crate::round::{Captured, Expected};
use crate::util;
use crate::validator::Outcome;

/// One scored round, kept for the exam summary and the results screen.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundRecord {
    pub number: usize,
    pub expected: Expected,
    pub captured: Captured,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevelState {
    pub game: GameKind,
    pub level: LevelSelector,
    pub correct: usize,
    pub incorrect: usize,
    /// Reaction times of correct rounds only.
    pub reaction_times: Vec<u64>,
    /// Number of rounds scored so far.
    pub round_index: usize,
    pub rule: Rule,
    pub records: Vec<RoundRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub correct: usize,
    pub incorrect: usize,
    /// In `0.0..=1.0`; zero when nothing was recorded.
    pub success_rate: f64,
    pub avg_reaction_ms: Option<f64>,
    pub reaction_std_dev_ms: Option<f64>,
}

impl Summary {
    pub fn percent(&self) -> u32 {
        (self.success_rate * 100.0).round() as u32
    }

    /// Score string handed to the result store.
    pub fn format_score(&self, game: GameKind) -> String {
        if game.is_timed() {
            let avg = self.avg_reaction_ms.map(f64::round).unwrap_or(0.0) as u64;
            format!("{}% / {}ms", self.percent(), avg)
        } else {
            format!("{}%", self.percent())
        }
    }
}

impl LevelState {
    pub fn new(game: GameKind, level: LevelSelector) -> Self {
        Self {
            game,
            level,
            correct: 0,
            incorrect: 0,
            reaction_times: Vec::new(),
            round_index: 0,
            rule: Rule::for_level(level.number()),
            records: Vec::new(),
        }
    }

    pub fn total_rounds(&self) -> usize {
        level::rounds_per_level(self.game, self.level)
    }

    pub fn record(&mut self, number: usize, expected: Expected, captured: Captured, outcome: Outcome) {
        // A withheld distractor is played but not scored.
        if !outcome.withheld {
            if outcome.correct {
                self.correct += 1;
                if let Some(ms) = outcome.reaction_ms {
                    self.reaction_times.push(ms);
                }
            } else {
                self.incorrect += 1;
            }
        }
        self.round_index += 1;
        self.records.push(RoundRecord {
            number,
            expected,
            captured,
            outcome,
        });
    }

    pub fn is_level_complete(&self) -> bool {
        self.round_index >= self.total_rounds()
    }

    /// Start the level over, optionally on a different level.
    pub fn reset(&mut self, level: LevelSelector) {
        *self = Self::new(self.game, level);
    }

    pub fn summarize(&self) -> Summary {
        let scored = self.correct + self.incorrect;
        let success_rate = match (self.level, scored) {
            // Exam rate is over the fixed question count.
            (LevelSelector::Exam, _) => self.correct as f64 / self.total_rounds() as f64,
            (_, 0) => 0.0,
            (_, n) => self.correct as f64 / n as f64,
        };
        let samples = util::millis_to_f64(&self.reaction_times);
        Summary {
            correct: self.correct,
            incorrect: self.incorrect,
            success_rate,
            avg_reaction_ms: util::mean(samples.iter().copied()),
            reaction_std_dev_ms: util::std_dev(&samples),
        }
    }
}
