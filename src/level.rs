//! Level tables and level-parameter parsing.
//!
//! Every game selects its per-level parameters from a step table over
//! contiguous level ranges. The tables are ported as-is; the only smooth
//! mapping is the sustained-attention ball speed.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub const TOTAL_LEVELS: u32 = 15;

#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    ValueEnum,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum GameKind {
    VerbalMemory,
    SustainedAttention,
    CognitionFlexibility,
    CorridorMemory,
}

impl GameKind {
    pub const ALL: [GameKind; 4] = [
        GameKind::VerbalMemory,
        GameKind::SustainedAttention,
        GameKind::CognitionFlexibility,
        GameKind::CorridorMemory,
    ];

    pub fn title(self) -> &'static str {
        match self {
            GameKind::VerbalMemory => "Verbal Memory",
            GameKind::SustainedAttention => "Sustained Attention",
            GameKind::CognitionFlexibility => "Cognitive Flexibility",
            GameKind::CorridorMemory => "Corridor Memory",
        }
    }

    pub fn supports_exam(self) -> bool {
        matches!(self, GameKind::VerbalMemory)
    }

    /// Reaction games report an average reaction time alongside the rate.
    pub fn is_timed(self) -> bool {
        matches!(
            self,
            GameKind::SustainedAttention | GameKind::CognitionFlexibility
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelSelector {
    Level(u32),
    Exam,
}

impl LevelSelector {
    /// Numeric level used for table lookups and persistence. Exam sessions
    /// are stored as level 1 like any unnumbered result.
    pub fn number(self) -> u32 {
        match self {
            LevelSelector::Level(n) => n,
            LevelSelector::Exam => 1,
        }
    }

    pub fn is_exam(self) -> bool {
        matches!(self, LevelSelector::Exam)
    }

    pub fn label(self) -> String {
        match self {
            LevelSelector::Level(n) => n.to_string(),
            LevelSelector::Exam => "EXAM".to_string(),
        }
    }

    pub fn next(self) -> Option<LevelSelector> {
        match self {
            LevelSelector::Level(n) if n < TOTAL_LEVELS => Some(LevelSelector::Level(n + 1)),
            _ => None,
        }
    }
}

impl Default for LevelSelector {
    fn default() -> Self {
        LevelSelector::Level(1)
    }
}

/// Parse a raw level parameter. Anything missing, non-numeric or outside
/// `1..=TOTAL_LEVELS` yields level 1; `exam` is only honoured by games that
/// have an exam mode.
pub fn parse_level(game: GameKind, raw: Option<&str>) -> LevelSelector {
    let Some(raw) = raw.map(str::trim) else {
        return LevelSelector::default();
    };

    if raw.eq_ignore_ascii_case("exam") {
        return if game.supports_exam() {
            LevelSelector::Exam
        } else {
            tracing::debug!(%game, "exam mode not available, using level 1");
            LevelSelector::default()
        };
    }

    match raw.parse::<u32>() {
        Ok(n) if (1..=TOTAL_LEVELS).contains(&n) => LevelSelector::Level(n),
        _ => {
            tracing::debug!(raw, "ignoring invalid level parameter");
            LevelSelector::default()
        }
    }
}

struct Band<T> {
    last: u32,
    row: T,
}

fn lookup<T: Copy, const N: usize>(bands: &[Band<T>; N], level: u32) -> T {
    bands
        .iter()
        .find(|band| level <= band.last)
        .unwrap_or(&bands[N - 1])
        .row
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryLevel {
    pub target: usize,
    pub display_ms: u64,
    pub answer_ms: u64,
}

pub const MEMORY_QUESTIONS: usize = 10;
pub const MEMORY_GAP_MS: u64 = 500;
pub const MEMORY_LEAD_IN_MS: u64 = 500;

const MEMORY_BANDS: [Band<MemoryLevel>; 5] = [
    Band {
        last: 4,
        row: MemoryLevel {
            target: 6,
            display_ms: 2000,
            answer_ms: 10_000,
        },
    },
    Band {
        last: 8,
        row: MemoryLevel {
            target: 7,
            display_ms: 1400,
            answer_ms: 10_000,
        },
    },
    Band {
        last: 10,
        row: MemoryLevel {
            target: 8,
            display_ms: 1200,
            answer_ms: 10_000,
        },
    },
    Band {
        last: 13,
        row: MemoryLevel {
            target: 9,
            display_ms: 1000,
            answer_ms: 8000,
        },
    },
    Band {
        last: 15,
        row: MemoryLevel {
            target: 10,
            display_ms: 1000,
            answer_ms: 8000,
        },
    },
];

pub fn memory_level(level: u32) -> MemoryLevel {
    lookup(&MEMORY_BANDS, level)
}

pub fn memory_comparison_ms(level: u32) -> u64 {
    if level <= 10 {
        10_000
    } else {
        8000
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExamStage {
    pub target: usize,
    pub display_ms: u64,
}

pub const EXAM_QUESTIONS_PER_STAGE: usize = 3;
pub const EXAM_ANSWER_MS: u64 = 8000;
pub const EXAM_PAUSE_MS: u64 = 500;

pub const EXAM_STAGES: [ExamStage; 7] = [
    ExamStage { target: 4, display_ms: 1400 },
    ExamStage { target: 5, display_ms: 1300 },
    ExamStage { target: 6, display_ms: 1200 },
    ExamStage { target: 7, display_ms: 1200 },
    ExamStage { target: 8, display_ms: 1200 },
    ExamStage { target: 9, display_ms: 1100 },
    ExamStage { target: 10, display_ms: 1100 },
];

pub const EXAM_QUESTIONS: usize = EXAM_STAGES.len() * EXAM_QUESTIONS_PER_STAGE;

/// Stage for a 1-based exam question number; past the last stage the final
/// stage repeats.
pub fn exam_stage(question: usize) -> ExamStage {
    let idx = question.saturating_sub(1) / EXAM_QUESTIONS_PER_STAGE;
    EXAM_STAGES[idx.min(EXAM_STAGES.len() - 1)]
}

pub const ATTENTION_TRIALS: usize = 10;
pub const ATTENTION_BASE_SPEED: f64 = 75.0;
pub const ATTENTION_MAX_SPEED: f64 = 300.0;

pub fn attention_speed(level: u32) -> f64 {
    let progress = (level.max(1) - 1) as f64 / (TOTAL_LEVELS - 1) as f64;
    ATTENTION_BASE_SPEED + (ATTENTION_MAX_SPEED - ATTENTION_BASE_SPEED) * progress
}

pub const FLEXIBILITY_TRIALS: usize = 15;
/// First round played under the flipped rule. The switch adds a briefing,
/// not a round, so a level still scores all `FLEXIBILITY_TRIALS` rounds.
pub const FLEXIBILITY_RULE_SWITCH_ROUND: usize = 8;
pub const FLEXIBILITY_BRIEFING_MS: u64 = 8000;
pub const FLEXIBILITY_FEEDBACK_MS: u64 = 800;
pub const FLEXIBILITY_INTER_TRIAL_MS: u64 = 500;

const FLEXIBILITY_SPEED_BANDS: [Band<f64>; 4] = [
    Band { last: 3, row: 120.0 },
    Band { last: 6, row: 150.0 },
    Band { last: 10, row: 216.0 },
    Band { last: 15, row: 330.0 },
];

pub fn flexibility_speed(level: u32) -> f64 {
    lookup(&FLEXIBILITY_SPEED_BANDS, level)
}

pub fn distractor_chance(level: u32) -> f64 {
    0.3 + (level as f64 / TOTAL_LEVELS as f64) * 0.3
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorridorLevel {
    pub closed: usize,
    pub cities: usize,
    pub open_cities: usize,
    pub answer_ms: u64,
}

pub const CORRIDOR_QUESTIONS: usize = 10;
pub const CORRIDOR_COUNT: usize = 10;
pub const CORRIDOR_DISPLAY_MS: u64 = 9000;
pub const CORRIDOR_CUE_MS: u64 = 2500;
pub const CORRIDOR_CUE_GAP_MS: u64 = 2000;
pub const CORRIDOR_ANSWER_DELAY_MS: u64 = 500;
pub const CORRIDOR_COMPARISON_MS: u64 = 8000;

const CORRIDOR_BANDS: [Band<CorridorLevel>; 4] = [
    Band {
        last: 5,
        row: CorridorLevel {
            closed: 2,
            cities: 5,
            open_cities: 2,
            answer_ms: 20_000,
        },
    },
    Band {
        last: 9,
        row: CorridorLevel {
            closed: 3,
            cities: 7,
            open_cities: 3,
            answer_ms: 22_000,
        },
    },
    Band {
        last: 13,
        row: CorridorLevel {
            closed: 4,
            cities: 9,
            open_cities: 4,
            answer_ms: 25_000,
        },
    },
    Band {
        last: 15,
        row: CorridorLevel {
            closed: 5,
            cities: 11,
            open_cities: 5,
            answer_ms: 25_000,
        },
    },
];

pub fn corridor_level(level: u32) -> CorridorLevel {
    lookup(&CORRIDOR_BANDS, level)
}

/// Number of scored rounds in one level of `game`.
pub fn rounds_per_level(game: GameKind, level: LevelSelector) -> usize {
    match (game, level) {
        (GameKind::VerbalMemory, LevelSelector::Exam) => EXAM_QUESTIONS,
        (GameKind::VerbalMemory, _) => MEMORY_QUESTIONS,
        (GameKind::SustainedAttention, _) => ATTENTION_TRIALS,
        (GameKind::CognitionFlexibility, _) => FLEXIBILITY_TRIALS,
        (GameKind::CorridorMemory, _) => CORRIDOR_QUESTIONS,
    }
}
