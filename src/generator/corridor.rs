//! Corridor memory: remember which corridors are closed, then pick out the
//! cities announced on open ones.

use itertools::Itertools;
use rand::seq::{index, SliceRandom};
use rand::Rng;

use super::{RoundContext, RoundGenerator};
use crate::level::{self, CorridorLevel, CORRIDOR_COUNT};
use crate::round::{Cue, DisplayPlan, Expected, RoundSpec, Stimulus};

/// Answer grid, alphabetical, laid out in five columns of thirteen.
pub const CITIES: [&str; 65] = [
    "Amsterdam", "Ankara", "Ashgabat", "Baghdad", "Bahrain", "Baku", "Bangkok",
    "Basel", "Batumi", "Beirut", "Belgrade", "Berlin", "Bilbao",
    "Bishkek", "Bologna", "Bombay", "Boston", "Bremen", "Budapest", "Dallas",
    "Delhi", "Doha", "Dubai", "Dublin", "Hamburg", "Havana",
    "Houston", "Kathmandu", "Kiev", "Lagos", "Lisbon", "London", "Lyon",
    "Madrid", "Malaga", "Malta", "Manchester", "Melbourne", "Miami",
    "Milan", "Montreal", "Moscow", "Munich", "Paris", "Phuket", "Porto",
    "Prague", "Riyadh", "Rotterdam", "Salzburg", "Santiago", "Shanghai",
    "Singapore", "Stockholm", "Stuttgart", "Sydney", "Tashkent", "Tokyo", "Toronto",
    "Tunis", "Valencia", "Venice", "Vienna", "Zagreb", "Zurich",
];

pub const GRID_COLUMNS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub city: &'static str,
    /// 1-based corridor number.
    pub corridor: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorridorTrial {
    /// `open[i]` is corridor `i + 1`.
    pub open: Vec<bool>,
    pub assignments: Vec<Assignment>,
}

impl CorridorTrial {
    pub fn is_open(&self, corridor: usize) -> bool {
        corridor
            .checked_sub(1)
            .and_then(|i| self.open.get(i))
            .copied()
            .unwrap_or(false)
    }

    pub fn closed(&self) -> Vec<usize> {
        (1..=self.open.len()).filter(|c| !self.is_open(*c)).collect()
    }

    pub fn expected_cities(&self) -> Vec<String> {
        self.assignments
            .iter()
            .filter(|a| self.is_open(a.corridor))
            .map(|a| a.city.to_string())
            .sorted()
            .collect()
    }
}

pub fn generate_corridors<R: Rng + ?Sized>(row: CorridorLevel, rng: &mut R) -> CorridorTrial {
    let mut open = vec![true; CORRIDOR_COUNT];
    for idx in index::sample(rng, CORRIDOR_COUNT, row.closed.min(CORRIDOR_COUNT)) {
        open[idx] = false;
    }

    let assignments = CITIES
        .choose_multiple(rng, row.cities.min(CITIES.len()))
        .map(|&city| Assignment {
            city,
            corridor: rng.gen_range(1..=CORRIDOR_COUNT),
        })
        .collect::<Vec<_>>();

    CorridorTrial { open, assignments }
}

pub fn announcement(a: &Assignment) -> String {
    format!("To {}, on Corridor {}", a.city, a.corridor)
}

/// Cue 0 is the corridor board; one announcement per city follows.
pub fn reveal_plan(trial: &CorridorTrial, answer_ms: u64) -> DisplayPlan {
    let step = level::CORRIDOR_CUE_MS + level::CORRIDOR_CUE_GAP_MS;
    let board = Cue {
        at_ms: 0,
        duration_ms: level::CORRIDOR_DISPLAY_MS,
        text: String::from("corridors"),
    };
    let announcements = trial.assignments.iter().enumerate().map(|(i, a)| Cue {
        at_ms: level::CORRIDOR_DISPLAY_MS + i as u64 * step,
        duration_ms: level::CORRIDOR_CUE_MS,
        text: announcement(a),
    });
    DisplayPlan::Reveal {
        cues: std::iter::once(board).chain(announcements).collect(),
        input_opens_ms: level::CORRIDOR_DISPLAY_MS
            + trial.assignments.len() as u64 * step
            + level::CORRIDOR_ANSWER_DELAY_MS,
        answer_window_ms: answer_ms,
    }
}

pub struct CorridorGenerator;

impl RoundGenerator for CorridorGenerator {
    fn generate(&self, ctx: &RoundContext, rng: &mut dyn rand::RngCore) -> RoundSpec {
        let row = level::corridor_level(ctx.level.number());
        let trial = generate_corridors(row, rng);
        let expected = trial.expected_cities();
        tracing::debug!(
            round = ctx.number,
            closed = ?trial.closed(),
            open_cities = expected.len(),
            "generated corridor trial"
        );
        RoundSpec {
            number: ctx.number,
            plan: reveal_plan(&trial, row.answer_ms),
            expected: Expected::Items(expected),
            stimulus: Stimulus::Corridors(trial),
        }
    }
}
