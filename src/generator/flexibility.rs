//! Cognitive flexibility: a coloured shape crosses (or only approaches) the
//! reaction area and the player answers with the direction the active rule
//! maps it to.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{RoundContext, RoundGenerator};
use crate::level::{self, FLEXIBILITY_INTER_TRIAL_MS};
use crate::round::{Activation, Control, DisplayPlan, Expected, RoundSpec, Stimulus};

/// Half the drawn shape size; positions are the shape's top-left corner.
pub const SHAPE_HALF: f64 = 25.0;
pub const VALID_OFFSET: f64 = 250.0;
pub const APPROACH_OFFSET: f64 = 300.0;
pub const MISS_OFFSET: f64 = 100.0;
pub const FAKE_APPROACH_SHARE: f64 = 0.6;
/// Fake approaches fade out over the last part of their path.
pub const FADE_FROM: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Playfield {
    pub width: f64,
    pub height: f64,
}

impl Default for Playfield {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 400.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Shape {
    Circle,
    Rectangle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum ShapeColor {
    Red,
    Green,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rule {
    #[default]
    One,
    Two,
}

impl Rule {
    pub fn for_level(level: u32) -> Self {
        if level % 2 == 1 {
            Rule::One
        } else {
            Rule::Two
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Rule::One => Rule::Two,
            Rule::Two => Rule::One,
        }
    }

    pub fn control_for(self, shape: Shape, color: ShapeColor) -> Control {
        use Control::*;
        match (self, shape, color) {
            (Rule::One, Shape::Circle, ShapeColor::Green) => Right,
            (Rule::One, Shape::Circle, ShapeColor::Red) => Left,
            (Rule::One, Shape::Rectangle, ShapeColor::Red) => Up,
            (Rule::One, Shape::Rectangle, ShapeColor::Green) => Down,
            (Rule::Two, Shape::Circle, ShapeColor::Green) => Left,
            (Rule::Two, Shape::Circle, ShapeColor::Red) => Right,
            (Rule::Two, Shape::Rectangle, ShapeColor::Red) => Down,
            (Rule::Two, Shape::Rectangle, ShapeColor::Green) => Up,
        }
    }

    /// Lines for the rule card.
    pub fn describe(self) -> [String; 4] {
        let line = |shape, color| {
            format!(
                "{color} {shape} -> {}",
                self.control_for(shape, color)
            )
        };
        [
            line(Shape::Circle, ShapeColor::Green),
            line(Shape::Circle, ShapeColor::Red),
            line(Shape::Rectangle, ShapeColor::Red),
            line(Shape::Rectangle, ShapeColor::Green),
        ]
    }

    pub fn number(self) -> u8 {
        match self {
            Rule::One => 1,
            Rule::Two => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnKind {
    /// Passes straight through the centre of the reaction area.
    Valid,
    /// Heads for the centre, stops on the boundary and fades out.
    FakeApproach,
    /// Runs parallel to an edge, outside the area.
    Miss,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShapeTrial {
    pub shape: Shape,
    pub color: ShapeColor,
    pub kind: SpawnKind,
    pub start: (f64, f64),
    pub end: (f64, f64),
    pub speed: f64,
    pub playfield: Playfield,
}

impl ShapeTrial {
    pub fn is_distractor(&self) -> bool {
        self.kind != SpawnKind::Valid
    }

    pub fn duration_ms(&self) -> u64 {
        let (dx, dy) = (self.end.0 - self.start.0, self.end.1 - self.start.1);
        let distance = (dx * dx + dy * dy).sqrt();
        (distance / self.speed * 1000.0).round() as u64
    }

    pub fn progress_at(&self, elapsed_ms: u64) -> f64 {
        let total = self.duration_ms();
        if total == 0 {
            return 1.0;
        }
        (elapsed_ms as f64 / total as f64).min(1.0)
    }

    pub fn position_at(&self, elapsed_ms: u64) -> (f64, f64) {
        let p = self.progress_at(elapsed_ms);
        (
            self.start.0 + (self.end.0 - self.start.0) * p,
            self.start.1 + (self.end.1 - self.start.1) * p,
        )
    }

    pub fn opacity_at(&self, elapsed_ms: u64) -> f64 {
        let p = self.progress_at(elapsed_ms);
        if self.kind == SpawnKind::FakeApproach && p > FADE_FROM {
            (1.0 - (p - FADE_FROM) / (1.0 - FADE_FROM)).max(0.0)
        } else {
            1.0
        }
    }

    /// Shape centre strictly inside the reaction area.
    pub fn in_zone(&self, (x, y): (f64, f64)) -> bool {
        let (cx, cy) = (x + SHAPE_HALF, y + SHAPE_HALF);
        cx > 0.0 && cx < self.playfield.width && cy > 0.0 && cy < self.playfield.height
    }
}

fn valid_path(side: usize, field: Playfield) -> ((f64, f64), (f64, f64)) {
    let (w, h) = (field.width, field.height);
    let (cx, cy) = (w / 2.0, h / 2.0);
    match side {
        0 => ((cx, -VALID_OFFSET), (cx, h + VALID_OFFSET)),
        1 => ((-VALID_OFFSET, cy), (w + VALID_OFFSET, cy)),
        2 => ((w + VALID_OFFSET, cy), (-VALID_OFFSET, cy)),
        _ => ((cx, h + VALID_OFFSET), (cx, -VALID_OFFSET)),
    }
}

fn approach_path(side: usize, field: Playfield) -> ((f64, f64), (f64, f64)) {
    let (w, h) = (field.width, field.height);
    let (cx, cy) = (w / 2.0, h / 2.0);
    match side {
        0 => ((cx, -APPROACH_OFFSET), (cx, 0.0)),
        1 => ((w + APPROACH_OFFSET, cy), (w, cy)),
        2 => ((cx, h + APPROACH_OFFSET), (cx, h)),
        _ => ((-APPROACH_OFFSET, cy), (0.0, cy)),
    }
}

fn miss_path(side: usize, field: Playfield) -> ((f64, f64), (f64, f64)) {
    let (w, h) = (field.width, field.height);
    let m = MISS_OFFSET;
    match side {
        0 => ((-m, -m), (w + m, -m)),
        1 => ((w + m, -m), (w + m, h + m)),
        2 => ((w + m, h + m), (-m, h + m)),
        _ => ((-m, h + m), (-m, -m)),
    }
}

pub fn generate_shape<R: Rng + ?Sized>(level: u32, playfield: Playfield, rng: &mut R) -> ShapeTrial {
    let shape = if rng.gen_bool(0.5) {
        Shape::Circle
    } else {
        Shape::Rectangle
    };
    let color = if rng.gen_bool(0.5) {
        ShapeColor::Red
    } else {
        ShapeColor::Green
    };

    let kind = if rng.gen_bool(level::distractor_chance(level).clamp(0.0, 1.0)) {
        if rng.gen_bool(FAKE_APPROACH_SHARE) {
            SpawnKind::FakeApproach
        } else {
            SpawnKind::Miss
        }
    } else {
        SpawnKind::Valid
    };

    let side = rng.gen_range(0..4);
    let (start, end) = match kind {
        SpawnKind::Valid => valid_path(side, playfield),
        SpawnKind::FakeApproach => approach_path(side, playfield),
        SpawnKind::Miss => miss_path(side, playfield),
    };

    ShapeTrial {
        shape,
        color,
        kind,
        start,
        end,
        speed: level::flexibility_speed(level),
        playfield,
    }
}

pub struct FlexibilityGenerator;

impl RoundGenerator for FlexibilityGenerator {
    fn generate(&self, ctx: &RoundContext, rng: &mut dyn rand::RngCore) -> RoundSpec {
        let trial = generate_shape(ctx.level.number(), ctx.playfield, rng);
        let (expected, activation) = if trial.is_distractor() {
            (Expected::Withhold, Activation::Never)
        } else {
            (
                Expected::Control(ctx.rule.control_for(trial.shape, trial.color)),
                Activation::ZoneEntry,
            )
        };
        tracing::debug!(
            round = ctx.number,
            kind = ?trial.kind,
            shape = %trial.shape,
            color = %trial.color,
            "generated shape trial"
        );
        RoundSpec {
            number: ctx.number,
            expected,
            plan: DisplayPlan::Motion {
                lead_in_ms: FLEXIBILITY_INTER_TRIAL_MS,
                duration_ms: trial.duration_ms(),
                activation,
            },
            stimulus: Stimulus::Shape(trial),
        }
    }
}

#[cfg(test)]
impl ShapeTrial {
    /// First elapsed millisecond at which a valid shape is in the zone.
    fn zone_entry_ms(&self) -> Option<u64> {
        if self.is_distractor() {
            return None;
        }
        (0..=self.duration_ms()).find(|t| self.in_zone(self.position_at(*t)))
    }
}
