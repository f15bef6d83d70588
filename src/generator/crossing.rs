//! Sustained attention: two balls cross a coloured line behind a grey box.
//!
//! The player presses the button matching the line colour at the moment the
//! relevant ball reaches its mark. Geometry is in canvas pixels, y pointing
//! down, and positions are computed analytically from elapsed time.

use rand::Rng;

use super::{RoundContext, RoundGenerator};
use crate::level;
use crate::round::{Activation, Control, DisplayPlan, Expected, RoundSpec, Stimulus};

pub const CANVAS_WIDTH: f64 = 800.0;
pub const CANVAS_HEIGHT: f64 = 600.0;
pub const BALL_RADIUS: f64 = 20.0;
pub const OFFSCREEN_MARGIN: f64 = BALL_RADIUS * 4.0;
pub const MIN_TRIAL_MS: u64 = 1000;
pub const AFTER_PRESS_MS: u64 = 900;
pub const AFTER_MISS_MS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn contains(&self, (x, y): (f64, f64)) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

pub const GRAY_BOX: Rect = Rect {
    x: 200.0,
    y: 150.0,
    width: 400.0,
    height: 300.0,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum LineColor {
    Black,
    Red,
    Yellow,
}

impl LineColor {
    pub fn control(self) -> Control {
        match self {
            LineColor::Black => Control::Black,
            LineColor::Red => Control::Red,
            LineColor::Yellow => Control::Yellow,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallColor {
    Red,
    Yellow,
}

impl BallColor {
    fn matches(self, line: LineColor) -> bool {
        matches!(
            (self, line),
            (BallColor::Red, LineColor::Red) | (BallColor::Yellow, LineColor::Yellow)
        )
    }
}

const LINE_TYPES: [(LineColor, Orientation); 5] = [
    (LineColor::Black, Orientation::Vertical),
    (LineColor::Red, Orientation::Horizontal),
    (LineColor::Red, Orientation::Vertical),
    (LineColor::Yellow, Orientation::Horizontal),
    (LineColor::Yellow, Orientation::Vertical),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ball {
    pub color: BallColor,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
}

impl Ball {
    pub fn position_at(&self, elapsed_ms: f64) -> (f64, f64) {
        let t = elapsed_ms / 1000.0;
        (self.x + self.vx * t, self.y + self.vy * t)
    }

    /// Time for the ball to be strictly beyond the off-screen margin.
    fn exit_ms(&self) -> f64 {
        let dist = if self.vx > 0.0 {
            CANVAS_WIDTH + OFFSCREEN_MARGIN - self.x
        } else if self.vx < 0.0 {
            self.x + OFFSCREEN_MARGIN
        } else if self.vy > 0.0 {
            CANVAS_HEIGHT + OFFSCREEN_MARGIN - self.y
        } else {
            self.y + OFFSCREEN_MARGIN
        };
        let speed = self.vx.abs().max(self.vy.abs());
        if speed > 0.0 {
            dist / speed * 1000.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrossingTrial {
    pub line_color: LineColor,
    pub orientation: Orientation,
    pub balls: [Ball; 2],
    pub speed: f64,
    /// Ideal press time, milliseconds after spawn.
    pub expected_arrival_ms: f64,
}

impl CrossingTrial {
    /// Endpoints of the line drawn across the grey box.
    pub fn line(&self) -> ((f64, f64), (f64, f64)) {
        match self.orientation {
            Orientation::Horizontal => {
                let y = GRAY_BOX.y + GRAY_BOX.height / 2.0;
                ((GRAY_BOX.x, y), (GRAY_BOX.x + GRAY_BOX.width, y))
            }
            Orientation::Vertical => {
                let x = GRAY_BOX.x + GRAY_BOX.width / 2.0;
                ((x, GRAY_BOX.y), (x, GRAY_BOX.y + GRAY_BOX.height))
            }
        }
    }

    /// Balls vanish behind the grey box.
    pub fn is_visible(pos: (f64, f64)) -> bool {
        !GRAY_BOX.contains(pos)
    }

    pub fn duration_ms(&self) -> u64 {
        let exit = self
            .balls
            .iter()
            .map(Ball::exit_ms)
            .fold(0.0_f64, f64::max);
        (exit.ceil() as u64 + 1).max(MIN_TRIAL_MS)
    }
}

pub fn generate_crossing<R: Rng + ?Sized>(level: u32, rng: &mut R) -> CrossingTrial {
    let (line_color, orientation) = LINE_TYPES[rng.gen_range(0..LINE_TYPES.len())];
    let speed = level::attention_speed(level);

    let mut colors = [BallColor::Red, BallColor::Yellow];
    if rng.gen_bool(0.5) {
        colors.reverse();
    }

    let offset = BALL_RADIUS * 2.0;
    let lane = 0.3 + rng.gen::<f64>() * 0.4;

    let balls = match orientation {
        Orientation::Horizontal => {
            let x = GRAY_BOX.x + GRAY_BOX.width * lane;
            [
                Ball {
                    color: colors[0],
                    x,
                    y: -offset,
                    vx: 0.0,
                    vy: speed,
                },
                Ball {
                    color: colors[1],
                    x,
                    y: CANVAS_HEIGHT + offset,
                    vx: 0.0,
                    vy: -speed,
                },
            ]
        }
        Orientation::Vertical => {
            let y = GRAY_BOX.y + GRAY_BOX.height * lane;
            [
                Ball {
                    color: colors[0],
                    x: -offset,
                    y,
                    vx: speed,
                    vy: 0.0,
                },
                Ball {
                    color: colors[1],
                    x: CANVAS_WIDTH + offset,
                    y,
                    vx: -speed,
                    vy: 0.0,
                },
            ]
        }
    };

    let expected_arrival_ms = arrival_ms(line_color, orientation, &balls);

    CrossingTrial {
        line_color,
        orientation,
        balls,
        speed,
        expected_arrival_ms,
    }
}

fn arrival_ms(line: LineColor, orientation: Orientation, balls: &[Ball; 2]) -> f64 {
    let target = if line == LineColor::Black {
        &balls[0]
    } else {
        balls
            .iter()
            .find(|b| b.color.matches(line))
            .unwrap_or(&balls[0])
    };

    match orientation {
        Orientation::Horizontal => {
            let mark = if line == LineColor::Black {
                GRAY_BOX.y + GRAY_BOX.height / 2.0
            } else if target.vy > 0.0 {
                GRAY_BOX.y + GRAY_BOX.height
            } else {
                GRAY_BOX.y
            };
            ((mark - target.y) / target.vy).abs() * 1000.0
        }
        Orientation::Vertical => {
            let mark = GRAY_BOX.x + GRAY_BOX.width / 2.0;
            ((mark - target.x) / target.vx).abs() * 1000.0
        }
    }
}

pub struct CrossingGenerator;

impl RoundGenerator for CrossingGenerator {
    fn generate(&self, ctx: &RoundContext, rng: &mut dyn rand::RngCore) -> RoundSpec {
        let trial = generate_crossing(ctx.level.number(), rng);
        RoundSpec {
            number: ctx.number,
            expected: Expected::Control(trial.line_color.control()),
            plan: DisplayPlan::Motion {
                lead_in_ms: 0,
                duration_ms: trial.duration_ms(),
                activation: Activation::OnSpawn,
            },
            stimulus: Stimulus::Crossing(trial),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn balls_start_off_canvas_and_move_towards_each_other() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let trial = generate_crossing(1, &mut rng);
            let [a, b] = trial.balls;
            assert_ne!(a.color, b.color);
            assert!(a.vx + b.vx == 0.0 && a.vy + b.vy == 0.0);
            match trial.orientation {
                Orientation::Horizontal => {
                    assert_eq!(a.x, b.x);
                    assert!(a.x >= GRAY_BOX.x + GRAY_BOX.width * 0.3 - 1e-9);
                    assert!(a.x <= GRAY_BOX.x + GRAY_BOX.width * 0.7 + 1e-9);
                    assert!(a.y < 0.0 && b.y > CANVAS_HEIGHT);
                }
                Orientation::Vertical => {
                    assert_eq!(a.y, b.y);
                    assert!(a.x < 0.0 && b.x > CANVAS_WIDTH);
                }
            }
        }
    }

    #[test]
    fn black_line_is_always_vertical() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            let trial = generate_crossing(4, &mut rng);
            if trial.line_color == LineColor::Black {
                assert_eq!(trial.orientation, Orientation::Vertical);
            }
        }
    }

    #[test]
    fn black_arrival_is_first_ball_reaching_centre() {
        let balls = [
            Ball {
                color: BallColor::Red,
                x: -40.0,
                y: 300.0,
                vx: 100.0,
                vy: 0.0,
            },
            Ball {
                color: BallColor::Yellow,
                x: 840.0,
                y: 300.0,
                vx: -100.0,
                vy: 0.0,
            },
        ];
        let t = arrival_ms(LineColor::Black, Orientation::Vertical, &balls);
        assert!((t - 4400.0).abs() < 1e-9);
        let t = arrival_ms(LineColor::Yellow, Orientation::Vertical, &balls);
        assert!((t - 4400.0).abs() < 1e-9);
    }

    #[test]
    fn coloured_horizontal_arrival_is_box_exit() {
        let balls = [
            Ball {
                color: BallColor::Yellow,
                x: 400.0,
                y: -40.0,
                vx: 0.0,
                vy: 100.0,
            },
            Ball {
                color: BallColor::Red,
                x: 400.0,
                y: 640.0,
                vx: 0.0,
                vy: -100.0,
            },
        ];
        // yellow falls to the bottom edge at 450
        let t = arrival_ms(LineColor::Yellow, Orientation::Horizontal, &balls);
        assert!((t - 4900.0).abs() < 1e-9);
        // red rises to the top edge at 150
        let t = arrival_ms(LineColor::Red, Orientation::Horizontal, &balls);
        assert!((t - 4900.0).abs() < 1e-9);
    }

    #[test]
    fn duration_covers_full_exit() {
        let mut rng = StdRng::seed_from_u64(9);
        let trial = generate_crossing(15, &mut rng);
        let end = trial.duration_ms() as f64;
        for ball in trial.balls {
            let (x, y) = ball.position_at(end);
            assert!(
                x < -OFFSCREEN_MARGIN
                    || x > CANVAS_WIDTH + OFFSCREEN_MARGIN
                    || y < -OFFSCREEN_MARGIN
                    || y > CANVAS_HEIGHT + OFFSCREEN_MARGIN
            );
        }
        assert!(trial.duration_ms() as f64 > trial.expected_arrival_ms);
    }

    #[test]
    fn balls_hidden_inside_box() {
        assert!(!CrossingTrial::is_visible((400.0, 300.0)));
        assert!(CrossingTrial::is_visible((100.0, 300.0)));
    }
}
