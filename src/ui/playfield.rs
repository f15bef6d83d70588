//! Canvas rendering of the two motion games. Game geometry has y pointing
//! down; the canvas has y pointing up, so everything goes through `flip`.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Color,
    symbols::Marker,
    widgets::{
        canvas::{Canvas, Circle, Line, Rectangle},
        Block, Widget,
    },
};

use crate::generator::crossing::{
    BallColor, CrossingTrial, LineColor, BALL_RADIUS, CANVAS_HEIGHT, CANVAS_WIDTH, GRAY_BOX,
};
use crate::generator::flexibility::{Shape, ShapeColor, ShapeTrial, SHAPE_HALF};

/// Below this opacity a fading shape is no longer drawn.
const MIN_VISIBLE_OPACITY: f64 = 0.15;

fn flip(height: f64, y: f64) -> f64 {
    height - y
}

fn ball_color(color: BallColor) -> Color {
    match color {
        BallColor::Red => Color::Red,
        BallColor::Yellow => Color::Yellow,
    }
}

fn line_color(color: LineColor) -> Color {
    match color {
        LineColor::Black => Color::White,
        LineColor::Red => Color::Red,
        LineColor::Yellow => Color::Yellow,
    }
}

pub fn render_crossing(trial: &CrossingTrial, elapsed_ms: Option<u64>, area: Rect, buf: &mut Buffer) {
    let h = CANVAS_HEIGHT;
    let ((x1, y1), (x2, y2)) = trial.line();
    let balls: Vec<(f64, f64, Color)> = elapsed_ms
        .map(|t| {
            trial
                .balls
                .iter()
                .map(|b| (b.position_at(t as f64), ball_color(b.color)))
                .filter(|(pos, _)| CrossingTrial::is_visible(*pos))
                .map(|((x, y), color)| (x, y, color))
                .collect()
        })
        .unwrap_or_default();

    Canvas::default()
        .block(Block::bordered().title(" sustained attention "))
        .marker(Marker::Braille)
        .x_bounds([0.0, CANVAS_WIDTH])
        .y_bounds([0.0, h])
        .paint(|ctx| {
            ctx.draw(&Rectangle {
                x: GRAY_BOX.x,
                y: flip(h, GRAY_BOX.y + GRAY_BOX.height),
                width: GRAY_BOX.width,
                height: GRAY_BOX.height,
                color: Color::DarkGray,
            });
            ctx.draw(&Line::new(
                x1,
                flip(h, y1),
                x2,
                flip(h, y2),
                line_color(trial.line_color),
            ));
            for (x, y, color) in &balls {
                ctx.draw(&Circle {
                    x: *x,
                    y: flip(h, *y),
                    radius: BALL_RADIUS,
                    color: *color,
                });
            }
        })
        .render(area, buf);
}

pub fn render_shape(trial: &ShapeTrial, elapsed_ms: Option<u64>, area: Rect, buf: &mut Buffer) {
    let field = trial.playfield;
    let h = field.height;
    // Paths start well outside the area; show a margin around it.
    let margin = SHAPE_HALF * 4.0;
    let shape = elapsed_ms.and_then(|t| {
        let (x, y) = trial.position_at(t);
        (trial.opacity_at(t) >= MIN_VISIBLE_OPACITY).then_some((x, y))
    });
    let color = match trial.color {
        ShapeColor::Red => Color::Red,
        ShapeColor::Green => Color::Green,
    };

    Canvas::default()
        .block(Block::bordered().title(" reaction area "))
        .marker(Marker::Braille)
        .x_bounds([-margin, field.width + margin])
        .y_bounds([-margin, h + margin])
        .paint(|ctx| {
            ctx.draw(&Rectangle {
                x: 0.0,
                y: 0.0,
                width: field.width,
                height: h,
                color: Color::Gray,
            });
            if let Some((x, y)) = shape {
                let (cx, cy) = (x + SHAPE_HALF, flip(h, y + SHAPE_HALF));
                match trial.shape {
                    Shape::Circle => ctx.draw(&Circle {
                        x: cx,
                        y: cy,
                        radius: SHAPE_HALF,
                        color,
                    }),
                    Shape::Rectangle => ctx.draw(&Rectangle {
                        x: cx - SHAPE_HALF,
                        y: cy - SHAPE_HALF,
                        width: SHAPE_HALF * 2.0,
                        height: SHAPE_HALF * 2.0,
                        color,
                    }),
                }
            }
        })
        .render(area, buf);
}
