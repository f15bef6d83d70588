pub mod playfield;
pub mod screen;

use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, AppState, SaveStatus, GRID_ROWS};
use crate::generator::corridor::{CorridorTrial, CITIES, GRID_COLUMNS};
use crate::level::GameKind;
use crate::round::{Captured, DisplayPlan, Expected, Phase, Stimulus};
use crate::score::RoundRecord;
use crate::validator::{Outcome, TimingBucket};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

fn verdict_style(correct: bool) -> Style {
    bold().fg(if correct { Color::Green } else { Color::Red })
}

/// Headline and mark for a judged round.
fn verdict(outcome: &Outcome) -> (&'static str, &'static str, Style) {
    if outcome.withheld {
        ("Not scored", "– ", dim())
    } else if outcome.correct {
        ("Correct", "✓ ", verdict_style(true))
    } else {
        ("Wrong", "✗ ", verdict_style(false))
    }
}

fn seconds(ms: u64) -> String {
    format!("{:.1}s", ms as f64 / 1000.0)
}

fn digits(d: &[u8]) -> String {
    d.iter().map(|n| n.to_string()).join(" ")
}

fn describe_expected(expected: &Expected) -> String {
    match expected {
        Expected::Sequence(d) => digits(d),
        Expected::Control(c) => c.to_string(),
        Expected::Withhold => "no press".to_string(),
        Expected::Items(items) if items.is_empty() => "none".to_string(),
        Expected::Items(items) => items.join(", "),
    }
}

fn describe_captured(captured: &Captured) -> String {
    match captured {
        c if c.is_nothing() => "nothing".to_string(),
        Captured::Sequence(d) => digits(d),
        Captured::Control { control, .. } => control.to_string(),
        Captured::Items(items) => items.join(", "),
        Captured::Nothing => "nothing".to_string(),
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(area);

        self.render_header(chunks[0], buf);
        match self.state {
            AppState::Playing => self.render_body(chunks[1], buf),
            AppState::Results => self.render_results(chunks[1], buf),
        }
        self.render_legend(chunks[2], buf);
    }
}

impl App {
    fn render_header(&self, area: Rect, buf: &mut Buffer) {
        let level = self.controller.level_state();
        let round = (level.round_index + 1).min(level.total_rounds());
        let line = Line::from(vec![
            Span::styled(self.game().title(), bold().fg(Color::Cyan)),
            Span::raw(format!("  level {}", level.level.label())),
            Span::raw(format!("  round {}/{}", round, level.total_rounds())),
            Span::styled(format!("  ✓ {}", level.correct), Style::default().fg(Color::Green)),
            Span::styled(format!("  ✗ {}", level.incorrect), Style::default().fg(Color::Red)),
            Span::styled(format!("  [{}]", self.controller.phase().label()), dim()),
        ]);
        Paragraph::new(line).render(area, buf);
    }

    fn render_legend(&self, area: Rect, buf: &mut Buffer) {
        let legend = match (self.state, self.game()) {
            (AppState::Results, _) => "(r)etry / (n)ext level / (esc)ape",
            (_, GameKind::VerbalMemory) => "0-9 type / backspace / (enter) submit / (esc)ape",
            (_, GameKind::SustainedAttention) => "(r)ed / (b)lack / (y)ellow / (esc)ape",
            (_, GameKind::CognitionFlexibility) => "arrows respond / (esc)ape",
            (_, GameKind::CorridorMemory) => {
                "arrows move / (space) toggle / (enter) submit / (esc)ape"
            }
        };
        // Narrow terminals only get the way out.
        let legend = if legend.width() > area.width as usize {
            "(esc)ape"
        } else {
            legend
        };
        Paragraph::new(Span::styled(legend, Style::default().add_modifier(Modifier::ITALIC)))
            .alignment(Alignment::Center)
            .render(area, buf);
    }

    fn render_body(&self, area: Rect, buf: &mut Buffer) {
        let phase = self.controller.phase();
        if phase == Phase::Briefing {
            return self.render_briefing(area, buf);
        }
        if phase == Phase::Scoring {
            if let Some(lines) = self.feedback_lines() {
                return centered(lines, area, buf);
            }
        }
        let Some(spec) = self.controller.spec() else {
            return;
        };
        match &spec.stimulus {
            Stimulus::Digits(_) => self.render_memory(area, buf),
            Stimulus::Corridors(trial) => self.render_corridor(trial, area, buf),
            Stimulus::Crossing(trial) => {
                let elapsed = self.controller.motion_elapsed(self.now_ms);
                playfield::render_crossing(trial, elapsed, area, buf);
            }
            Stimulus::Shape(trial) => {
                let elapsed = self.controller.motion_elapsed(self.now_ms);
                playfield::render_shape(trial, elapsed, area, buf);
            }
        }
    }

    fn visible_cue_text(&self) -> Option<&str> {
        let index = self.controller.round_state().visible_cue?;
        match &self.controller.spec()?.plan {
            DisplayPlan::Reveal { cues, .. } => cues.get(index).map(|c| c.text.as_str()),
            DisplayPlan::Motion { .. } => None,
        }
    }

    fn countdown_line(&self) -> Line<'static> {
        match self.controller.input_remaining(self.now_ms) {
            Some(ms) => Line::styled(format!("{} left", seconds(ms)), dim()),
            None => Line::raw(""),
        }
    }

    fn render_memory(&self, area: Rect, buf: &mut Buffer) {
        let state = self.controller.round_state();
        let lines = match self.controller.phase() {
            Phase::AwaitingInput => vec![
                Line::raw("Repeat the numbers"),
                Line::raw(""),
                Line::styled(
                    if state.digits.is_empty() {
                        "_".to_string()
                    } else {
                        digits(&state.digits)
                    },
                    bold(),
                ),
                Line::raw(""),
                self.countdown_line(),
            ],
            _ => vec![Line::styled(
                self.visible_cue_text().unwrap_or("").to_string(),
                bold().fg(Color::Yellow),
            )],
        };
        centered(lines, area, buf);
    }

    fn render_corridor(&self, trial: &CorridorTrial, area: Rect, buf: &mut Buffer) {
        if self.controller.phase() == Phase::AwaitingInput {
            return self.render_city_grid(area, buf);
        }
        let state = self.controller.round_state();
        let lines = match state.visible_cue {
            Some(0) => (1..=trial.open.len())
                .map(|c| {
                    let (mark, style) = if trial.is_open(c) {
                        ("open", Style::default().fg(Color::Green))
                    } else {
                        ("closed", bold().fg(Color::Red))
                    };
                    Line::from(vec![
                        Span::raw(format!("{:>2}. Corridor  ", c)),
                        Span::styled(mark, style),
                    ])
                })
                .collect(),
            Some(_) => vec![Line::styled(
                self.visible_cue_text().unwrap_or("").to_string(),
                bold().fg(Color::Yellow),
            )],
            None => vec![Line::styled("Listen...", dim())],
        };
        centered(lines, area, buf);
    }

    fn render_city_grid(&self, area: Rect, buf: &mut Buffer) {
        let selected = &self.controller.round_state().selected;
        let mut lines = vec![
            Line::raw("Which cities are still reachable?"),
            Line::raw(""),
        ];
        for row in 0..GRID_ROWS {
            let spans = (0..GRID_COLUMNS)
                .filter_map(|col| {
                    let index = col * GRID_ROWS + row;
                    let city = CITIES.get(index)?;
                    let mark = if selected.contains(*city) { "✓" } else { "·" };
                    let style = if index == self.cursor {
                        Style::default().add_modifier(Modifier::REVERSED)
                    } else {
                        Style::default()
                    };
                    Some(Span::styled(format!("{mark} {city:<10} "), style))
                })
                .collect::<Vec<_>>();
            lines.push(Line::from(spans));
        }
        lines.push(Line::raw(""));
        lines.push(self.countdown_line());
        Paragraph::new(lines).render(area, buf);
    }

    fn render_briefing(&self, area: Rect, buf: &mut Buffer) {
        let rule = self.controller.rule();
        let mut lines = vec![
            Line::styled(format!("Rule {}", rule.number()), bold().fg(Color::Cyan)),
            Line::raw(""),
        ];
        lines.extend(rule.describe().into_iter().map(Line::raw));
        lines.push(Line::raw(""));
        lines.push(Line::raw("Respond once the shape is inside the area."));
        if let Some(ms) = self.controller.briefing_remaining(self.now_ms) {
            lines.push(Line::styled(format!("starting in {}", seconds(ms)), dim()));
        }
        centered(lines, area, buf);
    }

    fn feedback_lines(&self) -> Option<Vec<Line<'static>>> {
        let feedback = self.controller.feedback()?;
        let (headline, _, style) = verdict(&feedback.outcome);
        let mut lines = vec![
            Line::styled(headline, style),
            Line::raw(""),
            Line::raw(format!("expected: {}", describe_expected(&feedback.expected))),
            Line::raw(format!("yours:    {}", describe_captured(&feedback.captured))),
        ];
        if let Some(ms) = feedback.outcome.reaction_ms {
            lines.push(Line::raw(format!("reaction: {ms}ms")));
        }
        // Timing only matters once the right button was pressed.
        if let Some(bucket) = feedback.outcome.timing().filter(|_| feedback.outcome.correct) {
            let color = match bucket {
                TimingBucket::OnTime => Color::Green,
                TimingBucket::TooEarly | TimingBucket::TooLate => Color::Yellow,
            };
            lines.push(Line::styled(bucket.to_string(), Style::default().fg(color)));
        }
        Some(lines)
    }

    fn render_results(&self, area: Rect, buf: &mut Buffer) {
        let Some(summary) = self.controller.summary() else {
            return;
        };
        let level = self.controller.level_state();
        let mut lines = vec![
            Line::styled(
                format!("{}%", summary.percent()),
                bold().fg(Color::Magenta),
            ),
            Line::raw(format!(
                "{} correct / {} wrong",
                summary.correct, summary.incorrect
            )),
        ];
        if let Some(avg) = summary.avg_reaction_ms {
            let sd = summary.reaction_std_dev_ms.unwrap_or(0.0);
            lines.push(Line::raw(format!("reaction {avg:.0}ms ± {sd:.0}ms")));
        }
        if level.level.is_exam() {
            lines.push(Line::raw(""));
            lines.extend(level.records.iter().map(record_line));
        }
        match &self.save_status {
            Some(SaveStatus::Failed(err)) => {
                lines.push(Line::raw(""));
                lines.push(Line::styled(
                    format!("result not saved: {err}"),
                    bold().fg(Color::Red),
                ));
            }
            Some(SaveStatus::Disabled) => {
                lines.push(Line::styled("saving disabled", dim()));
            }
            _ => {}
        }
        if level.level.next().is_none() {
            lines.push(Line::styled("no further level", dim()));
        }
        centered(lines, area, buf);
    }
}

fn record_line(record: &RoundRecord) -> Line<'static> {
    let (_, mark, style) = verdict(&record.outcome);
    Line::from(vec![
        Span::raw(format!("{:>2}. ", record.number)),
        Span::styled(mark, style),
        Span::raw(describe_expected(&record.expected)),
        Span::styled(format!("  ({})", describe_captured(&record.captured)), dim()),
    ])
}

fn centered(lines: Vec<Line<'static>>, area: Rect, buf: &mut Buffer) {
    let height = (lines.len() as u16).min(area.height);
    let top = area.y + (area.height - height) / 2;
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(Rect::new(area.x, top, area.width, height), buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::level::LevelSelector;
    use crate::round::Control;
    use crate::store::LevelResult;

    fn render(app: &App) -> String {
        let area = Rect::new(0, 0, 80, 24);
        let mut buffer = Buffer::empty(area);
        (&*app).render(area, &mut buffer);
        buffer
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>()
    }

    fn app(game: GameKind, level: LevelSelector) -> App {
        App::new(Config::default(), game, level, Some(11))
    }

    #[test]
    fn header_shows_game_and_round() {
        let mut a = app(GameKind::VerbalMemory, LevelSelector::Level(1));
        a.start(0);
        let rendered = render(&a);
        assert!(rendered.contains("Verbal Memory"));
        assert!(rendered.contains("round 1/10"));
        assert!(rendered.contains("(enter) submit"));
    }

    #[test]
    fn memory_cue_is_drawn_while_visible() {
        let mut a = app(GameKind::VerbalMemory, LevelSelector::Level(1));
        let mut sink: Vec<LevelResult> = Vec::new();
        a.start(0);
        // First digit shows after the lead-in.
        a.on_tick(crate::level::MEMORY_LEAD_IN_MS + 1, &mut sink);
        let digit = a
            .controller
            .round_state()
            .visible_cue
            .and_then(|_| a.visible_cue_text().map(str::to_string))
            .expect("a digit is visible");
        let rendered = render(&a);
        assert!(rendered.contains(&digit));
    }

    #[test]
    fn legend_shrinks_on_narrow_terminals() {
        let mut a = app(GameKind::CorridorMemory, LevelSelector::Level(1));
        a.start(0);
        let area = Rect::new(0, 0, 40, 24);
        let mut buffer = Buffer::empty(area);
        (&a).render(area, &mut buffer);
        let rendered = buffer.content().iter().map(|c| c.symbol()).collect::<String>();
        assert!(rendered.contains("(esc)ape"));
        assert!(!rendered.contains("(space) toggle"));
    }

    #[test]
    fn briefing_shows_rule_card() {
        let mut a = app(GameKind::CognitionFlexibility, LevelSelector::Level(1));
        a.start(0);
        assert_eq!(a.controller.phase(), Phase::Briefing);
        let rendered = render(&a);
        assert!(rendered.contains("Rule 1"));
        assert!(rendered.contains("starting in 8.0s"));
    }

    #[test]
    fn corridor_grid_marks_selection_and_cursor() {
        let mut a = app(GameKind::CorridorMemory, LevelSelector::Level(1));
        let mut sink: Vec<LevelResult> = Vec::new();
        a.start(0);
        let mut now = 0;
        while !a.awaiting_input() {
            now += 500;
            a.on_tick(now, &mut sink);
        }
        a.apply(crate::app::Command::ToggleItem, now, &mut sink);
        let rendered = render(&a);
        assert!(rendered.contains(&format!("✓ {}", CITIES[0])));
        assert!(rendered.contains(&format!("· {}", CITIES[1])));
        assert!(rendered.contains("reachable"));
    }

    #[test]
    fn timing_is_only_shown_for_the_right_button() {
        let bucket_shown = |rendered: &str| {
            ["on time", "too early", "too late"]
                .iter()
                .any(|label| rendered.contains(label))
        };
        let pressed = |right: bool| {
            let mut a = app(GameKind::SustainedAttention, LevelSelector::Level(1));
            let mut sink: Vec<LevelResult> = Vec::new();
            a.start(0);
            a.on_tick(0, &mut sink);
            let expected = match a.controller.spec().map(|s| &s.expected) {
                Some(Expected::Control(control)) => *control,
                other => panic!("unexpected round {other:?}"),
            };
            let control = match (right, expected) {
                (true, c) => c,
                (false, Control::Red) => Control::Yellow,
                (false, _) => Control::Red,
            };
            assert!(a.controller.press(control, 900));
            render(&a)
        };

        let wrong = pressed(false);
        assert!(wrong.contains("Wrong"));
        assert!(!bucket_shown(&wrong));

        let right = pressed(true);
        assert!(right.contains("Correct"));
        assert!(bucket_shown(&right));
    }

    #[test]
    fn results_screen_reports_score_and_legend() {
        let mut a = app(GameKind::SustainedAttention, LevelSelector::Level(1));
        let mut sink: Vec<LevelResult> = Vec::new();
        a.start(0);
        let mut now = 0;
        while a.state == AppState::Playing {
            now += 250;
            a.on_tick(now, &mut sink);
        }
        let rendered = render(&a);
        // Nobody pressed anything.
        assert!(rendered.contains("0%"));
        assert!(rendered.contains("0 correct / 10 wrong"));
        assert!(rendered.contains("(r)etry / (n)ext level / (esc)ape"));
    }
}
