pub mod charting;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Clear, Dataset, Gauge, GraphType, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::app::App;
use crate::problem::ProblemSource;
use crate::session::{Outcome, SessionSnapshot, Status};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

impl<S: ProblemSource> Widget for &App<S> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let snapshot = self.machine().snapshot();
        match snapshot.status {
            Status::Idle => render_idle(area, buf),
            Status::Complete => render_results(self, &snapshot, area, buf),
            Status::Active | Status::Feedback => render_round(self, &snapshot, area, buf),
            Status::Paused => {
                render_round(self, &snapshot, area, buf);
                render_pause_overlay(area, buf);
            }
        }
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn italic() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

fn render_idle(area: Rect, buf: &mut Buffer) {
    let message = Paragraph::new(Span::styled(
        "press enter to start / (q)uit",
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD | Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });

    let [_, middle, _] = thirds(area);
    message.render(middle, buf);
}

fn render_round<S: ProblemSource>(
    app: &App<S>,
    snapshot: &SessionSnapshot,
    area: Rect,
    buf: &mut Buffer,
) {
    let dim_bold_style = bold().add_modifier(Modifier::DIM);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN.min(area.height / 8))
        .constraints([
            Constraint::Length(1), // header
            Constraint::Length(1), // time bar
            Constraint::Min(1),
            Constraint::Length(2), // challenge
            Constraint::Length(1), // answer / verdict
            Constraint::Length(2), // hint or notice
            Constraint::Min(1),
            Constraint::Length(1), // legend
        ])
        .split(area);

    header_line(app, snapshot).render(chunks[0], buf);

    let ratio = snapshot.time_ratio();
    let bar_color = if ratio > 0.5 {
        Color::Green
    } else if ratio > 0.25 {
        Color::Yellow
    } else {
        Color::Red
    };
    Gauge::default()
        .gauge_style(Style::default().fg(bar_color))
        .ratio(ratio)
        .label(format!("{:.1}s", snapshot.time_remaining.as_secs_f64()))
        .render(chunks[1], buf);

    if let Some(challenge) = app.machine().challenge() {
        Paragraph::new(Span::styled(challenge.to_string(), bold()))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(chunks[3], buf);
    }

    let decided = snapshot.status == Status::Feedback
        || app.machine().revealed_answer().is_some();
    let answer_line = if decided {
        verdict_line(app, snapshot)
    } else {
        Line::from(vec![
            Span::styled("> ", dim_bold_style),
            Span::styled(app.input().to_string(), bold()),
            Span::styled("_", dim_bold_style.add_modifier(Modifier::SLOW_BLINK)),
        ])
    };
    Paragraph::new(answer_line)
        .alignment(Alignment::Center)
        .render(chunks[4], buf);

    let message = match (app.notice(), app.hint_text()) {
        (Some(notice), _) => Some(Span::styled(notice.to_string(), Style::default().fg(Color::Red))),
        (None, Some(hint)) => Some(Span::styled(
            format!("hint: {hint}"),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
        )),
        (None, None) => None,
    };
    if let Some(message) = message {
        Paragraph::new(message)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(chunks[5], buf);
    }

    let legend = if decided {
        "(enter) next / (esc) pause / (ctrl-c) quit"
    } else {
        "(enter) submit / (tab) hint / (esc) pause / (ctrl-c) quit"
    };
    Paragraph::new(Span::styled(legend, italic())).render(chunks[7], buf);
}

fn header_line<S: ProblemSource>(app: &App<S>, snapshot: &SessionSnapshot) -> Paragraph<'static> {
    let rounds = match snapshot.max_rounds {
        Some(max) => format!("{}/{}", snapshot.round_index, max),
        None => snapshot.round_index.to_string(),
    };
    let best = app
        .best()
        .map_or_else(|| "-".to_string(), |b| b.to_string());

    Paragraph::new(Line::from(vec![
        Span::styled(
            format!(
                "{} {}",
                app.machine().source().game_id(),
                app.profile().difficulty
            ),
            Style::default().fg(Color::Magenta),
        ),
        Span::raw(format!("   round {rounds}   ")),
        Span::styled(format!("score {}", snapshot.score), bold()),
        Span::raw(format!(
            "   streak {}   best {}   hints {}",
            snapshot.streak, best, snapshot.hints_remaining
        )),
    ]))
    .alignment(Alignment::Center)
}

fn verdict_line<S: ProblemSource>(app: &App<S>, snapshot: &SessionSnapshot) -> Line<'static> {
    let Some(last) = snapshot.last_round else {
        return Line::default();
    };
    let green_bold_style = bold().fg(Color::Green);
    let red_bold_style = bold().fg(Color::Red);

    match last.outcome {
        Outcome::Correct => Line::from(Span::styled(
            format!("correct  +{}", last.points),
            green_bold_style,
        )),
        Outcome::Incorrect | Outcome::TimedOut => {
            let label = match last.outcome {
                Outcome::TimedOut => "time's up",
                _ => "wrong",
            };
            let mut spans = vec![Span::styled(label.to_string(), red_bold_style)];
            if let Some(answer) = app.machine().revealed_answer() {
                spans.push(Span::raw(format!("  answer: {answer}")));
            }
            if last.points < 0 {
                spans.push(Span::styled(format!("  {}", last.points), red_bold_style));
            }
            Line::from(spans)
        }
    }
}

fn render_pause_overlay(area: Rect, buf: &mut Buffer) {
    const PAUSED: &str = "PAUSED - (esc) resume";
    let width = (PAUSED.width() as u16 + 4).min(area.width);
    let height = 3.min(area.height);
    let popup = Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    );

    Clear.render(popup, buf);
    Paragraph::new(Span::styled(PAUSED, bold().fg(Color::Yellow)))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
        .render(popup, buf);
}

fn render_results<S: ProblemSource>(
    app: &App<S>,
    snapshot: &SessionSnapshot,
    area: Rect,
    buf: &mut Buffer,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),    // chart
            Constraint::Length(1), // stats
            Constraint::Length(1), // outcome breakdown
            Constraint::Length(1), // personal best
            Constraint::Length(1), // padding
            Constraint::Length(1), // legend
        ])
        .split(area);

    let Some(summary) = app.summary() else {
        Paragraph::new(Span::styled(format!("{} pts", snapshot.score), bold()))
            .alignment(Alignment::Center)
            .render(chunks[1], buf);
        return;
    };

    let tuples: Vec<(f64, f64)> = summary.progression.iter().map(|&p| p.into()).collect();
    let (last_round, highest_score) = charting::compute_chart_params(&tuples);
    let datasets = vec![Dataset::default()
        .marker(ratatui::symbols::Marker::Braille)
        .style(Style::default().fg(Color::Magenta))
        .graph_type(GraphType::Line)
        .data(&tuples)];

    Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("round")
                .bounds([0.0, last_round])
                .labels(vec![
                    Span::styled("0", bold()),
                    Span::styled(charting::format_label(last_round), bold()),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("score")
                .bounds([0.0, highest_score])
                .labels(vec![
                    Span::styled("0", bold()),
                    Span::styled(charting::format_label(highest_score), bold()),
                ]),
        )
        .render(chunks[0], buf);

    Paragraph::new(Span::styled(
        format!(
            "{} pts   {}% acc   {} ms avg   best streak {}",
            summary.score, summary.accuracy, summary.mean_response_ms, summary.best_streak
        ),
        bold(),
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        format!(
            "{} correct / {} wrong / {} timed out / {} hints",
            summary.correct, summary.incorrect, summary.timed_out, summary.hints_used
        ),
        Style::default().fg(Color::Gray),
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    let best = match (app.is_new_best(), app.best()) {
        (true, _) => Span::styled(
            "new personal best!",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        (false, Some(best)) => Span::styled(
            format!("personal best: {best}"),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
        ),
        (false, None) => Span::raw(""),
    };
    Paragraph::new(best)
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

    Paragraph::new(Span::styled("(r)estart / (q)uit", italic())).render(chunks[5], buf);
}

fn thirds(area: Rect) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2]]
}
