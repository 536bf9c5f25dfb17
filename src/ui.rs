pub mod screen;
pub mod settings;

use anzan::{answer::InputMode, config::Settings, Phase, ScoreResult, Statistics};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::App;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;
const FLASH_PADDING: u16 = 12;
const FLASH_HEIGHT: u16 = 5;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let controller = &self.controller;
        // styles
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // title and accuracy
                Constraint::Min(1),    // flash / prompt / result
                Constraint::Length(1), // settings summary
                Constraint::Length(1), // message
                Constraint::Length(1), // legend
            ])
            .split(area);

        let title = Paragraph::new(Line::from(vec![
            Span::styled("flash anzan", bold_style.fg(Color::Cyan)),
            Span::raw("   "),
            Span::styled(accuracy_text(&controller.statistics()), dim_style),
        ]))
        .alignment(Alignment::Center);
        title.render(chunks[0], buf);

        match (self.flash, controller.phase()) {
            (Some(value), _) => render_flash(value, chunks[1], buf),
            (None, Phase::Revealing) => {
                let ready = Paragraph::new(Span::styled("get ready...", dim_style))
                    .alignment(Alignment::Center);
                ready.render(vertical_center(chunks[1], 1), buf);
            }
            (None, Phase::AwaitingAnswer) => {
                let mut input = self.answer.as_str().to_string();
                input.push('▏');
                let lines = vec![
                    Line::from(Span::styled("Answer?", bold_style)),
                    Line::from(""),
                    Line::from(Span::styled(input, bold_style.fg(Color::Yellow))),
                ];
                let prompt = Paragraph::new(lines).alignment(Alignment::Center);
                prompt.render(vertical_center(chunks[1], 3), buf);
            }
            (None, Phase::Idle) => {
                let lines = match controller.last_result() {
                    Some(result) => result_lines(result),
                    None => vec![Line::from(Span::styled(
                        "press enter to start",
                        italic_style,
                    ))],
                };
                let height = lines.len() as u16;
                let body = Paragraph::new(lines)
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true });
                body.render(vertical_center(chunks[1], height), buf);
            }
        }

        let summary = Paragraph::new(Span::styled(
            settings_summary(controller.settings()),
            Style::default().fg(Color::Gray),
        ))
        .alignment(Alignment::Center);
        summary.render(chunks[2], buf);

        if let Some(message) = &self.message {
            let message = Paragraph::new(Span::styled(
                message.as_str(),
                Style::default().fg(Color::Red),
            ))
            .alignment(Alignment::Center);
            message.render(chunks[3], buf);
        }

        let legend = Paragraph::new(Span::styled(legend_text(self), italic_style));
        legend.render(chunks[4], buf);
    }
}

fn render_flash(value: u128, area: Rect, buf: &mut Buffer) {
    let text = value.to_string();
    let width = (text.width() as u16 + FLASH_PADDING).min(area.width);
    let height = FLASH_HEIGHT.min(area.height);
    let x = area.x + (area.width - width) / 2;
    let y = area.y + (area.height - height) / 2;
    let rect = Rect::new(x, y, width, height);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .style(Style::default().fg(Color::White));
    let inner = block.inner(rect);
    block.render(rect, buf);

    let number = Paragraph::new(Span::styled(
        text,
        Style::default()
            .fg(Color::LightYellow)
            .add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center);
    number.render(vertical_center(inner, 1), buf);
}

/// A `height`-line strip in the vertical middle of `area`
fn vertical_center(area: Rect, height: u16) -> Rect {
    let height = height.min(area.height);
    Rect::new(
        area.x,
        area.y + (area.height - height) / 2,
        area.width,
        height,
    )
}

fn result_lines(result: &ScoreResult) -> Vec<Line<'static>> {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let verdict = if result.correct {
        Span::styled(
            format!("✓ correct!  ({}s)", result.elapsed_secs),
            bold_style.fg(Color::Green),
        )
    } else {
        Span::styled(
            format!(
                "✗ wrong, the answer was {}  ({}s)",
                result.expected_text,
                result.elapsed_secs
            ),
            bold_style.fg(Color::Red),
        )
    };

    vec![
        Line::from(verdict),
        Line::from(""),
        Line::from(Span::styled(
            result.expression.clone(),
            Style::default().fg(Color::Cyan),
        )),
    ]
}

pub fn accuracy_text(stats: &Statistics) -> String {
    match stats.accuracy_percent() {
        Some(pct) => format!("accuracy {pct:.1}% ({}/{})", stats.correct, stats.total),
        None => String::new(),
    }
}

pub fn settings_summary(settings: &Settings) -> String {
    let digits = if settings.min_digits == settings.max_digits {
        format!("{} digit", settings.min_digits)
    } else {
        format!("{}-{} digits", settings.min_digits, settings.max_digits)
    };
    format!(
        "{} terms | {} | {} | {:.1}s | {}",
        settings.term_count,
        digits,
        settings.operator,
        settings.reveal_delay_secs,
        settings.input_mode
    )
}

fn legend_text(app: &App) -> &'static str {
    match app.controller.phase() {
        Phase::Idle => "(enter) start / (s)ettings / (esc) quit",
        Phase::Revealing => "(esc) abort",
        Phase::AwaitingAnswer if !app.is_answering() => "(esc) abort",
        Phase::AwaitingAnswer => match app.answer.mode() {
            InputMode::Keypad => {
                "(0-9 . -) type / (⌫) delete / (del) clear / (enter) check / (esc) abort"
            }
            InputMode::FreeText => {
                "type an answer / (⌫) delete / (del) clear / (enter) check / (esc) abort"
            }
        },
    }
}
