use anzan::config::Settings;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::{App, SettingsField};

/// Pure presenter for a single settings row
pub fn present_row(field: SettingsField, settings: &Settings, selected: bool) -> Row<'static> {
    let marker = if selected { "▶" } else { " " };
    let value = if selected {
        format!("◀ {} ▶", field.value(settings))
    } else {
        field.value(settings)
    };

    let style = if selected {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    Row::new(vec![
        Cell::from(marker),
        Cell::from(field.label()).style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from(value),
    ])
    .style(style)
}

/// Render the Settings screen
pub fn render_settings(app: &mut App, f: &mut Frame) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(0),    // Settings table
            Constraint::Length(1), // Validation message
            Constraint::Length(3), // Instructions
        ])
        .split(area);

    let title = Paragraph::new("Settings")
        .block(Block::default().borders(Borders::ALL).title("anzan"))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let state = &app.settings_state;
    let selected = state.selected % SettingsField::ALL.len();
    let rows: Vec<Row> = SettingsField::ALL
        .iter()
        .enumerate()
        .map(|(i, field)| present_row(*field, &state.draft, i == selected))
        .collect();

    let header = Row::new(vec![Cell::from(""), Cell::from("Setting"), Cell::from("Value")]).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let table = Table::new(
        rows,
        [
            Constraint::Length(2),
            Constraint::Length(14),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(table, chunks[1]);

    if let Some(message) = &app.message {
        let message = Paragraph::new(message.as_str())
            .style(Style::default().fg(Color::Red))
            .alignment(Alignment::Center);
        f.render_widget(message, chunks[2]);
    }

    let instructions = Paragraph::new("(↑/↓) select / (←/→) change / (enter) apply")
        .block(Block::default().borders(Borders::ALL))
        .style(Style::default().add_modifier(Modifier::ITALIC))
        .alignment(Alignment::Center);
    f.render_widget(instructions, chunks[3]);
}
