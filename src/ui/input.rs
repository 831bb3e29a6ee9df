//! Threshold prompt and endpoint editor overlays.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, ConfigForm, InputMode};

/// Render whichever input overlay is active.
pub fn render_overlay(frame: &mut Frame, app: &App, area: Rect) {
    match &app.input {
        InputMode::Threshold(text) => render_threshold(frame, app, text, area),
        InputMode::Config(form) => render_config(frame, app, form, area),
        InputMode::Normal => {}
    }
}

fn render_threshold(frame: &mut Frame, app: &App, text: &str, area: Rect) {
    let lines = vec![
        Line::from(format!(" Current: {} L/min", app.monitor.threshold())),
        Line::from(vec![
            Span::raw(" New:     "),
            Span::styled(format!("{}_", text), Style::default().add_modifier(Modifier::BOLD)),
        ]),
    ];

    let block = Block::default()
        .title(" Threshold (L/min) ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let overlay = super::centered(area, 36, 4);
    frame.render_widget(Clear, overlay);
    frame.render_widget(Paragraph::new(lines).block(block), overlay);
}

fn render_config(frame: &mut Frame, app: &App, form: &ConfigForm, area: Rect) {
    let mut lines = Vec::new();
    for (i, (label, value)) in ConfigForm::LABELS.iter().zip(form.fields.iter()).enumerate() {
        let focused = i == form.focused;
        let marker = if focused { "▶" } else { " " };
        lines.push(Line::from(vec![
            Span::styled(format!(" {} {}", marker, label), app.theme.header),
            Span::styled(
                if value.is_empty() { "  (mock)" } else { "" },
                Style::default().add_modifier(Modifier::DIM),
            ),
        ]));
        let value_style = if focused { app.theme.selected } else { Style::default() };
        let cursor = if focused { "_" } else { "" };
        lines.push(Line::from(Span::styled(format!("   {}{}", value, cursor), value_style)));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " Leave a URL empty to use mock data.",
        Style::default().add_modifier(Modifier::DIM),
    )));
    lines.push(Line::from(Span::styled(
        " Tab:field  Enter:apply  Esc:cancel  Ctrl-R:defaults",
        Style::default().add_modifier(Modifier::DIM),
    )));

    let block = Block::default()
        .title(" Endpoint configuration ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let overlay = super::centered(area, 64, 12);
    frame.render_widget(Clear, overlay);
    frame.render_widget(Paragraph::new(lines).block(block), overlay);
}
