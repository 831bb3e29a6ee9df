//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, status bar, and help overlay.

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, InputMode, View};
use crate::data::duration::format_duration;
use crate::data::WarningState;
use crate::monitor::format_flow;

/// Render the header bar: overall status, current flow, threshold, bot state.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let monitor = &app.monitor;

    let status = match monitor.zone() {
        Some(zone) => Span::styled(" ● ", app.theme.zone_style(zone)),
        None => Span::styled(" ○ ", Style::default().add_modifier(Modifier::DIM)),
    };

    let flow = monitor
        .current_flow()
        .map(format_flow)
        .unwrap_or_else(|| "waiting for data".to_string());

    let warning = match monitor.warning_state() {
        WarningState::Warning => Span::styled(
            "WARNING",
            Style::default().fg(app.theme.critical).add_modifier(Modifier::BOLD),
        ),
        WarningState::PendingWarning => {
            Span::styled("pending", Style::default().fg(app.theme.warning))
        }
        WarningState::Normal => Span::styled("normal", Style::default().fg(app.theme.healthy)),
    };

    let line = Line::from(vec![
        status,
        Span::styled("DRAINWATCH ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::raw(flow),
        Span::raw(" │ threshold "),
        Span::styled(
            format_flow(monitor.threshold()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" ({}) │ ", monitor.policy().direction.label())),
        warning,
        Span::raw(" │ bot "),
        Span::raw(monitor.bot_state().label()),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Render the tab bar showing available views.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = vec![
        Line::from(" 1:Dashboard "),
        Line::from(" 2:Devices "),
        Line::from(" 3:Log "),
    ];

    let selected = match app.current_view {
        View::Dashboard => 0,
        View::Devices => 1,
        View::Log => 2,
    };

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Render the status bar at the bottom.
///
/// Temporary status messages take priority over the regular line.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = match app.input {
        InputMode::Threshold(_) => "Type a value | Enter:apply Esc:cancel",
        InputMode::Config(_) => "Tab:next field Enter:apply Esc:cancel",
        InputMode::Normal => "+/-:threshold t:set d:bot c:config x:dismiss ?:help q:quit",
    };

    let updated = match app.monitor.latest() {
        Some(reading) => format!("Updated {} ago", format_duration(reading.instant.elapsed())),
        None => "No data yet".to_string(),
    };

    let mut status = format!(" {} | {} | {}", app.source_description(), updated, controls);
    if let Some(err) = app.monitor.last_error() {
        status = format!(" {}: {} |{}", err.channel.label(), err.error.kind(), status);
    }

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Message shown instead of the UI when the terminal is too small.
pub fn render_too_small(frame: &mut Frame, area: Rect) {
    let msg = format!(
        "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
        area.width,
        area.height,
        super::MIN_WIDTH,
        super::MIN_HEIGHT
    );
    let paragraph = Paragraph::new(msg)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Yellow));
    let centered =
        Rect::new(0, (area.height / 2).saturating_sub(2), area.width, 5.min(area.height));
    frame.render_widget(paragraph, centered);
}

/// Render the help overlay with keyboard shortcuts.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(title, Style::default().add_modifier(Modifier::BOLD))])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Navigation"),
        Line::from("  Tab / ←→    Switch views"),
        Line::from("  1-3         Jump to view"),
        Line::from(""),
        section(" Threshold"),
        Line::from("  + / -       Raise / lower by 5"),
        Line::from("  t           Type a new value"),
        Line::from("  x           Dismiss the alert"),
        Line::from(""),
        section(" Bot & devices"),
        Line::from("  d           Deploy / return bot"),
        Line::from("  o           Show bot interface"),
        Line::from("  c           Edit endpoints"),
        Line::from("              (Ctrl-R, or R on an"),
        Line::from("               empty field: defaults)"),
        Line::from(""),
        section(" General"),
        Line::from("  e           Export to JSON"),
        Line::from("  q           Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);
    let help_area = super::centered(area, 42, 26);

    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
