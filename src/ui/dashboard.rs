//! Dashboard view rendering.
//!
//! Shows the current flow with a gauge coloured by zone, session statistics,
//! a trend line over the history buffer and the alert banner.

use std::time::Instant;

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::data::duration::format_duration;
use crate::data::{round_tenth, WarningState, MAX_HISTORY_SIZE};
use crate::monitor::{format_flow, GAUGE_MAX};

/// Render the Dashboard view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let banner_height = if app.alert_visible() { 3 } else { 0 };

    let chunks = Layout::vertical([
        Constraint::Length(banner_height),
        Constraint::Length(3), // Gauge
        Constraint::Length(4), // Stats
        Constraint::Min(3),    // Trend
    ])
    .split(area);

    if app.alert_visible() {
        render_alert(frame, app, chunks[0]);
    }
    render_gauge(frame, app, chunks[1]);
    render_stats(frame, app, chunks[2]);
    render_trend(frame, app, chunks[3]);
}

fn render_alert(frame: &mut Frame, app: &App, area: Rect) {
    let flow = app.monitor.current_flow().map(format_flow).unwrap_or_default();
    let text = Line::from(vec![
        Span::styled(
            " ⚠ POSSIBLE CLOG DETECTED ",
            Style::default().fg(app.theme.critical).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            "flow {} vs threshold {} ({}) │ d:deploy bot  x:dismiss",
            flow,
            format_flow(app.monitor.threshold()),
            app.monitor.policy().direction.label()
        )),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.critical));

    frame.render_widget(Paragraph::new(text).block(block), area);
}

fn render_gauge(frame: &mut Frame, app: &App, area: Rect) {
    let monitor = &app.monitor;
    let style = monitor
        .zone()
        .map(|z| app.theme.zone_style(z))
        .unwrap_or_else(|| Style::default().add_modifier(Modifier::DIM));

    let label = match monitor.current_flow() {
        Some(flow) => format!("{} / {}", format_flow(flow), GAUGE_MAX),
        None => "waiting for data".to_string(),
    };
    let title = match monitor.zone() {
        Some(zone) => format!(" Flow rate [{}] ", zone.symbol()),
        None => " Flow rate ".to_string(),
    };

    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .gauge_style(style)
        .ratio((monitor.gauge_percent() / 100.0).clamp(0.0, 1.0))
        .label(label);

    frame.render_widget(gauge, area);
}

fn render_stats(frame: &mut Frame, app: &App, area: Rect) {
    let monitor = &app.monitor;
    let stats = monitor.display_stats();
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let volume = monitor
        .total_volume()
        .map(|v| format!("{} L", round_tenth(v)))
        .unwrap_or_else(|| "-".to_string());

    let state = match monitor.warning_state() {
        WarningState::PendingWarning => {
            let left = monitor
                .remaining_debounce(Instant::now())
                .map(format_duration)
                .unwrap_or_default();
            Span::styled(
                format!("pending ({} to warning)", left),
                Style::default().fg(app.theme.warning),
            )
        }
        WarningState::Warning => Span::styled(
            "warning",
            Style::default().fg(app.theme.critical).add_modifier(Modifier::BOLD),
        ),
        WarningState::Normal => Span::styled("normal", Style::default().fg(app.theme.healthy)),
    };

    let lines = vec![
        Line::from(vec![
            Span::raw(" Min "),
            Span::styled(stats.min, bold),
            Span::raw("   Avg "),
            Span::styled(stats.average, bold),
            Span::raw("   Max "),
            Span::styled(stats.max, bold),
        ]),
        Line::from(vec![
            Span::raw(" Total volume "),
            Span::styled(volume, bold),
            Span::raw("   State "),
            state,
        ]),
    ];

    let block = Block::default()
        .title(" Statistics ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_trend(frame: &mut Frame, app: &App, area: Rect) {
    let history = app.monitor.history();
    let sparkline = super::render_sparkline(&history.sparkline());

    let text = if sparkline.is_empty() {
        Line::from(Span::styled(
            " collecting readings...",
            Style::default().add_modifier(Modifier::DIM),
        ))
    } else {
        Line::from(vec![Span::raw(" "), Span::styled(sparkline, app.theme.header)])
    };

    let block = Block::default()
        .title(format!(" Trend ({}/{}) ", history.len(), MAX_HISTORY_SIZE))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    frame.render_widget(Paragraph::new(text).block(block).wrap(Wrap { trim: false }), area);
}
