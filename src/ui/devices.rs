//! Devices view rendering.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::app::App;
use crate::data::{BotState, Channel};
use crate::source::extract_hostname;

/// Render the Devices view: one row per channel plus the bot panel.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::vertical([Constraint::Length(6), Constraint::Min(3)]).split(area);

    let header = Row::new(vec!["Channel", "Mode", "Status", "Endpoint"])
        .height(1)
        .style(app.theme.header);

    let endpoints = app.monitor.endpoints();
    let rows: Vec<Row> = app
        .monitor
        .devices()
        .iter()
        .map(|(channel, status)| {
            let mode = if status.using_real_data { "real" } else { "mock" };
            let endpoint = if endpoints.is_configured(channel) {
                extract_hostname(endpoints.url(channel))
            } else {
                "-".to_string()
            };
            Row::new(vec![
                Cell::from(channel.label()),
                Cell::from(mode),
                Cell::from(status.label()).style(app.theme.device_style(status)),
                Cell::from(endpoint),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(2),
        Constraint::Fill(1),
        Constraint::Fill(2),
        Constraint::Fill(3),
    ];

    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .title(" Devices ")
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border)),
    );
    frame.render_widget(table, chunks[0]);

    render_bot(frame, app, chunks[1]);
}

fn render_bot(frame: &mut Frame, app: &App, area: Rect) {
    let state = app.monitor.bot_state();
    let state_style = match state {
        BotState::Deployed => Style::default().fg(app.theme.highlight).add_modifier(Modifier::BOLD),
        BotState::Standby => Style::default(),
    };

    let interface = app.monitor.device(Channel::BotCamera);
    let feed = match state {
        BotState::Standby => "not streaming (docked)".to_string(),
        BotState::Deployed => interface.label().to_lowercase(),
    };

    let action = match state {
        BotState::Standby => "d:deploy",
        BotState::Deployed => "d:return to dock  o:interface",
    };

    let lines = vec![
        Line::from(vec![Span::raw(" State  "), Span::styled(state.label(), state_style)]),
        Line::from(vec![
            Span::raw(" Feed   "),
            Span::styled(feed, app.theme.device_style(interface)),
        ]),
        Line::from(Span::styled(
            format!(" {}", action),
            Style::default().add_modifier(Modifier::DIM),
        )),
    ];

    let block = Block::default()
        .title(" Cleaning bot ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
