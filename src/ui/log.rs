//! Reading log view.

use std::time::SystemTime;

use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Cell, Row, Table},
    Frame,
};

use crate::app::App;
use crate::data::duration::format_duration;
use crate::data::{ReadingOrigin, Zone};
use crate::monitor::{format_flow, LOG_LENGTH};

/// Render the last readings, newest first.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let header = Row::new(vec!["Age", "Flow", "Zone", "Source"])
        .height(1)
        .style(app.theme.header);

    let now = SystemTime::now();
    let threshold = app.monitor.threshold();
    let direction = app.monitor.policy().direction;

    let rows: Vec<Row> = app
        .monitor
        .recent_log(LOG_LENGTH)
        .into_iter()
        .map(|reading| {
            let age = now
                .duration_since(reading.captured_at)
                .map(|d| format!("{} ago", format_duration(d)))
                .unwrap_or_else(|_| "now".to_string());
            let zone = Zone::classify(reading.flow_rate, threshold, direction);
            let origin = match reading.origin {
                ReadingOrigin::Live => "live",
                ReadingOrigin::Synthetic => "synthetic",
            };
            Row::new(vec![
                Cell::from(age),
                Cell::from(format_flow(reading.flow_rate)),
                Cell::from(zone.symbol()).style(app.theme.zone_style(zone)),
                Cell::from(origin).style(Style::default().add_modifier(Modifier::DIM)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(2),
        Constraint::Fill(2),
        Constraint::Fill(1),
        Constraint::Fill(1),
    ];

    let title = format!(" Last {} readings ", LOG_LENGTH);
    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border)),
    );

    frame.render_widget(table, area);
}
