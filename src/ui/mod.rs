//! Terminal UI rendering using ratatui.
//!
//! Each view lives in its own submodule with a `render` function.
//!
//! ## Submodules
//!
//! - [`dashboard`]: Flow value, gauge, statistics, trend and alert banner
//! - [`devices`]: Per-channel connection and data-mode status, bot state
//! - [`log`]: The most recent readings, newest first
//! - [`input`]: Threshold prompt and endpoint editor overlays
//! - [`common`]: Shared components (header, tabs, status bar, help overlay)
//! - [`theme`]: Light/dark theme support with terminal auto-detection
//!
//! ## Rendering Architecture
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Header (common::render_header)       │
//! ├──────────────────────────────────────┤
//! │ Tabs (common::render_tabs)           │
//! ├──────────────────────────────────────┤
//! │                                      │
//! │ View Content                         │
//! │ (dashboard/devices/log::render)      │
//! │                                      │
//! ├──────────────────────────────────────┤
//! │ Status Bar (common::render_status)   │
//! └──────────────────────────────────────┘
//!         ↑
//!    Overlays rendered on top:
//!    - input::render_overlay
//!    - common::render_help
//! ```

pub mod common;
pub mod dashboard;
pub mod devices;
pub mod input;
pub mod log;
pub mod theme;

pub use theme::Theme;

use ratatui::{
    layout::{Constraint, Layout, Rect},
    Frame,
};

use crate::app::{App, InputMode, View};

/// Minimum terminal size for a usable display.
pub const MIN_WIDTH: u16 = 60;
pub const MIN_HEIGHT: u16 = 16;

/// Sparkline characters (8 levels of height).
pub const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Render a full frame for the current app state.
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        common::render_too_small(frame, area);
        return;
    }

    let chunks = Layout::vertical([
        Constraint::Length(1), // Header bar
        Constraint::Length(1), // Tabs
        Constraint::Min(8),    // Content
        Constraint::Length(1), // Status bar
    ])
    .split(area);

    common::render_header(frame, app, chunks[0]);
    common::render_tabs(frame, app, chunks[1]);

    match app.current_view {
        View::Dashboard => dashboard::render(frame, app, chunks[2]),
        View::Devices => devices::render(frame, app, chunks[2]),
        View::Log => log::render(frame, app, chunks[2]),
    }

    common::render_status_bar(frame, app, chunks[3]);

    if app.input != InputMode::Normal {
        input::render_overlay(frame, app, area);
    }

    if app.show_help {
        common::render_help(frame, app, area);
    }
}

/// Render sparkline levels as block characters.
pub fn render_sparkline(levels: &[u8]) -> String {
    levels
        .iter()
        .map(|&v| SPARKLINE_CHARS[(v as usize).min(SPARKLINE_CHARS.len() - 1)])
        .collect()
}

/// Centered rectangle of at most `width` x `height` inside `area`.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_sparkline() {
        assert_eq!(render_sparkline(&[0, 3, 7, 9]), "▁▄██");
        assert_eq!(render_sparkline(&[]), "");
    }

    #[test]
    fn test_centered_fits_inside() {
        let area = Rect::new(0, 0, 80, 24);
        let r = centered(area, 40, 10);
        assert_eq!(r, Rect::new(20, 7, 40, 10));

        let small = centered(Rect::new(0, 0, 20, 6), 40, 10);
        assert!(small.width <= 16 && small.height <= 4);
    }

    #[test]
    fn test_every_view_renders() {
        use std::time::Instant;

        use ratatui::{backend::TestBackend, Terminal};

        use crate::app::App;
        use crate::data::{Reading, ReadingOrigin, Rounding, ThresholdPolicy};
        use crate::monitor::{Endpoints, FlowMonitor};
        use crate::source::{ManualSource, SourceEvent};

        let (tx, _commands, source) = ManualSource::create("render");
        let monitor = FlowMonitor::new(
            Endpoints::factory_defaults(),
            150.0,
            ThresholdPolicy::immediate(),
            Rounding::OnRecord,
        )
        .unwrap();
        let mut app = App::new(Box::new(source), monitor, Theme::dark());
        for flow in [120.0, 180.0] {
            tx.send(SourceEvent::Sample {
                generation: 0,
                outcome: Ok(Reading::new(flow, Some(3.0), ReadingOrigin::Live)),
            })
            .unwrap();
        }
        app.pump(Instant::now());

        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        for view in [View::Dashboard, View::Devices, View::Log] {
            app.set_view(view);
            terminal.draw(|frame| draw(frame, &app)).unwrap();
        }
        app.open_config();
        app.show_help = true;
        terminal.draw(|frame| draw(frame, &app)).unwrap();

        let mut tiny = Terminal::new(TestBackend::new(20, 5)).unwrap();
        tiny.draw(|frame| draw(frame, &app)).unwrap();
    }
}
