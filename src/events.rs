use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, InputMode, View, THRESHOLD_STEP};

/// Default export file for the `e` key.
pub const EXPORT_PATH: &str = "drainwatch_export.json";

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    match app.input {
        InputMode::Threshold(_) => {
            handle_threshold_input(app, key);
            return;
        }
        InputMode::Config(_) => {
            handle_config_input(app, key);
            return;
        }
        InputMode::Normal => {}
    }

    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit(),

        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.prev_view();
            } else {
                app.next_view();
            }
        }
        KeyCode::BackTab => app.prev_view(),
        KeyCode::Left | KeyCode::Char('h') => app.prev_view(),
        KeyCode::Right | KeyCode::Char('l') => app.next_view(),

        KeyCode::Char('1') => app.set_view(View::Dashboard),
        KeyCode::Char('2') => app.set_view(View::Devices),
        KeyCode::Char('3') => app.set_view(View::Log),

        // Threshold
        KeyCode::Char('+') | KeyCode::Char('=') => app.adjust_threshold(THRESHOLD_STEP),
        KeyCode::Char('-') => app.adjust_threshold(-THRESHOLD_STEP),
        KeyCode::Char('t') => app.start_threshold_input(),

        // Bot
        KeyCode::Char('d') => app.toggle_bot(),
        KeyCode::Char('o') => app.show_bot_interface(),

        KeyCode::Char('x') | KeyCode::Esc => app.dismiss_alert(),
        KeyCode::Char('c') => app.open_config(),
        KeyCode::Char('?') => app.toggle_help(),

        KeyCode::Char('e') => {
            let export_path = PathBuf::from(EXPORT_PATH);
            match app.export_state(&export_path) {
                Ok(()) => {
                    app.set_status_message(format!("Exported to {}", export_path.display()));
                }
                Err(e) => {
                    app.set_status_message(format!("Export failed: {}", e));
                }
            }
        }

        _ => {}
    }
}

/// Handle key input while typing a threshold
fn handle_threshold_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => return app.commit_threshold(),
        KeyCode::Esc => return app.cancel_input(),
        _ => {}
    }
    let InputMode::Threshold(ref mut text) = app.input else {
        return;
    };
    match key.code {
        KeyCode::Backspace => {
            text.pop();
        }
        KeyCode::Char(c) if c.is_ascii_digit() || c == '.' || c == '-' => text.push(c),
        _ => {}
    }
}

/// Handle key input in the endpoint editor
fn handle_config_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => return app.apply_config(),
        KeyCode::Esc => return app.cancel_input(),
        _ => {}
    }
    let InputMode::Config(ref mut form) = app.input else {
        return;
    };
    match key.code {
        KeyCode::Tab | KeyCode::Down => form.next_field(),
        KeyCode::BackTab | KeyCode::Up => form.prev_field(),
        KeyCode::Backspace => form.pop(),
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => form.clear_field(),
        // Restore the site defaults
        KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            form.restore_defaults()
        }
        KeyCode::Char('R') if form.fields[form.focused].is_empty() => form.restore_defaults(),
        KeyCode::Char(c) => form.push(c),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Rounding, ThresholdPolicy};
    use crate::monitor::{Endpoints, FlowMonitor};
    use crate::source::ManualSource;
    use crate::ui::Theme;

    fn app() -> App {
        let (_tx, _commands, source) = ManualSource::create("keys");
        let monitor = FlowMonitor::new(
            Endpoints::default(),
            150.0,
            ThresholdPolicy::immediate(),
            Rounding::OnRecord,
        )
        .unwrap();
        App::new(Box::new(source), monitor, Theme::dark())
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn test_view_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.current_view, View::Log);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.current_view, View::Dashboard);
    }

    #[test]
    fn test_threshold_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Char('+'));
        assert_eq!(app.monitor.threshold(), 155.0);
        press(&mut app, KeyCode::Char('-'));
        press(&mut app, KeyCode::Char('-'));
        assert_eq!(app.monitor.threshold(), 145.0);

        press(&mut app, KeyCode::Char('t'));
        for c in "80x".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        assert_eq!(app.input, InputMode::Threshold("80".into()));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.monitor.threshold(), 80.0);
    }

    #[test]
    fn test_quit_is_ignored_while_typing() {
        let mut app = app();
        press(&mut app, KeyCode::Char('c'));
        press(&mut app, KeyCode::Char('q'));
        assert!(app.running);

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.input, InputMode::Normal);
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.running);
    }

    #[test]
    fn test_config_defaults_shortcut() {
        let mut app = app();
        press(&mut app, KeyCode::Char('c'));
        press(&mut app, KeyCode::Char('R'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.monitor.endpoints(), &Endpoints::factory_defaults());
    }

    #[test]
    fn test_capital_r_is_text_in_a_filled_field() {
        let mut app = app();
        press(&mut app, KeyCode::Char('c'));
        press(&mut app, KeyCode::Char('h'));
        press(&mut app, KeyCode::Char('R'));
        let InputMode::Config(form) = &app.input else {
            panic!("endpoint editor closed");
        };
        assert_eq!(form.fields[0], "hR");

        handle_key_event(
            &mut app,
            KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL),
        );
        let InputMode::Config(form) = &app.input else {
            panic!("endpoint editor closed");
        };
        assert_eq!(form.fields[0], Endpoints::factory_defaults().flow_url);
    }

    #[test]
    fn test_help_swallows_next_key() {
        let mut app = app();
        press(&mut app, KeyCode::Char('?'));
        assert!(app.show_help);
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.show_help);
        assert!(app.running);
    }
}
