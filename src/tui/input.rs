//! Key binding dispatch for the dashboard.

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::DashboardApp;
use super::table::KeyOutcome;

/// Handle a key event: quit keys stop the dashboard, everything else
/// goes to the host table.
pub fn handle_key(app: &mut DashboardApp, key: KeyEvent, now: Instant) {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.begin_shutdown(now);
            return;
        }
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
            app.begin_shutdown(now);
            return;
        }
        _ => {}
    }

    if app.table_mut().handle_key(key) == KeyOutcome::Handled {
        app.mark_dirty();
    } else {
        tracing::trace!(?key, "unbound key");
    }
}
