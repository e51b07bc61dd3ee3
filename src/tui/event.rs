//! Dashboard messages: everything that can drive an update.
//!
//! The runner multiplexes:
//! - crossterm key events (from the input thread)
//! - monitor events (from the event bus)
//! - tick interval (4Hz, shutdown progress)
//!
//! and feeds them one at a time to `DashboardApp::update`.

use std::time::Instant;

use crossterm::event::KeyEvent;

use crate::monitor::MonitorEvent;

#[derive(Debug, Clone)]
pub enum DashboardMessage {
    /// Keyboard input.
    Input(KeyEvent),
    /// A probe lifecycle event from one of the monitors.
    Monitor(MonitorEvent),
    /// Periodic tick.
    Tick(Instant),
    /// Quit without a key press (e.g. input thread gone).
    Quit,
}
