//! DashboardApp: the TEA model and the controller state machine.
//!
//! All dashboard state lives here. `update` receives one message at a
//! time and mutates state; the view reads it to build widgets. Every
//! monitor's history is written only from here, on the runner's task.
//!
//! ```text
//! Running ──quit──▶ ShuttingDown ──all probers stopped / grace over──▶ Stopped
//!    ▲  │
//!    └──┘ monitor event / table key
//! ```

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::bus::BusSender;
use crate::config::DashboardConfig;
use crate::monitor::{HostMonitor, LogLine, MonitorEvent};
use crate::prober::ProbeError;

use super::event::DashboardMessage;
use super::render::{render_row, HostRow};
use super::table::HostTable;
use super::theme::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Running,
    ShuttingDown { since: Instant },
    Stopped,
}

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("no hosts to monitor")]
    NoHosts,

    #[error("host '{0}' is monitored twice")]
    DuplicateHost(String),
}

pub struct DashboardApp {
    /// Monitors in display order. Never reordered.
    monitors: Vec<HostMonitor>,
    /// Host identity → position in `monitors`.
    index: HashMap<String, usize>,
    state: ControllerState,
    table: HostTable,
    /// Recent replies and errors (ring buffer).
    log: VecDeque<LogLine>,
    log_capacity: usize,
    theme: Theme,
    grace_period: Duration,
    interval: Duration,
    history: usize,
    /// Set when something visible changed since the last draw.
    dirty: bool,
}

impl DashboardApp {
    pub fn new(monitors: Vec<HostMonitor>, config: &DashboardConfig) -> Result<Self, DashboardError> {
        if monitors.is_empty() {
            return Err(DashboardError::NoHosts);
        }

        let mut index = HashMap::with_capacity(monitors.len());
        for (i, m) in monitors.iter().enumerate() {
            if index.insert(m.identity().to_string(), i).is_some() {
                return Err(DashboardError::DuplicateHost(m.identity().to_string()));
            }
        }

        Ok(Self {
            table: HostTable::new(monitors.len()),
            monitors,
            index,
            state: ControllerState::Running,
            log: VecDeque::with_capacity(config.log_lines),
            log_capacity: config.log_lines,
            theme: config.theme.clone(),
            grace_period: config.grace_period,
            interval: config.interval,
            history: config.history,
            dirty: true,
        })
    }

    /// Start every prober. If one fails, the ones already started are
    /// stopped again and the error is returned.
    pub fn start(&mut self, bus: &BusSender) -> Result<(), ProbeError> {
        for i in 0..self.monitors.len() {
            if let Err(e) = self.monitors[i].start(bus) {
                for started in &mut self.monitors[..i] {
                    started.stop();
                }
                self.state = ControllerState::Stopped;
                return Err(e);
            }
        }
        info!(hosts = self.monitors.len(), "probing started");
        Ok(())
    }

    /// Handle a dashboard message (TEA update).
    pub fn update(&mut self, msg: DashboardMessage) {
        match msg {
            DashboardMessage::Input(key) => {
                if self.state == ControllerState::Running {
                    super::input::handle_key(self, key, Instant::now());
                }
            }
            DashboardMessage::Monitor(event) => self.apply_event(event),
            DashboardMessage::Tick(now) => self.poll_shutdown(now),
            DashboardMessage::Quit => self.begin_shutdown(Instant::now()),
        }
    }

    fn apply_event(&mut self, event: MonitorEvent) {
        if self.state == ControllerState::Stopped {
            return;
        }
        let Some(&i) = self.index.get(&event.host) else {
            warn!(host = %event.host, "event for unknown host");
            return;
        };
        if let Some(line) = self.monitors[i].apply(&event.kind) {
            self.push_log(line);
        }
        self.dirty = true;
    }

    /// Stop every prober and move to `ShuttingDown`. Only the first
    /// call does anything.
    pub fn begin_shutdown(&mut self, now: Instant) {
        if self.state != ControllerState::Running {
            return;
        }
        for monitor in &mut self.monitors {
            monitor.stop();
        }
        self.state = ControllerState::ShuttingDown { since: now };
        self.dirty = true;
        debug!("shutdown requested");
        self.poll_shutdown(now);
    }

    /// Move to `Stopped` once every prober is down or the grace period is over.
    pub fn poll_shutdown(&mut self, now: Instant) {
        let ControllerState::ShuttingDown { since } = self.state else {
            return;
        };
        let all_stopped = self.monitors.iter().all(|m| !m.is_running());
        let grace_over = now.saturating_duration_since(since) >= self.grace_period;
        if all_stopped || grace_over {
            if !all_stopped {
                warn!("grace period elapsed with probers still running");
            }
            self.state = ControllerState::Stopped;
            self.dirty = true;
        }
    }

    fn push_log(&mut self, line: LogLine) {
        self.log.push_back(line);
        if self.log.len() > self.log_capacity {
            self.log.pop_front();
        }
    }

    /// One row per monitor, in display order.
    pub fn rows(&self) -> Vec<HostRow> {
        self.monitors
            .iter()
            .map(|m| render_row(m, &self.theme))
            .collect()
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn is_stopped(&self) -> bool {
        self.state == ControllerState::Stopped
    }

    pub fn monitors(&self) -> &[HostMonitor] {
        &self.monitors
    }

    pub fn log(&self) -> impl DoubleEndedIterator<Item = &LogLine> + ExactSizeIterator {
        self.log.iter()
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn history_len(&self) -> usize {
        self.history
    }

    pub fn table_mut(&mut self) -> &mut HostTable {
        &mut self.table
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Whether a redraw is due; clears the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
