//! Row renderer: one monitor in, one table row out.
//!
//! Pure: reads the monitor's history and a fresh statistics snapshot,
//! mutates nothing. Calling it twice on unchanged input gives the same row.

use crate::history::HistoryRing;
use crate::monitor::HostMonitor;
use crate::prober::Statistics;

use super::dashboard::{format_loss, format_rtt};
use super::theme::Theme;

/// Display strings for one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRow {
    pub latest: String,
    pub host: String,
    pub packets: String,
    pub loss: String,
    pub min_rtt: String,
    pub avg_rtt: String,
    pub max_rtt: String,
    pub std_dev_rtt: String,
    pub history: String,
}

impl HostRow {
    /// Cells in column order.
    pub fn cells(&self) -> [&str; 9] {
        [
            &self.latest,
            &self.host,
            &self.packets,
            &self.loss,
            &self.min_rtt,
            &self.avg_rtt,
            &self.max_rtt,
            &self.std_dev_rtt,
            &self.history,
        ]
    }
}

pub fn render_row(monitor: &HostMonitor, theme: &Theme) -> HostRow {
    let stats = monitor.statistics();
    let history = monitor.history();

    HostRow {
        latest: theme
            .glyph(history.latest_outcome().unwrap_or(false))
            .to_string(),
        host: host_label(&stats),
        packets: format!("{}/{}", stats.packets_recv, stats.packets_sent),
        loss: format_loss(stats.packet_loss()),
        min_rtt: format_rtt(stats.min_rtt),
        avg_rtt: format_rtt(stats.avg_rtt),
        max_rtt: format_rtt(stats.max_rtt),
        std_dev_rtt: format_rtt(stats.std_dev_rtt),
        history: history_strip(history, theme),
    }
}

/// `host`, or `host(address)` when the host was a name.
pub fn host_label(stats: &Statistics) -> String {
    let ip = stats.ip.to_string();
    if stats.addr == ip {
        stats.addr.clone()
    } else {
        format!("{}({ip})", stats.addr)
    }
}

/// One glyph per retained probe, oldest on the left.
pub fn history_strip(history: &HistoryRing, theme: &Theme) -> String {
    history.iter().map(|e| theme.glyph(e.received)).collect()
}
