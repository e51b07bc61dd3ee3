//! Host monitor: one prober, one history ring, one row on screen.
//!
//! The monitor turns its prober's callbacks into [`MonitorEvent`]s on the
//! event bus. It does not touch its own history from the callbacks: the
//! dashboard applies each event on its own thread via [`HostMonitor::apply`],
//! so the ring has a single writer and needs no lock.

use std::collections::HashSet;
use std::net::IpAddr;
use std::time::Duration;

use tracing::{debug, warn};

use crate::bus::BusSender;
use crate::history::{HistoryEntry, HistoryError, HistoryRing, Sequence};
use crate::prober::icmp::{IcmpProber, ProbeOptions};
use crate::prober::{ProbeCallbacks, ProbeError, Prober, Statistics};
use crate::tui::dashboard::format_rtt;

/// What happened, from the monitor's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Sent {
        seq: Sequence,
    },
    Received {
        seq: Sequence,
        rtt: Duration,
        bytes: usize,
        source: IpAddr,
    },
    TransmitError {
        seq: Sequence,
        /// Destination the failed request was addressed to.
        addr: IpAddr,
        message: String,
    },
    ReceiveError {
        message: String,
    },
}

/// A lifecycle event tagged with the host it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorEvent {
    pub host: String,
    pub kind: EventKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Error,
}

/// A line for the on-screen log pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub level: LogLevel,
    pub text: String,
}

pub struct HostMonitor {
    identity: String,
    prober: Box<dyn Prober>,
    history: HistoryRing,
}

impl HostMonitor {
    pub fn new(
        identity: impl Into<String>,
        prober: Box<dyn Prober>,
        history_capacity: usize,
    ) -> Result<Self, HistoryError> {
        Ok(Self {
            identity: identity.into(),
            prober,
            history: HistoryRing::new(history_capacity)?,
        })
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn history(&self) -> &HistoryRing {
        &self.history
    }

    /// Fresh snapshot from the prober. Not cached.
    pub fn statistics(&self) -> Statistics {
        self.prober.statistics()
    }

    /// Start the prober, publishing its lifecycle onto `bus`.
    pub fn start(&mut self, bus: &BusSender) -> Result<(), ProbeError> {
        let callbacks = self.callbacks(bus);
        self.prober.start(callbacks)
    }

    pub fn stop(&mut self) {
        self.prober.stop();
    }

    pub fn is_running(&self) -> bool {
        self.prober.is_running()
    }

    /// Apply one event to the history. Returns a line for the log pane,
    /// if the event is worth showing.
    pub fn apply(&mut self, kind: &EventKind) -> Option<LogLine> {
        match kind {
            EventKind::Sent { seq } => {
                self.history.append(HistoryEntry::pending(*seq));
                None
            }
            EventKind::Received {
                seq,
                rtt,
                bytes,
                source,
            } => {
                self.history.mark_received(*seq);
                Some(LogLine {
                    level: LogLevel::Info,
                    text: format!(
                        "{bytes} bytes from {source}:\ticmp_seq={seq} time={}",
                        format_rtt(*rtt)
                    ),
                })
            }
            EventKind::TransmitError { seq, addr, message } => {
                warn!(host = %self.identity, seq, %addr, "transmit error: {message}");
                Some(LogLine {
                    level: LogLevel::Error,
                    text: format!("Error: {message} {seq} {addr}"),
                })
            }
            EventKind::ReceiveError { message } => {
                warn!(host = %self.identity, "receive error: {message}");
                Some(LogLine {
                    level: LogLevel::Error,
                    text: format!("Error: {message}"),
                })
            }
        }
    }

    /// Callbacks that wrap prober activity into bus events for this host.
    fn callbacks(&self, bus: &BusSender) -> ProbeCallbacks {
        let (send_bus, recv_bus, err_bus) = (bus.clone(), bus.clone(), bus.clone());
        let (send_host, recv_host, err_host) = (
            self.identity.clone(),
            self.identity.clone(),
            self.identity.clone(),
        );

        ProbeCallbacks::new()
            .on_send(move |p| send_bus.publish(&send_host, EventKind::Sent { seq: p.seq }))
            .on_receive(move |p| {
                recv_bus.publish(
                    &recv_host,
                    EventKind::Received {
                        seq: p.seq,
                        rtt: p.rtt,
                        bytes: p.bytes,
                        source: p.addr,
                    },
                )
            })
            .on_error(move |err| {
                if err.is_teardown_noise() {
                    debug!(host = %err_host, "suppressed teardown error: {err}");
                    return;
                }
                let kind = match err {
                    ProbeError::Transmit { seq, addr, message } => {
                        EventKind::TransmitError { seq, addr, message }
                    }
                    other => EventKind::ReceiveError {
                        message: other.to_string(),
                    },
                };
                err_bus.publish(&err_host, kind);
            })
    }
}

impl std::fmt::Debug for HostMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostMonitor")
            .field("identity", &self.identity)
            .field("history", &self.history)
            .finish_non_exhaustive()
    }
}

/// Errors while building the monitors at startup.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error(transparent)]
    History(#[from] HistoryError),
}

/// Build one ICMP monitor per distinct resolved address, in argument order.
///
/// Fails on the first host that cannot be probed; nothing is started.
pub async fn connect_all(
    hosts: &[String],
    options: &ProbeOptions,
    history_capacity: usize,
) -> Result<Vec<HostMonitor>, InitError> {
    let mut seen = HashSet::new();
    let mut monitors = Vec::with_capacity(hosts.len());

    for host in hosts {
        let prober = IcmpProber::connect(host, options.clone()).await?;
        if !seen.insert(prober.ip()) {
            warn!(host = %host, ip = %prober.ip(), "address already monitored, skipping");
            continue;
        }
        monitors.push(HostMonitor::new(host.clone(), Box::new(prober), history_capacity)?);
    }

    Ok(monitors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::EventBus;
    use crate::prober::testing::ScriptedProber;

    fn drain(bus: &mut EventBus) -> Vec<MonitorEvent> {
        let mut events = Vec::new();
        while let Some(event) = bus.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn zero_capacity_monitor_rejected() {
        let (prober, _) = ScriptedProber::new("a", "10.0.0.1");
        let err = HostMonitor::new("a", Box::new(prober), 0).unwrap_err();
        assert_eq!(err, HistoryError::ZeroCapacity);
    }

    #[test]
    fn callbacks_publish_tagged_events() {
        let mut bus = EventBus::new();
        let (prober, script) = ScriptedProber::new("a", "10.0.0.1");
        let mut monitor = HostMonitor::new("a", Box::new(prober), 4).unwrap();
        monitor.start(&bus.sender()).unwrap();

        script.send(1);
        script.reply(1, Duration::from_millis(3));

        let events = drain(&mut bus);
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.host == "a"));
        assert_eq!(events[0].kind, EventKind::Sent { seq: 1 });
        assert!(matches!(events[1].kind, EventKind::Received { seq: 1, .. }));
    }

    #[test]
    fn history_only_changes_when_applied() {
        let mut bus = EventBus::new();
        let (prober, script) = ScriptedProber::new("a", "10.0.0.1");
        let mut monitor = HostMonitor::new("a", Box::new(prober), 4).unwrap();
        monitor.start(&bus.sender()).unwrap();

        script.send(1);
        assert!(monitor.history().is_empty());

        for event in drain(&mut bus) {
            monitor.apply(&event.kind);
        }
        assert_eq!(monitor.history().len(), 1);
        assert_eq!(monitor.history().latest_outcome(), Some(false));
    }

    #[test]
    fn received_marks_history_and_logs() {
        let (prober, _) = ScriptedProber::new("a", "10.0.0.1");
        let mut monitor = HostMonitor::new("a", Box::new(prober), 4).unwrap();

        assert!(monitor.apply(&EventKind::Sent { seq: 9 }).is_none());
        let line = monitor
            .apply(&EventKind::Received {
                seq: 9,
                rtt: Duration::from_millis(12),
                bytes: 64,
                source: "10.0.0.1".parse().unwrap(),
            })
            .unwrap();

        assert_eq!(monitor.history().latest_outcome(), Some(true));
        assert_eq!(line.level, LogLevel::Info);
        assert_eq!(line.text, "64 bytes from 10.0.0.1:\ticmp_seq=9 time=12ms");
    }

    #[test]
    fn errors_log_without_touching_history() {
        let (prober, _) = ScriptedProber::new("a", "10.0.0.1");
        let mut monitor = HostMonitor::new("a", Box::new(prober), 4).unwrap();
        monitor.apply(&EventKind::Sent { seq: 1 });

        let tx = monitor
            .apply(&EventKind::TransmitError {
                seq: 1,
                addr: "192.0.2.7".parse().unwrap(),
                message: "network is unreachable".into(),
            })
            .unwrap();
        let rx = monitor
            .apply(&EventKind::ReceiveError {
                message: "malformed packet".into(),
            })
            .unwrap();

        assert_eq!(tx.level, LogLevel::Error);
        assert_eq!(tx.text, "Error: network is unreachable 1 192.0.2.7");
        assert_eq!(rx.text, "Error: malformed packet");
        assert_eq!(monitor.history().len(), 1);
        assert_eq!(monitor.history().latest_outcome(), Some(false));
    }

    #[test]
    fn teardown_noise_never_reaches_the_bus() {
        let mut bus = EventBus::new();
        let (prober, script) = ScriptedProber::new("a", "10.0.0.1");
        let mut monitor = HostMonitor::new("a", Box::new(prober), 4).unwrap();
        monitor.start(&bus.sender()).unwrap();

        script.fail(ProbeError::SocketClosed);
        script.fail(ProbeError::Receive(
            "read udp 0.0.0.0:0: use of closed network connection".into(),
        ));
        script.fail(ProbeError::Receive("checksum mismatch".into()));

        let events = drain(&mut bus);
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].kind,
            EventKind::ReceiveError {
                message: "checksum mismatch".into()
            }
        );
    }

    #[test]
    fn transmit_errors_keep_their_sequence() {
        let mut bus = EventBus::new();
        let (prober, script) = ScriptedProber::new("a", "10.0.0.1");
        let mut monitor = HostMonitor::new("a", Box::new(prober), 4).unwrap();
        monitor.start(&bus.sender()).unwrap();

        script.fail(ProbeError::Transmit {
            seq: 5,
            addr: "10.0.0.1".parse().unwrap(),
            message: "no route to host".into(),
        });

        let events = drain(&mut bus);
        assert_eq!(
            events[0].kind,
            EventKind::TransmitError {
                seq: 5,
                addr: "10.0.0.1".parse().unwrap(),
                message: "no route to host".into()
            }
        );
    }

    #[tokio::test]
    async fn connect_all_aborts_on_unresolvable_host() {
        let hosts = ["127.0.0.1", "no such host.invalid", "::1"].map(String::from);
        let err = connect_all(&hosts, &ProbeOptions::default(), 4)
            .await
            .unwrap_err();

        match err {
            InitError::Probe(ProbeError::Resolve { host, .. }) => {
                assert_eq!(host, "no such host.invalid")
            }
            InitError::Probe(ProbeError::NoAddress(host)) => assert_eq!(host, "no such host.invalid"),
            // loopback socket refused before the bad host was reached
            InitError::Probe(ProbeError::Socket { host, .. }) => {
                eprintln!("cannot open ICMP socket for {host}, skipping");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
