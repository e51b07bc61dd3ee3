//! Prober: the thing that actually sends echo requests.
//!
//! The dashboard never looks inside a prober. It hands over a set of
//! callbacks at start, asks for a statistics snapshot at render time,
//! and calls `stop` on quit. Everything else (sockets, timing, RTT
//! math) stays behind the [`Prober`] trait.

pub mod error;
pub mod icmp;

use std::net::IpAddr;
use std::time::Duration;

pub use error::ProbeError;

use crate::history::Sequence;

/// One echo request or reply as seen by the callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub seq: Sequence,
    /// Destination for sends, source for replies.
    pub addr: IpAddr,
    pub bytes: usize,
    /// Zero for sends.
    pub rtt: Duration,
}

type PacketHook = Box<dyn Fn(&Packet) + Send + Sync>;
type ErrorHook = Box<dyn Fn(ProbeError) + Send + Sync>;

/// Lifecycle callbacks a prober fires from its own task.
pub struct ProbeCallbacks {
    on_send: PacketHook,
    on_receive: PacketHook,
    on_error: ErrorHook,
}

impl ProbeCallbacks {
    /// Callbacks that ignore everything.
    pub fn new() -> Self {
        Self {
            on_send: Box::new(|_| {}),
            on_receive: Box::new(|_| {}),
            on_error: Box::new(|_| {}),
        }
    }

    pub fn on_send(mut self, f: impl Fn(&Packet) + Send + Sync + 'static) -> Self {
        self.on_send = Box::new(f);
        self
    }

    pub fn on_receive(mut self, f: impl Fn(&Packet) + Send + Sync + 'static) -> Self {
        self.on_receive = Box::new(f);
        self
    }

    pub fn on_error(mut self, f: impl Fn(ProbeError) + Send + Sync + 'static) -> Self {
        self.on_error = Box::new(f);
        self
    }

    pub fn sent(&self, packet: &Packet) {
        (self.on_send)(packet)
    }

    pub fn received(&self, packet: &Packet) {
        (self.on_receive)(packet)
    }

    pub fn failed(&self, error: ProbeError) {
        (self.on_error)(error)
    }
}

impl Default for ProbeCallbacks {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only snapshot of a prober's counters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    /// Host exactly as it was given on the command line.
    pub addr: String,
    pub ip: IpAddr,
    pub packets_sent: u64,
    pub packets_recv: u64,
    pub min_rtt: Duration,
    pub avg_rtt: Duration,
    pub max_rtt: Duration,
    pub std_dev_rtt: Duration,
}

impl Statistics {
    /// Percentage of sent packets with no reply (0.0 before anything is sent).
    pub fn packet_loss(&self) -> f64 {
        if self.packets_sent == 0 {
            return 0.0;
        }
        let lost = self.packets_sent.saturating_sub(self.packets_recv);
        lost as f64 / self.packets_sent as f64 * 100.0
    }
}

/// Running RTT aggregates (Welford's online mean/variance).
#[derive(Debug, Clone, Default)]
pub struct RttStats {
    sent: u64,
    recv: u64,
    min: Option<Duration>,
    max: Duration,
    mean_nanos: f64,
    m2: f64,
}

impl RttStats {
    pub fn record_sent(&mut self) {
        self.sent += 1;
    }

    pub fn record_reply(&mut self, rtt: Duration) {
        self.recv += 1;
        self.min = Some(self.min.map_or(rtt, |m| m.min(rtt)));
        self.max = self.max.max(rtt);

        let x = rtt.as_nanos() as f64;
        let delta = x - self.mean_nanos;
        self.mean_nanos += delta / self.recv as f64;
        self.m2 += delta * (x - self.mean_nanos);
    }

    pub fn snapshot(&self, addr: &str, ip: IpAddr) -> Statistics {
        let std_dev = if self.recv == 0 {
            0.0
        } else {
            (self.m2 / self.recv as f64).sqrt()
        };
        Statistics {
            addr: addr.to_string(),
            ip,
            packets_sent: self.sent,
            packets_recv: self.recv,
            min_rtt: self.min.unwrap_or_default(),
            avg_rtt: nanos(self.mean_nanos),
            max_rtt: self.max,
            std_dev_rtt: nanos(std_dev),
        }
    }
}

fn nanos(value: f64) -> Duration {
    Duration::from_nanos(value.max(0.0).round() as u64)
}

/// A source of echo probes for one host.
///
/// Callbacks run on the prober's own task; implementations must not
/// assume they run on the dashboard thread.
pub trait Prober: Send {
    /// Begin probing. Fails if already started.
    fn start(&mut self, callbacks: ProbeCallbacks) -> Result<(), ProbeError>;

    /// Ask the prober to stop. Safe to call more than once, or after
    /// the prober has already stopped on its own.
    fn stop(&mut self);

    /// True until the probe loop has actually exited.
    fn is_running(&self) -> bool;

    fn statistics(&self) -> Statistics;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    #[test]
    fn empty_stats_are_zero() {
        let stats = RttStats::default().snapshot("localhost", LOCALHOST);
        assert_eq!(stats.packets_sent, 0);
        assert_eq!(stats.packets_recv, 0);
        assert_eq!(stats.min_rtt, Duration::ZERO);
        assert_eq!(stats.avg_rtt, Duration::ZERO);
        assert_eq!(stats.std_dev_rtt, Duration::ZERO);
        assert_eq!(stats.packet_loss(), 0.0);
    }

    #[test]
    fn rtt_aggregates() {
        let mut rtt = RttStats::default();
        for ms in [10, 20, 30] {
            rtt.record_sent();
            rtt.record_reply(Duration::from_millis(ms));
        }
        rtt.record_sent();

        let stats = rtt.snapshot("example.com", LOCALHOST);
        assert_eq!(stats.packets_sent, 4);
        assert_eq!(stats.packets_recv, 3);
        assert_eq!(stats.min_rtt, Duration::from_millis(10));
        assert_eq!(stats.max_rtt, Duration::from_millis(30));
        assert_eq!(stats.avg_rtt, Duration::from_millis(20));
        // population std-dev of 10/20/30 ms
        assert_eq!(stats.std_dev_rtt, Duration::from_nanos(8_164_966));
        assert_eq!(stats.packet_loss(), 25.0);
        assert_eq!(stats.addr, "example.com");
    }

    #[test]
    fn callbacks_dispatch() {
        let sends = Arc::new(AtomicUsize::new(0));
        let errors = Arc::new(AtomicUsize::new(0));
        let s = sends.clone();
        let e = errors.clone();
        let callbacks = ProbeCallbacks::new()
            .on_send(move |_| {
                s.fetch_add(1, Ordering::SeqCst);
            })
            .on_error(move |_| {
                e.fetch_add(1, Ordering::SeqCst);
            });

        let packet = Packet {
            seq: 0,
            addr: LOCALHOST,
            bytes: 64,
            rtt: Duration::ZERO,
        };
        callbacks.sent(&packet);
        callbacks.received(&packet); // default no-op
        callbacks.failed(ProbeError::SocketClosed);

        assert_eq!(sends.load(Ordering::SeqCst), 1);
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }
}
