//! ICMP echo prober built on `surge-ping`.
//!
//! One probe loop task per host. Each tick allocates the next sequence
//! number, fires `on_send`, then hands the request to its own short-lived
//! task so a slow reply never delays the next send. Replies, I/O failures
//! and (after `stop`) teardown noise come back through the callbacks.

use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use surge_ping::{Client, Config, IcmpPacket, PingIdentifier, PingSequence, Pinger, SurgeError, ICMP};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

use super::{Packet, ProbeCallbacks, ProbeError, Prober, RttStats, Statistics};
use crate::history::Sequence;

/// ICMP echo header size, added to the payload for reported send sizes.
const ICMP_HEADER_LEN: usize = 8;

/// Timing and sizing knobs for one prober.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOptions {
    pub interval: Duration,
    /// How long a single request waits for its reply.
    pub timeout: Duration,
    pub payload_size: usize,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(5),
            payload_size: 56,
        }
    }
}

/// State shared between the prober handle and its tasks.
struct Shared {
    host: String,
    ip: IpAddr,
    stats: Mutex<RttStats>,
    stopping: AtomicBool,
    running: AtomicBool,
}

impl Shared {
    fn stats(&self) -> MutexGuard<'_, RttStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Everything the probe loop and its request tasks need.
struct LoopContext {
    shared: Arc<Shared>,
    client: Client,
    options: ProbeOptions,
    payload: Vec<u8>,
    callbacks: ProbeCallbacks,
}

pub struct IcmpProber {
    shared: Arc<Shared>,
    client: Client,
    options: ProbeOptions,
    stop_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl IcmpProber {
    /// Resolve `host` and open an ICMP socket of the matching family.
    pub async fn connect(host: &str, options: ProbeOptions) -> Result<Self, ProbeError> {
        let ip = resolve_host(host).await?;

        let config = match ip {
            IpAddr::V4(_) => Config::default(),
            IpAddr::V6(_) => Config::builder().kind(ICMP::V6).build(),
        };
        let client = Client::new(&config).map_err(|source| ProbeError::Socket {
            host: host.to_string(),
            source,
        })?;

        debug!(host = %host, ip = %ip, "ICMP client ready");

        let (stop_tx, _) = watch::channel(false);
        Ok(Self {
            shared: Arc::new(Shared {
                host: host.to_string(),
                ip,
                stats: Mutex::new(RttStats::default()),
                stopping: AtomicBool::new(false),
                running: AtomicBool::new(false),
            }),
            client,
            options,
            stop_tx,
            task: None,
        })
    }

    pub fn ip(&self) -> IpAddr {
        self.shared.ip
    }
}

impl std::fmt::Debug for IcmpProber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IcmpProber")
            .field("host", &self.shared.host)
            .field("ip", &self.shared.ip)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Prober for IcmpProber {
    fn start(&mut self, callbacks: ProbeCallbacks) -> Result<(), ProbeError> {
        if self.task.is_some() {
            return Err(ProbeError::AlreadyStarted);
        }

        let ctx = Arc::new(LoopContext {
            shared: self.shared.clone(),
            client: self.client.clone(),
            options: self.options.clone(),
            payload: vec![0; self.options.payload_size],
            callbacks,
        });
        self.shared.running.store(true, Ordering::SeqCst);
        let stop_rx = self.stop_tx.subscribe();
        self.task = Some(tokio::spawn(probe_loop(ctx, stop_rx)));
        Ok(())
    }

    fn stop(&mut self) {
        if self.shared.stopping.swap(true, Ordering::SeqCst) {
            return;
        }
        self.stop_tx.send_replace(true);
        debug!(host = %self.shared.host, "prober stop requested");
    }

    fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    fn statistics(&self) -> Statistics {
        self.shared.stats().snapshot(&self.shared.host, self.shared.ip)
    }
}

async fn probe_loop(ctx: Arc<LoopContext>, mut stop_rx: watch::Receiver<bool>) {
    let ident = PingIdentifier(rand::random());
    let mut ticker = time::interval(ctx.options.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut seq: Sequence = 0;

    loop {
        tokio::select! {
            _ = stop_rx.changed() => break,
            _ = ticker.tick() => {}
        }
        if ctx.shared.stopping.load(Ordering::SeqCst) {
            break;
        }

        let mut pinger = ctx.client.pinger(ctx.shared.ip, ident).await;
        pinger.timeout(ctx.options.timeout);

        ctx.shared.stats().record_sent();
        ctx.callbacks.sent(&Packet {
            seq,
            addr: ctx.shared.ip,
            bytes: ctx.payload.len() + ICMP_HEADER_LEN,
            rtt: Duration::ZERO,
        });

        // Spawned after on_send so the Sent event is always queued first.
        let request = ctx.clone();
        tokio::spawn(async move { request.echo(pinger, seq).await });

        seq = seq.wrapping_add(1);
    }

    ctx.shared.running.store(false, Ordering::SeqCst);
    debug!(host = %ctx.shared.host, "probe loop exited");
}

impl LoopContext {
    async fn echo(&self, mut pinger: Pinger, seq: Sequence) {
        let result = pinger.ping(PingSequence(seq), &self.payload).await;

        if self.shared.stopping.load(Ordering::SeqCst) {
            self.callbacks.failed(ProbeError::SocketClosed);
            return;
        }

        match result {
            Ok((packet, rtt)) => {
                let (addr, bytes) = match packet {
                    IcmpPacket::V4(p) => (IpAddr::V4(p.get_source()), p.get_size()),
                    IcmpPacket::V6(p) => (IpAddr::V6(p.get_source()), p.get_size()),
                };
                self.shared.stats().record_reply(rtt);
                self.callbacks.received(&Packet {
                    seq,
                    addr,
                    bytes,
                    rtt,
                });
            }
            Err(SurgeError::Timeout { .. }) => {
                debug!(host = %self.shared.host, seq, "echo request timed out");
            }
            Err(SurgeError::IOError(e)) => {
                self.callbacks.failed(ProbeError::Transmit {
                    seq,
                    addr: self.shared.ip,
                    message: e.to_string(),
                });
            }
            Err(e) => self.callbacks.failed(ProbeError::Receive(e.to_string())),
        }
    }
}

/// Resolve a host argument to one address. IP literals skip DNS.
async fn resolve_host(host: &str) -> Result<IpAddr, ProbeError> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(ip);
    }

    let mut addrs = tokio::net::lookup_host((host, 0))
        .await
        .map_err(|source| ProbeError::Resolve {
            host: host.to_string(),
            source,
        })?;
    addrs
        .next()
        .map(|addr| addr.ip())
        .ok_or_else(|| ProbeError::NoAddress(host.to_string()))
}
