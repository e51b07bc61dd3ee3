//! End-to-end dashboard flow with hand-driven probers.
//!
//! No sockets, no terminal: probers are driven from the test, events
//! travel over the real bus, and rows come out of the real renderer.

use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use penguin::bus::EventBus;
use penguin::config::DashboardConfig;
use penguin::monitor::HostMonitor;
use penguin::prober::{Packet, ProbeCallbacks, ProbeError, Prober, RttStats, Statistics};
use penguin::tui::app::{ControllerState, DashboardApp};
use penguin::tui::event::DashboardMessage;

#[derive(Default)]
struct State {
    callbacks: Option<ProbeCallbacks>,
    stats: RttStats,
    stops: usize,
    running: bool,
}

struct ManualProber {
    host: String,
    ip: IpAddr,
    state: Arc<Mutex<State>>,
}

#[derive(Clone)]
struct Handle {
    ip: IpAddr,
    state: Arc<Mutex<State>>,
}

impl Handle {
    fn send(&self, seq: u16) {
        let mut state = self.state.lock().unwrap();
        state.stats.record_sent();
        let packet = Packet {
            seq,
            addr: self.ip,
            bytes: 64,
            rtt: Duration::ZERO,
        };
        state.callbacks.as_ref().unwrap().sent(&packet);
    }

    fn reply(&self, seq: u16) {
        let mut state = self.state.lock().unwrap();
        let rtt = Duration::from_millis(5);
        state.stats.record_reply(rtt);
        let packet = Packet {
            seq,
            addr: self.ip,
            bytes: 64,
            rtt,
        };
        state.callbacks.as_ref().unwrap().received(&packet);
    }

    fn teardown_error(&self) {
        let state = self.state.lock().unwrap();
        state
            .callbacks
            .as_ref()
            .unwrap()
            .failed(ProbeError::Receive("read udp [::]:0: use of closed network connection".into()));
    }

    fn stops(&self) -> usize {
        self.state.lock().unwrap().stops
    }
}

fn manual(host: &str) -> (ManualProber, Handle) {
    let ip: IpAddr = host.parse().unwrap();
    let state = Arc::new(Mutex::new(State::default()));
    (
        ManualProber {
            host: host.into(),
            ip,
            state: state.clone(),
        },
        Handle { ip, state },
    )
}

impl Prober for ManualProber {
    fn start(&mut self, callbacks: ProbeCallbacks) -> Result<(), ProbeError> {
        let mut state = self.state.lock().unwrap();
        state.callbacks = Some(callbacks);
        state.running = true;
        Ok(())
    }

    fn stop(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.stops += 1;
        state.running = false;
    }

    fn is_running(&self) -> bool {
        self.state.lock().unwrap().running
    }

    fn statistics(&self) -> Statistics {
        self.state.lock().unwrap().stats.snapshot(&self.host, self.ip)
    }
}

fn dashboard(hosts: &[&str]) -> (DashboardApp, EventBus, Vec<Handle>) {
    let config = DashboardConfig::default();
    let mut monitors = Vec::new();
    let mut handles = Vec::new();
    for host in hosts {
        let (prober, handle) = manual(host);
        monitors.push(HostMonitor::new(*host, Box::new(prober), config.history).unwrap());
        handles.push(handle);
    }
    let mut app = DashboardApp::new(monitors, &config).unwrap();
    let bus = EventBus::new();
    app.start(&bus.sender()).unwrap();
    (app, bus, handles)
}

fn pump(app: &mut DashboardApp, bus: &mut EventBus) {
    while let Some(event) = bus.try_recv() {
        app.update(DashboardMessage::Monitor(event));
    }
}

#[test]
fn reply_and_silence_rows() {
    let (mut app, mut bus, handles) = dashboard(&["192.0.2.1", "192.0.2.2"]);

    handles[0].send(1);
    handles[0].reply(1);
    handles[1].send(1);
    pump(&mut app, &mut bus);

    let rows = app.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].host, "192.0.2.1");
    assert_eq!(rows[0].latest, "✅");
    assert_eq!(rows[0].packets, "1/1");
    assert_eq!(rows[0].history, "✅");
    assert_eq!(rows[1].host, "192.0.2.2");
    assert_eq!(rows[1].latest, "🔲");
    assert_eq!(rows[1].packets, "0/1");
    assert_eq!(rows[1].history, "🔲");
}

#[test]
fn rows_keep_argument_order() {
    let (mut app, mut bus, handles) = dashboard(&["192.0.2.1", "192.0.2.2"]);

    handles[1].send(1);
    pump(&mut app, &mut bus);
    handles[0].send(1);
    handles[0].reply(1);
    pump(&mut app, &mut bus);

    let hosts: Vec<String> = app.rows().into_iter().map(|r| r.host).collect();
    assert_eq!(hosts, ["192.0.2.1", "192.0.2.2"]);
}

#[test]
fn history_window_rolls() {
    let (mut app, mut bus, handles) = dashboard(&["192.0.2.1"]);
    for seq in 0..15 {
        handles[0].send(seq);
        if seq >= 13 {
            handles[0].reply(seq);
        }
    }
    // late reply for a probe that has already rolled out of the window
    handles[0].reply(2);
    pump(&mut app, &mut bus);

    let row = &app.rows()[0];
    assert_eq!(row.history.chars().count(), 10);
    assert_eq!(row.history, "🔲🔲🔲🔲🔲🔲🔲🔲✅✅");
    assert_eq!(row.packets, "3/15");
}

#[test]
fn quit_stops_each_prober_once_and_silences_teardown() {
    let (mut app, mut bus, handles) = dashboard(&["192.0.2.1", "192.0.2.2", "192.0.2.3"]);
    handles[0].send(0);
    pump(&mut app, &mut bus);

    app.update(DashboardMessage::Input(KeyEvent::new(
        KeyCode::Char('q'),
        KeyModifiers::NONE,
    )));
    app.update(DashboardMessage::Quit);
    for handle in &handles {
        handle.teardown_error();
    }
    pump(&mut app, &mut bus);

    assert_eq!(app.state(), ControllerState::Stopped);
    assert!(handles.iter().all(|h| h.stops() == 1));
    assert_eq!(app.log().count(), 0);
}
