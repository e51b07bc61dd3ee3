//! Dashboard runner: main loop that wires everything together.
//!
//! Sets up the terminal, starts a blocking input thread, starts the
//! probers, then feeds bus events, keys and ticks to the app one at a
//! time until it reaches `Stopped`.

use std::io::{self, Stdout};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::time::interval;
use tracing::{info, warn};

use crate::bus::EventBus;

use super::app::DashboardApp;
use super::event::DashboardMessage;
use super::layout;

/// How long the input thread blocks before re-checking its stop flag.
const INPUT_POLL: Duration = Duration::from_millis(50);

/// Raw mode + alternate screen for as long as this lives.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        if let Err(e) = io::stdout().execute(EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(e);
        }
        let terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = io::stdout().execute(LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Reads crossterm key presses on a plain thread and forwards them.
struct InputReader {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl InputReader {
    fn spawn(tx: UnboundedSender<KeyEvent>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = stop.clone();
        let handle = thread::spawn(move || {
            while !flag.load(Ordering::SeqCst) {
                match event::poll(INPUT_POLL) {
                    Ok(true) => match event::read() {
                        Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                            if tx.send(key).is_err() {
                                break;
                            }
                        }
                        Ok(_) => {}
                        Err(e) => {
                            warn!("terminal read failed: {e}");
                            break;
                        }
                    },
                    Ok(false) => {}
                    Err(e) => {
                        warn!("terminal poll failed: {e}");
                        break;
                    }
                }
            }
        });
        Self {
            stop,
            handle: Some(handle),
        }
    }
}

impl Drop for InputReader {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Run the dashboard. Blocks until the user quits.
pub async fn run_dashboard(mut app: DashboardApp, mut bus: EventBus) -> anyhow::Result<()> {
    let mut terminal = TerminalGuard::enter()?;

    let (input_tx, mut input_rx) = mpsc::unbounded_channel();
    let input = InputReader::spawn(input_tx);
    let mut input_open = true;

    // Probers only start once the loop is about to consume their events.
    app.start(&bus.sender())?;

    let mut tick_interval = interval(Duration::from_millis(250)); // 4Hz
    let mut render_interval = interval(Duration::from_millis(33)); // ~30fps

    loop {
        tokio::select! {
            Some(event) = bus.recv() => {
                app.update(DashboardMessage::Monitor(event));
            }
            key = input_rx.recv(), if input_open => match key {
                Some(key) => app.update(DashboardMessage::Input(key)),
                None => {
                    input_open = false;
                    app.update(DashboardMessage::Quit);
                }
            },
            _ = tick_interval.tick() => {
                app.update(DashboardMessage::Tick(Instant::now()));
            }
            _ = render_interval.tick() => {
                if app.take_dirty() {
                    terminal.terminal.draw(|f| layout::draw(f, &mut app))?;
                }
            }
        }

        if app.is_stopped() {
            break;
        }
    }

    drop(input);
    drop(terminal);
    info!("dashboard stopped");
    Ok(())
}
