//! Screen layout.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │    Host      Packets  Loss  MinRtt  ...  History      │
//! │ ✅ 1.1.1.1   12/12    0%    9.1ms   ...  ✅✅✅✅✅✅  │
//! │ 🔲 10.0.0.9  3/12     75%   40ms    ...  🔲🔲✅🔲🔲🔲  │
//! └───────────────────────────────────────────────────────┘
//! ┌─ Log ─────────────────────────────────────────────────┐
//! │ 64 bytes from 1.1.1.1:  icmp_seq=11 time=9.1ms        │
//! └───────────────────────────────────────────────────────┘
//!  running │ 2 hosts │ every 1s │ q quit  ↑↓ select
//! ```

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::monitor::LogLevel;

use super::app::{ControllerState, DashboardApp};
use super::dashboard::format_rtt;

/// Draw the full dashboard.
pub fn draw(f: &mut Frame, app: &mut DashboardApp) {
    let table_height = app.table_mut().height();
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(table_height), // host table
            Constraint::Min(3),               // log pane
            Constraint::Length(1),            // status bar
        ])
        .split(f.area());

    draw_table(f, app, outer[0]);
    draw_log(f, app, outer[1]);
    draw_status(f, app, outer[2]);
}

fn draw_table(f: &mut Frame, app: &mut DashboardApp, area: Rect) {
    let rows = app.rows();
    let theme = app.theme().clone();
    let history = app.history_len();
    app.table_mut().draw(f, area, &rows, &theme, history);
}

/// Newest lines at the bottom; older lines scroll off the top.
fn draw_log(f: &mut Frame, app: &DashboardApp, area: Rect) {
    let theme = app.theme();
    let block = Block::default()
        .title(" Log ")
        .borders(Borders::ALL)
        .border_style(theme.border_style());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let visible = inner.height as usize;
    let skip = app.log().len().saturating_sub(visible);
    let lines: Vec<Line> = app
        .log()
        .skip(skip)
        .map(|l| {
            let style = match l.level {
                LogLevel::Info => Style::default(),
                LogLevel::Error => theme.error_style(),
            };
            // tabs render as a single cell in most terminals
            Line::from(Span::styled(l.text.replace('\t', "  "), style))
        })
        .collect();

    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_status(f: &mut Frame, app: &DashboardApp, area: Rect) {
    let (label, color) = match app.state() {
        ControllerState::Running => ("running", Color::Green),
        ControllerState::ShuttingDown { .. } => ("stopping…", Color::Yellow),
        ControllerState::Stopped => ("stopped", Color::DarkGray),
    };
    let hosts = app.monitors().len();
    let plural = if hosts == 1 { "" } else { "s" };

    let line = Line::from(vec![
        Span::raw(" "),
        Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::styled(
            format!(
                " │ {hosts} host{plural} │ every {} │ q quit  ↑↓ select",
                format_rtt(app.interval())
            ),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    f.render_widget(Paragraph::new(line), area);
}
