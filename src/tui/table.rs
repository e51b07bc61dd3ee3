//! Host table: the scrollable table widget.
//!
//! Owns selection and scroll state. The dashboard hands it rows on
//! every draw and forwards keys it does not handle itself; keys the
//! table does not know come back as [`KeyOutcome::Ignored`].

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Rect};
use ratatui::widgets::{Block, Borders, Cell, Row, Table, TableState};
use ratatui::Frame;

use super::render::HostRow;
use super::theme::Theme;

const HEADERS: [&str; 9] = [
    "", "Host", "Packets", "Loss", "MinRtt", "AvgRtt", "MaxRtt", "StdDev", "History",
];

/// Rows moved by PageUp/PageDown.
const PAGE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Handled,
    Ignored,
}

#[derive(Debug, Default)]
pub struct HostTable {
    state: TableState,
    rows: usize,
}

impl HostTable {
    pub fn new(rows: usize) -> Self {
        let mut state = TableState::default();
        if rows > 0 {
            state.select(Some(0));
        }
        Self { state, rows }
    }

    pub fn selected(&self) -> Option<usize> {
        self.state.selected()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome {
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => self.move_by(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_by(-1),
            KeyCode::PageDown => self.move_by(PAGE as isize),
            KeyCode::PageUp => self.move_by(-(PAGE as isize)),
            KeyCode::Home | KeyCode::Char('g') => self.select(0),
            KeyCode::End | KeyCode::Char('G') => self.select(self.rows.saturating_sub(1)),
            _ => return KeyOutcome::Ignored,
        }
        KeyOutcome::Handled
    }

    fn move_by(&mut self, delta: isize) {
        let current = self.state.selected().unwrap_or(0) as isize;
        let max = self.rows.saturating_sub(1) as isize;
        self.select((current + delta).clamp(0, max) as usize);
    }

    fn select(&mut self, index: usize) {
        if self.rows == 0 {
            self.state.select(None);
        } else {
            self.state.select(Some(index.min(self.rows - 1)));
        }
    }

    /// Rows needed to show every host plus header and borders.
    pub fn height(&self) -> u16 {
        saturating_u16(self.rows).saturating_add(3)
    }

    pub fn draw(&mut self, f: &mut Frame, area: Rect, rows: &[HostRow], theme: &Theme, history: usize) {
        let host_width = saturating_u16(
            rows.iter()
                .map(|r| r.host.chars().count())
                .max()
                .unwrap_or(0)
                .max(HEADERS[1].len()),
        );

        let widths = [
            Constraint::Length(2),
            Constraint::Length(host_width),
            Constraint::Length(9),
            Constraint::Length(6),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(history_width(history)),
        ];

        let header = Row::new(HEADERS.iter().map(|h| Cell::from(*h))).style(theme.header_style());
        let body = rows
            .iter()
            .map(|r| Row::new(r.cells().map(|c| Cell::from(c.to_string()))));

        let table = Table::new(body, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme.border_style()),
            )
            .row_highlight_style(theme.selected_style());

        f.render_stateful_widget(table, area, &mut self.state);
    }
}

fn saturating_u16(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

/// Glyphs are double width.
fn history_width(history: usize) -> u16 {
    saturating_u16(history).saturating_mul(2).max(7)
}
