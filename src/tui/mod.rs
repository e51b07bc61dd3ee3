//! Terminal dashboard: ratatui presentation layer.
//!
//! Renders one row per monitored host plus a log pane of replies and
//! errors. Read-only with respect to the probers: the UI never reaches
//! into a prober, it only consumes events and statistics snapshots.
//!
//! ## Architecture (TEA)
//!
//! Model (`DashboardApp`) + Update (message handler) + View (render).
//! Immediate mode: rows are rebuilt from monitor state on every frame.

pub mod app;
pub mod dashboard;
pub mod event;
pub mod input;
pub mod layout;
pub mod render;
pub mod runner;
pub mod table;
pub mod theme;
