//! Penguin: ping many hosts at once, watch them in one live table.
//!
//! Probers send ICMP echo requests on their own tasks and report through
//! callbacks; monitors turn those into events on a single bus; the
//! dashboard consumes the bus one event at a time and redraws.

pub mod bus;
pub mod config;
pub mod history;
pub mod monitor;
pub mod prober;
pub mod tui;
