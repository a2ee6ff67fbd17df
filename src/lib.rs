//! Date-range selection with live per-day modifiers.
//!
//! A [`RangeController`](controller::RangeController) tracks a start/end
//! selection over a window of calendar months and keeps a set of
//! [`Modifier`](modifier::Modifier)s (selected, blocked, hovered, ...) for
//! every visible day, updating only the days each event affects.
pub mod classify;
pub mod clock;
pub mod config;
pub mod controller;
pub mod date;
pub mod error;
pub mod modifier;
pub mod policy;
pub mod selection;
pub mod visible;
