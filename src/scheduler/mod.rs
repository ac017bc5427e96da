//! Periodic live-mode sweeps over the monitor.

pub mod engine;

pub use self::engine::{local_clock, spawn_sweeper, Clock, SweepHandle};
