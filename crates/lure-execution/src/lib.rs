//! Runtime wiring: tracing setup, session event streaming and background tasks.

pub mod event_layer;
pub mod sweeper;
pub mod telemetry;

pub use event_layer::{SessionEvent, SessionEventLayer};
pub use sweeper::{SweepCycle, run_sweep_cycle, spawn_sweeper};
pub use telemetry::{LogFormat, init_tracing};
