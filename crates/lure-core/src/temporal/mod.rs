//! Temporal scheduling.
//!
//! Pure computations of how long the persona "takes" to reply and whether it
//! is awake and free at a given instant. Nothing here sleeps or samples
//! entropy; callers inject draws and perform the actual waiting.

mod availability;
mod delay;
mod window;

pub use availability::{Availability, availability, is_available};
pub use delay::{
    ComplexityClass, DelayDraws, DelayRange, DistractionComposition, TimingConfig, compute_delay,
};
pub use window::TimeWindow;
