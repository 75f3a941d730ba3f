//! Injectable source of uniform draws in `[0, 1)`.
//!
//! Pure functions in this crate take their draws as arguments; the
//! orchestrator pulls them from a `DrawSource` so tests can fix the sequence.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::sync::Mutex;

pub trait DrawSource: Send + Sync {
    /// Returns a value in `[0, 1)`.
    fn draw(&self) -> f64;
}

/// Draws from the thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngSource;

impl DrawSource for ThreadRngSource {
    fn draw(&self) -> f64 {
        rand::thread_rng().r#gen::<f64>()
    }
}

/// Reproducible draws from a seeded generator.
#[derive(Debug)]
pub struct SeededSource {
    rng: Mutex<StdRng>,
}

impl SeededSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl DrawSource for SeededSource {
    fn draw(&self) -> f64 {
        match self.rng.lock() {
            Ok(mut rng) => rng.r#gen::<f64>(),
            Err(poisoned) => poisoned.into_inner().r#gen::<f64>(),
        }
    }
}

/// Replays a fixed sequence, then repeats the last value (or 0.0 when empty).
#[derive(Debug)]
pub struct ScriptedSource {
    queue: Mutex<VecDeque<f64>>,
    last: Mutex<f64>,
}

impl ScriptedSource {
    pub fn new(draws: impl IntoIterator<Item = f64>) -> Self {
        Self {
            queue: Mutex::new(draws.into_iter().collect()),
            last: Mutex::new(0.0),
        }
    }

    /// A source that always returns `value`.
    pub fn constant(value: f64) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            last: Mutex::new(value),
        }
    }
}

impl DrawSource for ScriptedSource {
    fn draw(&self) -> f64 {
        let next = self.queue.lock().ok().and_then(|mut queue| queue.pop_front());
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(value) = next {
            *last = value;
        }
        *last
    }
}
