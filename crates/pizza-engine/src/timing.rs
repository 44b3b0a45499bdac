//! Timing collaborator
//!
//! The engine brackets each case with [`Timer::start`] / [`Timer::stop`]
//! and derives the case duration from the growth of [`Timer::elapsed`].
//! [`Benchmark`] is the stock implementation; anything implementing
//! [`Timer`] can be injected with `Engine::with_timer`.
//!
//! # Quick start
//!
//! ```
//! use pizza_engine::timing::{Benchmark, ScopedTimer, Timer};
//!
//! let mut mark = Benchmark::new("parse");
//! {
//!     let _scope = ScopedTimer::new(&mut mark);
//!     // work being measured
//! }
//! assert_eq!(mark.samples(), 1);
//! println!("{}", mark.report());
//! ```

use std::time::Instant;

/// Interface the engine needs from a timing source. All values are seconds.
pub trait Timer {
    /// Begin a sample; no-op while a sample is already running
    fn start(&mut self);
    /// End the running sample; no-op when idle
    fn stop(&mut self);
    /// Total of all completed samples
    fn elapsed(&self) -> f64;
    /// Shortest sample, 0 when there are none
    fn min(&self) -> f64;
    /// Longest sample
    fn max(&self) -> f64;
    /// Mean sample, 0 when there are none
    fn avg(&self) -> f64;
    /// Forget every sample
    fn reset(&mut self);
    /// Human readable statistics
    fn report(&self) -> String;
}

/// Sample-accumulating wall-clock timer
#[derive(Debug, Clone)]
pub struct Benchmark {
    name: String,
    started: Option<Instant>,
    samples: u64,
    total: f64,
    min: f64,
    max: f64,
}

impl Benchmark {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            started: None,
            samples: 0,
            total: 0.0,
            min: f64::MAX,
            max: 0.0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of completed samples
    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }

    /// Record a sample of `seconds` without measuring it
    pub fn add_sample(&mut self, seconds: f64) {
        self.total += seconds;
        self.min = self.min.min(seconds);
        self.max = self.max.max(seconds);
        self.samples += 1;
    }
}

impl Timer for Benchmark {
    fn start(&mut self) {
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
    }

    fn stop(&mut self) {
        if let Some(start) = self.started.take() {
            self.add_sample(start.elapsed().as_secs_f64());
        }
    }

    fn elapsed(&self) -> f64 {
        self.total
    }

    fn min(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            self.min
        }
    }

    fn max(&self) -> f64 {
        self.max
    }

    fn avg(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            self.total / self.samples as f64
        }
    }

    fn reset(&mut self) {
        self.started = None;
        self.samples = 0;
        self.total = 0.0;
        self.min = f64::MAX;
        self.max = 0.0;
    }

    fn report(&self) -> String {
        format!(
            "Benchmark : {}\nTotal Time: {:.6} seconds\nMin Time  : {:.6} seconds\nMax Time  : {:.6} seconds\nAvg Time  : {:.6} seconds",
            self.name,
            self.elapsed(),
            self.min(),
            self.max(),
            self.avg()
        )
    }
}

/// Starts a timer on creation and stops it when dropped
pub struct ScopedTimer<'a, T: Timer + ?Sized> {
    timer: &'a mut T,
}

impl<'a, T: Timer + ?Sized> ScopedTimer<'a, T> {
    pub fn new(timer: &'a mut T) -> Self {
        timer.start();
        Self { timer }
    }
}

impl<T: Timer + ?Sized> Drop for ScopedTimer<'_, T> {
    fn drop(&mut self) {
        self.timer.stop();
    }
}
