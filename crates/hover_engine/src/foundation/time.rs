//! Time management utilities

use std::time::{Duration, Instant};

/// Fixed-step accumulator driving the simulation tick
///
/// Frame deltas are accumulated and consumed in `step` sized slices so the
/// vehicle controller always integrates with the same delta.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    step: f32,
    accumulator: f32,
    max_steps_per_frame: u32,
    ticks: u64,
}

impl FixedTimestep {
    /// Create an accumulator ticking every `step` seconds
    pub fn new(step: f32) -> Self {
        Self {
            step,
            accumulator: 0.0,
            max_steps_per_frame: 8,
            ticks: 0,
        }
    }

    /// Feed a frame delta and return how many fixed steps must run.
    ///
    /// Past `max_steps_per_frame` the remaining backlog is dropped.
    pub fn advance(&mut self, frame_delta: f32) -> u32 {
        self.accumulator += frame_delta.max(0.0);
        let mut steps = 0;
        while self.accumulator >= self.step && steps < self.max_steps_per_frame {
            self.accumulator -= self.step;
            steps += 1;
        }
        if steps == self.max_steps_per_frame {
            self.accumulator = self.accumulator.min(self.step);
        }
        self.ticks += u64::from(steps);
        steps
    }

    /// Seconds per fixed step
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Total number of fixed steps produced so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

/// Simple stopwatch for measuring elapsed time
pub struct Stopwatch {
    start_time: Option<Instant>,
    elapsed: Duration,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    /// Create a new stopped stopwatch
    pub fn new() -> Self {
        Self {
            start_time: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Create a new stopwatch and start it immediately
    pub fn start_new() -> Self {
        let mut stopwatch = Self::new();
        stopwatch.start();
        stopwatch
    }

    /// Start the stopwatch
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Stop the stopwatch and accumulate elapsed time
    pub fn stop(&mut self) {
        if let Some(start) = self.start_time.take() {
            self.elapsed += start.elapsed();
        }
    }

    /// Get the elapsed time
    pub fn elapsed(&self) -> Duration {
        let running = self.start_time.map_or(Duration::ZERO, |start| start.elapsed());
        self.elapsed + running
    }

    /// Get the elapsed time in milliseconds
    pub fn elapsed_millis(&self) -> f32 {
        self.elapsed().as_secs_f32() * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_timestep_accumulates_partial_frames() {
        let mut timestep = FixedTimestep::new(0.5);
        assert_eq!(timestep.advance(0.3), 0);
        assert_eq!(timestep.advance(0.3), 1);
        assert_eq!(timestep.advance(1.0), 2);
        assert_eq!(timestep.ticks(), 3);
    }

    #[test]
    fn test_fixed_timestep_caps_steps_after_stall() {
        let mut timestep = FixedTimestep::new(0.01);
        assert_eq!(timestep.advance(10.0), 8);
        // the backlog was dropped, a normal frame only yields a normal count
        assert!(timestep.advance(0.01) <= 2);
    }
}
