//! Wheel odometry from a free-running 16-bit quadrature counter
//!
//! The counter wraps silently at 65535, so each update reconstructs the signed
//! change since the previous sample. This only works if the wheel turns less
//! than half the counter range between two updates; at 1440 counts per
//! revolution that is more than 22 wheel turns, far beyond what the robot can
//! do in one 6 ms wheel task period.

use core::f32::consts::TAU;

use embassy_time::Duration;

/// Counter range of the 16-bit hardware counter
const COUNTER_RANGE: i32 = 1 << 16;
/// Largest change that is still read as forward travel
const HALF_RANGE: i32 = COUNTER_RANGE / 2;

/// Latest wheel measurement
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WheelSample {
    /// Accumulated counts since the last [`Odometry::zero`]
    pub position: i32,
    /// Signed counts between the last two updates
    pub delta: i32,
    /// Wheel angular velocity in rad/s
    pub velocity: f32,
}

/// Rollover-corrected position tracking for one wheel
#[derive(Debug, Clone)]
pub struct Odometry {
    sample: WheelSample,
    previous: u16,
}

impl Odometry {
    /// Start tracking from the counter's current value
    pub fn new(current_count: u16) -> Self {
        Self {
            sample: WheelSample::default(),
            previous: current_count,
        }
    }

    /// Take a new counter sample
    pub fn update(&mut self, raw_count: u16) {
        let mut delta = raw_count as i32 - self.previous as i32;
        if delta > HALF_RANGE {
            // wrapped below zero while turning backward
            delta -= COUNTER_RANGE;
        } else if delta < -HALF_RANGE {
            // wrapped past the top while turning forward
            delta += COUNTER_RANGE;
        }

        self.previous = raw_count;
        self.sample.delta = delta;
        self.sample.position = self.sample.position.wrapping_add(delta);
    }

    /// Convert the last delta into an angular velocity in rad/s
    ///
    /// A zero `elapsed` keeps the previous velocity.
    pub fn velocity(&mut self, elapsed: Duration, counts_per_rev: f32) -> f32 {
        let micros = elapsed.as_micros();
        if micros > 0 {
            let counts_per_sec = self.sample.delta as f32 * 1_000_000.0 / micros as f32;
            self.sample.velocity = counts_per_sec * TAU / counts_per_rev;
        }
        self.sample.velocity
    }

    pub fn position(&self) -> i32 {
        self.sample.position
    }

    pub fn delta(&self) -> i32 {
        self.sample.delta
    }

    pub fn sample(&self) -> WheelSample {
        self.sample
    }

    /// Reset the accumulated position
    ///
    /// The previous raw count is kept so the next delta is still measured
    /// against the true hardware count.
    pub fn zero(&mut self) {
        self.sample.position = 0;
    }
}

impl Default for Odometry {
    fn default() -> Self {
        Self::new(0)
    }
}
