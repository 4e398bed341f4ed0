//! Line position from the reflectance array
//!
//! Each of the eight sensors reports white (0) or black (1). The weighted sum
//! is negative when the line sits under the left half of the array and
//! positive under the right half; the outer sensors weigh the most so a line
//! that is about to escape produces a large magnitude.

use crate::config::{LineFollowConfig, LINE_SENSOR_COUNT};
use crate::system::hardware::SensorTimeout;

/// Binary readings, index 0 is the leftmost sensor
pub type LineReading = [u8; LINE_SENSOR_COUNT];

/// Sensor weights, aligned with [`LineReading`]
pub const WEIGHTS: [i32; LINE_SENSOR_COUNT] = [-7, -5, -2, -1, 1, 2, 5, 7];

/// Weighted-sum line estimator
///
/// Stateless apart from the last readings and sum kept for inspection.
#[derive(Debug, Clone, Default)]
pub struct LineCentroid {
    readings: LineReading,
    sum: i32,
}

impl LineCentroid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Weighted sum of the readings
    pub fn weighted_sum(&mut self, readings: &LineReading) -> i32 {
        self.readings = *readings;
        self.sum = readings
            .iter()
            .zip(WEIGHTS.iter())
            .map(|(&reading, &weight)| reading as i32 * weight)
            .sum();
        self.sum
    }

    /// Number of sensors that saw black in the last readings
    pub fn black_count(&self) -> usize {
        self.readings.iter().filter(|&&reading| reading == 1).count()
    }

    pub fn last_readings(&self) -> &LineReading {
        &self.readings
    }

    pub fn last_sum(&self) -> i32 {
        self.sum
    }
}

/// Classify a raw decay time as white (0) or black (1)
///
/// A timed-out read is treated as white so a missing sensor cannot steer the
/// robot or trigger the all-black detection.
pub fn normalize(raw: Result<u32, SensorTimeout>, config: &LineFollowConfig) -> u8 {
    match raw {
        Ok(micros) => {
            let scaled = (micros as f32 - config.raw_min) / config.raw_max;
            if scaled <= config.black_threshold {
                0
            } else {
                1
            }
        }
        Err(SensorTimeout) => 0,
    }
}
