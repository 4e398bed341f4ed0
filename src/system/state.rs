//! System State Tags
//!
//! State tags reported by the task state machines on every invocation, and
//! the IMU calibration status that gates the start of the mission.
//!
//! # State Components
//! - Mission State: which phase of the course the robot is in
//! - Wheel Task State: whether a wheel loop is waiting, tracking or holding
//! - Calibration Status: per-axis confidence of the IMU fusion algorithm
//!
//! The tags are plain values. Per-state data such as phase timers lives
//! inside the task objects and is dropped on every transition.

/// Mission control phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MissionState {
    /// Waiting for IMU calibration and the settle interval
    Setup,
    /// Tracking the line under closed-loop body control
    LineFollow,
    /// Running the timed open-loop escape after a bump
    BumpRecover,
    /// Driving back to the start box by heading; terminal
    ReturnHome,
}

/// Wheel velocity task phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WheelTaskState {
    /// Actuator enabled, waiting for the calibration flag
    Setup,
    /// Closing the velocity loop every period
    Running,
    /// Bump or end flag raised; the actuator belongs to the mission task
    Held,
}

/// IMU fusion calibration status
///
/// Each field is a 2-bit confidence score:
/// - 0: Uncalibrated
/// - 1-2: Partially calibrated
/// - 3: Fully calibrated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationStatus {
    pub system: u8,
    pub gyroscope: u8,
    pub accelerometer: u8,
    pub magnetometer: u8,
}

impl CalibrationStatus {
    /// Highest confidence score
    pub const FULL: u8 = 3;

    /// Decode the packed status byte (`sys:2 | gyr:2 | acc:2 | mag:2`)
    pub fn from_register(byte: u8) -> Self {
        Self {
            system: (byte >> 6) & 0x03,
            gyroscope: (byte >> 4) & 0x03,
            accelerometer: (byte >> 2) & 0x03,
            magnetometer: byte & 0x03,
        }
    }

    /// True when all four scores are at their maximum
    pub fn is_fully_calibrated(&self) -> bool {
        self.system == Self::FULL
            && self.gyroscope == Self::FULL
            && self.accelerometer == Self::FULL
            && self.magnetometer == Self::FULL
    }
}
