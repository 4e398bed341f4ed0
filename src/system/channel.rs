//! Shared Channels
//!
//! Latest-value slots for inter-task communication. A channel holds exactly
//! one scalar; `put` overwrites it and `get` returns a copy. There is no
//! queue and no history, last write wins.
//!
//! # Access protection
//! The raw mutex type picks the protection level:
//! - `CriticalSectionRawMutex`: safe from any execution context, use for
//!   statics shared between tasks or interrupt priorities
//! - `NoopRawMutex`: no locking, only valid when every reader and writer runs
//!   in the same execution context
//!
//! Either way a reader always observes a whole value.
//!
//! # Roles
//! | Channel            | Writer        | Readers              |
//! |--------------------|---------------|----------------------|
//! | `velocity_*_ref`   | mission       | matching wheel       |
//! | `velocity_*_meas`  | matching wheel| mission              |
//! | `calibrated`       | mission       | both wheels          |
//! | `bump`             | mission       | both wheels          |
//! | `end`              | mission       | both wheels          |

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, RawMutex};
use embassy_sync::blocking_mutex::Mutex;

use crate::task::wheel_velocity::WheelSide;

/// A named latest-value slot
pub struct SharedChannel<M: RawMutex, T: Copy> {
    name: &'static str,
    value: Mutex<M, Cell<T>>,
}

impl<M: RawMutex, T: Copy> SharedChannel<M, T> {
    pub const fn new(name: &'static str, initial: T) -> Self {
        Self {
            name,
            value: Mutex::new(Cell::new(initial)),
        }
    }

    /// Copy of the latest value
    pub fn get(&self) -> T {
        self.value.lock(|cell| cell.get())
    }

    /// Replace the value
    pub fn put(&self, value: T) {
        self.value.lock(|cell| cell.set(value));
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Binary handshake signal
pub type Flag<M> = SharedChannel<M, bool>;

/// Every channel the tasks communicate through
pub struct Channels<M: RawMutex> {
    pub velocity_left_ref: SharedChannel<M, f32>,
    pub velocity_left_meas: SharedChannel<M, f32>,
    pub velocity_right_ref: SharedChannel<M, f32>,
    pub velocity_right_meas: SharedChannel<M, f32>,
    /// Set once when the IMU reports full calibration, never cleared
    pub calibrated: Flag<M>,
    /// Raised for the duration of the bump maneuver
    pub bump: Flag<M>,
    /// Raised when the course is complete and the robot heads home
    pub end: Flag<M>,
}

impl<M: RawMutex> Channels<M> {
    pub const fn new() -> Self {
        Self {
            velocity_left_ref: SharedChannel::new("velocity_left_ref", 0.0),
            velocity_left_meas: SharedChannel::new("velocity_left_meas", 0.0),
            velocity_right_ref: SharedChannel::new("velocity_right_ref", 0.0),
            velocity_right_meas: SharedChannel::new("velocity_right_meas", 0.0),
            calibrated: SharedChannel::new("calibrated", false),
            bump: SharedChannel::new("bump", false),
            end: SharedChannel::new("end", false),
        }
    }

    /// The subset of channels one wheel task uses
    pub fn wheel(&self, side: WheelSide) -> WheelChannels<'_, M> {
        let (reference, measured) = match side {
            WheelSide::Left => (&self.velocity_left_ref, &self.velocity_left_meas),
            WheelSide::Right => (&self.velocity_right_ref, &self.velocity_right_meas),
        };
        WheelChannels {
            reference,
            measured,
            calibrated: &self.calibrated,
            bump: &self.bump,
            end: &self.end,
        }
    }
}

impl<M: RawMutex> Default for Channels<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Channels seen by a single wheel task
pub struct WheelChannels<'a, M: RawMutex> {
    /// Angular velocity reference, read
    pub reference: &'a SharedChannel<M, f32>,
    /// Measured angular velocity, written
    pub measured: &'a SharedChannel<M, f32>,
    pub calibrated: &'a Flag<M>,
    pub bump: &'a Flag<M>,
    pub end: &'a Flag<M>,
}

impl<M: RawMutex> WheelChannels<'_, M> {
    /// True while either flag tells the wheel loop to hold
    pub fn hold_requested(&self) -> bool {
        self.bump.get() || self.end.get()
    }
}

/// Channels shared by the firmware tasks
pub static CHANNELS: Channels<CriticalSectionRawMutex> = Channels::new();
