//! Differential-drive kinematics
//!
//! Body frame: linear velocity `v` along the heading in m/s, yaw rate `ψ̇` in
//! rad/s, counter-clockwise positive. Wheel angular velocities in rad/s.

use crate::config::DriveGeometry;

impl DriveGeometry {
    /// Wheel angular velocity references for a body command
    ///
    /// Returns `(left, right)`.
    pub fn wheel_references(&self, linear: f32, yaw_rate: f32) -> (f32, f32) {
        let r = self.wheel_radius;
        let turn = self.trackwidth / (2.0 * r) * yaw_rate;
        (linear / r - turn, linear / r + turn)
    }

    /// Body linear velocity from the measured wheel speeds
    pub fn linear_velocity(&self, left: f32, right: f32) -> f32 {
        (left + right) * self.wheel_radius / 2.0
    }

    /// Body yaw rate from the measured wheel speeds
    pub fn yaw_rate(&self, left: f32, right: f32) -> f32 {
        (right - left) * self.wheel_radius / self.trackwidth
    }
}
