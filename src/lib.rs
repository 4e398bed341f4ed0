//! Line tracker motion-control core
//!
//! Board-agnostic control logic for a differential-drive robot that follows a
//! line course, escapes a bump with a timed maneuver and drives back to its
//! start heading. Everything here is `no_std` and takes hardware through the
//! traits in [`system::hardware`]; the firmware binary binds them to the
//! RP2350 and invokes the task state machines from embassy tickers.
//!
//! # Layout
//! - [`control`]: odometry, line centroid, PI controller, drive kinematics
//! - [`drivers`]: BNO055 IMU, direction/PWM motor, quadrature decoder
//! - [`system`]: shared channels, hardware traits, state tags
//! - [`task`]: wheel velocity and mission control state machines
//! - [`config`]: tuning constants and geometry

#![cfg_attr(not(test), no_std)]

// must come first so the macros are visible to the other modules
mod fmt;

pub mod config;
pub mod control;
pub mod drivers;
pub mod system;
pub mod task;

#[cfg(test)]
mod testing;
