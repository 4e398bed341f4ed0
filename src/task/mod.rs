//! Task state machines
//!
//! Each task is an object whose `tick` runs one invocation and returns the
//! state tag it ends in. Timers and controllers live in the task object, and
//! the periodic invocation comes from the firmware's tickers.
pub mod bump_recovery;
pub mod maneuver;
pub mod mission_control;
pub mod return_home;
pub mod wheel_velocity;
