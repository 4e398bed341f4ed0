//! Return-home maneuver
//!
//! Roll past the finish marking, rotate in place until the heading matches
//! the one latched at the start, pause, then drive a fixed time toward the
//! start box and park. The final leg is timed, not measured, so its length
//! only fits the track it was tuned on.

use embassy_time::Instant;

use crate::config::ReturnHomeTiming;
use crate::task::maneuver::DriveCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReturnPhase {
    Approach,
    Rotate,
    Pause,
    DriveHome,
    /// Both drivers asleep; terminal
    Parked,
}

/// Signed heading error in degrees, wrapped to `[-180, 180]`
pub fn heading_error(heading: f32, target: f32) -> f32 {
    libm::remainderf(heading - target, 360.0)
}

pub struct ReturnHome {
    timing: ReturnHomeTiming,
    started: Instant,
    target_heading: f32,
    aligned_at: Option<Instant>,
}

impl ReturnHome {
    pub fn start(timing: ReturnHomeTiming, now: Instant, target_heading: f32) -> Self {
        Self {
            timing,
            started: now,
            target_heading,
            aligned_at: None,
        }
    }

    /// Phase for `now` given the current heading in degrees
    pub fn phase(&mut self, now: Instant, heading: f32) -> ReturnPhase {
        let timing = &self.timing;
        if now.saturating_duration_since(self.started) <= timing.approach {
            return ReturnPhase::Approach;
        }

        let aligned_at = match self.aligned_at {
            Some(at) => at,
            None => {
                if libm::fabsf(heading_error(heading, self.target_heading)) >= timing.heading_tolerance {
                    return ReturnPhase::Rotate;
                }
                debug!("aligned with start heading {}", self.target_heading);
                *self.aligned_at.insert(now)
            }
        };

        let since = now.saturating_duration_since(aligned_at);
        if since <= timing.pause {
            ReturnPhase::Pause
        } else if since <= timing.drive_home {
            ReturnPhase::DriveHome
        } else {
            ReturnPhase::Parked
        }
    }

    pub fn command(&self, phase: ReturnPhase) -> DriveCommand {
        let timing = &self.timing;
        match phase {
            ReturnPhase::Approach => DriveCommand::both(timing.approach_duty),
            ReturnPhase::Rotate => DriveCommand::split(-timing.rotate_duty, timing.rotate_duty),
            ReturnPhase::Pause => DriveCommand::both(0.0),
            ReturnPhase::DriveHome => DriveCommand::split(timing.home_left_duty, timing.home_right_duty),
            ReturnPhase::Parked => DriveCommand::stopped(),
        }
    }
}
