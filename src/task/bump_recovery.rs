//! Bump escape maneuver
//!
//! A fixed, time-scheduled path around the obstacle: back off, pivot right,
//! drive past, pivot left, drive back toward the line. Nothing is sensed
//! while it runs. Each pivot phase records its entry time the first tick it
//! is reached, and the phases after it are measured from that entry.

use embassy_time::Instant;

use crate::config::RecoveryTiming;
use crate::task::maneuver::{DriveCommand, WheelCommand};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecoveryPhase {
    Reverse,
    PivotRight,
    ForwardRight,
    PivotLeft,
    ForwardLeft,
    /// Maneuver over, hand control back to line following
    Complete,
}

pub struct BumpRecovery {
    timing: RecoveryTiming,
    started: Instant,
    right_pivot_at: Option<Instant>,
    left_pivot_at: Option<Instant>,
}

impl BumpRecovery {
    pub fn start(timing: RecoveryTiming, now: Instant) -> Self {
        Self {
            timing,
            started: now,
            right_pivot_at: None,
            left_pivot_at: None,
        }
    }

    /// Phase for `now`, latching pivot entry times as they are reached
    pub fn phase(&mut self, now: Instant) -> RecoveryPhase {
        let timing = &self.timing;
        if now.saturating_duration_since(self.started) <= timing.reverse {
            return RecoveryPhase::Reverse;
        }

        let right_pivot_at = *self.right_pivot_at.get_or_insert(now);
        let since_right = now.saturating_duration_since(right_pivot_at);
        if since_right <= timing.pivot_right {
            return RecoveryPhase::PivotRight;
        }
        if since_right <= timing.forward_after_right {
            return RecoveryPhase::ForwardRight;
        }

        let left_pivot_at = *self.left_pivot_at.get_or_insert(now);
        let since_left = now.saturating_duration_since(left_pivot_at);
        if since_left <= timing.pivot_left {
            RecoveryPhase::PivotLeft
        } else if since_left <= timing.forward_after_left {
            RecoveryPhase::ForwardLeft
        } else {
            RecoveryPhase::Complete
        }
    }

    /// Wheel commands for a phase; `None` once the maneuver is complete
    pub fn command(&self, phase: RecoveryPhase) -> Option<DriveCommand> {
        let timing = &self.timing;
        let command = match phase {
            RecoveryPhase::Reverse => DriveCommand::both(timing.reverse_duty),
            RecoveryPhase::PivotRight => DriveCommand {
                left: WheelCommand::Drive(timing.drive_duty),
                right: WheelCommand::Disabled,
            },
            RecoveryPhase::ForwardRight => DriveCommand::both(timing.drive_duty),
            RecoveryPhase::PivotLeft => DriveCommand {
                left: WheelCommand::Disabled,
                right: WheelCommand::Drive(timing.drive_duty),
            },
            RecoveryPhase::ForwardLeft => DriveCommand::split(timing.trimmed_left_duty, timing.drive_duty),
            RecoveryPhase::Complete => return None,
        };
        Some(command)
    }
}
