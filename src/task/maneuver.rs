//! Open-loop wheel commands shared by the timed maneuvers

use crate::system::hardware::Actuator;

/// What one wheel does during a maneuver phase
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WheelCommand {
    /// Enabled at the given signed duty
    Drive(f32),
    /// Driver asleep, wheel coasting
    Disabled,
}

impl WheelCommand {
    pub fn apply<A: Actuator>(self, actuator: &mut A) {
        match self {
            WheelCommand::Drive(duty) => {
                actuator.enable();
                actuator.set_duty(duty);
            }
            WheelCommand::Disabled => actuator.disable(),
        }
    }
}

/// Commands for both wheels
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DriveCommand {
    pub left: WheelCommand,
    pub right: WheelCommand,
}

impl DriveCommand {
    pub const fn both(duty: f32) -> Self {
        Self::split(duty, duty)
    }

    pub const fn split(left: f32, right: f32) -> Self {
        Self {
            left: WheelCommand::Drive(left),
            right: WheelCommand::Drive(right),
        }
    }

    pub const fn stopped() -> Self {
        Self {
            left: WheelCommand::Disabled,
            right: WheelCommand::Disabled,
        }
    }
}
