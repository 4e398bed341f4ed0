//! Direction/PWM motor channel
//!
//! One channel of the Romi power distribution board: a PWM input sets the
//! effort, a DIR pin picks the rotation and an active-high enable (nSLEEP)
//! wakes the bridge. Duty is signed percent, clamped to the duty limit.
//!
//! | duty   | DIR  | PWM     |
//! |--------|------|---------|
//! | >= 0   | low  | duty    |
//! | < 0    | high | -duty   |

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;

use crate::config::DUTY_LIMIT;
use crate::system::hardware::Actuator;

/// Resolution of the duty fraction handed to the PWM peripheral
const DUTY_RESOLUTION: u16 = 1000;

pub struct DirectionPwmMotor<P, D, E> {
    pwm: P,
    direction: D,
    enable: E,
    duty: f32,
}

impl<P, D, E> DirectionPwmMotor<P, D, E>
where
    P: SetDutyCycle,
    D: OutputPin,
    E: OutputPin,
{
    /// Starts asleep, direction forward, zero effort
    pub fn new(pwm: P, direction: D, enable: E) -> Self {
        let mut motor = Self {
            pwm,
            direction,
            enable,
            duty: 0.0,
        };
        motor.disable();
        motor.set_duty(0.0);
        motor
    }

    /// Last duty applied, after clamping
    pub fn duty(&self) -> f32 {
        self.duty
    }
}

impl<P, D, E> Actuator for DirectionPwmMotor<P, D, E>
where
    P: SetDutyCycle,
    D: OutputPin,
    E: OutputPin,
{
    fn enable(&mut self) {
        if self.enable.set_high().is_err() {
            warn!("motor enable pin write failed");
        }
    }

    fn disable(&mut self) {
        if self.enable.set_low().is_err() {
            warn!("motor enable pin write failed");
        }
    }

    fn set_duty(&mut self, duty: f32) {
        let duty = duty.clamp(-DUTY_LIMIT, DUTY_LIMIT);
        self.duty = duty;

        let direction = if duty >= 0.0 {
            self.direction.set_low()
        } else {
            self.direction.set_high()
        };
        if direction.is_err() {
            warn!("motor direction pin write failed");
        }

        let magnitude = (libm::fabsf(duty) * (DUTY_RESOLUTION as f32 / 100.0)) as u16;
        if self.pwm.set_duty_cycle_fraction(magnitude, DUTY_RESOLUTION).is_err() {
            warn!("motor pwm write failed");
        }
    }
}
