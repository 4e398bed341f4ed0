//! Proportional-integral controller
//!
//! Works in `no_std` and does not allocate. The caller supplies the time step
//! on every call; there is no internal clock.
//!
//! The integrator is never reset or clamped. The wheel loops keep their
//! integral across the hold periods of the bump maneuver and the return-home
//! leg, so a long hold followed by a large error can wind up.

/// PI controller with an optional symmetric output clamp
#[derive(Debug, Clone, PartialEq)]
pub struct PiController {
    /// Proportional gain
    kp: f32,
    /// Integral gain, zero for a pure proportional loop
    ki: f32,
    /// Integrator state
    integral: f32,
    /// Error of the most recent step
    last_error: f32,
    /// Output clamp, `None` for an unbounded output
    limit: Option<f32>,
}

impl PiController {
    pub fn new(kp: f32, ki: f32) -> Self {
        Self {
            kp,
            ki,
            integral: 0.0,
            last_error: 0.0,
            limit: None,
        }
    }

    /// Pure proportional controller
    pub fn proportional(kp: f32) -> Self {
        Self::new(kp, 0.0)
    }

    /// Clamp the output to `[-limit, limit]`
    pub fn with_output_limit(mut self, limit: f32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Run one control step
    ///
    /// `dt` is the time step in seconds.
    pub fn step(&mut self, reference: f32, measured: f32, dt: f32) -> f32 {
        let error = reference - measured;
        self.integral += error * dt;
        self.last_error = error;

        let output = self.kp * error + self.ki * self.integral;
        match self.limit {
            Some(limit) => output.clamp(-limit, limit),
            None => output,
        }
    }

    pub fn integral(&self) -> f32 {
        self.integral
    }

    pub fn last_error(&self) -> f32 {
        self.last_error
    }
}
