//! Wheel Velocity Task
//!
//! Closes the angular velocity loop of one wheel. The mission task publishes
//! the reference; this task publishes the measurement back.
//!
//! # States
//! - Setup: enable the actuator at zero duty, wait for the calibration flag
//! - Running: sample the encoder, run the PI loop, drive the actuator
//! - Held: the bump or end flag is up and the mission task owns the
//!   actuator; the duty is left as is and the controller keeps its integral

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Duration, Instant};

use crate::config::WheelConfig;
use crate::control::odometry::Odometry;
use crate::control::pi::PiController;
use crate::system::channel::WheelChannels;
use crate::system::hardware::{Actuator, QuadratureCounter};
use crate::system::state::WheelTaskState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WheelSide {
    Left,
    Right,
}

pub struct WheelVelocityTask<'a, M: RawMutex, A, C> {
    side: WheelSide,
    actuator: A,
    counter: C,
    channels: WheelChannels<'a, M>,
    config: WheelConfig,
    odometry: Odometry,
    controller: PiController,
    state: WheelTaskState,
    last_tick: Option<Instant>,
}

impl<'a, M, A, C> WheelVelocityTask<'a, M, A, C>
where
    M: RawMutex,
    A: Actuator,
    C: QuadratureCounter,
{
    pub fn new(side: WheelSide, actuator: A, mut counter: C, channels: WheelChannels<'a, M>, config: WheelConfig) -> Self {
        let odometry = Odometry::new(counter.count());
        Self {
            side,
            actuator,
            counter,
            channels,
            controller: Self::controller(&config),
            config,
            odometry,
            state: WheelTaskState::Setup,
            last_tick: None,
        }
    }

    fn controller(config: &WheelConfig) -> PiController {
        PiController::new(config.kp, config.ki).with_output_limit(config.duty_limit)
    }

    pub fn state(&self) -> WheelTaskState {
        self.state
    }

    pub fn side(&self) -> WheelSide {
        self.side
    }

    pub fn odometry(&self) -> &Odometry {
        &self.odometry
    }

    /// Run one invocation; `now` is the scheduler's dispatch time
    pub fn tick(&mut self, now: Instant) -> WheelTaskState {
        self.state = match self.state {
            WheelTaskState::Setup => self.setup(now),
            WheelTaskState::Running => self.run(now),
            WheelTaskState::Held => self.hold(),
        };
        self.state
    }

    fn setup(&mut self, now: Instant) -> WheelTaskState {
        self.actuator.enable();
        self.actuator.set_duty(0.0);
        self.odometry.zero();
        self.controller = Self::controller(&self.config);
        self.last_tick = Some(now);

        if self.channels.calibrated.get() {
            info!("{} wheel loop running", self.side);
            WheelTaskState::Running
        } else {
            WheelTaskState::Setup
        }
    }

    fn run(&mut self, now: Instant) -> WheelTaskState {
        let elapsed = self
            .last_tick
            .map_or(Duration::from_ticks(0), |last| now.saturating_duration_since(last));
        self.last_tick = Some(now);

        self.odometry.update(self.counter.count());
        let measured = self.odometry.velocity(elapsed, self.config.counts_per_rev);
        let reference = self.channels.reference.get();

        let dt = self.config.period.as_micros() as f32 / 1_000_000.0;
        let duty = self.controller.step(reference, measured, dt);
        self.actuator.set_duty(duty);
        self.channels.measured.put(measured);

        trace!("{} wheel ref {} meas {} duty {}", self.side, reference, measured, duty);

        if self.channels.hold_requested() {
            debug!("{} wheel loop held", self.side);
            WheelTaskState::Held
        } else {
            WheelTaskState::Running
        }
    }

    fn hold(&mut self) -> WheelTaskState {
        if self.channels.hold_requested() {
            WheelTaskState::Held
        } else {
            debug!("{} wheel loop resumed", self.side);
            WheelTaskState::Running
        }
    }
}
