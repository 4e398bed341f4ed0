//! Mission Control Task
//!
//! Body-level state machine. It is the only writer of the wheel velocity
//! references and the only reader of the wheel measurements, and it raises
//! the flags that hand the actuators over from the wheel loops to the timed
//! maneuvers.
//!
//! # States
//! - Setup: configure the IMU, wait for full calibration, settle, latch the
//!   start heading
//! - Line follow: steer from the line centroid through the body loops,
//!   watch the bumper and the all-black finish marking
//! - Bump recover: timed escape around the obstacle
//! - Return home: rotate back to the start heading and drive to the start
//!
//! # Completion detection
//! Wide markings right after the start and right after a bump escape must
//! not end the run, so the all-black test is staged on the time since the
//! last reference point (end of setup or end of the last escape):
//!
//! | Regime                           | Black sensors | Effect                  |
//! |----------------------------------|---------------|-------------------------|
//! | escape done, >= arming delay     | >= 4          | end flag, return home   |
//! | <= arming delay                  | >= 3          | straight at 0.2 m/s     |
//! | otherwise                        | >= 5          | straight at 0.25 m/s    |

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Duration, Instant};
use embedded_hal::digital::InputPin;

use crate::config::{LineFollowConfig, MissionConfig, BUMP_SWITCH_COUNT, LINE_SENSOR_COUNT};
use crate::control::centroid::{normalize, LineCentroid, LineReading};
use crate::control::pi::PiController;
use crate::system::channel::Channels;
use crate::system::hardware::{Actuator, FusionMode, InertialSensor, LineSensor};
use crate::system::state::MissionState;
use crate::task::bump_recovery::{BumpRecovery, RecoveryPhase};
use crate::task::maneuver::DriveCommand;
use crate::task::return_home::ReturnHome;

/// Yaw-rate command for a centroid sum
///
/// Returns the command in rad/s and whether the turn counts as sharp.
pub fn yaw_rate_command(sum: i32, config: &LineFollowConfig) -> (f32, bool) {
    let magnitude = sum.abs();
    let (rate, sharp) = if magnitude <= config.straight_band {
        (0.0, false)
    } else if magnitude <= config.gentle_band {
        (config.gentle_yaw_rate, false)
    } else {
        (config.sharp_yaw_rate, true)
    };
    (if sum < 0 { -rate } else { rate }, sharp)
}

enum Mode {
    Setup { calibrated_at: Option<Instant> },
    LineFollow,
    BumpRecover(BumpRecovery),
    ReturnHome(ReturnHome),
}

impl Mode {
    fn state(&self) -> MissionState {
        match self {
            Mode::Setup { .. } => MissionState::Setup,
            Mode::LineFollow => MissionState::LineFollow,
            Mode::BumpRecover(_) => MissionState::BumpRecover,
            Mode::ReturnHome(_) => MissionState::ReturnHome,
        }
    }
}

pub struct MissionControlTask<'a, M: RawMutex, A, I, S, B> {
    left: A,
    right: A,
    imu: I,
    line_sensors: [S; LINE_SENSOR_COUNT],
    bumpers: [B; BUMP_SWITCH_COUNT],
    channels: &'a Channels<M>,
    config: MissionConfig,
    linear: PiController,
    yaw: PiController,
    centroid: LineCentroid,
    mode: Mode,
    first_tick: Option<Instant>,
    imu_configured: bool,
    calibration_warned: bool,
    init_heading: f32,
    last_heading: f32,
    /// Start of the current completion-detection window
    reference_time: Instant,
    /// A bump escape has finished at least once; never cleared
    bump_recovered: bool,
    sharp_turn_at: Option<Instant>,
}

impl<'a, M, A, I, S, B> MissionControlTask<'a, M, A, I, S, B>
where
    M: RawMutex,
    A: Actuator,
    I: InertialSensor,
    S: LineSensor,
    B: InputPin,
{
    pub fn new(
        left: A,
        right: A,
        imu: I,
        line_sensors: [S; LINE_SENSOR_COUNT],
        bumpers: [B; BUMP_SWITCH_COUNT],
        channels: &'a Channels<M>,
        config: MissionConfig,
    ) -> Self {
        Self {
            left,
            right,
            imu,
            line_sensors,
            bumpers,
            channels,
            linear: PiController::proportional(config.line.linear_kp),
            yaw: PiController::proportional(config.line.yaw_kp),
            config,
            centroid: LineCentroid::new(),
            mode: Mode::Setup { calibrated_at: None },
            first_tick: None,
            imu_configured: false,
            calibration_warned: false,
            init_heading: 0.0,
            last_heading: 0.0,
            reference_time: Instant::from_ticks(0),
            bump_recovered: false,
            sharp_turn_at: None,
        }
    }

    pub fn state(&self) -> MissionState {
        self.mode.state()
    }

    /// Heading latched at the end of setup, in degrees
    pub fn init_heading(&self) -> f32 {
        self.init_heading
    }

    pub fn centroid(&self) -> &LineCentroid {
        &self.centroid
    }

    /// Run one invocation; `now` is the scheduler's dispatch time
    pub fn tick(&mut self, now: Instant) -> MissionState {
        let first_tick = *self.first_tick.get_or_insert(now);
        let next = match &mut self.mode {
            Mode::Setup { calibrated_at } => {
                let calibrated_at = *calibrated_at;
                self.setup(now, first_tick, calibrated_at)
            }
            Mode::LineFollow => self.line_follow(now),
            Mode::BumpRecover(recovery) => {
                let phase = recovery.phase(now);
                let command = recovery.command(phase);
                self.bump_recover(now, phase, command)
            }
            Mode::ReturnHome(_) => self.return_home(now),
        };

        if let Some(mode) = next {
            let state = mode.state();
            if state != self.mode.state() {
                info!("mission {} -> {}", self.mode.state(), state);
            }
            self.mode = mode;
        }
        self.mode.state()
    }

    fn setup(&mut self, now: Instant, first_tick: Instant, calibrated_at: Option<Instant>) -> Option<Mode> {
        if !self.imu_configured {
            match self.imu.set_mode(FusionMode::Ndof) {
                Ok(()) => self.imu_configured = true,
                Err(_) => {
                    warn!("imu mode write failed");
                    return None;
                }
            }
        }

        let calibrated_at = match calibrated_at {
            Some(at) => at,
            None => {
                let status = match self.imu.calibration_status() {
                    Ok(status) => status,
                    Err(_) => {
                        warn!("imu calibration status read failed");
                        return None;
                    }
                };
                debug!("imu calibration {}", status);
                if !status.is_fully_calibrated() {
                    if !self.calibration_warned
                        && now.saturating_duration_since(first_tick) >= self.config.calibration_warning
                    {
                        warn!("imu still not calibrated after {} s", self.config.calibration_warning.as_secs());
                        self.calibration_warned = true;
                    }
                    return None;
                }
                info!("imu calibration complete");
                self.channels.calibrated.put(true);
                return Some(Mode::Setup { calibrated_at: Some(now) });
            }
        };

        if now.saturating_duration_since(calibrated_at) < self.config.settle {
            return None;
        }

        match self.imu.heading() {
            Ok(heading) => {
                info!("start heading {}", heading);
                self.init_heading = heading;
                self.last_heading = heading;
                self.reference_time = now;
                Some(Mode::LineFollow)
            }
            Err(_) => {
                warn!("imu heading read failed");
                None
            }
        }
    }

    fn bump_pressed(&mut self) -> bool {
        self.bumpers.iter_mut().any(|bumper| bumper.is_low().unwrap_or(false))
    }

    fn read_line(&mut self) -> LineReading {
        let mut readings = [0; LINE_SENSOR_COUNT];
        for (reading, sensor) in readings.iter_mut().zip(self.line_sensors.iter_mut()) {
            let raw = sensor.read_raw();
            if raw.is_err() {
                warn!("line sensor timed out");
            }
            *reading = normalize(raw, &self.config.line);
        }
        readings
    }

    fn line_follow(&mut self, now: Instant) -> Option<Mode> {
        if self.bump_pressed() {
            info!("bumped");
            self.channels.bump.put(true);
            return Some(Mode::BumpRecover(BumpRecovery::start(self.config.recovery, now)));
        }

        let readings = self.read_line();
        let sum = self.centroid.weighted_sum(&readings);
        let line = self.config.line;

        let (mut yaw_command, sharp) = yaw_rate_command(sum, &line);
        if sharp {
            self.sharp_turn_at = Some(now);
        }
        let recently_sharp = self
            .sharp_turn_at
            .is_some_and(|at| now.saturating_duration_since(at) < line.sharp_turn_hold);
        let mut linear_command = if recently_sharp { line.slow_speed } else { line.nominal_speed };

        let completion = self.config.completion;
        let elapsed = now.saturating_duration_since(self.reference_time);
        let black = self.centroid.black_count();
        if self.bump_recovered && elapsed >= completion.arming_delay {
            if black >= completion.finish_black_count {
                info!("course complete, returning home");
                self.channels.end.put(true);
                return Some(Mode::ReturnHome(ReturnHome::start(
                    self.config.return_home,
                    now,
                    self.init_heading,
                )));
            }
        } else if elapsed <= completion.arming_delay {
            if black >= completion.early_black_count {
                yaw_command = 0.0;
                linear_command = completion.early_speed;
            }
        } else if black >= completion.late_black_count {
            yaw_command = 0.0;
            linear_command = completion.late_speed;
        }

        let geometry = self.config.geometry;
        let left_measured = self.channels.velocity_left_meas.get();
        let right_measured = self.channels.velocity_right_meas.get();
        let linear_measured = geometry.linear_velocity(left_measured, right_measured);
        let yaw_measured = geometry.yaw_rate(left_measured, right_measured);

        // sampled for the log only, the loop runs on the encoder yaw rate
        if let Ok(rate) = self.imu.yaw_rate() {
            trace!("imu yaw rate {} deg/s, encoder {} rad/s", rate, yaw_measured);
        }

        let dt = seconds(self.config.period);
        let linear_reference = self.linear.step(linear_command, linear_measured, dt);
        let yaw_reference = self.yaw.step(yaw_command, yaw_measured, dt);
        let (left_reference, right_reference) = geometry.wheel_references(linear_reference, yaw_reference);
        self.channels.velocity_left_ref.put(left_reference);
        self.channels.velocity_right_ref.put(right_reference);

        trace!(
            "line {} sum {} v {} yaw {} refs {} {}",
            readings,
            sum,
            linear_command,
            yaw_command,
            left_reference,
            right_reference
        );
        None
    }

    fn bump_recover(&mut self, now: Instant, phase: RecoveryPhase, command: Option<DriveCommand>) -> Option<Mode> {
        match command {
            Some(command) => {
                trace!("recovery {}", phase);
                self.drive(command);
                None
            }
            None => {
                self.reference_time = now;
                self.bump_recovered = true;
                self.channels.bump.put(false);
                Some(Mode::LineFollow)
            }
        }
    }

    fn return_home(&mut self, now: Instant) -> Option<Mode> {
        match self.imu.heading() {
            Ok(heading) => self.last_heading = heading,
            Err(_) => warn!("imu heading read failed, keeping {}", self.last_heading),
        }
        let heading = self.last_heading;
        if let Mode::ReturnHome(home) = &mut self.mode {
            let phase = home.phase(now, heading);
            let command = home.command(phase);
            trace!("return home {} heading {}", phase, heading);
            self.drive(command);
        }
        None
    }

    fn drive(&mut self, command: DriveCommand) {
        command.left.apply(&mut self.left);
        command.right.apply(&mut self.right);
    }
}

fn seconds(duration: Duration) -> f32 {
    duration.as_micros() as f32 / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::hardware::{SensorTimeout, SharedActuator};
    use crate::testing::{show_line, FakeImu, FakeLineSensor, FakeMotor, FakeSwitch};
    use approx::assert_relative_eq;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    type Motor = SharedActuator<NoopRawMutex, FakeMotor>;
    type Task<'a> = MissionControlTask<'a, NoopRawMutex, &'a Motor, &'a FakeImu, &'a FakeLineSensor, &'a FakeSwitch>;

    const PERIOD_MS: u64 = 8;

    struct Rig {
        left: Motor,
        right: Motor,
        imu: FakeImu,
        sensors: [FakeLineSensor; 8],
        bumpers: [FakeSwitch; 3],
        channels: Channels<NoopRawMutex>,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                left: Motor::new(FakeMotor::default()),
                right: Motor::new(FakeMotor::default()),
                imu: FakeImu::default(),
                sensors: Default::default(),
                bumpers: Default::default(),
                channels: Channels::new(),
            }
        }

        fn task(&self) -> Task<'_> {
            MissionControlTask::new(
                &self.left,
                &self.right,
                &self.imu,
                self.sensors.each_ref(),
                self.bumpers.each_ref(),
                &self.channels,
                MissionConfig::default(),
            )
        }

        fn motors(&self) -> (FakeMotor, FakeMotor) {
            (self.left.lock(|m| *m), self.right.lock(|m| *m))
        }
    }

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    /// Calibrate, settle and enter line following; returns the next free tick time
    fn start_line_follow(rig: &Rig, task: &mut Task<'_>) -> u64 {
        rig.imu.calibrate();
        rig.imu.heading.set(42.0);
        assert_eq!(task.tick(at(0)), MissionState::Setup);
        assert_eq!(task.tick(at(10_000)), MissionState::LineFollow);
        10_000 + PERIOD_MS
    }

    /// Hit the center bumper at `from` and run the escape; returns the tick
    /// that resumed line following
    fn escape_bump(rig: &Rig, task: &mut Task<'_>, from: u64) -> u64 {
        rig.bumpers[1].pressed.set(true);
        assert_eq!(task.tick(at(from)), MissionState::BumpRecover);
        rig.bumpers[1].pressed.set(false);

        let mut t = from;
        loop {
            t += PERIOD_MS;
            if task.tick(at(t)) == MissionState::LineFollow {
                return t;
            }
            assert!(t < from + 10_000, "escape never finished");
        }
    }

    fn run_until(task: &mut Task<'_>, from: u64, to: u64) -> MissionState {
        let mut t = from;
        let mut state = task.state();
        while t <= to {
            state = task.tick(at(t));
            t += PERIOD_MS;
        }
        state
    }

    #[test]
    fn yaw_banding() {
        let config = LineFollowConfig::default();
        let commands: Vec<f32> = [-1, -2, -11, -12, 1, 11, 12]
            .iter()
            .map(|&sum| yaw_rate_command(sum, &config).0)
            .collect();
        assert_eq!(commands, vec![0.0, -3.0, -3.0, -5.0, 0.0, 3.0, 5.0]);
        assert!(yaw_rate_command(-12, &config).1);
        assert!(yaw_rate_command(14, &config).1);
        assert!(!yaw_rate_command(11, &config).1);
    }

    #[test]
    fn setup_waits_for_full_calibration() {
        let rig = Rig::new();
        let mut task = rig.task();

        assert_eq!(task.tick(at(0)), MissionState::Setup);
        assert_eq!(rig.imu.mode.get(), Some(FusionMode::Ndof));
        assert!(!rig.channels.calibrated.get());

        rig.imu.status.set(crate::system::state::CalibrationStatus::from_register(0xFE));
        assert_eq!(task.tick(at(8)), MissionState::Setup);
        assert!(!rig.channels.calibrated.get());

        rig.imu.calibrate();
        assert_eq!(task.tick(at(16)), MissionState::Setup);
        assert!(rig.channels.calibrated.get());

        // settle interval before the start heading is latched
        rig.imu.heading.set(123.5);
        assert_eq!(task.tick(at(5_000)), MissionState::Setup);
        assert_eq!(task.tick(at(10_016)), MissionState::LineFollow);
        assert_eq!(task.init_heading(), 123.5);
    }

    #[test]
    fn imu_errors_keep_setup_waiting() {
        let rig = Rig::new();
        let mut task = rig.task();
        rig.imu.failing.set(true);
        rig.imu.calibrate();
        assert_eq!(task.tick(at(0)), MissionState::Setup);
        assert!(!rig.channels.calibrated.get());

        rig.imu.failing.set(false);
        assert_eq!(task.tick(at(8)), MissionState::Setup);
        assert!(rig.channels.calibrated.get());
    }

    #[test]
    fn calibration_flag_releases_both_wheel_tasks() {
        use crate::system::state::WheelTaskState;
        use crate::task::wheel_velocity::{WheelSide, WheelVelocityTask};
        use crate::testing::FakeCounter;
        use crate::config::WheelConfig;

        let rig = Rig::new();
        let (left_counter, right_counter) = (FakeCounter::default(), FakeCounter::default());
        let mut left = WheelVelocityTask::new(
            WheelSide::Left,
            &rig.left,
            &left_counter,
            rig.channels.wheel(WheelSide::Left),
            WheelConfig::default(),
        );
        let mut right = WheelVelocityTask::new(
            WheelSide::Right,
            &rig.right,
            &right_counter,
            rig.channels.wheel(WheelSide::Right),
            WheelConfig::default(),
        );
        let mut mission = rig.task();

        assert_eq!(left.tick(at(0)), WheelTaskState::Setup);
        assert_eq!(right.tick(at(0)), WheelTaskState::Setup);
        assert_eq!(mission.tick(at(0)), MissionState::Setup);

        rig.imu.calibrate();
        mission.tick(at(8));
        assert_eq!(left.tick(at(12)), WheelTaskState::Running);
        assert_eq!(right.tick(at(12)), WheelTaskState::Running);
    }

    #[test]
    fn centered_line_drives_straight() {
        let rig = Rig::new();
        let mut task = rig.task();
        let t = start_line_follow(&rig, &mut task);

        show_line(&rig.sensors, [0, 0, 0, 1, 1, 0, 0, 0]);
        assert_eq!(task.tick(at(t)), MissionState::LineFollow);

        // P loop on a standing robot: 1.75 * 0.2 m/s
        let left = rig.channels.velocity_left_ref.get();
        let right = rig.channels.velocity_right_ref.get();
        assert_relative_eq!(left, 1.75 * 0.2 / 0.035, epsilon = 1e-4);
        assert_relative_eq!(left, right);
    }

    #[test]
    fn line_to_the_right_turns_right_wheel_faster() {
        let rig = Rig::new();
        let mut task = rig.task();
        let t = start_line_follow(&rig, &mut task);

        show_line(&rig.sensors, [0, 0, 0, 0, 1, 1, 0, 0]);
        task.tick(at(t));
        assert_eq!(task.centroid().last_sum(), 3);

        let geometry = MissionConfig::default().geometry;
        let (left, right) = geometry.wheel_references(1.75 * 0.2, 1.75 * 3.0);
        assert_relative_eq!(rig.channels.velocity_left_ref.get(), left, epsilon = 1e-3);
        assert_relative_eq!(rig.channels.velocity_right_ref.get(), right, epsilon = 1e-3);
    }

    #[test]
    fn sharp_turn_slows_down_for_two_seconds() {
        let rig = Rig::new();
        let mut task = rig.task();
        let t = start_line_follow(&rig, &mut task);
        let geometry = MissionConfig::default().geometry;

        show_line(&rig.sensors, [0, 0, 0, 0, 0, 0, 1, 1]);
        task.tick(at(t));
        let (left, _) = geometry.wheel_references(1.75 * 0.065, 1.75 * 5.0);
        assert_relative_eq!(rig.channels.velocity_left_ref.get(), left, epsilon = 1e-3);

        show_line(&rig.sensors, [0; 8]);
        task.tick(at(t + 1_992));
        let (left, _) = geometry.wheel_references(1.75 * 0.065, 0.0);
        assert_relative_eq!(rig.channels.velocity_left_ref.get(), left, epsilon = 1e-3);

        task.tick(at(t + 2_000));
        let (left, _) = geometry.wheel_references(1.75 * 0.2, 0.0);
        assert_relative_eq!(rig.channels.velocity_left_ref.get(), left, epsilon = 1e-3);
    }

    #[test]
    fn early_marking_goes_straight_without_finishing() {
        let rig = Rig::new();
        let mut task = rig.task();
        let t = start_line_follow(&rig, &mut task);

        show_line(&rig.sensors, [0, 0, 0, 0, 0, 1, 1, 1]);
        assert_eq!(task.tick(at(t)), MissionState::LineFollow);
        assert!(!rig.channels.end.get());
        let left = rig.channels.velocity_left_ref.get();
        assert_relative_eq!(left, rig.channels.velocity_right_ref.get());
        assert_relative_eq!(left, 1.75 * 0.2 / 0.035, epsilon = 1e-4);
    }

    #[test]
    fn late_marking_needs_five_sensors_without_a_bump() {
        let rig = Rig::new();
        let mut task = rig.task();
        let t = start_line_follow(&rig, &mut task);
        let late = t + 12_000;

        show_line(&rig.sensors, [0, 0, 0, 1, 1, 1, 1, 0]);
        assert_eq!(task.tick(at(late)), MissionState::LineFollow);
        // four black sensors are not enough, the centroid steers
        assert!(rig.channels.velocity_right_ref.get() > rig.channels.velocity_left_ref.get());

        show_line(&rig.sensors, [0, 0, 1, 1, 1, 1, 1, 0]);
        assert_eq!(task.tick(at(late + 8)), MissionState::LineFollow);
        let left = rig.channels.velocity_left_ref.get();
        assert_relative_eq!(left, rig.channels.velocity_right_ref.get());
        // straight through at the late override speed
        assert_relative_eq!(left, 1.75 * 0.25 / 0.035, epsilon = 1e-4);
        assert!(!rig.channels.end.get());
    }

    #[test]
    fn recovered_run_needs_four_sensors_to_finish() {
        let rig = Rig::new();
        let mut task = rig.task();
        let t = start_line_follow(&rig, &mut task);
        let resumed = escape_bump(&rig, &mut task, t);

        show_line(&rig.sensors, [0, 0, 1, 1, 1, 0, 0, 0]);
        assert_eq!(task.tick(at(resumed + 12_000)), MissionState::LineFollow);
        assert!(!rig.channels.end.get());
        // three black sensors keep steering on the centroid
        assert!(rig.channels.velocity_left_ref.get() > rig.channels.velocity_right_ref.get());
    }

    #[test]
    fn finish_arms_exactly_at_the_delay() {
        let rig = Rig::new();
        let mut task = rig.task();
        let t = start_line_follow(&rig, &mut task);
        let resumed = escape_bump(&rig, &mut task, t);

        show_line(&rig.sensors, [0, 0, 1, 1, 1, 1, 0, 0]);
        assert_eq!(task.tick(at(resumed + 11_992)), MissionState::LineFollow);
        assert!(!rig.channels.end.get());
        let left = rig.channels.velocity_left_ref.get();
        assert_relative_eq!(left, rig.channels.velocity_right_ref.get());
        assert_relative_eq!(left, 1.75 * 0.2 / 0.035, epsilon = 1e-4);

        assert_eq!(task.tick(at(resumed + 12_000)), MissionState::ReturnHome);
        assert!(rig.channels.end.get());
    }

    #[test]
    fn timed_out_sensor_reads_white() {
        let rig = Rig::new();
        let mut task = rig.task();
        let t = start_line_follow(&rig, &mut task);

        show_line(&rig.sensors, [0, 0, 0, 1, 1, 0, 0, 0]);
        rig.sensors[7].raw.set(Err(SensorTimeout));
        assert_eq!(task.tick(at(t)), MissionState::LineFollow);

        assert_eq!(task.centroid().last_readings(), &[0, 0, 0, 1, 1, 0, 0, 0]);
        assert_eq!(task.centroid().last_sum(), 0);
        let left = rig.channels.velocity_left_ref.get();
        assert_relative_eq!(left, rig.channels.velocity_right_ref.get());
        assert_relative_eq!(left, 1.75 * 0.2 / 0.035, epsilon = 1e-4);
    }

    #[test]
    fn bump_runs_the_escape_and_resumes_line_following() {
        let rig = Rig::new();
        let mut task = rig.task();
        let t = start_line_follow(&rig, &mut task);

        rig.bumpers[1].pressed.set(true);
        assert_eq!(task.tick(at(t)), MissionState::BumpRecover);
        assert!(rig.channels.bump.get());
        rig.bumpers[1].pressed.set(false);

        assert_eq!(run_until(&mut task, t + 8, t + 400), MissionState::BumpRecover);
        let (left, right) = rig.motors();
        assert_eq!((left.duty, right.duty), (-30.0, -30.0));

        assert_eq!(run_until(&mut task, t + 408, t + 900), MissionState::BumpRecover);
        let (left, right) = rig.motors();
        assert!(left.enabled && !right.enabled);
        assert_eq!(left.duty, 30.0);

        assert_eq!(run_until(&mut task, t + 908, t + 2600), MissionState::BumpRecover);
        let (left, right) = rig.motors();
        assert!(left.enabled && right.enabled);
        assert_eq!((left.duty, right.duty), (27.0, 30.0));
        assert!(rig.channels.bump.get());

        assert_eq!(run_until(&mut task, t + 2608, t + 4600), MissionState::LineFollow);
        assert!(!rig.channels.bump.get());
    }

    #[test]
    fn finish_after_recovery_returns_home_and_parks() {
        let rig = Rig::new();
        let mut task = rig.task();
        let t = start_line_follow(&rig, &mut task);

        rig.bumpers[0].pressed.set(true);
        task.tick(at(t));
        rig.bumpers[0].pressed.set(false);
        assert_eq!(run_until(&mut task, t + 8, t + 4600), MissionState::LineFollow);

        // inside the arming delay four black sensors only straighten out
        show_line(&rig.sensors, [0, 0, 1, 1, 1, 1, 0, 0]);
        assert_eq!(task.tick(at(t + 5_000)), MissionState::LineFollow);
        assert!(!rig.channels.end.get());

        let finish = t + 4_600 + 12_000;
        assert_eq!(task.tick(at(finish)), MissionState::ReturnHome);
        assert!(rig.channels.end.get());

        // facing away from the start heading
        rig.imu.heading.set(222.0);
        assert_eq!(task.tick(at(finish + 300)), MissionState::ReturnHome);
        assert_eq!(rig.motors().0.duty, 20.0);

        task.tick(at(finish + 700));
        let (left, right) = rig.motors();
        assert_eq!((left.duty, right.duty), (-10.0, 10.0));

        rig.imu.heading.set(42.2);
        task.tick(at(finish + 1_000));
        let (left, right) = rig.motors();
        assert_eq!((left.duty, right.duty), (0.0, 0.0));

        task.tick(at(finish + 1_600));
        let (left, right) = rig.motors();
        assert_eq!((left.duty, right.duty), (64.5, 60.0));

        assert_eq!(task.tick(at(finish + 3_100)), MissionState::ReturnHome);
        let (left, right) = rig.motors();
        assert!(!left.enabled && !right.enabled);
        assert!(rig.channels.end.get());
    }

    #[test]
    fn imu_dropout_during_rotation_keeps_last_heading() {
        let rig = Rig::new();
        let mut task = rig.task();
        let t = start_line_follow(&rig, &mut task);

        rig.bumpers[2].pressed.set(true);
        task.tick(at(t));
        rig.bumpers[2].pressed.set(false);
        run_until(&mut task, t + 8, t + 4600);

        show_line(&rig.sensors, [1; 8]);
        let finish = t + 4_600 + 12_000;
        assert_eq!(task.tick(at(finish)), MissionState::ReturnHome);

        rig.imu.heading.set(100.0);
        task.tick(at(finish + 700));
        rig.imu.failing.set(true);
        task.tick(at(finish + 708));
        let (left, right) = rig.motors();
        assert_eq!((left.duty, right.duty), (-10.0, 10.0));
    }
}
