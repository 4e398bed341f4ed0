//! Robot configuration
//!
//! Geometry, controller gains, task periods and the empirically tuned
//! maneuver timings. The timed maneuvers were tuned for one track layout;
//! adjust the [`RecoveryTiming`] and [`ReturnHomeTiming`] values when the
//! course changes.
//!
//! # Drive train (Pololu Romi)
//! - Wheel radius: 35 mm
//! - Trackwidth: 141 mm
//! - 1440 encoder counts per wheel revolution (12 CPR motor, 120:1 gearbox)

use embassy_time::Duration;

/// Wheel velocity task period
pub const WHEEL_TASK_PERIOD: Duration = Duration::from_millis(6);

/// Mission control task period
pub const MISSION_TASK_PERIOD: Duration = Duration::from_millis(8);

/// Encoder counts per wheel revolution
pub const COUNTS_PER_REV: f32 = 1440.0;

/// Duty cycle bound for the actuators, in percent
pub const DUTY_LIMIT: f32 = 100.0;

/// Number of reflectance sensors on the line array
pub const LINE_SENSOR_COUNT: usize = 8;

/// Number of bump contacts on the front bumper
pub const BUMP_SWITCH_COUNT: usize = 3;

/// Longest the reflectance decay is timed before giving up
pub const LINE_SENSOR_TIMEOUT: Duration = Duration::from_millis(500);

/// Differential-drive geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriveGeometry {
    /// Wheel radius in meters
    pub wheel_radius: f32,
    /// Distance between the wheel contact points in meters
    pub trackwidth: f32,
}

impl Default for DriveGeometry {
    fn default() -> Self {
        Self {
            wheel_radius: 0.035,
            trackwidth: 0.141,
        }
    }
}

/// Per-wheel velocity loop settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelConfig {
    pub kp: f32,
    pub ki: f32,
    /// Symmetric clamp on the duty output
    pub duty_limit: f32,
    pub counts_per_rev: f32,
    /// Nominal invocation period, fed to the PI loop as its time step
    pub period: Duration,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            kp: 2.2,
            ki: 0.5,
            duty_limit: DUTY_LIMIT,
            counts_per_rev: COUNTS_PER_REV,
            period: WHEEL_TASK_PERIOD,
        }
    }
}

/// Line tracking: sensor normalization, steering bands and speeds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFollowConfig {
    /// Raw decay time over white, in microseconds
    pub raw_min: f32,
    /// Raw decay time over black, in microseconds
    pub raw_max: f32,
    /// Normalized readings above this count as black
    pub black_threshold: f32,
    /// Centroid magnitudes up to this value steer straight
    pub straight_band: i32,
    /// Centroid magnitudes up to this value get the gentle yaw command
    pub gentle_band: i32,
    /// Yaw-rate command for a gentle correction, rad/s
    pub gentle_yaw_rate: f32,
    /// Yaw-rate command for a sharp turn, rad/s
    pub sharp_yaw_rate: f32,
    /// How long the robot stays slow after a sharp turn
    pub sharp_turn_hold: Duration,
    /// Cruise speed, m/s
    pub nominal_speed: f32,
    /// Speed while recovering from a sharp turn, m/s
    pub slow_speed: f32,
    /// Proportional gain of the body linear-velocity loop
    pub linear_kp: f32,
    /// Proportional gain of the body yaw-rate loop
    pub yaw_kp: f32,
}

impl Default for LineFollowConfig {
    fn default() -> Self {
        Self {
            raw_min: 720.0,
            raw_max: 1800.0,
            black_threshold: 0.3,
            straight_band: 1,
            gentle_band: 11,
            gentle_yaw_rate: 3.0,
            sharp_yaw_rate: 5.0,
            sharp_turn_hold: Duration::from_millis(2000),
            nominal_speed: 0.2,
            slow_speed: 0.065,
            linear_kp: 1.75,
            yaw_kp: 1.75,
        }
    }
}

/// Staged all-black detection
///
/// Right after setup or a bump recovery the robot crosses wide markings that
/// must not end the run, so the number of black sensors required, and what
/// happens when it is reached, depends on the time since the reference point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionConfig {
    /// Boundary between the early and the late regime
    pub arming_delay: Duration,
    /// Early regime: black sensors that trigger the straight-through override
    pub early_black_count: usize,
    /// Early regime override speed, m/s
    pub early_speed: f32,
    /// Late regime without a recovered bump: black sensors for the override
    pub late_black_count: usize,
    /// Late regime override speed, m/s
    pub late_speed: f32,
    /// Late regime after a recovered bump: black sensors that end the course
    pub finish_black_count: usize,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            arming_delay: Duration::from_millis(12_000),
            early_black_count: 3,
            early_speed: 0.2,
            late_black_count: 5,
            late_speed: 0.25,
            finish_black_count: 4,
        }
    }
}

/// Open-loop bump escape, durations relative to each phase's entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecoveryTiming {
    /// Backing away from the obstacle
    pub reverse: Duration,
    /// Right pivot, measured from pivot entry
    pub pivot_right: Duration,
    /// End of the forward leg, measured from right pivot entry
    pub forward_after_right: Duration,
    /// Left pivot, measured from pivot entry
    pub pivot_left: Duration,
    /// End of the forward leg, measured from left pivot entry
    pub forward_after_left: Duration,
    pub reverse_duty: f32,
    pub drive_duty: f32,
    /// Left wheel duty on the final leg, trimmed to run straight
    pub trimmed_left_duty: f32,
}

impl Default for RecoveryTiming {
    fn default() -> Self {
        Self {
            reverse: Duration::from_millis(800),
            pivot_right: Duration::from_millis(550),
            forward_after_right: Duration::from_millis(1200),
            pivot_left: Duration::from_millis(460),
            forward_after_left: Duration::from_millis(2500),
            reverse_duty: -30.0,
            drive_duty: 30.0,
            trimmed_left_duty: 27.0,
        }
    }
}

/// Heading-based approach back to the start box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnHomeTiming {
    /// Roll past the finish marking
    pub approach: Duration,
    pub approach_duty: f32,
    /// In-place rotation duty, left wheel backward and right wheel forward
    pub rotate_duty: f32,
    /// Heading error in degrees that ends the rotation
    pub heading_tolerance: f32,
    /// Standstill after alignment
    pub pause: Duration,
    /// End of the final leg, measured from alignment
    pub drive_home: Duration,
    pub home_left_duty: f32,
    pub home_right_duty: f32,
}

impl Default for ReturnHomeTiming {
    fn default() -> Self {
        Self {
            approach: Duration::from_millis(600),
            approach_duty: 20.0,
            rotate_duty: 10.0,
            heading_tolerance: 0.5,
            pause: Duration::from_millis(500),
            drive_home: Duration::from_millis(2050),
            home_left_duty: 64.5,
            home_right_duty: 60.0,
        }
    }
}

/// Everything the mission task needs to know
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MissionConfig {
    pub geometry: DriveGeometry,
    pub line: LineFollowConfig,
    pub completion: CompletionConfig,
    pub recovery: RecoveryTiming,
    pub return_home: ReturnHomeTiming,
    /// Wait between calibration and latching the start heading
    pub settle: Duration,
    /// Calibration still pending after this long is reported once
    pub calibration_warning: Duration,
    /// Nominal invocation period, fed to the body loops as their time step
    pub period: Duration,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            geometry: DriveGeometry::default(),
            line: LineFollowConfig::default(),
            completion: CompletionConfig::default(),
            recovery: RecoveryTiming::default(),
            return_home: ReturnHomeTiming::default(),
            settle: Duration::from_secs(10),
            calibration_warning: Duration::from_secs(30),
            period: MISSION_TASK_PERIOD,
        }
    }
}
