//! Embassy tasks
//!
//! Each control task owns its state machine and invokes `tick` from a
//! `Ticker` at its nominal period. The encoder tasks feed the lock-free
//! decoders from GPIO edges.
//!
//! The encoder and wheel tasks run on an interrupt executor at a higher
//! priority than the thread-mode mission task. The mission's line read
//! busy-waits on the reflectance decay (up to the sensor timeout per
//! channel), so on a shared executor it would stall the 6 ms wheel loops
//! and drop encoder edges. Everything those tasks share with the mission
//! sits behind critical-section mutexes or atomics.

use defmt::info;
use embassy_futures::select::select;
use embassy_rp::gpio::{Flex, Input, Level, Output, Pull};
use embassy_time::{Duration, Instant, Ticker, Timer};

use line_tracker::config::{MissionConfig, WheelConfig, MISSION_TASK_PERIOD, WHEEL_TASK_PERIOD};
use line_tracker::drivers::quadrature::QuadratureDecoder;
use line_tracker::system::channel::CHANNELS;
use line_tracker::task::mission_control::MissionControlTask;
use line_tracker::task::wheel_velocity::{WheelSide, WheelVelocityTask};

use super::line_sensor::RcLineSensor;
use super::resources::{BumperResources, LineArrayResources};
use super::{Imu, SharedMotor};

/// BNO055 power-on boot time
const IMU_BOOT_TIME: Duration = Duration::from_millis(750);

/// Decode one wheel's encoder channels
#[embassy_executor::task(pool_size = 2)]
pub async fn encoder_edges(mut a: Input<'static>, mut b: Input<'static>, decoder: &'static QuadratureDecoder) {
    decoder.reset(a.is_high(), b.is_high());
    loop {
        select(a.wait_for_any_edge(), b.wait_for_any_edge()).await;
        decoder.on_edge(a.is_high(), b.is_high());
    }
}

/// Velocity loop of one wheel
#[embassy_executor::task(pool_size = 2)]
pub async fn wheel_velocity(side: WheelSide, motor: &'static SharedMotor, decoder: &'static QuadratureDecoder) {
    let mut task = WheelVelocityTask::new(side, motor, decoder, CHANNELS.wheel(side), WheelConfig::default());
    info!("{} wheel task started", side);

    let mut ticker = Ticker::every(WHEEL_TASK_PERIOD);
    loop {
        task.tick(Instant::now());
        ticker.next().await;
    }
}

/// Body-level mission state machine
#[embassy_executor::task]
pub async fn mission_control(
    left: &'static SharedMotor,
    right: &'static SharedMotor,
    imu: Imu,
    line: LineArrayResources,
    bumpers: BumperResources,
) {
    // emitters stay on for the whole run
    let _ctrl_odd = Output::new(line.ctrl_odd, Level::High);
    let _ctrl_even = Output::new(line.ctrl_even, Level::High);

    let line_sensors = [
        RcLineSensor::new(Flex::new(line.sensor_0)),
        RcLineSensor::new(Flex::new(line.sensor_1)),
        RcLineSensor::new(Flex::new(line.sensor_2)),
        RcLineSensor::new(Flex::new(line.sensor_3)),
        RcLineSensor::new(Flex::new(line.sensor_4)),
        RcLineSensor::new(Flex::new(line.sensor_5)),
        RcLineSensor::new(Flex::new(line.sensor_6)),
        RcLineSensor::new(Flex::new(line.sensor_7)),
    ];
    let bumpers = [
        Input::new(bumpers.left, Pull::Up),
        Input::new(bumpers.center, Pull::Up),
        Input::new(bumpers.right, Pull::Up),
    ];

    Timer::after(IMU_BOOT_TIME).await;

    let mut task = MissionControlTask::new(
        left,
        right,
        imu,
        line_sensors,
        bumpers,
        &CHANNELS,
        MissionConfig::default(),
    );
    info!("mission task started");

    let mut ticker = Ticker::every(MISSION_TASK_PERIOD);
    loop {
        task.tick(Instant::now());
        ticker.next().await;
    }
}
