//! Robot firmware entry point
//!
//! Brings up the board and spawns the control tasks.

#![no_std]
#![no_main]

use defmt::info;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_rp::block::ImageDef;
use embassy_rp::config::Config;
use embassy_rp::gpio::{Input, Pull};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use {defmt_rtt as _, panic_probe as _};

use board::resources::{
    AssignedResources, BumperResources, ImuResources, LeftEncoderResources, LeftMotorResources,
    LineArrayResources, RightEncoderResources, RightMotorResources,
};
use board::tasks::{encoder_edges, mission_control, wheel_velocity};
use line_tracker::drivers::quadrature::QuadratureDecoder;
use line_tracker::task::wheel_velocity::WheelSide;

/// Firmware image type for bootloader
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = ImageDef::secure_exe();

/// RP2350 bindings and tasks
mod board;

static LEFT_ENCODER: QuadratureDecoder = QuadratureDecoder::new();
static RIGHT_ENCODER: QuadratureDecoder = QuadratureDecoder::new();

/// Runs the encoder and wheel tasks above the thread-mode mission task
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    EXECUTOR_HIGH.on_interrupt()
}

/// Firmware entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Config::default());
    let r = split_resources!(p);
    info!("line tracker starting");

    let (left_motor, right_motor) = board::motors(r.left_motor, r.right_motor);
    let imu = board::imu(r.imu);

    interrupt::SWI_IRQ_1.set_priority(Priority::P2);
    let high = EXECUTOR_HIGH.start(interrupt::SWI_IRQ_1);

    // Encoder decoding first so the wheel loops start from a live count
    high
        .spawn(encoder_edges(
            Input::new(r.left_encoder.a, Pull::None),
            Input::new(r.left_encoder.b, Pull::None),
            &LEFT_ENCODER,
        ))
        .unwrap();
    high
        .spawn(encoder_edges(
            Input::new(r.right_encoder.a, Pull::None),
            Input::new(r.right_encoder.b, Pull::None),
            &RIGHT_ENCODER,
        ))
        .unwrap();

    // Then the wheel loops, which the mission task feeds
    high.spawn(wheel_velocity(WheelSide::Left, left_motor, &LEFT_ENCODER))
        .unwrap();
    high.spawn(wheel_velocity(WheelSide::Right, right_motor, &RIGHT_ENCODER))
        .unwrap();
    // The mission's blocking sensor reads only delay itself
    spawner
        .spawn(mission_control(left_motor, right_motor, imu, r.line_array, r.bumpers))
        .unwrap();
}
