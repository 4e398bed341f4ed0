//! RP2350 bindings for the hardware traits
pub mod line_sensor;
pub mod resources;
pub mod tasks;

use embassy_rp::gpio::{Level, Output};
use embassy_rp::i2c::{self, Blocking, I2c};
use embassy_rp::peripherals::I2C0;
use embassy_rp::pwm::{self, Pwm, PwmOutput};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use static_cell::StaticCell;

use line_tracker::drivers::bno055::Bno055;
use line_tracker::drivers::motor::DirectionPwmMotor;
use line_tracker::system::hardware::SharedActuator;

use resources::{ImuResources, LeftMotorResources, RightMotorResources};

/// Romi motor PWM frequency, above the audible range
const PWM_FREQUENCY_HZ: u32 = 20_000;

/// I2C clock for the BNO055
const I2C_FREQUENCY_HZ: u32 = 400_000;

pub type Motor = DirectionPwmMotor<PwmOutput<'static>, Output<'static>, Output<'static>>;
pub type SharedMotor = SharedActuator<CriticalSectionRawMutex, Motor>;
pub type Imu = Bno055<I2c<'static, I2C0, Blocking>>;

static LEFT_MOTOR: StaticCell<SharedMotor> = StaticCell::new();
static RIGHT_MOTOR: StaticCell<SharedMotor> = StaticCell::new();

fn pwm_config() -> pwm::Config {
    let clock_freq_hz = embassy_rp::clocks::clk_sys_freq();

    // Calculate divider for 16-bit limit
    let divider = ((clock_freq_hz / PWM_FREQUENCY_HZ) / 65535 + 1) as u8;
    let period = (clock_freq_hz / (PWM_FREQUENCY_HZ * divider as u32)) as u16 - 1;

    let mut config = pwm::Config::default();
    config.divider = divider.into();
    config.top = period;
    config
}

/// Bring up both motor channels, asleep, and share them
pub fn motors(left: LeftMotorResources, right: RightMotorResources) -> (&'static SharedMotor, &'static SharedMotor) {
    let config = pwm_config();

    let left_pwm = Pwm::new_output_a(left.slice, left.pwm_pin, config.clone());
    let left_motor = DirectionPwmMotor::new(
        left_pwm.split().0.expect("left pwm output"),
        Output::new(left.direction_pin, Level::Low),
        Output::new(left.sleep_pin, Level::Low),
    );

    let right_pwm = Pwm::new_output_a(right.slice, right.pwm_pin, config);
    let right_motor = DirectionPwmMotor::new(
        right_pwm.split().0.expect("right pwm output"),
        Output::new(right.direction_pin, Level::Low),
        Output::new(right.sleep_pin, Level::Low),
    );

    (
        LEFT_MOTOR.init(SharedActuator::new(left_motor)),
        RIGHT_MOTOR.init(SharedActuator::new(right_motor)),
    )
}

pub fn imu(r: ImuResources) -> Imu {
    let mut config = i2c::Config::default();
    config.frequency = I2C_FREQUENCY_HZ;
    Bno055::new(I2c::new_blocking(r.i2c, r.scl, r.sda, config))
}
