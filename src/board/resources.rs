//! Hardware Resource Assignment
//!
//! Pin and peripheral ownership for the Romi chassis on an RP2350 carrier.
//! Each group moves into exactly one owner at startup.
//!
//! # Resource Groups
//! - IMU: BNO055 on I2C0
//! - Motors: DIR/PWM/SLEEP per wheel on the Romi power distribution board
//! - Encoders: A/B channels per wheel
//! - Line array: eight RC reflectance channels plus the two emitter controls
//! - Bumpers: three active-low contacts

use assign_resources::assign_resources;
use embassy_rp::peripherals;
use embassy_rp::Peri;

assign_resources! {
    /// BNO055 absolute orientation sensor
    imu: ImuResources {
        i2c: I2C0,
        sda: PIN_4,
        scl: PIN_5,
    },
    /// Left motor channel
    left_motor: LeftMotorResources {
        slice: PWM_SLICE0,
        pwm_pin: PIN_0,
        direction_pin: PIN_1,
        sleep_pin: PIN_6,
    },
    /// Right motor channel
    right_motor: RightMotorResources {
        slice: PWM_SLICE1,
        pwm_pin: PIN_2,
        direction_pin: PIN_3,
        sleep_pin: PIN_7,
    },
    /// Left wheel encoder channels
    left_encoder: LeftEncoderResources {
        a: PIN_8,
        b: PIN_9,
    },
    /// Right wheel encoder channels
    right_encoder: RightEncoderResources {
        a: PIN_10,
        b: PIN_11,
    },
    /// Reflectance array, sensor 0 is the leftmost
    line_array: LineArrayResources {
        sensor_0: PIN_12,
        sensor_1: PIN_13,
        sensor_2: PIN_14,
        sensor_3: PIN_15,
        sensor_4: PIN_16,
        sensor_5: PIN_17,
        sensor_6: PIN_18,
        sensor_7: PIN_19,
        ctrl_odd: PIN_20,
        ctrl_even: PIN_21,
    },
    /// Bumper contacts, left to right
    bumpers: BumperResources {
        left: PIN_22,
        center: PIN_26,
        right: PIN_27,
    },
}
