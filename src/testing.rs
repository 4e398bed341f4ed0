//! Host fakes for the hardware seams
//!
//! Each fake keeps its state in `Cell`s so a test can hold one reference for
//! the task under test and another to steer or inspect it.

use core::cell::Cell;
use core::convert::Infallible;

use crate::system::hardware::{Actuator, FusionMode, InertialSensor, LineSensor, QuadratureCounter, SensorTimeout};
use crate::system::state::CalibrationStatus;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct FakeMotor {
    pub enabled: bool,
    pub duty: f32,
}

impl Actuator for FakeMotor {
    fn enable(&mut self) {
        self.enabled = true;
    }

    fn disable(&mut self) {
        self.enabled = false;
    }

    fn set_duty(&mut self, duty: f32) {
        self.duty = duty;
    }
}

#[derive(Default)]
pub struct FakeCounter {
    pub count: Cell<u16>,
}

impl FakeCounter {
    pub fn advance(&self, counts: i16) {
        self.count.set(self.count.get().wrapping_add_signed(counts));
    }
}

impl QuadratureCounter for &FakeCounter {
    fn count(&mut self) -> u16 {
        self.count.get()
    }
}

pub struct FakeLineSensor {
    pub raw: Cell<Result<u32, SensorTimeout>>,
}

/// Decay time well inside the white band
pub const WHITE_MICROS: u32 = 720;
/// Decay time well inside the black band
pub const BLACK_MICROS: u32 = 2500;

impl Default for FakeLineSensor {
    fn default() -> Self {
        Self {
            raw: Cell::new(Ok(WHITE_MICROS)),
        }
    }
}

impl LineSensor for &FakeLineSensor {
    fn read_raw(&mut self) -> Result<u32, SensorTimeout> {
        self.raw.get()
    }
}

/// Set an array of fakes from a binary pattern, 1 is black
pub fn show_line(sensors: &[FakeLineSensor; 8], pattern: [u8; 8]) {
    for (sensor, bit) in sensors.iter().zip(pattern) {
        sensor.raw.set(Ok(if bit == 1 { BLACK_MICROS } else { WHITE_MICROS }));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeImuError;

pub struct FakeImu {
    pub mode: Cell<Option<FusionMode>>,
    pub status: Cell<CalibrationStatus>,
    pub heading: Cell<f32>,
    pub yaw_rate: Cell<f32>,
    pub failing: Cell<bool>,
}

impl Default for FakeImu {
    fn default() -> Self {
        Self {
            mode: Cell::new(None),
            status: Cell::new(CalibrationStatus::default()),
            heading: Cell::new(0.0),
            yaw_rate: Cell::new(0.0),
            failing: Cell::new(false),
        }
    }
}

impl FakeImu {
    pub fn calibrate(&self) {
        self.status.set(CalibrationStatus::from_register(0xFF));
    }

    fn check(&self) -> Result<(), FakeImuError> {
        if self.failing.get() {
            Err(FakeImuError)
        } else {
            Ok(())
        }
    }
}

impl InertialSensor for &FakeImu {
    type Error = FakeImuError;

    fn set_mode(&mut self, mode: FusionMode) -> Result<(), Self::Error> {
        self.check()?;
        self.mode.set(Some(mode));
        Ok(())
    }

    fn calibration_status(&mut self) -> Result<CalibrationStatus, Self::Error> {
        self.check()?;
        Ok(self.status.get())
    }

    fn heading(&mut self) -> Result<f32, Self::Error> {
        self.check()?;
        Ok(self.heading.get())
    }

    fn yaw_rate(&mut self) -> Result<f32, Self::Error> {
        self.check()?;
        Ok(self.yaw_rate.get())
    }
}

/// Active-low switch
#[derive(Default)]
pub struct FakeSwitch {
    pub pressed: Cell<bool>,
}

impl embedded_hal::digital::ErrorType for &FakeSwitch {
    type Error = Infallible;
}

impl embedded_hal::digital::InputPin for &FakeSwitch {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.pressed.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.pressed.get())
    }
}
