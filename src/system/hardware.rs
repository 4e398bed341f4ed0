//! Hardware Seams
//!
//! Traits the task state machines use to reach the robot. The firmware binds
//! them to RP2350 peripherals; host tests bind them to fakes.
//!
//! Bump switches are plain `embedded_hal::digital::InputPin`s, wired active
//! low: a pressed switch reads low.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::system::state::CalibrationStatus;

/// A reflectance read that never saw its decay finish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorTimeout;

/// A motor channel commanded by signed duty
pub trait Actuator {
    /// Take the driver out of sleep
    fn enable(&mut self);
    /// Put the driver to sleep, the wheel coasts
    fn disable(&mut self);
    /// Signed duty in percent; positive drives the wheel forward
    fn set_duty(&mut self, duty: f32);
}

/// A free-running 16-bit encoder count
pub trait QuadratureCounter {
    fn count(&mut self) -> u16;
}

/// One reflectance channel of the line array
pub trait LineSensor {
    /// Decay time in microseconds; longer means darker
    fn read_raw(&mut self) -> Result<u32, SensorTimeout>;
}

/// Fusion modes of the absolute orientation sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum FusionMode {
    Config = 0x00,
    Imu = 0x08,
    Compass = 0x09,
    M4g = 0x0A,
    NdofFmcOff = 0x0B,
    Ndof = 0x0C,
}

/// Absolute orientation sensor
pub trait InertialSensor {
    type Error;

    fn set_mode(&mut self, mode: FusionMode) -> Result<(), Self::Error>;
    fn calibration_status(&mut self) -> Result<CalibrationStatus, Self::Error>;
    /// Heading in degrees, `[0, 360)`
    fn heading(&mut self) -> Result<f32, Self::Error>;
    /// Yaw rate in degrees per second
    fn yaw_rate(&mut self) -> Result<f32, Self::Error>;
}

impl<T: InertialSensor> InertialSensor for &mut T {
    type Error = T::Error;

    fn set_mode(&mut self, mode: FusionMode) -> Result<(), Self::Error> {
        T::set_mode(self, mode)
    }

    fn calibration_status(&mut self) -> Result<CalibrationStatus, Self::Error> {
        T::calibration_status(self)
    }

    fn heading(&mut self) -> Result<f32, Self::Error> {
        T::heading(self)
    }

    fn yaw_rate(&mut self) -> Result<f32, Self::Error> {
        T::yaw_rate(self)
    }
}

/// An actuator owned jointly by a wheel task and the mission task
///
/// The wheel task drives it while the loops run; the mission task drives it
/// during the open-loop maneuvers, when the bump or end flag keeps the wheel
/// task out. Each call runs under the mutex.
pub struct SharedActuator<M: RawMutex, A> {
    inner: Mutex<M, RefCell<A>>,
}

impl<M: RawMutex, A> SharedActuator<M, A> {
    pub const fn new(actuator: A) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(actuator)),
        }
    }

    /// Run `f` with exclusive access to the actuator
    pub fn lock<R>(&self, f: impl FnOnce(&mut A) -> R) -> R {
        self.inner.lock(|cell| f(&mut *cell.borrow_mut()))
    }
}

impl<M: RawMutex, A: Actuator> Actuator for &SharedActuator<M, A> {
    fn enable(&mut self) {
        self.lock(|actuator| actuator.enable());
    }

    fn disable(&mut self) {
        self.lock(|actuator| actuator.disable());
    }

    fn set_duty(&mut self, duty: f32) {
        self.lock(|actuator| actuator.set_duty(duty));
    }
}
