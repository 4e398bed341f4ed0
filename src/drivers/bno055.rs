//! BNO055 absolute orientation sensor over I2C
//!
//! Only the registers the robot needs: operating mode, calibration status,
//! calibration profile, Euler angles and gyroscope rates. Angles and rates are
//! little-endian `i16` in 1/16 degree (per second) units.
//!
//! The mission only goes through [`InertialSensor`] (mode, calibration
//! status, heading, yaw rate). The full Euler triple, all three gyroscope
//! axes, the calibration profile and [`Bno055::release`] are driver API for
//! bench tools that save a profile once and restore it on later boots.

use embedded_hal::i2c::I2c;

use crate::system::hardware::{FusionMode, InertialSensor};
use crate::system::state::CalibrationStatus;

/// Address with the ADR pin low
pub const DEFAULT_ADDRESS: u8 = 0x28;

/// LSBs per degree for both Euler angles and gyroscope rates
const LSB_PER_DEGREE: f32 = 16.0;

/// Length of the calibration profile (offsets and radii)
pub const CALIBRATION_PROFILE_LEN: usize = 22;

mod register {
    pub const GYR_DATA_X_LSB: u8 = 0x14;
    pub const GYR_DATA_Z_LSB: u8 = 0x18;
    pub const EUL_HEADING_LSB: u8 = 0x1A;
    pub const CALIB_STAT: u8 = 0x35;
    pub const OPR_MODE: u8 = 0x3D;
    pub const ACC_OFFSET_X_LSB: u8 = 0x55;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Bus transaction failed
    Bus(E),
}

/// Heading, roll and pitch in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Euler {
    pub heading: f32,
    pub roll: f32,
    pub pitch: f32,
}

/// Gyroscope rates in degrees per second
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AngularVelocity {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Sensor calibration offsets, as stored in the profile registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationProfile {
    pub accelerometer_offset: [i16; 3],
    pub magnetometer_offset: [i16; 3],
    pub gyroscope_offset: [i16; 3],
    pub accelerometer_radius: i16,
    pub magnetometer_radius: i16,
}

impl CalibrationProfile {
    fn from_bytes(bytes: &[u8; CALIBRATION_PROFILE_LEN]) -> Self {
        let word = |index: usize| i16::from_le_bytes([bytes[2 * index], bytes[2 * index + 1]]);
        Self {
            accelerometer_offset: [word(0), word(1), word(2)],
            magnetometer_offset: [word(3), word(4), word(5)],
            gyroscope_offset: [word(6), word(7), word(8)],
            accelerometer_radius: word(9),
            magnetometer_radius: word(10),
        }
    }

    fn to_bytes(self) -> [u8; CALIBRATION_PROFILE_LEN] {
        let words = [
            self.accelerometer_offset[0],
            self.accelerometer_offset[1],
            self.accelerometer_offset[2],
            self.magnetometer_offset[0],
            self.magnetometer_offset[1],
            self.magnetometer_offset[2],
            self.gyroscope_offset[0],
            self.gyroscope_offset[1],
            self.gyroscope_offset[2],
            self.accelerometer_radius,
            self.magnetometer_radius,
        ];
        let mut bytes = [0; CALIBRATION_PROFILE_LEN];
        for (chunk, word) in bytes.chunks_exact_mut(2).zip(words) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        bytes
    }
}

pub struct Bno055<I> {
    i2c: I,
    address: u8,
    mode: FusionMode,
}

impl<I: I2c> Bno055<I> {
    /// The sensor powers up in config mode
    pub fn new(i2c: I) -> Self {
        Self::with_address(i2c, DEFAULT_ADDRESS)
    }

    pub fn with_address(i2c: I, address: u8) -> Self {
        Self {
            i2c,
            address,
            mode: FusionMode::Config,
        }
    }

    /// Last mode written
    pub fn mode(&self) -> FusionMode {
        self.mode
    }

    /// Switch the operating mode
    ///
    /// The sensor needs up to 19 ms to settle after a mode change; the caller
    /// is responsible for waiting before the next read.
    pub fn set_mode(&mut self, mode: FusionMode) -> Result<(), Error<I::Error>> {
        self.i2c
            .write(self.address, &[register::OPR_MODE, mode as u8])
            .map_err(Error::Bus)?;
        self.mode = mode;
        Ok(())
    }

    pub fn calibration_status(&mut self) -> Result<CalibrationStatus, Error<I::Error>> {
        let mut byte = [0u8; 1];
        self.read(register::CALIB_STAT, &mut byte)?;
        Ok(CalibrationStatus::from_register(byte[0]))
    }

    /// Read the stored calibration profile
    pub fn calibration_profile(&mut self) -> Result<CalibrationProfile, Error<I::Error>> {
        let mut bytes = [0u8; CALIBRATION_PROFILE_LEN];
        self.read(register::ACC_OFFSET_X_LSB, &mut bytes)?;
        Ok(CalibrationProfile::from_bytes(&bytes))
    }

    /// Restore a calibration profile; only accepted in config mode
    pub fn set_calibration_profile(&mut self, profile: &CalibrationProfile) -> Result<(), Error<I::Error>> {
        let mut frame = [0u8; CALIBRATION_PROFILE_LEN + 1];
        frame[0] = register::ACC_OFFSET_X_LSB;
        frame[1..].copy_from_slice(&profile.to_bytes());
        self.i2c.write(self.address, &frame).map_err(Error::Bus)
    }

    pub fn euler(&mut self) -> Result<Euler, Error<I::Error>> {
        let [heading, roll, pitch] = self.read_vector(register::EUL_HEADING_LSB)?;
        Ok(Euler { heading, roll, pitch })
    }

    /// Heading in degrees
    pub fn heading(&mut self) -> Result<f32, Error<I::Error>> {
        self.read_scalar(register::EUL_HEADING_LSB)
    }

    pub fn angular_velocity(&mut self) -> Result<AngularVelocity, Error<I::Error>> {
        let [x, y, z] = self.read_vector(register::GYR_DATA_X_LSB)?;
        Ok(AngularVelocity { x, y, z })
    }

    /// Rate about the vertical axis in degrees per second
    pub fn yaw_rate(&mut self) -> Result<f32, Error<I::Error>> {
        self.read_scalar(register::GYR_DATA_Z_LSB)
    }

    /// Give the bus back
    pub fn release(self) -> I {
        self.i2c
    }

    fn read(&mut self, register: u8, buffer: &mut [u8]) -> Result<(), Error<I::Error>> {
        self.i2c.write_read(self.address, &[register], buffer).map_err(Error::Bus)
    }

    fn read_scalar(&mut self, register: u8) -> Result<f32, Error<I::Error>> {
        let mut bytes = [0u8; 2];
        self.read(register, &mut bytes)?;
        Ok(i16::from_le_bytes(bytes) as f32 / LSB_PER_DEGREE)
    }

    fn read_vector(&mut self, register: u8) -> Result<[f32; 3], Error<I::Error>> {
        let mut bytes = [0u8; 6];
        self.read(register, &mut bytes)?;
        let axis = |index: usize| i16::from_le_bytes([bytes[2 * index], bytes[2 * index + 1]]) as f32 / LSB_PER_DEGREE;
        Ok([axis(0), axis(1), axis(2)])
    }
}

impl<I: I2c> InertialSensor for Bno055<I> {
    type Error = Error<I::Error>;

    fn set_mode(&mut self, mode: FusionMode) -> Result<(), Self::Error> {
        Bno055::set_mode(self, mode)
    }

    fn calibration_status(&mut self) -> Result<CalibrationStatus, Self::Error> {
        Bno055::calibration_status(self)
    }

    fn heading(&mut self) -> Result<f32, Self::Error> {
        Bno055::heading(self)
    }

    fn yaw_rate(&mut self) -> Result<f32, Self::Error> {
        Bno055::yaw_rate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::{ErrorKind, ErrorType, Operation};

    /// Register file behind a fake bus
    struct FakeBus {
        registers: [u8; 0x80],
        fail: bool,
    }

    impl FakeBus {
        fn new() -> Self {
            Self {
                registers: [0; 0x80],
                fail: false,
            }
        }
    }

    impl ErrorType for FakeBus {
        type Error = ErrorKind;
    }

    impl I2c for FakeBus {
        fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
            if self.fail || address != DEFAULT_ADDRESS {
                return Err(ErrorKind::Other);
            }
            let mut pointer = 0usize;
            for operation in operations {
                match operation {
                    Operation::Write(bytes) => {
                        if let Some((&register, data)) = bytes.split_first() {
                            pointer = register as usize;
                            self.registers[pointer..pointer + data.len()].copy_from_slice(data);
                            pointer += data.len();
                        }
                    }
                    Operation::Read(buffer) => {
                        let len = buffer.len();
                        buffer.copy_from_slice(&self.registers[pointer..pointer + len]);
                        pointer += len;
                    }
                }
            }
            Ok(())
        }
    }

    #[test]
    fn set_mode_writes_operating_mode() {
        let mut imu = Bno055::new(FakeBus::new());
        imu.set_mode(FusionMode::Ndof).unwrap();
        assert_eq!(imu.mode(), FusionMode::Ndof);
        assert_eq!(imu.release().registers[0x3D], 0x0C);
    }

    #[test]
    fn reads_heading_in_sixteenths() {
        let mut bus = FakeBus::new();
        // 90.5 degrees = 1448 LSB
        bus.registers[0x1A..0x1C].copy_from_slice(&1448i16.to_le_bytes());
        // roll -2 degrees, pitch 1 degree
        bus.registers[0x1C..0x1E].copy_from_slice(&(-32i16).to_le_bytes());
        bus.registers[0x1E..0x20].copy_from_slice(&16i16.to_le_bytes());
        let mut imu = Bno055::new(bus);

        assert_eq!(imu.heading().unwrap(), 90.5);
        assert_eq!(
            imu.euler().unwrap(),
            Euler {
                heading: 90.5,
                roll: -2.0,
                pitch: 1.0
            }
        );
    }

    #[test]
    fn yaw_rate_is_gyroscope_z() {
        let mut bus = FakeBus::new();
        bus.registers[0x14..0x16].copy_from_slice(&8i16.to_le_bytes());
        bus.registers[0x18..0x1A].copy_from_slice(&(-40i16).to_le_bytes());
        let mut imu = Bno055::new(bus);

        assert_eq!(imu.yaw_rate().unwrap(), -2.5);
        let rates = imu.angular_velocity().unwrap();
        assert_eq!(rates.x, 0.5);
        assert_eq!(rates.z, -2.5);
    }

    #[test]
    fn calibration_status_unpacks_register() {
        let mut bus = FakeBus::new();
        bus.registers[0x35] = 0xFF;
        let mut imu = Bno055::new(bus);
        assert!(imu.calibration_status().unwrap().is_fully_calibrated());
    }

    #[test]
    fn calibration_profile_survives_the_registers() {
        let profile = CalibrationProfile {
            accelerometer_offset: [-12, 7, 3],
            magnetometer_offset: [200, -150, 41],
            gyroscope_offset: [-1, 0, 2],
            accelerometer_radius: 1000,
            magnetometer_radius: 640,
        };
        let mut imu = Bno055::new(FakeBus::new());
        imu.set_calibration_profile(&profile).unwrap();
        assert_eq!(imu.calibration_profile().unwrap(), profile);
    }

    #[test]
    fn bus_failure_is_reported() {
        let mut bus = FakeBus::new();
        bus.fail = true;
        let mut imu = Bno055::new(bus);
        assert_eq!(imu.heading(), Err(Error::Bus(ErrorKind::Other)));
        // a failed mode write leaves the cached mode alone
        assert!(imu.set_mode(FusionMode::Ndof).is_err());
        assert_eq!(imu.mode(), FusionMode::Config);
    }
}
