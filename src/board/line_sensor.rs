//! RC reflectance channel
//!
//! Charge the sensor node, release it and time how long the phototransistor
//! takes to pull it low. Dark surfaces reflect less and decay slower. The read
//! busy-waits, so it belongs in the slow mission task only.

use embassy_rp::gpio::Flex;
use embassy_time::{block_for, Duration, Instant};

use line_tracker::config::LINE_SENSOR_TIMEOUT;
use line_tracker::system::hardware::{LineSensor, SensorTimeout};

/// Time the node is driven high before release
const CHARGE_TIME: Duration = Duration::from_micros(10);

pub struct RcLineSensor {
    pin: Flex<'static>,
}

impl RcLineSensor {
    pub fn new(pin: Flex<'static>) -> Self {
        Self { pin }
    }
}

impl LineSensor for RcLineSensor {
    fn read_raw(&mut self) -> Result<u32, SensorTimeout> {
        self.pin.set_as_output();
        self.pin.set_high();
        block_for(CHARGE_TIME);

        let start = Instant::now();
        self.pin.set_as_input();
        while self.pin.is_high() {
            if start.elapsed() > LINE_SENSOR_TIMEOUT {
                return Err(SensorTimeout);
            }
        }
        Ok(start.elapsed().as_micros() as u32)
    }
}
