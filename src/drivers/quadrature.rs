//! Software quadrature decoder
//!
//! The RP2350 has no encoder-mode timer, so the two encoder channels are
//! watched for edges and decoded here at 4x resolution into a free-running
//! 16-bit count. The count wraps like a hardware counter would; the
//! odometry layer recovers the signed change.
//!
//! The decoder is lock-free. The edge watcher is the only writer, the wheel
//! task only loads the count.

use core::sync::atomic::{AtomicU16, AtomicU8, Ordering};

use crate::system::hardware::QuadratureCounter;

/// Count change for every `(previous << 2) | current` AB transition
///
/// Forward is A leading B: 00 -> 01 -> 11 -> 10 -> 00. Invalid transitions
/// (both channels changed at once) and repeats count zero.
const TRANSITIONS: [i8; 16] = [0, 1, -1, 0, -1, 0, 0, 1, 1, 0, 0, -1, 0, -1, 1, 0];

pub struct QuadratureDecoder {
    state: AtomicU8,
    count: AtomicU16,
}

impl QuadratureDecoder {
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(0),
            count: AtomicU16::new(0),
        }
    }

    /// Seed the channel levels without counting
    pub fn reset(&self, a: bool, b: bool) {
        self.state.store(Self::encode(a, b), Ordering::Relaxed);
    }

    /// Feed the channel levels after an edge
    pub fn on_edge(&self, a: bool, b: bool) {
        let current = Self::encode(a, b);
        let previous = self.state.swap(current, Ordering::Relaxed);
        let step = TRANSITIONS[((previous << 2) | current) as usize];
        if step != 0 {
            let count = self.count.load(Ordering::Relaxed);
            self.count.store(count.wrapping_add_signed(step as i16), Ordering::Release);
        }
    }

    pub fn count(&self) -> u16 {
        self.count.load(Ordering::Acquire)
    }

    fn encode(a: bool, b: bool) -> u8 {
        ((b as u8) << 1) | a as u8
    }
}

impl Default for QuadratureDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl QuadratureCounter for &QuadratureDecoder {
    fn count(&mut self) -> u16 {
        QuadratureDecoder::count(self)
    }
}
