//! Basic blocking delay
//!
//! This module provides a basic asm-based blocking delay.
use embedded_hal_1::delay::DelayNs;

/// A basic delay implementation.
pub struct AsmDelay {
    frequency_hz: u64,
}

impl AsmDelay {
    /// Create a new delay.
    ///
    /// # Args
    /// * `freq` - The CPU core frequency.
    pub fn new(freq: u32) -> AsmDelay {
        AsmDelay {
            frequency_hz: freq as u64,
        }
    }
}

impl DelayNs for AsmDelay {
    fn delay_ns(&mut self, ns: u32) {
        let cycles = self.frequency_hz * ns as u64 / 1_000_000_000;
        cortex_m::asm::delay(cycles as u32)
    }
}
