//! Mock hardware for host tests.
use std::{cell::RefCell, convert::Infallible, rc::Rc, vec::Vec};

use embedded_hal::{delay::DelayNs, digital};

use crate::{CaptureTimer, Polarity, TickSource};

#[derive(Debug, Default)]
struct PinState {
    high: bool,
    pulses: usize,
}

/// An output pin that counts high-to-low transitions. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockPin(Rc<RefCell<PinState>>);

impl MockPin {
    pub fn is_high(&self) -> bool {
        self.0.borrow().high
    }

    pub fn pulses(&self) -> usize {
        self.0.borrow().pulses
    }
}

impl digital::ErrorType for MockPin {
    type Error = Infallible;
}

impl digital::OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        let mut state = self.0.borrow_mut();
        if state.high {
            state.pulses += 1;
        }
        state.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().high = true;
        Ok(())
    }
}

/// Records requested delays.
#[derive(Debug, Clone, Default)]
pub struct MockDelay(Rc<RefCell<Vec<u32>>>);

impl MockDelay {
    pub fn total_ns(&self) -> u64 {
        self.0.borrow().iter().map(|&ns| ns as u64).sum()
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.borrow_mut().push(ns);
    }
}

/// A capture timer with manually injected edges.
#[derive(Debug, Default)]
pub struct MockCapture {
    pub counter: u16,
    pub polarity: Option<Polarity>,
    pub latched: Option<u16>,
    pub listening: bool,
}

impl MockCapture {
    /// Latch an edge of the given polarity at the current counter plus `ticks`.
    pub fn edge(&mut self, polarity: Polarity, ticks: u16) {
        self.counter = self.counter.wrapping_add(ticks);
        if self.polarity == Some(polarity) {
            self.latched = Some(self.counter);
        }
    }
}

impl CaptureTimer for MockCapture {
    fn preload(&mut self, count: u16) {
        self.counter = count;
    }

    fn set_polarity(&mut self, polarity: Polarity) {
        self.polarity = Some(polarity);
    }

    fn take_capture(&mut self) -> Option<u16> {
        self.latched.take()
    }

    fn listen(&mut self) {
        self.listening = true;
    }

    fn unlisten(&mut self) {
        self.listening = false;
    }
}

#[derive(Debug, Default)]
pub struct MockTick {
    pub listening: bool,
    pub restarts: usize,
}

impl TickSource for MockTick {
    fn restart(&mut self) {
        self.restarts += 1;
    }

    fn listen(&mut self) {
        self.listening = true;
    }

    fn unlisten(&mut self) {
        self.listening = false;
    }
}
