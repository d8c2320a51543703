//! Digital Input 0 (DI0) response edge capture
//!
//! # Design
//! DI0 is fed into TIM5 capture channel 4. TIM5 runs free at the capture tick rate and wraps at
//! the 16 bit boundary. Whenever the selected edge arrives on DI0, the counter value is latched
//! into the capture register and the capture interrupt fires if enabled.
//!
//! When a stimulus fires, the counter is preloaded with a negative bias so that it reads zero at
//! the instant the stimulus reaches the input. The latched value is then directly the response
//! latency in capture ticks.
//!
//! Over-captures are not fatal: the capture detector only accepts the first edge of a window and
//! flags everything else as spurious, so an overwritten value is at most a lost spurious edge.
use super::{hal, timers};
use latency_engine::{CaptureTimer, Polarity};

/// The DI0 response capture.
pub struct ResponseCapture {
    _di0: hal::gpio::gpioa::PA3<hal::gpio::Alternate<2>>,
    timer: timers::CaptureTimer5,
}

impl ResponseCapture {
    /// Construct the DI0 response capture.
    ///
    /// # Args
    /// * `di0` - The capture input pin.
    /// * `timer` - The capture timer, configured for the capture tick rate.
    /// * `noise_canceler` - Require 8 consecutive samples to register an edge.
    pub fn new(
        di0: hal::gpio::gpioa::PA3<hal::gpio::Alternate<2>>,
        mut timer: timers::CaptureTimer5,
        noise_canceler: bool,
    ) -> Self {
        // Use TI4 (the DI0 input) as the capture source of channel 4.
        timer.set_capture_source(timers::CaptureSource::Ti4);
        timer.configure_filter(if noise_canceler {
            timers::InputFilter::Div1N8
        } else {
            timers::InputFilter::Div1N1
        });
        timer.enable_capture();
        timer.start();

        Self { _di0: di0, timer }
    }

    /// Whether the capture interrupt is enabled.
    pub fn is_listening(&self) -> bool {
        self.timer.is_listening()
    }
}

impl CaptureTimer for ResponseCapture {
    fn preload(&mut self, count: u16) {
        self.timer.set_count(count);
    }

    fn set_polarity(&mut self, polarity: Polarity) {
        self.timer.set_polarity(polarity);
    }

    fn take_capture(&mut self) -> Option<u16> {
        self.timer.latest_capture()
    }

    fn listen(&mut self) {
        self.timer.listen();
    }

    fn unlisten(&mut self) {
        self.timer.unlisten();
    }
}
