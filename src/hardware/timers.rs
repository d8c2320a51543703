//! Timers driving the stimulus cadence and timestamping the response edges.
use super::hal;
use latency_engine::{Polarity, TickSource};

use hal::stm32::{
    // TIM2 and TIM5 have identical registers.
    tim2 as __tim5,
};

/// Input capture preconditioning filter configurations.
pub enum InputFilter {
    Div1N1 = 0b0000,
    Div1N8 = 0b0011,
}

/// The fixed-rate update interrupt of TIM2.
pub struct BaseTick {
    timer: hal::timer::Timer<hal::stm32::TIM2>,
}

impl BaseTick {
    /// Construct the base tick. The update interrupt is left disabled.
    pub fn new(mut timer: hal::timer::Timer<hal::stm32::TIM2>) -> Self {
        timer.unlisten(hal::timer::Event::TimeOut);
        timer.clear_irq();
        Self { timer }
    }

    /// Acknowledge an update interrupt.
    ///
    /// # Returns
    /// Whether an update happened while the interrupt was enabled. A stale pending interrupt
    /// after [TickSource::unlisten] returns false.
    pub fn take_update(&mut self) -> bool {
        // Note(unsafe): Only atomic reads on the timer registers. The flags are cleared through
        // the owned timer.
        let regs = unsafe { &*hal::stm32::TIM2::ptr() };
        let update = regs.sr.read().uif().bit_is_set()
            && regs.dier.read().uie().bit_is_set();
        self.timer.clear_irq();
        update
    }
}

impl TickSource for BaseTick {
    fn restart(&mut self) {
        self.timer.reset_counter();
        self.timer.clear_irq();
    }

    fn listen(&mut self) {
        self.timer.listen(hal::timer::Event::TimeOut);
    }

    fn unlisten(&mut self) {
        self.timer.unlisten(hal::timer::Event::TimeOut);
        self.timer.clear_irq();
    }
}

macro_rules! capture_timer {
    ($name:ident, $TY:ident, $index:literal, $ccmrx:ident) => {
        paste::paste! {
            pub use [< __ $TY:lower >]::[< $ccmrx _input >]::[< CC $index S_A >] as CaptureSource;

            /// A free-running 16 bit counter with one input capture channel.
            pub struct $name {
                timer: hal::timer::Timer<hal::stm32::$TY>,
            }

            impl $name {
                /// Construct the capture timer. The counter is paused.
                pub fn new(mut timer: hal::timer::Timer<hal::stm32::$TY>) -> Self {
                    timer.pause();
                    Self { timer }
                }

                /// Manually set the period of the timer.
                pub fn set_period_ticks(&mut self, period: u16) {
                    let regs = unsafe { &*hal::stm32::$TY::ptr() };
                    regs.arr.write(|w| w.arr().bits(period as _));

                    // Force the new period to take effect immediately.
                    self.timer.apply_freq();
                }

                /// Start the timer.
                pub fn start(&mut self) {
                    // Force a refresh of the frequency settings.
                    self.timer.apply_freq();
                    self.timer.reset_counter();

                    self.timer.resume();
                }

                /// Select the input of the capture channel.
                pub fn set_capture_source(&mut self, input: CaptureSource) {
                    let regs = unsafe { &*hal::stm32::$TY::ptr() };
                    regs.[< $ccmrx _input >]().modify(|_, w| w.[< cc $index s >]().variant(input));
                }

                /// Configure the input capture input pre-filter.
                pub fn configure_filter(&mut self, filter: InputFilter) {
                    let regs = unsafe { &*hal::stm32::$TY::ptr() };
                    regs.[< $ccmrx _input >]().modify(|_, w| w.[< ic $index f >]().bits(filter as u8));
                }

                /// Enable capturing counter values.
                pub fn enable_capture(&mut self) {
                    // Discard anything pending in the capture register.
                    let _ = self.latest_capture();

                    let regs = unsafe { &*hal::stm32::$TY::ptr() };
                    regs.ccer.modify(|_, w| w.[< cc $index e >]().set_bit());
                }

                /// Load the counter.
                pub fn set_count(&mut self, count: u16) {
                    let regs = unsafe { &*hal::stm32::$TY::ptr() };
                    // Note(unsafe): Any value is a valid counter value.
                    regs.cnt.write(|w| unsafe { w.bits(count as u32) });
                }

                /// Select the capture edge.
                pub fn set_polarity(&mut self, polarity: Polarity) {
                    let regs = unsafe { &*hal::stm32::$TY::ptr() };
                    let falling = polarity == Polarity::Falling;
                    regs.ccer.modify(|_, w| {
                        w.[< cc $index p >]().bit(falling).[< cc $index np >]().clear_bit()
                    });
                }

                /// Get the latest capture from the channel.
                ///
                /// # Returns
                /// The captured counter value, if an edge was latched. Over-captures are cleared
                /// and the most recent value returned.
                pub fn latest_capture(&mut self) -> Option<u16> {
                    let regs = unsafe { &*hal::stm32::$TY::ptr() };

                    if !regs.sr.read().[< cc $index if >]().bit_is_set() {
                        return None;
                    }

                    // Reading the captured value clears the flag in the status register
                    // automatically.
                    let result = regs.ccr[$index - 1].read().bits() as u16;

                    let sr = regs.sr.read();
                    if sr.[< cc $index of >]().bit_is_set() {
                        // NOTE(unsafe) write-back is safe
                        regs.sr.write(|w| unsafe { w.bits(sr.bits()) }.[< cc $index of >]().clear_bit());
                    }
                    Some(result)
                }

                /// Enable the capture interrupt.
                pub fn listen(&mut self) {
                    let regs = unsafe { &*hal::stm32::$TY::ptr() };
                    regs.dier.modify(|_, w| w.[< cc $index ie >]().set_bit());
                }

                /// Disable the capture interrupt.
                pub fn unlisten(&mut self) {
                    let regs = unsafe { &*hal::stm32::$TY::ptr() };
                    regs.dier.modify(|_, w| w.[< cc $index ie >]().clear_bit());
                }

                /// Whether the capture interrupt is enabled.
                pub fn is_listening(&self) -> bool {
                    let regs = unsafe { &*hal::stm32::$TY::ptr() };
                    regs.dier.read().[< cc $index ie >]().bit_is_set()
                }
            }
        }
    };
}

capture_timer!(CaptureTimer5, TIM5, 4, ccmr2);
