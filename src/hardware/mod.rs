//! Module for all hardware-specific setup of the tester
use embedded_hal_compat::{markers::ForwardOutputPin, Forward};
pub use stm32h7xx_hal as hal;

pub mod capture;
pub mod delay;
pub mod metadata;
pub mod serial;
pub mod setup;
pub mod timers;

pub use capture::ResponseCapture;
pub use serial::{ReportChannel, UsbSerial};
pub use timers::BaseTick;

pub type UsbBus = hal::usb_hs::UsbBus<hal::usb_hs::USB2>;

pub type UsbDevice = usb_device::device::UsbDevice<'static, UsbBus>;

/// A push-pull output usable through the `embedded-hal` 1.0 traits.
pub type OutputLine =
    Forward<hal::gpio::ErasedPin<hal::gpio::Output>, ForwardOutputPin>;

rtic_monotonics::systick_monotonic!(Systick, 1_000);

#[inline(never)]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    use core::{
        fmt::Write,
        sync::atomic::{AtomicBool, Ordering},
    };
    use cortex_m::asm;
    use rtt_target::{ChannelMode, UpChannel};

    cortex_m::interrupt::disable();

    // Recursion protection
    static PANICKED: AtomicBool = AtomicBool::new(false);
    while PANICKED.load(Ordering::Relaxed) {
        asm::bkpt();
    }
    PANICKED.store(true, Ordering::Relaxed);

    // Park the stimulus and reset lines (PD1..PD3) high.
    let gpiod = unsafe { &*hal::stm32::GPIOD::ptr() };
    gpiod
        .odr
        .modify(|_, w| w.odr1().high().odr2().high().odr3().high());

    // Analogous to panic-rtt-target
    if let Some(mut channel) = unsafe { UpChannel::conjure(0) } {
        channel.set_mode(ChannelMode::BlockIfFull);
        writeln!(channel, "{info}").ok();
    }

    // Abort
    asm::udf();
}

#[cortex_m_rt::exception]
unsafe fn HardFault(ef: &cortex_m_rt::ExceptionFrame) -> ! {
    panic!("HardFault at {:#?}", ef);
}

#[cortex_m_rt::exception]
unsafe fn DefaultHandler(irqn: i16) {
    panic!("Unhandled exception (IRQn = {})", irqn);
}
