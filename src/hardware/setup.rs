//! Tester hardware configuration
//!
//! This file contains all of the hardware-specific configuration of the tester.
use core::sync::atomic::{AtomicBool, Ordering};
use embedded_hal_compat::ForwardCompat;
use stm32h7xx_hal::{self as hal, prelude::*};

use latency_engine::PROFILES;

use super::{
    delay::AsmDelay, metadata::ApplicationMetadata, serial::BestEffortInterface,
    timers, BaseTick, OutputLine, ReportChannel, ResponseCapture, Systick,
    UsbBus, UsbDevice, UsbSerial,
};
use crate::design_parameters::{self, ENGINE_CONFIG, RESET_LINES};

/// All hardware interfaces of the tester, with both interrupt sources disabled.
pub struct LattoolDevices {
    pub base_tick: BaseTick,
    pub capture: ResponseCapture,
    /// Stimulus output, idle high.
    pub stimulus: OutputLine,
    /// Target board reset lines, idle high.
    pub resets: [OutputLine; RESET_LINES],
    pub delay: AsmDelay,
    pub usb: UsbDevice,
    pub serial: ReportChannel,
    pub metadata: &'static ApplicationMetadata,
}

/// Configure the tester hardware.
///
/// # Args
/// * `core` - The cortex-m peripherals.
/// * `device` - The microcontroller peripherals to be configured.
///
/// # Returns
/// The configured hardware interfaces.
pub fn setup(
    core: stm32h7xx_hal::stm32::CorePeripherals,
    device: stm32h7xx_hal::stm32::Peripherals,
) -> LattoolDevices {
    // Set up RTT logging
    {
        // Enable debug during WFE/WFI-induced sleep
        device.DBGMCU.cr.modify(|_, w| w.dbgsleep_d1().set_bit());

        // Set up RTT channel to use for `rprintln!()` as "best effort".
        // This removes a critical section around the logging and thus allows
        // the measurement interrupts to always preempt at low latency.
        // A log message emitted while the channel is busy is lost.
        let channels = rtt_target::rtt_init_default!();
        // Note(unsafe): The closure we pass does not establish a critical section
        // as demanded but it does ensure synchronization and implements a lock.
        unsafe {
            rtt_target::set_print_channel_cs(
                channels.up.0,
                &((|arg, f| {
                    static LOCKED: AtomicBool = AtomicBool::new(false);
                    if LOCKED.compare_exchange_weak(
                        false,
                        true,
                        Ordering::Acquire,
                        Ordering::Relaxed,
                    ) == Ok(false)
                    {
                        f(arg);
                        LOCKED.store(false, Ordering::Release);
                    }
                }) as rtt_target::CriticalSectionFunc),
            );
        }

        static LOGGER: rtt_logger::RTTLogger =
            rtt_logger::RTTLogger::new(log::LevelFilter::Info);
        log::set_logger(&LOGGER)
            .map(|()| log::set_max_level(log::LevelFilter::Trace))
            .unwrap();
        log::info!("Starting");
    }

    let pwr = device.PWR.constrain();
    let vos = pwr.freeze();

    // Clear reset flags.
    device.RCC.rsr.write(|w| w.rmvf().set_bit());

    let rcc = device.RCC.constrain();
    let mut ccdr = rcc
        .use_hse(8.MHz())
        .sysclk(design_parameters::SYSCLK.convert())
        .hclk(200.MHz())
        .freeze(vos, &device.SYSCFG);

    // Set up USB clocks.
    ccdr.clocks.hsi48_ck().unwrap();
    ccdr.peripheral
        .kernel_usb_clk_mux(stm32h7xx_hal::rcc::rec::UsbClkSel::Hsi48);

    Systick::start(core.SYST, ccdr.clocks.sysclk().to_Hz());

    let delay = AsmDelay::new(ccdr.clocks.c_ck().to_Hz());

    let gpioa = device.GPIOA.split(ccdr.peripheral.GPIOA);
    let gpiod = device.GPIOD.split(ccdr.peripheral.GPIOD);

    // Lines are driven high before they become outputs so they never glitch
    // low.
    let stimulus = {
        let mut pin = gpiod.pd3.into_push_pull_output();
        pin.set_high();
        pin.erase().forward()
    };
    let resets = {
        let mut pd1 = gpiod.pd1.into_push_pull_output();
        let mut pd2 = gpiod.pd2.into_push_pull_output();
        pd1.set_high();
        pd2.set_high();
        [pd1.erase().forward(), pd2.erase().forward()]
    };

    let base_tick = {
        let timer2 = device.TIM2.timer(
            design_parameters::BASE_TICK_FREQUENCY,
            ccdr.peripheral.TIM2,
            &ccdr.clocks,
        );
        BaseTick::new(timer2)
    };

    let capture = {
        // The timer frequency is manually adjusted below, so the 1KHz setting here is a
        // dont-care.
        let mut timer5 =
            device
                .TIM5
                .timer(1.kHz(), ccdr.peripheral.TIM5, &ccdr.clocks);

        // Configure the timer to count at the capture tick rate and wrap at 16 bit so that
        // latencies are plain `u16` differences.
        timer5.pause();
        timer5.set_tick_freq(
            design_parameters::CAPTURE_TIMER_FREQUENCY.convert(),
        );

        let mut timer = timers::CaptureTimer5::new(timer5);
        timer.set_period_ticks(design_parameters::CAPTURE_TIMER_PERIOD);

        ResponseCapture::new(
            gpioa.pa3.into_alternate(),
            timer,
            ENGINE_CONFIG.noise_canceler,
        )
    };

    let (usb, serial) = {
        let _usb_id = gpioa.pa10.into_alternate::<10>();
        let usb_n = gpioa.pa11.into_alternate();
        let usb_p = gpioa.pa12.into_alternate();
        let usb = stm32h7xx_hal::usb_hs::USB2::new(
            device.OTG2_HS_GLOBAL,
            device.OTG2_HS_DEVICE,
            device.OTG2_HS_PWRCLK,
            usb_n,
            usb_p,
            ccdr.peripheral.USB2OTG,
            &ccdr.clocks,
        );

        let endpoint_memory =
            cortex_m::singleton!(: Option<&'static mut [u32]> = None).unwrap();
        endpoint_memory.replace(
            &mut cortex_m::singleton!(: [u32; 1024] = [0; 1024]).unwrap()[..],
        );
        let usb_bus = cortex_m::singleton!(: usb_device::bus::UsbBusAllocator<UsbBus> =
        stm32h7xx_hal::usb_hs::UsbBus::new(
            usb,
            endpoint_memory.take().unwrap(),
        ))
        .unwrap();

        let read_store = cortex_m::singleton!(: [u8; 128] = [0; 128]).unwrap();
        let write_store =
            cortex_m::singleton!(: [u8; 1024] = [0; 1024]).unwrap();
        let serial = usbd_serial::SerialPort::new_with_store(
            usb_bus,
            &mut read_store[..],
            &mut write_store[..],
        );

        let usb_device = usb_device::device::UsbDeviceBuilder::new(
            usb_bus,
            usb_device::device::UsbVidPid(0x1209, 0x392F),
        )
        .strings(&[usb_device::device::StringDescriptors::default()
            .manufacturer("ARTIQ/Sinara")
            .product("Latency Tester")])
        .unwrap()
        .device_class(usbd_serial::USB_CLASS_CDC)
        .build();

        (usb_device, BestEffortInterface::new(UsbSerial::new(serial)))
    };

    let metadata = ApplicationMetadata::new(ENGINE_CONFIG, &PROFILES);
    log::info!("{metadata}");

    log::info!("setup() complete");

    LattoolDevices {
        base_tick,
        capture,
        stimulus,
        resets,
        delay,
        usb,
        serial,
        metadata,
    }
}
