//! Interrupt response latency tester.
//!
//! A stimulus pulse (active low, PD3) is generated at the cadence of the selected timing profile.
//! The response edge of the target under test on DI0 is timestamped by TIM5 relative to the
//! stimulus and reported over the USB serial port in 50 ns ticks.
//!
//! Commands are single bytes on the USB serial port:
//! * `s`: start latency measurement
//! * `l`: start level (pulse width) measurement on DI0
//! * `h`: stop the running measurement
//! * `r`, `t`: reset target board 0 or 1
//! * `0`..`9`: select a timing profile
//!
//! Every measurement is reported as one decimal line. `TO` marks a missing response and `SP` an
//! edge outside of a stimulus window.
#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

use latency_engine::PROFILES;

#[cfg(target_os = "none")]
use latency_engine::{CaptureSlot, ProfileSelector};

/// Handoff of the captured response between the capture and the base tick interrupts.
#[cfg(target_os = "none")]
static CAPTURE: CaptureSlot = CaptureSlot::new();

#[cfg(target_os = "none")]
static SELECTOR: ProfileSelector = ProfileSelector::new(&PROFILES);

#[cfg(not(target_os = "none"))]
fn main() {
    use lattool::design_parameters::{CAPTURE_BIAS, ENGINE_CONFIG};
    println!("{}", serde_json::to_string_pretty(&ENGINE_CONFIG).unwrap());
    println!("{}", serde_json::to_string_pretty(&PROFILES).unwrap());
    println!("Capture bias: {CAPTURE_BIAS:#06x}");
}

#[cfg(target_os = "none")]
#[rtic::app(
    device = lattool::hardware::hal::stm32,
    peripherals = true,
    dispatchers=[DCMI, JPEG]
)]
mod app {
    use super::*;

    use fugit::ExtU32;
    use heapless::spsc::{Consumer, Producer, Queue};
    use rtic_monotonics::Monotonic;

    use latency_engine::{
        arm_latency, disarm, Action, BoardReset, CaptureDetector, Command,
        Dispatcher, Error, LevelMeasurement, Report, RunMode,
        StimulusGenerator,
    };
    use lattool::{
        design_parameters::{
            CAPTURE_BIAS, ENGINE_CONFIG, REPORT_QUEUE_DEPTH, RESET_LINES,
        },
        hardware::{
            self, delay::AsmDelay, BaseTick, OutputLine, ReportChannel,
            ResponseCapture, Systick, UsbDevice,
        },
    };

    #[shared]
    struct Shared {
        run_mode: RunMode,
        base_tick: BaseTick,
        capture: ResponseCapture,
        generator: StimulusGenerator<OutputLine>,
        usb: UsbDevice,
        serial: ReportChannel,
    }

    #[local]
    struct Local {
        reports_in: Producer<'static, Report, REPORT_QUEUE_DEPTH>,
        reports_out: Consumer<'static, Report, REPORT_QUEUE_DEPTH>,
        dispatcher: Dispatcher<'static, OutputLine, AsmDelay, RESET_LINES>,
    }

    #[init(local = [reports: Queue<Report, REPORT_QUEUE_DEPTH> = Queue::new()])]
    fn init(c: init::Context) -> (Shared, Local) {
        let lattool = hardware::setup::setup(c.core, c.device);

        let (reports_in, reports_out) = c.local.reports.split();

        let generator =
            StimulusGenerator::new(lattool.stimulus, CAPTURE_BIAS).unwrap();
        let resets = BoardReset::new(
            lattool.resets,
            lattool.delay,
            ENGINE_CONFIG.board_count,
        )
        .unwrap();

        let mut buffer = [0u8; 512];
        if let Ok(len) =
            serde_json_core::to_slice(lattool.metadata, &mut buffer)
        {
            if let Ok(json) = core::str::from_utf8(&buffer[..len]) {
                log::info!("{json}");
            }
        }

        usb::spawn().unwrap();

        let shared = Shared {
            run_mode: RunMode::new(),
            base_tick: lattool.base_tick,
            capture: lattool.capture,
            generator,
            usb: lattool.usb,
            serial: lattool.serial,
        };

        let local = Local {
            reports_in,
            reports_out,
            dispatcher: Dispatcher::new(&SELECTOR, resets),
        };

        (shared, local)
    }

    #[idle(shared=[run_mode, base_tick, capture, generator, serial])]
    fn idle(mut c: idle::Context) -> ! {
        let mut level: Option<LevelMeasurement> = None;

        loop {
            match c.shared.run_mode.lock(|run_mode| run_mode.poll()) {
                Some(Action::ArmLatency) => {
                    let result = (
                        &mut c.shared.base_tick,
                        &mut c.shared.capture,
                        &mut c.shared.generator,
                    )
                        .lock(|tick, capture, generator| {
                            arm_latency(
                                tick,
                                capture,
                                generator,
                                &CAPTURE,
                                ENGINE_CONFIG.capture_polarity,
                            )
                        });
                    if let Err(err) = result {
                        log::error!("Arming failed: {err}");
                        c.shared
                            .serial
                            .lock(|serial| serial.report(&err.into()));
                    }
                }
                Some(Action::Disarm) => {
                    if let Some(measurement) = level.take() {
                        c.shared
                            .capture
                            .lock(|capture| measurement.cancel(capture));
                    }
                    let result = (
                        &mut c.shared.base_tick,
                        &mut c.shared.capture,
                        &mut c.shared.generator,
                    )
                        .lock(|tick, capture, generator| {
                            disarm(tick, capture, generator)
                        });
                    if let Err(err) = result {
                        log::error!("Disarming failed: {err}");
                    }
                    c.shared
                        .serial
                        .lock(|serial| serial.report(&Report::Stopped));
                }
                Some(Action::EnterLevel) => {
                    let result = (
                        &mut c.shared.base_tick,
                        &mut c.shared.capture,
                        &mut c.shared.generator,
                    )
                        .lock(|tick, capture, generator| {
                            disarm(tick, capture, generator)?;
                            Ok::<_, Error>(LevelMeasurement::start(capture))
                        });
                    match result {
                        Ok(measurement) => level = Some(measurement),
                        Err(err) => {
                            log::error!("Level mode failed: {err}");
                            c.shared
                                .serial
                                .lock(|serial| serial.report(&err.into()));
                        }
                    }
                }
                None => {}
            }

            if let Some(measurement) = level.as_mut() {
                if let Some(width) = c
                    .shared
                    .capture
                    .lock(|capture| measurement.poll(capture))
                {
                    c.shared
                        .serial
                        .lock(|serial| serial.report(&Report::Width(width)));
                }
            }

            if CAPTURE.take_spurious() {
                log::debug!("Spurious capture");
                c.shared
                    .serial
                    .lock(|serial| serial.report(&Report::Spurious));
            }
        }
    }

    #[task(
        binds = TIM2,
        priority = 3,
        shared=[base_tick, generator, capture],
        local=[reports_in]
    )]
    fn tick(mut c: tick::Context) {
        if !c.shared.base_tick.lock(|tick| tick.take_update()) {
            return;
        }

        let result = (&mut c.shared.generator, &mut c.shared.capture).lock(
            |generator, capture| {
                generator.tick(SELECTOR.active(), &CAPTURE, capture)
            },
        );

        let report = result.unwrap_or_else(|err| Some(err.into()));
        if let Some(report) = report {
            // A full queue drops the report.
            c.local.reports_in.enqueue(report).ok();
        }
    }

    #[task(binds = TIM5, priority = 3, shared=[capture])]
    fn response(mut c: response::Context) {
        c.shared.capture.lock(|capture| {
            // Level mode polls the capture with the interrupt disabled.
            if capture.is_listening() {
                // Rejected edges are flagged in the slot and reported by the
                // main loop.
                let _ = CaptureDetector::new(&CAPTURE).service(capture);
            }
        });
    }

    #[task(
        priority = 1,
        shared=[usb, serial, run_mode],
        local=[reports_out, dispatcher, terminal_open: bool = false]
    )]
    async fn usb(mut c: usb::Context) {
        loop {
            let mut buffer = [0u8; 64];
            let (count, terminal_open) =
                (&mut c.shared.usb, &mut c.shared.serial).lock(|usb, serial| {
                    usb.poll(&mut [serial.inner_mut().port_mut()]);
                    let count = embedded_io::Read::read(serial, &mut buffer)
                        .unwrap_or(0);
                    (count, serial.inner().terminal_open())
                });

            if terminal_open && !*c.local.terminal_open {
                c.shared
                    .serial
                    .lock(|serial| serial.report(&Report::Banner));
            }
            *c.local.terminal_open = terminal_open;

            let commands =
                buffer[..count].iter().copied().filter_map(Command::parse);
            for command in commands {
                let dispatcher = &mut *c.local.dispatcher;
                if let Some(report) = c
                    .shared
                    .run_mode
                    .lock(|run_mode| dispatcher.handle(command, run_mode))
                {
                    c.shared.serial.lock(|serial| serial.report(&report));
                }
            }

            let reports = &mut *c.local.reports_out;
            c.shared.serial.lock(|serial| {
                while let Some(report) = reports.dequeue() {
                    serial.report(&report);
                }
            });

            Systick::delay(10.millis()).await;
        }
    }
}
