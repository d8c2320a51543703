//! Timing and calibration constants of the tester.
use fugit::{HertzU32 as Hertz, MegahertzU32 as MegaHertz};
use latency_engine::{EngineConfig, Polarity};

/// The core clock.
pub const SYSCLK: MegaHertz = MegaHertz::from_raw(400);

/// The base tick driving the stimulus period. Profiles count in these ticks.
pub const BASE_TICK_FREQUENCY: Hertz = Hertz::from_raw(250);

/// The counting frequency of the capture timer. Reported latencies and pulse widths are in these
/// ticks (50 ns each).
pub const CAPTURE_TIMER_FREQUENCY: MegaHertz = MegaHertz::from_raw(20);

/// The capture counter wraps at the 16 bit boundary.
pub const CAPTURE_TIMER_PERIOD: u16 = u16::MAX;

/// Capture ticks from the capture counter preload until the stimulus edge is latched by the
/// capture unit.
pub const ACTIVATION_TICKS: u16 = 2;

/// Capture ticks added by the input filter. The filter samples 8 times at the 200 MHz timer kernel
/// clock (40 ns) which rounds up to one capture tick.
pub const NOISE_CANCELER_DELAY_TICKS: u16 = 1;

/// The variant selected through cargo features.
pub const ENGINE_CONFIG: EngineConfig = EngineConfig {
    board_count: if cfg!(feature = "single_board") { 1 } else { 2 },
    noise_canceler: cfg!(feature = "noise_canceler"),
    capture_polarity: if cfg!(feature = "rising_edge") {
        Polarity::Rising
    } else {
        Polarity::Falling
    },
};

/// Capture counter preload when a stimulus fires.
pub const CAPTURE_BIAS: u16 =
    ENGINE_CONFIG.capture_bias(ACTIVATION_TICKS, NOISE_CANCELER_DELAY_TICKS);

/// Number of target boards with a reset line wired.
pub const RESET_LINES: usize = 2;

/// Capacity of the interrupt-to-USB report queue.
pub const REPORT_QUEUE_DEPTH: usize = 16;
