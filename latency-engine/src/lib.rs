//! Interrupt response latency measurement engine.
//!
//! A periodic stimulus is driven onto an output line and the response edge of the target under
//! test is timestamped by an input capture unit. The engine contains everything that does not
//! depend on a particular microcontroller:
//!
//! * [TimingProfile] and [ProfileSelector]: the stimulus period and timeout window.
//! * [CaptureSlot]: the single-sample handoff between the capture interrupt and the stimulus
//!   interrupt.
//! * [StimulusGenerator] and [CaptureDetector]: the two interrupt-context halves of a latency
//!   measurement.
//! * [RunMode] and [LevelMeasurement]: the main loop state machine, including pulse-width
//!   measurement.
//! * [BoardReset] and [Dispatcher]: command handling.
//!
//! Hardware is accessed through [CaptureTimer], [TickSource] and the `embedded-hal` traits.
#![cfg_attr(not(any(test, feature = "testing")), no_std)]

mod capture;
pub use capture::*;
mod command;
pub use command::*;
mod config;
pub use config::*;
mod detector;
pub use detector::*;
mod dispatch;
pub use dispatch::*;
mod error;
pub use error::*;
mod hal;
pub use hal::*;
mod level;
pub use level::*;
mod profile;
pub use profile::*;
mod report;
pub use report::*;
mod reset;
pub use reset::*;
mod run_mode;
pub use run_mode::*;
mod stimulus;
pub use stimulus::*;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
