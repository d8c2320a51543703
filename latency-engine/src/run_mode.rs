//! Run-mode state machine.
//!
//! Commands only record a request. The main loop applies pending requests with [RunMode::poll]
//! and performs the returned [Action] on the hardware, so that interrupt sources are only ever
//! armed and disarmed from one context.
use embedded_hal::digital::OutputPin;
use strum::IntoStaticStr;

use crate::{
    CaptureSlot, CaptureTimer, Error, Polarity, StimulusGenerator, TickSource,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, IntoStaticStr)]
pub enum RunStatus {
    Stopped,
    StopRequested,
    /// Powered, no mode selected since start-up.
    Idle,
    LatencyRequested,
    LatencyRunning,
    LevelRequested,
    LevelRunning,
}

impl RunStatus {
    /// Neither running nor about to run.
    pub fn is_halted(&self) -> bool {
        matches!(self, Self::Stopped | Self::Idle)
    }
}

/// Hardware action to be performed by the main loop after a state change.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Action {
    /// Disarm both interrupt sources.
    Disarm,
    /// Arm the stimulus and capture interrupts for latency measurement.
    ArmLatency,
    /// Disarm the interrupts and run the level measurement loop.
    EnterLevel,
}

#[derive(Debug)]
pub struct RunMode {
    status: RunStatus,
}

impl Default for RunMode {
    fn default() -> Self {
        Self::new()
    }
}

impl RunMode {
    pub const fn new() -> Self {
        Self {
            status: RunStatus::Idle,
        }
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Request a stop.
    ///
    /// # Returns
    /// Whether a new stop was requested. Stopping while halted or already stopping is a no-op.
    pub fn stop(&mut self) -> bool {
        if self.status.is_halted() || self.status == RunStatus::StopRequested
        {
            return false;
        }
        self.status = RunStatus::StopRequested;
        true
    }

    /// Request a latency measurement.
    pub fn start_latency(&mut self) -> Result<(), Error> {
        self.request(RunStatus::LatencyRequested)
    }

    /// Request a level measurement.
    pub fn start_level(&mut self) -> Result<(), Error> {
        self.request(RunStatus::LevelRequested)
    }

    fn request(&mut self, status: RunStatus) -> Result<(), Error> {
        if !self.status.is_halted() {
            return Err(Error::Busy);
        }
        self.status = status;
        Ok(())
    }

    /// Apply a pending request.
    ///
    /// # Returns
    /// The action the main loop must perform for the transition, if any.
    pub fn poll(&mut self) -> Option<Action> {
        let (status, action) = match self.status {
            RunStatus::StopRequested => (RunStatus::Stopped, Action::Disarm),
            RunStatus::LatencyRequested => {
                (RunStatus::LatencyRunning, Action::ArmLatency)
            }
            RunStatus::LevelRequested => {
                (RunStatus::LevelRunning, Action::EnterLevel)
            }
            _ => return None,
        };
        log::info!(
            "Run status: {} -> {}",
            <&str>::from(self.status),
            <&str>::from(status)
        );
        self.status = status;
        Some(action)
    }
}

/// Disarm both interrupt sources and return the stimulus line to idle.
pub fn disarm<P: OutputPin>(
    tick: &mut impl TickSource,
    capture: &mut impl CaptureTimer,
    generator: &mut StimulusGenerator<P>,
) -> Result<(), Error> {
    tick.unlisten();
    capture.unlisten();
    generator.release()
}

/// Arm a latency measurement from a clean state.
///
/// Both interrupt sources are disarmed while the base tick, the capture edge, the capture
/// handoff and the generator are reset, then both are enabled.
pub fn arm_latency<P: OutputPin>(
    tick: &mut impl TickSource,
    capture: &mut impl CaptureTimer,
    generator: &mut StimulusGenerator<P>,
    slot: &CaptureSlot,
    polarity: Polarity,
) -> Result<(), Error> {
    tick.unlisten();
    capture.unlisten();
    tick.restart();
    capture.preload(0);
    capture.set_polarity(polarity);
    capture.take_capture();
    slot.clear();
    generator.reset()?;
    capture.listen();
    tick.listen();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockCapture, MockPin, MockTick};

    #[test]
    fn stop_is_idempotent() {
        let mut mode = RunMode::new();
        assert_eq!(mode.status(), RunStatus::Idle);
        assert!(!mode.stop());
        assert_eq!(mode.poll(), None);

        mode.start_latency().unwrap();
        assert_eq!(mode.poll(), Some(Action::ArmLatency));
        assert!(mode.stop());
        assert!(!mode.stop());
        assert_eq!(mode.poll(), Some(Action::Disarm));
        assert_eq!(mode.status(), RunStatus::Stopped);
        assert!(!mode.stop());
        assert_eq!(mode.poll(), None);
        assert_eq!(mode.status(), RunStatus::Stopped);
    }

    #[test]
    fn busy_while_running() {
        let mut mode = RunMode::new();
        mode.start_level().unwrap();
        assert_eq!(mode.start_latency(), Err(Error::Busy));
        assert_eq!(mode.poll(), Some(Action::EnterLevel));
        assert_eq!(mode.status(), RunStatus::LevelRunning);
        assert_eq!(mode.start_level(), Err(Error::Busy));
        assert!(mode.stop());
        assert_eq!(mode.status(), RunStatus::StopRequested);
    }

    #[test]
    fn arm_and_disarm() {
        let mut tick = MockTick::default();
        let mut capture = MockCapture::default();
        let pin = MockPin::default();
        let mut gen = StimulusGenerator::new(pin.clone(), 0).unwrap();
        let slot = CaptureSlot::new();
        slot.arm();
        slot.try_publish(3).unwrap();
        capture.latched = Some(9);

        arm_latency(&mut tick, &mut capture, &mut gen, &slot, Polarity::Falling)
            .unwrap();
        assert!(tick.listening && capture.listening);
        assert_eq!(tick.restarts, 1);
        assert_eq!(capture.polarity, Some(Polarity::Falling));
        assert_eq!(capture.latched, None);
        assert_eq!(slot.snapshot(), Default::default());

        disarm(&mut tick, &mut capture, &mut gen).unwrap();
        assert!(!tick.listening && !capture.listening);
        assert!(pin.is_high());
    }
}
