//! Pulse width measurement.
//!
//! # Design
//! Level mode measures the time between a falling edge and the following rising edge on the
//! capture input, independent of any stimulus. It runs in the main loop with the capture
//! interrupt disabled and polls the capture flag directly.
//!
//! The measurement is an explicit two-phase state machine. Each [LevelMeasurement::poll] either
//! finds nothing latched or consumes exactly one edge and moves to the next phase, re-arming the
//! capture unit for the opposite edge. The caller checks for a stop request between polls. A poll
//! that consumed an edge completes its phase transition before the caller can observe a stop. On a
//! stop the caller ends the measurement with [LevelMeasurement::cancel], which discards a pulse
//! whose falling edge was already captured.
//!
//! The counter is free-running and not reset between the two edges. The width is the wrapping
//! difference of the two capture values, so pulses longer than one counter period alias.
use crate::{CaptureTimer, Polarity};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LevelPhase {
    AwaitingFalling,
    AwaitingRising { falling: u16 },
}

#[derive(Debug)]
pub struct LevelMeasurement {
    phase: LevelPhase,
}

impl LevelMeasurement {
    /// Start a measurement: disable the capture interrupt, discard any stale capture and arm for
    /// a falling edge.
    pub fn start(capture: &mut impl CaptureTimer) -> Self {
        capture.unlisten();
        capture.set_polarity(Polarity::Falling);
        capture.take_capture();
        Self {
            phase: LevelPhase::AwaitingFalling,
        }
    }

    /// Check for a latched edge.
    ///
    /// # Returns
    /// The pulse width in capture ticks once the rising edge of a pulse has been captured.
    pub fn poll(&mut self, capture: &mut impl CaptureTimer) -> Option<u16> {
        let stamp = capture.take_capture()?;
        match self.phase {
            LevelPhase::AwaitingFalling => {
                capture.set_polarity(Polarity::Rising);
                self.phase = LevelPhase::AwaitingRising { falling: stamp };
                None
            }
            LevelPhase::AwaitingRising { falling } => {
                capture.set_polarity(Polarity::Falling);
                self.phase = LevelPhase::AwaitingFalling;
                Some(stamp.wrapping_sub(falling))
            }
        }
    }

    /// Abandon the measurement.
    ///
    /// A half captured pulse and any edge latched since the last poll are discarded. The capture
    /// unit is left with its interrupt disabled.
    pub fn cancel(self, capture: &mut impl CaptureTimer) {
        if let LevelPhase::AwaitingRising { falling } = self.phase {
            log::debug!("Discarding pulse from {falling}");
        }
        capture.take_capture();
    }
}
