use crate::{CaptureSlot, CaptureTimer, Error};

/// Interrupt-context handler for response edges.
///
/// A latched capture is accepted only while a stimulus window is armed and no earlier sample is
/// pending. Everything else is flagged as spurious and discarded. Runs in constant time.
#[derive(Copy, Clone)]
pub struct CaptureDetector<'a> {
    slot: &'a CaptureSlot,
}

impl<'a> CaptureDetector<'a> {
    pub const fn new(slot: &'a CaptureSlot) -> Self {
        Self { slot }
    }

    /// Offer the capture counter value of a response edge.
    pub fn on_edge(&self, ticks: u16) -> Result<(), Error> {
        self.slot.try_publish(ticks)
    }

    /// Service a capture interrupt.
    ///
    /// # Returns
    /// `None` if nothing was latched, otherwise the classification of the edge.
    pub fn service(
        &self,
        capture: &mut impl CaptureTimer,
    ) -> Option<Result<(), Error>> {
        capture.take_capture().map(|ticks| self.on_edge(ticks))
    }
}
