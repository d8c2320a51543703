//! Single-sample handoff between the capture and the stimulus interrupts.
//!
//! # Design
//! The captured tick count and the three flags are packed into a single 32-bit word. Every
//! operation is one atomic read-modify-write on that word, so the 16-bit sample and its flags are
//! always observed together, independent of the interrupt priorities of the contexts involved.
//!
//! The slot holds at most one unconsumed sample. `data_ready` gates all writes of
//! `captured_ticks`: a capture that arrives while a sample is pending, or while no stimulus is
//! armed, is rejected and flagged as spurious instead of overwriting the pending sample.
use core::sync::atomic::{AtomicU32, Ordering};

use crate::Error;

const TICKS: u32 = 0xffff;
const READY: u32 = 1 << 16;
const FIRED: u32 = 1 << 17;
const SPURIOUS: u32 = 1 << 18;

/// A point-in-time view of the [CaptureSlot].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct CaptureState {
    pub captured_ticks: u16,
    pub data_ready: bool,
    pub fired: bool,
    pub spurious: bool,
}

impl From<u32> for CaptureState {
    fn from(word: u32) -> Self {
        Self {
            captured_ticks: (word & TICKS) as u16,
            data_ready: word & READY != 0,
            fired: word & FIRED != 0,
            spurious: word & SPURIOUS != 0,
        }
    }
}

#[derive(Debug, Default)]
pub struct CaptureSlot {
    state: AtomicU32,
}

impl CaptureSlot {
    pub const fn new() -> Self {
        Self {
            state: AtomicU32::new(0),
        }
    }

    /// Clear the sample and all flags.
    pub fn clear(&self) {
        self.state.store(0, Ordering::Release);
    }

    /// Open the capture window for one stimulus.
    pub fn arm(&self) {
        self.state.fetch_or(FIRED, Ordering::AcqRel);
    }

    /// Close the capture window.
    pub fn disarm(&self) {
        self.state.fetch_and(!FIRED, Ordering::AcqRel);
    }

    /// Offer a captured tick count.
    ///
    /// The sample is accepted only if a stimulus is armed and no sample is pending. Acceptance
    /// closes the window. A rejected sample sets the spurious flag and leaves any pending sample
    /// untouched.
    pub fn try_publish(&self, ticks: u16) -> Result<(), Error> {
        self.state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |word| {
                (word & (FIRED | READY) == FIRED)
                    .then_some((word & SPURIOUS) | READY | ticks as u32)
            })
            .map(drop)
            .map_err(|_| {
                self.state.fetch_or(SPURIOUS, Ordering::AcqRel);
                Error::SpuriousCapture
            })
    }

    /// Take the pending sample, if any.
    pub fn try_drain(&self) -> Option<u16> {
        self.state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |word| {
                (word & READY != 0).then_some(word & !READY)
            })
            .ok()
            .map(|word| (word & TICKS) as u16)
    }

    /// Take and clear the spurious capture flag.
    pub fn take_spurious(&self) -> bool {
        self.state.fetch_and(!SPURIOUS, Ordering::AcqRel) & SPURIOUS != 0
    }

    pub fn snapshot(&self) -> CaptureState {
        self.state.load(Ordering::Acquire).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unarmed_capture_is_spurious() {
        let slot = CaptureSlot::new();
        assert_eq!(slot.try_publish(17), Err(Error::SpuriousCapture));
        let state = slot.snapshot();
        assert!(state.spurious);
        assert!(!state.data_ready);
        assert_eq!(state.captured_ticks, 0);
        assert!(slot.take_spurious());
        assert!(!slot.take_spurious());
    }

    #[test]
    fn pending_sample_is_not_overwritten() {
        let slot = CaptureSlot::new();
        slot.arm();
        slot.try_publish(100).unwrap();
        assert!(!slot.snapshot().fired);

        // Re-arming does not allow overwriting the pending sample.
        slot.arm();
        assert_eq!(slot.try_publish(200), Err(Error::SpuriousCapture));
        assert_eq!(slot.snapshot().captured_ticks, 100);
        assert_eq!(slot.try_drain(), Some(100));
        assert_eq!(slot.try_drain(), None);

        // Spurious flag survives a later accepted sample until it is drained.
        slot.try_publish(300).unwrap();
        let state = slot.snapshot();
        assert!(state.spurious && state.data_ready);
        assert_eq!(slot.try_drain(), Some(300));
    }

    #[test]
    fn disarm_and_clear() {
        let slot = CaptureSlot::new();
        slot.arm();
        slot.disarm();
        assert!(slot.try_publish(1).is_err());
        slot.clear();
        assert_eq!(slot.snapshot(), CaptureState::default());
    }
}
