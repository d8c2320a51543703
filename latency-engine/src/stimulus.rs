//! Periodic stimulus generation.
//!
//! # Design
//! The generator is invoked once per base tick. It counts ticks within the current period and
//! performs two actions:
//!
//! * When the count reaches the profile timeout, the capture window of the previous stimulus is
//!   closed. The pending sample is reported, or a timeout if there is none. This happens once per
//!   period, including the first partial period after a start where no stimulus has fired yet.
//! * When the count reaches the profile fire tick, the capture window is armed, the capture
//!   counter is preloaded with the calibration bias and a short active-low pulse is driven on the
//!   stimulus output. The count restarts from zero.
//!
//! If both thresholds are reached in the same invocation the timeout is handled first. Both
//! comparisons are inclusive so that a profile change that lowers a threshold below the current
//! count takes effect immediately.
use embedded_hal::digital::OutputPin;

use crate::{CaptureSlot, CaptureTimer, Error, Report, TimingProfile};

pub struct StimulusGenerator<P> {
    output: P,
    bias: u16,
    tick: u8,
    timeout_pending: bool,
}

impl<P: OutputPin> StimulusGenerator<P> {
    /// Construct the generator.
    ///
    /// # Args
    /// * `output` - The stimulus line. It is idle high and pulsed low.
    /// * `bias` - Capture counter preload, see [crate::EngineConfig::capture_bias].
    pub fn new(mut output: P, bias: u16) -> Result<Self, Error> {
        output.set_high().map_err(Error::pin)?;
        Ok(Self {
            output,
            bias,
            tick: 0,
            timeout_pending: true,
        })
    }

    /// Restart from the beginning of a period.
    pub fn reset(&mut self) -> Result<(), Error> {
        self.tick = 0;
        self.timeout_pending = true;
        self.release()
    }

    /// Return the stimulus line to idle.
    pub fn release(&mut self) -> Result<(), Error> {
        self.output.set_high().map_err(Error::pin)
    }

    /// Advance by one base tick.
    ///
    /// # Args
    /// * `profile` - The active timing profile.
    /// * `slot` - The capture handoff shared with the capture detector.
    /// * `capture` - The capture counter to preload on stimulus.
    ///
    /// # Returns
    /// The latency or timeout report, if the timeout of the period was reached on this tick.
    pub fn tick(
        &mut self,
        profile: &TimingProfile,
        slot: &CaptureSlot,
        capture: &mut impl CaptureTimer,
    ) -> Result<Option<Report>, Error> {
        self.tick = self.tick.saturating_add(1);

        let mut report = None;
        if self.timeout_pending && self.tick >= profile.timeout_ticks() {
            self.timeout_pending = false;
            report = Some(
                slot.try_drain()
                    .ok_or(Error::Timeout)
                    .map_or_else(Report::from, Report::Latency),
            );
            slot.disarm();
        }

        if self.tick >= profile.fire_tick() {
            self.tick = 0;
            slot.arm();
            capture.preload(self.bias);
            self.output.set_low().map_err(Error::pin)?;
            self.output.set_high().map_err(Error::pin)?;
            self.timeout_pending = true;
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockCapture, MockPin};
    use crate::PROFILES;

    fn generator() -> (StimulusGenerator<MockPin>, MockPin) {
        let pin = MockPin::default();
        (StimulusGenerator::new(pin.clone(), 0xfffd).unwrap(), pin)
    }

    #[test]
    fn fires_once_per_period() {
        let (mut gen, pin) = generator();
        let slot = CaptureSlot::new();
        let mut capture = MockCapture::default();
        let profile = &PROFILES[1];

        for _ in 0..4 {
            gen.tick(profile, &slot, &mut capture).unwrap();
        }
        assert_eq!(pin.pulses(), 0);
        assert_eq!(gen.tick(profile, &slot, &mut capture), Ok(None));
        assert_eq!(pin.pulses(), 1);
        assert!(pin.is_high());
        assert!(slot.snapshot().fired);
        assert_eq!(capture.counter, 0xfffd);
        assert_eq!(gen.tick, 0);
        assert!(gen.timeout_pending);
    }

    #[test]
    fn first_period_times_out() {
        let (mut gen, pin) = generator();
        let slot = CaptureSlot::new();
        let mut capture = MockCapture::default();
        let profile = &PROFILES[0];

        let reports: Vec<_> = (1..=50)
            .filter_map(|tick| {
                let report = gen.tick(profile, &slot, &mut capture).unwrap();
                report.map(|report| (tick, report))
            })
            .collect();
        assert_eq!(reports, [(20, Report::Timeout), (45, Report::Timeout)]);
        assert_eq!(pin.pulses(), 2);
    }

    #[test]
    fn timeout_precedes_fire() {
        let (mut gen, pin) = generator();
        let slot = CaptureSlot::new();
        let mut capture = MockCapture::default();
        let profile = &PROFILES[1];

        for _ in 0..5 {
            gen.tick(profile, &slot, &mut capture).unwrap();
        }
        slot.try_publish(42).unwrap();
        // Tick 1 and 2 of the next period.
        assert_eq!(gen.tick(profile, &slot, &mut capture), Ok(None));
        assert_eq!(gen.tick(profile, &slot, &mut capture), Ok(None));
        assert_eq!(
            gen.tick(profile, &slot, &mut capture),
            Ok(Some(Report::Latency(42)))
        );
        assert!(!slot.snapshot().fired);
        assert!(!gen.timeout_pending);
        assert_eq!(gen.tick(profile, &slot, &mut capture), Ok(None));
        assert_eq!(gen.tick(profile, &slot, &mut capture), Ok(None));
        assert_eq!(pin.pulses(), 2);
    }

    #[test]
    fn shortened_profile_does_not_stall() {
        let (mut gen, pin) = generator();
        let slot = CaptureSlot::new();
        let mut capture = MockCapture::default();

        for _ in 0..25 {
            gen.tick(&PROFILES[0], &slot, &mut capture).unwrap();
        }
        for _ in 0..10 {
            gen.tick(&PROFILES[0], &slot, &mut capture).unwrap();
        }
        assert_eq!(gen.tick, 10);

        // Both thresholds of the new profile are already exceeded.
        assert_eq!(
            gen.tick(&PROFILES[1], &slot, &mut capture),
            Ok(Some(Report::Timeout))
        );
        assert_eq!(gen.tick, 0);
        assert_eq!(pin.pulses(), 2);
        assert!(gen.timeout_pending);
    }

    #[test]
    fn reset() {
        let (mut gen, _pin) = generator();
        let slot = CaptureSlot::new();
        let mut capture = MockCapture::default();
        for _ in 0..9 {
            gen.tick(&PROFILES[1], &slot, &mut capture).unwrap();
        }
        assert!(!gen.timeout_pending);
        gen.reset().unwrap();
        assert_eq!(gen.tick, 0);
        assert!(gen.timeout_pending);
    }
}
