use core::sync::atomic::{AtomicU8, Ordering};
use serde::Serialize;

use crate::Error;

/// Stimulus cadence and response timeout, both in base ticks.
///
/// The period counter restarts when the stimulus fires, so `timeout_ticks` is measured from the
/// stimulus. A profile is valid if the timeout check happens strictly before the next stimulus:
/// `0 < timeout_ticks < fire_tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimingProfile {
    name: &'static str,
    timeout_ticks: u8,
    fire_tick: u8,
}

impl TimingProfile {
    /// Construct a validated profile.
    ///
    /// # Args
    /// * `name` - Human readable name, reported on selection.
    /// * `timeout_ticks` - Base ticks after the stimulus at which the response is collected.
    /// * `fire_tick` - Base ticks per stimulus period.
    pub const fn new(
        name: &'static str,
        timeout_ticks: u8,
        fire_tick: u8,
    ) -> Result<Self, Error> {
        if timeout_ticks == 0 || timeout_ticks >= fire_tick {
            return Err(Error::InvalidProfile {
                timeout_ticks,
                fire_tick,
            });
        }
        Ok(Self {
            name,
            timeout_ticks,
            fire_tick,
        })
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn timeout_ticks(&self) -> u8 {
        self.timeout_ticks
    }

    pub const fn fire_tick(&self) -> u8 {
        self.fire_tick
    }
}

const fn builtin(
    name: &'static str,
    timeout_ticks: u8,
    fire_tick: u8,
) -> TimingProfile {
    match TimingProfile::new(name, timeout_ticks, fire_tick) {
        Ok(profile) => profile,
        Err(_) => panic!("Built-in profile violates timeout < fire"),
    }
}

/// The built-in profiles, assuming a 4 ms base tick.
pub const PROFILES: [TimingProfile; 2] =
    [builtin("10Hz", 20, 25), builtin("50Hz", 3, 5)];

/// The active profile out of a fixed table.
///
/// Selection swaps an index and is safe against concurrent readers in interrupt context. Readers
/// pick up the new profile on their next access.
pub struct ProfileSelector {
    profiles: &'static [TimingProfile],
    active: AtomicU8,
}

impl ProfileSelector {
    /// # Panics
    /// If `profiles` is empty or has more than 256 entries.
    pub const fn new(profiles: &'static [TimingProfile]) -> Self {
        assert!(!profiles.is_empty() && profiles.len() <= 256);
        Self {
            profiles,
            active: AtomicU8::new(0),
        }
    }

    pub fn profiles(&self) -> &'static [TimingProfile] {
        self.profiles
    }

    /// Index of the active profile.
    pub fn index(&self) -> u8 {
        self.active.load(Ordering::Relaxed)
    }

    pub fn active(&self) -> &'static TimingProfile {
        let profiles: &'static [TimingProfile] = self.profiles;
        &profiles[self.index() as usize]
    }

    /// Select the active profile by index.
    ///
    /// An out-of-range index leaves the active profile unchanged.
    pub fn select(&self, index: u8) -> Result<&'static TimingProfile, Error> {
        let profiles: &'static [TimingProfile] = self.profiles;
        let profile = profiles
            .get(index as usize)
            .ok_or(Error::InvalidProfileSelection(index))?;
        self.active.store(index, Ordering::Relaxed);
        Ok(profile)
    }
}

impl Default for ProfileSelector {
    fn default() -> Self {
        Self::new(&PROFILES)
    }
}
