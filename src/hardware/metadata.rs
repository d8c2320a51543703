use core::fmt;

use latency_engine::{EngineConfig, TimingProfile};
use serde::Serialize;

mod build_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

#[derive(Serialize)]
pub struct ApplicationMetadata {
    pub firmware_version: &'static str,
    pub rust_version: &'static str,
    pub profile: &'static str,
    pub git_dirty: bool,
    pub features: &'static str,
    pub config: EngineConfig,
    pub profiles: &'static [TimingProfile],
}

impl ApplicationMetadata {
    /// Construct the global metadata.
    ///
    /// # Note
    /// This may only be called once.
    ///
    /// # Args
    /// * `config` - The engine configuration built into the firmware.
    /// * `profiles` - The selectable timing profiles.
    ///
    /// # Returns
    /// A reference to the global metadata.
    pub fn new(
        config: EngineConfig,
        profiles: &'static [TimingProfile],
    ) -> &'static ApplicationMetadata {
        cortex_m::singleton!(: ApplicationMetadata = ApplicationMetadata {
            firmware_version: build_info::GIT_VERSION.unwrap_or("Unspecified"),
            rust_version: build_info::RUSTC_VERSION,
            profile: build_info::PROFILE,
            git_dirty: build_info::GIT_DIRTY.unwrap_or(false),
            features: build_info::FEATURES_STR,
            config,
            profiles,
        })
        .unwrap()
    }
}

impl fmt::Display for ApplicationMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<20}: {} [{}]",
            "Version", self.firmware_version, self.profile,
        )?;
        writeln!(f, "{:<20}: {}", "Rustc Version", self.rust_version)?;
        writeln!(f, "{:<20}: {}", "Features", self.features)?;
        write!(
            f,
            "{:<20}: {} board(s), noise canceler {}, {:?} edge",
            "Configuration",
            self.config.board_count,
            self.config.noise_canceler,
            self.config.capture_polarity
        )
    }
}
