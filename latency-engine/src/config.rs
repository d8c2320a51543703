use serde::{Deserialize, Serialize};

/// Input capture edge selection.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    Rising,
    Falling,
}

/// Deployment variant of the tester.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Number of target boards with a reset line.
    pub board_count: u8,
    /// Whether the input capture noise filter is enabled. This delays every capture by a fixed
    /// number of capture ticks.
    pub noise_canceler: bool,
    /// The response edge captured during latency measurements.
    pub capture_polarity: Polarity,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            board_count: 2,
            noise_canceler: false,
            capture_polarity: Polarity::Falling,
        }
    }
}

impl EngineConfig {
    /// Capture counter preload for an armed window.
    ///
    /// The counter is loaded such that it reads zero at the instant the stimulus edge reaches
    /// the capture input. This compensates the write itself, the stimulus activation delay and
    /// the optional noise filter delay.
    ///
    /// # Args
    /// * `activation_ticks` - Capture ticks from the counter write until the stimulus edge is
    ///   seen on the capture input.
    /// * `filter_delay_ticks` - Capture ticks added by the noise filter, if enabled.
    pub const fn capture_bias(
        &self,
        activation_ticks: u16,
        filter_delay_ticks: u16,
    ) -> u16 {
        let filter = if self.noise_canceler {
            filter_delay_ticks
        } else {
            0
        };
        0u16.wrapping_sub(1)
            .wrapping_sub(activation_ticks)
            .wrapping_sub(filter)
    }
}
