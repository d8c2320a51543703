use embedded_hal::{delay::DelayNs, digital::OutputPin};

use crate::{BoardReset, Command, ProfileSelector, Report, RunMode};

/// Applies decoded commands.
///
/// Mode changes only record a request in the [RunMode]; the stop report is emitted by the main
/// loop once the interrupt sources are actually disarmed.
pub struct Dispatcher<'a, P, D, const N: usize> {
    profiles: &'a ProfileSelector,
    resets: BoardReset<P, D, N>,
}

impl<'a, P: OutputPin, D: DelayNs, const N: usize> Dispatcher<'a, P, D, N> {
    pub fn new(
        profiles: &'a ProfileSelector,
        resets: BoardReset<P, D, N>,
    ) -> Self {
        Self { profiles, resets }
    }

    /// Handle one command.
    ///
    /// # Returns
    /// The report to emit, if any.
    pub fn handle(
        &mut self,
        command: Command,
        run_mode: &mut RunMode,
    ) -> Option<Report> {
        log::debug!("Command: {command:?}");
        let result = match command {
            Command::Stop => {
                run_mode.stop();
                return None;
            }
            Command::StartLatency => {
                run_mode.start_latency().map(|_| Report::StartingLatency)
            }
            Command::StartLevel => {
                run_mode.start_level().map(|_| Report::StartingLevel)
            }
            Command::SelectProfile(index) => {
                self.profiles.select(index).map(|profile| {
                    log::info!("Profile {index} ({}) selected", profile.name());
                    Report::ProfileSelected {
                        index,
                        name: profile.name(),
                    }
                })
            }
            Command::ResetBoard(board) => {
                self.resets.reset(board).map(|_| Report::Resetting(board))
            }
        };
        Some(result.unwrap_or_else(|err| {
            log::warn!("{command:?} failed: {err}");
            err.into()
        }))
    }
}
