use embedded_hal::{delay::DelayNs, digital::OutputPin};

use crate::Error;

/// Time a target board reset line is held low.
pub const RESET_SETTLE_MS: u32 = 100;

/// Active-low reset lines of up to `N` target boards.
pub struct BoardReset<P, D, const N: usize> {
    lines: [P; N],
    delay: D,
    board_count: u8,
}

impl<P: OutputPin, D: DelayNs, const N: usize> BoardReset<P, D, N> {
    /// Construct the controller and release all reset lines.
    ///
    /// # Args
    /// * `lines` - The reset lines, indexed by board.
    /// * `delay` - Blocking delay used for the settle time.
    /// * `board_count` - Number of boards actually attached. Clamped to `N`.
    pub fn new(
        mut lines: [P; N],
        delay: D,
        board_count: u8,
    ) -> Result<Self, Error> {
        for line in lines.iter_mut() {
            line.set_high().map_err(Error::pin)?;
        }
        Ok(Self {
            lines,
            delay,
            board_count: board_count.min(N as u8),
        })
    }

    /// Pulse the reset line of a board. Blocks for the settle time.
    pub fn reset(&mut self, board: u8) -> Result<(), Error> {
        if board >= self.board_count {
            return Err(Error::InvalidBoard(board));
        }
        let line = &mut self.lines[board as usize];
        log::info!("Resetting board {board}");
        line.set_low().map_err(Error::pin)?;
        self.delay.delay_ms(RESET_SETTLE_MS);
        line.set_high().map_err(Error::pin)
    }
}
