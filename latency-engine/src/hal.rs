use crate::Polarity;

/// A free-running 16-bit counter with edge capture latching.
pub trait CaptureTimer {
    /// Load the counter value.
    fn preload(&mut self, count: u16);

    /// Select the capture edge.
    fn set_polarity(&mut self, polarity: Polarity);

    /// Take the latched counter value of the most recent edge, clearing the capture flag.
    fn take_capture(&mut self) -> Option<u16>;

    /// Enable the capture interrupt.
    fn listen(&mut self);

    /// Disable the capture interrupt.
    fn unlisten(&mut self);
}

/// The fixed-rate base tick interrupt source.
pub trait TickSource {
    /// Restart the current tick period from zero.
    fn restart(&mut self);

    /// Enable the tick interrupt.
    fn listen(&mut self);

    /// Disable the tick interrupt.
    fn unlisten(&mut self);
}
