//! USB CDC-ACM command and report channel.
use core::fmt::Write as _;

use latency_engine::Report;

use super::UsbBus;

pub type SerialPort = usbd_serial::SerialPort<
    'static,
    UsbBus,
    &'static mut [u8],
    &'static mut [u8],
>;

/// `embedded-io` access to the USB serial port.
pub struct UsbSerial {
    port: SerialPort,
}

#[derive(Debug)]
pub struct Error(usbd_serial::UsbError);

impl From<usbd_serial::UsbError> for Error {
    fn from(e: usbd_serial::UsbError) -> Self {
        Self(e)
    }
}

impl embedded_io::Error for Error {
    fn kind(&self) -> embedded_io::ErrorKind {
        embedded_io::ErrorKind::Other
    }
}

impl embedded_io::ErrorType for UsbSerial {
    type Error = Error;
}

impl embedded_io::Read for UsbSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        match self.port.read(buf) {
            Err(usbd_serial::UsbError::WouldBlock) => Ok(0),
            other => other.map_err(From::from),
        }
    }
}

impl embedded_io::Write for UsbSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.port.write(buf).map_err(From::from)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.port.flush().map_err(From::from)
    }
}

impl embedded_io::WriteReady for UsbSerial {
    fn write_ready(&mut self) -> Result<bool, Self::Error> {
        // Only write while a terminal holds the port open.
        Ok(self.port.dtr())
    }
}

impl UsbSerial {
    pub fn new(port: SerialPort) -> Self {
        Self { port }
    }

    pub fn port_mut(&mut self) -> &mut SerialPort {
        &mut self.port
    }

    /// Whether a terminal holds the port open.
    pub fn terminal_open(&self) -> bool {
        self.port.dtr()
    }
}

/// Wrapper type for a "best effort" serial interface.
///
/// # Note
/// Overflows of the output are silently ignored.
pub struct BestEffortInterface<T>(T);

impl<T> BestEffortInterface<T>
where
    T: embedded_io::Write + embedded_io::WriteReady,
{
    /// Construct an interface where overflows and errors when writing on the output are silently
    /// ignored.
    pub fn new(interface: T) -> Self {
        Self(interface)
    }

    /// Get access to the inner (wrapped) interface
    pub fn inner(&self) -> &T {
        &self.0
    }

    /// Get mutable access to the inner (wrapped) interface
    pub fn inner_mut(&mut self) -> &mut T {
        &mut self.0
    }

    /// Emit a report as one line.
    pub fn report(&mut self, report: &Report) {
        let mut line: heapless::String<64> = heapless::String::new();
        // All report lines fit. A truncated line is still emitted.
        write!(line, "{report}\r\n").ok();
        embedded_io::Write::write(self, line.as_bytes()).ok();
    }
}

impl<T> embedded_io::Write for BestEffortInterface<T>
where
    T: embedded_io::Write + embedded_io::WriteReady,
{
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if let Ok(true) = self.0.write_ready() {
            self.0.write(buf).ok();
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.0.flush().ok();
        Ok(())
    }
}

impl<T> embedded_io::ErrorType for BestEffortInterface<T>
where
    T: embedded_io::ErrorType,
{
    type Error = <T as embedded_io::ErrorType>::Error;
}

impl<T> embedded_io::Read for BestEffortInterface<T>
where
    T: embedded_io::Read,
{
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.0.read(buf)
    }
}

/// The report channel as shared between the USB task and the main loop.
pub type ReportChannel = BestEffortInterface<UsbSerial>;
