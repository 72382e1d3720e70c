use crate::base::error::{Error, Result};
use log::{error, trace};
use std::io;

/// Channel sends command bytes and receives response bytes via stream.
///
/// The Sweep protocol is built entirely from fixed width frames, so the
/// channel transfers exact byte counts: a write either puts every byte on
/// the wire or fails, and a read either fills the whole buffer or fails.
///
/// # Examples
/// ```ignore
/// let mut channel = Channel::new(serial_port);
///
/// channel.write_exact(b"MI\n").unwrap();
/// ```
#[derive(Debug)]
pub struct Channel<T: ?Sized> {
    stream: Box<T>,
}

impl<T: ?Sized> Channel<T>
where
    T: io::Read + io::Write,
{
    /// Create a new `Channel` wrapping a byte stream
    ///
    /// # Example
    /// ```ignore
    /// let channel = Channel::new(serial_port);
    /// ```
    pub fn new(stream: Box<T>) -> Channel<T> {
        trace!("Creating new Channel");
        Channel { stream }
    }

    /// Write all bytes to the stream and flush it
    pub fn write_exact(&mut self, bytes: &[u8]) -> Result<()> {
        trace!("Channel write_exact called with {} bytes", bytes.len());
        if let Err(e) = self.stream.write_all(bytes) {
            error!("IO error writing to stream: {}", e);
            return Err(classify_io_error(e));
        }
        trace!("Flushing stream...");
        if let Err(e) = self.stream.flush() {
            error!("IO error flushing stream: {}", e);
            return Err(classify_io_error(e));
        }
        trace!("Wrote and flushed {} bytes", bytes.len());
        Ok(())
    }

    /// Fill the whole buffer with bytes from the stream
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        trace!("Channel read_exact called for {} bytes", buf.len());
        match self.stream.read_exact(buf) {
            Ok(()) => {
                trace!("Read {} bytes from stream: {:?}", buf.len(), buf);
                Ok(())
            }
            Err(e) => {
                error!("IO error reading from stream: {}", e);
                Err(classify_io_error(e))
            }
        }
    }
}

/// Sorts stream failures into the crate's error taxonomy: an expired port
/// timeout is a timeout, a stream that ends mid transfer is a transport
/// fault, anything else stays an I/O error.
fn classify_io_error(err: io::Error) -> Error {
    match err.kind() {
        io::ErrorKind::TimedOut => Error::OperationTimeout,
        io::ErrorKind::UnexpectedEof => Error::TransportError {
            description: "stream ended mid transfer".to_owned(),
        },
        _ => Error::IoError(err),
    }
}
