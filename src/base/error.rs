use std::error;
use std::fmt;
use std::io;

/// Represents errors that can occur during Sweep operations.
#[derive(Debug)]
pub enum Error {
    /// The serial link could not be opened or stopped delivering bytes mid transfer. Contains a description of the failure.
    TransportError { description: String },

    /// The execution of operation is timed out.
    OperationTimeout,

    /// The received data is invalid according to the device protocol. Contains a description of the protocol error.
    ProtocolError { description: String },

    /// An argument is outside the range the device accepts. Contains a description of the rejected value.
    ArgumentError { description: String },

    /// The operation is not valid in the session's current scanning state. Contains a description of the misuse.
    StateError { description: String },

    /// An I/O error occurred while communicating with the underlying stream (e.g., serial port).
    IoError(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TransportError { description } => write!(f, "transport error: {}", description),
            Error::OperationTimeout => write!(f, "operation timeout"),
            Error::ProtocolError { description } => write!(f, "protocol error: {}", description),
            Error::ArgumentError { description } => write!(f, "argument error: {}", description),
            Error::StateError { description } => write!(f, "state error: {}", description),
            Error::IoError(err) => write!(f, "io error: {}", err),
        }
    }
}

impl error::Error for Error {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<serialport::Error> for Error {
    fn from(err: serialport::Error) -> Self {
        Error::TransportError {
            description: err.to_string(),
        }
    }
}

/// A specialized `Result` type for Sweep operations.
pub type Result<T> = std::result::Result<T, Error>;
