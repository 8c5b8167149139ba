use std::error::Error;
use std::fmt;
use std::io;

/// Main error type for the SPIHT codec library.
#[derive(Debug)]
pub enum SpihtError {
    /// An I/O error occurred
    Io(io::Error),
    /// An invalid argument was provided
    InvalidArg(String),
    /// A container stream was malformed
    Stream(String),
    /// An encoding/decoding error occurred
    EncodingError(String),
}

impl fmt::Display for SpihtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpihtError::Io(err) => write!(f, "I/O error: {}", err),
            SpihtError::InvalidArg(msg) => write!(f, "Invalid argument: {}", msg),
            SpihtError::Stream(msg) => write!(f, "Stream error: {}", msg),
            SpihtError::EncodingError(msg) => write!(f, "Encoding error: {}", msg),
        }
    }
}

impl Error for SpihtError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SpihtError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for SpihtError {
    fn from(err: io::Error) -> Self {
        SpihtError::Io(err)
    }
}

impl From<crate::codec::spiht::CodecError> for SpihtError {
    fn from(err: crate::codec::spiht::CodecError) -> Self {
        SpihtError::EncodingError(err.to_string())
    }
}

/// A specialized `Result` type for SPIHT codec operations.
pub type Result<T> = std::result::Result<T, SpihtError>;
