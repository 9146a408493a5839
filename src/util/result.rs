//! Standard error and result types for the library.
use hex::FromHexError;
use secp256k1::Error as Secp256k1Error;
use std::io;

/// Standard error type used in the library
#[derive(Debug)]
pub enum Error {
    /// An argument provided is invalid
    BadArgument(String),
    /// The data given is not valid
    BadData(String),
    /// Fixed-width hash material had the wrong length
    EncodingLength {
        /// Length the encoding must have
        expected: usize,
        /// Length that was produced
        actual: usize,
    },
    /// Hex string could not be decoded
    FromHexError(FromHexError),
    /// A signature was not exactly 65 bytes
    InvalidSignatureLength(usize),
    /// The operation is not valid on this object
    InvalidOperation(String),
    /// Standard library IO error
    IOError(io::Error),
    /// Sponsor signing was attempted before the origin threshold was met
    NotReady,
    /// The origin tried to sign after sponsor signing started
    Overlap,
    /// The spending condition already holds all required signatures
    Oversign,
    /// Error in the Secp256k1 library
    Secp256k1Error(Secp256k1Error),
    /// The address hash mode byte is not defined
    UnknownAddressHashMode(u8),
    /// The authorization type byte is not defined
    UnknownAuthType(u8),
    /// The layout is recognized but not supported by this library
    Unimplemented(String),
    /// A signature chain failed to verify
    VerifyingError(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::BadArgument(s) => write!(f, "Bad argument: {}", s),
            Error::BadData(s) => write!(f, "Bad data: {}", s),
            Error::EncodingLength { expected, actual } => {
                write!(f, "Encoding length: expected {} bytes, got {}", expected, actual)
            }
            Error::FromHexError(e) => write!(f, "Hex decoding error: {}", e),
            Error::InvalidSignatureLength(n) => write!(f, "Invalid signature length: {}", n),
            Error::InvalidOperation(s) => write!(f, "Invalid operation: {}", s),
            Error::IOError(e) => write!(f, "IO error: {}", e),
            Error::NotReady => write!(f, "Origin must be fully signed before the sponsor signs"),
            Error::Overlap => write!(f, "Origin cannot sign after sponsor signing has started"),
            Error::Oversign => write!(f, "Spending condition already has all required signatures"),
            Error::Secp256k1Error(e) => write!(f, "Secp256k1 error: {}", e),
            Error::UnknownAddressHashMode(b) => write!(f, "Unknown address hash mode: {:#04x}", b),
            Error::UnknownAuthType(b) => write!(f, "Unknown authorization type: {:#04x}", b),
            Error::Unimplemented(s) => write!(f, "Unimplemented: {}", s),
            Error::VerifyingError(s) => write!(f, "Verification failed: {}", s),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FromHexError(e) => Some(e),
            Error::IOError(e) => Some(e),
            Error::Secp256k1Error(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FromHexError> for Error {
    fn from(e: FromHexError) -> Self {
        Error::FromHexError(e)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::IOError(e)
    }
}

impl From<Secp256k1Error> for Error {
    fn from(e: Secp256k1Error) -> Self {
        Error::Secp256k1Error(e)
    }
}

/// Standard Result used in the library
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_guard_errors() {
        assert_eq!(
            Error::Overlap.to_string(),
            "Origin cannot sign after sponsor signing has started"
        );
        assert_eq!(
            Error::UnknownAddressHashMode(0x09).to_string(),
            "Unknown address hash mode: 0x09"
        );
        assert_eq!(
            Error::EncodingLength { expected: 49, actual: 48 }.to_string(),
            "Encoding length: expected 49 bytes, got 48"
        );
    }

    #[test]
    fn io_error_has_source() {
        let e: Error = io::Error::new(io::ErrorKind::UnexpectedEof, "short").into();
        assert!(std::error::Error::source(&e).is_some());
        assert!(std::error::Error::source(&Error::NotReady).is_none());
    }
}
