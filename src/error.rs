//! Error types for the trezor-cipher library.
//!
//! Device-side refusals (`Failure` replies) are not errors: they are
//! reported through [`crate::Outcome`]. Everything here is a host-side
//! fault that aborts the run.

use thiserror::Error;

/// The main error type for trezor-cipher operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The bridge answered with an error document
    #[error("Bridge error: {0}")]
    Bridge(String),

    /// HTTP exchange with the bridge failed
    #[error("HTTP error: {0}")]
    Http(#[from] Box<ureq::Error>),

    /// Transport-level failure not tied to HTTP (stub transports, closed sessions)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Malformed frame or message received from the device
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Protobuf payload could not be decoded
    #[error("Message decoding failed: {0}")]
    Decode(#[from] prost::DecodeError),

    /// JSON document from the bridge could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The PIN or passphrase helper failed
    #[error("Askpass failed for prompt {prompt:?}: {reason}")]
    Askpass {
        /// Prompt the helper was invoked with
        prompt: &'static str,
        /// What went wrong
        reason: String,
    },

    /// Hex input could not be decoded
    #[error("Invalid hex input: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// BIP-32 derivation path could not be parsed
    #[error("Invalid derivation path: {0}")]
    InvalidPath(String),

    /// File or stream I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for trezor-cipher operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        Error::Http(Box::new(err))
    }
}
