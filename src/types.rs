//! Core types for trezor-cipher.
//!
//! This module defines the prompts the call engine can raise, the policy
//! applied when passphrase collection fails, and the terminal outcome of a
//! cipher run.

use clap::ValueEnum;

/// Exit status for a host-side fatal error.
pub const EXIT_HOST_ERROR: u8 = 255;

/// Exit status for a command-line usage error (`EINVAL`).
pub const EXIT_USAGE: u8 = 22;

/// Secret the host is asked to collect on behalf of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    /// PIN matrix entry
    Pin,
    /// Host-side passphrase entry
    Passphrase,
}

impl Prompt {
    /// The literal prompt argument handed to the askpass helper.
    pub fn as_str(self) -> &'static str {
        match self {
            Prompt::Pin => "PIN:",
            Prompt::Passphrase => "Passphrase:",
        }
    }
}

impl std::fmt::Display for Prompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do when the passphrase helper fails.
///
/// PIN collection failures are always fatal; passphrase failures are
/// configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PassphrasePolicy {
    /// Abort the whole operation
    #[default]
    Fatal,
    /// Send an empty passphrase and carry on
    Empty,
}

/// Terminal state of a cipher run that did not hit a host-side error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The ciphered value was written to the output stream
    Success,
    /// No device was enumerated
    NoDevice,
    /// The device is in bootloader mode and cannot run the cipher operation
    Bootloader,
    /// Neither an explicit value nor the environment fallback was provided
    NoValue,
    /// The device refused the operation with this message
    DeviceFailure(String),
    /// The device answered the cipher call with an unexpected message
    Unrecognized,
}

impl Outcome {
    /// Process exit status for this outcome.
    pub fn exit_code(&self) -> u8 {
        match self {
            Outcome::Success => 0,
            Outcome::NoDevice | Outcome::Bootloader | Outcome::NoValue => 1,
            Outcome::DeviceFailure(_) => 2,
            Outcome::Unrecognized => 254,
        }
    }

    /// `true` if the run produced a ciphered value.
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}
