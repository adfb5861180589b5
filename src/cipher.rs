//! The cipher operation.
//!
//! [`CipherOperation`] runs one complete encrypt or decrypt against the
//! first attached device: discover, acquire, initialize, cipher, release.

use std::io::Write;

use tracing::{debug, info, warn};

use crate::askpass::Prompter;
use crate::config::{CipherConfig, VALUE_ENV};
use crate::device::messages::{CipherKeyValue, Initialize};
use crate::device::{Reply, Request, Session, Transport};
use crate::engine::CallEngine;
use crate::error::Result;
use crate::types::Outcome;

/// Cipher block size the device requires payloads to be aligned to.
pub const BLOCK_SIZE: usize = 16;

/// Zero-pad `value` on the right to the next multiple of [`BLOCK_SIZE`].
///
/// Aligned input (including empty input) is returned unchanged. The
/// original length is not recorded anywhere, so trailing zero bytes that
/// belong to the payload cannot be told apart from padding after a round
/// trip.
///
/// # Example
///
/// ```
/// use trezor_cipher::pad_payload;
///
/// let padded = pad_payload(b"TEST VALUE");
/// assert_eq!(padded.len(), 16);
/// assert_eq!(&padded[..10], b"TEST VALUE");
/// assert!(padded[10..].iter().all(|b| *b == 0));
/// ```
pub fn pad_payload(value: &[u8]) -> Vec<u8> {
    let padded_len = value.len().div_ceil(BLOCK_SIZE) * BLOCK_SIZE;
    let mut padded = Vec::with_capacity(padded_len);
    padded.extend_from_slice(value);
    padded.resize(padded_len, 0);
    padded
}

/// One encrypt or decrypt run against the first attached device.
pub struct CipherOperation<T, P> {
    transport: T,
    prompter: P,
    config: CipherConfig,
}

impl<T: Transport, P: Prompter> CipherOperation<T, P> {
    /// Prepare a run; nothing touches the device until [`Self::run`].
    pub fn new(transport: T, prompter: P, config: CipherConfig) -> Self {
        Self {
            transport,
            prompter,
            config,
        }
    }

    /// Run the operation.
    ///
    /// The ciphered value (and nothing else) is written to `out`; every
    /// human-readable message goes to `diag`.
    ///
    /// Once a session is acquired it is released exactly once, whatever
    /// happens afterwards. If both the operation and the release fail, the
    /// operation's error is returned.
    ///
    /// # Returns
    /// The [`Outcome`] for every path that did not hit a host-side error.
    ///
    /// # Errors
    /// Transport, askpass and input errors, and a failed release.
    pub fn run<O, D>(&mut self, out: &mut O, diag: &mut D) -> Result<Outcome>
    where
        O: Write + ?Sized,
        D: Write + ?Sized,
    {
        let devices = self.transport.enumerate()?;
        let Some(device) = devices.into_iter().next() else {
            writeln!(diag, "No TREZOR device(s) found")?;
            return Ok(Outcome::NoDevice);
        };

        info!(path = %device.path, debug_link = self.config.debug_link, "acquiring device");
        let session = self.transport.acquire(&device, self.config.debug_link)?;

        let result = self.run_in_session(&session, out, diag);
        let released = self.transport.release(session);

        match (result, released) {
            (Ok(outcome), Ok(())) => Ok(outcome),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(release_err)) => {
                warn!(error = %release_err, "release failed after an earlier error");
                Err(err)
            }
        }
    }

    fn run_in_session<O, D>(&mut self, session: &Session, out: &mut O, diag: &mut D) -> Result<Outcome>
    where
        O: Write + ?Sized,
        D: Write + ?Sized,
    {
        let mut engine = CallEngine::new(&mut self.transport, &mut self.prompter)
            .with_passphrase_policy(self.config.passphrase_policy);

        match engine.call(session, Request::Initialize(Initialize::default()))? {
            Reply::Features(features) => {
                writeln!(
                    diag,
                    "Device ID: {} ({})",
                    features.device_id.as_deref().unwrap_or(""),
                    features.label.as_deref().unwrap_or("")
                )?;
                if features.is_bootloader() {
                    writeln!(diag, "Device is in bootloader mode")?;
                    return Ok(Outcome::Bootloader);
                }
            }
            other => {
                debug!(reply = other.name(), "unexpected reply to Initialize");
                writeln!(diag, "Unknown type.")?;
            }
        }

        let Some(value) = self.config.resolve_value()? else {
            writeln!(diag, "No value given: pass -v or set {}", VALUE_ENV)?;
            return Ok(Outcome::NoValue);
        };
        let payload = if self.config.hex_input {
            hex::decode(value.trim())?
        } else {
            value.into_bytes()
        };
        let padded = pad_payload(&payload);
        debug!(len = payload.len(), padded = padded.len(), "payload ready");

        let request = Request::CipherKeyValue(CipherKeyValue {
            address_n: self.config.address_n.clone(),
            key: self.config.key.clone(),
            value: padded,
            encrypt: Some(self.config.encrypt),
            ask_on_encrypt: Some(true),
            ask_on_decrypt: Some(true),
            iv: None,
        });

        match engine.call(session, request)? {
            Reply::CipheredKeyValue(ciphered) => {
                let bytes = if self.config.hex_output {
                    hex::encode(&ciphered.value).into_bytes()
                } else {
                    ciphered.value
                };
                out.write_all(&bytes)?;
                out.flush()?;
                Ok(Outcome::Success)
            }
            Reply::Failure(failure) => {
                writeln!(diag, "Failure: {}", failure.text())?;
                Ok(Outcome::DeviceFailure(failure.text().to_string()))
            }
            other => {
                debug!(reply = other.name(), "unexpected reply to CipherKeyValue");
                writeln!(diag, "Unknown type.")?;
                Ok(Outcome::Unrecognized)
            }
        }
    }
}
