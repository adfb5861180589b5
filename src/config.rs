//! Run configuration.
//!
//! [`CipherConfig`] gathers everything a cipher run needs, from the command
//! line and the environment. The payload itself is resolved lazily, after
//! the device has been initialized.

use std::io::Read;

use crate::askpass::DEFAULT_ASKPASS;
use crate::device::DEFAULT_BRIDGE_URL;
use crate::error::{Error, Result};
use crate::types::PassphrasePolicy;

/// Environment fallback for the payload.
pub const VALUE_ENV: &str = "TREZOR_CIPHER_VALUE";

/// Environment override for the askpass helper.
pub const ASKPASS_ENV: &str = "TREZOR_ASKPASS";

/// Environment override for the bridge endpoint.
pub const BRIDGE_URL_ENV: &str = "TREZOR_BRIDGE_URL";

/// Device key name used when none is given.
pub const DEFAULT_KEY: &str = "default key";

/// Value argument that means "read the payload from standard input".
pub const STDIN_VALUE: &str = "-";

const HARDENED: u32 = 0x8000_0000;

/// Resolved configuration for one cipher run.
#[derive(Debug, Clone)]
pub struct CipherConfig {
    /// Device key name the value is ciphered under
    pub key: String,
    /// Explicit payload (`-v`)
    pub value: Option<String>,
    /// Payload fallback read from [`VALUE_ENV`]
    pub env_value: Option<String>,
    /// Encrypt instead of decrypt
    pub encrypt: bool,
    /// Payload is hex text
    pub hex_input: bool,
    /// Write the result as hex text
    pub hex_output: bool,
    /// BIP-32 path sent as `address_n`
    pub address_n: Vec<u32>,
    /// Use the debug link channel
    pub debug_link: bool,
    /// Askpass helper program
    pub askpass_program: String,
    /// Handling of passphrase helper failures
    pub passphrase_policy: PassphrasePolicy,
    /// Trezor Bridge endpoint
    pub bridge_url: String,
}

impl Default for CipherConfig {
    fn default() -> Self {
        Self {
            key: DEFAULT_KEY.to_string(),
            value: None,
            env_value: None,
            encrypt: false,
            hex_input: false,
            hex_output: false,
            address_n: Vec::new(),
            debug_link: false,
            askpass_program: DEFAULT_ASKPASS.to_string(),
            passphrase_policy: PassphrasePolicy::default(),
            bridge_url: DEFAULT_BRIDGE_URL.to_string(),
        }
    }
}

impl CipherConfig {
    /// Pick up the environment fallbacks: payload, askpass helper and
    /// bridge URL. Empty variables count as unset.
    pub fn with_environment(mut self) -> Self {
        self.env_value = non_empty_env(VALUE_ENV);
        if let Some(program) = non_empty_env(ASKPASS_ENV) {
            self.askpass_program = program;
        }
        if let Some(url) = non_empty_env(BRIDGE_URL_ENV) {
            self.bridge_url = url;
        }
        self
    }

    /// Resolve the payload text, reading stdin when asked to.
    ///
    /// # Returns
    /// `None` if neither the explicit value nor the fallback has content.
    pub fn resolve_value(&self) -> Result<Option<String>> {
        resolve_value_from(
            self.value.as_deref(),
            self.env_value.as_deref(),
            std::io::stdin().lock(),
        )
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Pick the payload: explicit value first, then the fallback.
///
/// An explicit [`STDIN_VALUE`] reads `stdin` to the end and drops one
/// trailing line break.
pub fn resolve_value_from<R: Read>(
    explicit: Option<&str>,
    fallback: Option<&str>,
    mut stdin: R,
) -> Result<Option<String>> {
    let chosen = match explicit.filter(|v| !v.is_empty()) {
        Some(STDIN_VALUE) => {
            let mut text = String::new();
            stdin.read_to_string(&mut text)?;
            if text.ends_with('\n') {
                text.pop();
                if text.ends_with('\r') {
                    text.pop();
                }
            }
            Some(text)
        }
        Some(value) => Some(value.to_string()),
        None => fallback.map(str::to_string),
    };
    Ok(chosen.filter(|v| !v.is_empty()))
}

/// Parse a BIP-32 path such as `m/10016'/0`.
///
/// Hardened components may be marked with `'`, `h` or `H`. A bare `m` (or
/// an empty string) is the root and yields no components.
///
/// # Errors
/// * [`Error::InvalidPath`] - If a component is not a number below 2^31
pub fn parse_derivation_path(path: &str) -> Result<Vec<u32>> {
    let trimmed = path.trim();
    let rest = match trimmed.strip_prefix('m') {
        Some(rest) => rest,
        None => trimmed,
    };
    let rest = rest.strip_prefix('/').unwrap_or(rest);
    if rest.is_empty() {
        return Ok(Vec::new());
    }

    rest.split('/')
        .map(|component| {
            let (digits, hardened) = match component.strip_suffix(&['\'', 'h', 'H'][..]) {
                Some(digits) => (digits, true),
                None => (component, false),
            };
            let index: u32 = digits
                .parse()
                .map_err(|_| Error::InvalidPath(format!("bad component {:?} in {:?}", component, path)))?;
            if index >= HARDENED {
                return Err(Error::InvalidPath(format!(
                    "component {} in {:?} is out of range",
                    index, path
                )));
            }
            Ok(if hardened { index | HARDENED } else { index })
        })
        .collect()
}
