//! Host-side collection of PINs and passphrases.
//!
//! The call engine never reads the terminal itself. It asks a [`Prompter`],
//! which by default runs an external askpass helper.

use std::ffi::OsString;
use std::io::{self, Write};
use std::process::{Command, Stdio};

use secrecy::SecretString;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::types::Prompt;

/// Default askpass helper, looked up on `PATH`.
pub const DEFAULT_ASKPASS: &str = "trezor-askpass";

/// Source of secrets and sink for operator notices.
pub trait Prompter {
    /// Collect the secret for `prompt`.
    fn ask(&mut self, prompt: Prompt) -> Result<SecretString>;

    /// Tell the operator something that needs no answer.
    fn notice(&mut self, message: &str);
}

impl<P: Prompter + ?Sized> Prompter for &mut P {
    fn ask(&mut self, prompt: Prompt) -> Result<SecretString> {
        (**self).ask(prompt)
    }

    fn notice(&mut self, message: &str) {
        (**self).notice(message)
    }
}

/// [`Prompter`] that runs an askpass program once per prompt.
///
/// The program gets the literal prompt (`PIN:` or `Passphrase:`) as its only
/// argument, inherits stdin and stderr, and prints the secret on stdout.
/// Trailing whitespace is stripped from the answer.
///
/// Notices are written as lines to `W`, standard error unless replaced with
/// [`AskpassCommand::with_notices`].
#[derive(Debug)]
pub struct AskpassCommand<W = io::Stderr> {
    program: OsString,
    notices: W,
}

impl AskpassCommand {
    /// Use `program` as the askpass helper.
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            notices: io::stderr(),
        }
    }
}

impl Default for AskpassCommand {
    fn default() -> Self {
        Self::new(DEFAULT_ASKPASS)
    }
}

impl<W: Write> AskpassCommand<W> {
    /// Send notices to `sink` instead.
    pub fn with_notices<S: Write>(self, sink: S) -> AskpassCommand<S> {
        AskpassCommand {
            program: self.program,
            notices: sink,
        }
    }

    /// Hand back the notice sink.
    pub fn into_notices(self) -> W {
        self.notices
    }
}

impl<W: Write> Prompter for AskpassCommand<W> {
    fn ask(&mut self, prompt: Prompt) -> Result<SecretString> {
        debug!(program = ?self.program, %prompt, "running askpass helper");
        let output = Command::new(&self.program)
            .arg(prompt.as_str())
            .stdin(Stdio::inherit())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|e| Error::Askpass {
                prompt: prompt.as_str(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(Error::Askpass {
                prompt: prompt.as_str(),
                reason: format!("helper exited with {}", output.status),
            });
        }

        secret_from_output(prompt, output.stdout)
    }

    fn notice(&mut self, message: &str) {
        if let Err(err) = writeln!(self.notices, "{}", message) {
            warn!(error = %err, "could not write notice");
        }
    }
}

/// Turn captured helper output into a secret.
fn secret_from_output(prompt: Prompt, stdout: Vec<u8>) -> Result<SecretString> {
    let mut text = String::from_utf8(stdout).map_err(|_| Error::Askpass {
        prompt: prompt.as_str(),
        reason: "helper output is not valid UTF-8".to_string(),
    })?;
    let trimmed = text.trim_end().len();
    text.truncate(trimmed);
    Ok(SecretString::new(text))
}
