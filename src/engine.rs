//! The interactive call engine.
//!
//! A single logical device operation may be interrupted any number of
//! times by the device asking for a button press, a PIN, a passphrase or
//! a passphrase-state acknowledgment. [`CallEngine::call`] answers those
//! requests itself and only hands back a terminal reply.

use secrecy::ExposeSecret;
use tracing::{debug, info, warn};

use crate::askpass::Prompter;
use crate::device::messages::{ButtonAck, PassphraseAck, PassphraseStateAck, PinMatrixAck};
use crate::device::{Reply, Request, Session, Transport};
use crate::error::Result;
use crate::types::{PassphrasePolicy, Prompt};

/// Notice shown when the device collects the passphrase itself.
pub const ON_DEVICE_PASSPHRASE_NOTICE: &str = "Passphrase requested on device";

enum Step {
    Pending(Request),
    Done(Reply),
}

/// Drives one request to a terminal reply over an acquired session.
pub struct CallEngine<'a, T: ?Sized, P: ?Sized> {
    transport: &'a mut T,
    prompter: &'a mut P,
    passphrase_policy: PassphrasePolicy,
}

impl<'a, T, P> CallEngine<'a, T, P>
where
    T: Transport + ?Sized,
    P: Prompter + ?Sized,
{
    /// Create an engine with the default (fatal) passphrase policy.
    pub fn new(transport: &'a mut T, prompter: &'a mut P) -> Self {
        Self {
            transport,
            prompter,
            passphrase_policy: PassphrasePolicy::default(),
        }
    }

    /// Choose how a failing passphrase helper is handled.
    pub fn with_passphrase_policy(mut self, policy: PassphrasePolicy) -> Self {
        self.passphrase_policy = policy;
        self
    }

    /// Send `request` and keep answering confirmation requests until the
    /// device sends a terminal reply.
    ///
    /// # Arguments
    /// * `session` - The acquired session; its channel is used for every call
    /// * `request` - The operation to run
    ///
    /// # Returns
    /// The first reply that is not a confirmation request, unchanged.
    ///
    /// # Errors
    /// * Any transport error, immediately and without retry
    /// * [`crate::Error::Askpass`] - If PIN collection fails, or passphrase
    ///   collection fails under [`PassphrasePolicy::Fatal`]
    pub fn call(&mut self, session: &Session, request: Request) -> Result<Reply> {
        let mut step = Step::Pending(request);
        loop {
            match step {
                Step::Pending(request) => {
                    debug!(request = request.name(), "sending");
                    let reply = self.transport.call(session, &request)?;
                    debug!(reply = reply.name(), "received");
                    step = self.answer(reply)?;
                }
                Step::Done(reply) => {
                    debug_assert!(!reply.is_confirmation());
                    return Ok(reply);
                }
            }
        }
    }

    fn answer(&mut self, reply: Reply) -> Result<Step> {
        let ack = match reply {
            Reply::ButtonRequest(request) => {
                info!(code = ?request.code, "waiting for button confirmation on device");
                Request::ButtonAck(ButtonAck {})
            }
            Reply::PinMatrixRequest(_) => {
                let pin = self.prompter.ask(Prompt::Pin)?;
                Request::PinMatrixAck(PinMatrixAck {
                    pin: pin.expose_secret().clone(),
                })
            }
            Reply::PassphraseRequest(request) if request.on_device == Some(true) => {
                self.prompter.notice(ON_DEVICE_PASSPHRASE_NOTICE);
                Request::PassphraseAck(PassphraseAck { passphrase: None })
            }
            Reply::PassphraseRequest(_) => {
                let passphrase = self.collect_passphrase()?;
                Request::PassphraseAck(PassphraseAck {
                    passphrase: Some(passphrase),
                })
            }
            Reply::PassphraseStateRequest(_) => Request::PassphraseStateAck(PassphraseStateAck {}),
            reply @ (Reply::Features(_)
            | Reply::CipheredKeyValue(_)
            | Reply::Failure(_)
            | Reply::Unrecognized { .. }) => return Ok(Step::Done(reply)),
        };
        Ok(Step::Pending(ack))
    }

    fn collect_passphrase(&mut self) -> Result<String> {
        match self.prompter.ask(Prompt::Passphrase) {
            Ok(secret) => Ok(secret.expose_secret().clone()),
            Err(err) => match self.passphrase_policy {
                PassphrasePolicy::Fatal => Err(err),
                PassphrasePolicy::Empty => {
                    warn!(error = %err, "passphrase helper failed, sending empty passphrase");
                    Ok(String::new())
                }
            },
        }
    }
}
