//! Shared test doubles: a scripted device transport and a recording prompter.

#![allow(dead_code)]

use std::collections::VecDeque;

use secrecy::SecretString;
use trezor_cipher::device::messages::*;
use trezor_cipher::{DeviceDescriptor, Error, Prompt, Prompter, Reply, Request, Result, Session, Transport};

// ==================== Transport ====================

/// Transport that answers calls from a fixed script and records everything.
#[derive(Default)]
pub struct ScriptedTransport {
    pub devices: Vec<DeviceDescriptor>,
    pub replies: VecDeque<Result<Reply>>,
    pub sent: Vec<Request>,
    pub acquired: Vec<(String, bool)>,
    pub released: Vec<String>,
    pub fail_release: bool,
    pub fail_acquire: bool,
}

impl ScriptedTransport {
    /// One idle device and the given replies, in order.
    pub fn with_replies(replies: Vec<Reply>) -> Self {
        Self {
            devices: vec![DeviceDescriptor::new("1")],
            replies: replies.into_iter().map(Ok).collect(),
            ..Self::default()
        }
    }

    pub fn sent_names(&self) -> Vec<&'static str> {
        self.sent.iter().map(Request::name).collect()
    }

    pub fn cipher_requests(&self) -> Vec<&CipherKeyValue> {
        self.sent
            .iter()
            .filter_map(|r| match r {
                Request::CipherKeyValue(c) => Some(c),
                _ => None,
            })
            .collect()
    }
}

impl Transport for ScriptedTransport {
    fn enumerate(&mut self) -> Result<Vec<DeviceDescriptor>> {
        Ok(self.devices.clone())
    }

    fn acquire(&mut self, device: &DeviceDescriptor, debug_link: bool) -> Result<Session> {
        if self.fail_acquire {
            return Err(Error::Transport("device busy".into()));
        }
        self.acquired.push((device.path.clone(), debug_link));
        Ok(Session::new(format!("s{}", self.acquired.len()), debug_link))
    }

    fn release(&mut self, session: Session) -> Result<()> {
        self.released.push(session.id().to_string());
        if self.fail_release {
            return Err(Error::Transport("release refused".into()));
        }
        Ok(())
    }

    fn call(&mut self, _session: &Session, request: &Request) -> Result<Reply> {
        self.sent.push(request.clone());
        self.replies
            .pop_front()
            .unwrap_or_else(|| Err(Error::Transport("script exhausted".into())))
    }
}

/// A toy device: "ciphers" by XOR with a keystream derived from the key
/// name, so encrypt followed by decrypt is the identity.
pub struct XorDevice {
    pub pending: VecDeque<Reply>,
    pub calls: usize,
    pub releases: usize,
}

impl XorDevice {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            calls: 0,
            releases: 0,
        }
    }

    fn keystream(key: &str, len: usize) -> Vec<u8> {
        let seed: u8 = key.bytes().fold(0x5a, |acc, b| acc.rotate_left(3) ^ b);
        (0..len).map(|i| seed.wrapping_add((i as u8).wrapping_mul(31))).collect()
    }
}

impl Transport for XorDevice {
    fn enumerate(&mut self) -> Result<Vec<DeviceDescriptor>> {
        Ok(vec![DeviceDescriptor::new("xor")])
    }

    fn acquire(&mut self, _device: &DeviceDescriptor, debug_link: bool) -> Result<Session> {
        Ok(Session::new("xor-session", debug_link))
    }

    fn release(&mut self, _session: Session) -> Result<()> {
        self.releases += 1;
        Ok(())
    }

    fn call(&mut self, _session: &Session, request: &Request) -> Result<Reply> {
        self.calls += 1;
        if let Some(reply) = self.pending.pop_front() {
            return Ok(reply);
        }
        match request {
            Request::Initialize(_) => Ok(Reply::Features(features("XOR", "toy", false))),
            Request::CipherKeyValue(c) => {
                if c.value.len() % 16 != 0 {
                    return Ok(Reply::Failure(Failure {
                        code: Some(3),
                        message: Some("Value length must be a multiple of 16".into()),
                    }));
                }
                let stream = Self::keystream(&c.key, c.value.len());
                let value = c.value.iter().zip(stream).map(|(v, k)| v ^ k).collect();
                Ok(Reply::CipheredKeyValue(CipheredKeyValue { value }))
            }
            _ => Ok(Reply::Failure(Failure {
                code: Some(1),
                message: Some("Unexpected message".into()),
            })),
        }
    }
}

// ==================== Prompter ====================

/// Prompter that hands out canned answers and records prompts and notices.
#[derive(Default)]
pub struct RecordingPrompter {
    pub answers: VecDeque<Result<String>>,
    pub prompts: Vec<Prompt>,
    pub notices: Vec<String>,
}

impl RecordingPrompter {
    pub fn answering(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| Ok(a.to_string())).collect(),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        let mut prompter = Self::default();
        prompter.answers.push_back(Err(Error::Askpass {
            prompt: "test",
            reason: "helper exited with 1".into(),
        }));
        prompter
    }
}

impl Prompter for RecordingPrompter {
    fn ask(&mut self, prompt: Prompt) -> Result<SecretString> {
        self.prompts.push(prompt);
        let answer = self.answers.pop_front().unwrap_or_else(|| {
            Err(Error::Askpass {
                prompt: prompt.as_str(),
                reason: "no canned answer".into(),
            })
        })?;
        Ok(SecretString::new(answer))
    }

    fn notice(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}

// ==================== Reply builders ====================

pub fn features(device_id: &str, label: &str, bootloader: bool) -> Features {
    Features {
        device_id: Some(device_id.into()),
        label: Some(label.into()),
        bootloader_mode: Some(bootloader),
        ..Features::default()
    }
}

pub fn button() -> Reply {
    Reply::ButtonRequest(ButtonRequest { code: Some(1) })
}

pub fn pin_request() -> Reply {
    Reply::PinMatrixRequest(PinMatrixRequest { kind: Some(1) })
}

pub fn passphrase_request(on_device: Option<bool>) -> Reply {
    Reply::PassphraseRequest(PassphraseRequest { on_device })
}

pub fn passphrase_state_request() -> Reply {
    Reply::PassphraseStateRequest(PassphraseStateRequest { state: Some(vec![1, 2, 3]) })
}

pub fn failure(message: &str) -> Reply {
    Reply::Failure(Failure {
        code: Some(7),
        message: Some(message.into()),
    })
}

pub fn ciphered(value: &[u8]) -> Reply {
    Reply::CipheredKeyValue(CipheredKeyValue { value: value.to_vec() })
}
