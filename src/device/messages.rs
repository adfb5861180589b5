//! Protocol messages exchanged with the device.
//!
//! Bodies are proto2 messages from the Trezor protocol, trimmed to the
//! fields this client reads or writes. Unknown fields on incoming messages
//! are skipped by the decoder.

use prost::Message;

// ==================== Requests ====================

/// Start (or resume) a session on the device.
#[derive(Clone, PartialEq, Message)]
pub struct Initialize {
    #[prost(bytes = "vec", optional, tag = "1")]
    pub session_id: Option<Vec<u8>>,
}

/// Encrypt or decrypt `value` under the device key named `key`.
#[derive(Clone, PartialEq, Message)]
pub struct CipherKeyValue {
    #[prost(uint32, repeated, packed = "false", tag = "1")]
    pub address_n: Vec<u32>,
    #[prost(string, required, tag = "2")]
    pub key: String,
    #[prost(bytes = "vec", required, tag = "3")]
    pub value: Vec<u8>,
    #[prost(bool, optional, tag = "4")]
    pub encrypt: Option<bool>,
    #[prost(bool, optional, tag = "5")]
    pub ask_on_encrypt: Option<bool>,
    #[prost(bool, optional, tag = "6")]
    pub ask_on_decrypt: Option<bool>,
    #[prost(bytes = "vec", optional, tag = "7")]
    pub iv: Option<Vec<u8>>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ButtonAck {}

/// PIN as typed by the user against the scrambled matrix on the device.
#[derive(Clone, PartialEq, Message)]
#[prost(skip_debug)]
pub struct PinMatrixAck {
    #[prost(string, required, tag = "1")]
    pub pin: String,
}

/// Passphrase answer; `None` lets the device collect it.
#[derive(Clone, PartialEq, Message)]
#[prost(skip_debug)]
pub struct PassphraseAck {
    #[prost(string, optional, tag = "1")]
    pub passphrase: Option<String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct PassphraseStateAck {}

impl std::fmt::Debug for PinMatrixAck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinMatrixAck").field("pin", &"<redacted>").finish()
    }
}

impl std::fmt::Debug for PassphraseAck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let passphrase = self.passphrase.as_ref().map(|_| "<redacted>");
        f.debug_struct("PassphraseAck").field("passphrase", &passphrase).finish()
    }
}

// ==================== Replies ====================

#[derive(Clone, PartialEq, Message)]
pub struct ButtonRequest {
    #[prost(int32, optional, tag = "1")]
    pub code: Option<i32>,
}

#[derive(Clone, PartialEq, Message)]
pub struct PinMatrixRequest {
    #[prost(int32, optional, tag = "1")]
    pub kind: Option<i32>,
}

#[derive(Clone, PartialEq, Message)]
pub struct PassphraseRequest {
    #[prost(bool, optional, tag = "1")]
    pub on_device: Option<bool>,
}

#[derive(Clone, PartialEq, Message)]
pub struct PassphraseStateRequest {
    #[prost(bytes = "vec", optional, tag = "1")]
    pub state: Option<Vec<u8>>,
}

/// Device identity and state, the answer to [`Initialize`].
#[derive(Clone, PartialEq, Message)]
pub struct Features {
    #[prost(string, optional, tag = "1")]
    pub vendor: Option<String>,
    #[prost(uint32, optional, tag = "2")]
    pub major_version: Option<u32>,
    #[prost(uint32, optional, tag = "3")]
    pub minor_version: Option<u32>,
    #[prost(uint32, optional, tag = "4")]
    pub patch_version: Option<u32>,
    #[prost(bool, optional, tag = "5")]
    pub bootloader_mode: Option<bool>,
    #[prost(string, optional, tag = "6")]
    pub device_id: Option<String>,
    #[prost(bool, optional, tag = "7")]
    pub pin_protection: Option<bool>,
    #[prost(bool, optional, tag = "8")]
    pub passphrase_protection: Option<bool>,
    #[prost(string, optional, tag = "10")]
    pub label: Option<String>,
    #[prost(bool, optional, tag = "12")]
    pub initialized: Option<bool>,
}

#[derive(Clone, PartialEq, Message)]
pub struct CipheredKeyValue {
    #[prost(bytes = "vec", required, tag = "1")]
    pub value: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Failure {
    #[prost(int32, optional, tag = "1")]
    pub code: Option<i32>,
    #[prost(string, optional, tag = "2")]
    pub message: Option<String>,
}

impl Features {
    /// `true` if the device booted into its bootloader.
    pub fn is_bootloader(&self) -> bool {
        self.bootloader_mode.unwrap_or(false)
    }
}

impl Failure {
    /// Device-supplied message, empty if the device sent none.
    pub fn text(&self) -> &str {
        self.message.as_deref().unwrap_or("")
    }
}

// ==================== Tagged unions ====================

/// A message the host sends to the device.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Initialize(Initialize),
    CipherKeyValue(CipherKeyValue),
    ButtonAck(ButtonAck),
    PinMatrixAck(PinMatrixAck),
    PassphraseAck(PassphraseAck),
    PassphraseStateAck(PassphraseStateAck),
}

impl Request {
    /// Message name, safe to log.
    pub fn name(&self) -> &'static str {
        match self {
            Request::Initialize(_) => "Initialize",
            Request::CipherKeyValue(_) => "CipherKeyValue",
            Request::ButtonAck(_) => "ButtonAck",
            Request::PinMatrixAck(_) => "PinMatrixAck",
            Request::PassphraseAck(_) => "PassphraseAck",
            Request::PassphraseStateAck(_) => "PassphraseStateAck",
        }
    }
}

/// A message the device sends back.
///
/// The first four variants are confirmation requests that the call engine
/// answers itself; the rest end a call chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    ButtonRequest(ButtonRequest),
    PinMatrixRequest(PinMatrixRequest),
    PassphraseRequest(PassphraseRequest),
    PassphraseStateRequest(PassphraseStateRequest),
    Features(Features),
    CipheredKeyValue(CipheredKeyValue),
    Failure(Failure),
    /// A well-framed message of a type this client does not handle
    Unrecognized {
        message_type: u16,
    },
}

impl Reply {
    /// Message name, safe to log.
    pub fn name(&self) -> &'static str {
        match self {
            Reply::ButtonRequest(_) => "ButtonRequest",
            Reply::PinMatrixRequest(_) => "PinMatrixRequest",
            Reply::PassphraseRequest(_) => "PassphraseRequest",
            Reply::PassphraseStateRequest(_) => "PassphraseStateRequest",
            Reply::Features(_) => "Features",
            Reply::CipheredKeyValue(_) => "CipheredKeyValue",
            Reply::Failure(_) => "Failure",
            Reply::Unrecognized { .. } => "Unrecognized",
        }
    }

    /// `true` if the device is waiting for host or on-device input.
    pub fn is_confirmation(&self) -> bool {
        matches!(
            self,
            Reply::ButtonRequest(_)
                | Reply::PinMatrixRequest(_)
                | Reply::PassphraseRequest(_)
                | Reply::PassphraseStateRequest(_)
        )
    }
}
