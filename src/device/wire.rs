//! Message framing.
//!
//! A frame is a big-endian `u16` message type, a big-endian `u32` payload
//! length, then the protobuf payload. The bridge carries frames hex-encoded
//! in HTTP bodies; this module only deals with the raw bytes.

use prost::Message;

use super::messages::*;
use crate::error::{Error, Result};

/// Size of the type + length header.
pub const HEADER_LEN: usize = 6;

pub const MESSAGE_INITIALIZE: u16 = 0;
pub const MESSAGE_FAILURE: u16 = 3;
pub const MESSAGE_FEATURES: u16 = 17;
pub const MESSAGE_PIN_MATRIX_REQUEST: u16 = 18;
pub const MESSAGE_PIN_MATRIX_ACK: u16 = 19;
pub const MESSAGE_CIPHER_KEY_VALUE: u16 = 23;
pub const MESSAGE_BUTTON_REQUEST: u16 = 26;
pub const MESSAGE_BUTTON_ACK: u16 = 27;
pub const MESSAGE_PASSPHRASE_REQUEST: u16 = 41;
pub const MESSAGE_PASSPHRASE_ACK: u16 = 42;
pub const MESSAGE_CIPHERED_KEY_VALUE: u16 = 48;
pub const MESSAGE_PASSPHRASE_STATE_REQUEST: u16 = 77;
pub const MESSAGE_PASSPHRASE_STATE_ACK: u16 = 78;

impl Request {
    /// Wire message type of this request.
    pub fn message_type(&self) -> u16 {
        match self {
            Request::Initialize(_) => MESSAGE_INITIALIZE,
            Request::CipherKeyValue(_) => MESSAGE_CIPHER_KEY_VALUE,
            Request::ButtonAck(_) => MESSAGE_BUTTON_ACK,
            Request::PinMatrixAck(_) => MESSAGE_PIN_MATRIX_ACK,
            Request::PassphraseAck(_) => MESSAGE_PASSPHRASE_ACK,
            Request::PassphraseStateAck(_) => MESSAGE_PASSPHRASE_STATE_ACK,
        }
    }

    fn encode_body(&self) -> Vec<u8> {
        match self {
            Request::Initialize(m) => m.encode_to_vec(),
            Request::CipherKeyValue(m) => m.encode_to_vec(),
            Request::ButtonAck(m) => m.encode_to_vec(),
            Request::PinMatrixAck(m) => m.encode_to_vec(),
            Request::PassphraseAck(m) => m.encode_to_vec(),
            Request::PassphraseStateAck(m) => m.encode_to_vec(),
        }
    }
}

/// Frame a request for the wire.
pub fn encode_request(request: &Request) -> Vec<u8> {
    let body = request.encode_body();
    let mut frame = Vec::with_capacity(HEADER_LEN + body.len());
    frame.extend_from_slice(&request.message_type().to_be_bytes());
    frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
    frame.extend_from_slice(&body);
    frame
}

/// Split a frame into its message type and payload.
///
/// # Errors
/// * [`Error::Protocol`] - If the header is truncated or the declared
///   length does not match the payload
pub fn split_frame(frame: &[u8]) -> Result<(u16, &[u8])> {
    if frame.len() < HEADER_LEN {
        return Err(Error::Protocol(format!(
            "frame of {} bytes is shorter than its header",
            frame.len()
        )));
    }
    let message_type = u16::from_be_bytes([frame[0], frame[1]]);
    let declared = u32::from_be_bytes([frame[2], frame[3], frame[4], frame[5]]) as usize;
    let payload = &frame[HEADER_LEN..];
    if payload.len() != declared {
        return Err(Error::Protocol(format!(
            "message type {} declares {} payload bytes but carries {}",
            message_type,
            declared,
            payload.len()
        )));
    }
    Ok((message_type, payload))
}

/// Decode a framed reply from the device.
///
/// Message types this client does not handle become
/// [`Reply::Unrecognized`]; their payload is not inspected.
pub fn decode_reply(frame: &[u8]) -> Result<Reply> {
    let (message_type, payload) = split_frame(frame)?;
    let reply = match message_type {
        MESSAGE_BUTTON_REQUEST => Reply::ButtonRequest(ButtonRequest::decode(payload)?),
        MESSAGE_PIN_MATRIX_REQUEST => Reply::PinMatrixRequest(PinMatrixRequest::decode(payload)?),
        MESSAGE_PASSPHRASE_REQUEST => {
            Reply::PassphraseRequest(PassphraseRequest::decode(payload)?)
        }
        MESSAGE_PASSPHRASE_STATE_REQUEST => {
            Reply::PassphraseStateRequest(PassphraseStateRequest::decode(payload)?)
        }
        MESSAGE_FEATURES => Reply::Features(Features::decode(payload)?),
        MESSAGE_CIPHERED_KEY_VALUE => Reply::CipheredKeyValue(CipheredKeyValue::decode(payload)?),
        MESSAGE_FAILURE => Reply::Failure(Failure::decode(payload)?),
        other => Reply::Unrecognized {
            message_type: other,
        },
    };
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(message_type: u16, body: &[u8]) -> Vec<u8> {
        let mut out = message_type.to_be_bytes().to_vec();
        out.extend_from_slice(&(body.len() as u32).to_be_bytes());
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn test_empty_ack_is_header_only() {
        let encoded = encode_request(&Request::ButtonAck(ButtonAck {}));
        assert_eq!(encoded, vec![0x00, 0x1b, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_cipher_key_value_field_layout() {
        let request = Request::CipherKeyValue(CipherKeyValue {
            address_n: vec![1],
            key: "k".into(),
            value: vec![0xAA],
            encrypt: Some(true),
            ask_on_encrypt: Some(true),
            ask_on_decrypt: Some(true),
            iv: None,
        });
        let encoded = encode_request(&request);
        assert_eq!(&encoded[..2], &[0x00, 0x17]);
        // address_n unpacked, key, value, encrypt, ask_on_encrypt, ask_on_decrypt
        let body = [
            0x08, 0x01, 0x12, 0x01, b'k', 0x1a, 0x01, 0xAA, 0x20, 0x01, 0x28, 0x01, 0x30, 0x01,
        ];
        assert_eq!(&encoded[2..6], &(body.len() as u32).to_be_bytes());
        assert_eq!(&encoded[HEADER_LEN..], &body);
    }

    #[test]
    fn test_decode_failure_message() {
        // code = 7, message = "PIN invalid"
        let mut body = vec![0x08, 0x07, 0x12, 11];
        body.extend_from_slice(b"PIN invalid");
        let reply = decode_reply(&frame(MESSAGE_FAILURE, &body)).unwrap();
        match reply {
            Reply::Failure(failure) => {
                assert_eq!(failure.code, Some(7));
                assert_eq!(failure.text(), "PIN invalid");
            }
            other => panic!("unexpected reply {:?}", other),
        }
    }

    #[test]
    fn test_decode_features_skips_unknown_fields() {
        // bootloader_mode = true, device_id = "ID", field 99 (varint), label = "L"
        let body = [
            0x28, 0x01, 0x32, 0x02, b'I', b'D', 0x98, 0x06, 0x05, 0x52, 0x01, b'L',
        ];
        let reply = decode_reply(&frame(MESSAGE_FEATURES, &body)).unwrap();
        let Reply::Features(features) = reply else {
            panic!("expected Features");
        };
        assert!(features.is_bootloader());
        assert_eq!(features.device_id.as_deref(), Some("ID"));
        assert_eq!(features.label.as_deref(), Some("L"));
    }

    #[test]
    fn test_passphrase_request_on_device_flag() {
        let reply = decode_reply(&frame(MESSAGE_PASSPHRASE_REQUEST, &[0x08, 0x01])).unwrap();
        assert_eq!(
            reply,
            Reply::PassphraseRequest(PassphraseRequest {
                on_device: Some(true)
            })
        );

        let reply = decode_reply(&frame(MESSAGE_PASSPHRASE_REQUEST, &[])).unwrap();
        assert_eq!(
            reply,
            Reply::PassphraseRequest(PassphraseRequest { on_device: None })
        );
    }

    #[test]
    fn test_unknown_type_is_unrecognized() {
        // Success (2) is a valid protocol message this client never expects
        let reply = decode_reply(&frame(2, &[0x0a, 0x00])).unwrap();
        assert_eq!(reply, Reply::Unrecognized { message_type: 2 });
    }

    #[test]
    fn test_truncated_frames_are_rejected() {
        assert!(matches!(decode_reply(&[0x00, 0x03, 0x00]), Err(Error::Protocol(_))));

        let mut bad = frame(MESSAGE_FAILURE, &[0x08, 0x01]);
        bad.pop();
        assert!(matches!(decode_reply(&bad), Err(Error::Protocol(_))));
    }

    #[test]
    fn test_garbage_payload_is_decode_error() {
        // field 1 declared as length-delimited with a length past the end
        let result = decode_reply(&frame(MESSAGE_CIPHERED_KEY_VALUE, &[0x0a, 0x05, 0x01]));
        assert!(matches!(result, Err(Error::Decode(_))));
    }
}
