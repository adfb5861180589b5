//! # trezor-cipher
//!
//! Encrypt and decrypt values with a key that never leaves a Trezor device,
//! using the device's `CipherKeyValue` operation.
//!
//! This library provides:
//!
//! - **Call engine**: sends a request and answers the device's button, PIN,
//!   passphrase and passphrase-state requests until a terminal reply arrives
//! - **Cipher operation**: discover, acquire, initialize, cipher, release,
//!   with payload padding and typed result handling
//! - **Bridge transport**: a [`Transport`] backed by the Trezor Bridge daemon
//! - **Askpass prompter**: PIN and passphrase collection through an external
//!   helper program
//!
//! ## Quick Start
//!
//! ```no_run
//! use trezor_cipher::*;
//!
//! let config = CipherConfig {
//!     key: "vault".to_string(),
//!     value: Some("TEST VALUE".to_string()),
//!     encrypt: true,
//!     hex_output: true,
//!     ..CipherConfig::default()
//! };
//! let transport = BridgeTransport::new(DEFAULT_BRIDGE_URL);
//! let prompter = AskpassCommand::default();
//!
//! let mut op = CipherOperation::new(transport, prompter, config);
//! let mut out = Vec::new();
//! let outcome = op.run(&mut out, &mut std::io::stderr()).unwrap();
//! assert!(outcome.is_success());
//! ```
//!
//! ## Exit statuses
//!
//! | Outcome | Status |
//! |---------|--------|
//! | success | 0 |
//! | no device, no value, bootloader mode | 1 |
//! | device `Failure` | 2 |
//! | unrecognized reply | 254 |
//! | host-side error | 255 |
//! | usage error | 22 |
//!
//! ## Design
//!
//! Device access and secret collection sit behind the [`Transport`] and
//! [`Prompter`] traits, so the protocol logic runs unchanged against a real
//! device or a scripted stub.

// Modules
mod error;
mod types;

pub mod askpass;
pub mod cipher;
pub mod cli;
pub mod config;
pub mod device;
pub mod engine;

// Re-export error types
pub use error::{Error, Result};

// Re-export core types
pub use types::{Outcome, PassphrasePolicy, Prompt, EXIT_HOST_ERROR, EXIT_USAGE};

pub use askpass::{AskpassCommand, Prompter, DEFAULT_ASKPASS};
pub use cipher::{pad_payload, CipherOperation, BLOCK_SIZE};
pub use config::{CipherConfig, DEFAULT_KEY, VALUE_ENV};
pub use device::{
    BridgeTransport, DeviceDescriptor, Reply, Request, Session, Transport, DEFAULT_BRIDGE_URL,
};
pub use engine::CallEngine;
