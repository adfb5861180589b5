//! Device access.
//!
//! This module provides the [`Transport`] seam between the protocol logic
//! and the physical device, the protocol messages, their wire framing, and
//! a transport backed by the Trezor Bridge daemon.
//!
//! # Example
//!
//! ```no_run
//! use trezor_cipher::device::{BridgeTransport, Transport, DEFAULT_BRIDGE_URL};
//!
//! let mut bridge = BridgeTransport::new(DEFAULT_BRIDGE_URL);
//! for device in bridge.enumerate().unwrap() {
//!     println!("device at {}", device.path);
//! }
//! ```

mod bridge;
pub mod messages;
mod types;
pub mod wire;

pub use bridge::{BridgeTransport, DEFAULT_BRIDGE_URL};
pub use messages::{Reply, Request};
pub use types::{DeviceDescriptor, Session};

use crate::error::Result;

/// Blocking access to attached devices.
///
/// Implementations own discovery, session bookkeeping and message
/// marshaling. No method retries; every error is final.
pub trait Transport {
    /// List attached devices in transport order.
    fn enumerate(&mut self) -> Result<Vec<DeviceDescriptor>>;

    /// Take exclusive access to `device` on the normal or debug channel.
    fn acquire(&mut self, device: &DeviceDescriptor, debug_link: bool) -> Result<Session>;

    /// Give the device back. Consumes the session.
    fn release(&mut self, session: Session) -> Result<()>;

    /// Send one request and wait for the device's reply.
    fn call(&mut self, session: &Session, request: &Request) -> Result<Reply>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn enumerate(&mut self) -> Result<Vec<DeviceDescriptor>> {
        (**self).enumerate()
    }

    fn acquire(&mut self, device: &DeviceDescriptor, debug_link: bool) -> Result<Session> {
        (**self).acquire(device, debug_link)
    }

    fn release(&mut self, session: Session) -> Result<()> {
        (**self).release(session)
    }

    fn call(&mut self, session: &Session, request: &Request) -> Result<Reply> {
        (**self).call(session, request)
    }
}
