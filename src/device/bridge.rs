//! Trezor Bridge transport.
//!
//! Talks to the `trezord` HTTP daemon, which owns the USB (or emulator UDP)
//! connection to the device. Every endpoint is a `POST`; debug-link
//! variants live under `/debug/`.

use serde::Deserialize;
use tracing::{debug, info};

use super::messages::{Reply, Request};
use super::types::{DeviceDescriptor, Session};
use super::wire::{decode_reply, encode_request};
use super::Transport;
use crate::error::{Error, Result};

/// Default bridge endpoint.
pub const DEFAULT_BRIDGE_URL: &str = "http://127.0.0.1:21325";

/// Origin header the bridge accepts from non-browser clients.
const BRIDGE_ORIGIN: &str = "https://trezor.io";

#[derive(Debug, Deserialize)]
struct BridgeDevice {
    path: String,
    session: Option<String>,
    #[serde(rename = "debugSession")]
    debug_session: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AcquireResponse {
    session: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// [`Transport`] backed by a running Trezor Bridge.
pub struct BridgeTransport {
    agent: ureq::Agent,
    base_url: String,
}

impl BridgeTransport {
    /// Create a transport for the bridge at `base_url`.
    ///
    /// No request timeout is set: calls block while the device waits for
    /// the user.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            agent: ureq::AgentBuilder::new().build(),
            base_url,
        }
    }

    /// Bridge endpoint this transport talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post(&self, endpoint: &str, body: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(%url, "bridge request");
        match self
            .agent
            .post(&url)
            .set("Origin", BRIDGE_ORIGIN)
            .send_string(body)
        {
            Ok(response) => Ok(response.into_string()?),
            Err(ureq::Error::Status(status, response)) => {
                let text = response.into_string().unwrap_or_default();
                Err(Error::Bridge(bridge_error_message(status, &text)))
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl Transport for BridgeTransport {
    fn enumerate(&mut self) -> Result<Vec<DeviceDescriptor>> {
        let body = self.post("/enumerate", "")?;
        let devices = parse_enumeration(&body)?;
        info!(count = devices.len(), "enumerated devices");
        Ok(devices)
    }

    fn acquire(&mut self, device: &DeviceDescriptor, debug_link: bool) -> Result<Session> {
        let previous = device.previous_session(debug_link).unwrap_or("null");
        let endpoint = format!(
            "{}/acquire/{}/{}",
            channel_prefix(debug_link),
            device.path,
            previous
        );
        let body = self.post(&endpoint, "")?;
        let acquired: AcquireResponse = serde_json::from_str(&body)?;
        info!(path = %device.path, session = %acquired.session, debug_link, "acquired device");
        Ok(Session::new(acquired.session, debug_link))
    }

    fn release(&mut self, session: Session) -> Result<()> {
        let endpoint = format!(
            "{}/release/{}",
            channel_prefix(session.debug_link()),
            session.id()
        );
        self.post(&endpoint, "")?;
        info!(session = %session.id(), "released device");
        Ok(())
    }

    fn call(&mut self, session: &Session, request: &Request) -> Result<Reply> {
        let endpoint = format!(
            "{}/call/{}",
            channel_prefix(session.debug_link()),
            session.id()
        );
        let body = hex::encode(encode_request(request));
        let response = self.post(&endpoint, &body)?;
        let frame = hex::decode(response.trim())
            .map_err(|e| Error::Protocol(format!("bridge returned non-hex frame: {}", e)))?;
        decode_reply(&frame)
    }
}

fn channel_prefix(debug_link: bool) -> &'static str {
    if debug_link {
        "/debug"
    } else {
        ""
    }
}

/// Parse the `/enumerate` document into descriptors, keeping bridge order.
pub(crate) fn parse_enumeration(body: &str) -> Result<Vec<DeviceDescriptor>> {
    let devices: Vec<BridgeDevice> = serde_json::from_str(body)?;
    Ok(devices
        .into_iter()
        .map(|d| DeviceDescriptor {
            path: d.path,
            session: d.session,
            debug_session: d.debug_session,
        })
        .collect())
}

/// Build a readable message from a non-2xx bridge response.
fn bridge_error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(doc) => format!("{} (HTTP {})", doc.error, status),
        Err(_) if body.trim().is_empty() => format!("HTTP {}", status),
        Err(_) => format!("{} (HTTP {})", body.trim(), status),
    }
}
