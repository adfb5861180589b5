//! Types for device discovery and sessions.

/// An attached device as reported by enumeration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// Transport-specific device path
    pub path: String,
    /// Session currently holding the device on the normal channel, if any
    pub session: Option<String>,
    /// Session currently holding the device on the debug link, if any
    pub debug_session: Option<String>,
}

impl DeviceDescriptor {
    /// Create a descriptor for an idle device at `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// The session to hand over when acquiring on the given channel.
    pub fn previous_session(&self, debug_link: bool) -> Option<&str> {
        if debug_link {
            self.debug_session.as_deref()
        } else {
            self.session.as_deref()
        }
    }
}

/// Exclusive access to one device, from acquire until release.
///
/// Deliberately not `Clone`: [`crate::Transport::release`] takes the
/// session by value so it cannot be used afterwards.
#[derive(Debug, PartialEq, Eq)]
pub struct Session {
    id: String,
    debug_link: bool,
}

impl Session {
    /// Wrap a session id issued by a transport.
    pub fn new(id: impl Into<String>, debug_link: bool) -> Self {
        Self {
            id: id.into(),
            debug_link,
        }
    }

    /// Transport-issued session id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Channel chosen at acquire time; every call and the release use it.
    pub fn debug_link(&self) -> bool {
        self.debug_link
    }
}
