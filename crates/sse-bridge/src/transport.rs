//! The streaming transport seam.
//!
//! In the browser this is `EventSource`; reconnects after a dropped stream
//! are the transport's business, never the bridge's.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::BridgeError;
use crate::event::ServerEvent;

pub type EventHandler = Box<dyn FnMut(ServerEvent)>;
pub type ErrorHandler = Box<dyn FnMut()>;

/// Identifies one bound connection in logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(pub Ulid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opens streaming connections.
pub trait Transport {
    type Connection: Connection;

    /// Start connecting to `url`. Returns as soon as the connection object
    /// exists; delivery happens later through the registered handlers.
    fn open(&self, url: &str) -> Result<Self::Connection, BridgeError>;
}

/// A live streaming connection.
pub trait Connection {
    /// Handler for unnamed (`message`) events.
    fn set_message_handler(&mut self, handler: EventHandler);

    /// Handler for transport errors. The transport keeps retrying on its own.
    fn set_error_handler(&mut self, handler: ErrorHandler);

    /// Register a listener for one named event type. Registering the same
    /// name twice yields two listeners.
    fn add_listener(&mut self, event_type: &str, handler: EventHandler);

    /// Release the underlying stream. Nothing is delivered afterwards.
    fn close(&mut self);
}
