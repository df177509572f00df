//! Server-sent events → htmx element lifecycle.
//!
//! An element that declares `sse-connect="<url>"` gets one EventSource bound
//! to it while it lives in the processed tree. Every event name listed in
//! `sse-swap` is re-dispatched on the element as a bubbling `sse:<name>`
//! custom event, so a reactive layer further up the tree can pick it up.
//!
//! The crate is platform-independent: the browser itself lives behind the
//! [`Host`], [`Element`], [`Transport`] and [`Connection`] seams. The
//! `sse-bridge-web` crate implements them on top of `web_sys`, and
//! [`platform::headless`] implements them in memory.

pub mod bridge;
pub mod config;
pub mod error;
pub mod event;
pub mod host;
pub mod platform;
pub mod signal;
pub mod subscription;
pub mod transport;

pub use bridge::{Extension, SseBridge};
pub use config::BridgeConfig;
pub use error::BridgeError;
pub use event::{BridgeEvent, ServerEvent, SseDetail};
pub use host::{BoundConnection, Element, ElementState, Host};
pub use signal::LifecycleSignal;
pub use subscription::SubscriptionList;
pub use transport::{Connection, ConnectionId, ErrorHandler, EventHandler, Transport};
