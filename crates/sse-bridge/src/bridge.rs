//! The event bridge: binds event sources to elements and re-dispatches
//! subscribed server events as bubbling DOM events.
//!
//! Per element the bridge is a two-state machine:
//!
//! ```text
//! UNBOUND --processed with url--> BOUND
//! BOUND   --processed with url--> BOUND    (old connection closed first)
//! BOUND   --about to be removed--> UNBOUND (connection closed)
//! ```
//!
//! Nothing is ever reported back to the host. Refused connections and
//! transport errors end up in the log only.

use log::{debug, trace, warn};

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::event::BridgeEvent;
use crate::host::{BoundConnection, Element, Host};
use crate::signal::LifecycleSignal;
use crate::subscription::SubscriptionList;
use crate::transport::{Connection, ConnectionId, Transport};

/// A named behavior extension driven by host lifecycle signals.
pub trait Extension {
    type Element;

    fn name(&self) -> &str;

    fn on_signal(&self, signal: LifecycleSignal<Self::Element>);

    /// Entry point for hosts that report lifecycle events by name.
    /// Names that are not lifecycle signals are ignored.
    fn on_host_event(&self, name: &str, element: Self::Element) {
        if let Some(signal) = LifecycleSignal::from_host_event(name, element) {
            self.on_signal(signal);
        }
    }
}

pub struct SseBridge<H, T> {
    host: H,
    transport: T,
    config: BridgeConfig,
}

impl<H, T> SseBridge<H, T>
where
    T: Transport,
    H: Host<T::Connection>,
{
    /// Create the bridge around the host's utilities handle.
    pub fn init(host: H, transport: T, config: BridgeConfig) -> Self {
        Self {
            host,
            transport,
            config,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Bind a new connection to `element`, closing the one already bound.
    ///
    /// If the transport refuses to open, the element is left unbound (the old
    /// connection is closed either way).
    pub fn connect(&self, element: &H::Element, url: &str) -> Result<ConnectionId, BridgeError> {
        if let Some(mut previous) = self.host.with_state(element, |state| state.connection.take()) {
            debug!(
                "Closing event source {} ({}) before rebinding",
                previous.id, previous.url
            );
            previous.connection.close();
        }

        let mut connection = self.transport.open(url)?;
        let id = ConnectionId::new();

        connection.set_message_handler(Box::new(move |event| {
            trace!("[{id}] message: {} bytes", event.data.len());
        }));
        let error_url = url.to_string();
        connection.set_error_handler(Box::new(move || {
            debug!("[{id}] event source error on {error_url}, leaving retry to the transport");
        }));

        let subscriptions = element
            .attribute(&self.config.swap_attribute)
            .filter(|value| !value.is_empty())
            .map(|value| SubscriptionList::parse(&value))
            .unwrap_or_default();

        for name in &subscriptions {
            let element = element.clone();
            let prefix = self.config.event_prefix.clone();
            let subscription = name.clone();
            connection.add_listener(
                name,
                Box::new(move |event| {
                    element.dispatch(BridgeEvent::for_subscription(&prefix, &subscription, &event));
                }),
            );
        }

        debug!(
            "[{id}] bound event source {url} with {} subscription(s)",
            subscriptions.len()
        );
        self.host.with_state(element, |state| {
            state.connection = Some(BoundConnection {
                id,
                url: url.to_string(),
                subscriptions,
                connection,
            });
        });
        Ok(id)
    }

    /// Close and forget the connection bound to `element`.
    /// Returns `false` (and does nothing) when the element is unbound.
    pub fn disconnect(&self, element: &H::Element) -> bool {
        match self.host.with_state(element, |state| state.connection.take()) {
            Some(mut bound) => {
                debug!("[{}] closing event source {}", bound.id, bound.url);
                bound.connection.close();
                self.host.discard_state(element);
                true
            }
            None => false,
        }
    }

    pub fn is_bound(&self, element: &H::Element) -> bool {
        self.host.with_state(element, |state| state.is_bound())
    }

    pub fn bound_url(&self, element: &H::Element) -> Option<String> {
        self.host.with_state(element, |state| {
            state.connection.as_ref().map(|bound| bound.url.clone())
        })
    }

    pub fn connection_id(&self, element: &H::Element) -> Option<ConnectionId> {
        self.host
            .with_state(element, |state| state.connection.as_ref().map(|bound| bound.id))
    }

    pub fn subscriptions(&self, element: &H::Element) -> Option<SubscriptionList> {
        self.host.with_state(element, |state| {
            state
                .connection
                .as_ref()
                .map(|bound| bound.subscriptions.clone())
        })
    }

    fn after_process_node(&self, element: &H::Element) {
        // An empty attribute means the element is not SSE-enabled.
        let Some(url) = element
            .attribute(&self.config.connect_attribute)
            .filter(|url| !url.is_empty())
        else {
            return;
        };
        if let Err(error) = self.connect(element, &url) {
            warn!("Element left without event source: {error}");
        }
    }
}

impl<H, T> Extension for SseBridge<H, T>
where
    T: Transport,
    H: Host<T::Connection>,
{
    type Element = H::Element;

    fn name(&self) -> &str {
        &self.config.extension_name
    }

    fn on_signal(&self, signal: LifecycleSignal<H::Element>) {
        match signal {
            LifecycleSignal::AfterProcessNode(element) => self.after_process_node(&element),
            LifecycleSignal::BeforeCleanupElement(element) => {
                self.disconnect(&element);
            }
        }
    }
}

impl<H, T> std::fmt::Debug for SseBridge<H, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SseBridge")
            .field("extension_name", &self.config.extension_name)
            .finish()
    }
}
