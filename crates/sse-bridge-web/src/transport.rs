//! `EventSource` transport.
//!
//! Reconnecting after a dropped stream is left to the browser.

use log::warn;
use sse_bridge::{BridgeError, Connection, ErrorHandler, EventHandler, ServerEvent, Transport};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{EventSource, EventSourceInit, MessageEvent};

type MessageClosure = Closure<dyn FnMut(MessageEvent)>;
type ErrorClosure = Closure<dyn FnMut(web_sys::Event)>;

#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserTransport {
    with_credentials: bool,
}

impl BrowserTransport {
    pub fn new(with_credentials: bool) -> Self {
        Self { with_credentials }
    }
}

impl Transport for BrowserTransport {
    type Connection = BrowserConnection;

    fn open(&self, url: &str) -> Result<BrowserConnection, BridgeError> {
        let init = EventSourceInit::new();
        init.set_with_credentials(self.with_credentials);
        // Throws synchronously only for unparsable URLs.
        let source = EventSource::new_with_event_source_dict(url, &init)
            .map_err(|error| BridgeError::open(url, describe(&error)))?;
        Ok(BrowserConnection {
            source,
            on_message: None,
            on_error: None,
            listeners: Vec::new(),
        })
    }
}

/// An `EventSource` plus the closures registered on it.
///
/// The closures live exactly as long as the registrations: `close` (or drop)
/// unregisters them before releasing them.
pub struct BrowserConnection {
    source: EventSource,
    on_message: Option<MessageClosure>,
    on_error: Option<ErrorClosure>,
    listeners: Vec<(String, MessageClosure)>,
}

impl BrowserConnection {
    pub fn source(&self) -> &EventSource {
        &self.source
    }

    /// Absolute URL the source connects to.
    pub fn url(&self) -> String {
        self.source.url()
    }

    pub fn is_closed(&self) -> bool {
        self.source.ready_state() == EventSource::CLOSED
    }
}

impl Connection for BrowserConnection {
    fn set_message_handler(&mut self, mut handler: EventHandler) {
        let closure = Closure::wrap(Box::new(move |event: MessageEvent| {
            handler(server_event(&event));
        }) as Box<dyn FnMut(MessageEvent)>);
        self.source
            .set_onmessage(Some(closure.as_ref().unchecked_ref()));
        self.on_message = Some(closure);
    }

    fn set_error_handler(&mut self, mut handler: ErrorHandler) {
        let closure = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            handler();
        }) as Box<dyn FnMut(web_sys::Event)>);
        self.source.set_onerror(Some(closure.as_ref().unchecked_ref()));
        self.on_error = Some(closure);
    }

    fn add_listener(&mut self, event_type: &str, mut handler: EventHandler) {
        let closure = Closure::wrap(Box::new(move |event: MessageEvent| {
            handler(server_event(&event));
        }) as Box<dyn FnMut(MessageEvent)>);
        if let Err(error) = self
            .source
            .add_event_listener_with_callback(event_type, closure.as_ref().unchecked_ref())
        {
            warn!("Failed to listen for '{event_type}': {}", describe(&error));
            return;
        }
        self.listeners.push((event_type.to_string(), closure));
    }

    fn close(&mut self) {
        self.source.close();
        self.source.set_onmessage(None);
        self.source.set_onerror(None);
        for (event_type, closure) in &self.listeners {
            let _ = self
                .source
                .remove_event_listener_with_callback(event_type, closure.as_ref().unchecked_ref());
        }
        let retired = (
            self.on_message.take(),
            self.on_error.take(),
            std::mem::take(&mut self.listeners),
        );
        // `close` may run inside one of these closures (a listener whose
        // dispatch removes the element), so they are dropped on a later tick.
        zoon::Task::start(async move {
            drop(retired);
        });
    }
}

impl Drop for BrowserConnection {
    fn drop(&mut self) {
        let registered =
            self.on_message.is_some() || self.on_error.is_some() || !self.listeners.is_empty();
        if registered || !self.is_closed() {
            self.close();
        }
    }
}

impl std::fmt::Debug for BrowserConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserConnection")
            .field("url", &self.source.url())
            .field("ready_state", &self.source.ready_state())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

fn server_event(event: &MessageEvent) -> ServerEvent {
    let last_event_id = event.last_event_id();
    ServerEvent {
        event_type: event.type_(),
        data: event.data().as_string().unwrap_or_default(),
        last_event_id: (!last_event_id.is_empty()).then_some(last_event_id),
    }
}

pub(crate) fn describe(error: &JsValue) -> String {
    error
        .as_string()
        .or_else(|| {
            error
                .dyn_ref::<js_sys::Error>()
                .map(|error| String::from(error.message()))
        })
        .unwrap_or_else(|| format!("{error:?}"))
}
