//! In-memory platform: a tiny element tree, a side-table host and a scripted
//! transport.
//!
//! Used by the test suites and by embedders that drive the bridge without a
//! browser. Dispatched events are recorded on the target element and, when
//! they bubble, on every ancestor.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::BridgeError;
use crate::event::{BridgeEvent, ServerEvent};
use crate::host::{Element, ElementState, Host};
use crate::transport::{Connection, ErrorHandler, EventHandler, Transport};

/// Identity of an element in a [`HeadlessDocument`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub Ulid);

impl ElementId {
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

// --- Document ---

/// An event as observed by one element (the target or a bubbling ancestor).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObservedEvent {
    pub target: ElementId,
    pub event: BridgeEvent,
}

struct NodeData {
    tag: String,
    attributes: BTreeMap<String, String>,
    parent: Option<ElementId>,
    observed: Vec<ObservedEvent>,
}

#[derive(Clone, Default)]
pub struct HeadlessDocument {
    nodes: Rc<RefCell<HashMap<ElementId, NodeData>>>,
}

impl HeadlessDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_element(&self, tag: &str) -> HeadlessElement {
        let id = ElementId::new();
        self.nodes.borrow_mut().insert(
            id,
            NodeData {
                tag: tag.to_string(),
                attributes: BTreeMap::new(),
                parent: None,
                observed: Vec::new(),
            },
        );
        HeadlessElement {
            id,
            document: self.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.borrow().is_empty()
    }
}

impl std::fmt::Debug for HeadlessDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadlessDocument")
            .field("elements", &self.nodes.borrow().len())
            .finish()
    }
}

/// Handle to an element of a [`HeadlessDocument`].
#[derive(Clone)]
pub struct HeadlessElement {
    id: ElementId,
    document: HeadlessDocument,
}

impl HeadlessElement {
    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn tag(&self) -> String {
        self.with_node(|node| node.tag.clone()).unwrap_or_default()
    }

    pub fn set_attribute(&self, name: &str, value: &str) {
        self.with_node(|node| {
            node.attributes.insert(name.to_string(), value.to_string());
        });
    }

    pub fn remove_attribute(&self, name: &str) {
        self.with_node(|node| {
            node.attributes.remove(name);
        });
    }

    /// Re-parent `child` under this element.
    pub fn append_child(&self, child: &HeadlessElement) {
        let parent = self.id;
        child.with_node(|node| node.parent = Some(parent));
    }

    pub fn parent(&self) -> Option<HeadlessElement> {
        let parent = self.with_node(|node| node.parent)??;
        Some(HeadlessElement {
            id: parent,
            document: self.document.clone(),
        })
    }

    /// Every event this element observed, in dispatch order.
    pub fn observed_events(&self) -> Vec<ObservedEvent> {
        self.with_node(|node| node.observed.clone())
            .unwrap_or_default()
    }

    /// Observed events with the given DOM event name.
    pub fn observed_named(&self, name: &str) -> Vec<ObservedEvent> {
        self.observed_events()
            .into_iter()
            .filter(|observed| observed.event.name == name)
            .collect()
    }

    fn with_node<R>(&self, f: impl FnOnce(&mut NodeData) -> R) -> Option<R> {
        self.document.nodes.borrow_mut().get_mut(&self.id).map(f)
    }
}

impl PartialEq for HeadlessElement {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for HeadlessElement {}

impl std::fmt::Debug for HeadlessElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadlessElement")
            .field("id", &self.id)
            .field("tag", &self.tag())
            .finish()
    }
}

impl Element for HeadlessElement {
    fn attribute(&self, name: &str) -> Option<String> {
        self.with_node(|node| node.attributes.get(name).cloned())?
    }

    fn dispatch(&self, event: BridgeEvent) {
        let mut nodes = self.document.nodes.borrow_mut();
        let mut current = Some(self.id);
        while let Some(id) = current {
            let Some(node) = nodes.get_mut(&id) else {
                break;
            };
            node.observed.push(ObservedEvent {
                target: self.id,
                event: event.clone(),
            });
            if !event.bubbles {
                break;
            }
            current = node.parent;
        }
    }
}

// --- Host ---

/// Side-table host keyed by element identity.
pub struct HeadlessHost<C> {
    states: RefCell<HashMap<ElementId, ElementState<C>>>,
}

impl<C> HeadlessHost<C> {
    pub fn new() -> Self {
        Self {
            states: RefCell::new(HashMap::new()),
        }
    }

    /// Number of elements with a non-empty private slot.
    pub fn tracked_elements(&self) -> usize {
        self.states.borrow().len()
    }
}

impl<C> Default for HeadlessHost<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Host<C> for HeadlessHost<C> {
    type Element = HeadlessElement;

    fn with_state<R>(
        &self,
        element: &HeadlessElement,
        f: impl FnOnce(&mut ElementState<C>) -> R,
    ) -> R {
        let mut states = self.states.borrow_mut();
        let state = states.entry(element.id()).or_default();
        let result = f(state);
        // Empty slots are not kept around.
        if !state.is_bound() {
            states.remove(&element.id());
        }
        result
    }

    fn discard_state(&self, element: &HeadlessElement) {
        self.states.borrow_mut().remove(&element.id());
    }
}

// --- Transport ---

#[derive(Default)]
struct TransportLog {
    connections: Vec<ScriptedConnection>,
    refused: HashSet<String>,
}

/// Transport whose connections are driven by the caller.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    log: Rc<RefCell<TransportLog>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later `open(url)` fail.
    pub fn refuse(&self, url: &str) {
        self.log.borrow_mut().refused.insert(url.to_string());
    }

    /// All connections ever opened, oldest first.
    pub fn connections(&self) -> Vec<ScriptedConnection> {
        self.log.borrow().connections.clone()
    }

    pub fn open_connections(&self) -> Vec<ScriptedConnection> {
        self.connections()
            .into_iter()
            .filter(ScriptedConnection::is_open)
            .collect()
    }

    pub fn opened_count(&self) -> usize {
        self.log.borrow().connections.len()
    }

    /// Most recently opened connection to `url`.
    pub fn latest_to(&self, url: &str) -> Option<ScriptedConnection> {
        self.log
            .borrow()
            .connections
            .iter()
            .rev()
            .find(|connection| connection.url() == url)
            .cloned()
    }
}

impl Transport for ScriptedTransport {
    type Connection = ScriptedConnection;

    fn open(&self, url: &str) -> Result<ScriptedConnection, BridgeError> {
        let mut log = self.log.borrow_mut();
        if log.refused.contains(url) {
            return Err(BridgeError::open(url, "connection refused"));
        }
        let connection = ScriptedConnection::new(url);
        log.connections.push(connection.clone());
        Ok(connection)
    }
}

impl std::fmt::Debug for ScriptedTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedTransport")
            .field("opened", &self.opened_count())
            .finish()
    }
}

struct ConnectionState {
    url: String,
    open: bool,
    message_handler: Option<EventHandler>,
    error_handler: Option<ErrorHandler>,
    listeners: Vec<(String, EventHandler)>,
}

/// Shared handle to a scripted connection; clones observe the same stream.
#[derive(Clone)]
pub struct ScriptedConnection {
    state: Rc<RefCell<ConnectionState>>,
}

impl ScriptedConnection {
    fn new(url: &str) -> Self {
        Self {
            state: Rc::new(RefCell::new(ConnectionState {
                url: url.to_string(),
                open: true,
                message_handler: None,
                error_handler: None,
                listeners: Vec::new(),
            })),
        }
    }

    pub fn url(&self) -> String {
        self.state.borrow().url.clone()
    }

    pub fn is_open(&self) -> bool {
        self.state.borrow().open
    }

    pub fn listener_count(&self, event_type: &str) -> usize {
        self.state
            .borrow()
            .listeners
            .iter()
            .filter(|(name, _)| name == event_type)
            .count()
    }

    pub fn listener_names(&self) -> Vec<String> {
        self.state
            .borrow()
            .listeners
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn has_message_handler(&self) -> bool {
        self.state.borrow().message_handler.is_some()
    }

    pub fn has_error_handler(&self) -> bool {
        self.state.borrow().error_handler.is_some()
    }

    /// Deliver a server event the way an EventSource does: unnamed
    /// (`message`) events reach the message handler, and every listener
    /// registered for the event type fires. Returns how many handlers ran;
    /// a closed connection delivers nothing.
    pub fn emit(&self, event_type: &str, data: &str) -> usize {
        self.emit_event(ServerEvent::new(event_type, data))
    }

    pub fn emit_event(&self, event: ServerEvent) -> usize {
        let (mut message_handler, mut listeners) = {
            let mut state = self.state.borrow_mut();
            if !state.open {
                return 0;
            }
            let message_handler = if event.event_type == "message" {
                state.message_handler.take()
            } else {
                None
            };
            (message_handler, std::mem::take(&mut state.listeners))
        };

        // Handlers run without the state borrowed, so they may close the connection.
        let mut delivered = 0;
        if let Some(handler) = message_handler.as_mut() {
            handler(event.clone());
            delivered += 1;
        }
        for (name, handler) in listeners.iter_mut() {
            if *name == event.event_type {
                handler(event.clone());
                delivered += 1;
            }
        }

        let mut state = self.state.borrow_mut();
        if state.open {
            if state.message_handler.is_none() {
                state.message_handler = message_handler;
            }
            listeners.append(&mut state.listeners);
            state.listeners = listeners;
        }
        delivered
    }

    /// Report a transport error. Returns whether an error handler ran.
    pub fn fail(&self) -> bool {
        let mut handler = {
            let mut state = self.state.borrow_mut();
            if !state.open {
                return false;
            }
            state.error_handler.take()
        };
        let Some(callback) = handler.as_mut() else {
            return false;
        };
        callback();
        let mut state = self.state.borrow_mut();
        if state.open && state.error_handler.is_none() {
            state.error_handler = handler;
        }
        true
    }
}

impl Connection for ScriptedConnection {
    fn set_message_handler(&mut self, handler: EventHandler) {
        self.state.borrow_mut().message_handler = Some(handler);
    }

    fn set_error_handler(&mut self, handler: ErrorHandler) {
        self.state.borrow_mut().error_handler = Some(handler);
    }

    fn add_listener(&mut self, event_type: &str, handler: EventHandler) {
        self.state
            .borrow_mut()
            .listeners
            .push((event_type.to_string(), handler));
    }

    fn close(&mut self) {
        let mut state = self.state.borrow_mut();
        state.open = false;
        state.message_handler = None;
        state.error_handler = None;
        state.listeners.clear();
    }
}

impl std::fmt::Debug for ScriptedConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ScriptedConnection")
            .field("url", &state.url)
            .field("open", &state.open)
            .field("listeners", &state.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn dispatch_bubbles_to_ancestors() {
        let document = HeadlessDocument::new();
        let body = document.create_element("body");
        let section = document.create_element("section");
        let div = document.create_element("div");
        body.append_child(&section);
        section.append_child(&div);

        let event = BridgeEvent::for_subscription("sse:", "done", &ServerEvent::new("done", ""));
        div.dispatch(event.clone());

        for element in [&div, &section, &body] {
            assert_eq!(
                element.observed_events(),
                vec![ObservedEvent {
                    target: div.id(),
                    event: event.clone(),
                }]
            );
        }
    }

    #[test]
    fn non_bubbling_event_stays_on_target() {
        let document = HeadlessDocument::new();
        let parent = document.create_element("div");
        let child = document.create_element("span");
        parent.append_child(&child);

        let mut event = BridgeEvent::for_subscription("sse:", "x", &ServerEvent::new("x", "1"));
        event.bubbles = false;
        child.dispatch(event);

        assert_eq!(child.observed_events().len(), 1);
        assert!(parent.observed_events().is_empty());
    }

    #[test]
    fn host_drops_empty_slots() {
        let document = HeadlessDocument::new();
        let element = document.create_element("div");
        let host: HeadlessHost<ScriptedConnection> = HeadlessHost::new();

        assert!(!host.with_state(&element, |state| state.is_bound()));
        assert_eq!(host.tracked_elements(), 0);
    }

    #[test]
    fn unnamed_events_reach_message_handler_and_message_listeners() {
        let transport = ScriptedTransport::new();
        let mut connection = transport.open("/events").unwrap();
        let hits = Rc::new(Cell::new(0));

        let counter = hits.clone();
        connection.set_message_handler(Box::new(move |_| counter.set(counter.get() + 1)));
        let counter = hits.clone();
        connection.add_listener("message", Box::new(move |_| counter.set(counter.get() + 1)));

        assert_eq!(connection.emit("message", "connected"), 2);
        assert_eq!(connection.emit("other", "ignored"), 0);
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn closed_connection_delivers_nothing() {
        let transport = ScriptedTransport::new();
        let mut connection = transport.open("/events").unwrap();
        connection.add_listener("tick", Box::new(|_| {}));
        connection.set_error_handler(Box::new(|| {}));

        connection.close();

        assert_eq!(connection.emit("tick", "1"), 0);
        assert!(!connection.fail());
        assert!(transport.open_connections().is_empty());
    }

    #[test]
    fn refused_url() {
        let transport = ScriptedTransport::new();
        transport.refuse("/nope");
        assert_eq!(
            transport.open("/nope").unwrap_err(),
            BridgeError::open("/nope", "connection refused")
        );
        assert_eq!(transport.opened_count(), 0);
    }

    #[test]
    fn listener_may_close_its_own_connection() {
        let transport = ScriptedTransport::new();
        let mut connection = transport.open("/events").unwrap();
        let handle = connection.clone();
        connection.add_listener(
            "done",
            Box::new(move |_| {
                let mut handle = handle.clone();
                handle.close();
            }),
        );

        assert_eq!(connection.emit("done", ""), 1);
        assert!(!connection.is_open());
    }
}
