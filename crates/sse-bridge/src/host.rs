//! The host seam: elements and their private state slot.

use crate::event::BridgeEvent;
use crate::subscription::SubscriptionList;
use crate::transport::ConnectionId;

/// A DOM element as seen by the bridge.
pub trait Element: Clone + 'static {
    fn attribute(&self, name: &str) -> Option<String>;

    /// Dispatch a synthetic event on this element. With `event.bubbles` set,
    /// ancestors observe it too.
    fn dispatch(&self, event: BridgeEvent);
}

/// The host library's per-element private data, as used by the bridge.
///
/// Storage is the host's business; the bridge only goes through these
/// accessors.
pub trait Host<C> {
    type Element: Element;

    fn with_state<R>(
        &self,
        element: &Self::Element,
        f: impl FnOnce(&mut ElementState<C>) -> R,
    ) -> R;

    /// Drop whatever the slot holds for `element`.
    fn discard_state(&self, element: &Self::Element);
}

/// Bridge-owned part of an element's private data.
#[derive(Debug)]
pub struct ElementState<C> {
    pub connection: Option<BoundConnection<C>>,
}

impl<C> Default for ElementState<C> {
    fn default() -> Self {
        Self { connection: None }
    }
}

impl<C> ElementState<C> {
    pub fn is_bound(&self) -> bool {
        self.connection.is_some()
    }
}

/// The connection currently bound to an element.
#[derive(Debug)]
pub struct BoundConnection<C> {
    pub id: ConnectionId,
    pub url: String,
    pub subscriptions: SubscriptionList,
    pub connection: C,
}
