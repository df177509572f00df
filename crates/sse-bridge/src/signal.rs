//! Host lifecycle signals the bridge reacts to.

pub const AFTER_PROCESS_NODE: &str = "htmx:afterProcessNode";
pub const BEFORE_CLEANUP_ELEMENT: &str = "htmx:beforeCleanupElement";

/// A lifecycle notification emitted by the host for one element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LifecycleSignal<E> {
    /// The element entered the processed tree (or was processed again).
    AfterProcessNode(E),
    /// The element is about to be removed from the processed tree.
    BeforeCleanupElement(E),
}

impl<E> LifecycleSignal<E> {
    /// Map a host event name onto a signal. Names the bridge does not care
    /// about return `None`.
    pub fn from_host_event(name: &str, element: E) -> Option<Self> {
        match name {
            AFTER_PROCESS_NODE => Some(Self::AfterProcessNode(element)),
            BEFORE_CLEANUP_ELEMENT => Some(Self::BeforeCleanupElement(element)),
            _ => None,
        }
    }

    pub fn host_event_name(&self) -> &'static str {
        match self {
            Self::AfterProcessNode(_) => AFTER_PROCESS_NODE,
            Self::BeforeCleanupElement(_) => BEFORE_CLEANUP_ELEMENT,
        }
    }

    pub fn element(&self) -> &E {
        match self {
            Self::AfterProcessNode(element) | Self::BeforeCleanupElement(element) => element,
        }
    }
}
