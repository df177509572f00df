//! Events flowing through the bridge: what the transport delivers and what
//! gets dispatched on the element.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// An event received on an event source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerEvent {
    /// Event type; `"message"` for events sent without an `event:` field.
    pub event_type: String,
    /// Raw data payload.
    pub data: String,
    pub last_event_id: Option<String>,
}

impl ServerEvent {
    pub fn new(event_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            data: data.into(),
            last_event_id: None,
        }
    }

    pub fn with_last_event_id(mut self, id: impl Into<String>) -> Self {
        self.last_event_id = Some(id.into());
        self
    }
}

/// `detail` of a dispatched `sse:*` event: `{ type, data }`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SseDetail {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: String,
}

impl SseDetail {
    /// Decode the raw data as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.data)
    }
}

/// A synthetic DOM event to dispatch on a bound element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BridgeEvent {
    pub name: String,
    pub detail: SseDetail,
    pub bubbles: bool,
}

impl BridgeEvent {
    /// Event for a subscribed name. The subscribed name, not the event type
    /// reported by the transport, goes into both the event name and the detail.
    pub fn for_subscription(prefix: &str, subscription: &str, event: &ServerEvent) -> Self {
        Self {
            name: format!("{prefix}{subscription}"),
            detail: SseDetail {
                event_type: subscription.to_string(),
                data: event.data.clone(),
            },
            bubbles: true,
        }
    }
}
