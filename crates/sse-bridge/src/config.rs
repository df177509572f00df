//! Bridge configuration.
//!
//! Every field has a default matching the stock htmx SSE extension, so an
//! empty JSON object (or no config at all) gives the usual behavior.

use serde::{Deserialize, Serialize};

use crate::error::BridgeError;

pub const DEFAULT_EXTENSION_NAME: &str = "sse";
pub const DEFAULT_CONNECT_ATTRIBUTE: &str = "sse-connect";
pub const DEFAULT_SWAP_ATTRIBUTE: &str = "sse-swap";
pub const DEFAULT_EVENT_PREFIX: &str = "sse:";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Name the extension is registered under (`hx-ext="sse"`).
    pub extension_name: String,
    /// Attribute holding the event source URL.
    pub connect_attribute: String,
    /// Attribute holding the comma-separated event names to re-dispatch.
    pub swap_attribute: String,
    /// Prepended to every re-dispatched event name.
    pub event_prefix: String,
    /// Send cookies with cross-origin event source requests.
    pub with_credentials: bool,
    /// Maximum log level for platform loggers (`off`, `error`, .. `trace`).
    pub log_level: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            extension_name: DEFAULT_EXTENSION_NAME.to_string(),
            connect_attribute: DEFAULT_CONNECT_ATTRIBUTE.to_string(),
            swap_attribute: DEFAULT_SWAP_ATTRIBUTE.to_string(),
            event_prefix: DEFAULT_EVENT_PREFIX.to_string(),
            with_credentials: false,
            log_level: "info".to_string(),
        }
    }
}

impl BridgeConfig {
    pub fn from_json(json: &str) -> Result<Self, BridgeError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Name of the DOM event dispatched for a subscribed server event.
    pub fn dom_event_name(&self, event_name: &str) -> String {
        format!("{}{}", self.event_prefix, event_name)
    }

    pub fn level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config = BridgeConfig::from_json("{}").unwrap();
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(config.connect_attribute, "sse-connect");
        assert_eq!(config.swap_attribute, "sse-swap");
    }

    #[test]
    fn partial_override() {
        let config =
            BridgeConfig::from_json(r#"{"eventPrefix":"stream:","withCredentials":true}"#).unwrap();
        assert_eq!(config.dom_event_name("done"), "stream:done");
        assert!(config.with_credentials);
        assert_eq!(config.extension_name, "sse");
    }

    #[test]
    fn malformed_json_is_config_error() {
        assert!(matches!(
            BridgeConfig::from_json("not json"),
            Err(BridgeError::Config(_))
        ));
    }

    #[test]
    fn unknown_log_level_falls_back_to_info() {
        let config = BridgeConfig {
            log_level: "chatty".to_string(),
            ..BridgeConfig::default()
        };
        assert_eq!(config.level_filter(), log::LevelFilter::Info);

        let config = BridgeConfig {
            log_level: "trace".to_string(),
            ..BridgeConfig::default()
        };
        assert_eq!(config.level_filter(), log::LevelFilter::Trace);
    }
}
