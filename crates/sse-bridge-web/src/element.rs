use log::warn;
use sse_bridge::{BridgeEvent, Element};
use web_sys::{CustomEvent, CustomEventInit};

/// A live DOM element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrowserElement(web_sys::Element);

impl BrowserElement {
    pub fn new(element: web_sys::Element) -> Self {
        Self(element)
    }

    pub fn raw(&self) -> &web_sys::Element {
        &self.0
    }
}

impl From<web_sys::Element> for BrowserElement {
    fn from(element: web_sys::Element) -> Self {
        Self(element)
    }
}

impl Element for BrowserElement {
    fn attribute(&self, name: &str) -> Option<String> {
        self.0.get_attribute(name)
    }

    fn dispatch(&self, event: BridgeEvent) {
        let detail = match serde_wasm_bindgen::to_value(&event.detail) {
            Ok(detail) => detail,
            Err(error) => {
                warn!("Failed to convert detail of {}: {error}", event.name);
                return;
            }
        };
        let init = CustomEventInit::new();
        init.set_bubbles(event.bubbles);
        init.set_detail(&detail);
        match CustomEvent::new_with_event_init_dict(&event.name, &init) {
            Ok(custom_event) => {
                if let Err(error) = self.0.dispatch_event(&custom_event) {
                    warn!("Failed to dispatch {}: {error:?}", event.name);
                }
            }
            Err(error) => warn!("Failed to create {}: {error:?}", event.name),
        }
    }
}
