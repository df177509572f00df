//! Shared setup for the headless bridge tests.

use sse_bridge::platform::headless::{
    HeadlessDocument, HeadlessElement, HeadlessHost, ScriptedConnection, ScriptedTransport,
};
use sse_bridge::{BridgeConfig, Extension, LifecycleSignal, SseBridge};

pub type TestBridge = SseBridge<HeadlessHost<ScriptedConnection>, ScriptedTransport>;

pub struct Page {
    pub document: HeadlessDocument,
    pub body: HeadlessElement,
    pub bridge: TestBridge,
}

impl Page {
    pub fn new() -> Self {
        Self::with_config(BridgeConfig::default())
    }

    pub fn with_config(config: BridgeConfig) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let document = HeadlessDocument::new();
        let body = document.create_element("body");
        let bridge = SseBridge::init(HeadlessHost::new(), ScriptedTransport::new(), config);
        Self {
            document,
            body,
            bridge,
        }
    }

    /// A `<div>` under `<body>` with the given attributes.
    pub fn div(&self, attributes: &[(&str, &str)]) -> HeadlessElement {
        let div = self.document.create_element("div");
        for (name, value) in attributes {
            div.set_attribute(name, value);
        }
        self.body.append_child(&div);
        div
    }

    pub fn process(&self, element: &HeadlessElement) {
        self.bridge
            .on_signal(LifecycleSignal::AfterProcessNode(element.clone()));
    }

    pub fn cleanup(&self, element: &HeadlessElement) {
        self.bridge
            .on_signal(LifecycleSignal::BeforeCleanupElement(element.clone()));
    }

    pub fn transport(&self) -> &ScriptedTransport {
        self.bridge.transport()
    }
}
