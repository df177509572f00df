//! Registration with the global `htmx` object.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Function, Object, Reflect};
use log::{debug, info};
use sse_bridge::{BridgeConfig, BridgeError, Extension, SseBridge};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::console;
use crate::element::BrowserElement;
use crate::host::BrowserHost;
use crate::transport::{BrowserConnection, BrowserTransport, describe};

pub type WebBridge = SseBridge<BrowserHost<BrowserConnection>, BrowserTransport>;

pub const CONFIG_META_NAME: &str = "sse-bridge-config";

/// Register the extension with htmx.
///
/// `config_json` overrides the `<meta name="sse-bridge-config" content="{..}">`
/// tag; without either the stock `sse` setup is used.
#[wasm_bindgen(js_name = defineSseExtension)]
pub fn define_sse_extension(config_json: Option<String>) -> Result<(), JsValue> {
    let config = match config_json {
        Some(json) => BridgeConfig::from_json(&json),
        None => config_from_meta(),
    }
    .map_err(to_js_error)?;
    console::init(config.level_filter());
    define_extension(config).map_err(to_js_error)
}

/// Build the extension object (`init`, `onEvent`) and hand it to
/// `htmx.defineExtension`.
///
/// The bridge is created when htmx calls `init` with its internal API;
/// lifecycle events arriving before that are ignored.
pub fn define_extension(config: BridgeConfig) -> Result<(), BridgeError> {
    let htmx = Reflect::get(&js_sys::global(), &JsValue::from_str("htmx"))
        .ok()
        .filter(|htmx| htmx.is_object())
        .ok_or_else(|| BridgeError::HostUnavailable("global `htmx` not found".to_string()))?;
    let define = Reflect::get(&htmx, &JsValue::from_str("defineExtension"))
        .ok()
        .and_then(|define| define.dyn_into::<Function>().ok())
        .ok_or_else(|| {
            BridgeError::HostUnavailable("`htmx.defineExtension` is not a function".to_string())
        })?;

    let bridge: Rc<RefCell<Option<WebBridge>>> = Rc::default();

    let init = {
        let bridge = bridge.clone();
        let config = config.clone();
        Closure::wrap(Box::new(move |api: JsValue| {
            let transport = BrowserTransport::new(config.with_credentials);
            *bridge.borrow_mut() = Some(SseBridge::init(
                BrowserHost::new(api),
                transport,
                config.clone(),
            ));
            debug!("Extension '{}' initialized", config.extension_name);
        }) as Box<dyn FnMut(JsValue)>)
    };

    let on_event = {
        let bridge = bridge.clone();
        Closure::wrap(Box::new(move |name: String, event: JsValue| {
            let Some(element) = event_element(&event) else {
                return;
            };
            let bridge = bridge.borrow();
            if let Some(bridge) = bridge.as_ref() {
                bridge.on_host_event(&name, BrowserElement::new(element));
            }
        }) as Box<dyn FnMut(String, JsValue)>)
    };

    let extension = Object::new();
    set_property(&extension, "init", init.as_ref())?;
    set_property(&extension, "onEvent", on_event.as_ref())?;

    define
        .call2(&htmx, &JsValue::from_str(&config.extension_name), &extension)
        .map_err(|error| BridgeError::HostUnavailable(describe(&error)))?;

    // htmx keeps the extension for the lifetime of the page.
    init.forget();
    on_event.forget();

    info!("Registered htmx extension '{}'", config.extension_name);
    Ok(())
}

fn config_from_meta() -> Result<BridgeConfig, BridgeError> {
    let Some(document) = web_sys::window().and_then(|window| window.document()) else {
        return Ok(BridgeConfig::default());
    };
    let selector = format!(r#"meta[name="{CONFIG_META_NAME}"]"#);
    match document.query_selector(&selector) {
        Ok(Some(meta)) => match meta.get_attribute("content") {
            Some(content) => BridgeConfig::from_json(&content),
            None => Ok(BridgeConfig::default()),
        },
        _ => Ok(BridgeConfig::default()),
    }
}

/// `evt.detail.elt` of an htmx event.
fn event_element(event: &JsValue) -> Option<web_sys::Element> {
    let detail = Reflect::get(event, &JsValue::from_str("detail")).ok()?;
    Reflect::get(&detail, &JsValue::from_str("elt"))
        .ok()?
        .dyn_into::<web_sys::Element>()
        .ok()
}

fn set_property(target: &Object, name: &str, value: &JsValue) -> Result<(), BridgeError> {
    Reflect::set(target, &JsValue::from_str(name), value)
        .map(|_| ())
        .map_err(|error| BridgeError::HostUnavailable(describe(&error)))
}

fn to_js_error(error: BridgeError) -> JsValue {
    js_sys::Error::new(&error.to_string()).into()
}
