//! Run with `wasm-pack test --headless --firefox crates/sse-bridge-web`.
#![cfg(target_arch = "wasm32")]

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Function, Object, Reflect};
use sse_bridge::{BridgeConfig, Extension, Host, LifecycleSignal, SseBridge};
use sse_bridge_web::{BrowserElement, BrowserHost, BrowserTransport, WebBridge, define_extension};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_test::*;
use web_sys::{CustomEvent, EventSource, MessageEvent, MessageEventInit};

wasm_bindgen_test_configure!(run_in_browser);

/// Stand-in for the internal API htmx passes to extensions.
fn fake_htmx_api() -> JsValue {
    let api = Object::new();
    let get_internal_data = Function::new_with_args(
        "elt",
        "return elt['htmx-internal-data'] || (elt['htmx-internal-data'] = {});",
    );
    Reflect::set(&api, &"getInternalData".into(), &get_internal_data).unwrap();
    api.into()
}

fn document() -> web_sys::Document {
    web_sys::window().unwrap().document().unwrap()
}

fn attached_div(attributes: &[(&str, &str)]) -> web_sys::Element {
    let div = document().create_element("div").unwrap();
    for (name, value) in attributes {
        div.set_attribute(name, value).unwrap();
    }
    document().body().unwrap().append_child(&div).unwrap();
    div
}

fn bridge() -> WebBridge {
    SseBridge::init(
        BrowserHost::new(fake_htmx_api()),
        BrowserTransport::new(false),
        BridgeConfig::default(),
    )
}

fn bound_source(bridge: &WebBridge, element: &BrowserElement) -> Option<EventSource> {
    bridge.host().with_state(element, |state| {
        state
            .connection
            .as_ref()
            .map(|bound| bound.connection.source().clone())
    })
}

/// Collect `(type, data)` of every `name` event reaching `target`.
fn record(target: &web_sys::EventTarget, name: &str) -> Rc<RefCell<Vec<(String, String)>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let listener = Closure::wrap(Box::new(move |event: web_sys::Event| {
        let detail = event.unchecked_into::<CustomEvent>().detail();
        let field = |name: &str| {
            Reflect::get(&detail, &name.into())
                .ok()
                .and_then(|value| value.as_string())
                .unwrap_or_default()
        };
        sink.borrow_mut().push((field("type"), field("data")));
    }) as Box<dyn FnMut(web_sys::Event)>);
    target
        .add_event_listener_with_callback(name, listener.as_ref().unchecked_ref())
        .unwrap();
    listener.forget();
    seen
}

fn server_message(source: &EventSource, event_type: &str, data: &str) {
    let init = MessageEventInit::new();
    init.set_data(&JsValue::from_str(data));
    let event = MessageEvent::new_with_event_init_dict(event_type, &init).unwrap();
    source.dispatch_event(&event).unwrap();
}

#[wasm_bindgen_test]
fn processing_binds_event_source() {
    let bridge = bridge();
    let element = BrowserElement::new(attached_div(&[("sse-connect", "/events")]));

    bridge.on_signal(LifecycleSignal::AfterProcessNode(element.clone()));

    let source = bound_source(&bridge, &element).unwrap();
    assert!(source.url().ends_with("/events"));
    assert_eq!(bridge.host().tracked_elements(), 1);
}

#[wasm_bindgen_test]
fn subscribed_events_bubble_as_custom_events() {
    let bridge = bridge();
    let div = attached_div(&[("sse-connect", "/events"), ("sse-swap", "progress, done")]);
    let seen = record(&document().body().unwrap(), "sse:progress");
    let element = BrowserElement::new(div);

    bridge.on_signal(LifecycleSignal::AfterProcessNode(element.clone()));
    let source = bound_source(&bridge, &element).unwrap();
    server_message(&source, "progress", "42");
    server_message(&source, "unrelated", "0");

    assert_eq!(
        *seen.borrow(),
        [("progress".to_string(), "42".to_string())]
    );
}

#[wasm_bindgen_test]
fn cleanup_closes_event_source() {
    let bridge = bridge();
    let element = BrowserElement::new(attached_div(&[("sse-connect", "/events")]));
    bridge.on_signal(LifecycleSignal::AfterProcessNode(element.clone()));
    let source = bound_source(&bridge, &element).unwrap();

    bridge.on_signal(LifecycleSignal::BeforeCleanupElement(element.clone()));

    assert_eq!(source.ready_state(), EventSource::CLOSED);
    assert!(!bridge.is_bound(&element));
    assert_eq!(bridge.host().tracked_elements(), 0);
}

#[wasm_bindgen_test]
fn reprocessing_closes_previous_source() {
    let bridge = bridge();
    let element = BrowserElement::new(attached_div(&[("sse-connect", "/events/a")]));
    bridge.on_signal(LifecycleSignal::AfterProcessNode(element.clone()));
    let first = bound_source(&bridge, &element).unwrap();

    element.raw().set_attribute("sse-connect", "/events/b").unwrap();
    bridge.on_signal(LifecycleSignal::AfterProcessNode(element.clone()));
    let second = bound_source(&bridge, &element).unwrap();

    assert_eq!(first.ready_state(), EventSource::CLOSED);
    assert!(second.url().ends_with("/events/b"));
}

#[wasm_bindgen_test]
fn registers_with_global_htmx() {
    let registered = Object::new();
    let htmx = Object::new();
    let define = Function::new_with_args("name, ext", "this.registered[name] = ext;");
    Reflect::set(&htmx, &"registered".into(), &registered).unwrap();
    Reflect::set(&htmx, &"defineExtension".into(), &define).unwrap();
    Reflect::set(&js_sys::global(), &"htmx".into(), &htmx).unwrap();

    define_extension(BridgeConfig::default()).unwrap();

    let extension = Reflect::get(&registered, &"sse".into()).unwrap();
    let init: Function = Reflect::get(&extension, &"init".into()).unwrap().unchecked_into();
    let on_event: Function = Reflect::get(&extension, &"onEvent".into()).unwrap().unchecked_into();

    let api = fake_htmx_api();
    init.call1(&extension, &api).unwrap();

    let div = attached_div(&[("sse-connect", "/events")]);
    let detail = Object::new();
    Reflect::set(&detail, &"elt".into(), &div).unwrap();
    let event = Object::new();
    Reflect::set(&event, &"detail".into(), &detail).unwrap();
    on_event
        .call2(&extension, &"htmx:afterProcessNode".into(), &event)
        .unwrap();

    let internal = Reflect::get(&div, &"htmx-internal-data".into()).unwrap();
    assert!(Reflect::get(&internal, &"sseBridgeKey".into()).unwrap().is_string());

    on_event
        .call2(&extension, &"htmx:beforeCleanupElement".into(), &event)
        .unwrap();
    assert!(Reflect::get(&internal, &"sseBridgeKey".into()).unwrap().is_undefined());
}
