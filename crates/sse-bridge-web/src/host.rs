//! Per-element private state through htmx's internal data.
//!
//! htmx hands extensions its internal API in `init`. `getInternalData(elt)`
//! returns the element's private data object; the bridge keeps a ULID key
//! there and the Rust-side state in a side-table under that key.

use std::cell::RefCell;
use std::collections::HashMap;

use js_sys::{Function, Reflect};
use log::warn;
use sse_bridge::{ElementState, Host};
use ulid::Ulid;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::element::BrowserElement;

const STATE_KEY_PROPERTY: &str = "sseBridgeKey";

pub struct BrowserHost<C> {
    api: JsValue,
    states: RefCell<HashMap<String, ElementState<C>>>,
}

impl<C> BrowserHost<C> {
    /// `api` is the internal API object htmx passes to `init`.
    pub fn new(api: JsValue) -> Self {
        Self {
            api,
            states: RefCell::new(HashMap::new()),
        }
    }

    pub fn tracked_elements(&self) -> usize {
        self.states.borrow().len()
    }

    fn internal_data(&self, element: &BrowserElement) -> Option<JsValue> {
        let get_internal_data = Reflect::get(&self.api, &JsValue::from_str("getInternalData"))
            .ok()?
            .dyn_into::<Function>()
            .ok()?;
        let data = get_internal_data.call1(&self.api, element.raw()).ok()?;
        data.is_object().then_some(data)
    }

    fn state_key(&self, element: &BrowserElement) -> Option<String> {
        let data = self.internal_data(element)?;
        let property = JsValue::from_str(STATE_KEY_PROPERTY);
        if let Some(key) = Reflect::get(&data, &property).ok().and_then(|key| key.as_string()) {
            return Some(key);
        }
        let key = Ulid::new().to_string();
        Reflect::set(&data, &property, &JsValue::from_str(&key)).ok()?;
        Some(key)
    }
}

impl<C> Host<C> for BrowserHost<C> {
    type Element = BrowserElement;

    fn with_state<R>(
        &self,
        element: &BrowserElement,
        f: impl FnOnce(&mut ElementState<C>) -> R,
    ) -> R {
        let Some(key) = self.state_key(element) else {
            warn!("htmx internal data unavailable, element state is not kept");
            return f(&mut ElementState::default());
        };
        let mut states = self.states.borrow_mut();
        let state = states.entry(key.clone()).or_default();
        let result = f(state);
        if !state.is_bound() {
            states.remove(&key);
        }
        result
    }

    fn discard_state(&self, element: &BrowserElement) {
        let Some(data) = self.internal_data(element) else {
            return;
        };
        let property = JsValue::from_str(STATE_KEY_PROPERTY);
        if let Some(key) = Reflect::get(&data, &property).ok().and_then(|key| key.as_string()) {
            self.states.borrow_mut().remove(&key);
            let _ = Reflect::delete_property(data.unchecked_ref(), &property);
        }
    }
}
