//! Browser platform for `sse-bridge`.
//!
//! Load the wasm module after htmx and call `defineSseExtension()`; elements
//! opt in with `hx-ext="sse"` and `sse-connect` / `sse-swap` attributes:
//!
//! ```html
//! <div hx-ext="sse" sse-connect="/api/events" sse-swap="scan_progress, scan_complete"
//!      x-on:sse:scan_progress="progress = JSON.parse($event.detail.data)">
//! </div>
//! ```
//!
//! Everything here needs `wasm32`; on other targets the crate is empty.

#[cfg(target_arch = "wasm32")]
pub mod console;
#[cfg(target_arch = "wasm32")]
pub mod element;
#[cfg(target_arch = "wasm32")]
pub mod host;
#[cfg(target_arch = "wasm32")]
pub mod htmx;
#[cfg(target_arch = "wasm32")]
pub mod transport;

#[cfg(target_arch = "wasm32")]
pub use element::BrowserElement;
#[cfg(target_arch = "wasm32")]
pub use host::BrowserHost;
#[cfg(target_arch = "wasm32")]
pub use htmx::{WebBridge, define_extension, define_sse_extension};
#[cfg(target_arch = "wasm32")]
pub use transport::{BrowserConnection, BrowserTransport};
