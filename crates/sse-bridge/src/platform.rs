//! Platform implementations of the host and transport seams.
//!
//! The browser platform lives in the `sse-bridge-web` crate.

pub mod headless;
