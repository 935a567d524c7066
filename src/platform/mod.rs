//! Platform abstraction layer
//!
//! Browser glue lives in `web` (wasm32 only). Native hosts link the library
//! directly and implement `sim::World` themselves.

#[cfg(target_arch = "wasm32")]
pub mod web;
