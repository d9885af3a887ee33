//! Canvas rendering module
//!
//! Draws a `RenderSnapshot` with the 2D canvas API. Layout math is plain
//! Rust so pointer hit-testing works (and is tested) off the browser.

pub mod layout;

#[cfg(target_arch = "wasm32")]
mod canvas;

#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasRenderer;
