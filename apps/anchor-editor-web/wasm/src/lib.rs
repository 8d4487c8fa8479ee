//! WASM bindings for the anchor editor
//!
//! All editing state lives in Rust inside [`AnchorEditor`]. JavaScript
//! forwards pointer and key events, renders the returned draft views and
//! performs the network round-trips for loading and saving.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { AnchorEditor } from './pkg/anchor_editor_wasm.js';
//!
//! await init();
//!
//! const editor = new AnchorEditor("doc-1", pageCount, 540, 765, signersJson, anchorsJson, null);
//! canvas.onpointerdown = (e) => render(editor.pointerDown(e.clientX, e.clientY));
//!
//! const anchors = editor.beginSave();
//! try {
//!     const stored = await api.saveAnchors("doc-1", anchors);
//!     editor.finishSave(true, JSON.stringify(stored));
//! } catch (e) {
//!     editor.finishSave(false);
//! }
//! ```

pub mod editor;

use wasm_bindgen::prelude::*;

pub use editor::AnchorEditor;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Get the library version
#[wasm_bindgen(js_name = getVersion)]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Estimated rendered height of `text` in a field of the given width
#[wasm_bindgen(js_name = estimateTextHeight)]
pub fn estimate_text_height(text: &str, field_width_px: f64, font_size_pt: f64) -> f64 {
    anchor_editor_core::text_height::estimate(text, field_width_px, font_size_pt)
}
