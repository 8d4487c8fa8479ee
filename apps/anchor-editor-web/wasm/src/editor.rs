//! Browser-facing editor session
//!
//! Thin wrapper around [`EditorSession`]. Arguments arrive as primitives or
//! JSON strings, results go back as JSON strings.

use anchor_editor_core::{
    Anchor, AnchorKind, DocumentId, DraftKey, EditorConfig, EditorEvent, EditorSession, Key,
    PageLayout, PageSize, PixelRect, Point, Signer, SignerId, ToolMode, Transition,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;
use wasm_bindgen::prelude::*;

fn js_err(e: impl Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn parse_json<T: DeserializeOwned>(json: &str, what: &str) -> Result<T, String> {
    serde_json::from_str(json).map_err(|e| format!("Failed to parse {}: {}", what, e))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Serialization error: {}", e))
}

fn parse_kind(kind: &str) -> Result<AnchorKind, String> {
    kind.parse::<AnchorKind>().map_err(|e| e.to_string())
}

fn parse_tool(tool: &str) -> Result<ToolMode, String> {
    match tool.trim().to_lowercase().as_str() {
        "draw" => Ok(ToolMode::Draw),
        "select" => Ok(ToolMode::Select),
        other => Err(format!("Unknown tool: {}", other)),
    }
}

/// Parse an optional JSON config, falling back to defaults
fn parse_config(config_json: Option<&str>) -> Result<EditorConfig, String> {
    let Some(json) = config_json.filter(|s| !s.trim().is_empty()) else {
        return Ok(EditorConfig::default());
    };
    let config: EditorConfig = parse_json(json, "config")?;
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn build_session(
    document_id: &str,
    page_count: u32,
    page_width: f64,
    page_height: f64,
    signers_json: &str,
    anchors_json: &str,
    config_json: Option<&str>,
) -> Result<EditorSession, String> {
    let signers: Vec<Signer> = parse_json(signers_json, "signers")?;
    let anchors: Vec<Anchor> = parse_json(anchors_json, "anchors")?;
    let config = parse_config(config_json)?;
    let layout = PageLayout {
        page_count,
        page_size: PageSize::new(page_width, page_height),
    };

    EditorSession::open(DocumentId::new(document_id), layout, signers, anchors, config)
        .map_err(|e| e.to_string())
}

fn finish_save(
    session: &mut EditorSession,
    succeeded: bool,
    stored_json: Option<&str>,
) -> Result<(), String> {
    match stored_json.filter(|_| succeeded) {
        Some(json) => {
            let stored: Vec<Anchor> = parse_json(json, "saved anchors")?;
            session.complete_save(&stored).map_err(|e| e.to_string())
        }
        None => session.finish_save(succeeded).map_err(|e| e.to_string()),
    }
}

/// Anchor editor for one document
#[wasm_bindgen]
pub struct AnchorEditor {
    session: EditorSession,
}

#[wasm_bindgen]
impl AnchorEditor {
    /// Open an editor from data the host already fetched.
    ///
    /// `signers_json` is `[{id, displayName, status?}]` in display order and
    /// `anchors_json` is the stored anchor list.
    #[wasm_bindgen(constructor)]
    pub fn new(
        document_id: &str,
        page_count: u32,
        page_width: f64,
        page_height: f64,
        signers_json: &str,
        anchors_json: &str,
        config_json: Option<String>,
    ) -> Result<AnchorEditor, JsValue> {
        let session = build_session(
            document_id,
            page_count,
            page_width,
            page_height,
            signers_json,
            anchors_json,
            config_json.as_deref(),
        )
        .map_err(js_err)?;
        Ok(AnchorEditor { session })
    }

    fn dispatch(&mut self, event: EditorEvent) -> Result<String, JsValue> {
        let transition: Transition = self.session.dispatch(event);
        to_json(&transition).map_err(js_err)
    }

    // ========================================================================
    // Input
    // ========================================================================

    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, x: f64, y: f64) -> Result<String, JsValue> {
        self.dispatch(EditorEvent::PointerDown {
            point: Point::new(x, y),
        })
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, x: f64, y: f64) -> Result<String, JsValue> {
        self.dispatch(EditorEvent::PointerMove {
            point: Point::new(x, y),
        })
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self, x: f64, y: f64) -> Result<String, JsValue> {
        self.dispatch(EditorEvent::PointerUp {
            point: Point::new(x, y),
        })
    }

    /// Forward a `KeyboardEvent.key` value
    #[wasm_bindgen(js_name = keyDown)]
    pub fn key_down(&mut self, key: &str) -> Result<String, JsValue> {
        self.dispatch(EditorEvent::KeyDown {
            key: Key::from_dom(key),
        })
    }

    /// Dispatch an event given as JSON, e.g. `{"type":"pointer_down","point":{"x":1,"y":2}}`
    #[wasm_bindgen(js_name = dispatchJson)]
    pub fn dispatch_json(&mut self, event_json: &str) -> Result<String, JsValue> {
        let event: EditorEvent = parse_json(event_json, "event").map_err(js_err)?;
        self.dispatch(event)
    }

    /// CSS cursor for a screen position
    #[wasm_bindgen(js_name = cursorAt)]
    pub fn cursor_at(&self, x: f64, y: f64) -> String {
        self.session
            .machine()
            .hit_test(Point::new(x, y))
            .map(|hit| hit.cursor())
            .unwrap_or("crosshair")
            .to_string()
    }

    // ========================================================================
    // Pages and viewport
    // ========================================================================

    #[wasm_bindgen(js_name = changePage)]
    pub fn change_page(&mut self, page: u32) -> Result<u32, JsValue> {
        self.session.change_page(page).map_err(js_err)
    }

    #[wasm_bindgen(js_name = nextPage)]
    pub fn next_page(&mut self) -> Result<u32, JsValue> {
        self.session.next_page().map_err(js_err)
    }

    #[wasm_bindgen(js_name = previousPage)]
    pub fn previous_page(&mut self) -> Result<u32, JsValue> {
        self.session.previous_page().map_err(js_err)
    }

    #[wasm_bindgen(js_name = setZoom)]
    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        self.session.set_zoom(zoom)
    }

    #[wasm_bindgen(js_name = zoomIn)]
    pub fn zoom_in(&mut self) -> f64 {
        self.session.zoom_in()
    }

    #[wasm_bindgen(js_name = zoomOut)]
    pub fn zoom_out(&mut self) -> f64 {
        self.session.zoom_out()
    }

    #[wasm_bindgen(js_name = resetZoom)]
    pub fn reset_zoom(&mut self) -> f64 {
        self.session.reset_zoom()
    }

    #[wasm_bindgen(js_name = fitToWidth)]
    pub fn fit_to_width(&mut self, available_px: f64) -> f64 {
        self.session.fit_to_width(available_px)
    }

    /// Screen position of the page canvas's top-left corner
    #[wasm_bindgen(js_name = setCanvasOrigin)]
    pub fn set_canvas_origin(&mut self, x: f64, y: f64) {
        self.session.set_canvas_origin(Point::new(x, y));
    }

    // ========================================================================
    // Anchors
    // ========================================================================

    #[wasm_bindgen(js_name = setActiveSigner)]
    pub fn set_active_signer(&mut self, signer_id: Option<u32>) -> Result<(), JsValue> {
        let signer = signer_id.map(|id| SignerId(u64::from(id)));
        self.session.set_active_signer(signer).map_err(js_err)
    }

    /// `assinatura` / `rubrica` (or `signature` / `initials`)
    #[wasm_bindgen(js_name = setActiveKind)]
    pub fn set_active_kind(&mut self, kind: &str) -> Result<(), JsValue> {
        let kind = parse_kind(kind).map_err(js_err)?;
        self.session.set_active_kind(kind);
        Ok(())
    }

    #[wasm_bindgen(js_name = setTool)]
    pub fn set_tool(&mut self, tool: &str) -> Result<(), JsValue> {
        let tool = parse_tool(tool).map_err(js_err)?;
        self.session.set_tool(tool).map_err(js_err)
    }

    /// Drop an anchor from the palette at a screen position
    #[wasm_bindgen(js_name = placeAnchor)]
    pub fn place_anchor(&mut self, x: f64, y: f64, kind: &str) -> Result<u64, JsValue> {
        let kind = parse_kind(kind).map_err(js_err)?;
        let canvas = self.session.machine().to_canvas(Point::new(x, y));
        let key = self.session.place_anchor(canvas, kind).map_err(js_err)?;
        Ok(key.0)
    }

    pub fn duplicate(&mut self, key: u64) -> Result<u64, JsValue> {
        let copy = self.session.duplicate(DraftKey(key)).map_err(js_err)?;
        Ok(copy.0)
    }

    #[wasm_bindgen(js_name = deleteAnchor)]
    pub fn delete_anchor(&mut self, key: u64) -> Result<(), JsValue> {
        self.session.delete(DraftKey(key)).map_err(js_err)
    }

    pub fn select(&mut self, key: u64) -> Result<(), JsValue> {
        self.session.select(DraftKey(key)).map_err(js_err)
    }

    #[wasm_bindgen(js_name = clearSelection)]
    pub fn clear_selection(&mut self) -> Result<(), JsValue> {
        self.session.clear_selection().map_err(js_err)
    }

    #[wasm_bindgen(js_name = reassignSigner)]
    pub fn reassign_signer(&mut self, key: u64, signer_id: u32) -> Result<(), JsValue> {
        self.session
            .reassign_signer(DraftKey(key), SignerId(u64::from(signer_id)))
            .map_err(js_err)
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Every draft as JSON `DraftView`s
    #[wasm_bindgen(js_name = getDrafts)]
    pub fn get_drafts(&self) -> Result<String, JsValue> {
        to_json(&self.session.draft_views()).map_err(js_err)
    }

    /// Drafts on the current page as JSON `DraftView`s
    #[wasm_bindgen(js_name = getPageDrafts)]
    pub fn get_page_drafts(&self) -> Result<String, JsValue> {
        to_json(&self.session.page_views()).map_err(js_err)
    }

    /// Rectangle being drawn in display pixels, as JSON, if any
    #[wasm_bindgen(js_name = drawPreview)]
    pub fn draw_preview(&self) -> Result<Option<String>, JsValue> {
        self.session
            .machine()
            .draw_preview()
            .map(|rect| to_json(&rect))
            .transpose()
            .map_err(js_err)
    }

    #[wasm_bindgen(js_name = colorForSigner)]
    pub fn color_for_signer(&self, signer_id: Option<u32>) -> String {
        self.session
            .color_for_signer(signer_id.map(|id| SignerId(u64::from(id))))
            .to_hex()
    }

    /// Overflow estimate for text in a field of the given canvas size
    #[wasm_bindgen(js_name = checkOverflow)]
    pub fn check_overflow(
        &self,
        text: &str,
        width: f64,
        height: f64,
        font_size_pt: Option<f64>,
    ) -> Result<String, JsValue> {
        let field = PixelRect::new(0.0, 0.0, width, height);
        to_json(&self.session.check_overflow(text, field, font_size_pt)).map_err(js_err)
    }

    // ========================================================================
    // Save
    // ========================================================================

    /// Validate and lock input. Returns the anchor list to persist as JSON.
    #[wasm_bindgen(js_name = beginSave)]
    pub fn begin_save(&mut self) -> Result<String, JsValue> {
        let anchors = self.session.begin_save().map_err(js_err)?;
        to_json(&anchors).map_err(js_err)
    }

    /// Unlock input once the host's save request has settled. On success
    /// pass the stored anchor list so drafts pick up their new ids.
    #[wasm_bindgen(js_name = finishSave)]
    pub fn finish_save(
        &mut self,
        succeeded: bool,
        stored_json: Option<String>,
    ) -> Result<(), JsValue> {
        finish_save(&mut self.session, succeeded, stored_json.as_deref()).map_err(js_err)
    }

    // ========================================================================
    // State
    // ========================================================================

    #[wasm_bindgen(getter, js_name = currentPage)]
    pub fn current_page(&self) -> u32 {
        self.session.current_page()
    }

    #[wasm_bindgen(getter, js_name = pageCount)]
    pub fn page_count(&self) -> u32 {
        self.session.page_count()
    }

    #[wasm_bindgen(getter)]
    pub fn zoom(&self) -> f64 {
        self.session.zoom()
    }

    #[wasm_bindgen(getter, js_name = isDirty)]
    pub fn is_dirty(&self) -> bool {
        self.session.is_dirty()
    }

    #[wasm_bindgen(getter, js_name = isSaving)]
    pub fn is_saving(&self) -> bool {
        self.session.is_saving()
    }

    /// Current gesture state, e.g. `idle` or `dragging`
    #[wasm_bindgen(getter)]
    pub fn state(&self) -> String {
        serde_json::to_value(self.session.machine().state())
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default()
    }
}
