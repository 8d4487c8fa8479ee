//! Pointer-driven editing of anchor drafts
//!
//! [`InteractionMachine`] owns the drafts of one document together with the
//! view state (page, zoom, canvas origin, tool) and turns pointer and key
//! events into draft mutations through [`InteractionMachine::dispatch`].
//!
//! Normalized rectangles are the source of truth. Pointer positions arrive
//! in screen pixels, are converted to unscaled canvas pixels, clamped into
//! the page and re-normalized on every frame of a drag or resize, so the
//! cached display rectangle of a draft never disagrees with its anchor.

mod events;
mod handles;

pub use events::{EditorAction, EditorEvent, InteractionState, Key, Transition};
pub use handles::{hit_handle, resize_rect, ResizeHandle};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::anchor::{
    clamp_drawn_rect, clamp_position, normalize_within_page, Anchor, AnchorKind, PageGeometry,
};
use crate::config::{EditorConfig, ZoomConfig};
use crate::coords::{screen_to_canvas, NormalizedRect, PageSize, PixelRect, Point};
use crate::draft::{AnchorDraft, DraftKey, DraftSet};
use crate::signer::SignerId;

/// What a pointer-down on empty canvas does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolMode {
    /// Start drawing a new anchor
    #[default]
    Draw,
    /// Only clear the selection
    Select,
}

/// What lies under a pointer position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Handle { key: DraftKey, handle: ResizeHandle },
    Body { key: DraftKey },
}

impl HitTarget {
    pub fn key(&self) -> DraftKey {
        match self {
            HitTarget::Handle { key, .. } | HitTarget::Body { key } => *key,
        }
    }

    /// CSS cursor for hovering this target
    pub fn cursor(&self) -> &'static str {
        match self {
            HitTarget::Handle { handle, .. } => handle.cursor(),
            HitTarget::Body { .. } => "move",
        }
    }
}

/// Active gesture and the data needed to finish or undo it.
/// Points are canvas pixels unless noted.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Gesture {
    Idle,
    Drawing {
        start: Point,
        current: Point,
    },
    Selecting {
        key: DraftKey,
        /// Screen position of the pointer-down
        press: Point,
        grab_offset: Point,
        original: NormalizedRect,
    },
    Dragging {
        key: DraftKey,
        grab_offset: Point,
        original: NormalizedRect,
        was_dirty: bool,
    },
    Resizing {
        key: DraftKey,
        handle: ResizeHandle,
        press: Point,
        original_px: PixelRect,
        original: NormalizedRect,
        was_dirty: bool,
    },
}

impl Gesture {
    fn state(&self) -> InteractionState {
        match self {
            Gesture::Idle => InteractionState::Idle,
            Gesture::Drawing { .. } => InteractionState::Drawing,
            Gesture::Selecting { .. } => InteractionState::Selecting,
            Gesture::Dragging { .. } => InteractionState::Dragging,
            Gesture::Resizing { .. } => InteractionState::Resizing,
        }
    }
}

fn is_finite(p: Point) -> bool {
    p.x.is_finite() && p.y.is_finite()
}

/// Editing state machine for the anchors of one document
#[derive(Debug, Clone)]
pub struct InteractionMachine {
    geometry: PageGeometry,
    zoom_config: ZoomConfig,
    drag_threshold_px: f64,
    handle_hit_radius_px: f64,
    duplicate_offset_px: f64,
    drafts: DraftSet,
    gesture: Gesture,
    current_page: u32,
    zoom: f64,
    canvas_origin: Point,
    tool: ToolMode,
    active_kind: AnchorKind,
    active_signer: Option<SignerId>,
    dirty: bool,
}

impl InteractionMachine {
    /// Seed a machine with existing anchors, idle on page 1 at the default zoom
    pub fn new(config: &EditorConfig, geometry: PageGeometry, anchors: Vec<Anchor>) -> Self {
        let zoom = config.clamp_zoom(config.zoom.default);
        let display = geometry.page_size.scaled(zoom);
        let mut drafts = DraftSet::new();
        for anchor in anchors {
            drafts.insert(anchor, display);
        }

        Self {
            geometry,
            zoom_config: config.zoom,
            drag_threshold_px: config.drag_threshold_px,
            handle_hit_radius_px: config.handle_hit_radius_px,
            duplicate_offset_px: config.duplicate_offset_px,
            drafts,
            gesture: Gesture::Idle,
            current_page: 1,
            zoom,
            canvas_origin: Point::default(),
            tool: ToolMode::default(),
            active_kind: AnchorKind::default(),
            active_signer: None,
            dirty: false,
        }
    }

    // ========================================================================
    // Event dispatch
    // ========================================================================

    /// Feed one input event through the machine
    pub fn dispatch(&mut self, event: EditorEvent) -> Transition {
        let from = self.state();
        let action = match event {
            EditorEvent::PointerDown { point } => self.pointer_down(point),
            EditorEvent::PointerMove { point } => self.pointer_move(point),
            EditorEvent::PointerUp { point } => self.pointer_up(point),
            EditorEvent::KeyDown { key } => self.key_down(key),
            EditorEvent::PageChanged { page } => EditorAction::PageChanged {
                page: self.change_page(page),
            },
        };
        let state = self.state();
        if from != state {
            debug!(?from, to = ?state, ?action, "Interaction transition");
        }
        Transition { state, action }
    }

    fn pointer_down(&mut self, screen: Point) -> EditorAction {
        if !is_finite(screen) {
            return EditorAction::None;
        }
        // A lost pointer-up ends the old gesture where it last was
        self.settle_gesture();
        self.drafts.clear_just_created();

        let canvas = self.to_canvas(screen);
        let page = self.geometry.page_size;

        match self.hit_test_canvas(canvas) {
            Some(HitTarget::Handle { key, handle }) => {
                let Some(draft) = self.drafts.get(key) else {
                    return EditorAction::None;
                };
                self.gesture = Gesture::Resizing {
                    key,
                    handle,
                    press: canvas,
                    original_px: draft.canvas_rect(page),
                    original: draft.rect(),
                    was_dirty: self.dirty,
                };
                EditorAction::ResizeStarted { key, handle }
            }
            Some(HitTarget::Body { key }) => {
                let Some(draft) = self.drafts.get(key) else {
                    return EditorAction::None;
                };
                let grab_offset = canvas.delta(draft.canvas_rect(page).origin());
                let original = draft.rect();
                self.drafts.select(key);
                self.gesture = Gesture::Selecting {
                    key,
                    press: screen,
                    grab_offset,
                    original,
                };
                EditorAction::Selected { key }
            }
            None => {
                let had_selection = self.drafts.selected_key().is_some();
                self.drafts.clear_selection();
                if self.tool == ToolMode::Draw && self.is_on_page(canvas) {
                    self.gesture = Gesture::Drawing {
                        start: canvas,
                        current: canvas,
                    };
                    EditorAction::DrawStarted
                } else if had_selection {
                    EditorAction::Deselected
                } else {
                    EditorAction::None
                }
            }
        }
    }

    fn pointer_move(&mut self, screen: Point) -> EditorAction {
        if !is_finite(screen) {
            return EditorAction::None;
        }
        let canvas = self.to_canvas(screen);

        match self.gesture {
            Gesture::Idle => EditorAction::None,
            Gesture::Drawing { start, .. } => {
                self.gesture = Gesture::Drawing {
                    start,
                    current: canvas,
                };
                EditorAction::DrawUpdated {
                    preview: self.draw_preview().unwrap_or_default(),
                }
            }
            Gesture::Selecting {
                key,
                press,
                grab_offset,
                original,
            } => {
                let moved = screen.delta(press);
                if moved.x.abs() < self.drag_threshold_px
                    && moved.y.abs() < self.drag_threshold_px
                {
                    return EditorAction::None;
                }
                if let Some(draft) = self.drafts.get_mut(key) {
                    draft.is_dragging = true;
                }
                self.gesture = Gesture::Dragging {
                    key,
                    grab_offset,
                    original,
                    was_dirty: self.dirty,
                };
                self.move_draft(key, canvas, grab_offset, original);
                EditorAction::DragStarted { key }
            }
            Gesture::Dragging {
                key,
                grab_offset,
                original,
                ..
            } => {
                self.move_draft(key, canvas, grab_offset, original);
                EditorAction::Moved { key }
            }
            Gesture::Resizing {
                key,
                handle,
                press,
                original_px,
                ..
            } => {
                self.resize_draft(key, handle, original_px, canvas.delta(press));
                EditorAction::Resized { key }
            }
        }
    }

    fn pointer_up(&mut self, screen: Point) -> EditorAction {
        let canvas = is_finite(screen).then(|| self.to_canvas(screen));
        let gesture = std::mem::replace(&mut self.gesture, Gesture::Idle);

        match gesture {
            Gesture::Idle => EditorAction::None,
            Gesture::Drawing { start, current } => {
                self.finish_draw(start, canvas.unwrap_or(current))
            }
            Gesture::Selecting { .. } => EditorAction::None,
            Gesture::Dragging {
                key,
                grab_offset,
                original,
                ..
            } => {
                if let Some(canvas) = canvas {
                    self.move_draft(key, canvas, grab_offset, original);
                }
                if let Some(draft) = self.drafts.get_mut(key) {
                    draft.is_dragging = false;
                }
                EditorAction::Moved { key }
            }
            Gesture::Resizing {
                key,
                handle,
                press,
                original_px,
                ..
            } => {
                if let Some(canvas) = canvas {
                    self.resize_draft(key, handle, original_px, canvas.delta(press));
                }
                EditorAction::Resized { key }
            }
        }
    }

    fn key_down(&mut self, key: Key) -> EditorAction {
        match key {
            Key::Escape => self.cancel(),
            Key::Delete | Key::Backspace => {
                if self.gesture != Gesture::Idle {
                    return EditorAction::None;
                }
                match self.drafts.selected_key() {
                    Some(selected) => {
                        self.drafts.remove(selected);
                        self.dirty = true;
                        EditorAction::Deleted { key: selected }
                    }
                    None => EditorAction::None,
                }
            }
            Key::Other => EditorAction::None,
        }
    }

    /// Abort the active gesture, restoring the draft it was changing.
    /// When idle, clears the selection instead.
    fn cancel(&mut self) -> EditorAction {
        let gesture = std::mem::replace(&mut self.gesture, Gesture::Idle);
        match gesture {
            Gesture::Idle => {
                if self.drafts.selected_key().is_some() {
                    self.drafts.clear_selection();
                    EditorAction::Deselected
                } else {
                    EditorAction::None
                }
            }
            Gesture::Drawing { .. } | Gesture::Selecting { .. } => EditorAction::Cancelled,
            Gesture::Dragging {
                key,
                original,
                was_dirty,
                ..
            }
            | Gesture::Resizing {
                key,
                original,
                was_dirty,
                ..
            } => {
                let display = self.display_size();
                if let Some(draft) = self.drafts.get_mut(key) {
                    draft.set_rect(original, display);
                    draft.is_dragging = false;
                }
                self.dirty = was_dirty;
                EditorAction::Cancelled
            }
        }
    }

    /// End any gesture in place: drawings are dropped, moved and resized
    /// drafts keep their current geometry.
    fn settle_gesture(&mut self) {
        match std::mem::replace(&mut self.gesture, Gesture::Idle) {
            Gesture::Drawing { .. } => debug!("Discarded in-progress draw"),
            Gesture::Dragging { key, .. } | Gesture::Resizing { key, .. } => {
                if let Some(draft) = self.drafts.get_mut(key) {
                    draft.is_dragging = false;
                }
            }
            Gesture::Idle | Gesture::Selecting { .. } => {}
        }
    }

    // ========================================================================
    // Geometry updates
    // ========================================================================

    fn finish_draw(&mut self, start: Point, end: Point) -> EditorAction {
        let raw = PixelRect::from_drag(start, end);
        let clamped = clamp_drawn_rect(raw, self.geometry.page_size);
        if !self.geometry.meets_minimum(clamped) {
            debug!(w = clamped.w, h = clamped.h, "Discarded draw below minimum size");
            return EditorAction::DrawDiscarded;
        }

        let rect = self.geometry.normalize_drawn_rect(raw);
        let anchor = Anchor::new(self.active_signer, self.active_kind, self.current_page, rect);
        let key = self.insert_created(anchor);
        EditorAction::Created { key }
    }

    fn move_draft(
        &mut self,
        key: DraftKey,
        canvas: Point,
        grab_offset: Point,
        original: NormalizedRect,
    ) {
        let page = self.geometry.page_size;
        let display = self.display_size();
        let Some(draft) = self.drafts.get_mut(key) else {
            return;
        };

        let moved = PixelRect::new(
            canvas.x - grab_offset.x,
            canvas.y - grab_offset.y,
            original.w * page.width,
            original.h * page.height,
        );
        let rect = normalize_within_page(clamp_position(moved, page), page);
        draft.set_rect(rect, display);
        self.dirty = true;
    }

    fn resize_draft(
        &mut self,
        key: DraftKey,
        handle: ResizeHandle,
        original_px: PixelRect,
        delta: Point,
    ) {
        let page = self.geometry.page_size;
        let display = self.display_size();
        let Some(draft) = self.drafts.get_mut(key) else {
            return;
        };

        let resized = resize_rect(original_px, handle, delta, page, self.geometry.min_size_px);
        draft.set_rect(normalize_within_page(resized, page), display);
        self.dirty = true;
    }

    /// Insert a freshly created anchor as the single selected draft
    fn insert_created(&mut self, anchor: Anchor) -> DraftKey {
        let key = self.drafts.insert(anchor, self.display_size());
        self.drafts.select(key);
        if let Some(draft) = self.drafts.get_mut(key) {
            draft.just_created = true;
        }
        self.dirty = true;
        debug!(%key, page = self.current_page, "Anchor created");
        key
    }

    // ========================================================================
    // Direct operations
    // ========================================================================

    /// Drop an anchor of `kind` at its default size, centred on a canvas point
    pub fn place_anchor(&mut self, canvas_point: Point, kind: AnchorKind) -> DraftKey {
        self.settle_gesture();
        self.drafts.clear_just_created();

        let page = self.geometry.page_size;
        let (w, h) = kind.default_size();
        let placed = clamp_position(
            PixelRect::new(canvas_point.x - w / 2.0, canvas_point.y - h / 2.0, w, h),
            page,
        );
        let anchor = Anchor::new(
            self.active_signer,
            kind,
            self.current_page,
            normalize_within_page(placed, page),
        );
        self.insert_created(anchor)
    }

    /// Copy a draft next to the original and select the copy
    pub fn duplicate(&mut self, key: DraftKey) -> Option<DraftKey> {
        self.settle_gesture();
        let page = self.geometry.page_size;
        let offset = self.duplicate_offset_px;

        let source = self.drafts.get(key)?;
        let r = source.canvas_rect(page);
        let shifted = clamp_position(PixelRect::new(r.x + offset, r.y + offset, r.w, r.h), page);
        let mut anchor = source.to_anchor();
        anchor.id = None;
        anchor.set_rect(normalize_within_page(shifted, page));

        self.drafts.clear_just_created();
        Some(self.insert_created(anchor))
    }

    pub fn delete(&mut self, key: DraftKey) -> Option<AnchorDraft> {
        self.settle_gesture();
        let removed = self.drafts.remove(key)?;
        self.dirty = true;
        debug!(%key, "Anchor deleted");
        Some(removed)
    }

    /// Bind a draft to another signer. Geometry is untouched.
    pub fn reassign_signer(&mut self, key: DraftKey, signer: Option<SignerId>) -> bool {
        let Some(draft) = self.drafts.get_mut(key) else {
            return false;
        };
        if draft.anchor.signer_id != signer {
            draft.anchor.signer_id = signer;
            self.dirty = true;
        }
        true
    }

    /// Select a draft, moving to its page if needed
    pub fn select(&mut self, key: DraftKey) -> bool {
        self.settle_gesture();
        let Some(page) = self.drafts.get(key).map(AnchorDraft::page) else {
            return false;
        };
        self.drafts.select(key);
        self.current_page = page.clamp(1, self.geometry.page_count.max(1));
        true
    }

    pub fn clear_selection(&mut self) {
        self.settle_gesture();
        self.drafts.clear_selection();
    }

    /// Switch page, clamped into the document. Ends any gesture and drops
    /// the selection when it is not on the new page.
    pub fn change_page(&mut self, page: u32) -> u32 {
        let page = page.clamp(1, self.geometry.page_count.max(1));
        self.settle_gesture();

        if self.drafts.selected().is_some_and(|d| d.page() != page) {
            self.drafts.clear_selection();
        }
        if page != self.current_page {
            debug!(from = self.current_page, to = page, "Page changed");
        }
        self.current_page = page;
        page
    }

    pub fn next_page(&mut self) -> u32 {
        self.change_page(self.current_page.saturating_add(1))
    }

    pub fn previous_page(&mut self) -> u32 {
        self.change_page(self.current_page.saturating_sub(1))
    }

    // ========================================================================
    // Viewport
    // ========================================================================

    /// Set the zoom factor (clamped and rounded) and refresh pixel caches
    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        self.zoom = self.zoom_config.clamp(zoom);
        self.drafts.refresh_all(self.display_size());
        debug!(zoom = self.zoom, "Zoom changed");
        self.zoom
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.set_zoom(self.zoom + self.zoom_config.step)
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.set_zoom(self.zoom - self.zoom_config.step)
    }

    pub fn reset_zoom(&mut self) -> f64 {
        self.set_zoom(self.zoom_config.default)
    }

    /// Zoom so the page fits `available_px`, never above 100%
    pub fn fit_to_width(&mut self, available_px: f64) -> f64 {
        if !available_px.is_finite() || available_px <= 0.0 {
            return self.zoom;
        }
        self.set_zoom((available_px / self.geometry.page_size.width).min(1.0))
    }

    /// Screen position of the page's top-left corner
    pub fn set_canvas_origin(&mut self, origin: Point) {
        self.canvas_origin = origin;
        self.drafts.refresh_all(self.display_size());
    }

    pub fn to_canvas(&self, screen: Point) -> Point {
        screen_to_canvas(screen, self.canvas_origin, self.zoom)
    }

    fn is_on_page(&self, canvas: Point) -> bool {
        let page = self.geometry.page_size;
        (0.0..=page.width).contains(&canvas.x) && (0.0..=page.height).contains(&canvas.y)
    }

    /// Hit-test a screen position: handles of the selected draft first, then
    /// draft bodies on the current page from topmost down
    pub fn hit_test(&self, screen: Point) -> Option<HitTarget> {
        if !is_finite(screen) {
            return None;
        }
        self.hit_test_canvas(self.to_canvas(screen))
    }

    fn hit_test_canvas(&self, canvas: Point) -> Option<HitTarget> {
        let page = self.geometry.page_size;

        if let Some(selected) = self.drafts.selected().filter(|d| d.page() == self.current_page) {
            let radius = self.handle_hit_radius_px / self.zoom;
            if let Some(handle) = hit_handle(selected.canvas_rect(page), canvas, radius) {
                return Some(HitTarget::Handle {
                    key: selected.key,
                    handle,
                });
            }
        }

        self.drafts
            .hit(self.current_page, canvas, page)
            .map(|key| HitTarget::Body { key })
    }

    /// Rectangle being drawn, clamped to the page, in display pixels
    pub fn draw_preview(&self) -> Option<PixelRect> {
        let Gesture::Drawing { start, current } = self.gesture else {
            return None;
        };
        let r = clamp_drawn_rect(PixelRect::from_drag(start, current), self.geometry.page_size);
        Some(PixelRect::new(
            r.x * self.zoom,
            r.y * self.zoom,
            r.w * self.zoom,
            r.h * self.zoom,
        ))
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn state(&self) -> InteractionState {
        self.gesture.state()
    }

    pub fn drafts(&self) -> &DraftSet {
        &self.drafts
    }

    pub fn draft(&self, key: DraftKey) -> Option<&AnchorDraft> {
        self.drafts.get(key)
    }

    pub fn drafts_on_page(&self, page: u32) -> Vec<&AnchorDraft> {
        self.drafts.on_page(page).collect()
    }

    pub fn selected_key(&self) -> Option<DraftKey> {
        self.drafts.selected_key()
    }

    /// Persistable snapshot of every draft
    pub fn anchors(&self) -> Vec<Anchor> {
        self.drafts.iter().map(AnchorDraft::to_anchor).collect()
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn page_size(&self) -> PageSize {
        self.geometry.page_size
    }

    pub fn page_count(&self) -> u32 {
        self.geometry.page_count
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Page size as displayed at the current zoom
    pub fn display_size(&self) -> PageSize {
        self.geometry.page_size.scaled(self.zoom)
    }

    pub fn canvas_origin(&self) -> Point {
        self.canvas_origin
    }

    pub fn tool(&self) -> ToolMode {
        self.tool
    }

    pub fn set_tool(&mut self, tool: ToolMode) {
        self.settle_gesture();
        self.tool = tool;
    }

    pub fn active_kind(&self) -> AnchorKind {
        self.active_kind
    }

    pub fn set_active_kind(&mut self, kind: AnchorKind) {
        self.active_kind = kind;
    }

    pub fn active_signer(&self) -> Option<SignerId> {
        self.active_signer
    }

    /// Signer bound to newly created anchors. Not checked here.
    pub fn set_active_signer(&mut self, signer: Option<SignerId>) {
        self.active_signer = signer;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Record the ids a store assigned, matched to drafts by position
    pub fn assign_ids(&mut self, stored: &[Anchor]) -> bool {
        self.drafts.assign_ids(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::AnchorId;
    use pretty_assertions::assert_eq;

    fn geometry() -> PageGeometry {
        PageGeometry::new(PageSize::new(800.0, 1000.0), 3, 1.0)
    }

    fn machine_with(anchors: Vec<Anchor>) -> InteractionMachine {
        let mut m = InteractionMachine::new(&EditorConfig::default(), geometry(), anchors);
        m.set_active_signer(Some(SignerId(1)));
        m
    }

    fn machine() -> InteractionMachine {
        machine_with(vec![])
    }

    fn anchor_on(page: u32, rect: NormalizedRect) -> Anchor {
        Anchor::new(Some(SignerId(1)), AnchorKind::Signature, page, rect)
    }

    fn down(m: &mut InteractionMachine, x: f64, y: f64) -> Transition {
        m.dispatch(EditorEvent::PointerDown {
            point: Point::new(x, y),
        })
    }

    fn mv(m: &mut InteractionMachine, x: f64, y: f64) -> Transition {
        m.dispatch(EditorEvent::PointerMove {
            point: Point::new(x, y),
        })
    }

    fn up(m: &mut InteractionMachine, x: f64, y: f64) -> Transition {
        m.dispatch(EditorEvent::PointerUp {
            point: Point::new(x, y),
        })
    }

    fn press(m: &mut InteractionMachine, key: Key) -> Transition {
        m.dispatch(EditorEvent::KeyDown { key })
    }

    fn draw(m: &mut InteractionMachine, from: (f64, f64), to: (f64, f64)) -> Transition {
        down(m, from.0, from.1);
        mv(m, to.0, to.1);
        up(m, to.0, to.1)
    }

    fn approx(a: NormalizedRect, b: NormalizedRect) -> bool {
        (a.x - b.x).abs() < 1e-9
            && (a.y - b.y).abs() < 1e-9
            && (a.w - b.w).abs() < 1e-9
            && (a.h - b.h).abs() < 1e-9
    }

    fn example_rect() -> NormalizedRect {
        NormalizedRect::new(0.125, 0.1, 0.25, 0.05)
    }

    // ========================================================================
    // Drawing
    // ========================================================================

    #[test]
    fn test_draw_creates_selected_anchor() {
        let mut m = machine();
        assert_eq!(down(&mut m, 100.0, 100.0).action, EditorAction::DrawStarted);
        assert_eq!(m.state(), InteractionState::Drawing);

        let t = mv(&mut m, 300.0, 150.0);
        assert_eq!(
            t.action,
            EditorAction::DrawUpdated {
                preview: PixelRect::new(100.0, 100.0, 200.0, 50.0)
            }
        );

        let t = up(&mut m, 300.0, 150.0);
        let EditorAction::Created { key } = t.action else {
            panic!("expected Created, got {:?}", t.action);
        };
        assert_eq!(t.state, InteractionState::Idle);

        let draft = m.draft(key).unwrap();
        assert!(approx(draft.rect(), example_rect()));
        assert_eq!(draft.page(), 1);
        assert_eq!(draft.signer_id(), Some(SignerId(1)));
        assert_eq!(draft.kind(), AnchorKind::Signature);
        assert!(draft.is_selected);
        assert!(draft.just_created);
        assert!(m.is_dirty());
    }

    #[test]
    fn test_backwards_draw_normalizes() {
        let mut m = machine();
        draw(&mut m, (300.0, 150.0), (100.0, 100.0));
        let draft = m.drafts().iter().next().unwrap();
        assert!(approx(draft.rect(), example_rect()));
    }

    #[test]
    fn test_click_without_drag_creates_nothing() {
        let mut m = machine();
        down(&mut m, 400.0, 400.0);
        let t = up(&mut m, 400.0, 400.0);
        assert_eq!(t.action, EditorAction::DrawDiscarded);
        assert!(m.drafts().is_empty());
        assert!(!m.is_dirty());
    }

    #[test]
    fn test_draw_at_zoom_with_offset_origin() {
        let mut m = machine();
        m.set_zoom(2.0);
        m.set_canvas_origin(Point::new(10.0, 20.0));
        draw(&mut m, (210.0, 220.0), (610.0, 320.0));

        let draft = m.drafts().iter().next().unwrap();
        assert!(approx(draft.rect(), example_rect()));
        assert_eq!(draft.pixel_rect(), PixelRect::new(200.0, 200.0, 400.0, 100.0));
    }

    #[test]
    fn test_draw_without_active_signer_is_unbound() {
        let mut m = machine();
        m.set_active_signer(None);
        m.set_active_kind(AnchorKind::Initials);
        draw(&mut m, (10.0, 10.0), (60.0, 40.0));
        let draft = m.drafts().iter().next().unwrap();
        assert_eq!(draft.signer_id(), None);
        assert_eq!(draft.kind(), AnchorKind::Initials);
    }

    #[test]
    fn test_pointer_down_outside_page_does_not_draw() {
        let mut m = machine();
        let t = down(&mut m, 900.0, 100.0);
        assert_eq!(t.action, EditorAction::None);
        assert_eq!(m.state(), InteractionState::Idle);
    }

    #[test]
    fn test_select_tool_does_not_draw() {
        let mut m = machine_with(vec![anchor_on(1, example_rect())]);
        m.set_tool(ToolMode::Select);
        down(&mut m, 150.0, 120.0);
        up(&mut m, 150.0, 120.0);

        let t = down(&mut m, 500.0, 500.0);
        assert_eq!(t.action, EditorAction::Deselected);
        assert_eq!(t.state, InteractionState::Idle);
        assert_eq!(m.drafts().len(), 1);
    }

    #[test]
    fn test_escape_discards_draw() {
        let mut m = machine();
        down(&mut m, 100.0, 100.0);
        mv(&mut m, 300.0, 300.0);
        assert_eq!(press(&mut m, Key::Escape).action, EditorAction::Cancelled);
        assert_eq!(up(&mut m, 300.0, 300.0).action, EditorAction::None);
        assert!(m.drafts().is_empty());
    }

    // ========================================================================
    // Selection, drag and resize
    // ========================================================================

    #[test]
    fn test_single_selection() {
        let mut m = machine_with(vec![
            anchor_on(1, NormalizedRect::new(0.0, 0.0, 0.25, 0.05)),
            anchor_on(1, NormalizedRect::new(0.5, 0.5, 0.25, 0.05)),
        ]);
        let keys: Vec<DraftKey> = m.drafts().iter().map(|d| d.key).collect();

        down(&mut m, 100.0, 20.0);
        up(&mut m, 100.0, 20.0);
        assert_eq!(m.selected_key(), Some(keys[0]));

        down(&mut m, 500.0, 520.0);
        up(&mut m, 500.0, 520.0);
        assert_eq!(m.selected_key(), Some(keys[1]));
        assert_eq!(m.drafts().iter().filter(|d| d.is_selected).count(), 1);
        assert!(!m.draft(keys[0]).unwrap().is_selected);
    }

    #[test]
    fn test_drag_needs_threshold() {
        let mut m = machine_with(vec![anchor_on(1, example_rect())]);
        let key = m.drafts().iter().next().unwrap().key;

        assert_eq!(down(&mut m, 150.0, 120.0).action, EditorAction::Selected { key });
        assert_eq!(m.state(), InteractionState::Selecting);

        assert_eq!(mv(&mut m, 152.0, 122.0).action, EditorAction::None);
        assert_eq!(m.state(), InteractionState::Selecting);
        assert!(!m.is_dirty());

        assert_eq!(mv(&mut m, 170.0, 140.0).action, EditorAction::DragStarted { key });
        assert_eq!(m.state(), InteractionState::Dragging);

        // Re-normalized while the pointer is still held
        let draft = m.draft(key).unwrap();
        assert!(draft.is_dragging);
        assert!(approx(draft.rect(), NormalizedRect::new(0.15, 0.12, 0.25, 0.05)));

        assert_eq!(up(&mut m, 170.0, 140.0).action, EditorAction::Moved { key });
        let draft = m.draft(key).unwrap();
        assert!(!draft.is_dragging);
        assert!(draft.is_selected);
        assert!(m.is_dirty());
    }

    #[test]
    fn test_click_on_anchor_keeps_it_selected() {
        let mut m = machine_with(vec![anchor_on(1, example_rect())]);
        let key = m.drafts().iter().next().unwrap().key;
        down(&mut m, 150.0, 120.0);
        let t = up(&mut m, 150.0, 120.0);
        assert_eq!(t.state, InteractionState::Idle);
        assert_eq!(m.selected_key(), Some(key));
        assert!(approx(m.draft(key).unwrap().rect(), example_rect()));
    }

    #[test]
    fn test_drag_clamps_to_page() {
        let mut m = machine_with(vec![anchor_on(1, example_rect())]);
        let key = m.drafts().iter().next().unwrap().key;
        down(&mut m, 150.0, 120.0);
        mv(&mut m, 2000.0, -500.0);
        up(&mut m, 2000.0, -500.0);

        let r = m.draft(key).unwrap().rect();
        assert!(approx(r, NormalizedRect::new(0.75, 0.0, 0.25, 0.05)));
    }

    #[test]
    fn test_escape_restores_dragged_anchor() {
        let mut m = machine_with(vec![anchor_on(1, example_rect())]);
        let key = m.drafts().iter().next().unwrap().key;
        down(&mut m, 150.0, 120.0);
        mv(&mut m, 250.0, 220.0);
        assert!(m.is_dirty());

        let t = press(&mut m, Key::Escape);
        assert_eq!(t.action, EditorAction::Cancelled);
        assert_eq!(t.state, InteractionState::Idle);

        let draft = m.draft(key).unwrap();
        assert!(approx(draft.rect(), example_rect()));
        assert!(!draft.is_dragging);
        assert!(!m.is_dirty());
    }

    #[test]
    fn test_resize_from_corner_handle() {
        let mut m = machine_with(vec![anchor_on(1, example_rect())]);
        let key = m.drafts().iter().next().unwrap().key;
        m.select(key);

        let t = down(&mut m, 300.0, 150.0);
        assert_eq!(
            t.action,
            EditorAction::ResizeStarted {
                key,
                handle: ResizeHandle::SE
            }
        );
        mv(&mut m, 400.0, 200.0);
        assert!(approx(
            m.draft(key).unwrap().rect(),
            NormalizedRect::new(0.125, 0.1, 0.375, 0.1)
        ));
        assert_eq!(up(&mut m, 400.0, 200.0).action, EditorAction::Resized { key });
        assert_eq!(m.state(), InteractionState::Idle);
    }

    #[test]
    fn test_resize_below_minimum_is_clamped() {
        let mut m = machine_with(vec![anchor_on(1, example_rect())]);
        let key = m.drafts().iter().next().unwrap().key;
        m.select(key);

        down(&mut m, 100.0, 125.0); // W handle
        mv(&mut m, 900.0, 125.0);
        up(&mut m, 900.0, 125.0);

        let r = m.draft(key).unwrap().rect();
        assert!((r.w * 800.0 - 1.0).abs() < 1e-9);
        assert!((r.x + r.w - 0.375).abs() < 1e-9);
        assert_eq!(geometry().validate_rect(r), Ok(()));
    }

    #[test]
    fn test_handles_scale_with_zoom() {
        let mut m = machine_with(vec![anchor_on(1, example_rect())]);
        let key = m.drafts().iter().next().unwrap().key;
        m.select(key);
        m.set_zoom(2.0);

        // SE corner is at (600, 300) on screen; 5px off is still within 6px
        assert_eq!(
            m.hit_test(Point::new(605.0, 305.0)),
            Some(HitTarget::Handle {
                key,
                handle: ResizeHandle::SE
            })
        );
        assert_eq!(m.hit_test(Point::new(400.0, 250.0)), Some(HitTarget::Body { key }));
    }

    // ========================================================================
    // Keys, pages, direct operations
    // ========================================================================

    #[test]
    fn test_delete_selected() {
        let mut m = machine_with(vec![anchor_on(1, example_rect())]);
        let key = m.drafts().iter().next().unwrap().key;

        assert_eq!(press(&mut m, Key::Delete).action, EditorAction::None);
        m.select(key);
        assert_eq!(press(&mut m, Key::Backspace).action, EditorAction::Deleted { key });
        assert!(m.drafts().is_empty());
        assert!(m.is_dirty());
    }

    #[test]
    fn test_escape_when_idle_clears_selection() {
        let mut m = machine_with(vec![anchor_on(1, example_rect())]);
        let key = m.drafts().iter().next().unwrap().key;
        m.select(key);
        assert_eq!(press(&mut m, Key::Escape).action, EditorAction::Deselected);
        assert_eq!(m.selected_key(), None);
    }

    #[test]
    fn test_page_change_deselects_and_keeps_drafts() {
        let mut m = machine_with(vec![
            anchor_on(1, example_rect()),
            anchor_on(2, example_rect()),
        ]);
        let first = m.drafts().iter().next().unwrap().key;
        down(&mut m, 150.0, 120.0);
        up(&mut m, 150.0, 120.0);
        assert_eq!(m.selected_key(), Some(first));

        let t = m.dispatch(EditorEvent::PageChanged { page: 2 });
        assert_eq!(t.action, EditorAction::PageChanged { page: 2 });
        assert_eq!(m.selected_key(), None);
        assert_eq!(m.drafts().len(), 2);
        assert_eq!(m.drafts_on_page(2).len(), 1);

        // Hit testing only sees the current page
        let second = m.drafts_on_page(2)[0].key;
        assert_eq!(m.hit_test(Point::new(150.0, 120.0)), Some(HitTarget::Body { key: second }));
    }

    #[test]
    fn test_page_change_ends_drag_in_place() {
        let mut m = machine_with(vec![anchor_on(1, example_rect())]);
        let key = m.drafts().iter().next().unwrap().key;
        down(&mut m, 150.0, 120.0);
        mv(&mut m, 170.0, 140.0);

        m.change_page(2);
        assert_eq!(m.state(), InteractionState::Idle);
        let draft = m.draft(key).unwrap();
        assert!(!draft.is_dragging);
        assert!(!draft.is_selected);
        assert!(approx(draft.rect(), NormalizedRect::new(0.15, 0.12, 0.25, 0.05)));
    }

    #[test]
    fn test_missed_pointer_up_drops_draw() {
        let mut m = machine();
        down(&mut m, 100.0, 100.0);
        mv(&mut m, 110.0, 110.0);

        let t = down(&mut m, 600.0, 800.0);
        assert_eq!(t.action, EditorAction::DrawStarted);
        assert_eq!(t.state, InteractionState::Drawing);
        assert!(m.drafts().is_empty());
        assert!(!m.is_dirty());

        assert_eq!(up(&mut m, 600.0, 800.0).action, EditorAction::DrawDiscarded);
        assert!(m.drafts().is_empty());
    }

    #[test]
    fn test_missed_pointer_up_keeps_dragged_geometry() {
        let mut m = machine_with(vec![anchor_on(1, example_rect())]);
        let key = m.drafts().iter().next().unwrap().key;
        down(&mut m, 150.0, 120.0);
        mv(&mut m, 170.0, 140.0);

        down(&mut m, 700.0, 900.0);
        let draft = m.draft(key).unwrap();
        assert!(!draft.is_dragging);
        assert!(approx(draft.rect(), NormalizedRect::new(0.15, 0.12, 0.25, 0.05)));
        assert_eq!(m.drafts().len(), 1);
    }

    #[test]
    fn test_page_navigation_is_clamped() {
        let mut m = machine();
        assert_eq!(m.change_page(0), 1);
        assert_eq!(m.change_page(99), 3);
        assert_eq!(m.next_page(), 3);
        assert_eq!(m.previous_page(), 2);
        assert_eq!(m.previous_page(), 1);
        assert_eq!(m.previous_page(), 1);
    }

    #[test]
    fn test_just_created_clears_on_next_pointer_down() {
        let mut m = machine();
        draw(&mut m, (100.0, 100.0), (300.0, 150.0));
        let key = m.selected_key().unwrap();
        assert!(m.draft(key).unwrap().just_created);

        down(&mut m, 700.0, 900.0);
        assert!(!m.draft(key).unwrap().just_created);
    }

    #[test]
    fn test_place_anchor_centres_and_clamps() {
        let mut m = machine();
        let key = m.place_anchor(Point::new(400.0, 500.0), AnchorKind::Signature);
        assert!(approx(
            m.draft(key).unwrap().rect(),
            NormalizedRect::new(0.375, 0.475, 0.25, 0.05)
        ));

        let key = m.place_anchor(Point::new(790.0, 990.0), AnchorKind::Signature);
        let draft = m.draft(key).unwrap();
        assert!(approx(draft.rect(), NormalizedRect::new(0.75, 0.95, 0.25, 0.05)));
        assert!(draft.is_selected && draft.just_created);
        assert_eq!(m.drafts().iter().filter(|d| d.is_selected).count(), 1);
    }

    #[test]
    fn test_duplicate_offsets_copy() {
        let mut stored = anchor_on(1, example_rect());
        stored.id = Some(AnchorId(9));
        let mut m = machine_with(vec![stored]);
        let original = m.drafts().iter().next().unwrap().key;
        m.select(original);

        let copy = m.duplicate(original).unwrap();
        let draft = m.draft(copy).unwrap();
        assert!(approx(draft.rect(), NormalizedRect::new(0.15, 0.12, 0.25, 0.05)));
        assert_eq!(draft.anchor.id, None);
        assert_eq!(draft.signer_id(), Some(SignerId(1)));
        assert!(draft.is_selected);
        assert!(!m.draft(original).unwrap().is_selected);
        assert_eq!(m.duplicate(DraftKey(999)), None);
    }

    #[test]
    fn test_reassign_signer_keeps_geometry() {
        let mut m = machine_with(vec![anchor_on(1, example_rect())]);
        let key = m.drafts().iter().next().unwrap().key;
        assert!(m.reassign_signer(key, Some(SignerId(2))));
        let draft = m.draft(key).unwrap();
        assert_eq!(draft.signer_id(), Some(SignerId(2)));
        assert!(approx(draft.rect(), example_rect()));
        assert_eq!(draft.page(), 1);
        assert!(m.is_dirty());
        assert!(!m.reassign_signer(DraftKey(42), Some(SignerId(2))));
    }

    #[test]
    fn test_zoom_refreshes_pixel_cache() {
        let mut m = machine_with(vec![anchor_on(1, example_rect())]);
        let key = m.drafts().iter().next().unwrap().key;
        assert_eq!(m.draft(key).unwrap().pixel_rect(), PixelRect::new(100.0, 100.0, 200.0, 50.0));

        assert_eq!(m.set_zoom(2.0), 2.0);
        assert_eq!(m.draft(key).unwrap().pixel_rect(), PixelRect::new(200.0, 200.0, 400.0, 100.0));
        assert!(approx(m.draft(key).unwrap().rect(), example_rect()));

        assert_eq!(m.reset_zoom(), 1.0);
        assert_eq!(m.zoom_in(), 1.1);
        assert_eq!(m.zoom_out(), 1.0);
        assert_eq!(m.set_zoom(10.0), 2.0);
        assert_eq!(m.fit_to_width(400.0), 0.5);
        assert_eq!(m.fit_to_width(2000.0), 1.0);
        assert_eq!(m.fit_to_width(0.0), 1.0);
    }
}
