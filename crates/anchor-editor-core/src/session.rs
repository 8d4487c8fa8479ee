//! Editing session for one document
//!
//! [`EditorSession`] ties the interaction machine to the signer list and to
//! the collaborators. It owns every draft of the document from load until
//! the session is saved or discarded.

use tracing::{debug, info, warn};

use crate::anchor::{Anchor, AnchorKind, PageGeometry};
use crate::collaborators::{AnchorStore, DocumentId, PageLayout, PageRenderer, SignerDirectory};
use crate::config::EditorConfig;
use crate::coords::{PixelRect, Point};
use crate::draft::{DraftKey, DraftView};
use crate::error::{SessionError, UnboundAnchor};
use crate::interaction::{EditorAction, EditorEvent, InteractionMachine, ToolMode, Transition};
use crate::palette::{Color, SignerPalette};
use crate::signer::{Signer, SignerId, SignerStatus};
use crate::text_height::{check_overflow, OverflowCheck};

#[derive(Debug)]
pub struct EditorSession {
    document: DocumentId,
    config: EditorConfig,
    signers: Vec<Signer>,
    palette: SignerPalette,
    machine: InteractionMachine,
    saving: bool,
}

impl EditorSession {
    /// Build a session from data already fetched from the collaborators
    pub fn open(
        document: DocumentId,
        layout: PageLayout,
        signers: Vec<Signer>,
        anchors: Vec<Anchor>,
        config: EditorConfig,
    ) -> Result<Self, SessionError> {
        if layout.page_count == 0 {
            return Err(SessionError::EmptyDocument);
        }
        if signers.iter().any(|s| s.status == SignerStatus::Completed) {
            warn!(%document, "Document already signed, refusing to edit");
            return Err(SessionError::DocumentLocked);
        }

        let size = layout.page_size;
        let usable = |v: f64| v.is_finite() && v > 0.0;
        let page_size = if usable(size.width) && usable(size.height) {
            size
        } else {
            warn!(
                %document,
                ?size,
                "Renderer reported an unusable page size, using configured canvas"
            );
            config.page_size()
        };

        let geometry = PageGeometry::new(page_size, layout.page_count, config.min_anchor_size_px);
        for anchor in anchors.iter().filter(|a| geometry.validate(a).is_err()) {
            warn!(
                %document,
                page = anchor.page,
                kind = %anchor.kind,
                "Loaded anchor does not validate"
            );
        }

        let mut machine = InteractionMachine::new(&config, geometry, anchors);
        let active = signers
            .iter()
            .find(|s| s.status == SignerStatus::Pending)
            .map(|s| s.id);
        machine.set_active_signer(active);

        info!(
            %document,
            pages = layout.page_count,
            anchors = machine.drafts().len(),
            signers = signers.len(),
            "Editor session opened"
        );

        Ok(Self {
            document,
            palette: config.palette(),
            config,
            signers,
            machine,
            saving: false,
        })
    }

    /// Fetch page layout, signers and stored anchors, then open the session
    pub async fn load(
        document: DocumentId,
        renderer: &dyn PageRenderer,
        directory: &dyn SignerDirectory,
        store: &dyn AnchorStore,
        config: EditorConfig,
    ) -> Result<Self, SessionError> {
        let layout = renderer.page_layout(&document).await.map_err(|e| {
            warn!(%document, error = %e, "Failed to load page layout");
            e
        })?;
        let signers = directory.signers(&document).await.map_err(|e| {
            warn!(%document, error = %e, "Failed to load signers");
            e
        })?;
        let anchors = store.load_anchors(&document).await.map_err(|e| {
            warn!(%document, error = %e, "Failed to load anchors");
            e
        })?;

        Self::open(document, layout, signers, anchors, config)
    }

    fn ensure_editable(&self) -> Result<(), SessionError> {
        if self.saving {
            return Err(SessionError::SaveInProgress);
        }
        Ok(())
    }

    fn ensure_signer(&self, id: SignerId) -> Result<(), SessionError> {
        if self.signers.iter().any(|s| s.id == id) {
            Ok(())
        } else {
            Err(SessionError::UnknownSigner(id))
        }
    }

    // ========================================================================
    // Input
    // ========================================================================

    /// Forward an input event. Every event is ignored while a save is in flight.
    pub fn dispatch(&mut self, event: EditorEvent) -> Transition {
        if self.saving {
            debug!(?event, "Input ignored during save");
            return Transition {
                state: self.machine.state(),
                action: EditorAction::Ignored,
            };
        }
        self.machine.dispatch(event)
    }

    pub fn change_page(&mut self, page: u32) -> Result<u32, SessionError> {
        self.ensure_editable()?;
        Ok(self.machine.change_page(page))
    }

    pub fn next_page(&mut self) -> Result<u32, SessionError> {
        self.ensure_editable()?;
        Ok(self.machine.next_page())
    }

    pub fn previous_page(&mut self) -> Result<u32, SessionError> {
        self.ensure_editable()?;
        Ok(self.machine.previous_page())
    }

    /// Bind a draft to another signer without touching its geometry
    pub fn reassign_signer(&mut self, key: DraftKey, signer: SignerId) -> Result<(), SessionError> {
        self.ensure_editable()?;
        self.ensure_signer(signer)?;
        if !self.machine.reassign_signer(key, Some(signer)) {
            return Err(SessionError::UnknownDraft(key));
        }
        debug!(%key, %signer, "Anchor reassigned");
        Ok(())
    }

    /// Signer given to new anchors; `None` leaves them unbound
    pub fn set_active_signer(&mut self, signer: Option<SignerId>) -> Result<(), SessionError> {
        if let Some(id) = signer {
            self.ensure_signer(id)?;
        }
        self.machine.set_active_signer(signer);
        Ok(())
    }

    pub fn set_active_kind(&mut self, kind: AnchorKind) {
        self.machine.set_active_kind(kind);
    }

    pub fn set_tool(&mut self, tool: ToolMode) -> Result<(), SessionError> {
        self.ensure_editable()?;
        self.machine.set_tool(tool);
        Ok(())
    }

    /// Drop an anchor at its default size, centred on a canvas point
    pub fn place_anchor(
        &mut self,
        canvas_point: Point,
        kind: AnchorKind,
    ) -> Result<DraftKey, SessionError> {
        self.ensure_editable()?;
        Ok(self.machine.place_anchor(canvas_point, kind))
    }

    pub fn duplicate(&mut self, key: DraftKey) -> Result<DraftKey, SessionError> {
        self.ensure_editable()?;
        self.machine
            .duplicate(key)
            .ok_or(SessionError::UnknownDraft(key))
    }

    pub fn delete(&mut self, key: DraftKey) -> Result<(), SessionError> {
        self.ensure_editable()?;
        self.machine
            .delete(key)
            .map(|_| ())
            .ok_or(SessionError::UnknownDraft(key))
    }

    pub fn select(&mut self, key: DraftKey) -> Result<(), SessionError> {
        self.ensure_editable()?;
        if self.machine.select(key) {
            Ok(())
        } else {
            Err(SessionError::UnknownDraft(key))
        }
    }

    pub fn clear_selection(&mut self) -> Result<(), SessionError> {
        self.ensure_editable()?;
        self.machine.clear_selection();
        Ok(())
    }

    // ========================================================================
    // Viewport
    // ========================================================================

    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        self.machine.set_zoom(zoom)
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.machine.zoom_in()
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.machine.zoom_out()
    }

    pub fn reset_zoom(&mut self) -> f64 {
        self.machine.reset_zoom()
    }

    pub fn fit_to_width(&mut self, available_px: f64) -> f64 {
        self.machine.fit_to_width(available_px)
    }

    pub fn set_canvas_origin(&mut self, origin: Point) {
        self.machine.set_canvas_origin(origin);
    }

    // ========================================================================
    // Save
    // ========================================================================

    /// Validate every draft and produce the anchor set to persist.
    ///
    /// Unbound drafts are reported together, by page and kind, before any
    /// other validation failure.
    pub fn prepare(&self) -> Result<Vec<Anchor>, SessionError> {
        let mut unbound: Vec<UnboundAnchor> = self
            .machine
            .drafts()
            .iter()
            .filter(|d| d.signer_id().is_none())
            .map(|d| UnboundAnchor {
                key: d.key,
                page: d.page(),
                kind: d.kind(),
            })
            .collect();
        if !unbound.is_empty() {
            unbound.sort_by_key(|u| (u.page, u.key));
            return Err(SessionError::UnboundAnchors(unbound));
        }

        let geometry = self.machine.geometry();
        for draft in self.machine.drafts().iter() {
            geometry
                .validate(&draft.anchor)
                .map_err(|reason| SessionError::InvalidAnchor {
                    key: draft.key,
                    page: draft.page(),
                    kind: draft.kind(),
                    reason,
                })?;
            if let Some(id) = draft.signer_id() {
                self.ensure_signer(id)?;
            }
        }

        let anchors = self.machine.anchors();
        if anchors.is_empty() && !self.config.allow_empty_save {
            return Err(SessionError::NothingToSave);
        }
        Ok(anchors)
    }

    /// Validate, snapshot the anchor set and lock input until
    /// [`EditorSession::finish_save`] is called
    pub fn begin_save(&mut self) -> Result<Vec<Anchor>, SessionError> {
        self.ensure_editable()?;
        let anchors = self.prepare().map_err(|e| {
            warn!(document = %self.document, error = %e, "Save rejected");
            e
        })?;

        self.machine.clear_selection();
        self.saving = true;
        info!(document = %self.document, anchors = anchors.len(), "Saving anchors");
        Ok(anchors)
    }

    /// Unlock input after a save round-trip. A successful save marks the
    /// session clean.
    pub fn finish_save(&mut self, succeeded: bool) -> Result<(), SessionError> {
        if !self.saving {
            return Err(SessionError::NoSaveInProgress);
        }
        self.saving = false;
        if succeeded {
            self.machine.mark_clean();
            info!(document = %self.document, "Anchors saved");
        } else {
            warn!(document = %self.document, "Anchor save failed");
        }
        Ok(())
    }

    /// Finish a successful save with the set the store returned. Drafts
    /// take over the assigned ids so the next save updates them in place.
    pub fn complete_save(&mut self, stored: &[Anchor]) -> Result<(), SessionError> {
        if !self.saving {
            return Err(SessionError::NoSaveInProgress);
        }
        if !self.machine.assign_ids(stored) {
            warn!(
                document = %self.document,
                sent = self.machine.drafts().len(),
                returned = stored.len(),
                "Store returned a different anchor count, ids not updated"
            );
        }
        self.finish_save(true)
    }

    /// Validate and hand the full anchor set to the store. Returns the number
    /// of anchors saved.
    pub async fn save(&mut self, store: &dyn AnchorStore) -> Result<usize, SessionError> {
        let anchors = self.begin_save()?;
        let count = anchors.len();
        match store.save_anchors(&self.document, anchors).await {
            Ok(stored) => {
                self.complete_save(&stored)?;
                Ok(count)
            }
            Err(e) => {
                self.finish_save(false)?;
                Err(e.into())
            }
        }
    }

    /// Drop every unsaved change
    pub fn discard(self) {
        info!(
            document = %self.document,
            dirty = self.machine.is_dirty(),
            "Editor session discarded"
        );
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn document(&self) -> &DocumentId {
        &self.document
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn machine(&self) -> &InteractionMachine {
        &self.machine
    }

    pub fn signers(&self) -> &[Signer] {
        &self.signers
    }

    pub fn active_signer(&self) -> Option<SignerId> {
        self.machine.active_signer()
    }

    pub fn current_page(&self) -> u32 {
        self.machine.current_page()
    }

    pub fn page_count(&self) -> u32 {
        self.machine.page_count()
    }

    pub fn zoom(&self) -> f64 {
        self.machine.zoom()
    }

    pub fn is_dirty(&self) -> bool {
        self.machine.is_dirty()
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// Current anchor set without validation
    pub fn anchors(&self) -> Vec<Anchor> {
        self.machine.anchors()
    }

    pub fn color_for_signer(&self, signer: Option<SignerId>) -> Color {
        self.palette.color_for_signer(&self.signers, signer)
    }

    pub fn color_for(&self, key: DraftKey) -> Option<Color> {
        self.machine
            .draft(key)
            .map(|d| self.color_for_signer(d.signer_id()))
    }

    /// Render projections of every draft
    pub fn draft_views(&self) -> Vec<DraftView> {
        self.machine
            .drafts()
            .iter()
            .map(|d| DraftView::new(d, self.color_for_signer(d.signer_id())))
            .collect()
    }

    /// Render projections of the drafts on the current page
    pub fn page_views(&self) -> Vec<DraftView> {
        let page = self.machine.current_page();
        self.draft_views()
            .into_iter()
            .filter(|v| v.page == page)
            .collect()
    }

    /// Estimate whether `text` overflows a field rectangle in canvas pixels.
    /// Uses the configured default font size when none is given.
    pub fn check_overflow(
        &self,
        text: &str,
        field: PixelRect,
        font_size_pt: Option<f64>,
    ) -> OverflowCheck {
        check_overflow(
            text,
            field.w.abs(),
            field.h.abs(),
            font_size_pt.unwrap_or(self.config.default_font_size_pt),
            self.config.overflow_margin_px,
        )
    }
}
