//! In-memory anchor drafts owned by an editing session

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::anchor::{Anchor, AnchorId, AnchorKind};
use crate::coords::{normalized_to_pixel, NormalizedRect, PageSize, PixelRect, Point};
use crate::palette::Color;
use crate::signer::SignerId;

/// Session-local handle for a draft. Stable for the lifetime of the session,
/// unlike [`AnchorId`] which only exists once an anchor has been persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DraftKey(pub u64);

impl fmt::Display for DraftKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Working copy of an anchor plus transient UI state
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorDraft {
    pub key: DraftKey,
    pub anchor: Anchor,
    pub is_selected: bool,
    pub is_dragging: bool,
    pub just_created: bool,
    /// Rectangle in display pixels at the current zoom, relative to the page
    pixel_rect: PixelRect,
}

impl AnchorDraft {
    fn new(key: DraftKey, anchor: Anchor, display: PageSize) -> Self {
        let pixel_rect = normalized_to_pixel(anchor.rect(), display);
        Self {
            key,
            anchor,
            is_selected: false,
            is_dragging: false,
            just_created: false,
            pixel_rect,
        }
    }

    pub fn page(&self) -> u32 {
        self.anchor.page
    }

    pub fn kind(&self) -> AnchorKind {
        self.anchor.kind
    }

    pub fn signer_id(&self) -> Option<SignerId> {
        self.anchor.signer_id
    }

    pub fn rect(&self) -> NormalizedRect {
        self.anchor.rect()
    }

    /// Cached display rectangle for the zoom it was last refreshed at
    pub fn pixel_rect(&self) -> PixelRect {
        self.pixel_rect
    }

    /// Rectangle in unscaled canvas pixels
    pub fn canvas_rect(&self, page: PageSize) -> PixelRect {
        normalized_to_pixel(self.anchor.rect(), page)
    }

    /// Replace the normalized rectangle and refresh the pixel cache
    pub fn set_rect(&mut self, rect: NormalizedRect, display: PageSize) {
        self.anchor.set_rect(rect);
        self.refresh(display);
    }

    pub fn refresh(&mut self, display: PageSize) {
        self.pixel_rect = normalized_to_pixel(self.anchor.rect(), display);
    }

    /// Persistable copy of this draft
    pub fn to_anchor(&self) -> Anchor {
        self.anchor.clone()
    }
}

/// Ordered collection of drafts. Later drafts are drawn on top.
#[derive(Debug, Clone, Default)]
pub struct DraftSet {
    drafts: Vec<AnchorDraft>,
    next_key: u64,
}

impl DraftSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an anchor and return its key
    pub fn insert(&mut self, anchor: Anchor, display: PageSize) -> DraftKey {
        let key = DraftKey(self.next_key);
        self.next_key += 1;
        self.drafts.push(AnchorDraft::new(key, anchor, display));
        key
    }

    pub fn remove(&mut self, key: DraftKey) -> Option<AnchorDraft> {
        let index = self.drafts.iter().position(|d| d.key == key)?;
        Some(self.drafts.remove(index))
    }

    pub fn get(&self, key: DraftKey) -> Option<&AnchorDraft> {
        self.drafts.iter().find(|d| d.key == key)
    }

    pub fn get_mut(&mut self, key: DraftKey) -> Option<&mut AnchorDraft> {
        self.drafts.iter_mut().find(|d| d.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnchorDraft> {
        self.drafts.iter()
    }

    pub fn on_page(&self, page: u32) -> impl Iterator<Item = &AnchorDraft> {
        self.drafts.iter().filter(move |d| d.page() == page)
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    pub fn selected(&self) -> Option<&AnchorDraft> {
        self.drafts.iter().find(|d| d.is_selected)
    }

    pub fn selected_key(&self) -> Option<DraftKey> {
        self.selected().map(|d| d.key)
    }

    /// Select exactly one draft, clearing every other selection
    pub fn select(&mut self, key: DraftKey) -> bool {
        let mut found = false;
        for draft in &mut self.drafts {
            draft.is_selected = draft.key == key;
            found |= draft.is_selected;
        }
        found
    }

    pub fn clear_selection(&mut self) {
        for draft in &mut self.drafts {
            draft.is_selected = false;
            draft.is_dragging = false;
        }
    }

    pub fn clear_just_created(&mut self) {
        for draft in &mut self.drafts {
            draft.just_created = false;
        }
    }

    /// Recompute every pixel cache for a new display size
    pub fn refresh_all(&mut self, display: PageSize) {
        for draft in &mut self.drafts {
            draft.refresh(display);
        }
    }

    /// Copy the ids a store assigned back onto the drafts, matched by
    /// position. Nothing changes when the counts differ.
    pub fn assign_ids(&mut self, stored: &[Anchor]) -> bool {
        if stored.len() != self.drafts.len() {
            return false;
        }
        for (draft, anchor) in self.drafts.iter_mut().zip(stored) {
            if anchor.id.is_some() {
                draft.anchor.id = anchor.id;
            }
        }
        true
    }

    /// Topmost draft on `page` whose canvas rectangle contains the point
    pub fn hit(&self, page: u32, canvas_point: Point, page_size: PageSize) -> Option<DraftKey> {
        self.drafts
            .iter()
            .rev()
            .filter(|d| d.page() == page)
            .find(|d| d.canvas_rect(page_size).contains(canvas_point))
            .map(|d| d.key)
    }
}

/// Render-ready projection of a draft
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftView {
    pub key: DraftKey,
    pub id: Option<AnchorId>,
    pub page: u32,
    pub kind: AnchorKind,
    #[serde(rename = "signerId")]
    pub signer_id: Option<SignerId>,
    pub rect: NormalizedRect,
    pub pixel_rect: PixelRect,
    pub color: Color,
    pub is_selected: bool,
    pub is_dragging: bool,
    pub just_created: bool,
}

impl DraftView {
    pub fn new(draft: &AnchorDraft, color: Color) -> Self {
        Self {
            key: draft.key,
            id: draft.anchor.id,
            page: draft.page(),
            kind: draft.kind(),
            signer_id: draft.signer_id(),
            rect: draft.rect(),
            pixel_rect: draft.pixel_rect(),
            color,
            is_selected: draft.is_selected,
            is_dragging: draft.is_dragging,
            just_created: draft.just_created,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor(page: u32, x: f64) -> Anchor {
        Anchor::new(
            Some(SignerId(1)),
            AnchorKind::Signature,
            page,
            NormalizedRect::new(x, 0.1, 0.25, 0.05),
        )
    }

    #[test]
    fn test_keys_are_unique_and_stable() {
        let display = PageSize::new(800.0, 1000.0);
        let mut set = DraftSet::new();
        let a = set.insert(anchor(1, 0.1), display);
        let b = set.insert(anchor(1, 0.2), display);
        set.remove(a);
        let c = set.insert(anchor(2, 0.3), display);
        assert_ne!(b, c);
        assert_ne!(a, c);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_single_selection() {
        let display = PageSize::new(800.0, 1000.0);
        let mut set = DraftSet::new();
        let a = set.insert(anchor(1, 0.1), display);
        let b = set.insert(anchor(1, 0.5), display);

        assert!(set.select(a));
        assert!(set.select(b));
        assert_eq!(set.iter().filter(|d| d.is_selected).count(), 1);
        assert_eq!(set.selected_key(), Some(b));
        assert!(!set.get(a).unwrap().is_selected);
    }

    #[test]
    fn test_pixel_cache_follows_display_size() {
        let page = PageSize::new(800.0, 1000.0);
        let mut set = DraftSet::new();
        let key = set.insert(anchor(1, 0.125), page);
        assert!((set.get(key).unwrap().pixel_rect().x - 100.0).abs() < 1e-9);

        set.refresh_all(page.scaled(2.0));
        let draft = set.get(key).unwrap();
        assert!((draft.pixel_rect().x - 200.0).abs() < 1e-9);
        assert!((draft.pixel_rect().bottom() - 300.0).abs() < 1e-9);
        // Canvas rect does not depend on zoom
        assert!((draft.canvas_rect(page).x - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_hit_prefers_topmost_on_page() {
        let page = PageSize::new(800.0, 1000.0);
        let mut set = DraftSet::new();
        let _bottom = set.insert(anchor(1, 0.125), page);
        let top = set.insert(anchor(1, 0.125), page);
        let _other_page = set.insert(anchor(2, 0.125), page);

        assert_eq!(set.hit(1, Point::new(150.0, 120.0), page), Some(top));
        assert_eq!(set.hit(1, Point::new(700.0, 900.0), page), None);
        assert_eq!(set.hit(3, Point::new(150.0, 120.0), page), None);
    }

    #[test]
    fn test_assign_ids_by_position() {
        let page = PageSize::new(800.0, 1000.0);
        let mut set = DraftSet::new();
        let a = set.insert(anchor(1, 0.1), page);
        let b = set.insert(anchor(2, 0.2), page);

        let mut stored = vec![anchor(1, 0.1), anchor(2, 0.2)];
        stored[0].id = Some(AnchorId(7));
        stored[1].id = Some(AnchorId(8));
        assert!(set.assign_ids(&stored));
        assert_eq!(set.get(a).unwrap().anchor.id, Some(AnchorId(7)));
        assert_eq!(set.get(b).unwrap().anchor.id, Some(AnchorId(8)));

        // A mismatched reply leaves the drafts alone
        stored[0].id = Some(AnchorId(99));
        assert!(!set.assign_ids(&stored[..1]));
        assert_eq!(set.get(a).unwrap().anchor.id, Some(AnchorId(7)));
    }
}
