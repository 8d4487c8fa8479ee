//! Persisted anchor records and their geometric invariants
//!
//! An [`Anchor`] is the resolution-independent record handed to persistence:
//! a page-scoped, normalized rectangle bound to a signer. This module owns
//! the conversion from a raw pointer-drawn rectangle into a valid normalized
//! rectangle and the validation applied before anything is committed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::coords::{pixel_to_normalized, NormalizedRect, PageSize, PixelRect};
use crate::error::AnchorError;
use crate::signer::SignerId;

/// Floating-point slack for bound checks on normalized values
const BOUNDS_EPSILON: f64 = 1e-9;

/// Persisted anchor identifier, absent until the anchor has been saved once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnchorId(pub u64);

/// The two kinds of field an anchor can mark. Persisted verbatim as the
/// literals `assinatura` and `rubrica`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AnchorKind {
    #[default]
    #[serde(rename = "assinatura")]
    Signature,
    #[serde(rename = "rubrica")]
    Initials,
}

impl AnchorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnchorKind::Signature => "assinatura",
            AnchorKind::Initials => "rubrica",
        }
    }

    /// Default canvas size (width, height) for an anchor dropped from the palette
    pub fn default_size(&self) -> (f64, f64) {
        match self {
            AnchorKind::Signature => (200.0, 50.0),
            AnchorKind::Initials => (50.0, 30.0),
        }
    }
}

impl fmt::Display for AnchorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnchorKind {
    type Err = AnchorError;

    /// Accepts the persisted literals and their English names
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "assinatura" | "signature" => Ok(AnchorKind::Signature),
            "rubrica" | "initials" => Ok(AnchorKind::Initials),
            _ => Err(AnchorError::UnknownKind(s.to_string())),
        }
    }
}

/// Field kinds used by the template field editor. These are never persisted
/// as anchors; only the two signing kinds map down to [`AnchorKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateFieldKind {
    Text,
    RichText,
    Date,
    Image,
    Checkbox,
    Signature,
    Initials,
}

impl fmt::Display for TemplateFieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TemplateFieldKind::Text => "text",
            TemplateFieldKind::RichText => "rich_text",
            TemplateFieldKind::Date => "date",
            TemplateFieldKind::Image => "image",
            TemplateFieldKind::Checkbox => "checkbox",
            TemplateFieldKind::Signature => "signature",
            TemplateFieldKind::Initials => "initials",
        };
        f.write_str(name)
    }
}

impl TryFrom<TemplateFieldKind> for AnchorKind {
    type Error = AnchorError;

    fn try_from(kind: TemplateFieldKind) -> Result<Self, Self::Error> {
        match kind {
            TemplateFieldKind::Signature => Ok(AnchorKind::Signature),
            TemplateFieldKind::Initials => Ok(AnchorKind::Initials),
            other => Err(AnchorError::UnmappedFieldKind(other.to_string())),
        }
    }
}

/// Wire shape exchanged with the anchor persistence collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AnchorId>,
    #[serde(rename = "signerId", default)]
    pub signer_id: Option<SignerId>,
    pub kind: AnchorKind,
    /// 1-based page index
    pub page: u32,
    pub x_norm: f64,
    pub y_norm: f64,
    pub w_norm: f64,
    pub h_norm: f64,
}

impl Anchor {
    pub fn new(
        signer_id: Option<SignerId>,
        kind: AnchorKind,
        page: u32,
        rect: NormalizedRect,
    ) -> Self {
        Self {
            id: None,
            signer_id,
            kind,
            page,
            x_norm: rect.x,
            y_norm: rect.y,
            w_norm: rect.w,
            h_norm: rect.h,
        }
    }

    pub fn rect(&self) -> NormalizedRect {
        NormalizedRect::new(self.x_norm, self.y_norm, self.w_norm, self.h_norm)
    }

    pub fn set_rect(&mut self, rect: NormalizedRect) {
        self.x_norm = rect.x;
        self.y_norm = rect.y;
        self.w_norm = rect.w;
        self.h_norm = rect.h;
    }
}

/// Clamp a possibly backwards drawn rectangle into the container.
///
/// The result has non-negative size but may be empty when the gesture lay
/// entirely outside the container or did not move.
pub fn clamp_drawn_rect(raw: PixelRect, container: PageSize) -> PixelRect {
    let x1 = raw.x.min(raw.right()).max(0.0);
    let y1 = raw.y.min(raw.bottom()).max(0.0);
    let x2 = raw.x.max(raw.right()).min(container.width);
    let y2 = raw.y.max(raw.bottom()).min(container.height);
    PixelRect::new(x1, y1, (x2 - x1).max(0.0), (y2 - y1).max(0.0))
}

/// Turn a raw drawn rectangle into a valid normalized rectangle.
///
/// Resolves negative sizes, clamps every edge into the container, grows the
/// rectangle to at least `min_size_px` in each dimension (shifting it back
/// inside if it sits on the far edge) and divides by the container size.
pub fn normalize_drawn_rect(
    raw: PixelRect,
    container: PageSize,
    min_size_px: f64,
) -> NormalizedRect {
    let clamped = clamp_drawn_rect(raw, container);

    let w = clamped.w.max(min_size_px.min(container.width));
    let h = clamped.h.max(min_size_px.min(container.height));
    let x = clamped.x.min(container.width - w).max(0.0);
    let y = clamped.y.min(container.height - h).max(0.0);

    normalize_within_page(PixelRect::new(x, y, w, h), container)
}

/// Normalize a pixel rectangle that is already inside the page, absorbing
/// floating-point drift so the result never exceeds the unit square.
pub fn normalize_within_page(rect: PixelRect, page: PageSize) -> NormalizedRect {
    let n = pixel_to_normalized(rect, page);
    let x = n.x.clamp(0.0, 1.0);
    let y = n.y.clamp(0.0, 1.0);
    NormalizedRect::new(x, y, n.w.min(1.0 - x).max(0.0), n.h.min(1.0 - y).max(0.0))
}

/// Translate a rectangle so it lies inside the page, keeping its size
/// (capped to the page size).
pub fn clamp_position(rect: PixelRect, page: PageSize) -> PixelRect {
    let w = rect.w.min(page.width);
    let h = rect.h.min(page.height);
    PixelRect::new(
        rect.x.min(page.width - w).max(0.0),
        rect.y.min(page.height - h).max(0.0),
        w,
        h,
    )
}

/// Page-level constraints every anchor of one document is checked against
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub page_size: PageSize,
    pub page_count: u32,
    pub min_size_px: f64,
}

impl PageGeometry {
    pub fn new(page_size: PageSize, page_count: u32, min_size_px: f64) -> Self {
        Self {
            page_size,
            page_count,
            min_size_px,
        }
    }

    /// See [`normalize_drawn_rect`]
    pub fn normalize_drawn_rect(&self, raw: PixelRect) -> NormalizedRect {
        normalize_drawn_rect(raw, self.page_size, self.min_size_px)
    }

    /// Whether a clamped drawn rectangle is large enough to become an anchor
    pub fn meets_minimum(&self, clamped: PixelRect) -> bool {
        clamped.w >= self.min_size_px && clamped.h >= self.min_size_px
    }

    /// Check an anchor against page range, signer binding and rectangle
    /// invariants.
    pub fn validate(&self, anchor: &Anchor) -> Result<(), AnchorError> {
        if anchor.page < 1 || anchor.page > self.page_count {
            return Err(AnchorError::PageOutOfRange {
                page: anchor.page,
                page_count: self.page_count,
            });
        }
        if anchor.signer_id.is_none() {
            return Err(AnchorError::MissingSigner);
        }
        self.validate_rect(anchor.rect())
    }

    /// Rectangle-only part of [`PageGeometry::validate`]
    pub fn validate_rect(&self, rect: NormalizedRect) -> Result<(), AnchorError> {
        let NormalizedRect { x, y, w, h } = rect;
        if ![x, y, w, h].iter().all(|v| v.is_finite()) {
            return Err(AnchorError::NonFinite);
        }
        if x < 0.0
            || y < 0.0
            || w < 0.0
            || h < 0.0
            || x + w > 1.0 + BOUNDS_EPSILON
            || y + h > 1.0 + BOUNDS_EPSILON
        {
            return Err(AnchorError::OutOfBounds);
        }

        let min_w = self.min_size_px.min(self.page_size.width);
        let min_h = self.min_size_px.min(self.page_size.height);
        if w * self.page_size.width < min_w - BOUNDS_EPSILON
            || h * self.page_size.height < min_h - BOUNDS_EPSILON
        {
            return Err(AnchorError::Degenerate);
        }
        Ok(())
    }
}
